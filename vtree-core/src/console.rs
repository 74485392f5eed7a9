use crate::resolve::VersionTree;
use std::env;
use std::fmt::Write as _;
use std::sync::OnceLock;

fn use_color() -> bool {
    static USE_COLOR: OnceLock<bool> = OnceLock::new();
    *USE_COLOR.get_or_init(|| env::var_os("NO_COLOR").is_none())
}

fn paint(code: &str, text: &str) -> String {
    if use_color() {
        format!("\u{1b}[{}m{}\u{1b}[0m", code, text)
    } else {
        text.to_string()
    }
}

fn dim(text: &str) -> String {
    paint("2", text)
}

fn cyan(text: &str) -> String {
    paint("36", text)
}

fn yellow(text: &str) -> String {
    paint("33", text)
}

fn red(text: &str) -> String {
    paint("31", text)
}

pub fn header(command: &str, version: &str) {
    eprintln!("{}", dim(&format!("vtree {} v{}", command, version)));
    eprintln!();
}

pub fn summary(count: usize, seconds: f32) {
    let time_str = if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else {
        format!("{:.2}s", seconds)
    };
    let noun = if count == 1 { "package" } else { "packages" };
    eprintln!();
    eprintln!("{} {} resolved {}", count, noun, dim(&format!("[{}]", time_str)));
}

pub fn warn(message: &str) {
    let tag = yellow("warn");
    eprintln!("{} {}", tag, message);
}

pub fn error(message: &str) {
    let tag = red("error");
    eprintln!("{} {}", tag, message);
}

pub fn tree(root: &VersionTree) {
    print!("{}", render_tree(root, use_color()));
}

/// Text form of a tree, one `name@version` per line with box-drawing
/// branches.
pub fn render_tree(root: &VersionTree, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", label(root, color));
    render_children(root, "", color, &mut out);
    out
}

fn render_children(node: &VersionTree, prefix: &str, color: bool, out: &mut String) {
    let Some(children) = &node.deps else {
        return;
    };

    for (index, child) in children.iter().enumerate() {
        let last = index + 1 == children.len();
        let branch = if last { "└── " } else { "├── " };
        let branch = if color { dim(branch) } else { branch.to_string() };
        let _ = writeln!(out, "{}{}{}", prefix, branch, label(child, color));

        let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(child, &nested, color, out);
    }
}

fn label(node: &VersionTree, color: bool) -> String {
    let version = if color {
        cyan(&node.version)
    } else {
        node.version.clone()
    };
    format!("{}@{}", node.name, version)
}
