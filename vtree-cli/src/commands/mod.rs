pub mod manifest;
pub mod tree;

use clap::Args;
use vtree_core::{TreeOptions, VersionTree, console};

/// Flags shared by every command that builds a tree.
#[derive(Args, Debug, Clone, Copy)]
pub struct TreeFlags {
    /// Skip devDependencies of the root package
    #[arg(long)]
    pub production: bool,

    /// Number of dependency levels to expand
    #[arg(long)]
    pub depth: Option<u32>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

impl TreeFlags {
    pub fn options(&self) -> TreeOptions {
        TreeOptions {
            production: self.production,
            depth: self.depth,
        }
    }
}

pub fn print_tree(tree: &VersionTree, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tree)?);
    } else {
        console::tree(tree);
    }

    Ok(())
}
