use super::{TreeFlags, print_tree};
use anyhow::Result;
use clap::Args;
use std::env;
use std::path::PathBuf;
use std::time::Instant;
use vtree_core::{Project, VtreeConfig, console, operations};

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// package.json or the directory containing it (defaults to the nearest
    /// one above the current directory)
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub flags: TreeFlags,
}

pub async fn run(args: ManifestArgs, config: &VtreeConfig) -> Result<()> {
    if !args.flags.json {
        console::header("manifest", env!("CARGO_PKG_VERSION"));
    }

    let path = match args.path {
        Some(path) => path,
        None => {
            let cwd = env::current_dir()?;
            Project::discover(&cwd)?.manifest_path
        }
    };

    let started = Instant::now();
    let tree = operations::manifest_tree(config, &path, args.flags.options()).await?;

    if tree.deps.is_none() && !args.flags.json {
        console::warn(&format!("{} declares no dependencies to expand", path.display()));
    }

    print_tree(&tree, args.flags.json)?;

    if !args.flags.json {
        console::summary(tree.node_count(), started.elapsed().as_secs_f32());
    }

    Ok(())
}
