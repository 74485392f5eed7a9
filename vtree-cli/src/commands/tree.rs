use super::{TreeFlags, print_tree};
use anyhow::Result;
use clap::Args;
use std::time::Instant;
use vtree_core::{VtreeConfig, console, operations};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Package name
    pub name: String,

    /// Version, range or dist-tag (defaults to latest)
    pub range: Option<String>,

    #[command(flatten)]
    pub flags: TreeFlags,
}

pub async fn run(args: TreeArgs, config: &VtreeConfig) -> Result<()> {
    if !args.flags.json {
        console::header("tree", env!("CARGO_PKG_VERSION"));
    }

    let started = Instant::now();
    let tree = operations::version_tree(
        config,
        &args.name,
        args.range.as_deref(),
        args.flags.options(),
    )
    .await?;

    print_tree(&tree, args.flags.json)?;

    if !args.flags.json {
        console::summary(tree.node_count(), started.elapsed().as_secs_f32());
    }

    Ok(())
}
