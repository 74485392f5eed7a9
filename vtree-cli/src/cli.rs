use crate::commands;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "vtree",
    about = "resolve the dependency version tree of an npm package",
    version,
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a package from the registry
    Tree(commands::tree::TreeArgs),
    /// Resolve the dependencies declared in a package.json
    Manifest(commands::manifest::ManifestArgs),
}
