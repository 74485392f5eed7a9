pub mod config;
pub mod console;
pub mod error;
pub mod fetcher;
pub mod operations;
pub mod project;
pub mod registry;
pub mod resolve;
pub mod version;

#[cfg(test)]
mod testing;

pub use config::VtreeConfig;
pub use error::{ErrorKind, VtreeError};
pub use fetcher::{RetryOn, RetryPolicy};
pub use project::Project;
pub use registry::{NpmRegistry, Registry};
pub use resolve::{
    TreeBuilder, TreeOptions, VersionNode, VersionTree, build_version_tree,
    build_version_tree_from_manifest,
};

pub type Result<T> = std::result::Result<T, VtreeError>;
