pub mod tree;

pub use tree::{manifest_tree, version_tree};
