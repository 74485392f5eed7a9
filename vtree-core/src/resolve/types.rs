use serde::{Deserialize, Serialize};
use std::fmt;
use std::ptr;
use std::sync::{Arc, OnceLock};

/// Resolved identity of a node: `name#version`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: &str, version: &str) -> Self {
        PackageId {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.version)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Skip devDependencies of the requested package.
    pub production: bool,
    /// Remaining levels to expand; `None` is unbounded.
    pub depth: Option<u32>,
}

impl TreeOptions {
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub(crate) fn expands(&self) -> bool {
        self.depth != Some(0)
    }

    /// Dependencies of a dependency never include its devDependencies.
    pub(crate) fn for_children(&self) -> TreeOptions {
        TreeOptions {
            production: true,
            depth: self.depth.map(|d| d.saturating_sub(1)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodePhase {
    /// Published in the cache, dependencies still being expanded.
    Reserved,
    /// Dependencies decided; they never change afterwards.
    Populated,
}

/// Element of the output tree.
///
/// Nodes are shared through `Arc` once cached. A node is visible to other
/// requests while still [`NodePhase::Reserved`], which is how a cyclic
/// back-reference ends up pointing at an ancestor that has no deps yet.
#[derive(Debug)]
pub struct VersionNode {
    name: String,
    version: String,
    deps: OnceLock<Vec<Arc<VersionNode>>>,
}

impl VersionNode {
    pub fn reserved(name: &str, version: &str) -> Self {
        VersionNode {
            name: name.to_string(),
            version: version.to_string(),
            deps: OnceLock::new(),
        }
    }

    pub fn leaf(name: &str, version: &str) -> Self {
        let node = Self::reserved(name, version);
        node.populate(Vec::new());
        node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn id(&self) -> PackageId {
        PackageId::new(&self.name, &self.version)
    }

    pub fn phase(&self) -> NodePhase {
        if self.deps.get().is_some() {
            NodePhase::Populated
        } else {
            NodePhase::Reserved
        }
    }

    /// Child nodes, `None` for leaves and for nodes still being expanded.
    pub fn deps(&self) -> Option<&[Arc<VersionNode>]> {
        self.deps
            .get()
            .filter(|deps| !deps.is_empty())
            .map(Vec::as_slice)
    }

    /// Moves the node to [`NodePhase::Populated`]. Only the request that
    /// reserved the node calls this, exactly once.
    pub(crate) fn populate(&self, deps: Vec<Arc<VersionNode>>) {
        if self.deps.set(deps).is_err() {
            tracing::warn!("{}#{} was populated twice", self.name, self.version);
        }
    }

    /// Owned copy of the tree below this node.
    ///
    /// A node met again on its own ancestor path is emitted without deps,
    /// so cyclic graphs produce a finite tree.
    pub fn snapshot(&self) -> VersionTree {
        let mut path = Vec::new();
        self.snapshot_on(&mut path)
    }

    fn snapshot_on<'a>(&'a self, path: &mut Vec<&'a VersionNode>) -> VersionTree {
        let revisit = path.iter().any(|ancestor| ptr::eq(*ancestor, self));

        let deps = match self.deps() {
            Some(children) if !revisit => {
                path.push(self);
                let out = children
                    .iter()
                    .map(|child| child.snapshot_on(path))
                    .collect();
                path.pop();
                Some(out)
            }
            _ => None,
        };

        VersionTree {
            name: self.name.clone(),
            version: self.version.clone(),
            deps,
        }
    }
}

impl Serialize for VersionNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

/// Plain, acyclic form of a resolved tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTree {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<VersionTree>>,
}

impl VersionTree {
    /// Number of nodes in the tree, the root included.
    pub fn node_count(&self) -> usize {
        1 + self
            .deps
            .iter()
            .flatten()
            .map(VersionTree::node_count)
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_step_down_and_force_production() {
        let options = TreeOptions::default().depth(2);
        let child = options.for_children();
        assert_eq!(child, TreeOptions { production: true, depth: Some(1) });
        assert!(child.expands());
        assert!(!child.for_children().expands());

        let unbounded = TreeOptions::default().for_children();
        assert_eq!(unbounded.depth, None);
        assert!(unbounded.expands());
    }

    #[test]
    fn empty_deps_read_back_as_absent() {
        let node = VersionNode::reserved("a", "1.0.0");
        assert_eq!(node.phase(), NodePhase::Reserved);
        assert!(node.deps().is_none());

        node.populate(Vec::new());
        assert_eq!(node.phase(), NodePhase::Populated);
        assert!(node.deps().is_none());

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "a", "version": "1.0.0" }));
    }

    #[test]
    fn snapshot_truncates_cycles() {
        let a = Arc::new(VersionNode::reserved("a", "1.0.0"));
        let b = Arc::new(VersionNode::reserved("b", "1.0.0"));
        b.populate(vec![Arc::clone(&a)]);
        a.populate(vec![Arc::clone(&b)]);

        let tree = a.snapshot();
        let expected = VersionTree {
            name: "a".into(),
            version: "1.0.0".into(),
            deps: Some(vec![VersionTree {
                name: "b".into(),
                version: "1.0.0".into(),
                deps: Some(vec![VersionTree {
                    name: "a".into(),
                    version: "1.0.0".into(),
                    deps: None,
                }]),
            }]),
        };
        assert_eq!(tree, expected);
        assert_eq!(tree.node_count(), 3);
    }
}
