pub mod cache;
pub mod types;

pub use cache::{Reservation, ResolutionCache};

use cache::PendingNode;
pub use types::{NodePhase, PackageId, TreeOptions, VersionNode, VersionTree};

use crate::fetcher::{MetadataFetcher, RetryPolicy};
use crate::project::Project;
use crate::registry::{DependencyMap, Registry};
use crate::version::{LATEST_TAG, select_version};
use crate::{Result, VtreeError};
use async_recursion::async_recursion;
use futures::future::try_join_all;
use std::path::Path;
use std::sync::Arc;

/// Longest package name the npm registry accepts.
const MAX_NAME_LEN: usize = 214;

/// Resolution context: one fetch cache and one node cache shared by every
/// request made through the same builder.
///
/// Each dependency edge is resolved on its own and memoized by
/// `name#version`; nothing is reconciled across requesters of the same
/// package.
pub struct TreeBuilder<R> {
    fetcher: MetadataFetcher<R>,
    cache: ResolutionCache,
}

impl<R: Registry> TreeBuilder<R> {
    pub fn new(registry: R) -> Self {
        Self::with_retry_policy(registry, RetryPolicy::default())
    }

    pub fn with_retry_policy(registry: R, policy: RetryPolicy) -> Self {
        TreeBuilder {
            fetcher: MetadataFetcher::new(registry, policy),
            cache: ResolutionCache::new(),
        }
    }

    pub fn registry(&self) -> &R {
        self.fetcher.registry()
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolves `name` at `range` (default `latest`) and every dependency
    /// below it.
    pub async fn build(
        &self,
        name: &str,
        range: Option<&str>,
        options: TreeOptions,
    ) -> Result<Arc<VersionNode>> {
        self.build_node(name, range, options).await
    }

    /// Builds the tree of a local package.json. The root keeps the
    /// manifest's own name and version and is never looked up.
    pub async fn build_from_manifest(
        &self,
        path: &Path,
        options: TreeOptions,
    ) -> Result<Arc<VersionNode>> {
        let project = Project::from_path(path)?;
        let (name, version) = project.root_identity()?;
        let manifest = &project.manifest;

        let root = VersionNode::reserved(name, version);
        let children = if options.expands() {
            let dev = (!options.production).then_some(&manifest.dev_dependencies);
            self.build_edges(&manifest.dependencies, dev, options.for_children())
                .await?
        } else {
            Vec::new()
        };
        root.populate(children);

        Ok(Arc::new(root))
    }

    #[async_recursion]
    async fn build_node<'a>(
        &'a self,
        name: &'a str,
        range: Option<&'a str>,
        options: TreeOptions,
    ) -> Result<Arc<VersionNode>> {
        let range = range.map(str::trim).filter(|r| !r.is_empty());
        let requested = range.unwrap_or(LATEST_TAG);

        if let Err(err) = validate_name(name) {
            return Err(err.within(name, requested));
        }

        // URLs, paths, git specs and bare tags pass through untouched.
        if let Some(literal) = range
            && !vtree_semver::is_valid_range(literal)
        {
            tracing::debug!("{}#{} is not a semver range, keeping it verbatim", name, literal);
            return Ok(Arc::new(VersionNode::leaf(name, literal)));
        }

        self.expand(name, requested, options)
            .await
            .map_err(|err| err.within(name, requested))
    }

    async fn expand(
        &self,
        name: &str,
        range: &str,
        options: TreeOptions,
    ) -> Result<Arc<VersionNode>> {
        let metadata = self.fetcher.fetch(name).await?;
        let record = select_version(name, range, &metadata)?;

        // Published before expansion so a cycle back to this identity stops
        // at the reserved node. A failed or cancelled expansion releases it.
        let pending = match self.cache.reserve(PackageId::new(name, &record.version)) {
            Reservation::Existing(node) => return Ok(node),
            Reservation::Reserved(node) => PendingNode::new(&self.cache, node),
        };

        if !options.expands() {
            return Ok(pending.complete(Vec::new()));
        }

        let dev = (!options.production).then_some(&record.dev_dependencies);
        let children = self
            .build_edges(&record.dependencies, dev, options.for_children())
            .await?;

        Ok(pending.complete(children))
    }

    /// Starts every edge before awaiting any. Results keep request order;
    /// the first failure wins and the remaining requests are dropped.
    async fn build_edges(
        &self,
        dependencies: &DependencyMap,
        dev_dependencies: Option<&DependencyMap>,
        options: TreeOptions,
    ) -> Result<Vec<Arc<VersionNode>>> {
        let requests = dependencies
            .iter()
            .chain(dev_dependencies.into_iter().flatten())
            .map(|(dep_name, dep_range)| {
                self.build_node(dep_name, Some(dep_range.as_str()), options)
            });

        try_join_all(requests).await
    }
}

/// Builds the tree for `name` with a fresh resolution context.
pub async fn build_version_tree<R: Registry>(
    registry: R,
    name: &str,
    range: Option<&str>,
    options: TreeOptions,
) -> Result<Arc<VersionNode>> {
    TreeBuilder::new(registry).build(name, range, options).await
}

/// Builds the tree of the package.json at `path` with a fresh resolution
/// context.
pub async fn build_version_tree_from_manifest<R: Registry>(
    registry: R,
    path: &Path,
    options: TreeOptions,
) -> Result<Arc<VersionNode>> {
    TreeBuilder::new(registry)
        .build_from_manifest(path, options)
        .await
}

fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "package name must not be empty"
    } else if name.len() > MAX_NAME_LEN {
        "package name is longer than 214 characters"
    } else if name.chars().any(char::is_whitespace) {
        "package name must not contain whitespace"
    } else {
        return Ok(());
    };

    Err(VtreeError::InvalidInput {
        reason: format!("{reason}: {name:?}"),
    })
}
