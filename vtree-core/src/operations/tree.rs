use crate::registry::NpmRegistry;
use crate::resolve::{TreeBuilder, TreeOptions, VersionTree};
use crate::{Result, VtreeConfig};
use std::path::Path;
use std::time::Instant;

/// Resolves `name@range` against the configured registry.
pub async fn version_tree(
    config: &VtreeConfig,
    name: &str,
    range: Option<&str>,
    options: TreeOptions,
) -> Result<VersionTree> {
    let started = Instant::now();
    let builder = builder(config)?;

    let root = builder.build(name, range, options).await?;

    tracing::debug!(
        "resolved {}@{} in {:.3}s ({} unique packages)",
        root.name(),
        root.version(),
        started.elapsed().as_secs_f64(),
        builder.cache().len()
    );

    Ok(root.snapshot())
}

/// Resolves every dependency declared by the manifest at `path`.
pub async fn manifest_tree(
    config: &VtreeConfig,
    path: &Path,
    options: TreeOptions,
) -> Result<VersionTree> {
    let started = Instant::now();
    let builder = builder(config)?;

    let root = builder.build_from_manifest(path, options).await?;

    tracing::debug!(
        "resolved manifest {} in {:.3}s ({} unique packages)",
        path.display(),
        started.elapsed().as_secs_f64(),
        builder.cache().len()
    );

    Ok(root.snapshot())
}

fn builder(config: &VtreeConfig) -> Result<TreeBuilder<NpmRegistry>> {
    let registry = NpmRegistry::new(config)?;
    Ok(TreeBuilder::with_retry_policy(registry, config.retry.clone()))
}
