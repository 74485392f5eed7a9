use crate::registry::{DependencyMap, Registry, RegistryError, RegistryPackage, RegistryVersion};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory registry that counts fetches and can fail the first N
/// attempts for a name.
#[derive(Default)]
pub struct MockRegistry {
    packages: BTreeMap<String, RegistryPackage>,
    failures: Mutex<BTreeMap<String, u32>>,
    calls: Mutex<BTreeMap<String, u32>>,
    interleave: bool,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(
        mut self,
        name: &str,
        dist_tags: &[(&str, &str)],
        versions: Vec<RegistryVersion>,
    ) -> Self {
        let package = RegistryPackage {
            name: name.to_string(),
            dist_tags: dist_tags
                .iter()
                .map(|(tag, v)| (tag.to_string(), v.to_string()))
                .collect(),
            versions: versions
                .into_iter()
                .map(|meta| (meta.version.clone(), meta))
                .collect(),
        };
        self.packages.insert(name.to_string(), package);
        self
    }

    pub fn failing(self, name: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(name.to_string(), times);
        self
    }

    /// Yield once per fetch so sibling requests overlap.
    pub fn interleaved(mut self) -> Self {
        self.interleave = true;
        self
    }

    pub fn calls(&self, name: &str) -> u32 {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Registry for MockRegistry {
    async fn fetch(&self, name: &str) -> Result<RegistryPackage, RegistryError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += 1;

        if self.interleave {
            tokio::task::yield_now().await;
        }

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(name)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(RegistryError::Status {
                    url: format!("mock://{name}"),
                    status: 503,
                });
            }
        }

        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }
}

pub fn version(v: &str) -> RegistryVersion {
    version_with(v, &[], &[])
}

pub fn version_with(v: &str, deps: &[(&str, &str)], dev: &[(&str, &str)]) -> RegistryVersion {
    RegistryVersion {
        version: v.to_string(),
        dependencies: to_map(deps),
        dev_dependencies: to_map(dev),
    }
}

fn to_map(entries: &[(&str, &str)]) -> DependencyMap {
    entries
        .iter()
        .map(|(name, range)| (name.to_string(), range.to_string()))
        .collect()
}
