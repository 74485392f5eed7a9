use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vtree_semver::Version;

/// Dependency name to range, in the order the document declares them.
pub type DependencyMap = IndexMap<String, String>;

/// Package document as served by the registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RegistryPackage {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub versions: BTreeMap<String, RegistryVersion>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RegistryVersion {
    pub version: String,
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: DependencyMap,
}

/// Registry document plus the list of published versions, built once per
/// package name and shared read-only afterwards.
#[derive(Clone, Debug)]
pub struct PackageMetadata {
    pub name: String,
    pub dist_tags: BTreeMap<String, String>,
    pub versions: BTreeMap<String, RegistryVersion>,
    /// Every key of `versions`, semver-ascending. Unparseable keys trail
    /// in lexical order.
    pub available: Vec<String>,
}

impl PackageMetadata {
    pub fn from_registry(requested: &str, package: RegistryPackage) -> Self {
        let mut available: Vec<String> = package.versions.keys().cloned().collect();
        available.sort_by(|a, b| match (Version::parse(a), Version::parse(b)) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });

        let name = if package.name.is_empty() {
            requested.to_string()
        } else {
            package.name
        };

        PackageMetadata {
            name,
            dist_tags: package.dist_tags,
            versions: package.versions,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_registry_document_with_missing_maps() {
        let raw = r#"{
            "name": "left-pad",
            "dist-tags": { "latest": "1.3.0" },
            "versions": {
                "1.3.0": { "version": "1.3.0" },
                "1.1.0": { "version": "1.1.0", "devDependencies": { "tape": "^4.0.0" } }
            }
        }"#;

        let package: RegistryPackage = serde_json::from_str(raw).unwrap();
        assert_eq!(package.dist_tags.get("latest").map(String::as_str), Some("1.3.0"));
        assert!(package.versions["1.3.0"].dependencies.is_empty());
        assert_eq!(package.versions["1.1.0"].dev_dependencies["tape"], "^4.0.0");
    }

    #[test]
    fn dependencies_keep_declaration_order() {
        let raw = r#"{
            "version": "1.0.0",
            "dependencies": { "zod": "^3.0.0", "axios": "^1.0.0", "lodash": "^4.0.0" }
        }"#;

        let record: RegistryVersion = serde_json::from_str(raw).unwrap();
        let names: Vec<&str> = record.dependencies.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zod", "axios", "lodash"]);
    }

    #[test]
    fn available_versions_follow_semver_order() {
        let mut package = RegistryPackage::default();
        for v in ["10.0.0", "2.0.0", "1.0.0-beta.1", "1.0.0"] {
            package.versions.insert(
                v.to_string(),
                RegistryVersion {
                    version: v.to_string(),
                    ..Default::default()
                },
            );
        }

        let metadata = PackageMetadata::from_registry("pkg", package);
        assert_eq!(metadata.name, "pkg");
        assert_eq!(
            metadata.available,
            vec!["1.0.0-beta.1", "1.0.0", "2.0.0", "10.0.0"]
        );
    }
}
