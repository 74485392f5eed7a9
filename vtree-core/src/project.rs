use crate::registry::DependencyMap;
use crate::{Result, VtreeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "package.json";
const FALLBACK_VERSION: &str = "0.0.0";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(default)]
    pub dev_dependencies: DependencyMap,
}

#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

impl Project {
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                return Self::from_manifest_path(candidate);
            }
            current = dir.parent();
        }

        Err(VtreeError::ManifestMissing {
            path: start.to_path_buf(),
        })
    }

    /// Accepts either a manifest file or the directory holding one.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.is_dir() {
            let candidate = path.join(MANIFEST_FILE);
            if !candidate.is_file() {
                return Err(VtreeError::ManifestMissing {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_manifest_path(candidate);
        }

        Self::from_manifest_path(path.to_path_buf())
    }

    pub fn from_manifest_path(path: PathBuf) -> Result<Self> {
        let data = fs::read_to_string(&path).map_err(|source| VtreeError::ReadFile {
            path: path.clone(),
            source,
        })?;

        let manifest: Manifest =
            serde_json::from_str(&data).map_err(|source| VtreeError::ParseJson {
                path: path.clone(),
                source,
            })?;

        let root =
            path.parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| VtreeError::ManifestInvalid {
                    path: path.clone(),
                    reason: "manifest has no parent directory".into(),
                })?;

        Ok(Project {
            root,
            manifest_path: path,
            manifest,
        })
    }

    /// Name and version of the package the manifest describes.
    pub fn root_identity(&self) -> Result<(&str, &str)> {
        let name = self
            .manifest
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| VtreeError::ManifestInvalid {
                path: self.manifest_path.clone(),
                reason: "missing \"name\" field".into(),
            })?;
        let version = self.manifest.version.as_deref().unwrap_or(FALLBACK_VERSION);

        Ok((name, version))
    }
}
