use crate::registry::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VtreeError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Failed to fetch {name} after {attempts} attempt(s): {source}")]
    Fetch {
        name: String,
        attempts: u32,
        source: RegistryError,
    },

    #[error("Version not found: {name}#{range}. Use one of: {}.", .available.join(", "))]
    Resolution {
        name: String,
        range: String,
        available: Vec<String>,
    },

    #[error("Failed to read file {path:?}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse JSON in {path:?}: {source}")]
    ParseJson { path: PathBuf, source: serde_json::Error },

    #[error("Project manifest package.json not found at {path:?}")]
    ManifestMissing { path: PathBuf },

    #[error("Invalid manifest in {path:?}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Failed to create HTTP client: {source}")]
    HttpClient { source: reqwest::Error },

    #[error("{name}#{range} → {source}")]
    Context {
        name: String,
        range: String,
        source: Box<VtreeError>,
    },
}

/// Broad class of a failure, independent of how many dependency levels
/// wrapped it on the way up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Fetch,
    Resolution,
    Manifest,
}

impl VtreeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VtreeError::Context { source, .. } => source.kind(),
            VtreeError::InvalidInput { .. } => ErrorKind::Input,
            VtreeError::Fetch { .. } | VtreeError::HttpClient { .. } => ErrorKind::Fetch,
            VtreeError::Resolution { .. } => ErrorKind::Resolution,
            VtreeError::ReadFile { .. }
            | VtreeError::ParseJson { .. }
            | VtreeError::ManifestMissing { .. }
            | VtreeError::ManifestInvalid { .. } => ErrorKind::Manifest,
        }
    }

    /// Innermost error below every `name#range` context.
    pub fn root_cause(&self) -> &VtreeError {
        let mut current = self;
        while let VtreeError::Context { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// Dependency path the error travelled, outermost request first.
    pub fn path(&self) -> Vec<String> {
        let mut hops = Vec::new();
        let mut current = self;
        while let VtreeError::Context {
            name,
            range,
            source,
        } = current
        {
            hops.push(format!("{name}#{range}"));
            current = source.as_ref();
        }
        hops
    }

    pub(crate) fn within(self, name: &str, range: &str) -> Self {
        VtreeError::Context {
            name: name.to_string(),
            range: range.to_string(),
            source: Box::new(self),
        }
    }
}
