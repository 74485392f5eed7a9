pub mod types;

pub use types::{DependencyMap, PackageMetadata, RegistryPackage, RegistryVersion};

use crate::{Result, VtreeConfig, VtreeError};
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("package {name} not found in registry")]
    NotFound { name: String },

    #[error("registry returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("invalid metadata from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl RegistryError {
    /// Failures worth retrying when only transient errors are retried.
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::NotFound { .. } | RegistryError::Decode { .. } => false,
            RegistryError::Status { status, .. } => *status == 429 || *status >= 500,
            RegistryError::Transport { .. } => true,
        }
    }
}

/// Source of raw package documents.
pub trait Registry: Send + Sync {
    fn fetch(
        &self,
        name: &str,
    ) -> impl Future<Output = std::result::Result<RegistryPackage, RegistryError>> + Send;
}

#[derive(Debug, Clone)]
pub struct NpmRegistry {
    client: Client,
    config: VtreeConfig,
}

impl NpmRegistry {
    pub fn new(config: &VtreeConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("vtree/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| VtreeError::HttpClient { source })?;

        Ok(NpmRegistry {
            client,
            config: config.clone(),
        })
    }

    pub fn package_url(&self, name: &str) -> String {
        let base = self.registry_for_package(name);
        format!("{}/{}", base.trim_end_matches('/'), encode_package_name(name))
    }

    fn registry_for_package(&self, name: &str) -> &str {
        if let Some((scope, _)) = name.split_once('/')
            && scope.starts_with('@')
            && let Some(reg) = self.config.scoped_registries.get(scope)
        {
            return reg;
        }

        &self.config.default_registry
    }

    /// Metadata request for `name`, authorized for the host it goes to.
    fn request(&self, name: &str) -> (String, RequestBuilder) {
        let url = self.package_url(name);

        // The abbreviated install document drops devDependencies, so ask for
        // the full one.
        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.config.auth_token_for_url(&url) {
            request = request.bearer_auth(token);
        }

        (url, request)
    }
}

impl Registry for NpmRegistry {
    async fn fetch(&self, name: &str) -> std::result::Result<RegistryPackage, RegistryError> {
        let (url, request) = self.request(name);

        tracing::debug!("registry request: name={} url={}", name, url);
        let started = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(
            "registry response: name={} status={} in {:.3}s",
            name,
            status.as_u16(),
            started.elapsed().as_secs_f64()
        );

        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
            });
        }

        if !status.is_success() {
            return Err(RegistryError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let package = response
            .json::<RegistryPackage>()
            .await
            .map_err(|source| {
                if source.is_decode() {
                    RegistryError::Decode {
                        url: url.clone(),
                        reason: source.to_string(),
                    }
                } else {
                    RegistryError::Transport {
                        url: url.clone(),
                        source,
                    }
                }
            })?;

        tracing::debug!(
            "registry decode: name={} versions={} dist_tags={}",
            name,
            package.versions.len(),
            package.dist_tags.len()
        );

        Ok(package)
    }
}

pub fn encode_package_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replace('/', "%2F")
    } else {
        name.to_string()
    }
}
