use crate::fetcher::RetryPolicy;
use directories::BaseDirs;
use std::collections::BTreeMap;
use std::time::Duration;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

#[derive(Debug, Clone)]
pub struct VtreeConfig {
    pub default_registry: String,
    pub scoped_registries: BTreeMap<String, String>,
    /// Tokens from `//host/:_authToken=` lines, keyed by host.
    pub registry_auth: BTreeMap<String, String>,
    /// Token for the default registry host only.
    pub auth_token: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for VtreeConfig {
    fn default() -> Self {
        VtreeConfig {
            default_registry: DEFAULT_REGISTRY.to_string(),
            scoped_registries: BTreeMap::new(),
            registry_auth: BTreeMap::new(),
            auth_token: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl VtreeConfig {
    pub fn from_env() -> Self {
        let mut rc = RcSettings::default();

        // 1) Global rc file in the user's home directory.
        if let Some(base) = BaseDirs::new() {
            apply_rc_file(&base.home_dir().join(".npmrc"), &mut rc);
        }

        // 2) Repo-level rc file in the current working directory.
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        apply_rc_file(&cwd.join(".npmrc"), &mut rc);

        // 3) Env overrides the default registry (npm-compatible).
        let mut default_registry = rc.registry.unwrap_or_else(|| DEFAULT_REGISTRY.to_string());
        if let Ok(value) = env::var("NPM_CONFIG_REGISTRY").or_else(|_| env::var("npm_config_registry"))
        {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                default_registry = trimmed.to_string();
            }
        }

        let auth_token = host_from_url(&default_registry)
            .and_then(|host| rc.auth_tokens.get(host).cloned())
            .or_else(|| non_empty_env("NPM_TOKEN"))
            .or_else(|| non_empty_env("NODE_AUTH_TOKEN"));

        VtreeConfig {
            default_registry,
            scoped_registries: rc.scoped,
            registry_auth: rc.auth_tokens,
            auth_token,
            retry: read_retry_policy_from_env(),
        }
    }
}

impl VtreeConfig {
    /// Token to send to `url`, if any. Host-specific rc tokens win; the
    /// default token is only sent to the default registry's host.
    pub fn auth_token_for_url(&self, url: &str) -> Option<&str> {
        let host = host_from_url(url)?;

        if let Some(token) = self.registry_auth.get(host) {
            return Some(token.as_str());
        }

        if let Some(default_host) = host_from_url(&self.default_registry)
            && host == default_host
            && let Some(token) = self.auth_token.as_ref()
        {
            return Some(token.as_str());
        }

        None
    }
}

#[derive(Default)]
struct RcSettings {
    registry: Option<String>,
    scoped: BTreeMap<String, String>,
    auth_tokens: BTreeMap<String, String>,
}

fn read_retry_policy_from_env() -> RetryPolicy {
    let mut policy = RetryPolicy::default();

    if let Some(value) = non_empty_env("VTREE_FETCH_ATTEMPTS")
        && let Ok(parsed) = value.parse::<u32>()
        && parsed > 0
    {
        policy = policy.with_max_attempts(parsed);
    }

    if let Some(value) = non_empty_env("VTREE_RETRY_DELAYS_MS") {
        policy = policy.with_delays(parse_delays(&value));
    }

    policy
}

fn parse_delays(value: &str) -> Vec<Duration> {
    value
        .split(',')
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .collect()
}

fn non_empty_env(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn apply_rc_file(path: &Path, rc: &mut RcSettings) {
    if !path.is_file() {
        return;
    }

    if let Ok(data) = fs::read_to_string(path) {
        apply_rc_contents(&data, rc);
    }
}

fn apply_rc_contents(data: &str, rc: &mut RcSettings) {
    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if value.is_empty() {
            continue;
        }

        if key == "registry" {
            rc.registry = Some(value.trim_end_matches('/').to_string());
        } else if let Some(scope) = key.strip_suffix(":registry") {
            let scope = scope.trim();
            if !scope.is_empty() {
                rc.scoped
                    .insert(scope.to_string(), value.trim_end_matches('/').to_string());
            }
        } else if let Some(prefix) = key.strip_suffix(":_authToken")
            && let Some(host) = host_from_url(prefix)
        {
            rc.auth_tokens.insert(host.to_string(), value.to_string());
        }
    }
}

/// Host portion of a registry URL or of an rc `//host/path/` prefix.
pub fn host_from_url(url: &str) -> Option<&str> {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_else(|| url.trim_start_matches("//"));
    let host = rest.split('/').next()?;

    if host.is_empty() { None } else { Some(host) }
}
