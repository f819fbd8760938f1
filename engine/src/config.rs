use serde::Deserialize;
use std::{env, path::Path, path::PathBuf, time::Duration};
use thiserror::Error;

use feedview_types::UiOptions;

/// Endpoint the posts view reads when nothing is configured.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
/// Request deadline for the posts view; tighter than the fetcher's own default.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

pub const ENDPOINT_ENV: &str = "FEEDVIEW_ENDPOINT";
pub const TIMEOUT_ENV: &str = "FEEDVIEW_TIMEOUT_MS";

#[derive(Debug, Default, Deserialize)]
pub struct FeedviewConfig {
    pub app: Option<AppConfig>,
    pub feed: Option<FeedConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Couldn't read {} ({source})", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Couldn't parse {} ({source})", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Freeze the loading spinner.
    #[serde(default)]
    pub reduced_motion: bool,
}

/// Where posts come from.
///
/// ```toml
/// [feed]
/// endpoint = "https://jsonplaceholder.typicode.com/posts"
/// timeout_ms = 5000
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FeedConfig {
    /// Absolute URL; `${VAR}` references are expanded from the environment.
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Effective fetch settings after config and environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl FeedSettings {
    /// Resolve from config, then `FEEDVIEW_ENDPOINT` / `FEEDVIEW_TIMEOUT_MS`.
    pub fn resolve(config: Option<&FeedviewConfig>) -> Self {
        Self::resolve_with(config, |name| env::var(name).ok())
    }

    pub(crate) fn resolve_with(
        config: Option<&FeedviewConfig>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let feed = config.and_then(|cfg| cfg.feed.as_ref());
        let mut settings = Self::default();

        if let Some(endpoint) = feed
            .and_then(|f| f.endpoint.as_deref())
            .map(|raw| expand_env_vars_with(raw, &lookup))
            .filter(|e| !e.trim().is_empty())
        {
            settings.endpoint = endpoint;
        }
        if let Some(ms) = feed.and_then(|f| f.timeout_ms).filter(|ms| *ms > 0) {
            settings.timeout = Duration::from_millis(ms);
        }

        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|e| !e.trim().is_empty()) {
            settings.endpoint = endpoint;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => settings.timeout = Duration::from_millis(ms),
                _ => tracing::warn!("Ignoring invalid {TIMEOUT_ENV}: {raw}"),
            }
        }

        settings
    }
}

pub(crate) fn ui_options_from_config(config: Option<&FeedviewConfig>) -> UiOptions {
    let app = config.and_then(|cfg| cfg.app.as_ref());
    UiOptions {
        ascii_only: app.map(|cfg| cfg.ascii_only).unwrap_or(false),
        high_contrast: app.map(|cfg| cfg.high_contrast).unwrap_or(false),
        reduced_motion: app.map(|cfg| cfg.reduced_motion).unwrap_or(false),
    }
}

pub fn expand_env_vars(value: &str) -> String {
    expand_env_vars_with(value, |name| env::var(name).ok())
}

fn expand_env_vars_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&lookup(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl FeedviewConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".feedview").join("config.toml"))
}
