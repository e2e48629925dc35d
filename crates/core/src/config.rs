//! TOML-based configuration for ghostbuster.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults for a DefinitelyTyped checkout. The GitHub token is never
//! stored in the file. `github.token_env` names the environment variable
//! holding it, resolved at runtime via [`GhostbusterConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::github::checker::DEFAULT_BATCH_SIZE;
use crate::patcher::Placeholder;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhostbusterConfig {
    /// Which directories and files to scan.
    #[serde(default)]
    pub scan: ScanConfig,

    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Replacement attribution settings.
    #[serde(default)]
    pub patch: PatchConfig,
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Source tree layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directories whose subdirectories are package directories.
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// File name of the header file in each package directory.
    #[serde(default = "default_header_file")]
    pub header_file: String,

    /// Directory names that are never descended into.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("types")]
}
fn default_header_file() -> String {
    "index.d.ts".into()
}
fn default_skip_dirs() -> Vec<String> {
    vec!["node_modules".into()]
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            header_file: default_header_file(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Environment variable holding the GitHub token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Maximum logins per GraphQL query.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token_env: default_token_env(),
            batch_size: default_batch_size(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Attribution written when a file's only contributor is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchConfig {
    #[serde(default = "default_placeholder_name")]
    pub placeholder_name: String,

    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,
}

fn default_placeholder_name() -> String {
    Placeholder::default().name
}
fn default_placeholder_url() -> String {
    Placeholder::default().url
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            placeholder_name: default_placeholder_name(),
            placeholder_url: default_placeholder_url(),
        }
    }
}

impl PatchConfig {
    pub fn placeholder(&self) -> Placeholder {
        Placeholder {
            name: self.placeholder_name.clone(),
            url: self.placeholder_url.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl GhostbusterConfig {
    /// Load a [`GhostbusterConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: GhostbusterConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve `github.token_env` into `github.token`.
    ///
    /// A missing variable only logs a warning here; use
    /// [`require_token`](Self::require_token) where the token is mandatory.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        self.github.token = resolve_optional_env(&self.github.token_env, "github.token_env");
        Ok(())
    }

    /// The resolved GitHub token, or a configuration error if it is unset.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.github.token_env.clone(),
                field: "github.token_env".into(),
            })
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.roots.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scan.roots".into(),
                detail: "at least one root directory is required".into(),
            });
        }
        if self.scan.header_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scan.header_file".into(),
                detail: "header file name must not be empty".into(),
            });
        }
        if self.github.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "github.batch_size".into(),
                detail: "batch size must be > 0".into(),
            });
        }
        if self.github.api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url".into(),
                detail: "GitHub API URL must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
