//! Error types for the ghostbuster core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for the orchestrator.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for a ghostbuster run.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from the GitHub GraphQL existence lookups.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// The response carried no `data` at all, only errors.
    #[error("GitHub GraphQL query returned no data: {}", .messages.join("; "))]
    NoData { messages: Vec<String> },

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Header parsing errors
// ---------------------------------------------------------------------------

/// Reasons a file's contributor header could not be parsed.
///
/// These are never fatal: the collector drops the file and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderParseError {
    #[error("header does not start with '// Type definitions for'")]
    MissingTitle,

    #[error("header has no '// Definitions by:' line")]
    MissingContributors,

    #[error("header has no '// Definitions:' line")]
    MissingDefinitionsUrl,

    #[error("'// Definitions by:' must come before '// Definitions:'")]
    OutOfOrder,

    #[error("malformed contributor entry: {0}")]
    MalformedContributor(String),
}

// ---------------------------------------------------------------------------
// Collection errors
// ---------------------------------------------------------------------------

/// Errors from walking the source tree.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A configured root directory does not exist.
    #[error("source root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// A configured root exists but is not a directory.
    #[error("source root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

// ---------------------------------------------------------------------------
// Patch errors
// ---------------------------------------------------------------------------

/// Structural violations detected while rewriting an attribution block.
///
/// Every variant means the header no longer matches the convention the
/// patcher relies on, so none of them is recoverable.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("no '// Definitions by:' line to patch")]
    LabelNotFound,

    #[error("no '// Definitions:' line after the contributor block")]
    DefinitionsNotFound,

    #[error("definition header not in expected order ('Definitions by:' at {start}, 'Definitions:' at {end})")]
    OutOfOrder { start: usize, end: usize },

    #[error("span {start}..{end} is not a valid range of the header text")]
    InvalidSpan { start: usize, end: usize },

    #[error("placeholder substitution left the header unchanged")]
    SubstitutionUnchanged,

    #[error("a ghost was detected but no contributor was removed")]
    NothingRemoved,

    #[error("failed to write patched header to '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
