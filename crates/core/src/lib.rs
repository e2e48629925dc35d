//! Ghostbuster core library.
//!
//! Finds contributors in declaration-file headers whose GitHub accounts no
//! longer exist and rewrites those headers without them: header parsing,
//! source tree collection, batched GitHub lookups, the attribution patcher,
//! and the run orchestrator.

pub mod collector;
pub mod config;
pub mod engine;
pub mod errors;
pub mod github;
pub mod header;
pub mod patcher;

// Re-exports for convenience.
pub use collector::{DiskTree, MemoryTree, SourceTree};
pub use config::GhostbusterConfig;
pub use engine::{Ghostbuster, RunSummary};
pub use github::{GhostChecker, GraphQlClient};
pub use header::{GhostSet, Header};
pub use patcher::Patcher;
