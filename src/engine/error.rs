//! Errors surfaced at the engine boundary.
//!
//! The scans themselves are total over a validated snapshot; everything here
//! comes from loading inputs or from the task runtime.

use thiserror::Error;

use crate::dataset::DatasetError;

use super::ConfigError;

/// Top-level error returned by [`Engine`](super::Engine) constructors and
/// [`Engine::scan`](super::Engine::scan).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("dataset unavailable: {0}")]
    Dataset(#[from] DatasetError),

    #[error("scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
