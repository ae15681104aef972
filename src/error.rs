//! Error type for the fallible edges of the engine.
//!
//! The allocation and variance computations themselves never fail; they
//! degrade to empty or neutral results. Only loading a policy and crossing the
//! JSON boundary can produce an [`EngineError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A policy document parsed but its values are inconsistent
    #[error("invalid planning policy: {0}")]
    InvalidPolicy(String),

    #[error("failed to parse policy YAML: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
