// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Error Types

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised at the boundaries of the engine.
///
/// Overflow and stall are never errors: they are reported as data in
/// [`crate::PipelineState`]. These variants only cover malformed input
/// arriving from outside the model.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("unknown database mode '{0}' (expected 'postgres' or 'mongodb')")]
    UnknownDatabaseMode(String),

    #[error("unknown backlog policy '{0}' (expected 'recompute' or 'accumulate')")]
    UnknownBacklogPolicy(String),

    #[error("invalid model parameter `{field}`: {reason}")]
    InvalidParams { field: &'static str, reason: String },

    #[error("failed to parse model parameters: {0}")]
    ParamsParse(#[from] serde_json::Error),
}
