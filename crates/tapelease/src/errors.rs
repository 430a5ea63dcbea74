//! Error handling and exit codes.

use tapelease_core::{ConstructionError, PoolError};
use tapelease_orchestration::OrchestrationError;
use tapelease_tape::TapeError;

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: u8 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: u8 = 1;
    /// A worker gave up waiting for a pooled copy.
    pub const ERROR_TIMEOUT: u8 = 2;
    /// Parallel and serial results did not match.
    pub const ERROR_MISMATCH: u8 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: u8 = 4;
}

/// Errors surfaced by the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid flag or setting.
    #[error("configuration error: {0}")]
    Config(String),

    /// The pool could not be built.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// A lease could not be obtained.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The tape rejected an evaluation.
    #[error("evaluation failed: {0}")]
    Tape(#[from] TapeError),

    /// Parallel and serial runs disagree.
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    /// The worker thread pool could not be started.
    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Map an application error to its exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_) | AppError::Construction(ConstructionError::EmptyPool)) => {
            exit_codes::ERROR_CONFIG
        }
        Some(
            AppError::Pool(PoolError::Timeout(_))
            | AppError::Orchestration(OrchestrationError::Pool(PoolError::Timeout(_))),
        ) => exit_codes::ERROR_TIMEOUT,
        Some(AppError::Orchestration(
            OrchestrationError::Mismatch { .. } | OrchestrationError::LengthMismatch { .. },
        )) => exit_codes::ERROR_MISMATCH,
        _ => exit_codes::ERROR_GENERIC,
    }
}
