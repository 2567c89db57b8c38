use thiserror::Error;

use crate::install_lock::AcquireError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to resolve application paths: {0}")]
    Paths(#[from] tunnel_platform::AppPathsError),

    #[error(transparent)]
    Lock(#[from] AcquireError),

    #[error(transparent)]
    Runner(#[from] tunnel_root::RootError),

    #[error("failed to encode status: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("install worker stopped before reporting a result")]
    WorkerLost,
}
