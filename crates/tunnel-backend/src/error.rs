use std::path::PathBuf;

use thiserror::Error;

use crate::types::InstallPhase;

/// I/O failure at one stage of an install attempt.
///
/// Every variant is transient: the stage fully overwrites its target, so the
/// whole install can simply be retried.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("failed to read asset {key}: {source}")]
    Asset {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write staged binary {}: {source}", path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write install script {}: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to inspect {}: {source}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    pub fn asset(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Asset {
            key: key.into(),
            source,
        }
    }

    pub fn stage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Stage {
            path: path.into(),
            source,
        }
    }

    pub fn script(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Script {
            path: path.into(),
            source,
        }
    }

    pub fn inspect(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Inspect {
            path: path.into(),
            source,
        }
    }

    /// The install phase the failure belongs to.
    #[must_use]
    pub fn phase(&self) -> InstallPhase {
        match self {
            Self::Asset { .. } | Self::Stage { .. } => InstallPhase::Staging,
            Self::Script { .. } => InstallPhase::GeneratingScript,
            Self::Inspect { .. } => InstallPhase::Verifying,
        }
    }
}
