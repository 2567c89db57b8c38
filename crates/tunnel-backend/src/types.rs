use serde::Serialize;
use std::fmt;

/// Observed state of the protected destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstallState {
    Installed,
    Missing,
    SizeMismatch { installed: u64, shipped: u64 },
    Unknown { reason: String },
}

impl InstallState {
    #[must_use]
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed)
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => write!(f, "installed"),
            Self::Missing => write!(f, "not installed"),
            Self::SizeMismatch { installed, shipped } => write!(
                f,
                "size mismatch (installed {installed} bytes, shipped {shipped} bytes)"
            ),
            Self::Unknown { reason } => write!(f, "unknown ({reason})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Checking,
    Staging,
    GeneratingScript,
    RequestingPrivilege,
    Waiting,
    Verifying,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "checking"),
            Self::Staging => write!(f, "staging"),
            Self::GeneratingScript => write!(f, "script generation"),
            Self::RequestingPrivilege => write!(f, "privilege request"),
            Self::Waiting => write!(f, "waiting"),
            Self::Verifying => write!(f, "verification"),
        }
    }
}

/// Final result of one install attempt.
///
/// `Unconfirmed` covers every case where the privileged script was requested
/// but the binary did not show up in time: the runner failed, privilege was
/// denied, or the script is still running. These cannot be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    AlreadyInstalled,
    Installed,
    StagingFailed,
    ScriptFailed,
    Unconfirmed,
}

impl InstallOutcome {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::AlreadyInstalled | Self::Installed)
    }

    /// Whether the privileged runner was asked to execute a script.
    #[must_use]
    pub fn reached_runner(self) -> bool {
        matches!(self, Self::Installed | Self::Unconfirmed)
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInstalled => write!(f, "already installed"),
            Self::Installed => write!(f, "installed"),
            Self::StagingFailed => write!(f, "could not stage the binary"),
            Self::ScriptFailed => write!(f, "could not write the install script"),
            Self::Unconfirmed => write!(
                f,
                "installation not confirmed (privilege denied, failed, or still pending)"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallProgress {
    Phase(InstallPhase),
    Finished(InstallOutcome),
}
