use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tunnel_backend::PrivilegedRunner;
use tunnel_core::shell_quote;

use crate::error::RootError;

/// Supported privilege helpers, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    Su,
    Pkexec,
}

impl RunnerKind {
    pub const ALL: [RunnerKind; 2] = [RunnerKind::Su, RunnerKind::Pkexec];

    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Su => "su",
            Self::Pkexec => "pkexec",
        }
    }

    fn build(self, program: PathBuf) -> Arc<dyn PrivilegedRunner> {
        match self {
            Self::Su => Arc::new(SuRunner::new(program)),
            Self::Pkexec => Arc::new(PkexecRunner::new(program)),
        }
    }
}

impl FromStr for RunnerKind {
    type Err = RootError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "su" => Ok(Self::Su),
            "pkexec" => Ok(Self::Pkexec),
            other => Err(RootError::UnknownRunner(other.to_string())),
        }
    }
}

/// Return the first available helper and its resolved path.
#[must_use]
pub fn detect_runner() -> Option<(RunnerKind, PathBuf)> {
    RunnerKind::ALL.into_iter().find_map(|kind| {
        let path = which::which(kind.program()).ok()?;
        debug!("Found privilege helper {} at {}", kind.program(), path.display());
        Some((kind, path))
    })
}

/// Build a runner for `requested`, or for the first detected helper when
/// `None`.
///
/// # Errors
/// Returns an error if the requested helper, or any helper at all, cannot be
/// found in `PATH`.
pub fn resolve_runner(
    requested: Option<RunnerKind>,
) -> Result<Arc<dyn PrivilegedRunner>, RootError> {
    let (kind, path) = match requested {
        Some(kind) => {
            let path = which::which(kind.program())
                .map_err(|_| RootError::RunnerNotFound(kind.program()))?;
            (kind, path)
        }
        None => detect_runner().ok_or(RootError::NoRunner)?,
    };

    info!("Using privilege helper {}", path.display());
    Ok(kind.build(path))
}

/// Runs the script through `su -c "sh <script>"`.
#[derive(Debug, Clone)]
pub struct SuRunner {
    program: PathBuf,
}

impl SuRunner {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub(crate) fn command(&self, script: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-c")
            .arg(format!("sh {}", shell_quote(&script.to_string_lossy())));
        command
    }
}

impl PrivilegedRunner for SuRunner {
    fn name(&self) -> &'static str {
        "su"
    }

    fn run_privileged(&self, script: &Path) {
        spawn_detached(self.name(), self.command(script));
    }
}

/// Runs the script through `pkexec sh <script>`.
#[derive(Debug, Clone)]
pub struct PkexecRunner {
    program: PathBuf,
}

impl PkexecRunner {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub(crate) fn command(&self, script: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("sh").arg(script);
        command
    }
}

impl PrivilegedRunner for PkexecRunner {
    fn name(&self) -> &'static str {
        "pkexec"
    }

    fn run_privileged(&self, script: &Path) {
        spawn_detached(self.name(), self.command(script));
    }
}

/// Start `command` without waiting for it. The exit status is only logged;
/// the installer decides success by re-checking the destination.
fn spawn_detached(name: &'static str, mut command: Command) {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(error) => {
            error!("Failed to start {name}: {error}");
            return;
        }
    };

    let reaper = std::thread::Builder::new()
        .name(format!("{name}-reaper"))
        .spawn(move || match child.wait() {
            Ok(status) => debug!("{name} exited with {status}"),
            Err(error) => debug!("Failed to wait for {name}: {error}"),
        });

    if let Err(error) = reaper {
        debug!("Failed to start reaper for {name}: {error}");
    }
}
