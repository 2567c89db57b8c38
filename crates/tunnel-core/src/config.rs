use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::abi::{asset_key, select_abi};

pub const DEFAULT_BINARY_NAME: &str = "iodine";
pub const DEFAULT_PARTITION: &str = "/system";
pub const DEFAULT_DESTINATION: &str = "/system/bin/iodine";
pub const DEFAULT_STAGED_NAME: &str = "iodine";
pub const DEFAULT_SCRIPT_NAME: &str = "install.sh";
pub const DEFAULT_FALLBACK_ABI: &str = "armeabi";
pub const DEFAULT_SUPPORTED_ABIS: [&str; 4] = ["armeabi", "armeabi-v7a", "mips", "x86"];
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(1000);

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long to wait for the privileged script before re-verifying.
///
/// Both policies are fail-closed: when time runs out the attempt is reported
/// as unconfirmed, never as installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Sleep once, then verify once.
    Fixed { grace: Duration },
    /// Verify repeatedly, doubling the interval up to 2s, until the binary is
    /// installed or `timeout` has elapsed.
    Poll { interval: Duration, timeout: Duration },
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::Fixed {
            grace: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl WaitPolicy {
    /// Upper bound on the time spent waiting.
    #[must_use]
    pub fn budget(&self) -> Duration {
        match *self {
            Self::Fixed { grace } => grace,
            Self::Poll { timeout, .. } => timeout,
        }
    }

    pub(crate) fn next_interval(current: Duration) -> Duration {
        (current * 2).min(MAX_POLL_INTERVAL)
    }
}

/// Everything one install attempt needs to know, passed explicitly so that
/// staging and verification always agree on the selected binary.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Architecture string reported by the host.
    pub host_abi: String,
    pub supported_abis: Vec<String>,
    pub fallback_abi: String,
    pub binary_name: String,
    pub partition: String,
    pub destination: PathBuf,
    /// Unprivileged, process-private storage.
    pub private_dir: PathBuf,
    pub staged_name: String,
    pub script_name: String,
    pub wait: WaitPolicy,
}

impl InstallerConfig {
    #[must_use]
    pub fn new(private_dir: impl Into<PathBuf>) -> Self {
        Self {
            host_abi: tunnel_platform::host_abi(),
            supported_abis: DEFAULT_SUPPORTED_ABIS
                .iter()
                .map(ToString::to_string)
                .collect(),
            fallback_abi: DEFAULT_FALLBACK_ABI.to_string(),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            partition: DEFAULT_PARTITION.to_string(),
            destination: PathBuf::from(DEFAULT_DESTINATION),
            private_dir: private_dir.into(),
            staged_name: DEFAULT_STAGED_NAME.to_string(),
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            wait: WaitPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_host_abi(mut self, abi: impl Into<String>) -> Self {
        self.host_abi = abi.into();
        self
    }

    #[must_use]
    pub fn with_destination(mut self, partition: impl Into<String>, destination: &Path) -> Self {
        self.partition = partition.into();
        self.destination = destination.to_path_buf();
        self
    }

    #[must_use]
    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// ABI whose binary is staged and verified. Selected afresh on every call.
    #[must_use]
    pub fn selected_abi(&self) -> &str {
        select_abi(&self.host_abi, &self.supported_abis, &self.fallback_abi)
    }

    #[must_use]
    pub fn asset_key(&self) -> String {
        asset_key(self.selected_abi(), &self.binary_name)
    }

    #[must_use]
    pub fn staged_path(&self) -> PathBuf {
        self.private_dir.join(&self.staged_name)
    }

    #[must_use]
    pub fn script_path(&self) -> PathBuf {
        self.private_dir.join(&self.script_name)
    }
}
