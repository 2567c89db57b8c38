use std::io::Read;
use std::path::Path;

/// Read-only bundle of prebuilt binaries, keyed by `"<abi>/<name>.bin"`.
pub trait AssetStore: Send + Sync {
    /// Open the asset stored under `key` as a byte stream.
    ///
    /// # Errors
    /// Returns an error if the asset does not exist or cannot be opened.
    fn open(&self, key: &str) -> std::io::Result<Box<dyn Read + Send>>;

    /// Byte length of the asset stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the asset does not exist or cannot be inspected.
    fn size(&self, key: &str) -> std::io::Result<u64>;
}

/// Builds the shell command that remounts a partition.
pub trait PartitionMounter: Send + Sync {
    /// Command text remounting `partition` read-only (`true`) or read-write.
    fn remount(&self, partition: &str, read_only: bool) -> String;
}

/// Executes a script with elevated privilege.
///
/// Completion is not observable: the call may return before the script has
/// run, while a privilege prompt is still pending, or after the request was
/// denied. Callers must re-derive success from file-system state.
pub trait PrivilegedRunner: Send + Sync {
    fn name(&self) -> &'static str;

    fn run_privileged(&self, script: &Path);
}
