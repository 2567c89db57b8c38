use std::path::PathBuf;

use log::debug;
use tunnel_backend::PartitionMounter;
use tunnel_core::shell_quote;

const PROC_MOUNTS: &str = "/proc/mounts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
}

/// Parse a mount table in `/proc/mounts` format.
///
/// Malformed lines are skipped. Octal escapes (`\040` for space and so on)
/// in the device and mount point are decoded.
#[must_use]
pub fn parse_mounts(contents: &str) -> Vec<MountEntry> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            let fstype = fields.next()?;
            Some(MountEntry {
                device: unescape_octal(device),
                mount_point: unescape_octal(mount_point),
                fstype: fstype.to_string(),
            })
        })
        .collect()
}

fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && let Some(digits) = bytes.get(i + 1..i + 4)
            && digits.iter().all(|digit| (b'0'..=b'7').contains(digit))
        {
            let value = digits
                .iter()
                .fold(0_u32, |acc, digit| acc * 8 + u32::from(digit - b'0'));
            if let Ok(byte) = u8::try_from(value) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Builds `mount -o remount` commands using the device and filesystem type
/// the partition is currently mounted with.
#[derive(Debug, Clone)]
pub struct ProcMountsMounter {
    mounts_path: PathBuf,
}

impl Default for ProcMountsMounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcMountsMounter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_mounts_file(PROC_MOUNTS)
    }

    #[must_use]
    pub fn with_mounts_file(path: impl Into<PathBuf>) -> Self {
        Self {
            mounts_path: path.into(),
        }
    }

    fn find(&self, partition: &str) -> Option<MountEntry> {
        let contents = match std::fs::read_to_string(&self.mounts_path) {
            Ok(contents) => contents,
            Err(error) => {
                debug!(
                    "Cannot read mount table {}: {error}",
                    self.mounts_path.display()
                );
                return None;
            }
        };

        // Later entries shadow earlier ones at the same mount point.
        parse_mounts(&contents)
            .into_iter()
            .rev()
            .find(|entry| entry.mount_point == partition)
    }
}

impl PartitionMounter for ProcMountsMounter {
    fn remount(&self, partition: &str, read_only: bool) -> String {
        let mode = if read_only { "ro" } else { "rw" };

        if let Some(entry) = self.find(partition) {
            return format!(
                "mount -o remount,{mode} -t {} {} {}",
                shell_quote(&entry.fstype),
                shell_quote(&entry.device),
                shell_quote(&entry.mount_point)
            );
        }

        debug!("{partition} not found in mount table; using bare remount");
        format!("mount -o remount,{mode} {}", shell_quote(partition))
    }
}
