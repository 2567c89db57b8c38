use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use tunnel_backend::{AssetStore, InstallError};

const COPY_BUFFER_SIZE: usize = 8192;

/// Copy asset `key` to `dest`, replacing whatever was there.
///
/// Returns the number of bytes written. Both streams are dropped on every
/// exit path; a failed copy may leave a partial file, which the next attempt
/// truncates.
///
/// # Errors
/// Returns [`InstallError::Asset`] when the asset cannot be opened or read and
/// [`InstallError::Stage`] when the staged file cannot be written.
pub fn stage_asset(assets: &dyn AssetStore, key: &str, dest: &Path) -> Result<u64, InstallError> {
    let mut reader = assets
        .open(key)
        .map_err(|error| InstallError::asset(key, error))?;
    let mut writer = BufWriter::new(
        create_private_file(dest).map_err(|error| InstallError::stage(dest, error))?,
    );

    let mut buffer = [0_u8; COPY_BUFFER_SIZE];
    let mut copied: u64 = 0;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(InstallError::asset(key, error)),
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|error| InstallError::stage(dest, error))?;
        copied += read as u64;
    }

    writer
        .flush()
        .map_err(|error| InstallError::stage(dest, error))?;

    debug!("Staged {key} to {} ({copied} bytes)", dest.display());
    Ok(copied)
}

/// Open `path` for writing, truncating any previous content. On Unix the file
/// is created owner-only.
pub(crate) fn create_private_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}
