use std::io::Write;
use std::path::Path;

use log::debug;
use tunnel_backend::{InstallError, PartitionMounter};

use crate::staging::create_private_file;

/// Permission applied to the installed binary: owner read/write/execute.
pub const INSTALLED_MODE: &str = "700";

/// Render the install script. The four steps run in this order and must not
/// be reordered: remount read-write, copy, chmod, remount read-only.
#[must_use]
pub fn render_install_script(
    mounter: &dyn PartitionMounter,
    partition: &str,
    source: &Path,
    destination: &Path,
) -> String {
    let source = shell_quote(&source.to_string_lossy());
    let destination = shell_quote(&destination.to_string_lossy());

    let lines = [
        mounter.remount(partition, false),
        format!("cp {source} {destination}"),
        format!("chmod {INSTALLED_MODE} {destination}"),
        mounter.remount(partition, true),
    ];

    let mut script = String::new();
    for line in lines {
        script.push_str(&line);
        script.push('\n');
    }
    script
}

/// Write `contents` to `path`, replacing any previous script.
///
/// # Errors
/// Returns [`InstallError::Script`] if the file cannot be created or written.
pub fn write_install_script(path: &Path, contents: &str) -> Result<(), InstallError> {
    let mut file = create_private_file(path).map_err(|error| InstallError::script(path, error))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|error| InstallError::script(path, error))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .map_err(|error| InstallError::script(path, error))?;
    }

    debug!("Wrote install script {}", path.display());
    Ok(())
}

/// Quote `value` for `sh` only when it contains characters the shell would
/// interpret.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    let is_plain = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | ',')
        });
    if is_plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
