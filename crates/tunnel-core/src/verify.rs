use std::path::Path;

use log::{error, info};
use tunnel_backend::{AssetStore, InstallError, InstallState};

use crate::config::InstallerConfig;

/// Check the configured destination against the asset for the ABI `config`
/// currently selects. Staging and verification both resolve the asset
/// through [`InstallerConfig::asset_key`].
#[must_use]
pub fn verify_install(assets: &dyn AssetStore, config: &InstallerConfig) -> InstallState {
    check_installed(assets, &config.asset_key(), &config.destination)
}

/// Compare the binary at `destination` with the shipped asset `key`.
///
/// Only an existing regular file whose length equals the asset's length is
/// reported as installed. Any I/O error yields [`InstallState::Unknown`],
/// which callers must treat as not installed.
pub fn check_installed(assets: &dyn AssetStore, key: &str, destination: &Path) -> InstallState {
    let metadata = match std::fs::metadata(destination) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!("Binary not present at {}", destination.display());
            return InstallState::Missing;
        }
        Err(error) => {
            let error = InstallError::inspect(destination, error);
            error!("Cannot get size of installed binary: {error}");
            return InstallState::Unknown {
                reason: error.to_string(),
            };
        }
    };

    if !metadata.is_file() {
        info!("{} is not a regular file", destination.display());
        return InstallState::Unknown {
            reason: format!("{} is not a regular file", destination.display()),
        };
    }

    let shipped = match assets.size(key) {
        Ok(size) => size,
        Err(error) => {
            let error = InstallError::asset(key, error);
            error!("Cannot get size of shipped binary: {error}");
            return InstallState::Unknown {
                reason: error.to_string(),
            };
        }
    };

    let installed = metadata.len();
    if installed != shipped {
        info!(
            "Binary size mismatch: installed {installed} shipped {shipped} path {key} at {}",
            destination.display()
        );
        return InstallState::SizeMismatch { installed, shipped };
    }

    InstallState::Installed
}
