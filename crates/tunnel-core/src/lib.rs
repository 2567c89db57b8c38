//! Install pipeline for the bundled tunnel binary.
//!
//! This crate holds the logic that is independent of the CLI and of the
//! concrete privilege and storage implementations:
//! - ABI selection and asset naming.
//! - Staging the asset into private storage.
//! - Rendering and writing the install script.
//! - Size-based verification of the destination.
//! - The [`Installer`] state machine and its background runner.

mod abi;
mod background;
mod config;
mod installer;
mod script;
mod staging;
mod verify;

/// ABI selection with fallback, and the asset key for a selected ABI.
pub use abi::{asset_key, select_abi};
/// Run an install attempt off the calling thread.
pub use background::spawn_install;
/// Installer settings and defaults.
pub use config::{
    DEFAULT_BINARY_NAME, DEFAULT_DESTINATION, DEFAULT_FALLBACK_ABI, DEFAULT_GRACE_PERIOD,
    DEFAULT_PARTITION, DEFAULT_SUPPORTED_ABIS, InstallerConfig, WaitPolicy,
};
pub use installer::Installer;
/// Install script rendering and writing.
pub use script::{INSTALLED_MODE, render_install_script, shell_quote, write_install_script};
pub use staging::stage_asset;
pub use verify::{check_installed, verify_install};
