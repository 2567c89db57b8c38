use std::sync::Arc;

use log::{debug, error};
use tokio::sync::oneshot;
use tunnel_backend::InstallOutcome;

use crate::installer::Installer;

/// Run [`Installer::install_outcome`] on a dedicated worker thread.
///
/// The wait phase sleeps, so the attempt never runs on the caller's thread.
/// The receiver resolves with the outcome, or with a `RecvError` if the
/// worker could not be started or panicked, which callers must treat as
/// not installed.
pub fn spawn_install(installer: Arc<Installer>) -> oneshot::Receiver<InstallOutcome> {
    let (sender, receiver) = oneshot::channel();

    let spawned = std::thread::Builder::new()
        .name("tunnel-install".to_string())
        .spawn(move || {
            let outcome = installer.install_outcome();
            if sender.send(outcome).is_err() {
                debug!("Install result dropped; receiver is gone");
            }
        });

    if let Err(error) = spawned {
        error!("Failed to start install worker: {error}");
    }

    receiver
}
