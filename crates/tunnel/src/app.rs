use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc;
use tunnel_backend::{InstallOutcome, InstallPhase, InstallProgress, InstallState};
use tunnel_core::{Installer, InstallerConfig, WaitPolicy, spawn_install, verify_install};
use tunnel_platform::AppPaths;
use tunnel_root::{DirAssetStore, ProcMountsMounter, resolve_runner};

use crate::error::AppError;
use crate::install_lock::InstallLock;
use crate::settings::AppSettings;

pub struct App {
    paths: AppPaths,
    settings: AppSettings,
}

impl App {
    pub fn new(paths: AppPaths, settings: AppSettings) -> Self {
        Self { paths, settings }
    }

    fn installer_config(&self) -> InstallerConfig {
        let config =
            InstallerConfig::new(self.paths.files_dir()).with_wait(self.settings.wait_policy());
        match &self.settings.abi_override {
            Some(abi) => config.with_host_abi(abi.clone()),
            None => config,
        }
    }

    fn assets(&self) -> DirAssetStore {
        DirAssetStore::new(self.settings.asset_dir(&self.paths))
    }

    /// Check the destination without touching the privilege helper.
    pub fn status(&self) -> InstallState {
        verify_install(&self.assets(), &self.installer_config())
    }

    /// Run one install attempt on a worker thread, printing each phase as it
    /// starts.
    pub async fn install(&self) -> Result<InstallOutcome, AppError> {
        let _lock = InstallLock::acquire(&self.paths.install_lock_file())?;

        if self.status().is_installed() {
            info!("Binary already installed; skipping privilege request");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let runner = resolve_runner(self.settings.runner.kind())?;
        let assets = self.assets();
        debug!("Reading assets from {}", assets.root().display());

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let installer = Installer::new(
            self.installer_config(),
            Arc::new(assets),
            Arc::new(ProcMountsMounter::new()),
            runner,
        )
        .with_progress(progress_tx);

        debug!(
            "Installing {} for ABI {}",
            installer.config().binary_name,
            installer.selected_abi()
        );

        let wait = installer.config().wait;
        let result = spawn_install(Arc::new(installer));
        let reporter = tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                if let InstallProgress::Phase(phase) = progress {
                    eprintln!("{}", describe_phase(phase, wait));
                }
            }
        });

        let outcome = result.await.map_err(|_| AppError::WorkerLost)?;
        let _ = reporter.await;
        Ok(outcome)
    }
}

fn describe_phase(phase: InstallPhase, wait: WaitPolicy) -> String {
    match phase {
        InstallPhase::Waiting => {
            format!("{phase} (up to {}ms)...", wait.budget().as_millis())
        }
        _ => format!("{phase}..."),
    }
}

/// Follow-up advice for an attempt that handed the script to the privilege
/// helper but could not confirm the result.
pub fn outcome_hint(outcome: InstallOutcome) -> Option<&'static str> {
    (!outcome.is_success() && outcome.reached_runner()).then_some(
        "the privilege prompt may have been denied or may still be pending; \
         run `tunnel status` to check again",
    )
}
