use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tunnel_backend::{
    AssetStore, InstallError, InstallOutcome, InstallPhase, InstallProgress, InstallState,
    PartitionMounter, PrivilegedRunner,
};

use crate::config::{InstallerConfig, WaitPolicy};
use crate::script::{render_install_script, write_install_script};
use crate::staging::stage_asset;
use crate::verify::verify_install;

/// Places the bundled binary on the protected partition.
///
/// The installer never writes the destination itself. It stages the binary
/// in private storage, writes a script that copies it, hands the script to
/// the privileged runner and then re-checks the destination. At most one
/// install attempt may be in flight per private directory.
pub struct Installer {
    config: InstallerConfig,
    assets: Arc<dyn AssetStore>,
    mounter: Arc<dyn PartitionMounter>,
    runner: Arc<dyn PrivilegedRunner>,
    progress: Option<UnboundedSender<InstallProgress>>,
}

impl Installer {
    #[must_use]
    pub fn new(
        config: InstallerConfig,
        assets: Arc<dyn AssetStore>,
        mounter: Arc<dyn PartitionMounter>,
        runner: Arc<dyn PrivilegedRunner>,
    ) -> Self {
        Self {
            config,
            assets,
            mounter,
            runner,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: UnboundedSender<InstallProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    #[must_use]
    pub fn selected_abi(&self) -> &str {
        self.config.selected_abi()
    }

    /// Asset key of the binary for the currently selected ABI.
    #[must_use]
    pub fn asset_key(&self) -> String {
        self.config.asset_key()
    }

    /// Observe the destination. The ABI is selected afresh on every call.
    #[must_use]
    pub fn check(&self) -> InstallState {
        verify_install(self.assets.as_ref(), &self.config)
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.check().is_installed()
    }

    /// Copy the selected binary into private storage.
    ///
    /// # Errors
    /// Returns an error if the asset cannot be read or the staged copy cannot
    /// be written.
    pub fn stage(&self) -> Result<PathBuf, InstallError> {
        let staged = self.config.staged_path();
        std::fs::create_dir_all(&self.config.private_dir)
            .map_err(|error| InstallError::stage(&self.config.private_dir, error))?;
        stage_asset(self.assets.as_ref(), &self.asset_key(), &staged)?;
        Ok(staged)
    }

    /// Write the install script copying private file `source` to
    /// `destination` on `partition`, and return the script path.
    ///
    /// # Errors
    /// Returns an error if the private path cannot be made absolute or the
    /// script cannot be written.
    pub fn generate_install_script(
        &self,
        partition: &str,
        source: &str,
        destination: &Path,
    ) -> Result<PathBuf, InstallError> {
        let script_path = self.config.script_path();
        let source = std::path::absolute(self.config.private_dir.join(source))
            .map_err(|error| InstallError::script(&script_path, error))?;

        let script = render_install_script(self.mounter.as_ref(), partition, &source, destination);
        write_install_script(&script_path, &script)?;
        Ok(script_path)
    }

    /// Install the binary unless it is already present.
    ///
    /// Blocks the calling thread for up to the configured wait budget; use
    /// [`crate::spawn_install`] from threads that must stay responsive.
    pub fn install(&self) -> bool {
        self.install_outcome().is_success()
    }

    pub fn install_outcome(&self) -> InstallOutcome {
        let outcome = self.run_install();
        match outcome {
            InstallOutcome::AlreadyInstalled | InstallOutcome::Installed => {
                info!("Install finished: {outcome}");
            }
            _ => warn!("Install finished: {outcome}"),
        }
        self.emit(InstallProgress::Finished(outcome));
        outcome
    }

    fn run_install(&self) -> InstallOutcome {
        self.emit(InstallProgress::Phase(InstallPhase::Checking));
        if self.is_installed() {
            return InstallOutcome::AlreadyInstalled;
        }

        self.emit(InstallProgress::Phase(InstallPhase::Staging));
        if let Err(error) = self.stage() {
            error!(
                "{} failed: cannot copy {} to temporary file: {error}",
                error.phase(),
                self.config.binary_name
            );
            return InstallOutcome::StagingFailed;
        }

        self.emit(InstallProgress::Phase(InstallPhase::GeneratingScript));
        let script = match self.generate_install_script(
            &self.config.partition,
            &self.config.staged_name,
            &self.config.destination,
        ) {
            Ok(script) => script,
            Err(error) => {
                error!("{} failed: {error}", error.phase());
                return InstallOutcome::ScriptFailed;
            }
        };

        self.emit(InstallProgress::Phase(InstallPhase::RequestingPrivilege));
        info!(
            "Requesting privileged execution of {} via {}",
            script.display(),
            self.runner.name()
        );
        self.runner.run_privileged(&script);

        self.emit(InstallProgress::Phase(InstallPhase::Waiting));
        if self.wait_for_install() {
            InstallOutcome::Installed
        } else {
            InstallOutcome::Unconfirmed
        }
    }

    fn wait_for_install(&self) -> bool {
        match self.config.wait {
            WaitPolicy::Fixed { grace } => {
                std::thread::sleep(grace);
                self.emit(InstallProgress::Phase(InstallPhase::Verifying));
                self.is_installed()
            }
            WaitPolicy::Poll { interval, timeout } => self.poll_until_installed(interval, timeout),
        }
    }

    fn poll_until_installed(&self, interval: Duration, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut interval = interval.max(Duration::from_millis(1));

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            std::thread::sleep(interval.min(remaining));

            self.emit(InstallProgress::Phase(InstallPhase::Verifying));
            if self.is_installed() {
                return true;
            }
            if Instant::now() >= deadline {
                info!(
                    "Binary not confirmed after {}ms; treating install as unconfirmed",
                    timeout.as_millis()
                );
                return false;
            }
            interval = WaitPolicy::next_interval(interval);
        }
    }

    fn emit(&self, progress: InstallProgress) {
        if let Some(sender) = &self.progress {
            let _ = sender.send(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use tunnel_backend::{
        AssetStore, InstallOutcome, InstallPhase, InstallProgress, PartitionMounter,
        PrivilegedRunner,
    };

    use super::Installer;
    use crate::config::{InstallerConfig, WaitPolicy};

    struct BytesAsset(Vec<u8>);

    impl AssetStore for BytesAsset {
        fn open(&self, _key: &str) -> std::io::Result<Box<dyn Read + Send>> {
            Ok(Box::new(std::io::Cursor::new(self.0.clone())))
        }

        fn size(&self, _key: &str) -> std::io::Result<u64> {
            Ok(self.0.len() as u64)
        }
    }

    struct TagMounter;

    impl PartitionMounter for TagMounter {
        fn remount(&self, partition: &str, read_only: bool) -> String {
            format!("remount-{}({partition})", if read_only { "ro" } else { "rw" })
        }
    }

    /// Copies the staged file to `destination` after `delay`, like a slow
    /// privilege prompt.
    struct DelayedCopyRunner {
        staged: PathBuf,
        destination: PathBuf,
        delay: Duration,
    }

    impl PrivilegedRunner for DelayedCopyRunner {
        fn name(&self) -> &'static str {
            "delayed-copy"
        }

        fn run_privileged(&self, _script: &Path) {
            let staged = self.staged.clone();
            let destination = self.destination.clone();
            let delay = self.delay;
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                let _ = std::fs::copy(staged, destination);
            });
        }
    }

    fn config(root: &Path) -> InstallerConfig {
        InstallerConfig::new(root.join("files"))
            .with_host_abi("x86")
            .with_destination("/system", &root.join("system-bin-iodine"))
            .with_wait(WaitPolicy::Fixed {
                grace: Duration::from_millis(10),
            })
    }

    #[test]
    fn generated_script_uses_absolute_staged_path() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path());
        std::fs::create_dir_all(&config.private_dir).expect("private dir");
        let installer = Installer::new(
            config.clone(),
            Arc::new(BytesAsset(b"bin".to_vec())),
            Arc::new(TagMounter),
            Arc::new(DelayedCopyRunner {
                staged: PathBuf::new(),
                destination: PathBuf::new(),
                delay: Duration::ZERO,
            }),
        );

        let script_path = installer
            .generate_install_script("/system", "iodine", Path::new("/system/bin/iodine"))
            .expect("script generated");

        let script = std::fs::read_to_string(&script_path).expect("script readable");
        let lines: Vec<&str> = script.lines().collect();
        let staged = std::path::absolute(config.private_dir.join("iodine")).expect("absolute");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "remount-rw(/system)");
        assert_eq!(
            lines[1],
            format!("cp {} /system/bin/iodine", staged.display())
        );
        assert_eq!(lines[2], "chmod 700 /system/bin/iodine");
        assert_eq!(lines[3], "remount-ro(/system)");
    }

    #[test]
    fn polling_picks_up_slow_runner() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path()).with_wait(WaitPolicy::Poll {
            interval: Duration::from_millis(20),
            timeout: Duration::from_secs(5),
        });
        let runner = DelayedCopyRunner {
            staged: config.staged_path(),
            destination: config.destination.clone(),
            delay: Duration::from_millis(150),
        };
        let installer = Installer::new(
            config,
            Arc::new(BytesAsset(vec![7_u8; 4096])),
            Arc::new(TagMounter),
            Arc::new(runner),
        );

        assert!(installer.install());
    }

    #[test]
    fn fixed_grace_reports_slow_runner_as_failure() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path());
        let runner = DelayedCopyRunner {
            staged: config.staged_path(),
            destination: config.destination.clone(),
            delay: Duration::from_millis(500),
        };
        let installer = Installer::new(
            config,
            Arc::new(BytesAsset(vec![7_u8; 4096])),
            Arc::new(TagMounter),
            Arc::new(runner),
        );

        assert!(!installer.install());
    }

    #[test]
    fn progress_follows_state_machine_order() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path());
        let runner = DelayedCopyRunner {
            staged: config.staged_path(),
            destination: config.destination.clone(),
            delay: Duration::ZERO,
        };
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
        let installer = Installer::new(
            config.with_wait(WaitPolicy::Fixed {
                grace: Duration::from_millis(200),
            }),
            Arc::new(BytesAsset(vec![1_u8; 64])),
            Arc::new(TagMounter),
            Arc::new(runner),
        )
        .with_progress(sender);

        assert!(installer.install());

        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events.as_slice(),
            [
                InstallProgress::Phase(InstallPhase::Checking),
                InstallProgress::Phase(InstallPhase::Staging),
                InstallProgress::Phase(InstallPhase::GeneratingScript),
                InstallProgress::Phase(InstallPhase::RequestingPrivilege),
                InstallProgress::Phase(InstallPhase::Waiting),
                InstallProgress::Phase(InstallPhase::Verifying),
                InstallProgress::Finished(InstallOutcome::Installed),
            ]
        );
    }

    #[test]
    fn unsupported_host_abi_uses_fallback_asset() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let installer = Installer::new(
            config(temp.path()).with_host_abi("arm64-v8a"),
            Arc::new(BytesAsset(Vec::new())),
            Arc::new(TagMounter),
            Arc::new(DelayedCopyRunner {
                staged: PathBuf::new(),
                destination: PathBuf::new(),
                delay: Duration::ZERO,
            }),
        );

        assert_eq!(installer.selected_abi(), "armeabi");
        assert_eq!(installer.asset_key(), "armeabi/iodine.bin");
    }
}
