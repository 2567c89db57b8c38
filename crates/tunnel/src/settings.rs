use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tunnel_core::WaitPolicy;
use tunnel_platform::AppPaths;
use tunnel_root::RunnerKind;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    /// Directory holding `<abi>/<binary>.bin` assets.
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,

    /// Replaces the ABI reported by the host.
    #[serde(default)]
    pub abi_override: Option<String>,

    #[serde(default)]
    pub runner: RunnerSetting,

    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// When set, verification polls until this deadline instead of checking
    /// once after the grace period.
    #[serde(default)]
    pub poll_timeout_ms: Option<u64>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RunnerSetting {
    #[default]
    Auto,
    Su,
    Pkexec,
}

impl RunnerSetting {
    pub fn kind(self) -> Option<RunnerKind> {
        match self {
            Self::Auto => None,
            Self::Su => Some(RunnerKind::Su),
            Self::Pkexec => Some(RunnerKind::Pkexec),
        }
    }
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_grace_period_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            asset_dir: None,
            abi_override: None,
            runner: RunnerSetting::Auto,
            grace_period_ms: default_grace_period_ms(),
            poll_timeout_ms: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AppSettings {
    /// Read settings. A missing file yields the defaults; an unreadable or
    /// invalid one is reported so the caller can fall back once logging is up.
    pub fn load(paths: &AppPaths) -> Result<Self, SettingsError> {
        let path = paths.settings_file();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse { path, source })
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), std::io::Error> {
        paths.ensure_dirs()?;

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.settings_file(), content)?;
        Ok(())
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        match self.poll_timeout_ms {
            Some(timeout) => WaitPolicy::Poll {
                interval: Duration::from_millis(self.poll_interval_ms),
                timeout: Duration::from_millis(timeout),
            },
            None => WaitPolicy::Fixed {
                grace: Duration::from_millis(self.grace_period_ms),
            },
        }
    }

    pub fn asset_dir(&self, paths: &AppPaths) -> PathBuf {
        self.asset_dir
            .clone()
            .unwrap_or_else(|| paths.assets_dir())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use serde_json::json;
    use tunnel_core::WaitPolicy;
    use tunnel_platform::AppPaths;
    use tunnel_root::RunnerKind;

    use super::{AppSettings, RunnerSetting, SettingsError};

    #[test]
    fn defaults_match_documented_values() {
        let settings = AppSettings::default();

        assert!(!settings.debug_logging);
        assert_eq!(settings.max_log_size_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.grace_period_ms, 1000);
        assert_eq!(settings.poll_interval_ms, 250);
        assert_eq!(settings.poll_timeout_ms, None);
        assert_eq!(settings.runner, RunnerSetting::Auto);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: AppSettings = serde_json::from_value(json!({
            "runner": "pkexec",
            "abi_override": "x86",
        }))
        .expect("settings JSON should deserialize");

        assert_eq!(settings.runner.kind(), Some(RunnerKind::Pkexec));
        assert_eq!(settings.abi_override.as_deref(), Some("x86"));
        assert_eq!(settings.grace_period_ms, 1000);
    }

    #[test]
    fn wait_policy_follows_poll_timeout() {
        let mut settings = AppSettings::default();
        assert_eq!(
            settings.wait_policy(),
            WaitPolicy::Fixed {
                grace: Duration::from_secs(1)
            }
        );

        settings.poll_timeout_ms = Some(30_000);
        assert_eq!(
            settings.wait_policy(),
            WaitPolicy::Poll {
                interval: Duration::from_millis(250),
                timeout: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn save_then_load_preserves_values() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());
        let settings = AppSettings {
            debug_logging: true,
            asset_dir: Some(PathBuf::from("/opt/tunnel/assets")),
            runner: RunnerSetting::Su,
            ..AppSettings::default()
        };

        settings.save(&paths).expect("settings saved");
        let loaded = AppSettings::load(&paths).expect("settings load");

        assert!(loaded.debug_logging);
        assert_eq!(loaded.asset_dir, Some(PathBuf::from("/opt/tunnel/assets")));
        assert_eq!(loaded.runner, RunnerSetting::Su);
    }

    #[test]
    fn corrupt_file_is_reported_instead_of_logged() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());
        paths.ensure_dirs().expect("dirs created");
        std::fs::write(paths.settings_file(), "{ not json").expect("settings written");

        let error = AppSettings::load(&paths).expect_err("invalid settings are reported");

        assert!(matches!(error, SettingsError::Parse { .. }));
        assert!(error.to_string().starts_with("invalid settings file"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());

        let loaded = AppSettings::load(&paths).expect("missing file is not an error");

        assert_eq!(loaded.grace_period_ms, 1000);
        assert_eq!(loaded.runner, RunnerSetting::Auto);
    }

    #[test]
    fn asset_dir_defaults_to_data_dir() {
        let paths = AppPaths::rooted_at("/tmp/tunnel-settings");

        assert_eq!(AppSettings::default().asset_dir(&paths), paths.assets_dir());
    }
}
