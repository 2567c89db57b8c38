use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::{AppSettings, RunnerSetting};

/// Install the bundled tunnel binary onto the read-only system partition.
#[derive(Parser, Debug)]
#[command(name = "tunnel", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override the ABI reported by this device
    #[arg(long, global = true, value_name = "ABI")]
    pub abi: Option<String>,

    /// Directory holding <abi>/<binary>.bin assets
    #[arg(long, global = true, value_name = "DIR")]
    pub asset_dir: Option<PathBuf>,

    /// Privilege helper used to run the install script
    #[arg(long, global = true, value_enum)]
    pub runner: Option<RunnerSetting>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report whether the binary is installed (exit code 0 when it is)
    Status {
        /// Print the detailed state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Install the binary unless it is already present
    Install,
}

impl Cli {
    /// Apply command-line overrides on top of the stored settings.
    pub fn apply_to(&self, settings: &mut AppSettings) {
        if self.debug {
            settings.debug_logging = true;
        }
        if let Some(abi) = &self.abi {
            settings.abi_override = Some(abi.clone());
        }
        if let Some(dir) = &self.asset_dir {
            settings.asset_dir = Some(dir.clone());
        }
        if let Some(runner) = self.runner {
            settings.runner = runner;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, Command};
    use crate::settings::{AppSettings, RunnerSetting};

    #[test]
    fn parses_status_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tunnel", "status", "--json", "--abi", "x86"])
            .expect("arguments parse");

        assert_eq!(cli.command, Command::Status { json: true });
        assert_eq!(cli.abi.as_deref(), Some("x86"));
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::try_parse_from([
            "tunnel",
            "--debug",
            "--asset-dir",
            "/opt/assets",
            "--runner",
            "pkexec",
            "install",
        ])
        .expect("arguments parse");
        let mut settings = AppSettings {
            abi_override: Some("mips".to_string()),
            ..AppSettings::default()
        };

        cli.apply_to(&mut settings);

        assert_eq!(cli.command, Command::Install);
        assert!(settings.debug_logging);
        assert_eq!(settings.asset_dir, Some(PathBuf::from("/opt/assets")));
        assert_eq!(settings.runner, RunnerSetting::Pkexec);
        assert_eq!(settings.abi_override.as_deref(), Some("mips"));
    }

    #[test]
    fn unknown_runner_is_rejected() {
        assert!(Cli::try_parse_from(["tunnel", "--runner", "sudo", "install"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["tunnel"]).is_err());
    }
}
