mod app;
mod cli;
mod error;
mod install_lock;
mod logging;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use log::{error, warn};
use tunnel_platform::AppPaths;

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::error::AppError;
use crate::settings::AppSettings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<bool, AppError> {
    let paths = AppPaths::new()?;
    let (mut settings, settings_error) = match AppSettings::load(&paths) {
        Ok(settings) => (settings, None),
        Err(err) => (AppSettings::default(), Some(err)),
    };
    cli.apply_to(&mut settings);

    logging::init_logging(&paths, settings.debug_logging, settings.max_log_size_bytes);

    if let Some(err) = settings_error {
        warn!("Using default settings: {err}");
        eprintln!("warning: {err}; using default settings");
    }

    if !paths.settings_file().exists()
        && let Err(err) = AppSettings::default().save(&paths)
    {
        warn!("Failed to write default settings: {err}");
    }

    let app = App::new(paths, settings);

    match cli.command {
        Command::Status { json } => {
            let state = app.status();
            if json {
                println!("{}", serde_json::to_string(&state)?);
            } else {
                println!("{state}");
            }
            Ok(state.is_installed())
        }
        Command::Install => {
            let outcome = app.install().await?;
            println!("{outcome}");
            if let Some(hint) = app::outcome_hint(outcome) {
                eprintln!("hint: {hint}");
            }
            Ok(outcome.is_success())
        }
    }
}
