use chorus_server::{run_server, ConfigError, ServerConfig};
use colored::Colorize;
use log::{error, info};
use thiserror::Error;
use tokio::runtime;

mod logging;

#[derive(Debug, Error)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Could not build async runtime: {0}")]
    Runtime(std::io::Error),
    #[error("Server stopped: {0}")]
    Server(std::io::Error),
}

impl StartupError {
    fn hint(&self) -> String {
        match self {
            Self::Config(_) => "Check the CHORUS_SERVER_PORT, CHORUS_DRIFT_THRESHOLD and CHORUS_AUTOPLAY environment variables, or unset them to use the defaults.".to_string(),
            Self::Runtime(_) => "This error is fatal, and should not happen.".to_string(),
            Self::Server(_) => "Make sure the port is not in use by another process, or pick another one with CHORUS_SERVER_PORT.".to_string(),
        }
    }
}

fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;

    info!("Building async runtime...");
    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("chorus-async")
        .build()
        .map_err(StartupError::Runtime)?;

    info!(
        "Drift threshold is {}s, autoplay on enqueue is {}",
        config.sync.drift_threshold_in_seconds,
        if config.sync.autoplay_on_enqueue { "on" } else { "off" }
    );

    runtime
        .block_on(run_server(config))
        .map_err(StartupError::Server)
}

fn main() {
    if let Err(error) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", error);
        return;
    }

    if let Err(error) = run() {
        error!("{} Read the error below to troubleshoot the issue. If you think this might be a bug, please report it by making a GitHub issue.", "chorus failed to start!".bold().red());
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());

        std::process::exit(1);
    }
}
