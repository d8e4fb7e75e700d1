use clap::Parser;
use hive::configuration::config::Config;
use hive::controller::controller_handler::Controller;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hive")]
#[command(version)]
#[command(about = "Session monitor of a low-interaction honeypot")]
struct Args {
    /// TOML configuration file
    config_file: PathBuf,

    /// Look up the public address of this deployment and attach it to every session
    #[arg(long, action = clap::ArgAction::SetTrue)]
    fetch_public_ip: bool,

    /// Delay between two passes over the session collection
    #[arg(long, env = "HIVE_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    info!("Importing configuration from {}", args.config_file.display());

    let config = match Config::from_file(&args.config_file) {
        Ok(config) => config.with_overrides(args.fetch_public_ip, args.poll_interval_ms),
        Err(e) => {
            error!("Unable to import configuration from file: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration imported successfully");

    let mut controller = Controller::new(config);

    if let Err(e) = controller.run().await {
        error!("Error occured in the controller process: {}, exiting...", e);
        std::process::exit(1);
    }
}
