pub mod commands;
pub mod frontdesk;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use concierge_core::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "concierge",
    about = "Room service ordering agent",
    long_about = "Take, validate, and place room service orders through a conversational agent.",
    after_help = "Examples:\n  concierge chat\n  concierge menu\n  concierge config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run an interactive room service chat session")]
    Chat,
    #[command(about = "Print the current menu")]
    Menu,
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions { config_path: cli.config.clone() }) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::from(2);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Chat => commands::chat::run(&config).await,
        Command::Menu => {
            println!("{}", commands::menu::run());
            Ok(())
        }
        Command::Config => {
            println!("{}", commands::config::run(&config));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
