mod app;
mod chat_cmd;
mod config_cmd;
mod doctor_cmd;
mod engines_cmd;
mod ocr_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scanchat_config::load_and_prepare;
use scanchat_core::EngineId;
use scanchat_logging::init_logger;
use tracing::error;

use config_cmd::ConfigCommands;

#[derive(Parser)]
#[command(name = "scanchat")]
#[command(about = "ScanChat: extract text from images and chat about them")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.scanchat/config.yaml or $SCANCHAT_CONFIG_DIR/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recognition engines and their readiness
    Engines,
    /// Extract the text of an image
    Ocr {
        image: PathBuf,
        /// local, openai or gemini
        #[arg(short, long)]
        engine: Option<EngineId>,
    },
    /// Extract the text of an image, then chat about it
    Chat {
        image: PathBuf,
        #[arg(short, long)]
        engine: Option<EngineId>,
    },
    /// Check tesseract and API keys
    Doctor,
    /// Inspect or edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = app::resolve_config_path(cli.config);

    if let Commands::Config(cmd) = cli.command {
        return config_cmd::run(cmd, &config_path).await;
    }

    let (config, report) = load_and_prepare(&config_path).await?;
    let _log_guard = init_logger(app::log_dir(&config), config.log_level(), config.log_json());
    if !report.is_valid() {
        for e in &report.errors {
            error!(path = %e.path, message = %e.message, "Invalid config");
        }
        anyhow::bail!("invalid config at {}; run `scanchat config check`", config_path.display());
    }

    match cli.command {
        Commands::Engines => {
            let workbench = app::build_workbench(&config, None)?;
            engines_cmd::run(&workbench).await
        }
        Commands::Doctor => doctor_cmd::run(&config).await,
        Commands::Ocr { image, engine } => {
            let workbench = app::build_workbench(&config, engine)?;
            ocr_cmd::run(workbench, image).await
        }
        Commands::Chat { image, engine } => {
            let workbench = app::build_workbench(&config, engine)?;
            chat_cmd::run(workbench, image).await
        }
        Commands::Config(_) => Ok(()),
    }
}
