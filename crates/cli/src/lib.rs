pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use approval_chain_core::config::{AppConfig, LogFormat};
use approval_chain_core::PurchaseRequest;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(
    name = "approval-chain",
    about = "Purchase approval chain CLI",
    long_about = "Route purchase requests through the configured chain of approvers.",
    after_help = "Examples:\n  approval-chain process --id 1 --price 3000\n  approval-chain batch --file requests.json\n  approval-chain chain --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to approval-chain.toml")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Dispatch one purchase request to the head of the chain")]
    Process {
        #[arg(long, help = "Purchase request id")]
        id: u64,
        #[arg(long, help = "Purchase price, e.g. 3000 or 5000.01")]
        price: Decimal,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Dispatch a JSON array of purchase requests in order")]
    Batch {
        #[arg(long, help = "JSON file holding [{\"id\": .., \"price\": ..}, ...]")]
        file: PathBuf,
    },
    #[command(about = "Show the effective approver chain")]
    Chain {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    // a subscriber may already be installed when embedded in another binary
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match commands::load_config(cli.config) {
        Ok(config) => config,
        Err(result) => return finish(result),
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Process { id, price, json } => {
            commands::process::run(&config, &PurchaseRequest::new(id, price), json)
        }
        Command::Batch { file } => commands::batch::run(&config, &file),
        Command::Chain { json } => commands::chain::run(&config, json),
    };

    finish(result)
}

fn finish(result: commands::CommandResult) -> ExitCode {
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
