//! perpdesk: Binance USDT-M futures account overview and testnet trading

mod commands;
mod config;
mod display;

use clap::{Parser, Subcommand, ValueEnum};
use perpdesk_core::{SessionRuntime, init_logging};
use perpdesk_exchanges::binance::{Credentials, FuturesConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "perpdesk", version, about = "Binance USDT-M futures client")]
struct Cli {
    /// Credentials file with "api_key" and "api_secret"
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Testnet account overview, then the test trading menu
    Test,
    /// Mainnet account overview (read-only)
    Main,
    /// Same as `test`
    Trade,
    /// Account overview for one network
    Status {
        #[arg(long, value_enum, default_value_t = Network::Testnet)]
        env: Network,
    },
    /// Change leverage for a symbol
    Leverage {
        symbol: String,
        leverage: u32,
        #[arg(long, value_enum, default_value_t = Network::Testnet)]
        env: Network,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    fn config(self) -> FuturesConfig {
        match self {
            Network::Testnet => FuturesConfig::testnet(),
            Network::Mainnet => FuturesConfig::mainnet(),
        }
    }
}

async fn dispatch(command: Option<Command>, credentials: Credentials) -> anyhow::Result<()> {
    match command {
        None => commands::run_interactive(credentials).await,
        Some(Command::Test | Command::Trade) => commands::run_trade(credentials).await,
        Some(Command::Main) => commands::run_overview(FuturesConfig::mainnet(), credentials).await,
        Some(Command::Status { env }) => commands::run_overview(env.config(), credentials).await,
        Some(Command::Leverage { symbol, leverage, env }) => {
            commands::run_leverage(env.config(), credentials, &symbol, leverage).await
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    init_logging("warn");

    let credentials = match config::load_credentials(&cli.config) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match SessionRuntime::new().start(|| dispatch(cli.command, credentials)) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            perpdesk_core::log_error!("session", format!("{e:?}"));
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            ExitCode::FAILURE
        }
    }
}
