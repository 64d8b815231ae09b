pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use config::CliConfig;

#[derive(Parser)]
#[command(name = "trades")]
#[command(about = "Trades CLI - list, create, edit and delete trades over the HTTP API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "API base URL (overrides TRADES_API_URL)")]
    pub url: Option<String>,

    #[arg(long, global = true, help = "Bearer token (overrides TRADES_API_TOKEN)")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Trades(commands::trades::TradeCommands),

    #[command(about = "Mint a development session token")]
    Token {
        #[command(flatten)]
        args: commands::token::TokenArgs,
    },

    #[command(about = "Check that the API server is reachable")]
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = CliConfig::from_env().with_overrides(cli.url, cli.token);

    match cli.command {
        Commands::Trades(cmd) => commands::trades::handle(cmd, output_format, &config).await,
        Commands::Token { args } => commands::token::handle(args, output_format),
        Commands::Health => commands::health(output_format, &config).await,
    }
}
