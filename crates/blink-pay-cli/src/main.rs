//! CLI wallet for the Blink custodial Lightning API

use anyhow::Result;
use blink_pay::{BlinkClient, Config};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod sub_commands;

/// Simple CLI application to interact with a Blink wallet
#[derive(Parser)]
#[command(name = "blink-pay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Blink API key
    #[arg(long, env = "BLINK_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Override the GraphQL endpoint
    #[arg(long)]
    endpoint: Option<String>,
    /// Logging level
    #[arg(short, long, default_value = "error")]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show wallet balances
    Balance,
    /// Send a payment by invoice, lightning address, or LNURL
    Send(sub_commands::send::SendSubCommand),
    /// Create an invoice to receive sats
    Receive(sub_commands::receive::ReceiveSubCommand),
    /// Look up proof of payment for an invoice
    Proof(sub_commands::proof::ProofSubCommand),
    /// Convert a satoshi amount to a display currency
    Price(sub_commands::price::PriceSubCommand),
    /// Manage contacts
    Contacts(sub_commands::contacts::ContactsSubCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    let env_filter = EnvFilter::new(args.log_level.to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut config = Config::new(args.api_key.clone());
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    let client = BlinkClient::new(&config)?;

    match &args.command {
        Commands::Balance => sub_commands::balance::balance(&client).await,
        Commands::Send(sub_command_args) => {
            sub_commands::send::send(&client, sub_command_args).await
        }
        Commands::Receive(sub_command_args) => {
            sub_commands::receive::receive(&client, sub_command_args).await
        }
        Commands::Proof(sub_command_args) => {
            sub_commands::proof::proof(&client, sub_command_args).await
        }
        Commands::Price(sub_command_args) => {
            sub_commands::price::price(&client, sub_command_args).await
        }
        Commands::Contacts(sub_command_args) => {
            sub_commands::contacts::contacts(&client, sub_command_args).await
        }
    }
}
