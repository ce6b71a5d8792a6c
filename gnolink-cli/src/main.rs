//! GnoLink CLI - generate throwaway wallets and fund them.

use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use gnolink::config::{ENV_REQUIRED_CHAIN_ID, ENV_RPC_URL, GnolinkConfig};
use gnolink_cli::commands::{self, ENV_PRIVATE_KEY};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// GnoLink CLI - throwaway EVM wallets
#[derive(Parser, Debug)]
#[command(name = "gnolink")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint
    #[arg(long, env = ENV_RPC_URL)]
    rpc_url: Option<String>,

    /// Private key of the sending account
    #[arg(long, env = ENV_PRIVATE_KEY, hide_env_values = true)]
    private_key: Option<String>,

    /// Chain the sending account must be on
    #[arg(long, env = ENV_REQUIRED_CHAIN_ID)]
    required_chain_id: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate new keypairs
    Generate {
        /// Number of keypairs
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a balance (defaults to the sending account)
    Balance {
        /// Address to look up
        address: Option<Address>,
    },
    /// Send native currency
    Send {
        /// Amount in whole units, e.g. 0.001
        #[arg(short, long, default_value = "0.001")]
        amount: String,

        /// Recipient (a new wallet is generated if omitted)
        #[arg(long)]
        to: Option<Address>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("gnolink=debug,gnolink_cli=debug")
    } else {
        EnvFilter::new("gnolink=info,gnolink_cli=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<GnolinkConfig> {
    let mut config = match &args.config {
        Some(path) => GnolinkConfig::from_file(path)?
            .with_env_overrides(|key| std::env::var(key).ok())?,
        None => GnolinkConfig::from_env()?,
    };

    if let Some(url) = &args.rpc_url {
        config = config.rpc_url(url);
    }
    if let Some(chain_id) = args.required_chain_id {
        config = config.required_chain_id(chain_id);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let private_key = args.private_key.as_deref();

    match args.command {
        Command::Generate { count, json } => commands::generate(count, json)?,
        Command::Balance { address } => commands::balance(&config, private_key, address).await?,
        Command::Send { amount, to } => commands::send(&config, private_key, &amount, to).await?,
    }

    Ok(())
}
