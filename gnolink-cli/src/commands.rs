//! Subcommand implementations for the `gnolink` binary.
//!
//! Each command builds the library collaborators it needs from a
//! [`GnolinkConfig`] and prints plain text (or JSON) to stdout.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, bail};
use gnolink::account::shorten_address;
use gnolink::prelude::*;
use serde_json::json;
use tracing::{debug, info};

/// Where the stand-in signer's private key comes from.
pub const ENV_PRIVATE_KEY: &str = "GNOLINK_PRIVATE_KEY";

/// Print `count` freshly generated keypairs.
pub fn generate(count: usize, as_json: bool) -> anyhow::Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }

    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        keys.push(Keypair::generate()?);
    }

    if as_json {
        let entries: Vec<_> = keys
            .iter()
            .map(|k| {
                json!({
                    "address": k.address_string(),
                    "private_key": k.private_key_hex(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (i, key) in keys.iter().enumerate() {
        if count > 1 {
            println!("[{}]", i + 1);
        }
        println!("Address:     {}", key.address_string());
        println!("Private key: {}", key.private_key_hex());
    }
    Ok(())
}

/// Connect the stand-in signer from the configured key and endpoint.
async fn connect_signer(
    config: &GnolinkConfig,
    private_key: Option<&str>,
) -> anyhow::Result<LocalSigningProvider> {
    let rpc_url = config.require_rpc_url()?;
    let private_key =
        private_key.with_context(|| format!("no signing key; set {ENV_PRIVATE_KEY}"))?;

    let signer = LocalSigningProvider::builder()
        .private_key(private_key)
        .rpc_url(rpc_url)
        .build()
        .await?;
    debug!(address = %signer.address(), chain_id = signer.chain_id(), "signer connected");
    Ok(signer)
}

fn gateway_for(config: &GnolinkConfig, signer: &LocalSigningProvider) -> RpcGateway {
    RpcGateway::from_provider(signer.provider().clone())
        .with_poll_interval(config.poll_interval())
        .with_dropped_after(config.dropped_after)
        .with_max_poll_errors(config.max_poll_errors)
}

fn print_network(network: &Network) {
    if network.is_known() {
        println!("Network: {network}");
    } else {
        println!("Network: {network} (unrecognized, assuming {} decimals)", network.decimals);
    }
}

/// Show the balance of `address`, or a summary of the signer's account.
pub async fn balance(
    config: &GnolinkConfig,
    private_key: Option<&str>,
    address: Option<Address>,
) -> anyhow::Result<()> {
    if let Some(address) = address {
        let gateway = RpcGateway::connect(config.require_rpc_url()?).await?;
        let network = Network::from_chain_id(gateway.chain_id().await?);
        let balance = gateway.balance(address).await?;
        println!("Address: {}", address.to_checksum(None));
        print_network(&network);
        println!(
            "Balance: {} {}",
            format_amount(balance, network.decimals),
            network.symbol
        );
        return Ok(());
    }

    let signer = connect_signer(config, private_key).await?;
    let gateway = gateway_for(config, &signer);
    let summary = AccountSummary::fetch(&signer, &gateway, config.required_chain_id).await?;

    println!("Account: {}", summary.short_address());
    print_network(&summary.network);
    println!("Balance: {}", summary.balance_display());
    if summary.needs_network_switch {
        println!(
            "Switch to {} to send.",
            Network::from_chain_id(config.required_chain_id)
        );
    }
    Ok(())
}

/// Send `amount` from the signer to `to`, or to a freshly generated wallet.
pub async fn send(
    config: &GnolinkConfig,
    private_key: Option<&str>,
    amount: &str,
    to: Option<Address>,
) -> anyhow::Result<()> {
    let signer = connect_signer(config, private_key).await?;

    let destination = if let Some(to) = to {
        to
    } else {
        let keypair = Keypair::generate()?;
        println!("Generated wallet");
        println!("  Address:     {}", keypair.address_string());
        println!("  Private key: {}", keypair.private_key_hex());
        keypair.address()
    };

    let orchestrator = TransferOrchestrator::new(Arc::new(gateway_for(config, &signer)));
    let request = TransferRequest::new(destination, amount, config.required_chain_id);
    let transfer = orchestrator.prepare(request, &signer)?;

    let network = Network::from_chain_id(config.required_chain_id);
    info!(
        from = %signer.address(),
        to = %destination,
        network = %network,
        "sending {amount} {}",
        network.symbol
    );
    println!(
        "Sending {amount} {} from {} to {}",
        network.symbol,
        shorten_address(&signer.address()),
        shorten_address(&destination)
    );

    let mut states = transfer.subscribe();
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            println!("  -> {state}");
        }
    });

    let outcome = transfer.execute().await;
    // The sender is dropped once `execute` returns, which ends the printer.
    printer.await.ok();

    report(&outcome);
    if let Some(failure) = outcome.failure() {
        bail!("transfer failed: {failure}");
    }
    Ok(())
}

fn report(outcome: &TransferOutcome) {
    println!();
    if let Some(hash) = outcome.hash() {
        println!("Transaction: {hash:#x}");
    }
    println!("State: {}", outcome.state().as_str());
    print!("{}", outcome.metrics());
}
