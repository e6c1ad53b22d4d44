mod commands;
mod config;
mod dev_wallet;
mod orchestration;

use std::{ops::ControlFlow, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::{Address, ChainId};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wallet_core::{
    units::{self, ETHER_DECIMALS},
    FixedPrompt,
};

use crate::{
    commands::WidgetCommand,
    dev_wallet::{DevWallet, DevWalletOptions},
    orchestration::WidgetHost,
};

/// Wallet-connect and mint widget driven from the terminal against an
/// in-process wallet.
#[derive(Parser, Debug)]
#[command(name = "mint_widget")]
struct Args {
    /// Settings file; missing means defaults.
    #[arg(long, default_value = "mint_widget.toml")]
    config: PathBuf,
    /// Accounts held by the dev wallet, first is selected.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F"
    )]
    accounts: Vec<String>,
    /// Site access was granted on a previous visit.
    #[arg(long)]
    authorized: bool,
    /// Chain the dev wallet starts on.
    #[arg(long, default_value = "0x2105")]
    wallet_chain: ChainId,
    /// Dev wallet balance in ETH.
    #[arg(long, default_value = "0.05")]
    balance: String,
    /// Run without an injected wallet.
    #[arg(long)]
    no_wallet: bool,
    /// The dev wallet rejects account requests.
    #[arg(long)]
    reject_connect: bool,
    /// Answer "no" to every confirmation dialog.
    #[arg(long)]
    decline_prompts: bool,
    /// Overrides the simulated mint failure rate.
    #[arg(long)]
    mint_failure_rate: Option<f64>,
    /// Commands to run instead of reading stdin, separated by ';'.
    #[arg(long, value_delimiter = ';')]
    script: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(rate) = args.mint_failure_rate {
        settings.mint_failure_rate = rate;
    }
    let mint_request = settings.validate()?;
    info!(
        contract = %mint_request.contract_address,
        price = %mint_request.price,
        chain = %settings.widget.target_chain.chain_id,
        "mint widget starting"
    );

    let wallet = if args.no_wallet {
        None
    } else {
        let balance_wei = units::parse_units(&args.balance, ETHER_DECIMALS)
            .with_context(|| format!("invalid --balance '{}'", args.balance))?;
        Some(Arc::new(DevWallet::new(DevWalletOptions {
            accounts: args.accounts.iter().map(|a| Address::from(a.as_str())).collect(),
            pre_authorized: args.authorized,
            chain_id: args.wallet_chain,
            known_chains: Vec::new(),
            balance_wei,
            reject_connect: args.reject_connect,
        })))
    };
    let prompt = Arc::new(FixedPrompt {
        answer: !args.decline_prompts,
    });

    let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
    let mut host = WidgetHost::start(settings, wallet, prompt, reload_tx).await?;

    if !args.script.is_empty() {
        for line in args.script.iter().filter(|line| !line.trim().is_empty()) {
            match line.parse::<WidgetCommand>() {
                Ok(command) => {
                    if host.dispatch(command).await.is_break() {
                        break;
                    }
                }
                Err(err) => println!("{err}"),
            }
            // Wallet events are delivered asynchronously; give them a moment
            // to land before the next scripted command.
            tokio::time::sleep(Duration::from_millis(50)).await;
            while reload_rx.try_recv().is_ok() {
                host.reload().await?;
            }
        }
        return Ok(());
    }

    println!("{}", commands::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<WidgetCommand>() {
                    Ok(command) => {
                        if let ControlFlow::Break(()) = host.dispatch(command).await {
                            break;
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            Some(()) = reload_rx.recv() => {
                if let Err(err) = host.reload().await {
                    warn!(error = %err, "widget: reload failed");
                    return Err(err);
                }
            }
        }
    }

    Ok(())
}
