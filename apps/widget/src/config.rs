use std::{fs, io::ErrorKind, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use shared::domain::{Address, ChainId};
use wallet_core::{
    config::{DEFAULT_MINT_FAILURE_RATE, DEFAULT_MINT_LATENCY},
    MintRequest, WidgetConfig,
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub widget: WidgetConfig,
    pub mint_latency: Duration,
    pub mint_failure_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            widget: WidgetConfig::default(),
            mint_latency: DEFAULT_MINT_LATENCY,
            mint_failure_rate: DEFAULT_MINT_FAILURE_RATE,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<MintRequest> {
        if !(0.0..=1.0).contains(&self.mint_failure_rate) {
            return Err(anyhow!(
                "mint_failure_rate must be between 0 and 1, got {}",
                self.mint_failure_rate
            ));
        }
        self.widget
            .validate()
            .context("invalid widget configuration")
    }
}

/// On-disk shape of `mint_widget.toml`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    contract_address: Option<String>,
    mint_price: Option<String>,
    chain_id: Option<ChainId>,
    chain_name: Option<String>,
    currency_name: Option<String>,
    currency_symbol: Option<String>,
    currency_decimals: Option<u8>,
    rpc_urls: Option<Vec<String>>,
    block_explorer_urls: Option<Vec<String>>,
    install_url: Option<String>,
    collection_title: Option<String>,
    notification_ttl_secs: Option<u64>,
    require_target_chain: Option<bool>,
    mint_latency_ms: Option<u64>,
    mint_failure_rate: Option<f64>,
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` (if present), then environment
/// overrides looked up through `env`.
pub fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "settings file not found; using defaults");
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
    }

    apply_env(&mut settings, env)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    let widget = &mut settings.widget;
    let chain = &mut widget.target_chain;

    if let Some(v) = file_cfg.contract_address {
        widget.contract_address = Address::new(v);
    }
    if let Some(v) = file_cfg.mint_price {
        widget.mint_price = v;
    }
    if let Some(v) = file_cfg.chain_id {
        chain.chain_id = v;
    }
    if let Some(v) = file_cfg.chain_name {
        chain.chain_name = v;
    }
    if let Some(v) = file_cfg.currency_name {
        chain.native_currency.name = v;
    }
    if let Some(v) = file_cfg.currency_symbol {
        chain.native_currency.symbol = v;
    }
    if let Some(v) = file_cfg.currency_decimals {
        chain.native_currency.decimals = v;
    }
    if let Some(v) = file_cfg.rpc_urls {
        chain.rpc_urls = v;
    }
    if let Some(v) = file_cfg.block_explorer_urls {
        chain.block_explorer_urls = v;
    }
    if let Some(v) = file_cfg.install_url {
        widget.install_url = v;
    }
    if let Some(v) = file_cfg.collection_title {
        widget.collection_title = v;
    }
    if let Some(v) = file_cfg.notification_ttl_secs {
        widget.notification_ttl = Duration::from_secs(v);
    }
    if let Some(v) = file_cfg.require_target_chain {
        widget.require_target_chain = v;
    }
    if let Some(v) = file_cfg.mint_latency_ms {
        settings.mint_latency = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.mint_failure_rate {
        settings.mint_failure_rate = v;
    }
}

fn apply_env(
    settings: &mut Settings,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let widget = &mut settings.widget;

    if let Some(v) = env("MINT_WIDGET__CONTRACT_ADDRESS") {
        widget.contract_address = Address::new(v);
    }
    if let Some(v) = env("MINT_WIDGET__MINT_PRICE") {
        widget.mint_price = v;
    }
    if let Some(v) = env("MINT_WIDGET__CHAIN_ID") {
        widget.target_chain.chain_id = v
            .parse()
            .with_context(|| format!("invalid MINT_WIDGET__CHAIN_ID '{v}'"))?;
    }
    if let Some(v) = env("MINT_WIDGET__RPC_URL") {
        widget.target_chain.rpc_urls = vec![v];
    }
    if let Some(v) = env("MINT_WIDGET__INSTALL_URL") {
        widget.install_url = v;
    }
    if let Some(v) = env("MINT_WIDGET__NOTIFICATION_TTL_SECS") {
        let secs: u64 = v
            .parse()
            .with_context(|| format!("invalid MINT_WIDGET__NOTIFICATION_TTL_SECS '{v}'"))?;
        widget.notification_ttl = Duration::from_secs(secs);
    }
    if let Some(v) = env("MINT_WIDGET__REQUIRE_TARGET_CHAIN") {
        widget.require_target_chain = v
            .parse()
            .with_context(|| format!("invalid MINT_WIDGET__REQUIRE_TARGET_CHAIN '{v}'"))?;
    }
    if let Some(v) = env("MINT_WIDGET__MINT_LATENCY_MS") {
        let millis: u64 = v
            .parse()
            .with_context(|| format!("invalid MINT_WIDGET__MINT_LATENCY_MS '{v}'"))?;
        settings.mint_latency = Duration::from_millis(millis);
    }
    if let Some(v) = env("MINT_WIDGET__MINT_FAILURE_RATE") {
        settings.mint_failure_rate = v
            .parse()
            .with_context(|| format!("invalid MINT_WIDGET__MINT_FAILURE_RATE '{v}'"))?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
