use serde::{Deserialize, Serialize};

use crate::domain::{Address, ChainId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    #[default]
    Latest,
    Pending,
    Earliest,
}

/// Request vocabulary spoken to an injected EIP-1193 provider. Serializes to
/// the `{ "method": ..., "params": [...] }` object passed to `request()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", content = "params")]
pub enum WalletRequest {
    #[serde(rename = "eth_requestAccounts")]
    RequestAccounts,
    #[serde(rename = "eth_accounts")]
    Accounts,
    #[serde(rename = "eth_chainId")]
    ChainId,
    #[serde(rename = "wallet_switchEthereumChain")]
    SwitchChain([SwitchChainParameter; 1]),
    #[serde(rename = "wallet_addEthereumChain")]
    AddChain([ChainDescriptor; 1]),
    #[serde(rename = "eth_getBalance")]
    GetBalance(Address, BlockTag),
}

impl WalletRequest {
    pub fn switch_chain(chain_id: ChainId) -> Self {
        Self::SwitchChain([SwitchChainParameter { chain_id }])
    }

    pub fn add_chain(descriptor: ChainDescriptor) -> Self {
        Self::AddChain([descriptor])
    }

    pub fn balance_at_latest(address: Address) -> Self {
        Self::GetBalance(address, BlockTag::Latest)
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::RequestAccounts => "eth_requestAccounts",
            Self::Accounts => "eth_accounts",
            Self::ChainId => "eth_chainId",
            Self::SwitchChain(_) => "wallet_switchEthereumChain",
            Self::AddChain(_) => "wallet_addEthereumChain",
            Self::GetBalance(..) => "eth_getBalance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SwitchChainParameter {
    pub chain_id: ChainId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Full chain description for `wallet_addEthereumChain` (EIP-3085).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
}

impl ChainDescriptor {
    pub fn base_mainnet() -> Self {
        Self {
            chain_id: ChainId(0x2105),
            chain_name: "Base Mainnet".into(),
            native_currency: NativeCurrency {
                name: "Ethereum".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://mainnet.base.org".into()],
            block_explorer_urls: vec!["https://basescan.org".into()],
        }
    }
}

/// Provider-side notifications (`provider.on(...)`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum WalletEvent {
    #[serde(rename = "accountsChanged")]
    AccountsChanged(Vec<Address>),
    #[serde(rename = "chainChanged")]
    ChainChanged(ChainId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_balance_request_with_block_tag() {
        let request = WalletRequest::balance_at_latest(Address::from("0xabc"));
        assert_eq!(
            serde_json::to_value(&request).expect("encode"),
            json!({ "method": "eth_getBalance", "params": ["0xabc", "latest"] })
        );
    }

    #[test]
    fn encodes_parameterless_requests_without_params() {
        assert_eq!(
            serde_json::to_value(WalletRequest::RequestAccounts).expect("encode"),
            json!({ "method": "eth_requestAccounts" })
        );
    }

    #[test]
    fn encodes_switch_and_add_chain_params() {
        assert_eq!(
            serde_json::to_value(WalletRequest::switch_chain(ChainId(0x2105))).expect("encode"),
            json!({ "method": "wallet_switchEthereumChain", "params": [{ "chainId": "0x2105" }] })
        );

        let add = serde_json::to_value(WalletRequest::add_chain(ChainDescriptor::base_mainnet()))
            .expect("encode");
        assert_eq!(
            add,
            json!({
                "method": "wallet_addEthereumChain",
                "params": [{
                    "chainId": "0x2105",
                    "chainName": "Base Mainnet",
                    "nativeCurrency": { "name": "Ethereum", "symbol": "ETH", "decimals": 18 },
                    "rpcUrls": ["https://mainnet.base.org"],
                    "blockExplorerUrls": ["https://basescan.org"]
                }]
            })
        );
    }

    #[test]
    fn method_names_match_wire_encoding() {
        let requests = [
            WalletRequest::RequestAccounts,
            WalletRequest::Accounts,
            WalletRequest::ChainId,
            WalletRequest::switch_chain(ChainId(1)),
            WalletRequest::add_chain(ChainDescriptor::base_mainnet()),
            WalletRequest::balance_at_latest(Address::from("0x1")),
        ];
        for request in requests {
            let value = serde_json::to_value(&request).expect("encode");
            assert_eq!(value["method"], request.method());
        }
    }

    #[test]
    fn decodes_provider_events() {
        let event: WalletEvent =
            serde_json::from_value(json!({ "event": "chainChanged", "data": "0x1" }))
                .expect("decode");
        assert_eq!(event, WalletEvent::ChainChanged(ChainId(1)));

        let event: WalletEvent =
            serde_json::from_value(json!({ "event": "accountsChanged", "data": [] }))
                .expect("decode");
        assert_eq!(event, WalletEvent::AccountsChanged(Vec::new()));
    }
}
