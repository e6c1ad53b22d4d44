use super::*;
use serde_json::json;
use shared::error::UNRECOGNIZED_CHAIN;
use std::collections::HashMap;
use tokio::sync::Mutex;

struct ScriptedProvider {
    responses: HashMap<&'static str, Result<Value, ProviderError>>,
    requests: Mutex<Vec<Value>>,
    events: broadcast::Sender<WalletEvent>,
}

impl ScriptedProvider {
    fn new(responses: Vec<(&'static str, Result<Value, ProviderError>)>) -> Arc<Self> {
        let (events, _) = broadcast::channel(8);
        Arc::new(Self {
            responses: responses.into_iter().collect(),
            requests: Mutex::new(Vec::new()),
            events,
        })
    }
}

#[async_trait]
impl Eip1193Provider for ScriptedProvider {
    async fn request(&self, request: WalletRequest) -> Result<Value, ProviderError> {
        self.requests
            .lock()
            .await
            .push(serde_json::to_value(&request).expect("encode request"));
        self.responses
            .get(request.method())
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::internal("unscripted method")))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[tokio::test]
async fn decodes_accounts_chain_and_balance() {
    let provider = ScriptedProvider::new(vec![
        ("eth_requestAccounts", Ok(json!(["0xaaa", "0xbbb"]))),
        ("eth_accounts", Ok(json!([]))),
        ("eth_chainId", Ok(json!("0x2105"))),
        ("eth_getBalance", Ok(json!("0xde0b6b3a7640000"))),
    ]);
    let capability = Eip1193Capability::new(provider.clone());

    assert_eq!(
        capability.request_accounts().await.expect("accounts"),
        vec![Address::from("0xaaa"), Address::from("0xbbb")]
    );
    assert!(capability.accounts().await.expect("accounts").is_empty());
    assert_eq!(capability.chain_id().await.expect("chain"), ChainId(0x2105));
    assert_eq!(
        capability
            .get_balance(&Address::from("0xaaa"))
            .await
            .expect("balance"),
        1_000_000_000_000_000_000
    );

    let requests = provider.requests.lock().await;
    assert_eq!(
        requests.last(),
        Some(&json!({ "method": "eth_getBalance", "params": ["0xaaa", "latest"] }))
    );
}

#[tokio::test]
async fn malformed_results_become_internal_errors() {
    let provider = ScriptedProvider::new(vec![
        ("eth_chainId", Ok(json!(8453))),
        ("eth_getBalance", Ok(json!("1000"))),
    ]);
    let capability = Eip1193Capability::new(provider);

    let err = capability.chain_id().await.expect_err("numeric chain id");
    assert_eq!(err.code, shared::error::INTERNAL);
    assert!(err.message.contains("eth_chainId"));

    let err = capability
        .get_balance(&Address::from("0xaaa"))
        .await
        .expect_err("balance without prefix");
    assert!(err.message.contains("eth_getBalance"));
}

#[tokio::test]
async fn passes_provider_rejections_through() {
    let provider = ScriptedProvider::new(vec![
        (
            "wallet_switchEthereumChain",
            Err(ProviderError::unrecognized_chain("Unrecognized chain ID")),
        ),
        ("wallet_addEthereumChain", Ok(Value::Null)),
    ]);
    let capability = Eip1193Capability::new(provider.clone());

    let err = capability
        .switch_chain(ChainId(0x2105))
        .await
        .expect_err("unknown chain");
    assert_eq!(err.code, UNRECOGNIZED_CHAIN);

    capability
        .add_chain(&ChainDescriptor::base_mainnet())
        .await
        .expect("add chain");
    let requests = provider.requests.lock().await;
    assert_eq!(requests[1]["method"], "wallet_addEthereumChain");
    assert_eq!(requests[1]["params"][0]["chainName"], "Base Mainnet");
}

#[tokio::test]
async fn forwards_provider_events() {
    let provider = ScriptedProvider::new(Vec::new());
    let capability = Eip1193Capability::new(provider.clone());
    let mut rx = capability.subscribe_events();

    provider
        .events
        .send(WalletEvent::ChainChanged(ChainId(1)))
        .expect("send event");
    assert_eq!(
        rx.recv().await.expect("event"),
        WalletEvent::ChainChanged(ChainId(1))
    );
}
