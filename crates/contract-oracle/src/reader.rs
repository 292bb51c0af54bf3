use {
    crate::TransactionId,
    anyhow::{Context, Result},
    reqwest::Client,
    serde::Deserialize,
    tracing::instrument,
    url::Url,
};

/// A source of smart contract state.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait ContractReader: Send + Sync {
    /// Returns the current state of the contract created by `tx_id`.
    async fn read_contract(&self, tx_id: TransactionId) -> Result<serde_json::Value>;
}

#[derive(Debug, Deserialize)]
struct StateResponse {
    state: Option<serde_json::Value>,
}

async fn fetch_state(client: &Client, url: Url) -> Result<serde_json::Value> {
    let response: StateResponse = client
        .get(url.clone())
        .send()
        .await
        .context("failed to make request")?
        .error_for_status()
        .context("response status is not success")?
        .json()
        .await
        .context("failed to decode response")?;
    tracing::trace!(%url, ?response, "contract state response");
    response
        .state
        .with_context(|| format!("response from {url} has no contract state"))
}

/// Reads the cached contract state from the Verto exchange cache via
/// `GET {cache}/{tx_id}`.
pub struct VertoContractReader {
    client: Client,
    cache: Url,
}

impl VertoContractReader {
    pub const DEFAULT_CACHE: &'static str = "https://v2.cache.verto.exchange";

    pub fn new(client: Client, cache: Url) -> Self {
        Self { client, cache }
    }

    fn contract_url(&self, tx_id: &TransactionId) -> Url {
        http_client::join(&self.cache, tx_id.as_str())
    }
}

#[async_trait::async_trait]
impl ContractReader for VertoContractReader {
    #[instrument(skip(self), fields(reader = "verto"))]
    async fn read_contract(&self, tx_id: TransactionId) -> Result<serde_json::Value> {
        fetch_state(&self.client, self.contract_url(&tx_id)).await
    }
}

/// Reads contract state evaluated from the contract's on-chain interaction
/// log by a SmartWeave evaluation node via `GET {node}/contract?id={tx_id}`.
pub struct SmartweaveContractReader {
    client: Client,
    node: Url,
}

impl SmartweaveContractReader {
    pub const DEFAULT_NODE: &'static str = "https://dre-1.warp.cc";

    pub fn new(client: Client, node: Url) -> Self {
        Self { client, node }
    }

    fn contract_url(&self, tx_id: &TransactionId) -> Url {
        let mut url = http_client::join(&self.node, "contract");
        url.query_pairs_mut().append_pair("id", tx_id.as_str());
        url
    }
}

#[async_trait::async_trait]
impl ContractReader for SmartweaveContractReader {
    #[instrument(skip(self), fields(reader = "smartweave"))]
    async fn read_contract(&self, tx_id: TransactionId) -> Result<serde_json::Value> {
        fetch_state(&self.client, self.contract_url(&tx_id)).await
    }
}
