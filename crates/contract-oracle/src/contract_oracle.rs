use {
    crate::{CommunityContractData, ContractReader, Error, TransactionId},
    futures::{
        FutureExt,
        future::{BoxFuture, Shared},
    },
    prometheus::IntCounterVec,
    std::{
        sync::{Arc, Mutex, Weak},
        time::Duration,
    },
};

/// The transaction that created the ArDrive community contract.
pub const COMMUNITY_CONTRACT_TX_ID: &str = "-8A6RexFkpfWwuyVO98wzSFZh0d6VJuI-buTJvlwOJQ";

/// Consecutive failed reads after which a reader is given up on.
pub const MAX_READ_CONTRACT_ATTEMPTS: usize = 3;

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait ContractOracle: Send + Sync {
    /// The current state of the ArDrive community contract.
    async fn get_community_contract(&self) -> Result<Arc<CommunityContractData>, Error>;

    /// The share of a transaction's cost the community asks as a tip, e.g.
    /// `0.15` for a contract fee setting of 15.
    async fn get_tip_percentage_from_contract(&self) -> Result<f64, Error>;
}

/// How [`ArDriveContractOracle`] retries contract reads.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Failed reads per reader before falling back to the next one.
    pub max_attempts: usize,
    /// Overall deadline for one read across all readers and attempts.
    pub timeout: Option<Duration>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_attempts: MAX_READ_CONTRACT_ATTEMPTS,
            timeout: None,
        }
    }
}

/// Reads contracts from a prioritized list of readers.
///
/// A reader is retried until it failed `max_attempts` times in a row, then the
/// next reader takes over. The read fails once the last reader is used up or
/// the deadline passed, whichever comes first.
///
/// The community contract is read at most once per oracle. Concurrent callers
/// share the pending read and every later caller gets the cached state.
pub struct ArDriveContractOracle {
    inner: Arc<Inner>,
    cache: Arc<Mutex<Cache>>,
}

struct Inner {
    readers: Vec<Box<dyn ContractReader>>,
    options: ReadOptions,
}

type ContractResult = Result<Arc<CommunityContractData>, Error>;
type SharedContract = Shared<BoxFuture<'static, ContractResult>>;

#[derive(Default)]
struct Cache {
    contract: Option<Arc<CommunityContractData>>,
    in_flight: Option<SharedContract>,
}

#[derive(Debug)]
enum ReadState {
    Trying { reader: usize, attempt: usize },
    FallingBack { from: usize },
    Exhausted,
}

impl ArDriveContractOracle {
    /// Panics if `readers` is empty or `options.max_attempts` is zero.
    ///
    /// Unless `skip_setup` is set the community contract starts getting read
    /// in the background right away (when called within a tokio runtime).
    pub fn new(
        readers: Vec<Box<dyn ContractReader>>,
        options: ReadOptions,
        skip_setup: bool,
    ) -> Self {
        assert!(!readers.is_empty(), "at least one contract reader required");
        assert!(options.max_attempts > 0, "max attempts must be positive");
        let oracle = Self {
            inner: Arc::new(Inner { readers, options }),
            cache: Default::default(),
        };
        if !skip_setup {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(oracle.community_contract());
            }
        }
        oracle
    }

    /// Reads the state of the contract created by `tx_id`, falling back
    /// through the configured readers.
    pub async fn read_contract(&self, tx_id: TransactionId) -> Result<serde_json::Value, Error> {
        self.inner.read_contract(tx_id).await
    }

    /// Registers a community contract read unless the state is cached or a
    /// read is already pending.
    fn community_contract(&self) -> SharedContract {
        let mut cache = self.cache.lock().unwrap();
        if let Some(contract) = &cache.contract {
            return futures::future::ready(Ok(contract.clone())).boxed().shared();
        }
        if let Some(in_flight) = &cache.in_flight {
            return in_flight.clone();
        }
        let fetch = fetch_community_contract(self.inner.clone(), Arc::downgrade(&self.cache))
            .boxed()
            .shared();
        cache.in_flight = Some(fetch.clone());
        fetch
    }
}

impl Inner {
    async fn read_contract(&self, tx_id: TransactionId) -> Result<serde_json::Value, Error> {
        let Some(timeout) = self.options.timeout else {
            return self.read_with_fallback(&tx_id).await;
        };
        match tokio::time::timeout(timeout, self.read_with_fallback(&tx_id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(%tx_id, ?timeout, "contract read timed out");
                Err(Error::Timeout(tx_id.clone(), timeout))
            }
        }
    }

    async fn read_with_fallback(&self, tx_id: &TransactionId) -> Result<serde_json::Value, Error> {
        let metrics = Metrics::get();
        let mut last_error = None;
        let mut state = ReadState::Trying {
            reader: 0,
            attempt: 1,
        };
        loop {
            state = match state {
                ReadState::Trying { reader, attempt } => {
                    let label = reader.to_string();
                    match self.readers[reader].read_contract(tx_id.clone()).await {
                        Ok(value) => {
                            metrics
                                .contract_read_attempts
                                .with_label_values(&[label.as_str(), "success"])
                                .inc();
                            return Ok(value);
                        }
                        Err(err) => {
                            metrics
                                .contract_read_attempts
                                .with_label_values(&[label.as_str(), "failure"])
                                .inc();
                            tracing::warn!(%tx_id, reader, attempt, ?err, "contract read failed");
                            last_error = Some(err);
                            if attempt < self.options.max_attempts {
                                ReadState::Trying {
                                    reader,
                                    attempt: attempt + 1,
                                }
                            } else {
                                ReadState::FallingBack { from: reader }
                            }
                        }
                    }
                }
                ReadState::FallingBack { from } if from + 1 < self.readers.len() => {
                    tracing::warn!(%tx_id, from, to = from + 1, "falling back to next contract reader");
                    ReadState::Trying {
                        reader: from + 1,
                        attempt: 1,
                    }
                }
                ReadState::FallingBack { .. } => ReadState::Exhausted,
                ReadState::Exhausted => {
                    let last_error = last_error
                        .take()
                        .map(|err| format!("{err:#}"))
                        .unwrap_or_default();
                    tracing::error!(%tx_id, %last_error, "all contract readers failed");
                    return Err(Error::ContractUnreadable {
                        tx_id: tx_id.clone(),
                        last_error,
                    });
                }
            };
        }
    }
}

async fn fetch_community_contract(inner: Arc<Inner>, cache: Weak<Mutex<Cache>>) -> ContractResult {
    let tx_id = TransactionId::from_static(COMMUNITY_CONTRACT_TX_ID);
    let result = inner.read_contract(tx_id).await.and_then(|state| {
        serde_json::from_value::<CommunityContractData>(state)
            .map(Arc::new)
            .map_err(|err| Error::Malformed(err.to_string()))
    });

    if let Some(cache) = cache.upgrade() {
        let mut cache = cache.lock().unwrap();
        cache.in_flight = None;
        if let Ok(contract) = &result {
            cache.contract = Some(contract.clone());
        }
    }
    result
}

/// The contract's `fee` setting as a ratio.
pub fn tip_percentage(contract: &CommunityContractData) -> Result<f64, Error> {
    const FEE: &str = "fee";

    let value = contract
        .setting(FEE)
        .ok_or_else(|| Error::SettingMissing(FEE.to_owned()))?;
    let fee = value.as_f64().ok_or_else(|| Error::InvalidType {
        name: FEE.to_owned(),
        value: value.to_string(),
    })?;
    if fee < 0. {
        return Err(Error::NegativeFee(fee));
    }
    Ok(fee / 100.)
}

#[async_trait::async_trait]
impl ContractOracle for ArDriveContractOracle {
    async fn get_community_contract(&self) -> Result<Arc<CommunityContractData>, Error> {
        self.community_contract().await
    }

    async fn get_tip_percentage_from_contract(&self) -> Result<f64, Error> {
        let contract = self.get_community_contract().await?;
        tip_percentage(&contract)
    }
}

#[derive(prometheus_metric_storage::MetricStorage)]
struct Metrics {
    /// Contract read attempts by position of the reader in the fallback list
    /// and outcome.
    #[metric(labels("reader", "result"))]
    contract_read_attempts: IntCounterVec,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry()).unwrap()
    }
}
