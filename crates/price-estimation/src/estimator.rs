use {
    crate::{ArDataPrice, ArDataPriceRegression, ArDriveCommunityTip, ArweaveOracle, Error},
    anyhow::Context,
    futures::{
        FutureExt,
        future::{BoxFuture, Shared},
    },
    num::{BigRational, Signed, ToPrimitive, Zero},
    number::{AR, ByteCount, Winston, conversions::big_rational_floor_to_big_uint},
    prometheus::IntCounterVec,
    std::{
        fmt::{self, Display, Formatter},
        future::Future,
        str::FromStr,
        sync::{Arc, Mutex, Weak},
    },
};

/// Byte counts sampled by default: 100 KiB, 100 MiB and 10 GiB.
pub const DEFAULT_SAMPLE_BYTE_VOLUMES: [ByteCount; 3] =
    [ByteCount::kib(100), ByteCount::mib(100), ByteCount::gib(10)];

type RefreshResult = Result<Arc<ArDataPriceRegression>, Error>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Answers price questions from a linear model fitted through oracle prices
/// for a fixed set of sample byte counts.
///
/// The model is built lazily on first use (or eagerly, see [`Self::new`]) and
/// reused afterwards. At most one refresh is in flight at any time; callers
/// arriving while one is running wait for its outcome instead of hitting the
/// oracle again. Failed refreshes are not retried.
pub struct ArDataPriceRegressionEstimator {
    oracle: Arc<dyn ArweaveOracle>,
    samples: Arc<[ByteCount]>,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    regression: Option<Arc<ArDataPriceRegression>>,
    in_flight: Option<SharedRefresh>,
}

impl ArDataPriceRegressionEstimator {
    /// Fails with [`Error::InsufficientSamples`] for fewer than two sample
    /// byte counts.
    ///
    /// Unless `skip_setup` is set a first refresh gets started right away. It
    /// runs in the background when called from within a tokio runtime and on
    /// the first query otherwise.
    pub fn new(
        oracle: Arc<dyn ArweaveOracle>,
        samples: SampleVolumes,
        skip_setup: bool,
    ) -> Result<Self, Error> {
        if samples.0.len() < 2 {
            return Err(Error::InsufficientSamples(samples.0.len()));
        }
        let estimator = Self {
            oracle,
            samples: samples.0.into(),
            state: Default::default(),
        };
        if !skip_setup {
            let refresh = estimator.refresh_price_data();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(refresh);
            }
        }
        Ok(estimator)
    }

    /// Like [`Self::new`] with the [`DEFAULT_SAMPLE_BYTE_VOLUMES`].
    pub fn with_default_samples(
        oracle: Arc<dyn ArweaveOracle>,
        skip_setup: bool,
    ) -> Result<Self, Error> {
        Self::new(oracle, SampleVolumes::default(), skip_setup)
    }

    pub fn samples(&self) -> &[ByteCount] {
        &self.samples
    }

    /// Fetches fresh prices for all samples and rebuilds the model.
    ///
    /// The refresh is registered when this gets called, not when the returned
    /// future is first polled, so two calls in a row share one refresh.
    pub fn refresh_price_data(&self) -> impl Future<Output = RefreshResult> + Send + 'static {
        let mut state = self.state.lock().unwrap();
        if let Some(in_flight) = &state.in_flight {
            Metrics::get()
                .price_refresh_sharing
                .with_label_values(&["hits"])
                .inc();
            return in_flight.clone();
        }
        Metrics::get()
            .price_refresh_sharing
            .with_label_values(&["misses"])
            .inc();

        let refresh = refresh(
            self.oracle.clone(),
            self.samples.clone(),
            Arc::downgrade(&self.state),
        )
        .boxed()
        .shared();
        state.in_flight = Some(refresh.clone());
        refresh
    }

    /// The currently cached model, if any.
    pub fn regression(&self) -> Option<Arc<ArDataPriceRegression>> {
        self.state.lock().unwrap().regression.clone()
    }

    async fn ensure_regression(&self) -> Result<Arc<ArDataPriceRegression>, Error> {
        if let Some(regression) = self.regression() {
            return Ok(regression);
        }
        self.refresh_price_data()
            .await
            .map_err(|err| Error::ModelUnavailable(Box::new(err)))
    }

    /// The network price for `byte_count` bytes, without any tip.
    pub async fn get_base_winston_price_for_byte_count(
        &self,
        byte_count: ByteCount,
    ) -> Result<Winston, Error> {
        let regression = self.ensure_regression().await?;
        let predicted = regression.predicted_price_for_byte_count(byte_count);
        Ok(predicted.winston_price().clone())
    }

    /// How many bytes `winston` pays the network for. Amounts that don't
    /// exceed the base price of a transaction buy zero bytes.
    pub async fn get_byte_count_for_winston(&self, winston: &Winston) -> Result<ByteCount, Error> {
        let regression = self.ensure_regression().await?;
        byte_count_for_winston(&regression, winston)
    }

    /// How many bytes `ar` pays for once the community tip is taken out.
    pub async fn get_byte_count_for_ar(
        &self,
        ar: &AR,
        tip: &ArDriveCommunityTip,
    ) -> Result<ByteCount, Error> {
        let winston = ar.to_winston();
        let community_fee = tip.fee_within_total(&winston)?;
        if winston <= community_fee {
            // Not even enough for the tip.
            return Ok(ByteCount::new(0));
        }
        self.get_byte_count_for_winston(&winston.minus(&community_fee)?)
            .await
    }

    /// The total price for `byte_count` bytes: network price plus tip.
    pub async fn get_ar_price_for_byte_count(
        &self,
        byte_count: ByteCount,
        tip: &ArDriveCommunityTip,
    ) -> Result<AR, Error> {
        let network_price = self.get_base_winston_price_for_byte_count(byte_count).await?;
        let community_fee = tip.fee_for_network_price(&network_price)?;
        Ok(AR::from_winston(network_price.plus(&community_fee)))
    }
}

async fn refresh(
    oracle: Arc<dyn ArweaveOracle>,
    samples: Arc<[ByteCount]>,
    state: Weak<Mutex<State>>,
) -> RefreshResult {
    let result = fetch_regression(oracle.as_ref(), &samples).await;

    let label = if result.is_ok() { "success" } else { "failure" };
    Metrics::get().price_refreshes.with_label_values(&[label]).inc();

    if let Some(state) = state.upgrade() {
        let mut state = state.lock().unwrap();
        state.in_flight = None;
        if let Ok(regression) = &result {
            state.regression = Some(regression.clone());
        }
    }
    result
}

async fn fetch_regression(
    oracle: &dyn ArweaveOracle,
    samples: &[ByteCount],
) -> RefreshResult {
    let prices = futures::future::try_join_all(samples.iter().map(|&byte_count| async move {
        let winston = oracle
            .get_winston_price_for_byte_count(byte_count)
            .await
            .with_context(|| format!("failed to fetch price for {byte_count} bytes"))?;
        Ok::<_, anyhow::Error>(ArDataPrice::new(byte_count, winston))
    }))
    .await
    .map_err(|err| {
        tracing::warn!(?err, "failed to refresh price data");
        Error::Oracle(err)
    })?;
    tracing::debug!(?prices, "refreshed price data");

    ArDataPriceRegression::new(&prices).map(Arc::new)
}

fn byte_count_for_winston(
    regression: &ArDataPriceRegression,
    winston: &Winston,
) -> Result<ByteCount, Error> {
    let base_price = regression.base_winston_price();
    if *winston <= base_price {
        return Ok(ByteCount::new(0));
    }

    let marginal_price = regression.exact_marginal_winston_price();
    if marginal_price.is_zero() || marginal_price.is_negative() {
        return Err(Error::DegenerateModel);
    }
    let bytes: BigRational = winston.minus(&base_price)?.to_big_rational() / marginal_price;
    let bytes = big_rational_floor_to_big_uint(&bytes)?;
    // Only absurdly cheap models can afford more bytes than fit in a u64.
    Ok(ByteCount::new(bytes.to_u64().unwrap_or(u64::MAX)))
}

/// The byte counts the model gets sampled at. Holds at least two entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleVolumes(Vec<ByteCount>);

impl SampleVolumes {
    pub fn new(samples: Vec<ByteCount>) -> Result<Self, Error> {
        if samples.len() < 2 {
            return Err(Error::InsufficientSamples(samples.len()));
        }
        Ok(Self(samples))
    }

    pub fn as_slice(&self) -> &[ByteCount] {
        &self.0
    }
}

impl Default for SampleVolumes {
    fn default() -> Self {
        Self(DEFAULT_SAMPLE_BYTE_VOLUMES.to_vec())
    }
}

impl FromStr for SampleVolumes {
    type Err = Error;

    /// Parses a comma separated list of byte counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let samples = s
            .split(',')
            .map(|sample| {
                sample
                    .parse::<ByteCount>()
                    .map_err(|err| Error::InvalidSampleVolume(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(samples)
    }
}

impl Display for SampleVolumes {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let samples = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{samples}")
    }
}

#[derive(prometheus_metric_storage::MetricStorage)]
struct Metrics {
    /// Price data refreshes by outcome.
    #[metric(labels("result"))]
    price_refreshes: IntCounterVec,

    /// Price data refresh requests that joined an in flight refresh (hits) or
    /// started a new one (misses).
    #[metric(labels("result"))]
    price_refresh_sharing: IntCounterVec,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::MockArweaveOracle,
        anyhow::anyhow,
        futures::FutureExt,
        mockall::predicate::eq,
    };

    /// An oracle charging `base + per_byte * bytes`.
    fn linear_oracle(base: u64, per_byte: u64, times: usize) -> MockArweaveOracle {
        let mut oracle = MockArweaveOracle::new();
        oracle
            .expect_get_winston_price_for_byte_count()
            .times(times)
            .returning(move |bytes| Ok(Winston::from(base + per_byte * bytes.value())));
        oracle
    }

    fn samples(values: &[u64]) -> SampleVolumes {
        SampleVolumes::new(values.iter().copied().map(ByteCount::new).collect()).unwrap()
    }

    fn estimator(oracle: MockArweaveOracle, values: &[u64]) -> ArDataPriceRegressionEstimator {
        ArDataPriceRegressionEstimator::new(Arc::new(oracle), samples(values), true).unwrap()
    }

    #[test]
    fn requires_two_samples() {
        assert!(matches!(
            SampleVolumes::new(vec![ByteCount::new(1)]),
            Err(Error::InsufficientSamples(1))
        ));
        assert!(matches!(
            "1".parse::<SampleVolumes>(),
            Err(Error::InsufficientSamples(1))
        ));
        assert!(matches!(
            "1,-2".parse::<SampleVolumes>(),
            Err(Error::InvalidSampleVolume(_))
        ));
        assert!(matches!(
            "1,2.5".parse::<SampleVolumes>(),
            Err(Error::InvalidSampleVolume(_))
        ));
        assert_eq!(
            "102400,104857600,10737418240"
                .parse::<SampleVolumes>()
                .unwrap(),
            SampleVolumes::default()
        );
    }

    #[test]
    fn default_samples_are_queried() {
        let mut oracle = MockArweaveOracle::new();
        for sample in DEFAULT_SAMPLE_BYTE_VOLUMES {
            oracle
                .expect_get_winston_price_for_byte_count()
                .with(eq(sample))
                .times(1)
                .returning(|bytes| Ok(Winston::from(bytes.value())));
        }
        let estimator =
            ArDataPriceRegressionEstimator::with_default_samples(Arc::new(oracle), true).unwrap();
        let price = estimator
            .get_base_winston_price_for_byte_count(ByteCount::new(1_000))
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(price, Winston::from(1_000));
    }

    #[test]
    fn concurrent_refreshes_share_one_oracle_round() {
        let estimator = estimator(linear_oracle(10, 2, 2), &[1, 100]);

        let first = estimator.refresh_price_data();
        let second = estimator.refresh_price_data();
        let (first, second) = futures::future::join(first, second).now_or_never().unwrap();
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    }

    #[test]
    fn refresh_after_completion_fetches_again() {
        let estimator = estimator(linear_oracle(10, 2, 4), &[1, 100]);
        estimator.refresh_price_data().now_or_never().unwrap().unwrap();
        estimator.refresh_price_data().now_or_never().unwrap().unwrap();
    }

    #[test]
    fn queries_reuse_the_model() {
        let estimator = estimator(linear_oracle(10, 2, 2), &[1, 100]);
        assert!(estimator.regression().is_none());
        for bytes in [0, 5, 1_000] {
            let price = estimator
                .get_base_winston_price_for_byte_count(ByteCount::new(bytes))
                .now_or_never()
                .unwrap()
                .unwrap();
            assert_eq!(price, Winston::from(10 + 2 * bytes));
        }
        assert!(estimator.regression().is_some());
    }

    #[test]
    fn oracle_failures_fail_the_refresh_without_retry() {
        observe::tracing::initialize_reentrant("price_estimation=debug");
        let mut oracle = MockArweaveOracle::new();
        oracle
            .expect_get_winston_price_for_byte_count()
            .times(2)
            .returning(|_| Err(anyhow!("gateway down")));
        let estimator = estimator(oracle, &[1, 100]);

        let result = estimator.refresh_price_data().now_or_never().unwrap();
        assert!(matches!(result, Err(Error::Oracle(_))));
        let result = estimator
            .get_base_winston_price_for_byte_count(ByteCount::new(1))
            .now_or_never()
            .unwrap();
        assert!(matches!(result, Err(Error::ModelUnavailable(_))));
        assert!(estimator.regression().is_none());
    }

    #[test]
    fn byte_count_for_winston() {
        let estimator = estimator(linear_oracle(10, 2, 2), &[1, 100]);
        let bytes = |winston: u64| {
            estimator
                .get_byte_count_for_winston(&Winston::from(winston))
                .now_or_never()
                .unwrap()
                .unwrap()
                .value()
        };
        assert_eq!(bytes(0), 0);
        assert_eq!(bytes(10), 0);
        assert_eq!(bytes(11), 0);
        assert_eq!(bytes(12), 1);
        assert_eq!(bytes(2_010), 1_000);
        assert_eq!(bytes(2_011), 1_000);
    }

    #[test]
    fn flat_prices_have_no_byte_count() {
        let estimator = estimator(linear_oracle(10, 0, 2), &[1, 100]);
        let result = estimator
            .get_byte_count_for_winston(&Winston::from(100))
            .now_or_never()
            .unwrap();
        assert!(matches!(result, Err(Error::DegenerateModel)));
    }

    #[test]
    fn ar_price_includes_community_tip() {
        let estimator = estimator(linear_oracle(0, 1_000, 2), &[1, 100]);
        let tip = ArDriveCommunityTip::new(0.15, Winston::from(10_000_000)).unwrap();

        // 1 GB costs 1e12 winston plus a 15% tip.
        let price = estimator
            .get_ar_price_for_byte_count(ByteCount::new(1_000_000_000), &tip)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(price.to_string(), "1.15");

        // Tiny uploads pay the minimum tip.
        let price = estimator
            .get_ar_price_for_byte_count(ByteCount::new(1), &tip)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(price.to_winston(), Winston::from(10_001_000));
    }

    #[test]
    fn byte_count_for_ar_removes_community_tip() {
        let estimator = estimator(linear_oracle(0, 1_000, 2), &[1, 100]);
        let tip = ArDriveCommunityTip::new(0.15, Winston::from(10_000_000)).unwrap();

        let bytes = estimator
            .get_byte_count_for_ar(&"1.15".parse().unwrap(), &tip)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(bytes, ByteCount::new(1_000_000_000));

        // Doesn't even cover the minimum tip.
        let bytes = estimator
            .get_byte_count_for_ar(&AR::from_winston(Winston::from(10_000_000)), &tip)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(bytes, ByteCount::new(0));
    }

    #[tokio::test]
    async fn setup_refreshes_eagerly() {
        let estimator = ArDataPriceRegressionEstimator::new(
            Arc::new(linear_oracle(10, 2, 2)),
            samples(&[1, 100]),
            false,
        )
        .unwrap();
        // Joins the refresh started during setup instead of starting another.
        let price = estimator
            .get_base_winston_price_for_byte_count(ByteCount::new(3))
            .await
            .unwrap();
        assert_eq!(price, Winston::from(16));
    }
}
