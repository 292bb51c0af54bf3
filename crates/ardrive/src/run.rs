use {
    crate::cli::{self, Command},
    anyhow::{Context, Result},
    clap::Parser,
    contract_oracle::{
        ArDriveCommunityOracle,
        ArDriveContractOracle,
        CommunityOracle,
        ContractReader,
        ReadOptions,
        SmartweaveContractReader,
        VertoContractReader,
    },
    height_range::HeightRange,
    http_client::HttpClientFactory,
    number::{AR, FeeMultiple, Winston},
    price_estimation::{ArDataPriceRegressionEstimator, ArDriveCommunityTip, GatewayArweaveOracle},
    serde_json::json,
    std::sync::Arc,
};

/// Parses the command line, runs the command and exits with a non-zero status
/// if it failed.
pub async fn start(args: impl Iterator<Item = String>) {
    let args = cli::Args::parse_from(args);
    observe::tracing::initialize(&log_config(&args.logging));
    observe::metrics::setup_registry(Some("ardrive".to_string()), None);
    tracing::info!("running ardrive-pricing with validated arguments:\n{}", args);

    if let Err(err) = run(args).await {
        tracing::error!(?err, "command failed");
        std::process::exit(1);
    }
}

fn log_config(args: &cli::LoggingArguments) -> observe::Config {
    let config = observe::Config::default()
        .with_env_filter(&args.log_filter)
        .with_stderr_threshold(args.log_stderr_threshold);
    if args.log_json {
        config.with_json_format()
    } else {
        config
    }
}

pub async fn run(args: cli::Args) -> Result<()> {
    let http_factory = HttpClientFactory::new(&args.http_client);
    let output = match args.command {
        Command::Price {
            bytes,
            no_tip,
            fee_multiple,
        } => {
            let estimator = price_estimator(&args, &http_factory)?;
            let network_price = estimator
                .get_base_winston_price_for_byte_count(bytes)
                .await?;
            let tip = if no_tip {
                ArDriveCommunityTip::new(0., Default::default())?
            } else {
                community_oracle(&args, &http_factory)?
                    .get_community_tip()
                    .await?
            };
            let total = if fee_multiple.was_reward_boosted() {
                boosted_total_price(&network_price, fee_multiple, &tip)?
            } else {
                estimator.get_ar_price_for_byte_count(bytes, &tip).await?
            };
            json!({
                "byteCount": bytes,
                "networkWinstonPrice": network_price,
                "feeMultiple": fee_multiple.value(),
                "totalArPrice": total,
            })
        }
        Command::BytesForAr { ref ar } => {
            let estimator = price_estimator(&args, &http_factory)?;
            let tip = community_oracle(&args, &http_factory)?
                .get_community_tip()
                .await?;
            let bytes = estimator.get_byte_count_for_ar(ar, &tip).await?;
            json!({ "ar": ar, "byteCount": bytes })
        }
        Command::Tip { ref winston_cost } => {
            let tip = community_oracle(&args, &http_factory)?
                .get_community_winston_tip(winston_cost.clone())
                .await?;
            json!({ "winstonCost": winston_cost, "communityWinstonTip": tip })
        }
        Command::SelectHolder => {
            let holder = community_oracle(&args, &http_factory)?
                .select_token_holder()
                .await?;
            json!({ "tokenHolder": holder })
        }
        Command::SnapshotRange {
            range,
            ref obscured_by,
        } => {
            let obscured = HeightRange::new(obscured_by.clone()).normalize();
            let uncovered = HeightRange::difference(&HeightRange::from(range), &obscured);
            json!({
                "range": HeightRange::from(range),
                "obscuredBy": obscured,
                "uncovered": uncovered,
            })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    tracing::debug!(
        "metrics:\n{}",
        observe::metrics::encode(observe::metrics::get_registry())
    );
    Ok(())
}

/// Boosted network reward plus the community tip. The tip is owed on the
/// unboosted reward.
fn boosted_total_price(
    network_price: &Winston,
    fee_multiple: FeeMultiple,
    tip: &ArDriveCommunityTip,
) -> Result<AR> {
    let community_fee = tip.fee_for_network_price(network_price)?;
    Ok(AR::from_winston(
        fee_multiple.boost_reward(network_price).plus(&community_fee),
    ))
}

fn price_estimator(
    args: &cli::Args,
    http_factory: &HttpClientFactory,
) -> Result<ArDataPriceRegressionEstimator> {
    let oracle = GatewayArweaveOracle::new(
        http_factory.create().context("failed to create http client")?,
        args.gateway_url.clone(),
    );
    // The model is only needed once, so build it on first use.
    Ok(ArDataPriceRegressionEstimator::new(
        Arc::new(oracle),
        args.sample_byte_volumes.clone(),
        true,
    )?)
}

fn community_oracle(
    args: &cli::Args,
    http_factory: &HttpClientFactory,
) -> Result<ArDriveCommunityOracle> {
    let client = http_factory.create().context("failed to create http client")?;
    let readers: Vec<Box<dyn ContractReader>> = vec![
        Box::new(VertoContractReader::new(
            client.clone(),
            args.verto_cache_url.clone(),
        )),
        Box::new(SmartweaveContractReader::new(
            client,
            args.smartweave_gateway_url.clone(),
        )),
    ];
    anyhow::ensure!(
        args.max_read_contract_attempts > 0,
        "--max-read-contract-attempts must be positive"
    );
    let contract_oracle = ArDriveContractOracle::new(
        readers,
        ReadOptions {
            max_attempts: args.max_read_contract_attempts,
            timeout: Some(args.contract_read_timeout),
        },
        true,
    );
    Ok(ArDriveCommunityOracle::new(Arc::new(contract_oracle)))
}

#[cfg(test)]
mod tests {
    use {super::*, futures::FutureExt};

    #[test]
    fn snapshot_range_runs_offline() {
        let args = cli::Args::try_parse_from([
            "ardrive-pricing",
            "snapshot-range",
            "0-100",
            "--obscured-by",
            "40-60,50-70",
        ])
        .unwrap();
        run(args).now_or_never().unwrap().unwrap();
    }

    #[test]
    fn boosting_leaves_the_tip_unchanged() {
        let tip = ArDriveCommunityTip::new(0.15, Winston::from(10)).unwrap();
        let total = boosted_total_price(
            &Winston::from(1_000_000),
            FeeMultiple::new(2.).unwrap(),
            &tip,
        )
        .unwrap();
        assert_eq!(total.to_winston(), Winston::from(2_000_000 + 150_000));

        let unboosted =
            boosted_total_price(&Winston::from(1_000_000), FeeMultiple::default(), &tip).unwrap();
        assert_eq!(unboosted.to_winston(), Winston::from(1_150_000));
    }

    #[test]
    fn log_config_follows_arguments() {
        let args = cli::Args::try_parse_from(["ardrive-pricing", "--log-json", "select-holder"])
            .unwrap();
        let config = format!("{:?}", log_config(&args.logging));
        assert!(config.contains("use_json_format: true"));
        assert!(config.contains(r#"env_filter: "warn,ardrive=info"#));
    }

    #[tokio::test]
    async fn invalid_contract_attempts_fail() {
        let args = cli::Args::try_parse_from([
            "ardrive-pricing",
            "--max-read-contract-attempts",
            "0",
            "select-holder",
        ])
        .unwrap();
        assert!(run(args).await.is_err());
    }
}
