//! CLI arguments for the `ardrive-pricing` binary.

use {
    clap::{Parser, Subcommand},
    contract_oracle::{MAX_READ_CONTRACT_ATTEMPTS, SmartweaveContractReader, VertoContractReader},
    height_range::Range,
    number::{AR, ByteCount, FeeMultiple, Winston},
    price_estimation::{GatewayArweaveOracle, SampleVolumes},
    std::{
        fmt::{self, Display, Formatter},
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
    url::Url,
};

/// Estimate ArDrive upload costs
#[derive(Parser)]
#[command(name = "ardrive-pricing", version)]
pub struct Args {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    #[clap(flatten)]
    pub http_client: http_client::Arguments,

    /// Arweave gateway asked for data prices.
    #[clap(long, env, default_value = GatewayArweaveOracle::DEFAULT_GATEWAY)]
    pub gateway_url: Url,

    /// Byte counts the price model is fitted through, comma separated.
    #[clap(long, env, default_value_t)]
    pub sample_byte_volumes: SampleVolumes,

    /// Verto cache serving contract state. Tried first.
    #[clap(long, env, default_value = VertoContractReader::DEFAULT_CACHE)]
    pub verto_cache_url: Url,

    /// SmartWeave evaluation node serving contract state. Used once the Verto
    /// cache failed too often.
    #[clap(long, env, default_value = SmartweaveContractReader::DEFAULT_NODE)]
    pub smartweave_gateway_url: Url,

    /// Deadline for reading a contract across all readers and retries.
    #[clap(
        long,
        env,
        default_value = "60s",
        value_parser = humantime::parse_duration,
    )]
    pub contract_read_timeout: Duration,

    /// Failed reads before falling back to the next contract reader.
    #[clap(long, env, default_value_t = MAX_READ_CONTRACT_ATTEMPTS)]
    pub max_read_contract_attempts: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Price of uploading a number of bytes.
    Price {
        bytes: ByteCount,

        /// Leave out the community tip.
        #[arg(long)]
        no_tip: bool,

        /// Boost the network reward by this factor to speed up mining. The
        /// community tip is still computed on the unboosted reward.
        #[arg(long, default_value_t)]
        fee_multiple: FeeMultiple,
    },
    /// Number of bytes an amount of AR pays for, community tip included.
    BytesForAr { ar: AR },
    /// Community tip owed for a transaction of the given cost.
    Tip { winston_cost: Winston },
    /// Draw the token holder receiving the next community tip.
    SelectHolder,
    /// Block heights of `range` not yet covered by earlier snapshots.
    SnapshotRange {
        /// Heights to snapshot, as `START-END`.
        range: Range,

        /// Ranges covered by earlier snapshots, comma separated.
        #[arg(long, value_delimiter = ',')]
        obscured_by: Vec<Range>,
    },
}

#[derive(Parser)]
#[group(skip)]
pub struct LoggingArguments {
    #[clap(
        long,
        env,
        default_value = "warn,ardrive=info,price_estimation=info,contract_oracle=info"
    )]
    pub log_filter: String,

    /// Most verbose level logged to stderr. Less severe events go to stdout
    /// alongside the command's JSON output.
    #[clap(long, env, default_value = "trace")]
    pub log_stderr_threshold: LevelFilter,

    /// Log events as JSON lines.
    #[clap(long, env)]
    pub log_json: bool,
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            log_json,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "log_json: {log_json}")?;
        Ok(())
    }
}

impl Display for Args {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            logging,
            http_client,
            gateway_url,
            sample_byte_volumes,
            verto_cache_url,
            smartweave_gateway_url,
            contract_read_timeout,
            max_read_contract_attempts,
            command,
        } = self;

        write!(f, "{logging}")?;
        write!(f, "{http_client}")?;
        writeln!(f, "gateway_url: {gateway_url}")?;
        writeln!(f, "sample_byte_volumes: {sample_byte_volumes}")?;
        writeln!(f, "verto_cache_url: {verto_cache_url}")?;
        writeln!(f, "smartweave_gateway_url: {smartweave_gateway_url}")?;
        writeln!(f, "contract_read_timeout: {contract_read_timeout:?}")?;
        writeln!(f, "max_read_contract_attempts: {max_read_contract_attempts}")?;
        writeln!(f, "command: {command:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["ardrive-pricing", "price", "1024"]).unwrap();
        assert_eq!(args.gateway_url.as_str(), "https://arweave.net/");
        assert_eq!(args.sample_byte_volumes, SampleVolumes::default());
        assert_eq!(args.contract_read_timeout, Duration::from_secs(60));
        assert_eq!(args.max_read_contract_attempts, 3);
        assert_eq!(args.logging.log_stderr_threshold, LevelFilter::TRACE);
        assert!(!args.logging.log_json);
        assert!(matches!(
            args.command,
            Command::Price { bytes, no_tip: false, fee_multiple }
                if bytes == ByteCount::new(1024) && !fee_multiple.was_reward_boosted()
        ));
    }

    #[test]
    fn logging_arguments() {
        let args = Args::try_parse_from([
            "ardrive-pricing",
            "--log-json",
            "--log-stderr-threshold",
            "warn",
            "select-holder",
        ])
        .unwrap();
        assert!(args.logging.log_json);
        assert_eq!(args.logging.log_stderr_threshold, LevelFilter::WARN);
        assert!(args.to_string().contains("log_json: true\n"));
    }

    #[test]
    fn snapshot_range_arguments() {
        let args = Args::try_parse_from([
            "ardrive-pricing",
            "snapshot-range",
            "0-100",
            "--obscured-by",
            "10-20,50",
        ])
        .unwrap();
        let Command::SnapshotRange { range, obscured_by } = args.command else {
            panic!("unexpected command");
        };
        assert_eq!(range, Range::new(0, 100).unwrap());
        assert_eq!(
            obscured_by,
            vec![Range::new(10, 20).unwrap(), Range::single(50)]
        );
    }

    #[test]
    fn rejects_invalid_amounts() {
        assert!(Args::try_parse_from(["ardrive-pricing", "bytes-for-ar", "0.1234567890123"]).is_err());
        assert!(Args::try_parse_from(["ardrive-pricing", "tip", "-5"]).is_err());
        assert!(
            Args::try_parse_from(["ardrive-pricing", "--sample-byte-volumes", "1", "select-holder"])
                .is_err()
        );
    }
}
