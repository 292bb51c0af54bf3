//! Estimates the cost of storing data on Arweave.
//!
//! Prices for a handful of sample byte counts are fetched from an
//! [`ArweaveOracle`] and a linear model is fitted through them. All further
//! questions (price for N bytes, bytes affordable with X winston or AR) are
//! answered from that model.

pub mod estimator;
pub mod oracle;
pub mod price;
pub mod regression;
pub mod tip;

pub use self::{
    estimator::{ArDataPriceRegressionEstimator, DEFAULT_SAMPLE_BYTE_VOLUMES, SampleVolumes},
    oracle::{ArweaveOracle, GatewayArweaveOracle},
    price::ArDataPrice,
    regression::ArDataPriceRegression,
    tip::ArDriveCommunityTip,
};
#[cfg(any(test, feature = "test-util"))]
pub use self::oracle::MockArweaveOracle;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot build a price regression from an empty list of prices")]
    EmptyInput,

    #[error("at least 2 sample byte counts are required, got {0}")]
    InsufficientSamples(usize),

    #[error("invalid sample volume: {0}")]
    InvalidSampleVolume(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no price model available: {0}")]
    ModelUnavailable(Box<Error>),

    #[error("the price model has no positive marginal price")]
    DegenerateModel,

    #[error(transparent)]
    Oracle(anyhow::Error),

    #[error(transparent)]
    Number(#[from] number::Error),
}

// Errors travel through shared futures which require cloneable outputs.
impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Self::EmptyInput => Self::EmptyInput,
            Self::InsufficientSamples(count) => Self::InsufficientSamples(*count),
            Self::InvalidSampleVolume(reason) => Self::InvalidSampleVolume(reason.clone()),
            Self::InvalidArgument(reason) => Self::InvalidArgument(reason.clone()),
            Self::ModelUnavailable(err) => Self::ModelUnavailable(err.clone()),
            Self::DegenerateModel => Self::DegenerateModel,
            Self::Oracle(err) => Self::Oracle(clone_anyhow_error(err)),
            Self::Number(err) => Self::Number(err.clone()),
        }
    }
}

pub fn clone_anyhow_error(err: &anyhow::Error) -> anyhow::Error {
    anyhow::anyhow!("{:#}", err)
}
