//! Validated numeric value types used for all money and size math.

pub mod ar;
pub mod byte_count;
pub mod conversions;
pub mod fee_multiple;
pub mod winston;

pub use self::{ar::AR, byte_count::ByteCount, fee_multiple::FeeMultiple, winston::Winston};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("{value} has more than {max} decimal places")]
    PrecisionExceeded { value: String, max: u32 },
}
