//! Closed block height intervals and sets of them. Snapshots use these to
//! figure out which part of a drive's history is not covered yet.

pub mod height_range;
pub mod range;

pub use self::{height_range::HeightRange, range::Range};

/// A block height.
pub type Height = u64;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid range: start {start} is greater than end {end}")]
    InvalidOrder { start: Height, end: Height },
    #[error("invalid range: {0} is not a valid block height")]
    Negative(i64),
    #[error("cannot parse {0:?} as a range, expected START-END or a single height")]
    Parse(String),
}
