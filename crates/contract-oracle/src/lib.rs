//! Reads the state of the ArDrive community smart contract and derives the
//! community tip from it.
//!
//! Contract state can come from several sources. [`ArDriveContractOracle`]
//! tries them in order, retrying each a few times before falling back to the
//! next one. [`ArDriveCommunityOracle`] builds on top of it to compute tips
//! and to pick the token holder receiving them.

pub mod community;
pub mod community_oracle;
pub mod contract_oracle;
pub mod reader;
pub mod transaction;

pub use self::{
    community::{CommunityContractData, CommunitySetting, VaultItem},
    community_oracle::{ArDriveCommunityOracle, CommunityOracle, MINIMUM_WINSTON_TIP},
    contract_oracle::{
        ArDriveContractOracle,
        COMMUNITY_CONTRACT_TX_ID,
        ContractOracle,
        MAX_READ_CONTRACT_ATTEMPTS,
        ReadOptions,
    },
    reader::{ContractReader, SmartweaveContractReader, VertoContractReader},
    transaction::TransactionId,
};
#[cfg(any(test, feature = "test-util"))]
pub use self::{
    community_oracle::MockCommunityOracle,
    contract_oracle::MockContractOracle,
    reader::MockContractReader,
};

use std::time::Duration;

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "max attempts reached on the last fallback reader for contract {tx_id}: {last_error}"
    )]
    ContractUnreadable {
        tx_id: TransactionId,
        last_error: String,
    },

    #[error("reading contract {0} did not finish within {1:?}")]
    Timeout(TransactionId, Duration),

    #[error("contract setting {0:?} is missing")]
    SettingMissing(String),

    #[error("contract setting {name:?} has an unexpected value: {value}")]
    InvalidType { name: String, value: String },

    #[error("contract fee {0} is negative")]
    NegativeFee(f64),

    #[error("no token holder could be selected")]
    NoHolderSelected,

    #[error("malformed contract state: {0}")]
    Malformed(String),

    #[error(transparent)]
    Number(#[from] number::Error),

    #[error(transparent)]
    PriceEstimation(#[from] price_estimation::Error),
}
