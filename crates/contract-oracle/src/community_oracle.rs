use {
    crate::{CommunityContractData, ContractOracle, Error},
    number::Winston,
    price_estimation::ArDriveCommunityTip,
    rand::Rng,
    std::sync::Arc,
};

/// The smallest tip ever asked for, regardless of the transaction's cost.
pub const MINIMUM_WINSTON_TIP: u64 = 10_000_000;

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait CommunityOracle: Send + Sync {
    /// The community tip for a transaction costing `winston_cost`.
    async fn get_community_winston_tip(&self, winston_cost: Winston) -> Result<Winston, Error>;

    /// Picks the address receiving the next tip. Holders are weighted by
    /// their liquid plus vaulted token balance.
    async fn select_token_holder(&self) -> Result<String, Error>;

    /// The current tip terms, for price estimates that include the tip.
    async fn get_community_tip(&self) -> Result<ArDriveCommunityTip, Error>;
}

pub struct ArDriveCommunityOracle {
    contract_oracle: Arc<dyn ContractOracle>,
}

impl ArDriveCommunityOracle {
    pub fn new(contract_oracle: Arc<dyn ContractOracle>) -> Self {
        Self { contract_oracle }
    }
}

#[async_trait::async_trait]
impl CommunityOracle for ArDriveCommunityOracle {
    async fn get_community_winston_tip(&self, winston_cost: Winston) -> Result<Winston, Error> {
        let percentage = self
            .contract_oracle
            .get_tip_percentage_from_contract()
            .await?;
        let tip = winston_cost.times_f64(percentage)?;
        Ok(tip.max(Winston::from(MINIMUM_WINSTON_TIP)))
    }

    async fn select_token_holder(&self) -> Result<String, Error> {
        let contract = self.contract_oracle.get_community_contract().await?;
        let draw = rand::thread_rng().gen_range(0.0..1.0);
        let holder = weighted_token_holder(&contract, draw).ok_or(Error::NoHolderSelected)?;
        tracing::debug!(%holder, "selected token holder");
        Ok(holder)
    }

    async fn get_community_tip(&self) -> Result<ArDriveCommunityTip, Error> {
        let percentage = self
            .contract_oracle
            .get_tip_percentage_from_contract()
            .await?;
        ArDriveCommunityTip::new(percentage, Winston::from(MINIMUM_WINSTON_TIP))
            .map_err(Error::from)
    }
}

/// Maps `draw` from `[0, 1)` onto the holders' cumulative weights. `None` if
/// nobody holds a positive balance.
fn weighted_token_holder(contract: &CommunityContractData, draw: f64) -> Option<String> {
    let holders: Vec<(&str, f64)> = contract
        .effective_balances()
        .into_iter()
        .filter(|(_, balance)| balance.is_finite() && *balance > 0.)
        .collect();
    let total: f64 = holders.iter().map(|(_, balance)| balance).sum();
    if total <= 0. {
        return None;
    }

    let target = draw * total;
    let mut cumulative = 0f64;
    for (holder, balance) in &holders {
        cumulative += *balance;
        if target < cumulative {
            return Some(holder.to_string());
        }
    }
    // Rounding can leave the cumulative sum a hair below `target`.
    holders.last().map(|(holder, _)| holder.to_string())
}
