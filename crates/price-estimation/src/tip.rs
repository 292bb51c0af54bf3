use {
    crate::Error,
    number::Winston,
    serde::{Deserialize, Serialize},
};

/// The ArDrive community tip charged on top of the network price: a
/// percentage of the network price with an absolute floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArDriveCommunityTip {
    tip_percentage: f64,
    min_winston_fee: Winston,
}

impl ArDriveCommunityTip {
    /// `tip_percentage` is a ratio, i.e. `0.15` for a 15% tip.
    pub fn new(tip_percentage: f64, min_winston_fee: Winston) -> Result<Self, Error> {
        if !tip_percentage.is_finite() || tip_percentage < 0. {
            return Err(Error::InvalidArgument(format!(
                "tip percentage must be a finite non-negative number, got {tip_percentage}"
            )));
        }
        Ok(Self {
            tip_percentage,
            min_winston_fee,
        })
    }

    pub fn tip_percentage(&self) -> f64 {
        self.tip_percentage
    }

    pub fn min_winston_fee(&self) -> &Winston {
        &self.min_winston_fee
    }

    /// The tip owed for a transaction whose network price is `network_price`.
    pub fn fee_for_network_price(&self, network_price: &Winston) -> Result<Winston, Error> {
        let fee = network_price.times_f64(self.tip_percentage)?;
        Ok(fee.max(self.min_winston_fee.clone()))
    }

    /// The share of `total` (network price plus tip) that goes to the tip.
    pub fn fee_within_total(&self, total: &Winston) -> Result<Winston, Error> {
        let network_price = total.divided_by_f64(1. + self.tip_percentage)?;
        let fee = total.minus(&network_price)?;
        Ok(fee.max(self.min_winston_fee.clone()))
    }
}
