use {
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// The parts of the ArDrive community contract state this crate cares about.
/// Unknown fields (votes, roles, ticker, ...) are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityContractData {
    #[serde(default)]
    pub balances: BTreeMap<String, f64>,
    #[serde(default)]
    pub vault: BTreeMap<String, Vec<VaultItem>>,
    #[serde(default)]
    pub settings: Vec<CommunitySetting>,
}

/// Tokens locked by a holder between two block heights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultItem {
    pub balance: f64,
    pub start: u64,
    pub end: u64,
}

/// A `[name, value]` pair of the contract's settings list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommunitySetting(pub String, pub serde_json::Value);

impl CommunityContractData {
    pub fn setting(&self, name: &str) -> Option<&serde_json::Value> {
        self.settings
            .iter()
            .find(|CommunitySetting(setting, _)| setting == name)
            .map(|CommunitySetting(_, value)| value)
    }

    /// Liquid plus vaulted balance of every address holding tokens in either.
    pub fn effective_balances(&self) -> BTreeMap<&str, f64> {
        let mut balances: BTreeMap<&str, f64> = self
            .balances
            .iter()
            .map(|(address, balance)| (address.as_str(), *balance))
            .collect();
        for (address, locked) in &self.vault {
            let vaulted: f64 = locked.iter().map(|item| item.balance).sum();
            *balances.entry(address.as_str()).or_default() += vaulted;
        }
        balances
    }
}
