use {
    serde::{Deserialize, Serialize},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// An Arweave transaction ID: 43 characters of unpadded base64url.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    pub const LENGTH: usize = 43;

    /// For IDs known to be well formed at compile time.
    pub(crate) fn from_static(id: &'static str) -> Self {
        debug_assert!(id.parse::<Self>().is_ok(), "malformed transaction ID {id}");
        Self(id.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TransactionId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        anyhow::ensure!(
            s.len() == Self::LENGTH,
            "transaction ID {s:?} must be {} characters long",
            Self::LENGTH
        );
        anyhow::ensure!(
            s.bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
            "transaction ID {s:?} is not base64url encoded"
        );
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for TransactionId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionId> for String {
    fn from(value: TransactionId) -> Self {
        value.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
