use {
    number::{ByteCount, Winston},
    serde::{Deserialize, Serialize},
};

/// The price in winston for storing a number of bytes, either observed from
/// an oracle or predicted by a model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArDataPrice {
    num_bytes: ByteCount,
    winston_price: Winston,
}

impl ArDataPrice {
    pub fn new(num_bytes: ByteCount, winston_price: Winston) -> Self {
        Self {
            num_bytes,
            winston_price,
        }
    }

    pub fn num_bytes(&self) -> ByteCount {
        self.num_bytes
    }

    pub fn winston_price(&self) -> &Winston {
        &self.winston_price
    }
}
