use {
    crate::Error,
    serde::{Deserialize, Serialize},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// A non-negative number of bytes.
#[derive(
    Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ByteCount(u64);

impl ByteCount {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn kib(value: u64) -> Self {
        Self(value * 1024)
    }

    pub const fn mib(value: u64) -> Self {
        Self(value * 1024 * 1024)
    }

    pub const fn gib(value: u64) -> Self {
        Self(value * 1024 * 1024 * 1024)
    }
}

impl From<u64> for ByteCount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for ByteCount {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| Error::InvalidValue(format!("byte count {value} is negative")))
    }
}

impl TryFrom<f64> for ByteCount {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0. || value.fract() != 0. || value >= u64::MAX as f64 {
            return Err(Error::InvalidValue(format!(
                "byte count must be a non-negative integer, got {value}"
            )));
        }
        Ok(Self(value as u64))
    }
}

impl FromStr for ByteCount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self).map_err(|err| {
            Error::InvalidValue(format!("{s:?} is not a non-negative integer: {err}"))
        })
    }
}

impl Display for ByteCount {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_input() {
        assert!(ByteCount::try_from(-1i64).is_err());
        assert!(ByteCount::try_from(1.5).is_err());
        assert!(ByteCount::try_from(f64::INFINITY).is_err());
        assert!(ByteCount::try_from(f64::NAN).is_err());
        assert!("-3".parse::<ByteCount>().is_err());
        assert_eq!(ByteCount::try_from(3.0).unwrap(), ByteCount::new(3));
        assert!(ByteCount::try_from(u64::MAX as f64).is_err());
        assert!(ByteCount::try_from(2f64.powi(64)).is_err());
        assert_eq!(
            ByteCount::try_from(2f64.powi(63)).unwrap(),
            ByteCount::new(1 << 63)
        );
        assert_eq!("1024".parse::<ByteCount>().unwrap(), ByteCount::kib(1));
    }

    #[test]
    fn unit_constructors() {
        assert_eq!(ByteCount::kib(100).value(), 102_400);
        assert_eq!(ByteCount::mib(100).value(), 104_857_600);
        assert_eq!(ByteCount::gib(10).value(), 10_737_418_240);
    }
}
