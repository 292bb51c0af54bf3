use {
    crate::{
        Error,
        conversions::{
            big_int_to_big_uint,
            big_rational_ceil_to_big_uint,
            big_rational_floor_to_big_uint,
            big_rational_from_f64,
            big_uint_to_big_rational,
            ensure_non_negative,
        },
    },
    num::{BigInt, BigRational, BigUint, Zero},
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// The smallest unit of the AR currency. Always a non-negative integer since
/// fractional winston cannot be submitted to the network.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Winston(BigUint);

impl Winston {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_big_int(value: &BigInt) -> Result<Self, Error> {
        big_int_to_big_uint(value).map(Self)
    }

    pub fn as_big_uint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_big_rational(&self) -> BigRational {
        big_uint_to_big_rational(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn plus(&self, other: &Winston) -> Winston {
        Self(&self.0 + &other.0)
    }

    /// Fails when `other` is larger than `self`.
    pub fn minus(&self, other: &Winston) -> Result<Winston, Error> {
        if other.0 > self.0 {
            return Err(Error::InvalidValue(format!(
                "{self} - {other} would be negative"
            )));
        }
        Ok(Self(&self.0 - &other.0))
    }

    /// Multiplies and rounds down to the next whole winston.
    pub fn times(&self, multiplier: &BigRational) -> Result<Winston, Error> {
        ensure_non_negative(multiplier)?;
        big_rational_floor_to_big_uint(&(self.to_big_rational() * multiplier)).map(Self)
    }

    pub fn times_f64(&self, multiplier: f64) -> Result<Winston, Error> {
        self.times(&big_rational_from_f64(multiplier)?)
    }

    /// Divides and rounds up to the next whole winston, overcharging by at
    /// most one winston rather than undercharging.
    pub fn divided_by(&self, divisor: &BigRational) -> Result<Winston, Error> {
        ensure_non_negative(divisor)?;
        if divisor.is_zero() {
            return Err(Error::InvalidValue(format!("{self} divided by zero")));
        }
        big_rational_ceil_to_big_uint(&(self.to_big_rational() / divisor)).map(Self)
    }

    pub fn divided_by_f64(&self, divisor: f64) -> Result<Winston, Error> {
        self.divided_by(&big_rational_from_f64(divisor)?)
    }

    pub fn is_greater_than(&self, other: &Winston) -> bool {
        self.0 > other.0
    }
}

impl From<u64> for Winston {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl From<BigUint> for Winston {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for Winston {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_big_int(&BigInt::from(value))
    }
}

impl FromStr for Winston {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidValue(format!(
                "{s:?} is not a non-negative integer winston amount"
            )));
        }
        BigUint::from_str(trimmed)
            .map(Self)
            .map_err(|err| Error::InvalidValue(format!("{s:?}: {err}")))
    }
}

impl Display for Winston {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Winston {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Winston {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
