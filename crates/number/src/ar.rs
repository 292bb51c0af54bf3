use {
    crate::{
        Error,
        Winston,
        conversions::{big_rational_from_decimal_str, big_rational_to_f64, decimal_places},
    },
    num::{BigRational, BigUint, Integer},
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// Number of winston in one AR, expressed as a power of ten.
pub const WINSTON_DECIMALS: u32 = 12;

fn winston_per_ar() -> BigUint {
    BigUint::from(10u32).pow(WINSTON_DECIMALS)
}

/// An AR amount. Backed by its exact winston value so no precision is lost
/// when converting back and forth.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AR(Winston);

impl AR {
    pub fn from_winston(winston: Winston) -> Self {
        Self(winston)
    }

    pub fn to_winston(&self) -> Winston {
        self.0.clone()
    }

    /// Lossy, for display and logging only.
    pub fn to_f64(&self) -> f64 {
        big_rational_to_f64(&BigRational::new(
            self.0.as_big_uint().clone().into(),
            winston_per_ar().into(),
        ))
    }
}

impl From<Winston> for AR {
    fn from(winston: Winston) -> Self {
        Self::from_winston(winston)
    }
}

impl TryFrom<f64> for AR {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(Error::InvalidValue(format!("{value} is not finite")));
        }
        value.to_string().parse()
    }
}

impl FromStr for AR {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let places = decimal_places(s);
        if places > WINSTON_DECIMALS as usize {
            return Err(Error::PrecisionExceeded {
                value: s.to_owned(),
                max: WINSTON_DECIMALS,
            });
        }
        let ar = big_rational_from_decimal_str(s)?;
        let winston = ar * BigRational::from_integer(winston_per_ar().into());
        // Guaranteed by the decimal place check above.
        debug_assert!(winston.is_integer());
        Winston::from_big_int(&winston.to_integer()).map(Self)
    }
}

impl Display for AR {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let (whole, fraction) = self.0.as_big_uint().div_rem(&winston_per_ar());
        let fraction = format!("{fraction:0>width$}", width = WINSTON_DECIMALS as usize);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.{fraction}")
        }
    }
}

impl Serialize for AR {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AR {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
