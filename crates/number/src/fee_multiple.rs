use {
    crate::{
        Error,
        Winston,
        conversions::{big_rational_ceil_to_big_uint, big_rational_from_f64},
    },
    num::BigRational,
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// Factor by which a network reward gets boosted to speed up mining.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct FeeMultiple(f64);

impl FeeMultiple {
    pub fn new(value: f64) -> Result<Self, Error> {
        if !value.is_finite() || value < 1. {
            return Err(Error::InvalidValue(format!(
                "fee multiple must be a finite number >= 1.0, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn was_reward_boosted(self) -> bool {
        self.0 > 1.
    }

    /// Rounds the boosted reward up to the next whole winston.
    pub fn boost_reward(self, reward: &Winston) -> Winston {
        let boosted = reward.to_big_rational() * self.as_big_rational();
        // A multiple >= 1 never makes the product negative.
        big_rational_ceil_to_big_uint(&boosted)
            .map(Winston::from)
            .unwrap_or_else(|_| reward.clone())
    }

    fn as_big_rational(self) -> BigRational {
        big_rational_from_f64(self.0).unwrap_or_else(|_| BigRational::from_integer(1.into()))
    }
}

impl Default for FeeMultiple {
    fn default() -> Self {
        Self(1.)
    }
}

impl TryFrom<f64> for FeeMultiple {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for FeeMultiple {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidValue(format!("{s:?} is not a number")))?;
        Self::new(value)
    }
}

impl Display for FeeMultiple {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_input() {
        assert!(FeeMultiple::new(0.99).is_err());
        assert!(FeeMultiple::new(f64::NAN).is_err());
        assert!(FeeMultiple::new(f64::INFINITY).is_err());
        assert!(FeeMultiple::new(1.).is_ok());
        assert!(!FeeMultiple::new(1.).unwrap().was_reward_boosted());
        assert!(FeeMultiple::new(1.5).unwrap().was_reward_boosted());
        assert_eq!("1.5".parse::<FeeMultiple>(), FeeMultiple::new(1.5));
        assert!("boost".parse::<FeeMultiple>().is_err());
    }

    #[test]
    fn boosts_reward_rounding_up() {
        let boosted = FeeMultiple::new(1.5).unwrap().boost_reward(&Winston::from(3));
        assert_eq!(boosted, Winston::from(5));

        let boosted = FeeMultiple::new(1.1).unwrap().boost_reward(&Winston::from(10));
        assert_eq!(boosted, Winston::from(11));

        let unchanged = FeeMultiple::default().boost_reward(&Winston::from(123));
        assert_eq!(unchanged, Winston::from(123));
    }

    #[test]
    fn boosted_reward_is_at_least_the_exact_product() {
        for multiple in [1., 1.01, 1.337, 2.5, 10.] {
            for reward in [0u64, 1, 7, 1_000_003, 987_654_321_987] {
                let boosted = FeeMultiple::new(multiple)
                    .unwrap()
                    .boost_reward(&Winston::from(reward));
                let exact = Winston::from(reward).to_big_rational()
                    * big_rational_from_f64(multiple).unwrap();
                assert!(boosted.to_big_rational() >= exact.ceil());
            }
        }
    }
}
