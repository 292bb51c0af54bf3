use {
    crate::Error,
    num::{BigInt, BigRational, BigUint, Signed, ToPrimitive, Zero, bigint::Sign},
    std::{ops::Neg, str::FromStr},
};

pub fn big_uint_to_big_rational(input: &BigUint) -> BigRational {
    BigRational::from_integer(BigInt::from_biguint(Sign::Plus, input.clone()))
}

pub fn big_int_to_big_uint(input: &BigInt) -> Result<BigUint, Error> {
    input
        .to_biguint()
        .ok_or_else(|| Error::InvalidValue(format!("{input} is negative")))
}

/// Rounds towards positive infinity.
pub fn big_rational_ceil_to_big_uint(ratio: &BigRational) -> Result<BigUint, Error> {
    big_int_to_big_uint(&ratio.ceil().to_integer())
}

/// Rounds towards negative infinity.
pub fn big_rational_floor_to_big_uint(ratio: &BigRational) -> Result<BigUint, Error> {
    big_int_to_big_uint(&ratio.floor().to_integer())
}

pub fn big_rational_to_f64(ratio: &BigRational) -> f64 {
    ratio.to_f64().unwrap_or(f64::NAN)
}

/// Converts a float into an exact `BigRational` by going through its shortest
/// decimal representation. Converting the binary representation directly would
/// leak float rounding noise into the rational.
pub fn big_rational_from_f64(value: f64) -> Result<BigRational, Error> {
    if !value.is_finite() {
        return Err(Error::InvalidValue(format!("{value} is not finite")));
    }
    big_rational_from_decimal_str(&value.to_string())
}

/// Converts a decimal string (e.g., `"0.1"`) to an exact `BigRational`.
pub fn big_rational_from_decimal_str(s: &str) -> Result<BigRational, Error> {
    let invalid = || Error::InvalidValue(format!("{s:?} is not a decimal number"));
    let trimmed = s.trim();
    let (is_negative, digits) = match trimmed.strip_prefix('-') {
        Some(stripped) => (true, stripped),
        None => (false, trimmed),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let integer_part = if integer.is_empty() {
        // ".5" is read as "0.5"
        BigInt::zero()
    } else {
        BigInt::from_str(integer).map_err(|_| invalid())?
    };
    let fractional_part = if fraction.is_empty() {
        BigInt::zero()
    } else {
        BigInt::from_str(fraction).map_err(|_| invalid())?
    };
    let fractional_length = u32::try_from(fraction.len()).map_err(|_| invalid())?;
    let denominator = BigInt::from(10u32).pow(fractional_length);
    let ratio = BigRational::new(integer_part * &denominator + fractional_part, denominator);

    Ok(if is_negative { ratio.neg() } else { ratio })
}

/// Number of digits after the decimal point of a decimal string, ignoring
/// the sign and surrounding whitespace.
pub fn decimal_places(s: &str) -> usize {
    s.trim()
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}

pub fn ensure_non_negative(value: &BigRational) -> Result<(), Error> {
    if value.is_negative() {
        return Err(Error::InvalidValue(format!("{value} is negative")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_rational_from_decimal_str_() {
        assert_eq!(
            big_rational_from_decimal_str("1234.5678").unwrap(),
            BigRational::new(12345678.into(), 10000.into())
        );
        assert_eq!(
            big_rational_from_decimal_str(".1").unwrap(),
            BigRational::new(1.into(), 10.into())
        );
        assert_eq!(
            big_rational_from_decimal_str("-0.125").unwrap(),
            -BigRational::new(1.into(), 8.into())
        );
        assert_eq!(
            big_rational_from_decimal_str("7.").unwrap(),
            BigRational::from_integer(7.into())
        );

        assert!(big_rational_from_decimal_str("0.1.0").is_err());
        assert!(big_rational_from_decimal_str("a").is_err());
        assert!(big_rational_from_decimal_str("1 0").is_err());
        assert!(big_rational_from_decimal_str(".").is_err());
        assert!(big_rational_from_decimal_str("1e5").is_err());
    }

    #[test]
    fn floats_convert_through_their_decimal_form() {
        assert_eq!(
            big_rational_from_f64(0.1).unwrap(),
            BigRational::new(1.into(), 10.into())
        );
        assert!(big_rational_from_f64(f64::NAN).is_err());
        assert!(big_rational_from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn rounding() {
        let ratio = BigRational::new(7.into(), 2.into());
        assert_eq!(big_rational_ceil_to_big_uint(&ratio).unwrap(), 4u32.into());
        assert_eq!(big_rational_floor_to_big_uint(&ratio).unwrap(), 3u32.into());
        assert!(big_rational_floor_to_big_uint(&-ratio).is_err());
    }

    #[test]
    fn counts_decimal_places() {
        assert_eq!(decimal_places("1"), 0);
        assert_eq!(decimal_places("1.50"), 2);
        assert_eq!(decimal_places(" -0.000000000001 "), 12);
    }
}
