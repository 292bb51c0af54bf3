use {
    crate::{ArDataPrice, Error},
    num::{BigRational, Signed, Zero},
    number::{
        ByteCount,
        Winston,
        conversions::{big_rational_ceil_to_big_uint, big_rational_to_f64},
    },
};

/// Ordinary least squares fit of winston price over byte count.
///
/// The fit is computed with exact rational arithmetic. With a single sample
/// (or samples that all share the same byte count) the line is flat at the
/// mean price, so predicting the sampled byte count returns the sampled price.
#[derive(Clone, Debug)]
pub struct ArDataPriceRegression {
    slope: BigRational,
    intercept: BigRational,
}

impl ArDataPriceRegression {
    pub fn new(prices: &[ArDataPrice]) -> Result<Self, Error> {
        if prices.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = BigRational::from_integer(prices.len().into());
        let mut sum_x = BigRational::zero();
        let mut sum_y = BigRational::zero();
        let mut sum_xx = BigRational::zero();
        let mut sum_xy = BigRational::zero();
        for price in prices {
            let x = BigRational::from_integer(price.num_bytes().value().into());
            let y = price.winston_price().to_big_rational();
            sum_xx += &x * &x;
            sum_xy += &x * &y;
            sum_x += x;
            sum_y += y;
        }

        let denominator = &n * &sum_xx - &sum_x * &sum_x;
        let slope = if denominator.is_zero() {
            BigRational::zero()
        } else {
            (&n * &sum_xy - &sum_x * &sum_y) / denominator
        };
        let intercept = (sum_y - &slope * sum_x) / n;

        Ok(Self { slope, intercept })
    }

    /// Evaluates the fitted line at `byte_count`, rounding up to the next
    /// whole winston. Negative predictions are clamped to zero.
    pub fn predicted_price_for_byte_count(&self, byte_count: ByteCount) -> ArDataPrice {
        let x = BigRational::from_integer(byte_count.value().into());
        let y = &self.intercept + &self.slope * x;
        ArDataPrice::new(byte_count, ceil_to_winston(&y))
    }

    /// The price of a transaction carrying no data at all.
    pub fn base_winston_price(&self) -> Winston {
        ceil_to_winston(&self.intercept)
    }

    /// The price of every additional byte.
    pub fn marginal_winston_price(&self) -> f64 {
        big_rational_to_f64(&self.slope)
    }

    pub(crate) fn exact_marginal_winston_price(&self) -> &BigRational {
        &self.slope
    }
}

fn ceil_to_winston(value: &BigRational) -> Winston {
    if value.is_negative() {
        return Winston::zero();
    }
    // Non-negative values always convert.
    big_rational_ceil_to_big_uint(value)
        .map(Winston::from)
        .unwrap_or_default()
}
