//! Fixed-representation internals and the wire-facing quad helpers.

use crate::consts::{BILLION, DECQUAD_EMAX, DECQUAD_EMIN, DECQUAD_PMAX};
use crate::error::{IonError, IonResult};

use super::math::Dec;
use super::{BigDecimal, Class, Quad, BITS_INF, BITS_NAN, BITS_SIGN};

/// Number of significant digits in a quad coefficient.
pub(crate) fn coeff_digits(coeff: u128) -> u32 {
    if coeff == 0 {
        return 1;
    }
    let mut digits = 0;
    let mut v = coeff;
    while v > 0 {
        digits += 1;
        v /= 10;
    }
    digits
}

impl Quad {
    /// A quiet NaN.
    pub const fn nan() -> Self {
        Self {
            coeff: 0,
            exponent: 0,
            flags: BITS_NAN,
        }
    }

    /// An infinity with the given sign.
    pub const fn infinity(negative: bool) -> Self {
        Self {
            coeff: 0,
            exponent: 0,
            flags: if negative { BITS_INF | BITS_SIGN } else { BITS_INF },
        }
    }

    pub(crate) fn to_dec(self) -> Dec {
        match self.class() {
            Class::Nan => Dec::nan(),
            Class::Infinite => Dec::infinity(self.is_negative()),
            Class::Finite => {
                let mut mag = Vec::with_capacity(DECQUAD_PMAX as usize);
                let mut v = self.coeff;
                if v == 0 {
                    mag.push(0);
                } else {
                    while v > 0 {
                        mag.push((v % 10) as u8);
                        v /= 10;
                    }
                    mag.reverse();
                }
                Dec {
                    sign: self.is_negative(),
                    exp: self.exponent as i64,
                    mag,
                    class: Class::Finite,
                }
            }
        }
    }

    /// Pack a working-form value into a quad, if it fits: at most 34
    /// significant digits and an exponent inside the decimal128 range.
    pub(crate) fn pack(d: &Dec) -> Option<Self> {
        match d.class {
            Class::Nan => Some(Self::nan()),
            Class::Infinite => Some(Self::infinity(d.sign)),
            Class::Finite => {
                if d.mag.len() > DECQUAD_PMAX as usize {
                    return None;
                }
                if d.exp < DECQUAD_EMIN as i64 || d.exp > DECQUAD_EMAX as i64 {
                    return None;
                }
                let mut coeff: u128 = 0;
                for digit in &d.mag {
                    coeff = coeff * 10 + *digit as u128;
                }
                Some(Self {
                    coeff,
                    exponent: d.exp as i32,
                    flags: if d.sign { BITS_SIGN } else { 0 },
                })
            }
        }
    }

    /// Widen to the variable representation. This is also the scratch
    /// conversion behind mixed-representation comparison and arithmetic.
    pub fn to_number(&self) -> BigDecimal {
        BigDecimal::from_dec_unchecked(self.to_dec())
    }

    /// Build a quad from a 64-bit coefficient and an exponent, as the
    /// binary reader decodes decimals from the wire. `is_negative_zero`
    /// distinguishes `-0d0` from `0d0`, whose coefficients are identical.
    pub fn from_digits_and_exponent(value: i64, exp: i32, is_negative_zero: bool) -> Self {
        let negative = value < 0 || (value == 0 && is_negative_zero);
        // Accumulate nine decimal digits per step, mirroring the
        // billion-chunk packing the writers use.
        let mut unsigned = value.unsigned_abs();
        let mut coeff: u128 = 0;
        let mut multiplier: u128 = 1;
        while unsigned > 0 {
            let nine_digits = unsigned % BILLION;
            unsigned /= BILLION;
            coeff += multiplier * nine_digits as u128;
            multiplier *= BILLION as u128;
        }
        Self {
            coeff,
            exponent: exp,
            flags: if negative { BITS_SIGN } else { 0 },
        }
    }

    /// Extract a finite, integral, non-negative quad as an `i64`,
    /// truncating toward zero nine digits at a time. The writers use this
    /// for coefficients known to fit the wire's 64-bit field.
    pub fn to_int64(&self) -> IonResult<i64> {
        if self.class() != Class::Finite {
            return Err(IonError::InvalidArg("to_int64 requires a finite decimal"));
        }
        if self.is_negative() && self.coeff != 0 {
            return Err(IonError::InvalidArg("to_int64 requires a non-negative decimal"));
        }
        if self.exponent < 0 {
            return Err(IonError::InvalidArg("to_int64 requires an integral decimal"));
        }
        let mut magnitude = self.coeff;
        let mut exp = self.exponent;
        while exp > 0 {
            magnitude = magnitude
                .checked_mul(10)
                .ok_or(IonError::NumericOverflow)?;
            exp -= 1;
        }
        i64::try_from(magnitude).map_err(|_| IonError::NumericOverflow)
    }

    /// Approximate this quad as a binary double: normalize the coefficient
    /// into the 53-bit mantissa, tracking the binary exponent shifted off,
    /// then reapply the sign and both exponents.
    pub fn to_f64(&self) -> f64 {
        match self.class() {
            Class::Nan => return f64::NAN,
            Class::Infinite => {
                return if self.is_negative() {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                };
            }
            Class::Finite => {}
        }
        let mut magnitude = self.coeff;
        let mut exp_base_2 = 0i32;
        while magnitude >= 1u128 << 53 {
            magnitude >>= 1;
            exp_base_2 += 1;
        }
        let mut value = magnitude as f64;
        if exp_base_2 != 0 {
            value *= 2f64.powi(exp_base_2);
        }
        if self.exponent != 0 {
            value *= 10f64.powi(self.exponent);
        }
        if self.is_negative() {
            value = -value;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_count() {
        assert_eq!(coeff_digits(0), 1);
        assert_eq!(coeff_digits(9), 1);
        assert_eq!(coeff_digits(10), 2);
        assert_eq!(coeff_digits(10u128.pow(33)), 34);
    }

    #[test]
    fn digits_and_exponent_round_trip() {
        let quad = Quad::from_digits_and_exponent(1234567890123456789, 0, false);
        assert_eq!(quad.to_int64().expect("fits"), 1234567890123456789);

        let negative_zero = Quad::from_digits_and_exponent(0, -1, true);
        assert!(negative_zero.is_negative());
        assert_eq!(negative_zero.coeff, 0);
        assert_eq!(negative_zero.exponent, -1);
    }

    #[test]
    fn to_int64_rejects_fractions() {
        let quad = Quad {
            coeff: 15,
            exponent: -1,
            flags: 0,
        };
        assert!(quad.to_int64().is_err());
    }

    #[test]
    fn to_f64_applies_both_exponents() {
        let quad = Quad {
            coeff: 25,
            exponent: -1,
            flags: BITS_SIGN,
        };
        assert_eq!(quad.to_f64(), -2.5);

        let big = Quad {
            coeff: 1u128 << 60,
            exponent: 0,
            flags: 0,
        };
        let expected = (1u128 << 60) as f64;
        assert!((big.to_f64() - expected).abs() / expected < 1e-10);
    }
}
