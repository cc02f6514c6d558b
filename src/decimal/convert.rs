//! Representation hops and conversions to integer types.

use crate::consts::DEC_UNIT_DIGITS;
use crate::context::DecContext;
use crate::error::{IonError, IonResult};
use crate::value::IonInt;

use super::math::Dec;
use super::{BigDecimal, Class, IonDecimal, Quad, BITS_INF, BITS_NAN, BITS_SIGN};

impl BigDecimal {
    pub(crate) fn to_dec(&self) -> Dec {
        match self.class() {
            Class::Nan => Dec::nan(),
            Class::Infinite => Dec::infinity(self.is_negative()),
            Class::Finite => {
                let mut mag = Vec::with_capacity(self.digits as usize);
                for (i, unit) in self.lsu.iter().enumerate().rev() {
                    let mut chunk = [0u8; DEC_UNIT_DIGITS as usize];
                    let mut v = *unit;
                    for slot in chunk.iter_mut().rev() {
                        *slot = (v % 10) as u8;
                        v /= 10;
                    }
                    if i + 1 == self.lsu.len() {
                        // Most significant unit: skip its leading zeros.
                        let significant =
                            self.digits as usize - (self.lsu.len() - 1) * DEC_UNIT_DIGITS as usize;
                        mag.extend_from_slice(&chunk[DEC_UNIT_DIGITS as usize - significant..]);
                    } else {
                        mag.extend_from_slice(&chunk);
                    }
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

    /// Build from working form; the exponent is assumed to be in `i32`
    /// range (the arithmetic core keeps it there for representable input).
    pub(crate) fn from_dec_unchecked(d: Dec) -> Self {
        match d.class {
            Class::Nan => Self {
                digits: 1,
                exponent: 0,
                bits: BITS_NAN | if d.sign { BITS_SIGN } else { 0 },
                lsu: vec![0],
            },
            Class::Infinite => Self {
                digits: 1,
                exponent: 0,
                bits: BITS_INF | if d.sign { BITS_SIGN } else { 0 },
                lsu: vec![0],
            },
            Class::Finite => {
                let digits = d.mag.len() as u32;
                let units = crate::consts::number_units(digits);
                let mut lsu = Vec::with_capacity(units);
                let mut i = d.mag.len();
                while i > 0 {
                    let start = i.saturating_sub(DEC_UNIT_DIGITS as usize);
                    let mut unit: u32 = 0;
                    for digit in &d.mag[start..i] {
                        unit = unit * 10 + *digit as u32;
                    }
                    lsu.push(unit);
                    i = start;
                }
                Self {
                    digits,
                    exponent: d.exp as i32,
                    bits: if d.sign { BITS_SIGN } else { 0 },
                    lsu,
                }
            }
        }
    }
}

impl IonDecimal {
    pub(crate) fn to_dec(&self) -> Dec {
        match self {
            Self::Quad(q) => q.to_dec(),
            Self::Number { value, .. } => value.to_dec(),
        }
    }

    /// Convert to `i32`. Fails with [`IonError::NumericOverflow`] when the
    /// value has a fractional part and with [`IonError::InvalidArg`] when
    /// it is non-finite or out of range. The context's status flags are
    /// left as they were.
    pub fn to_int32(&self, _ctx: &mut DecContext) -> IonResult<i32> {
        let (negative, magnitude) = self.exact_integer_parts()?;
        if negative {
            if magnitude > i32::MIN.unsigned_abs() as u128 {
                return Err(IonError::InvalidArg("decimal magnitude exceeds i32 range"));
            }
            Ok((magnitude as i64).wrapping_neg() as i32)
        } else {
            i32::try_from(magnitude)
                .map_err(|_| IonError::InvalidArg("decimal magnitude exceeds i32 range"))
        }
    }

    /// Convert to `u32`; the negative-zero quad converts to zero.
    pub fn to_uint32(&self, _ctx: &mut DecContext) -> IonResult<u32> {
        let (negative, magnitude) = self.exact_integer_parts()?;
        if negative && magnitude != 0 {
            return Err(IonError::InvalidArg("negative decimal cannot convert to u32"));
        }
        u32::try_from(magnitude)
            .map_err(|_| IonError::InvalidArg("decimal magnitude exceeds u32 range"))
    }

    /// Convert to an arbitrary-precision integer. Requires
    /// [`IonDecimal::is_integer`].
    pub fn to_big_int(&self) -> IonResult<IonInt> {
        if !self.is_integer() {
            return Err(IonError::InvalidArg("decimal is not an integer"));
        }
        let d = self.to_dec();
        Ok(IonInt::from_decimal_digits(
            d.sign,
            &d.mag,
            d.exp as usize,
        ))
    }

    /// Sign and magnitude of an exactly integral value.
    fn exact_integer_parts(&self) -> IonResult<(bool, u128)> {
        let d = self.to_dec();
        if !d.is_finite() {
            return Err(IonError::InvalidArg("non-finite decimal cannot convert to an integer"));
        }
        let mut magnitude: u128 = 0;
        for digit in &d.mag {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(*digit as u128))
                .ok_or(IonError::InvalidArg("decimal magnitude exceeds integer range"))?;
        }
        let mut exp = d.exp;
        while exp > 0 && magnitude != 0 {
            magnitude = magnitude
                .checked_mul(10)
                .ok_or(IonError::InvalidArg("decimal magnitude exceeds integer range"))?;
            exp -= 1;
        }
        while exp < 0 {
            if magnitude % 10 != 0 {
                // Discarding nonzero fraction digits would be inexact.
                return Err(IonError::NumericOverflow);
            }
            magnitude /= 10;
            exp += 1;
        }
        Ok((d.sign, magnitude))
    }
}

impl From<Quad> for IonDecimal {
    fn from(quad: Quad) -> Self {
        Self::Quad(quad)
    }
}

impl From<BigDecimal> for IonDecimal {
    fn from(number: BigDecimal) -> Self {
        Self::from_number(number)
    }
}
