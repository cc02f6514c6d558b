//! The arithmetic surface and its representation-dispatch scheme.
//!
//! Every operation follows the same plan, whatever its arity:
//!
//! 1. Compute a mask with one bit per operand, set when that operand is a
//!    number.
//! 2. All quads: run the primitive at quad precision with the inexact flag
//!    isolated. A clean result stays a quad.
//! 3. Inexact (or an exponent outside the quad range): convert the
//!    operands and rerun at the context's precision; the result is a
//!    number. The retry's inexact flag is not surfaced, matching the
//!    status restore the quad attempt promised.
//! 4. Any number operand: run at the context's precision directly; status
//!    accumulates in the context.
//!
//! Operands are borrowed and the result is returned by value, so an
//! "in-place" update is just a rebinding; the operand's old storage drops
//! exactly once.

use tracing::debug;

use crate::consts::DECQUAD_PMAX;
use crate::context::{DecContext, Rounding, DEC_INEXACT};
use crate::error::IonResult;

use super::math::{self, Dec};
use super::{BigDecimal, IonDecimal, Quad};

fn decnum_mask(operands: &[&IonDecimal]) -> u64 {
    operands
        .iter()
        .enumerate()
        .filter(|(_, op)| op.is_number())
        .fold(0u64, |mask, (i, _)| mask | (1 << i))
}

impl IonDecimal {
    fn calculate(
        operands: &[&IonDecimal],
        ctx: &mut DecContext,
        core: impl Fn(&[&Dec], u32, Rounding, &mut u32) -> Dec,
    ) -> IonResult<IonDecimal> {
        let mask = decnum_mask(operands);
        let decs: Vec<Dec> = operands.iter().map(|op| op.to_dec()).collect();
        let refs: Vec<&Dec> = decs.iter().collect();

        if mask == 0 {
            let mut status = 0u32;
            let result = core(&refs, DECQUAD_PMAX, ctx.rounding, &mut status);
            if status & DEC_INEXACT == 0 {
                if let Some(quad) = Quad::pack(&result) {
                    ctx.raise(status);
                    return Ok(IonDecimal::Quad(quad));
                }
            }
            // The result overflowed quad precision; redo the operation at
            // the context's precision rather than round silently.
            debug!("quad arithmetic was inexact; upgrading operands to numbers");
            let mut status = 0u32;
            let result = core(&refs, ctx.digits, ctx.rounding, &mut status);
            ctx.raise(status & !DEC_INEXACT);
            return Ok(IonDecimal::number_owned(BigDecimal::from_dec_unchecked(result)));
        }

        let mut status = 0u32;
        let result = core(&refs, ctx.digits, ctx.rounding, &mut status);
        ctx.raise(status);
        Ok(IonDecimal::number_owned(BigDecimal::from_dec_unchecked(result)))
    }

    /// `self + rhs`.
    pub fn add(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| math::add(ops[0], ops[1], p, r, st))
    }

    /// `self - rhs`.
    pub fn subtract(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::subtract(ops[0], ops[1], p, r, st)
        })
    }

    /// `self * rhs`.
    pub fn multiply(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::multiply(ops[0], ops[1], p, r, st)
        })
    }

    /// `self / rhs`.
    pub fn divide(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::divide(ops[0], ops[1], p, r, st)
        })
    }

    /// Integer part of `self / rhs`, with exponent zero.
    pub fn divide_integer(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::divide_integer(ops[0], ops[1], p, r, st)
        })
    }

    /// Remainder of integer division; takes the dividend's sign.
    pub fn remainder(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::remainder(ops[0], ops[1], p, r, st)
        })
    }

    /// Remainder nearest to zero, ties to the even quotient.
    pub fn remainder_near(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::remainder_near(ops[0], ops[1], p, r, st)
        })
    }

    /// The larger operand; a quiet NaN loses to a number.
    pub fn max(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| math::max(ops[0], ops[1], p, r, st))
    }

    /// The operand with the larger absolute value.
    pub fn max_mag(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::max_mag(ops[0], ops[1], p, r, st)
        })
    }

    /// The smaller operand; a quiet NaN loses to a number.
    pub fn min(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| math::min(ops[0], ops[1], p, r, st))
    }

    /// The operand with the smaller absolute value.
    pub fn min_mag(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::min_mag(ops[0], ops[1], p, r, st)
        })
    }

    /// `self` rescaled to the quantum (exponent) of `rhs`.
    pub fn quantize(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::quantize(ops[0], ops[1], p, r, st)
        })
    }

    /// `self * 10^rhs`; `rhs` must be a small integer.
    pub fn scaleb(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::scaleb(ops[0], ops[1], p, r, st)
        })
    }

    /// Shift the coefficient by `rhs` digits inside the precision window;
    /// positive counts shift toward the most significant digit.
    pub fn shift(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::shift(ops[0], ops[1], p, r, st)
        })
    }

    /// Rotate the coefficient by `rhs` digits inside the precision window.
    pub fn rotate(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| {
            math::rotate(ops[0], ops[1], p, r, st)
        })
    }

    /// Digit-wise logical AND of two operands whose digits are all zeros
    /// and ones.
    pub fn and(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| math::and(ops[0], ops[1], p, r, st))
    }

    /// Digit-wise logical OR.
    pub fn or(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| math::or(ops[0], ops[1], p, r, st))
    }

    /// Digit-wise logical XOR.
    pub fn xor(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs], ctx, |ops, p, r, st| math::xor(ops[0], ops[1], p, r, st))
    }

    /// Fused multiply-add `self * rhs + addend` with a single rounding.
    pub fn fma(&self, rhs: &Self, addend: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self, rhs, addend], ctx, |ops, p, r, st| {
            math::fma(ops[0], ops[1], ops[2], p, r, st)
        })
    }

    /// Absolute value.
    pub fn abs(&self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self], ctx, |ops, p, r, st| math::abs(ops[0], p, r, st))
    }

    /// Negation.
    pub fn minus(&self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self], ctx, |ops, p, r, st| math::minus(ops[0], p, r, st))
    }

    /// Identity, rounded to the working precision.
    pub fn plus(&self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self], ctx, |ops, p, r, st| math::plus(ops[0], p, r, st))
    }

    /// Digit-wise logical NOT across the precision window.
    pub fn invert(&self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self], ctx, |ops, p, r, st| math::invert(ops[0], p, r, st))
    }

    /// The adjusted exponent as a decimal integer.
    pub fn logb(&self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self], ctx, |ops, p, r, st| math::logb(ops[0], p, r, st))
    }

    /// Remove trailing coefficient zeros, raising the exponent to match.
    pub fn reduce(&self, ctx: &mut DecContext) -> IonResult<Self> {
        Self::calculate(&[self], ctx, |ops, p, r, st| math::reduce(ops[0], p, r, st))
    }

    /// `self` with the sign of `sign_source`. Never upgrades and never
    /// rounds; the result keeps `self`'s representation.
    pub fn copy_sign(&self, sign_source: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        let _ = ctx;
        let negative = sign_source.is_negative();
        Ok(match self {
            Self::Quad(q) => {
                let mut quad = *q;
                quad.flags = (quad.flags & !super::BITS_SIGN)
                    | if negative { super::BITS_SIGN } else { 0 };
                Self::Quad(quad)
            }
            Self::Number { value, .. } => {
                let mut number = value.as_ref().clone();
                number.bits = (number.bits & !super::BITS_SIGN)
                    | if negative { super::BITS_SIGN } else { 0 };
                Self::number_owned(number)
            }
        })
    }

    /// Numeric comparison: `-1`, `0`, or `1` as a quad, or NaN when either
    /// operand is NaN. Unlike [`IonDecimal::eq_value`], `1.0` compares
    /// equal to `1.00` here.
    pub fn compare(&self, rhs: &Self, ctx: &mut DecContext) -> IonResult<Self> {
        let mut status = 0u32;
        let result = math::compare(
            &self.to_dec(),
            &rhs.to_dec(),
            DECQUAD_PMAX,
            ctx.rounding,
            &mut status,
        );
        ctx.raise(status);
        Ok(Self::Quad(Quad::pack(&result).unwrap_or_else(Quad::nan)))
    }
}
