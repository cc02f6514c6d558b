//! Decimal arithmetic context: precision, rounding, and status flags.

/* STATUS BITS */

/// The mathematical result was rounded to fit the working precision.
pub const DEC_INEXACT: u32 = 0x01;

/// The operation was not defined for its operands.
pub const DEC_INVALID_OPERATION: u32 = 0x02;

/// Division of a finite value by zero.
pub const DEC_DIVISION_BY_ZERO: u32 = 0x04;

/// The adjusted exponent exceeded the representable maximum.
pub const DEC_OVERFLOW: u32 = 0x08;

/// The adjusted exponent fell below the representable minimum.
pub const DEC_UNDERFLOW: u32 = 0x10;

/* END */

/// Rounding mode applied when a result must be shortened to the working
/// precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round to nearest, ties to even (IEEE 754 default).
    HalfEven,
    /// Round to nearest, ties away from zero.
    HalfUp,
    /// Truncate toward zero.
    Down,
    /// Round away from zero.
    Up,
    /// Round toward negative infinity.
    Floor,
    /// Round toward positive infinity.
    Ceiling,
}

impl Default for Rounding {
    fn default() -> Self {
        Self::HalfEven
    }
}

/// Working state for decimal operations.
///
/// The context is externally owned and must outlive every operation that
/// uses it. Operations accumulate status bits; the engine saves and
/// restores only the bits it depends on (`DEC_INEXACT`,
/// `DEC_INVALID_OPERATION`), leaving the caller's other flags untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecContext {
    /// Maximum number of significant digits a result may carry before it
    /// is rounded.
    pub digits: u32,
    /// Rounding mode for shortened results.
    pub rounding: Rounding,
    /// Largest adjusted exponent of a normal value.
    pub emax: i32,
    /// Smallest adjusted exponent of a normal value.
    pub emin: i32,
    /// Accumulated status bits.
    pub status: u32,
}

impl DecContext {
    /// Create a context with the given working precision, default
    /// rounding, the decimal128 exponent range, and a clear status.
    pub fn new(digits: u32) -> Self {
        Self {
            digits,
            rounding: Rounding::default(),
            emax: 6144,
            emin: -6143,
            status: 0,
        }
    }

    /// Snapshot the status bits selected by `mask`.
    pub const fn save_status(&self, mask: u32) -> u32 {
        self.status & mask
    }

    /// Clear the status bits selected by `mask`.
    pub fn clear_status(&mut self, mask: u32) {
        self.status &= !mask;
    }

    /// Return `true` if any status bit selected by `mask` is set.
    pub const fn test_status(&self, mask: u32) -> bool {
        self.status & mask != 0
    }

    /// Restore the bits selected by `mask` from a prior
    /// [`DecContext::save_status`] snapshot, leaving other bits alone.
    pub fn restore_status(&mut self, saved: u32, mask: u32) {
        self.status = (self.status & !mask) | (saved & mask);
    }

    /// Raise the status bits selected by `mask`.
    pub fn raise(&mut self, mask: u32) {
        self.status |= mask;
    }
}

impl Default for DecContext {
    fn default() -> Self {
        Self::new(crate::consts::DECQUAD_PMAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_surgery_preserves_unrelated_bits() {
        let mut ctx = DecContext::new(34);
        ctx.raise(DEC_OVERFLOW | DEC_INEXACT);

        let saved = ctx.save_status(DEC_INEXACT);
        ctx.clear_status(DEC_INEXACT);
        assert!(!ctx.test_status(DEC_INEXACT));
        assert!(ctx.test_status(DEC_OVERFLOW));

        ctx.restore_status(saved, DEC_INEXACT);
        assert!(ctx.test_status(DEC_INEXACT));
        assert!(ctx.test_status(DEC_OVERFLOW));
    }
}
