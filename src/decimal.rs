//! Hybrid arbitrary-precision decimal arithmetic.
//!
//! A decimal value lives in one of two representations: a [`Quad`], a fixed
//! stack-sized value limited to 34 significant digits, or a [`BigDecimal`],
//! a heap value bounded only by the context's configured precision. The
//! engine keeps values in quad form whenever possible and transparently
//! upgrades to a big decimal when an operation would lose precision; it
//! never rounds silently.
//!
//! Equality is representational, not numeric: `1.0` and `1.00` denote the
//! same mathematical value but are distinct decimals because their
//! exponents differ.

mod convert;
mod math;
mod ops;
mod quad;
mod string;

/// Sign bit of a [`BigDecimal`]'s `bits` field.
pub(crate) const BITS_SIGN: u8 = 0x1;
/// NaN bit of a [`BigDecimal`]'s `bits` field.
pub(crate) const BITS_NAN: u8 = 0x2;
/// Infinity bit of a [`BigDecimal`]'s `bits` field.
pub(crate) const BITS_INF: u8 = 0x4;

/// Special-value class of a decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Class {
    Finite,
    Infinite,
    Nan,
}

/// A fixed-width decimal holding at most 34 significant digits, the
/// in-memory analogue of an IEEE 754-2008 decimal128.
///
/// The coefficient is an unsigned integer below 10^34 and the exponent is
/// confined to the decimal128 range. A quad owns no heap storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    pub(crate) coeff: u128,
    pub(crate) exponent: i32,
    pub(crate) flags: u8,
}

/// A heap-allocated decimal with an arbitrary digit count.
///
/// The coefficient is stored least-significant-unit first, nine decimal
/// digits per unit, `ceil(digits / 9)` units total. Values are kept
/// canonical: no non-significant leading zero digits other than the single
/// digit of a zero coefficient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigDecimal {
    pub(crate) digits: u32,
    pub(crate) exponent: i32,
    pub(crate) bits: u8,
    pub(crate) lsu: Vec<u32>,
}

/// A decimal value in either representation.
///
/// Arithmetic takes operands by reference and returns a fresh value, so
/// rebinding the result over an operand drops the operand's prior storage
/// exactly once; there is no separate in-place mode to manage.
#[derive(Debug, Clone)]
pub enum IonDecimal {
    /// Fixed 34-digit representation.
    Quad(Quad),
    /// Variable-precision representation. `owned` is false when the
    /// backing number logically belongs to a foreign owner, such as a
    /// reader's arena; see [`IonDecimal::claim`].
    Number {
        /// The backing big decimal.
        value: Box<BigDecimal>,
        /// Whether this value owns its backing allocation.
        owned: bool,
    },
}

impl BigDecimal {
    /// Number of significant digits in the coefficient.
    pub const fn digits(&self) -> u32 {
        self.digits
    }

    /// The exponent applied to the integer coefficient.
    pub const fn exponent(&self) -> i32 {
        self.exponent
    }

    pub(crate) const fn is_negative(&self) -> bool {
        self.bits & BITS_SIGN != 0
    }

    pub(crate) const fn class(&self) -> Class {
        if self.bits & BITS_NAN != 0 {
            Class::Nan
        } else if self.bits & BITS_INF != 0 {
            Class::Infinite
        } else {
            Class::Finite
        }
    }

    /// A positive zero with exponent 0.
    pub fn zero() -> Self {
        Self {
            digits: 1,
            exponent: 0,
            bits: 0,
            lsu: vec![0],
        }
    }
}

impl Quad {
    /// A positive zero with exponent 0.
    pub const fn zero() -> Self {
        Self {
            coeff: 0,
            exponent: 0,
            flags: 0,
        }
    }

    pub(crate) const fn class(&self) -> Class {
        if self.flags & BITS_NAN != 0 {
            Class::Nan
        } else if self.flags & BITS_INF != 0 {
            Class::Infinite
        } else {
            Class::Finite
        }
    }

    pub(crate) const fn is_negative(&self) -> bool {
        self.flags & BITS_SIGN != 0
    }

    /// The exponent applied to the integer coefficient.
    pub const fn exponent(&self) -> i32 {
        self.exponent
    }
}

impl IonDecimal {
    /// A positive zero in quad form.
    pub const fn zero() -> Self {
        Self::Quad(Quad::zero())
    }

    /// Represent an `i32` exactly. The result is always a quad.
    pub fn from_int32(value: i32) -> Self {
        let sign = value < 0;
        let coeff = value.unsigned_abs() as u128;
        Self::Quad(Quad {
            coeff,
            exponent: 0,
            flags: if sign { BITS_SIGN } else { 0 },
        })
    }

    /// Represent a `u32` exactly. The result is always a quad.
    pub fn from_uint32(value: u32) -> Self {
        Self::Quad(Quad {
            coeff: value as u128,
            exponent: 0,
            flags: 0,
        })
    }

    /// Wrap an existing quad.
    pub const fn from_quad(quad: Quad) -> Self {
        Self::Quad(quad)
    }

    /// Wrap a big decimal whose allocation the caller continues to manage.
    /// [`IonDecimal::release`] will not free it; call
    /// [`IonDecimal::claim`] first to take ownership.
    pub fn from_number(number: BigDecimal) -> Self {
        Self::Number {
            value: Box::new(number),
            owned: false,
        }
    }

    pub(crate) fn number_owned(number: BigDecimal) -> Self {
        Self::Number {
            value: Box::new(number),
            owned: true,
        }
    }

    /// Ensure this value outlives the owner of the storage it was parsed
    /// from. Quads carry their value inline, so this is a no-op for them;
    /// a foreign-owned number is copied into a self-owned allocation.
    pub fn claim(&mut self) {
        if let Self::Number { value, owned } = self {
            if !*owned {
                *value = Box::new(value.as_ref().clone());
                *owned = true;
            }
        }
    }

    /// Free any storage this value owns, leaving a quad zero behind. A
    /// no-op for quads and for numbers still owned by a foreign owner.
    pub fn release(&mut self) {
        if let Self::Number { owned: true, .. } = self {
            *self = Self::zero();
        }
    }

    /// Return `true` if this value is in the variable-precision
    /// representation.
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Number { .. })
    }

    /// Return `true` if this value is in the fixed quad representation.
    pub const fn is_quad(&self) -> bool {
        matches!(self, Self::Quad(_))
    }

    /// Representation-sensitive equality under the Ion data model: the
    /// sign, exponent, and coefficient must all be identical. When the
    /// representations differ, the quad operand is converted to number
    /// form in scratch and the comparison proceeds unit-wise.
    pub fn eq_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Quad(l), Self::Quad(r)) => {
                l.is_negative() == r.is_negative()
                    && l.exponent == r.exponent
                    && l.class() == r.class()
                    && l.coeff == r.coeff
            }
            (Self::Number { value: l, .. }, Self::Number { value: r, .. }) => number_eq(l, r),
            (Self::Quad(q), Self::Number { value: n, .. })
            | (Self::Number { value: n, .. }, Self::Quad(q)) => number_eq(&q.to_number(), n),
        }
    }

    /* classification */

    /// Return `true` for any value that is neither infinite nor NaN.
    pub fn is_finite(&self) -> bool {
        self.class() == Class::Finite
    }

    /// Return `true` for an infinity of either sign.
    pub fn is_infinite(&self) -> bool {
        self.class() == Class::Infinite
    }

    /// Return `true` for a NaN.
    pub fn is_nan(&self) -> bool {
        self.class() == Class::Nan
    }

    /// Return `true` if the sign bit is set, including for `-0` and `-NaN`.
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Quad(q) => q.is_negative(),
            Self::Number { value, .. } => value.is_negative(),
        }
    }

    /// Return `true` for a zero of either sign.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Quad(q) => q.class() == Class::Finite && q.coeff == 0,
            Self::Number { value, .. } => {
                value.class() == Class::Finite && value.lsu.iter().all(|u| *u == 0)
            }
        }
    }

    /// Both representations used here are canonical by construction.
    pub fn is_canonical(&self) -> bool {
        true
    }

    /// Return `true` for a nonzero finite value whose adjusted exponent is
    /// at least the context's minimum.
    pub fn is_normal(&self, ctx: &crate::context::DecContext) -> bool {
        self.is_finite() && !self.is_zero() && self.adjusted_exponent() >= ctx.emin
    }

    /// Return `true` for a nonzero finite value whose adjusted exponent is
    /// below the context's minimum.
    pub fn is_subnormal(&self, ctx: &crate::context::DecContext) -> bool {
        self.is_finite() && !self.is_zero() && self.adjusted_exponent() < ctx.emin
    }

    /// Return `true` for a finite value with a non-negative exponent.
    pub fn is_integer(&self) -> bool {
        self.is_finite() && self.exponent() >= 0
    }

    /// Two decimals share a quantum when their exponents are equal,
    /// regardless of representation.
    pub fn same_quantum(&self, other: &Self) -> bool {
        self.exponent() == other.exponent()
    }

    /// Number of significant digits in the coefficient.
    pub fn digits(&self) -> u32 {
        match self {
            Self::Quad(q) => quad::coeff_digits(q.coeff),
            Self::Number { value, .. } => value.digits,
        }
    }

    /// The exponent applied to the integer coefficient.
    pub fn exponent(&self) -> i32 {
        match self {
            Self::Quad(q) => q.exponent,
            Self::Number { value, .. } => value.exponent,
        }
    }

    /// The radix of the arithmetic; always ten.
    pub const fn radix(&self) -> u32 {
        10
    }

    pub(crate) fn class(&self) -> Class {
        match self {
            Self::Quad(q) => q.class(),
            Self::Number { value, .. } => value.class(),
        }
    }

    pub(crate) fn adjusted_exponent(&self) -> i32 {
        self.exponent() + self.digits() as i32 - 1
    }
}

impl Default for IonDecimal {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for IonDecimal {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other)
    }
}

impl Eq for IonDecimal {}

fn number_eq(left: &BigDecimal, right: &BigDecimal) -> bool {
    left.exponent == right.exponent
        && left.digits == right.digits
        && left.bits == right.bits
        && left.lsu == right.lsu
}
