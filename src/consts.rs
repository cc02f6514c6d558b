//! Shared limits and layout parameters.

/* DECIMAL PARAMETERS */

/// Maximum number of significant digits a quad can hold.
pub const DECQUAD_PMAX: u32 = 34;

/// Maximum exponent of a finite quad (IEEE 754-2008 decimal128, adjusted).
pub const DECQUAD_EMAX: i32 = 6111;

/// Minimum exponent of a finite quad.
pub const DECQUAD_EMIN: i32 = -6176;

/// Decimal digits carried per big-decimal coefficient unit.
pub const DEC_UNIT_DIGITS: u32 = 9;

/// One billion; the chunk size used when packing and unpacking quads
/// through 64-bit integers nine digits at a time.
pub const BILLION: u64 = 1_000_000_000;

/// Extra bytes beyond `digits` that a decimal-to-string conversion may
/// need for the sign, decimal point, and exponent suffix.
pub const DECIMAL_STRING_HEADROOM: usize = 14;

/// Number of coefficient units required to hold `digits` decimal digits.
pub const fn number_units(digits: u32) -> usize {
    (digits as usize + DEC_UNIT_DIGITS as usize - 1) / DEC_UNIT_DIGITS as usize
}

/* EXTRACTOR PARAMETERS */

/// Hard limit on the length of any registered path. Component indices are
/// stored in an unsigned 8-bit integer.
pub const MAX_PATH_LENGTH_LIMIT: usize = u8::MAX as usize;

/// Hard limit on the number of paths registered to one extractor. Each
/// registered path is assigned a bit in a 64-bit active-path map.
pub const MAX_NUM_PATHS_LIMIT: usize = 64;

/// Default maximum path length when the caller does not configure one.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 10;

/// Default maximum number of registered paths.
pub const DEFAULT_MAX_NUM_PATHS: usize = 16;

/// Annotation that marks a path component as a wildcard when registering
/// paths from Ion data. Lets a path match a field literally named `*`.
pub const WILDCARD_ANNOTATION: &str = "$ion_wildcard";
