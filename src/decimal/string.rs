//! Decimal lexeme parsing and rendering.

use std::fmt;

use crate::consts::DECQUAD_PMAX;
use crate::context::DecContext;
use crate::error::{IonError, IonResult};

use super::math::{self, Dec};
use super::{BigDecimal, Class, IonDecimal, Quad};

struct Lexeme {
    sign: bool,
    mag: Vec<u8>,
    exp: i64,
}

/// Parse `sign? digit+ ('.' digit*)? ((e|E|d|D) sign? digit+)?`. The `d`
/// markers are the Ion spelling of the exponent; they are interchangeable
/// with `e` here.
fn parse_lexeme(input: &str) -> IonResult<Lexeme> {
    let bytes = input.as_bytes();
    let mut pos = 0usize;

    let sign = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut mag: Vec<u8> = Vec::new();
    let mut int_digits = 0usize;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        mag.push(bytes[pos] - b'0');
        int_digits += 1;
        pos += 1;
    }
    if int_digits == 0 {
        return Err(IonError::InvalidArg("decimal lexeme has no integer digits"));
    }

    let mut frac_digits = 0usize;
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            mag.push(bytes[pos] - b'0');
            frac_digits += 1;
            pos += 1;
        }
    }

    let mut exp: i64 = 0;
    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E' | b'd' | b'D') {
        pos += 1;
        let exp_sign = match bytes.get(pos) {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };
        let mut any = false;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            exp = exp
                .checked_mul(10)
                .and_then(|e| e.checked_add((bytes[pos] - b'0') as i64))
                .ok_or(IonError::NumericOverflow)?;
            any = true;
            pos += 1;
        }
        if !any {
            return Err(IonError::InvalidArg("decimal exponent has no digits"));
        }
        if exp_sign {
            exp = -exp;
        }
    }

    if pos != bytes.len() {
        return Err(IonError::InvalidArg("trailing characters after decimal lexeme"));
    }

    Ok(Lexeme {
        sign,
        mag,
        exp: exp - frac_digits as i64,
    })
}

impl IonDecimal {
    /// Parse a decimal lexeme, preferring the quad representation. A value
    /// that cannot be held exactly in a quad is retried as a number sized
    /// for its digits; if even that would round, the parse fails with
    /// [`IonError::NumericOverflow`] instead of losing precision. The
    /// context's inexact flag is left exactly as it was found.
    pub fn from_string(input: &str, ctx: &mut DecContext) -> IonResult<Self> {
        let lexeme = parse_lexeme(input)?;
        let exact = Dec::from_parts(lexeme.sign, lexeme.exp, lexeme.mag);

        let mut status = 0u32;
        let rounded = math::round(exact.clone(), DECQUAD_PMAX, ctx.rounding, &mut status);
        if status & crate::context::DEC_INEXACT == 0 {
            if let Some(quad) = Quad::pack(&rounded) {
                return Ok(Self::Quad(quad));
            }
        }

        if exact.mag.len() as u32 > ctx.digits {
            // Too large for any configured representation; failing beats
            // silently rounding.
            return Err(IonError::NumericOverflow);
        }
        Ok(Self::number_owned(BigDecimal::from_dec_unchecked(exact)))
    }

    /// Render in the scientific notation of the decimal arithmetic
    /// specification. A buffer of `digits + DECIMAL_STRING_HEADROOM` bytes
    /// always suffices; `String` grows on demand.
    pub fn to_decimal_string(&self) -> String {
        let d = self.to_dec();
        dec_to_string(&d)
    }
}

fn dec_to_string(d: &Dec) -> String {
    match d.class {
        Class::Nan => return "NaN".to_string(),
        Class::Infinite => {
            return if d.sign { "-Infinity" } else { "Infinity" }.to_string();
        }
        Class::Finite => {}
    }
    let mut out = String::with_capacity(d.mag.len() + crate::consts::DECIMAL_STRING_HEADROOM);
    if d.sign {
        out.push('-');
    }
    let digits: Vec<char> = d.mag.iter().map(|x| char::from(b'0' + *x)).collect();
    let adjusted = d.adjusted();
    if d.exp <= 0 && adjusted >= -6 {
        // Plain notation.
        if d.exp == 0 {
            out.extend(digits.iter());
        } else if adjusted >= 0 {
            let point = (adjusted + 1) as usize;
            out.extend(digits[..point].iter());
            out.push('.');
            out.extend(digits[point..].iter());
        } else {
            out.push_str("0.");
            for _ in 0..(-adjusted - 1) {
                out.push('0');
            }
            out.extend(digits.iter());
        }
    } else {
        // Exponential notation with one digit before the point.
        out.push(digits[0]);
        if digits.len() > 1 {
            out.push('.');
            out.extend(digits[1..].iter());
        }
        out.push('E');
        if adjusted >= 0 {
            out.push('+');
        }
        out.push_str(&adjusted.to_string());
    }
    out
}

impl fmt::Display for IonDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DecContext {
        DecContext::new(60)
    }

    #[test]
    fn d_and_e_markers_are_interchangeable() {
        let mut ctx = ctx();
        let a = IonDecimal::from_string("1.5d2", &mut ctx).expect("parse d");
        let b = IonDecimal::from_string("1.5e2", &mut ctx).expect("parse e");
        let c = IonDecimal::from_string("1.5D2", &mut ctx).expect("parse D");
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.exponent(), 1);
    }

    #[test]
    fn trailing_point_parses() {
        let mut ctx = ctx();
        let value = IonDecimal::from_string("123.", &mut ctx).expect("parse");
        assert_eq!(value.exponent(), 0);
        assert_eq!(value.digits(), 3);
    }

    #[test]
    fn pmax_digits_stay_quad_one_more_upgrades() {
        let mut ctx = ctx();
        let at_limit = IonDecimal::from_string("9999999999999999999999999999999999", &mut ctx)
            .expect("parse 34 digits");
        assert!(at_limit.is_quad());
        let over_limit = IonDecimal::from_string("99999999999999999999999999999999999", &mut ctx)
            .expect("parse 35 digits");
        assert!(over_limit.is_number());
    }

    #[test]
    fn overflowing_context_digits_fails() {
        let mut ctx = DecContext::new(36);
        let result = IonDecimal::from_string("9999999999999999999999999999999999999", &mut ctx);
        assert_eq!(result.unwrap_err(), IonError::NumericOverflow);
        assert!(!ctx.test_status(crate::context::DEC_INEXACT));
    }

    #[test]
    fn exponent_is_preserved_not_normalized() {
        let mut ctx = ctx();
        let a = IonDecimal::from_string("1.0", &mut ctx).expect("parse");
        let b = IonDecimal::from_string("1.00", &mut ctx).expect("parse");
        assert_eq!(a.exponent(), -1);
        assert_eq!(b.exponent(), -2);
        assert_ne!(a, b);
    }

    #[test]
    fn to_string_round_trips() {
        let mut ctx = ctx();
        for text in [
            "0",
            "-0.00",
            "123",
            "1.25",
            "0.000001",
            "1E+10",
            "-4.5E-12",
            "123.456",
            "99999999999999999999999999999999999",
        ] {
            let value = IonDecimal::from_string(text, &mut ctx).expect("parse");
            let rendered = value.to_decimal_string();
            let reparsed = IonDecimal::from_string(&rendered, &mut ctx).expect("reparse");
            assert_eq!(value, reparsed, "round-trip through {rendered}");
        }
    }

    #[test]
    fn plain_and_exponential_forms() {
        let mut ctx = ctx();
        let cases = [
            ("123", "123"),
            ("-123", "-123"),
            ("1.05", "1.05"),
            ("0.000001", "0.000001"),
            ("1e-7", "1E-7"),
            ("1e2", "1E+2"),
            ("12e2", "1.2E+3"),
            ("0", "0"),
            ("0.00", "0.00"),
        ];
        for (input, expected) in cases {
            let value = IonDecimal::from_string(input, &mut ctx).expect("parse");
            assert_eq!(value.to_decimal_string(), expected, "for input {input}");
        }
    }

    #[test]
    fn rejects_garbage() {
        let mut ctx = ctx();
        for bad in ["", "abc", "1.2.3", "1e", "--1", "1 2", ".5"] {
            assert!(IonDecimal::from_string(bad, &mut ctx).is_err(), "{bad}");
        }
    }
}
