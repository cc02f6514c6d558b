//! Working-form decimal arithmetic shared by both representations.
//!
//! Every operation runs on [`Dec`], an unpacked sign/exponent/digit-vector
//! form, parameterized by a working precision. The quad primitives are this
//! core at 34 digits; the number primitives are this core at the context's
//! precision. Operations report status through a bit mask using the
//! `DEC_*` constants from [`crate::context`].

use std::cmp::Ordering;

use crate::context::{Rounding, DEC_DIVISION_BY_ZERO, DEC_INEXACT, DEC_INVALID_OPERATION};

use super::Class;

/// Exponent gaps wider than this are handled through the dominant-operand
/// shortcut instead of literal digit alignment.
const MAX_ALIGN: i64 = 8192;

/// Unpacked working form: sign, exponent, and most-significant-first
/// decimal digits. The digit vector is canonical (no leading zeros; a zero
/// coefficient is the single digit 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dec {
    pub sign: bool,
    pub exp: i64,
    pub mag: Vec<u8>,
    pub class: Class,
}

impl Dec {
    pub fn nan() -> Self {
        Self {
            sign: false,
            exp: 0,
            mag: vec![0],
            class: Class::Nan,
        }
    }

    pub fn infinity(sign: bool) -> Self {
        Self {
            sign,
            exp: 0,
            mag: vec![0],
            class: Class::Infinite,
        }
    }

    pub fn zero(sign: bool, exp: i64) -> Self {
        Self {
            sign,
            exp,
            mag: vec![0],
            class: Class::Finite,
        }
    }

    pub fn from_parts(sign: bool, exp: i64, mag: Vec<u8>) -> Self {
        let mag = trim(mag);
        Self {
            sign,
            exp,
            mag,
            class: Class::Finite,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.class == Class::Finite && self.mag == [0]
    }

    pub fn is_finite(&self) -> bool {
        self.class == Class::Finite
    }

    /// Exponent of the most significant digit.
    pub fn adjusted(&self) -> i64 {
        self.exp + self.mag.len() as i64 - 1
    }

    /// Coefficient digits are all zeros and ones, the precondition of the
    /// logical operations.
    fn is_logical(&self) -> bool {
        self.class == Class::Finite
            && !self.sign
            && self.exp == 0
            && self.mag.iter().all(|d| *d <= 1)
    }
}

/* magnitude helpers: MSD-first digit vectors */

fn trim(mut mag: Vec<u8>) -> Vec<u8> {
    let lead = mag.iter().take_while(|d| **d == 0).count();
    if lead == mag.len() {
        return vec![0];
    }
    mag.drain(..lead);
    mag
}

fn is_zero_mag(mag: &[u8]) -> bool {
    mag.iter().all(|d| *d == 0)
}

fn cmp_mag(a: &[u8], b: &[u8]) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}

fn add_mag(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len().max(b.len()) + 1);
    let mut carry = 0u8;
    let mut ia = a.iter().rev();
    let mut ib = b.iter().rev();
    loop {
        let da = ia.next();
        let db = ib.next();
        if da.is_none() && db.is_none() {
            break;
        }
        let sum = da.copied().unwrap_or(0) + db.copied().unwrap_or(0) + carry;
        out.push(sum % 10);
        carry = sum / 10;
    }
    if carry > 0 {
        out.push(carry);
    }
    out.reverse();
    out
}

/// `a - b`; requires `a >= b`.
fn sub_mag(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len());
    let mut borrow = 0i8;
    let mut ia = a.iter().rev();
    let mut ib = b.iter().rev();
    loop {
        let da = match ia.next() {
            Some(d) => *d as i8,
            None => break,
        };
        let db = ib.next().map(|d| *d as i8).unwrap_or(0);
        let mut diff = da - db - borrow;
        if diff < 0 {
            diff += 10;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out.push(diff as u8);
    }
    out.reverse();
    trim(out)
}

fn mul_mag(a: &[u8], b: &[u8]) -> Vec<u8> {
    if is_zero_mag(a) || is_zero_mag(b) {
        return vec![0];
    }
    let mut acc = vec![0u32; a.len() + b.len()];
    for (i, da) in a.iter().rev().enumerate() {
        for (j, db) in b.iter().rev().enumerate() {
            acc[i + j] += (*da as u32) * (*db as u32);
        }
    }
    let mut carry = 0u32;
    let mut out = Vec::with_capacity(acc.len());
    for cell in acc {
        let v = cell + carry;
        out.push((v % 10) as u8);
        carry = v / 10;
    }
    while carry > 0 {
        out.push((carry % 10) as u8);
        carry /= 10;
    }
    out.reverse();
    trim(out)
}

fn shl_mag(mag: &[u8], zeros: usize) -> Vec<u8> {
    if is_zero_mag(mag) {
        return vec![0];
    }
    let mut out = mag.to_vec();
    out.extend(std::iter::repeat(0).take(zeros));
    out
}

/// Full integer division: returns the quotient and remainder magnitudes.
fn divmod_mag(a: &[u8], b: &[u8]) -> (Vec<u8>, Vec<u8>) {
    debug_assert!(!is_zero_mag(b));
    let mut quotient = Vec::with_capacity(a.len());
    let mut rem: Vec<u8> = vec![0];
    for d in a {
        rem.push(*d);
        rem = trim(rem);
        let mut q = 0u8;
        while cmp_mag(&rem, b) != Ordering::Less {
            rem = sub_mag(&rem, b);
            q += 1;
        }
        quotient.push(q);
    }
    (trim(quotient), rem)
}

/* rounding */

fn should_increment(
    rounding: Rounding,
    sign: bool,
    first_dropped: u8,
    sticky: bool,
    last_kept: u8,
) -> bool {
    let discarded = first_dropped > 0 || sticky;
    match rounding {
        Rounding::Down => false,
        Rounding::Up => discarded,
        Rounding::HalfUp => first_dropped >= 5,
        Rounding::HalfEven => {
            first_dropped > 5 || (first_dropped == 5 && (sticky || last_kept % 2 == 1))
        }
        Rounding::Floor => discarded && sign,
        Rounding::Ceiling => discarded && !sign,
    }
}

/// Shorten `d` to at most `p` digits, raising `DEC_INEXACT` when nonzero
/// digits are discarded. `extra_sticky` folds in discarded weight the
/// caller already knows about (a division remainder, a distant operand).
fn round_with_sticky(mut d: Dec, p: u32, rounding: Rounding, status: &mut u32, extra_sticky: bool) -> Dec {
    if d.class != Class::Finite {
        return d;
    }
    let p = p as usize;
    if d.mag.len() <= p {
        if extra_sticky {
            // The kept digits are exact but the true result has more
            // weight below them.
            *status |= DEC_INEXACT;
            let last = *d.mag.last().unwrap_or(&0);
            if should_increment(rounding, d.sign, 0, true, last) {
                d = increment_mag(d, p);
            }
        }
        return d;
    }
    let keep = p;
    let dropped = d.mag.split_off(keep);
    let first = dropped[0];
    let sticky = extra_sticky || dropped[1..].iter().any(|x| *x > 0);
    d.exp += dropped.len() as i64;
    if first > 0 || sticky {
        *status |= DEC_INEXACT;
    }
    let last_kept = *d.mag.last().unwrap_or(&0);
    if should_increment(rounding, d.sign, first, sticky, last_kept) {
        d = increment_mag(d, keep);
    }
    d.mag = trim(std::mem::take(&mut d.mag));
    d
}

fn increment_mag(mut d: Dec, p: usize) -> Dec {
    d.mag = add_mag(&d.mag, &[1]);
    if d.mag.len() > p {
        // 999…9 rolled over to 1000…0; drop the trailing zero.
        d.mag.pop();
        d.exp += 1;
    }
    d
}

pub(crate) fn round(d: Dec, p: u32, rounding: Rounding, status: &mut u32) -> Dec {
    round_with_sticky(d, p, rounding, status, false)
}

/* arithmetic */

pub(crate) fn add(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan || b.class == Class::Nan {
        return Dec::nan();
    }
    match (a.class, b.class) {
        (Class::Infinite, Class::Infinite) => {
            return if a.sign == b.sign {
                Dec::infinity(a.sign)
            } else {
                *st |= DEC_INVALID_OPERATION;
                Dec::nan()
            };
        }
        (Class::Infinite, _) => return Dec::infinity(a.sign),
        (_, Class::Infinite) => return Dec::infinity(b.sign),
        _ => {}
    }
    if a.is_zero() && b.is_zero() {
        let sign = if a.sign == b.sign {
            a.sign
        } else {
            matches!(r, Rounding::Floor)
        };
        return Dec::zero(sign, a.exp.min(b.exp));
    }
    if a.is_zero() || b.is_zero() {
        // A zero operand still drags the result toward its exponent; the
        // nonzero coefficient is padded, bounded by the precision window.
        let (z, nz) = if a.is_zero() { (a, b) } else { (b, a) };
        let exp = z.exp.min(nz.exp);
        let pad = ((nz.exp - exp) as usize)
            .min((p as usize + 2).saturating_sub(nz.mag.len()));
        let mag = shl_mag(&nz.mag, pad);
        return round(Dec::from_parts(nz.sign, nz.exp - pad as i64, mag), p, r, st);
    }

    // Distant operands never overlap; fold the smaller one into sticky.
    let gap = (a.adjusted() - b.adjusted()).abs();
    if gap > MAX_ALIGN && gap > p as i64 + 2 {
        let (hi, lo) = if a.adjusted() > b.adjusted() { (a, b) } else { (b, a) };
        let mut mag = shl_mag(&hi.mag, 2);
        if hi.sign != lo.sign {
            mag = sub_mag(&mag, &[1]);
        }
        let d = Dec::from_parts(hi.sign, hi.exp - 2, mag);
        return round_with_sticky(d, p, r, st, true);
    }

    let exp = a.exp.min(b.exp);
    let ma = shl_mag(&a.mag, (a.exp - exp) as usize);
    let mb = shl_mag(&b.mag, (b.exp - exp) as usize);
    let d = if a.sign == b.sign {
        Dec::from_parts(a.sign, exp, add_mag(&ma, &mb))
    } else {
        match cmp_mag(&ma, &mb) {
            Ordering::Equal => Dec::zero(matches!(r, Rounding::Floor), exp),
            Ordering::Greater => Dec::from_parts(a.sign, exp, sub_mag(&ma, &mb)),
            Ordering::Less => Dec::from_parts(b.sign, exp, sub_mag(&mb, &ma)),
        }
    };
    round(d, p, r, st)
}

pub(crate) fn subtract(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    let negated = Dec {
        sign: !b.sign,
        ..b.clone()
    };
    add(a, &negated, p, r, st)
}

fn multiply_exact(a: &Dec, b: &Dec, st: &mut u32) -> Dec {
    if a.class == Class::Nan || b.class == Class::Nan {
        return Dec::nan();
    }
    let sign = a.sign != b.sign;
    if a.class == Class::Infinite || b.class == Class::Infinite {
        if a.is_zero() || b.is_zero() {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
        return Dec::infinity(sign);
    }
    Dec::from_parts(sign, a.exp + b.exp, mul_mag(&a.mag, &b.mag))
}

pub(crate) fn multiply(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    let d = multiply_exact(a, b, st);
    round(d, p, r, st)
}

/// Fused multiply-add: `a * b + c` with a single rounding at the end.
pub(crate) fn fma(a: &Dec, b: &Dec, c: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    let product = multiply_exact(a, b, st);
    add(&product, c, p, r, st)
}

pub(crate) fn divide(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan || b.class == Class::Nan {
        return Dec::nan();
    }
    let sign = a.sign != b.sign;
    match (a.class, b.class) {
        (Class::Infinite, Class::Infinite) => {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
        (Class::Infinite, _) => return Dec::infinity(sign),
        (_, Class::Infinite) => return Dec::zero(sign, 0),
        _ => {}
    }
    if b.is_zero() {
        if a.is_zero() {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
        *st |= DEC_DIVISION_BY_ZERO;
        return Dec::infinity(sign);
    }
    if a.is_zero() {
        return Dec::zero(sign, a.exp - b.exp);
    }

    let mut rem: Vec<u8> = vec![0];
    let mut out: Vec<u8> = Vec::new();
    let mut consumed = 0usize;
    let mut extra = 0i64;
    loop {
        let next = if consumed < a.mag.len() {
            let d = a.mag[consumed];
            consumed += 1;
            Some(d)
        } else if is_zero_mag(&rem) {
            None
        } else {
            extra += 1;
            Some(0)
        };
        match next {
            None => break,
            Some(d) => {
                rem.push(d);
                rem = trim(rem);
                let mut q = 0u8;
                while cmp_mag(&rem, &b.mag) != Ordering::Less {
                    rem = sub_mag(&rem, &b.mag);
                    q += 1;
                }
                if q > 0 || !out.is_empty() {
                    out.push(q);
                }
            }
        }
        let done_with_input = consumed >= a.mag.len();
        if done_with_input && out.len() > p as usize {
            break;
        }
        if done_with_input && is_zero_mag(&rem) && !out.is_empty() {
            break;
        }
    }
    if out.is_empty() {
        out.push(0);
    }
    let exp = a.exp - b.exp - extra;
    let d = Dec::from_parts(sign, exp, out);
    round_with_sticky(d, p, r, st, !is_zero_mag(&rem))
}

/// Shared setup for divide-integer and both remainder flavors: computes the
/// aligned integer quotient and remainder of `|a| / |b|`.
fn integer_divide(a: &Dec, b: &Dec) -> (Vec<u8>, Vec<u8>, Vec<u8>, i64) {
    let e = a.exp - b.exp;
    let (ma, mb) = if e >= 0 {
        (shl_mag(&a.mag, e as usize), b.mag.clone())
    } else {
        (a.mag.clone(), shl_mag(&b.mag, (-e) as usize))
    };
    let (q, rem) = divmod_mag(&ma, &mb);
    (q, rem, mb, a.exp.min(b.exp))
}

pub(crate) fn divide_integer(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan || b.class == Class::Nan {
        return Dec::nan();
    }
    let sign = a.sign != b.sign;
    if a.class == Class::Infinite {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    if b.class == Class::Infinite {
        return Dec::zero(sign, 0);
    }
    if b.is_zero() {
        if a.is_zero() {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
        *st |= DEC_DIVISION_BY_ZERO;
        return Dec::infinity(sign);
    }
    let (q, _, _, _) = integer_divide(a, b);
    if q.len() > p as usize {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    Dec::from_parts(sign, 0, q)
}

pub(crate) fn remainder(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    if let Some(special) = remainder_special(a, b, st) {
        return special;
    }
    let (q, rem, _, exp) = integer_divide(a, b);
    if q.len() > p as usize {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    Dec::from_parts(a.sign, exp, rem)
}

pub(crate) fn remainder_near(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    if let Some(special) = remainder_special(a, b, st) {
        return special;
    }
    let (q, rem, mb, exp) = integer_divide(a, b);
    if q.len() > p as usize {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    // Choose the remainder nearest zero; ties go to the even quotient.
    let twice = add_mag(&rem, &rem);
    let take_upper = match cmp_mag(&twice, &mb) {
        Ordering::Greater => true,
        Ordering::Equal => q.last().map(|d| d % 2 == 1).unwrap_or(false),
        Ordering::Less => false,
    };
    if take_upper {
        Dec::from_parts(!a.sign, exp, sub_mag(&mb, &rem))
    } else {
        Dec::from_parts(a.sign, exp, rem)
    }
}

fn remainder_special(a: &Dec, b: &Dec, st: &mut u32) -> Option<Dec> {
    if a.class == Class::Nan || b.class == Class::Nan {
        return Some(Dec::nan());
    }
    if a.class == Class::Infinite {
        *st |= DEC_INVALID_OPERATION;
        return Some(Dec::nan());
    }
    if b.class == Class::Infinite {
        return Some(a.clone());
    }
    if b.is_zero() {
        *st |= DEC_INVALID_OPERATION;
        return Some(Dec::nan());
    }
    None
}

pub(crate) fn quantize(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan || b.class == Class::Nan {
        return Dec::nan();
    }
    match (a.class, b.class) {
        (Class::Infinite, Class::Infinite) => return Dec::infinity(a.sign),
        (Class::Infinite, _) | (_, Class::Infinite) => {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
        _ => {}
    }
    let target = b.exp;
    let diff = a.exp - target;
    if diff == 0 {
        return a.clone();
    }
    if diff > 0 {
        if a.is_zero() {
            return Dec::zero(a.sign, target);
        }
        let mag = shl_mag(&a.mag, diff as usize);
        if mag.len() > p as usize {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
        return Dec {
            sign: a.sign,
            exp: target,
            mag,
            class: Class::Finite,
        };
    }
    // Shrinking: round away the low-order digits.
    let drop = (-diff) as usize;
    let mut local = 0u32;
    let shortened = if a.mag.len() > drop {
        round_with_sticky(a.clone(), (a.mag.len() - drop) as u32, r, &mut local, false)
    } else {
        // Every digit is below the target quantum.
        let first = if a.mag.len() == drop { a.mag[0] } else { 0 };
        let sticky = if a.mag.len() == drop {
            a.mag[1..].iter().any(|d| *d > 0)
        } else {
            !a.is_zero()
        };
        if first > 0 || sticky {
            local |= DEC_INEXACT;
        }
        let up = should_increment(r, a.sign, first, sticky, 0);
        Dec {
            sign: a.sign,
            exp: target,
            mag: vec![u8::from(up)],
            class: Class::Finite,
        }
    };
    *st |= local;
    let mut result = shortened;
    // A rounding carry (9.99 -> 10) must not move the quantum; rescale the
    // coefficient back down to the requested exponent.
    if result.exp > target {
        result.mag = shl_mag(&result.mag, (result.exp - target) as usize);
    }
    result.exp = target;
    if result.mag.len() > p as usize {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    result
}

pub(crate) fn scaleb(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan || b.class == Class::Nan {
        return Dec::nan();
    }
    let shift = match integral_value(b) {
        Some(v) if v.unsigned_abs() <= 2 * (6144 + p as u64) => v,
        _ => {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
    };
    if a.class == Class::Infinite {
        return Dec::infinity(a.sign);
    }
    let d = Dec {
        exp: a.exp + shift,
        ..a.clone()
    };
    round(d, p, r, st)
}

/// Small integral value of a finite operand, if it has one.
fn integral_value(d: &Dec) -> Option<i64> {
    if d.class != Class::Finite || d.exp < 0 || d.mag.len() > 18 {
        return None;
    }
    let mut v: i64 = 0;
    for digit in &d.mag {
        v = v.checked_mul(10)?.checked_add(*digit as i64)?;
    }
    let scale = 10i64.checked_pow(u32::try_from(d.exp).ok()?)?;
    v = v.checked_mul(scale)?;
    Some(if d.sign { -v } else { v })
}

pub(crate) fn shift(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    let n = match shift_count(b, p) {
        Some(n) => n,
        None => {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
    };
    if a.class != Class::Finite {
        if a.class == Class::Nan {
            return Dec::nan();
        }
        return Dec::infinity(a.sign);
    }
    let p = p as usize;
    let mag = if n >= 0 {
        let mut m = shl_mag(&a.mag, n as usize);
        if m.len() > p {
            let cut = m.len() - p;
            m.drain(..cut);
        }
        trim(m)
    } else {
        let drop = (-n) as usize;
        if drop >= a.mag.len() {
            vec![0]
        } else {
            let mut m = a.mag.clone();
            m.truncate(a.mag.len() - drop);
            trim(m)
        }
    };
    Dec {
        sign: a.sign,
        exp: a.exp,
        mag,
        class: Class::Finite,
    }
}

pub(crate) fn rotate(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    let n = match shift_count(b, p) {
        Some(n) => n,
        None => {
            *st |= DEC_INVALID_OPERATION;
            return Dec::nan();
        }
    };
    if a.class != Class::Finite {
        if a.class == Class::Nan {
            return Dec::nan();
        }
        return Dec::infinity(a.sign);
    }
    let p = p as usize;
    if a.mag.len() > p {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    // Rotation happens in a fixed p-digit window.
    let mut window = vec![0u8; p - a.mag.len()];
    window.extend_from_slice(&a.mag);
    let by = n.rem_euclid(p as i64) as usize;
    window.rotate_left(by);
    Dec {
        sign: a.sign,
        exp: a.exp,
        mag: trim(window),
        class: Class::Finite,
    }
}

fn shift_count(b: &Dec, p: u32) -> Option<i64> {
    let n = integral_value(b)?;
    (n.unsigned_abs() <= p as u64).then_some(n)
}

fn logical_op(a: &Dec, b: &Dec, p: u32, st: &mut u32, f: impl Fn(u8, u8) -> u8) -> Dec {
    if !a.is_logical() || !b.is_logical() || a.mag.len() > p as usize || b.mag.len() > p as usize {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    let p = p as usize;
    let pad = |m: &[u8]| {
        let mut w = vec![0u8; p - m.len()];
        w.extend_from_slice(m);
        w
    };
    let (wa, wb) = (pad(&a.mag), pad(&b.mag));
    let mag: Vec<u8> = wa.iter().zip(wb.iter()).map(|(x, y)| f(*x, *y)).collect();
    Dec {
        sign: false,
        exp: 0,
        mag: trim(mag),
        class: Class::Finite,
    }
}

pub(crate) fn and(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    logical_op(a, b, p, st, |x, y| x & y)
}

pub(crate) fn or(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    logical_op(a, b, p, st, |x, y| x | y)
}

pub(crate) fn xor(a: &Dec, b: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    logical_op(a, b, p, st, |x, y| x ^ y)
}

pub(crate) fn invert(a: &Dec, p: u32, _r: Rounding, st: &mut u32) -> Dec {
    if !a.is_logical() || a.mag.len() > p as usize {
        *st |= DEC_INVALID_OPERATION;
        return Dec::nan();
    }
    let p = p as usize;
    let mut window = vec![0u8; p - a.mag.len()];
    window.extend_from_slice(&a.mag);
    for d in &mut window {
        *d = 1 - *d;
    }
    Dec {
        sign: false,
        exp: 0,
        mag: trim(window),
        class: Class::Finite,
    }
}

/* comparison family */

/// Numeric ordering of two finite-or-infinite values; `None` when either
/// operand is NaN.
pub(crate) fn cmp_numeric(a: &Dec, b: &Dec) -> Option<Ordering> {
    if a.class == Class::Nan || b.class == Class::Nan {
        return None;
    }
    let a_zero = a.class == Class::Finite && a.is_zero();
    let b_zero = b.class == Class::Finite && b.is_zero();
    if a_zero && b_zero {
        return Some(Ordering::Equal);
    }
    if a_zero {
        return Some(if b.sign { Ordering::Greater } else { Ordering::Less });
    }
    if b_zero {
        return Some(if a.sign { Ordering::Less } else { Ordering::Greater });
    }
    if a.sign != b.sign {
        return Some(if a.sign { Ordering::Less } else { Ordering::Greater });
    }
    let mag_order = cmp_abs(a, b);
    Some(if a.sign { mag_order.reverse() } else { mag_order })
}

/// Magnitude ordering of two nonzero finite-or-infinite values.
fn cmp_abs(a: &Dec, b: &Dec) -> Ordering {
    match (a.class, b.class) {
        (Class::Infinite, Class::Infinite) => return Ordering::Equal,
        (Class::Infinite, _) => return Ordering::Greater,
        (_, Class::Infinite) => return Ordering::Less,
        _ => {}
    }
    match a.adjusted().cmp(&b.adjusted()) {
        Ordering::Equal => {}
        other => return other,
    }
    // Same adjusted exponent: compare digit streams, padding the shorter.
    let len = a.mag.len().max(b.mag.len());
    for i in 0..len {
        let da = a.mag.get(i).copied().unwrap_or(0);
        let db = b.mag.get(i).copied().unwrap_or(0);
        match da.cmp(&db) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

pub(crate) fn compare(a: &Dec, b: &Dec, _p: u32, _r: Rounding, _st: &mut u32) -> Dec {
    match cmp_numeric(a, b) {
        None => Dec::nan(),
        Some(Ordering::Less) => Dec::from_parts(true, 0, vec![1]),
        Some(Ordering::Equal) => Dec::zero(false, 0),
        Some(Ordering::Greater) => Dec::from_parts(false, 0, vec![1]),
    }
}

fn pick(a: &Dec, b: &Dec, take_a: bool, p: u32, r: Rounding, st: &mut u32) -> Dec {
    let chosen = if take_a { a } else { b };
    round(chosen.clone(), p, r, st)
}

fn minmax(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32, want_max: bool, by_mag: bool) -> Dec {
    // 754 maxnum/minnum: a quiet NaN loses to a number.
    match (a.class == Class::Nan, b.class == Class::Nan) {
        (true, true) => return Dec::nan(),
        (true, false) => return round(b.clone(), p, r, st),
        (false, true) => return round(a.clone(), p, r, st),
        (false, false) => {}
    }
    let order = if by_mag {
        let aa = Dec { sign: false, ..a.clone() };
        let bb = Dec { sign: false, ..b.clone() };
        cmp_numeric(&aa, &bb).unwrap_or(Ordering::Equal)
    } else {
        cmp_numeric(a, b).unwrap_or(Ordering::Equal)
    };
    let take_a = match order {
        Ordering::Greater => want_max,
        Ordering::Less => !want_max,
        Ordering::Equal => true,
    };
    pick(a, b, take_a, p, r, st)
}

pub(crate) fn max(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    minmax(a, b, p, r, st, true, false)
}

pub(crate) fn min(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    minmax(a, b, p, r, st, false, false)
}

pub(crate) fn max_mag(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    minmax(a, b, p, r, st, true, true)
}

pub(crate) fn min_mag(a: &Dec, b: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    minmax(a, b, p, r, st, false, true)
}

/* unary family */

pub(crate) fn abs(a: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan {
        return Dec::nan();
    }
    let d = Dec {
        sign: false,
        ..a.clone()
    };
    round(d, p, r, st)
}

pub(crate) fn minus(a: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan {
        return Dec::nan();
    }
    let sign = if a.is_zero() {
        matches!(r, Rounding::Floor)
    } else {
        !a.sign
    };
    let d = Dec { sign, ..a.clone() };
    round(d, p, r, st)
}

pub(crate) fn plus(a: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan {
        return Dec::nan();
    }
    let sign = if a.is_zero() {
        a.sign && matches!(r, Rounding::Floor)
    } else {
        a.sign
    };
    let d = Dec { sign, ..a.clone() };
    round(d, p, r, st)
}

pub(crate) fn logb(a: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    match a.class {
        Class::Nan => Dec::nan(),
        Class::Infinite => Dec::infinity(false),
        Class::Finite if a.is_zero() => {
            *st |= DEC_DIVISION_BY_ZERO;
            Dec::infinity(true)
        }
        Class::Finite => {
            let adjusted = a.adjusted();
            let sign = adjusted < 0;
            let mag: Vec<u8> = adjusted
                .unsigned_abs()
                .to_string()
                .bytes()
                .map(|b| b - b'0')
                .collect();
            round(Dec::from_parts(sign, 0, mag), p, r, st)
        }
    }
}

pub(crate) fn reduce(a: &Dec, p: u32, r: Rounding, st: &mut u32) -> Dec {
    if a.class == Class::Nan {
        return Dec::nan();
    }
    if a.class == Class::Infinite {
        return Dec::infinity(a.sign);
    }
    let mut d = round(a.clone(), p, r, st);
    if d.is_zero() {
        d.exp = 0;
        return d;
    }
    while d.mag.len() > 1 && d.mag.last() == Some(&0) {
        d.mag.pop();
        d.exp += 1;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        let (sign, rest) = match s.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, s),
        };
        let (mantissa, exp) = match rest.split_once('E') {
            Some((m, e)) => (m, e.parse::<i64>().unwrap()),
            None => (rest, 0),
        };
        let (int, frac) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        let mag: Vec<u8> = int.bytes().chain(frac.bytes()).map(|b| b - b'0').collect();
        Dec::from_parts(sign, exp - frac.len() as i64, mag)
    }

    #[test]
    fn add_aligns_exponents() {
        let mut st = 0;
        let r = add(&dec("1.5"), &dec("2.25"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("3.75"));
        assert_eq!(st, 0);
    }

    #[test]
    fn add_rounds_and_reports_inexact() {
        // The coefficient keeps ten digits; only the exponent moves.
        let mut st = 0;
        let r = add(&dec("9999999999"), &dec("1"), 10, Rounding::HalfEven, &mut st);
        assert_eq!(st & DEC_INEXACT, 0, "carry into an exact power of ten");
        assert_eq!(r, dec("1.000000000E10"));

        let mut st = 0;
        let r = add(&dec("9999999999"), &dec("2"), 10, Rounding::HalfEven, &mut st);
        assert_ne!(st & DEC_INEXACT, 0);
        assert_eq!(r, dec("1.000000000E10"));
    }

    #[test]
    fn multiply_sums_exponents() {
        let mut st = 0;
        let r = multiply(&dec("1.2"), &dec("0.04"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("0.048"));
    }

    #[test]
    fn divide_terminating_is_exact() {
        let mut st = 0;
        let r = divide(&dec("1"), &dec("8"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("0.125"));
        assert_eq!(st, 0);
    }

    #[test]
    fn divide_repeating_rounds() {
        let mut st = 0;
        let r = divide(&dec("1"), &dec("3"), 5, Rounding::HalfEven, &mut st);
        assert_ne!(st & DEC_INEXACT, 0);
        assert_eq!(r, dec("0.33333"));
    }

    #[test]
    fn divide_preserves_ideal_exponent() {
        let mut st = 0;
        let r = divide(&dec("100"), &dec("10"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("10"));
        assert_eq!(r.exp, 0);
    }

    #[test]
    fn integer_division_and_remainder() {
        let mut st = 0;
        let q = divide_integer(&dec("17"), &dec("5"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(q, dec("3"));
        let rem = remainder(&dec("17"), &dec("5"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(rem, dec("2"));
        let near = remainder_near(&dec("17"), &dec("5"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(near, dec("2"));
        let near = remainder_near(&dec("18"), &dec("5"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(near, dec("-2"));
    }

    #[test]
    fn quantize_changes_exponent_only() {
        let mut st = 0;
        let r = quantize(&dec("2.17"), &dec("0.001"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("2.170"));
        assert_eq!(st, 0);

        let r = quantize(&dec("2.17"), &dec("1E-1"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("2.2"));
        assert_ne!(st & DEC_INEXACT, 0);
    }

    #[test]
    fn fma_rounds_once() {
        // 3 * 3 + 0.123 at precision 2: exact 9.123, rounded 9.1. A
        // pre-rounded multiply would have lost the addend entirely.
        let mut st = 0;
        let r = fma(&dec("3"), &dec("3"), &dec("0.123"), 2, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("9.1"));
    }

    #[test]
    fn logical_ops_require_binary_digits() {
        let mut st = 0;
        let r = and(&dec("1101"), &dec("1011"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r, dec("1001"));
        assert_eq!(st, 0);

        let r = and(&dec("2"), &dec("1"), 34, Rounding::HalfEven, &mut st);
        assert_eq!(r.class, Class::Nan);
        assert_ne!(st & DEC_INVALID_OPERATION, 0);
    }

    #[test]
    fn compare_orders_numerically() {
        assert_eq!(cmp_numeric(&dec("1.0"), &dec("1")), Some(Ordering::Equal));
        assert_eq!(cmp_numeric(&dec("-2"), &dec("1")), Some(Ordering::Less));
        assert_eq!(cmp_numeric(&dec("1E2"), &dec("99")), Some(Ordering::Greater));
        assert_eq!(cmp_numeric(&Dec::nan(), &dec("1")), None);
    }
}
