//! Scalar carriers shared by the reader, extractor, and event model.

use std::fmt;

/// Owned text or byte content: field names, symbols, strings, and lob
/// payloads. Equality is byte-identical, which is exactly the Ion
/// data-model rule for all of those.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IonString(Vec<u8>);

impl IonString {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw content.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` for empty content.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// View as UTF-8 text, if it is.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl From<&str> for IonString {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<String> for IonString {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl PartialEq<str> for IonString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for IonString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(text),
            None => write!(f, "{:?}", self.0),
        }
    }
}

/// Arbitrary-precision signed integer: sign plus big-endian magnitude
/// bytes, canonical (no leading zero bytes, and zero is never negative).
/// Equality is byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IonInt {
    negative: bool,
    magnitude: Vec<u8>,
}

impl IonInt {
    /// Represent an `i64`.
    pub fn from_i64(value: i64) -> Self {
        let negative = value < 0;
        let mut v = value.unsigned_abs();
        let mut magnitude = Vec::new();
        while v > 0 {
            magnitude.push((v & 0xFF) as u8);
            v >>= 8;
        }
        magnitude.reverse();
        Self {
            negative: negative && !magnitude.is_empty(),
            magnitude,
        }
    }

    /// Build from most-significant-first decimal digits scaled by
    /// `10^extra_zeros`.
    pub fn from_decimal_digits(negative: bool, digits: &[u8], extra_zeros: usize) -> Self {
        let mut magnitude: Vec<u8> = Vec::new();
        let mut push_digit = |d: u8, magnitude: &mut Vec<u8>| {
            let mut carry = d as u32;
            for byte in magnitude.iter_mut().rev() {
                let v = *byte as u32 * 10 + carry;
                *byte = (v & 0xFF) as u8;
                carry = v >> 8;
            }
            while carry > 0 {
                magnitude.insert(0, (carry & 0xFF) as u8);
                carry >>= 8;
            }
        };
        for d in digits {
            push_digit(*d, &mut magnitude);
        }
        for _ in 0..extra_zeros {
            push_digit(0, &mut magnitude);
        }
        let lead = magnitude.iter().take_while(|b| **b == 0).count();
        magnitude.drain(..lead);
        Self {
            negative: negative && !magnitude.is_empty(),
            magnitude,
        }
    }

    /// Parse a decimal integer literal, e.g. `-123`.
    pub fn from_decimal_text(text: &str) -> Option<Self> {
        let (negative, rest) = match text.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits: Vec<u8> = rest.bytes().map(|b| b - b'0').collect();
        Some(Self::from_decimal_digits(negative, &digits, 0))
    }

    /// The value as an `i64`, when it fits.
    pub fn as_i64(&self) -> Option<i64> {
        if self.magnitude.len() > 8 {
            return None;
        }
        let mut v: u64 = 0;
        for byte in &self.magnitude {
            v = (v << 8) | *byte as u64;
        }
        if self.negative {
            (v <= 1u64 << 63).then(|| (v as i64).wrapping_neg())
        } else {
            i64::try_from(v).ok()
        }
    }

    /// Sign of the value.
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Big-endian magnitude bytes; empty for zero.
    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }
}

impl From<i64> for IonInt {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl fmt::Display for IonInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.magnitude.is_empty() {
            return f.write_str("0");
        }
        // Repeated division by ten over the byte magnitude.
        let mut work = self.magnitude.clone();
        let mut digits = Vec::new();
        while !work.is_empty() {
            let mut rem: u32 = 0;
            let mut next = Vec::with_capacity(work.len());
            for byte in &work {
                let v = (rem << 8) | *byte as u32;
                next.push((v / 10) as u8);
                rem = v % 10;
            }
            digits.push(char::from(b'0' + rem as u8));
            let lead = next.iter().take_while(|b| **b == 0).count();
            next.drain(..lead);
            work = next;
        }
        if self.negative {
            f.write_str("-")?;
        }
        digits.reverse();
        f.write_str(&digits.into_iter().collect::<String>())
    }
}

/// Granularity carried by a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TsPrecision {
    /// `2007T`
    Year,
    /// `2007-08T`
    Month,
    /// `2007-08-28`
    Day,
    /// `2007-08-28T10:30+00:00`
    Minute,
    /// `2007-08-28T10:30:05+00:00`
    Second,
    /// `2007-08-28T10:30:05.123+00:00`
    Fraction,
}

/// A point in time with explicit precision and an optional local offset.
///
/// `offset_minutes` of `None` encodes the unknown offset (`-00:00`).
/// Fractional seconds are a coefficient and digit count, so `.5` and
/// `.50` are distinct field-wise but equal as instants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp {
    /// Proleptic Gregorian year.
    pub year: i32,
    /// 1-based month.
    pub month: u8,
    /// 1-based day.
    pub day: u8,
    /// Hour of day.
    pub hour: u8,
    /// Minute of hour.
    pub minute: u8,
    /// Second of minute.
    pub second: u8,
    /// Fractional-second coefficient.
    pub fraction: u64,
    /// Number of fractional digits; zero when precision is coarser than
    /// [`TsPrecision::Fraction`].
    pub fraction_digits: u8,
    /// Known local offset in minutes, or `None` for unknown.
    pub offset_minutes: Option<i16>,
    /// Precision of this value.
    pub precision: TsPrecision,
}

impl Timestamp {
    /// A year-precision timestamp; finer fields start at their minimums.
    pub fn from_year(year: i32) -> Self {
        Self {
            year,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            fraction: 0,
            fraction_digits: 0,
            offset_minutes: None,
            precision: TsPrecision::Year,
        }
    }

    /// Days since 1970-01-01 in the proleptic Gregorian calendar.
    fn civil_days(&self) -> i64 {
        let y = self.year as i64 - i64::from(self.month < 3);
        let era = if y >= 0 { y } else { y - 399 } / 400;
        let yoe = y - era * 400;
        let m = self.month as i64;
        let doy = (153 * (m + if m > 2 { -3 } else { 9 }) + 2) / 5 + self.day as i64 - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }

    /// Seconds since the epoch of the UTC instant this timestamp names.
    pub fn epoch_seconds(&self) -> i64 {
        let local = self.civil_days() * 86_400
            + self.hour as i64 * 3_600
            + self.minute as i64 * 60
            + self.second as i64;
        local - self.offset_minutes.unwrap_or(0) as i64 * 60
    }

    /// Fraction normalized to trailing-zero-free form, for instant
    /// comparison.
    fn normalized_fraction(&self) -> (u64, u8) {
        let mut f = self.fraction;
        let mut n = self.fraction_digits;
        while n > 0 && f % 10 == 0 {
            f /= 10;
            n -= 1;
        }
        (f, n)
    }

    /// Same UTC moment, ignoring precision and displayed offset.
    pub fn same_instant(&self, other: &Self) -> bool {
        self.epoch_seconds() == other.epoch_seconds()
            && self.normalized_fraction() == other.normalized_fraction()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            TsPrecision::Year => return write!(f, "{:04}T", self.year),
            TsPrecision::Month => return write!(f, "{:04}-{:02}T", self.year, self.month),
            TsPrecision::Day => {
                return write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
            }
            _ => {}
        }
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )?;
        if self.precision >= TsPrecision::Second {
            write!(f, ":{:02}", self.second)?;
        }
        if self.precision == TsPrecision::Fraction {
            write!(
                f,
                ".{:0width$}",
                self.fraction,
                width = self.fraction_digits as usize
            )?;
        }
        match self.offset_minutes {
            None => f.write_str("-00:00"),
            Some(0) => f.write_str("Z"),
            Some(offset) => {
                let sign = if offset < 0 { '-' } else { '+' };
                let magnitude = offset.unsigned_abs();
                write!(f, "{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
            }
        }
    }
}
