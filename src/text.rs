//! Text-Ion parsing and rendering for the in-memory value model.
//!
//! This covers the subset of the text form the core needs to drive its
//! engines: all thirteen types, annotations, comments, and the container
//! syntax. It is a collaborator for the cursors proper, not a replacement.

use itertools::Itertools;

use crate::context::DecContext;
use crate::decimal::IonDecimal;
use crate::element::{Element, Value};
use crate::error::{IonError, IonResult};
use crate::types::IonType;
use crate::value::{IonInt, IonString, Timestamp, TsPrecision};

/// Parse a whole document into top-level elements.
pub fn parse_document(input: &str, ctx: &mut DecContext) -> IonResult<Vec<Element>> {
    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
    };
    let mut elements = Vec::new();
    loop {
        parser.skip_trivia();
        if parser.at_end() {
            break;
        }
        elements.push(parser.parse_element(ctx)?);
    }
    Ok(elements)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

const SYNTAX: IonError = IonError::InvalidArg("malformed Ion text");

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_identifier_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_operator_char(b: u8) -> bool {
    matches!(b, b'*' | b'+' | b'=' | b'<' | b'>' | b'!' | b'?' | b'%' | b'&' | b'^' | b'~' | b'/')
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> IonResult<()> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(SYNTAX)
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'/') if self.input.get(self.pos + 1) == Some(&b'/') => {
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if self.input.get(self.pos + 1) == Some(&b'*') => {
                    self.pos += 2;
                    while self.pos + 1 < self.input.len() {
                        if self.input[self.pos] == b'*' && self.input[self.pos + 1] == b'/' {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn parse_element(&mut self, ctx: &mut DecContext) -> IonResult<Element> {
        self.parse_value(ctx, false)
    }

    /// One annotated value. `in_sexp` admits bare operator symbols.
    fn parse_value(&mut self, ctx: &mut DecContext, in_sexp: bool) -> IonResult<Element> {
        self.skip_trivia();
        let mut annotations: Vec<IonString> = Vec::new();
        loop {
            let checkpoint = self.pos;
            if let Some(symbol) = self.try_symbol_text()? {
                self.skip_trivia();
                if self.pos + 1 < self.input.len()
                    && self.input[self.pos] == b':'
                    && self.input[self.pos + 1] == b':'
                {
                    self.pos += 2;
                    annotations.push(symbol);
                    self.skip_trivia();
                    continue;
                }
                // A symbol value, not an annotation.
                self.pos = checkpoint;
            }
            break;
        }
        let value = self.parse_bare_value(ctx, in_sexp)?;
        Ok(Element::annotated(annotations, value))
    }

    /// Quoted or identifier symbol text, if one is next.
    fn try_symbol_text(&mut self) -> IonResult<Option<IonString>> {
        match self.peek() {
            Some(b'\'') => Ok(Some(self.parse_quoted(b'\'')?)),
            Some(b) if is_identifier_start(b) => {
                let start = self.pos;
                while self.peek().map(is_identifier_part).unwrap_or(false) {
                    self.pos += 1;
                }
                Ok(Some(IonString::from_bytes(self.input[start..self.pos].to_vec())))
            }
            _ => Ok(None),
        }
    }

    fn parse_bare_value(&mut self, ctx: &mut DecContext, in_sexp: bool) -> IonResult<Value> {
        self.skip_trivia();
        match self.peek().ok_or(SYNTAX)? {
            b'[' => self.parse_sequence(ctx, b']').map(Value::List),
            b'(' => self.parse_sexp(ctx).map(Value::Sexp),
            b'{' if self.input.get(self.pos + 1) == Some(&b'{') => self.parse_lob(),
            b'{' => self.parse_struct(ctx).map(Value::Struct),
            b'"' => Ok(Value::String(self.parse_quoted(b'"')?)),
            b'\'' => Ok(Value::Symbol(self.parse_quoted(b'\'')?)),
            b if b.is_ascii_digit() || b == b'-' || b == b'+' => self.parse_number(ctx),
            b if is_operator_char(b) && in_sexp => {
                let start = self.pos;
                while self.peek().map(is_operator_char).unwrap_or(false) {
                    self.pos += 1;
                }
                Ok(Value::Symbol(IonString::from_bytes(
                    self.input[start..self.pos].to_vec(),
                )))
            }
            _ => self.parse_keyword_or_symbol(),
        }
    }

    fn parse_sequence(&mut self, ctx: &mut DecContext, close: u8) -> IonResult<Vec<Element>> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(items);
            }
            if !items.is_empty() {
                self.expect(b',')?;
                self.skip_trivia();
                if self.eat(close) {
                    return Ok(items);
                }
            }
            items.push(self.parse_value(ctx, false)?);
        }
    }

    fn parse_sexp(&mut self, ctx: &mut DecContext) -> IonResult<Vec<Element>> {
        self.expect(b'(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(b')') {
                return Ok(items);
            }
            items.push(self.parse_value(ctx, true)?);
        }
    }

    fn parse_struct(&mut self, ctx: &mut DecContext) -> IonResult<Vec<(IonString, Element)>> {
        self.expect(b'{')?;
        let mut fields = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(b'}') {
                return Ok(fields);
            }
            if !fields.is_empty() {
                self.expect(b',')?;
                self.skip_trivia();
                if self.eat(b'}') {
                    return Ok(fields);
                }
            }
            let name = match self.peek().ok_or(SYNTAX)? {
                b'"' => self.parse_quoted(b'"')?,
                _ => self.try_symbol_text()?.ok_or(SYNTAX)?,
            };
            self.skip_trivia();
            self.expect(b':')?;
            fields.push((name, self.parse_value(ctx, false)?));
        }
    }

    fn parse_quoted(&mut self, quote: u8) -> IonResult<IonString> {
        self.expect(quote)?;
        let mut out: Vec<u8> = Vec::new();
        loop {
            match self.bump().ok_or(SYNTAX)? {
                b if b == quote => return Ok(IonString::from_bytes(out)),
                b'\\' => {
                    let escaped = self.bump().ok_or(SYNTAX)?;
                    match escaped {
                        b'n' => out.push(b'\n'),
                        b't' => out.push(b'\t'),
                        b'r' => out.push(b'\r'),
                        b'0' => out.push(0),
                        b'\\' | b'"' | b'\'' | b'/' => out.push(escaped),
                        b'x' => {
                            let hi = self.hex_digit()?;
                            let lo = self.hex_digit()?;
                            out.push(hi * 16 + lo);
                        }
                        b'u' => {
                            let mut code: u32 = 0;
                            for _ in 0..4 {
                                code = code * 16 + self.hex_digit()? as u32;
                            }
                            let c = char::from_u32(code).ok_or(SYNTAX)?;
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                        }
                        _ => return Err(SYNTAX),
                    }
                }
                b => out.push(b),
            }
        }
    }

    fn hex_digit(&mut self) -> IonResult<u8> {
        match self.bump().ok_or(SYNTAX)? {
            b @ b'0'..=b'9' => Ok(b - b'0'),
            b @ b'a'..=b'f' => Ok(b - b'a' + 10),
            b @ b'A'..=b'F' => Ok(b - b'A' + 10),
            _ => Err(SYNTAX),
        }
    }

    fn parse_lob(&mut self) -> IonResult<Value> {
        self.expect(b'{')?;
        self.expect(b'{')?;
        self.skip_trivia();
        let value = if self.peek() == Some(b'"') {
            Value::Clob(self.parse_quoted(b'"')?)
        } else {
            let start = self.pos;
            while self.peek().map(|b| b != b'}').unwrap_or(false) {
                self.pos += 1;
            }
            let encoded: Vec<u8> = self.input[start..self.pos]
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            Value::Blob(IonString::from_bytes(base64_decode(&encoded)?))
        };
        self.skip_trivia();
        self.expect(b'}')?;
        self.expect(b'}')?;
        Ok(value)
    }

    fn parse_keyword_or_symbol(&mut self) -> IonResult<Value> {
        let symbol = self.try_symbol_text()?.ok_or(SYNTAX)?;
        match symbol.as_bytes() {
            b"null" => {
                if self.eat(b'.') {
                    let typed = self.try_symbol_text()?.ok_or(SYNTAX)?;
                    let ion_type = match typed.as_bytes() {
                        b"null" => IonType::Null,
                        b"bool" => IonType::Bool,
                        b"int" => IonType::Int,
                        b"float" => IonType::Float,
                        b"decimal" => IonType::Decimal,
                        b"timestamp" => IonType::Timestamp,
                        b"symbol" => IonType::Symbol,
                        b"string" => IonType::String,
                        b"clob" => IonType::Clob,
                        b"blob" => IonType::Blob,
                        b"list" => IonType::List,
                        b"sexp" => IonType::Sexp,
                        b"struct" => IonType::Struct,
                        _ => return Err(SYNTAX),
                    };
                    Ok(Value::Null(ion_type))
                } else {
                    Ok(Value::Null(IonType::Null))
                }
            }
            b"true" => Ok(Value::Bool(true)),
            b"false" => Ok(Value::Bool(false)),
            b"nan" => Ok(Value::Float(f64::NAN)),
            _ => Ok(Value::Symbol(symbol)),
        }
    }

    fn parse_number(&mut self, ctx: &mut DecContext) -> IonResult<Value> {
        let start = self.pos;
        // Leading sign, then the maximal numeric token.
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        if self.input[self.pos..].starts_with(b"inf") {
            let negative = self.input[start] == b'-';
            self.pos += 3;
            return Ok(Value::Float(if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }));
        }
        while let Some(b) = self.peek() {
            let part_of_number = b.is_ascii_alphanumeric()
                || b == b'.'
                || ((b == b'-' || b == b'+')
                    && matches!(self.input.get(self.pos - 1), Some(b'e' | b'E')));
            let timestamp_dash = b == b'-' && self.pos - start >= 4;
            let in_time_part = self.input[start..self.pos].contains(&b'T');
            let timestamp_colon = b == b':' && in_time_part;
            let timestamp_offset = b == b'+' && in_time_part;
            if part_of_number || timestamp_dash || timestamp_colon || timestamp_offset {
                self.pos += 1;
            } else {
                break;
            }
        }
        let token = std::str::from_utf8(&self.input[start..self.pos]).map_err(|_| SYNTAX)?;

        if token.len() >= 5
            && token.as_bytes()[..4].iter().all(u8::is_ascii_digit)
            && matches!(token.as_bytes()[4], b'-' | b'T')
        {
            return parse_timestamp(token).map(Value::Timestamp);
        }
        if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("-0x")) {
            let negative = token.starts_with('-');
            let value = i64::from_str_radix(hex, 16).map_err(|_| SYNTAX)?;
            return Ok(Value::Int(IonInt::from_i64(if negative { -value } else { value })));
        }
        if token.contains(['e', 'E']) {
            return token.parse::<f64>().map(Value::Float).map_err(|_| SYNTAX);
        }
        if token.contains(['.', 'd', 'D']) {
            return IonDecimal::from_string(token, ctx).map(Value::Decimal);
        }
        IonInt::from_decimal_text(token)
            .map(Value::Int)
            .ok_or(SYNTAX)
    }
}

fn parse_timestamp(token: &str) -> IonResult<Timestamp> {
    let bytes = token.as_bytes();
    let digits = |range: std::ops::Range<usize>| -> IonResult<u32> {
        let slice = bytes.get(range).ok_or(SYNTAX)?;
        if !slice.iter().all(u8::is_ascii_digit) {
            return Err(SYNTAX);
        }
        Ok(slice.iter().fold(0u32, |acc, b| acc * 10 + (b - b'0') as u32))
    };

    let mut ts = Timestamp::from_year(digits(0..4)? as i32);
    if bytes.get(4) == Some(&b'T') && bytes.len() == 5 {
        return Ok(ts);
    }
    if bytes.get(4) != Some(&b'-') {
        return Err(SYNTAX);
    }
    ts.month = digits(5..7)? as u8;
    ts.precision = TsPrecision::Month;
    if bytes.get(7) == Some(&b'T') && bytes.len() == 8 {
        return Ok(ts);
    }
    if bytes.get(7) != Some(&b'-') {
        return Err(SYNTAX);
    }
    ts.day = digits(8..10)? as u8;
    ts.precision = TsPrecision::Day;
    if bytes.len() == 10 {
        return Ok(ts);
    }
    if bytes.get(10) != Some(&b'T') {
        return Err(SYNTAX);
    }
    if bytes.len() == 11 {
        return Ok(ts);
    }
    ts.hour = digits(11..13)? as u8;
    if bytes.get(13) != Some(&b':') {
        return Err(SYNTAX);
    }
    ts.minute = digits(14..16)? as u8;
    ts.precision = TsPrecision::Minute;
    let mut pos = 16;
    if bytes.get(pos) == Some(&b':') {
        ts.second = digits(17..19)? as u8;
        ts.precision = TsPrecision::Second;
        pos = 19;
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let frac_start = pos;
            while bytes.get(pos).map(u8::is_ascii_digit).unwrap_or(false) {
                pos += 1;
            }
            if pos == frac_start || pos - frac_start > 18 {
                return Err(SYNTAX);
            }
            ts.fraction = token[frac_start..pos].parse::<u64>().map_err(|_| SYNTAX)?;
            ts.fraction_digits = (pos - frac_start) as u8;
            ts.precision = TsPrecision::Fraction;
        }
    }
    match bytes.get(pos) {
        Some(b'Z') if pos + 1 == bytes.len() => {
            ts.offset_minutes = Some(0);
            Ok(ts)
        }
        Some(sign @ (b'+' | b'-')) if pos + 6 == bytes.len() => {
            let hours = digits(pos + 1..pos + 3)?;
            if bytes.get(pos + 3) != Some(&b':') {
                return Err(SYNTAX);
            }
            let minutes = digits(pos + 4..pos + 6)?;
            let total = (hours * 60 + minutes) as i16;
            ts.offset_minutes = if *sign == b'-' && total == 0 {
                None
            } else if *sign == b'-' {
                Some(-total)
            } else {
                Some(total)
            };
            Ok(ts)
        }
        None => {
            ts.offset_minutes = None;
            Ok(ts)
        }
        _ => Err(SYNTAX),
    }
}

/* rendering */

/// Render a document as text Ion, one top-level value per line.
pub fn write_document(elements: &[Element]) -> String {
    elements.iter().map(write_element).join("\n")
}

/// Render one element, annotations included.
pub fn write_element(element: &Element) -> String {
    let mut out = String::new();
    for annotation in &element.annotations {
        out.push_str(&write_symbol(annotation));
        out.push_str("::");
    }
    out.push_str(&write_value(&element.value));
    out
}

fn write_value(value: &Value) -> String {
    match value {
        Value::Null(IonType::Null) => "null".to_string(),
        Value::Null(t) => format!("null.{}", type_name(*t)),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => write_float(*f),
        Value::Decimal(d) => write_decimal(d),
        Value::Timestamp(ts) => ts.to_string(),
        Value::Symbol(s) => write_symbol(s),
        Value::String(s) => write_quoted(s, b'"'),
        Value::Clob(c) => format!("{{{{{}}}}}", write_quoted(c, b'"')),
        Value::Blob(b) => format!("{{{{{}}}}}", base64_encode(b.as_bytes())),
        Value::List(items) => format!("[{}]", items.iter().map(write_element).join(", ")),
        Value::Sexp(items) => format!("({})", items.iter().map(write_element).join(" ")),
        Value::Struct(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(name, value)| format!("{}: {}", write_symbol(name), write_element(value)))
                .join(", ")
        ),
    }
}

fn type_name(t: IonType) -> &'static str {
    match t {
        IonType::Null => "null",
        IonType::Bool => "bool",
        IonType::Int => "int",
        IonType::Float => "float",
        IonType::Decimal => "decimal",
        IonType::Timestamp => "timestamp",
        IonType::Symbol => "symbol",
        IonType::String => "string",
        IonType::Clob => "clob",
        IonType::Blob => "blob",
        IonType::List => "list",
        IonType::Sexp => "sexp",
        IonType::Struct => "struct",
    }
}

fn write_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f == f64::INFINITY {
        "+inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{f:e}")
    }
}

fn write_decimal(d: &IonDecimal) -> String {
    let rendered = d.to_decimal_string();
    if rendered.contains('E') {
        rendered.replace('E', "d")
    } else if rendered.contains('.') || rendered.contains("Infinity") || rendered.contains("NaN") {
        rendered
    } else {
        // Distinguish the decimal 123 from the int 123.
        format!("{rendered}.")
    }
}

fn write_symbol(s: &IonString) -> String {
    let is_identifier = !s.is_empty()
        && is_identifier_start(s.as_bytes()[0])
        && s.as_bytes().iter().all(|b| is_identifier_part(*b));
    if is_identifier {
        s.to_string()
    } else {
        write_quoted(s, b'\'')
    }
}

fn write_quoted(s: &IonString, quote: u8) -> String {
    let mut out = String::new();
    out.push(quote as char);
    for b in s.as_bytes() {
        match *b {
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            b'\\' => out.push_str("\\\\"),
            b if b == quote => {
                out.push('\\');
                out.push(b as char);
            }
            b if b.is_ascii_graphic() || b == b' ' => out.push(b as char),
            b => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push(quote as char);
    out
}

/* base64 */

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(BASE64_ALPHABET[(triple >> 18) as usize & 0x3F] as char);
        out.push(BASE64_ALPHABET[(triple >> 12) as usize & 0x3F] as char);
        out.push(if chunk.len() > 1 {
            BASE64_ALPHABET[(triple >> 6) as usize & 0x3F] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_ALPHABET[triple as usize & 0x3F] as char
        } else {
            '='
        });
    }
    out
}

fn base64_decode(encoded: &[u8]) -> IonResult<Vec<u8>> {
    let value_of = |b: u8| -> IonResult<u32> {
        BASE64_ALPHABET
            .iter()
            .position(|a| *a == b)
            .map(|p| p as u32)
            .ok_or(SYNTAX)
    };
    let stripped: Vec<u8> = encoded
        .iter()
        .copied()
        .take_while(|b| *b != b'=')
        .collect();
    let mut out = Vec::with_capacity(stripped.len() * 3 / 4);
    for chunk in stripped.chunks(4) {
        let mut triple: u32 = 0;
        for (i, b) in chunk.iter().enumerate() {
            triple |= value_of(*b)? << (18 - 6 * i as u32);
        }
        match chunk.len() {
            4 => {
                out.push((triple >> 16) as u8);
                out.push((triple >> 8) as u8);
                out.push(triple as u8);
            }
            3 => {
                out.push((triple >> 16) as u8);
                out.push((triple >> 8) as u8);
            }
            2 => out.push((triple >> 16) as u8),
            _ => return Err(SYNTAX),
        }
    }
    Ok(out)
}
