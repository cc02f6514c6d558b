//! Reader events and structural equivalence under the Ion data model.
//!
//! A reader is materialized into an ordered [`EventStream`] so two streams
//! can be compared structurally: sequences in order, structs as bags, and
//! scalars under per-type rules. This is the machinery behind round-trip
//! and conformance comparisons.

use std::collections::HashSet;

use tracing::trace;

use crate::decimal::IonDecimal;
use crate::error::{IonError, IonResult};
use crate::reader::{ElementReader, IonReader, ReaderOptions};
use crate::types::IonType;
use crate::value::{IonInt, IonString, Timestamp};

/// Annotation marking a comparison set whose string members are parsed as
/// whole documents before comparison.
pub const EMBEDDED_DOCUMENTS_ANNOTATION: &str = "embedded_documents";

/// What a single event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// A container value begins; its children follow.
    ContainerStart,
    /// The matching end of a container.
    ContainerEnd,
    /// A scalar value.
    Scalar,
    /// The end of the whole stream.
    StreamEnd,
}

/// A materialized scalar. Nulls of any type carry no value; the event's
/// `ion_type` preserves the declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Boolean.
    Bool(bool),
    /// Arbitrary-precision integer.
    Int(IonInt),
    /// 64-bit float.
    Float(f64),
    /// Decimal, claimed so it outlives the source reader.
    Decimal(IonDecimal),
    /// Timestamp.
    Timestamp(Timestamp),
    /// Symbol or string text.
    Text(IonString),
    /// Clob or blob bytes.
    Lob(IonString),
}

/// One entry of a materialized stream. Field names and annotations are
/// deep copies; the stream outlives the reader that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// What this event represents.
    pub kind: EventKind,
    /// The value's type; `None` only for [`EventKind::StreamEnd`].
    pub ion_type: Option<IonType>,
    /// Field name, when the value sat in a struct.
    pub field_name: Option<IonString>,
    /// Annotations in order.
    pub annotations: Vec<IonString>,
    /// Container nesting depth of the value.
    pub depth: usize,
    /// Scalar content; present only for non-null scalars.
    pub value: Option<ScalarValue>,
}

/// An append-only ordered list of reader events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStream {
    events: Vec<Event>,
}

impl EventStream {
    /// Materialize an entire reader, appending a terminal
    /// [`EventKind::StreamEnd`].
    pub fn read_all(reader: &mut dyn IonReader) -> IonResult<Self> {
        let mut stream = Self::default();
        stream.read_container(reader, 0)?;
        stream.events.push(Event {
            kind: EventKind::StreamEnd,
            ion_type: None,
            field_name: None,
            annotations: Vec::new(),
            depth: 0,
            value: None,
        });
        Ok(stream)
    }

    /// Materialize a text document.
    pub fn from_text(input: &str) -> IonResult<Self> {
        let mut reader = ElementReader::for_text(input, ReaderOptions::default())?;
        Self::read_all(&mut reader)
    }

    fn read_container(&mut self, reader: &mut dyn IonReader, depth: usize) -> IonResult<()> {
        while let Some(ion_type) = reader.next()? {
            let field_name = reader.field_name().cloned();
            let annotations = reader.annotations().to_vec();
            if ion_type.is_container() && !reader.is_null() {
                self.events.push(Event {
                    kind: EventKind::ContainerStart,
                    ion_type: Some(ion_type),
                    field_name,
                    annotations,
                    depth,
                    value: None,
                });
                reader.step_in()?;
                self.read_container(reader, depth + 1)?;
                reader.step_out()?;
                self.events.push(Event {
                    kind: EventKind::ContainerEnd,
                    ion_type: Some(ion_type),
                    field_name: None,
                    annotations: Vec::new(),
                    depth,
                    value: None,
                });
            } else {
                let value = if reader.is_null() {
                    None
                } else {
                    Some(read_scalar(reader, ion_type)?)
                };
                self.events.push(Event {
                    kind: EventKind::Scalar,
                    ion_type: Some(ion_type),
                    field_name,
                    annotations,
                    depth,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Number of events, the terminal stream-end included.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` for a stream with no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The event at `index`.
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// All events in order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Length of the value starting at `start_index`, in events: one for a
    /// scalar, and for a container start everything through its matching
    /// end. This is the skip step for streaming comparison.
    pub fn value_len(&self, start_index: usize) -> usize {
        let start = &self.events[start_index];
        if start.kind != EventKind::ContainerStart {
            return 1;
        }
        let mut i = start_index;
        loop {
            i += 1;
            let current = &self.events[i];
            if current.kind == EventKind::ContainerEnd && current.depth == start.depth {
                return i + 1 - start_index;
            }
        }
    }
}

fn read_scalar(reader: &mut dyn IonReader, ion_type: IonType) -> IonResult<ScalarValue> {
    Ok(match ion_type {
        IonType::Bool => ScalarValue::Bool(reader.read_bool()?),
        IonType::Int => ScalarValue::Int(reader.read_int()?),
        IonType::Float => ScalarValue::Float(reader.read_f64()?),
        IonType::Decimal => {
            let mut decimal = reader.read_decimal()?;
            decimal.claim();
            ScalarValue::Decimal(decimal)
        }
        IonType::Timestamp => ScalarValue::Timestamp(reader.read_timestamp()?),
        IonType::Symbol | IonType::String => ScalarValue::Text(reader.read_string()?),
        IonType::Clob | IonType::Blob => ScalarValue::Lob(reader.read_lob()?),
        IonType::Null | IonType::List | IonType::Sexp | IonType::Struct => {
            return Err(IonError::InvalidState("not a scalar type"));
        }
    })
}

/// Timestamp comparison rule used by a [`StreamComparator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TsEquality {
    /// Timestamps must agree on precision, displayed offset, and every
    /// field.
    FieldWise,
    /// Timestamps must name the same UTC instant.
    Instant,
}

/// Which way a comparison set constrains its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonType {
    /// All members must be pairwise equivalent.
    Equivs,
    /// All members must be pairwise non-equivalent.
    NonEquivs,
}

/// Structural equivalence over event streams. The timestamp rule is a
/// field here, configured per comparator rather than process-wide.
#[derive(Debug, Clone)]
pub struct StreamComparator {
    /// How timestamps compare.
    pub timestamp_equality: TsEquality,
}

impl Default for StreamComparator {
    fn default() -> Self {
        Self {
            timestamp_equality: TsEquality::FieldWise,
        }
    }
}

impl StreamComparator {
    /// A comparator with the given timestamp rule.
    pub const fn new(timestamp_equality: TsEquality) -> Self {
        Self { timestamp_equality }
    }

    /// Whole-stream equivalence: corresponding values equivalent and both
    /// streams fully consumed.
    pub fn streams_eq(&self, expected: &EventStream, actual: &EventStream) -> bool {
        let mut index_expected = 0;
        let mut index_actual = 0;
        while index_expected < expected.len() && index_actual < actual.len() {
            if !self.events_eq(expected, index_expected, actual, index_actual) {
                return false;
            }
            index_expected += expected.value_len(index_expected);
            index_actual += actual.value_len(index_actual);
        }
        index_expected == expected.len() && index_actual == actual.len()
    }

    /// Equivalence of the values starting at the given indices.
    pub fn events_eq(
        &self,
        expected: &EventStream,
        index_expected: usize,
        actual: &EventStream,
        index_actual: usize,
    ) -> bool {
        let (Some(e), Some(a)) = (expected.get(index_expected), actual.get(index_actual)) else {
            return false;
        };
        if e.kind != a.kind
            || e.ion_type != a.ion_type
            || e.depth != a.depth
            || e.field_name != a.field_name
            || e.annotations != a.annotations
        {
            return false;
        }
        match e.kind {
            EventKind::StreamEnd | EventKind::ContainerEnd => true,
            EventKind::ContainerStart => match e.ion_type {
                Some(IonType::Struct) => {
                    self.structs_eq(expected, index_expected, actual, index_actual)
                }
                Some(IonType::List) | Some(IonType::Sexp) => {
                    self.sequences_eq(expected, index_expected, actual, index_actual)
                }
                _ => false,
            },
            EventKind::Scalar => self.scalars_eq(e, a),
        }
    }

    /// Ordered pairwise equivalence of two sequences.
    fn sequences_eq(
        &self,
        expected: &EventStream,
        index_expected: usize,
        actual: &EventStream,
        index_actual: usize,
    ) -> bool {
        let target_depth = expected.events()[index_expected].depth;
        let mut ie = index_expected + 1;
        let mut ia = index_actual + 1;
        loop {
            if !self.events_eq(expected, ie, actual, ia) {
                return false;
            }
            let e = &expected.events()[ie];
            if e.kind == EventKind::ContainerEnd && e.depth == target_depth {
                let a = &actual.events()[ia];
                return a.kind == EventKind::ContainerEnd && a.depth == target_depth;
            }
            ie += expected.value_len(ie);
            ia += actual.value_len(ia);
        }
    }

    /// Bag equivalence: each is a sub-bag of the other.
    fn structs_eq(
        &self,
        expected: &EventStream,
        index_expected: usize,
        actual: &EventStream,
        index_actual: usize,
    ) -> bool {
        self.struct_is_subset(expected, index_expected, actual, index_actual)
            && self.struct_is_subset(actual, index_actual, expected, index_expected)
    }

    /// Every field of the struct at `index_expected` finds a distinct
    /// equivalent field in the struct at `index_actual`. Matched fields
    /// are consumed, so a field of multiplicity k needs k partners.
    fn struct_is_subset(
        &self,
        expected: &EventStream,
        index_expected: usize,
        actual: &EventStream,
        index_actual: usize,
    ) -> bool {
        let target_depth = expected.events()[index_expected].depth;
        let mut ie = index_expected + 1;
        let index_actual_start = index_actual + 1;
        let mut skips: HashSet<usize> = HashSet::new();
        loop {
            let e = &expected.events()[ie];
            if e.kind == EventKind::ContainerEnd && e.depth == target_depth {
                return true;
            }
            let Some(expected_field) = e.field_name.as_ref() else {
                return false;
            };
            let mut ia = index_actual_start;
            loop {
                let a = &actual.events()[ia];
                if a.kind == EventKind::ContainerEnd && a.depth == target_depth {
                    // Ran out of candidates before finding a partner.
                    return false;
                }
                if !skips.contains(&ia)
                    && a.field_name.as_ref() == Some(expected_field)
                    && self.events_eq(expected, ie, actual, ia)
                {
                    skips.insert(ia);
                    break;
                }
                ia += actual.value_len(ia);
            }
            ie += expected.value_len(ie);
        }
    }

    fn scalars_eq(&self, expected: &Event, actual: &Event) -> bool {
        match (&expected.value, &actual.value) {
            (None, None) => true,
            (Some(e), Some(a)) => match (e, a) {
                (ScalarValue::Bool(x), ScalarValue::Bool(y)) => x == y,
                (ScalarValue::Int(x), ScalarValue::Int(y)) => x == y,
                // NaN equals NaN; +0.0 and -0.0 differ. Bit equality gives
                // exactly that for every non-NaN pair.
                (ScalarValue::Float(x), ScalarValue::Float(y)) => {
                    (x.is_nan() && y.is_nan()) || x.to_bits() == y.to_bits()
                }
                (ScalarValue::Decimal(x), ScalarValue::Decimal(y)) => x.eq_value(y),
                (ScalarValue::Timestamp(x), ScalarValue::Timestamp(y)) => {
                    match self.timestamp_equality {
                        TsEquality::FieldWise => x == y,
                        TsEquality::Instant => x.same_instant(y),
                    }
                }
                (ScalarValue::Text(x), ScalarValue::Text(y)) => x == y,
                (ScalarValue::Lob(x), ScalarValue::Lob(y)) => x == y,
                _ => false,
            },
            _ => false,
        }
    }

    /* comparison-set drivers */

    /// Check a stream of comparison sets: each top-level container is a
    /// set whose members must be pairwise equivalent (or non-equivalent),
    /// and a set annotated `embedded_documents` holds strings that are
    /// parsed as documents and compared as sub-streams. Returns whether
    /// every set satisfied its constraint; malformed input is an error.
    pub fn check_comparison_sets(
        &self,
        stream: &EventStream,
        comparison: ComparisonType,
    ) -> IonResult<bool> {
        let mut index = 0;
        while index < stream.len() {
            let event = &stream.events()[index];
            if index == stream.len() - 1 {
                if event.kind != EventKind::StreamEnd {
                    return Err(IonError::InvalidArg("comparison stream has no terminal end"));
                }
                break;
            }
            if event.kind != EventKind::ContainerStart
                || !matches!(event.ion_type, Some(IonType::List) | Some(IonType::Sexp))
            {
                return Err(IonError::InvalidArg("comparison sets must be sequences"));
            }
            let embedded = event.annotations.len() == 1
                && event.annotations[0] == *EMBEDDED_DOCUMENTS_ANNOTATION;
            let ok = if embedded {
                self.check_embedded_set(stream, index, comparison)?
            } else {
                self.check_equivs_set(stream, index, comparison)
            };
            if !ok {
                return Ok(false);
            }
            index += stream.value_len(index);
        }
        Ok(true)
    }

    /// Start indices of the members of the set whose container starts at
    /// `set_index`.
    fn member_indices(&self, stream: &EventStream, set_index: usize) -> Vec<usize> {
        let target_depth = stream.events()[set_index].depth;
        let mut members = Vec::new();
        let mut i = set_index + 1;
        loop {
            let event = &stream.events()[i];
            if event.kind == EventKind::ContainerEnd && event.depth == target_depth {
                return members;
            }
            members.push(i);
            i += stream.value_len(i);
        }
    }

    fn check_equivs_set(
        &self,
        stream: &EventStream,
        set_index: usize,
        comparison: ComparisonType,
    ) -> bool {
        let members = self.member_indices(stream, set_index);
        for (position, &i) in members.iter().enumerate() {
            for &j in &members[position + 1..] {
                let equivalent = self.events_eq(stream, i, stream, j);
                trace!(i, j, equivalent, "comparison set pair");
                match comparison {
                    ComparisonType::Equivs if !equivalent => return false,
                    ComparisonType::NonEquivs if equivalent => return false,
                    _ => {}
                }
            }
        }
        true
    }

    fn check_embedded_set(
        &self,
        stream: &EventStream,
        set_index: usize,
        comparison: ComparisonType,
    ) -> IonResult<bool> {
        let members = self.member_indices(stream, set_index);
        let mut documents = Vec::with_capacity(members.len());
        for &i in &members {
            let event = &stream.events()[i];
            let Some(ScalarValue::Text(text)) = &event.value else {
                return Err(IonError::InvalidArg("embedded documents must be strings"));
            };
            if event.ion_type != Some(IonType::String) {
                return Err(IonError::InvalidArg("embedded documents must be strings"));
            }
            let source = text
                .as_text()
                .ok_or(IonError::InvalidArg("embedded document is not UTF-8"))?;
            documents.push(EventStream::from_text(source)?);
        }
        for (position, a) in documents.iter().enumerate() {
            for b in &documents[position + 1..] {
                let equivalent = self.streams_eq(a, b);
                match comparison {
                    ComparisonType::Equivs if !equivalent => return Ok(false),
                    ComparisonType::NonEquivs if equivalent => return Ok(false),
                    _ => {}
                }
            }
        }
        Ok(true)
    }
}
