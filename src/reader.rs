//! The reader contract the core requires, plus an in-memory cursor.

use crate::context::DecContext;
use crate::decimal::IonDecimal;
use crate::element::{Element, Value};
use crate::error::{IonError, IonResult};
use crate::text;
use crate::types::IonType;
use crate::value::{IonInt, IonString, Timestamp};

/// Streaming cursor over an Ion document.
///
/// `next` advances to the following value at the current depth and reports
/// its type, or `None` at the end of the container or stream. While
/// positioned on a value, the `read_*` accessors and the field/annotation
/// queries describe it. `step_in`/`step_out` move across container
/// boundaries; stepping out skips any unread remainder of the container.
pub trait IonReader {
    /// Advance to the next value at this depth.
    fn next(&mut self) -> IonResult<Option<IonType>>;
    /// The type of the value the reader is positioned on.
    fn ion_type(&self) -> Option<IonType>;
    /// Container nesting depth; zero at top level.
    fn depth(&self) -> usize;
    /// Enter the container the reader is positioned on.
    fn step_in(&mut self) -> IonResult<()>;
    /// Leave the current container.
    fn step_out(&mut self) -> IonResult<()>;
    /// Return `true` when the current container is a struct.
    fn is_in_struct(&self) -> bool;
    /// Field name of the current value, when inside a struct.
    fn field_name(&self) -> Option<&IonString>;
    /// Annotations of the current value, in order.
    fn annotations(&self) -> &[IonString];
    /// Return `true` if the current value has at least one annotation.
    fn has_any_annotations(&self) -> bool {
        !self.annotations().is_empty()
    }
    /// Return `true` when the current value is a null of any type.
    fn is_null(&self) -> bool;
    /// The declared type of a null value.
    fn read_null(&self) -> IonResult<IonType>;
    /// Read the current value as a bool.
    fn read_bool(&self) -> IonResult<bool>;
    /// Read the current value as an `i64`, failing on overflow.
    fn read_i64(&self) -> IonResult<i64>;
    /// Read the current value as an arbitrary-precision integer.
    fn read_int(&self) -> IonResult<IonInt>;
    /// Read the current value as a float.
    fn read_f64(&self) -> IonResult<f64>;
    /// Read the current value as a decimal. The returned value may be
    /// backed by reader-owned storage; claim it to outlive the reader.
    fn read_decimal(&self) -> IonResult<IonDecimal>;
    /// Read the current value as a timestamp.
    fn read_timestamp(&self) -> IonResult<Timestamp>;
    /// Read the current text value (string or symbol).
    fn read_string(&self) -> IonResult<IonString>;
    /// Read the current lob value (clob or blob).
    fn read_lob(&self) -> IonResult<IonString>;
}

/// Configuration for [`ElementReader`].
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Deepest container nesting the reader will enter.
    pub max_container_depth: usize,
    /// Decimal context used when parsing decimal lexemes.
    pub decimal_context: DecContext,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_container_depth: 10,
            decimal_context: DecContext::new(10_000),
        }
    }
}

enum Node<'a> {
    Seq(&'a [Element]),
    Struct(&'a [(IonString, Element)]),
}

impl<'a> Node<'a> {
    fn len(&self) -> usize {
        match self {
            Node::Seq(items) => items.len(),
            Node::Struct(fields) => fields.len(),
        }
    }

    fn element(&self, index: usize) -> Option<&'a Element> {
        match self {
            Node::Seq(items) => items.get(index),
            Node::Struct(fields) => fields.get(index).map(|(_, e)| e),
        }
    }

    fn field(&self, index: usize) -> Option<&'a IonString> {
        match self {
            Node::Seq(_) => None,
            Node::Struct(fields) => fields.get(index).map(|(name, _)| name),
        }
    }
}

/// An [`IonReader`] over a parsed in-memory document, the buffer-reader
/// analogue used by tests and by path registration.
pub struct ElementReader {
    document: Vec<Element>,
    options: ReaderOptions,
    /// Indices of the containers stepped into, outermost first.
    path: Vec<usize>,
    /// Position within the current container; `None` before the first
    /// `next` and after the container is exhausted.
    index: Option<usize>,
    exhausted: bool,
}

impl ElementReader {
    /// Read a pre-built document.
    pub fn new(document: Vec<Element>, options: ReaderOptions) -> Self {
        Self {
            document,
            options,
            path: Vec::new(),
            index: None,
            exhausted: false,
        }
    }

    /// Parse text Ion and read the result.
    pub fn for_text(input: &str, mut options: ReaderOptions) -> IonResult<Self> {
        let mut ctx = options.decimal_context.clone();
        let document = text::parse_document(input, &mut ctx)?;
        options.decimal_context = ctx;
        Ok(Self::new(document, options))
    }

    fn container(&self) -> Node<'_> {
        let mut node = Node::Seq(&self.document);
        for idx in &self.path {
            let element = node.element(*idx).expect("stepped-in index is valid");
            node = match &element.value {
                Value::List(items) | Value::Sexp(items) => Node::Seq(items),
                Value::Struct(fields) => Node::Struct(fields),
                _ => unreachable!("stepped into a non-container"),
            };
        }
        node
    }

    fn current(&self) -> Option<&Element> {
        let index = self.index?;
        if self.exhausted {
            return None;
        }
        self.container().element(index)
    }

    fn current_or_err(&self) -> IonResult<&Element> {
        self.current()
            .ok_or(IonError::InvalidState("reader is not positioned on a value"))
    }
}

impl IonReader for ElementReader {
    fn next(&mut self) -> IonResult<Option<IonType>> {
        if self.exhausted {
            return Ok(None);
        }
        let next_index = self.index.map(|i| i + 1).unwrap_or(0);
        if next_index >= self.container().len() {
            self.index = Some(next_index);
            self.exhausted = true;
            return Ok(None);
        }
        self.index = Some(next_index);
        Ok(self.current().map(Element::ion_type))
    }

    fn ion_type(&self) -> Option<IonType> {
        self.current().map(Element::ion_type)
    }

    fn depth(&self) -> usize {
        self.path.len()
    }

    fn step_in(&mut self) -> IonResult<()> {
        let element = self.current_or_err()?;
        if !element.ion_type().is_container() || element.is_null() {
            return Err(IonError::InvalidState("cannot step into a non-container"));
        }
        if self.path.len() + 1 > self.options.max_container_depth {
            return Err(IonError::NoMemory("maximum container depth exceeded"));
        }
        self.path.push(self.index.expect("positioned"));
        self.index = None;
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        let index = self
            .path
            .pop()
            .ok_or(IonError::InvalidState("cannot step out of the top level"))?;
        self.index = Some(index);
        self.exhausted = false;
        Ok(())
    }

    fn is_in_struct(&self) -> bool {
        matches!(self.container(), Node::Struct(_))
    }

    fn field_name(&self) -> Option<&IonString> {
        let index = self.index?;
        if self.exhausted {
            return None;
        }
        self.container().field(index)
    }

    fn annotations(&self) -> &[IonString] {
        self.current().map(|e| e.annotations.as_slice()).unwrap_or(&[])
    }

    fn is_null(&self) -> bool {
        self.current().map(Element::is_null).unwrap_or(false)
    }

    fn read_null(&self) -> IonResult<IonType> {
        match &self.current_or_err()?.value {
            Value::Null(t) => Ok(*t),
            _ => Err(IonError::InvalidArg("current value is not null")),
        }
    }

    fn read_bool(&self) -> IonResult<bool> {
        match &self.current_or_err()?.value {
            Value::Bool(b) => Ok(*b),
            _ => Err(IonError::InvalidArg("current value is not a bool")),
        }
    }

    fn read_i64(&self) -> IonResult<i64> {
        match &self.current_or_err()?.value {
            Value::Int(i) => i.as_i64().ok_or(IonError::NumericOverflow),
            _ => Err(IonError::InvalidArg("current value is not an int")),
        }
    }

    fn read_int(&self) -> IonResult<IonInt> {
        match &self.current_or_err()?.value {
            Value::Int(i) => Ok(i.clone()),
            _ => Err(IonError::InvalidArg("current value is not an int")),
        }
    }

    fn read_f64(&self) -> IonResult<f64> {
        match &self.current_or_err()?.value {
            Value::Float(f) => Ok(*f),
            _ => Err(IonError::InvalidArg("current value is not a float")),
        }
    }

    fn read_decimal(&self) -> IonResult<IonDecimal> {
        match &self.current_or_err()?.value {
            Value::Decimal(IonDecimal::Quad(q)) => Ok(IonDecimal::Quad(*q)),
            Value::Decimal(IonDecimal::Number { value, .. }) => {
                // Hand out reader-backed storage; the caller claims it to
                // extend its lifetime past this reader.
                Ok(IonDecimal::from_number(value.as_ref().clone()))
            }
            _ => Err(IonError::InvalidArg("current value is not a decimal")),
        }
    }

    fn read_timestamp(&self) -> IonResult<Timestamp> {
        match &self.current_or_err()?.value {
            Value::Timestamp(ts) => Ok(ts.clone()),
            _ => Err(IonError::InvalidArg("current value is not a timestamp")),
        }
    }

    fn read_string(&self) -> IonResult<IonString> {
        match &self.current_or_err()?.value {
            Value::Symbol(s) | Value::String(s) => Ok(s.clone()),
            _ => Err(IonError::InvalidArg("current value is not text")),
        }
    }

    fn read_lob(&self) -> IonResult<IonString> {
        match &self.current_or_err()?.value {
            Value::Clob(s) | Value::Blob(s) => Ok(s.clone()),
            _ => Err(IonError::InvalidArg("current value is not a lob")),
        }
    }
}
