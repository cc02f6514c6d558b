//! Core engines of the Ion data format.
//!
//! Three subsystems share this crate: an arbitrary-precision decimal engine
//! with a hybrid fixed/variable representation, a streaming path extractor
//! that evaluates many registered paths in a single pass over a reader, and
//! the event model used to compare Ion streams for structural equivalence.
//! The binary and text cursors themselves are external collaborators; the
//! [`reader::IonReader`] trait captures the contract this crate requires of
//! them, and [`reader::ElementReader`] provides an in-memory implementation
//! over a parsed document.

pub mod consts;
pub mod context;
pub mod decimal;
pub mod element;
pub mod error;
pub mod events;
pub mod extractor;
pub mod path;
pub mod reader;
pub mod text;
pub mod types;
pub mod value;

pub mod prelude {
    //! Re-exports of the most commonly used items.

    pub use crate::context::{DecContext, Rounding};
    pub use crate::decimal::{BigDecimal, IonDecimal, Quad};
    pub use crate::element::{Element, Value};
    pub use crate::error::{IonError, IonResult};
    pub use crate::events::{
        ComparisonType, Event, EventKind, EventStream, ScalarValue, StreamComparator, TsEquality,
    };
    pub use crate::extractor::{Control, Extractor, ExtractorOptions, PathHandle};
    pub use crate::path::PathComponent;
    pub use crate::reader::{ElementReader, IonReader};
    pub use crate::types::IonType;
    pub use crate::value::{IonInt, IonString, Timestamp, TsPrecision};
}
