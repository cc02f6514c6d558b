//! Compiled path components for the streaming extractor.

use crate::value::IonString;

/// One predicate of a registered path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathComponent {
    /// Matches a struct field whose name is byte-identical to this text.
    Field(IonString),
    /// Matches the value at this zero-based position within its
    /// container.
    Ordinal(i64),
    /// Matches any value at this depth.
    Wildcard,
}

impl PathComponent {
    /// Evaluate this predicate against the value the reader is positioned
    /// on, described by its field name (when inside a struct) and its
    /// ordinal within the current container.
    pub(crate) fn matches(&self, field_name: Option<&IonString>, ordinal: i64) -> bool {
        match self {
            Self::Field(name) => field_name == Some(name),
            Self::Ordinal(position) => *position == ordinal,
            Self::Wildcard => true,
        }
    }
}

/// A component slot in the extractor's depth-major table, tagged with
/// whether it is the last component of its path. Matching a terminal
/// component fires the path's callback; matching a non-terminal one only
/// keeps the path active at the next depth.
#[derive(Debug, Clone)]
pub(crate) struct StoredComponent {
    pub component: PathComponent,
    pub is_terminal: bool,
}

/// Registration-stable handle to a path. The handle passed to a callback
/// compares equal to the one returned at registration for the lifetime of
/// the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathHandle {
    /// Dense identifier, also the path's bit index in the active map.
    pub path_id: u8,
    /// Number of components in the path.
    pub path_length: u8,
}
