//! Streaming path extractor.
//!
//! An extractor holds up to 64 compiled paths and evaluates all of them in
//! a single pass over a reader. Partial matches are tracked per depth in a
//! 64-bit active-path map: bit `i` set means path `i` still matches the
//! prefix consumed so far. A container is only entered while at least one
//! bit survives, so unmatched subtrees are skipped without parsing their
//! contents.

use tracing::{debug, trace};

use crate::consts::{
    DEFAULT_MAX_NUM_PATHS, DEFAULT_MAX_PATH_LENGTH, MAX_NUM_PATHS_LIMIT, MAX_PATH_LENGTH_LIMIT,
    WILDCARD_ANNOTATION,
};
use crate::error::{IonError, IonResult};
use crate::path::{PathComponent, StoredComponent};
use crate::reader::{ElementReader, IonReader, ReaderOptions};
use crate::types::IonType;
use crate::value::IonString;

pub use crate::path::PathHandle;

mod matcher;

/// Every registered path is active.
const ALL_PATHS_ACTIVE: u64 = u64::MAX;

/// Configuration supplied when opening an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractorOptions {
    /// Longest registerable path, in components. At most
    /// [`MAX_PATH_LENGTH_LIMIT`].
    pub max_path_length: usize,
    /// Most paths registerable to this extractor. At most
    /// [`MAX_NUM_PATHS_LIMIT`], so the active set fits one word.
    pub max_num_paths: usize,
    /// Accept a reader parked at any depth and match paths relative to
    /// it, instead of requiring depth zero.
    pub match_relative_paths: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_num_paths: DEFAULT_MAX_NUM_PATHS,
            match_relative_paths: false,
        }
    }
}

/// Instruction a callback hands back to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Control {
    /// Continue processing normally.
    Next,
    /// Unwind this many levels before resuming. `StepOut(0)` is
    /// equivalent to [`Control::Next`].
    StepOut(usize),
}

impl Control {
    /// Continue processing normally.
    pub const fn next() -> Self {
        Self::Next
    }

    /// Resume processing `n` levels above the matched value.
    pub const fn step_out(n: usize) -> Self {
        Self::StepOut(n)
    }

    pub(crate) const fn requested_step_out(&self) -> usize {
        match self {
            Self::Next => 0,
            Self::StepOut(n) => *n,
        }
    }
}

/// Callback invoked on a match. It receives the reader positioned on the
/// matched value and must leave the reader at the depth it received it at.
pub type MatchCallback<'a> = Box<dyn FnMut(&mut dyn IonReader, PathHandle) -> IonResult<Control> + 'a>;

pub(crate) struct Matcher<'a> {
    pub handle: PathHandle,
    pub callback: MatchCallback<'a>,
}

/// A set of compiled paths and the engine that matches them.
pub struct Extractor<'a> {
    options: ExtractorOptions,
    /// Components of all paths, depth-major: the component of path `pid`
    /// at depth `d` lives at `d * max_num_paths + pid`. This mirrors the
    /// access order of matching, which scans one depth across all paths.
    components: Vec<Option<StoredComponent>>,
    matchers: Vec<Matcher<'a>>,
    path_in_progress: bool,
    cur_path_len: usize,
    pending_callback: Option<MatchCallback<'a>>,
}

impl<'a> Extractor<'a> {
    /// Open an extractor. Fails with [`IonError::InvalidArg`] when either
    /// limit is zero or above its hard cap.
    pub fn open(options: ExtractorOptions) -> IonResult<Self> {
        if options.max_num_paths < 1 || options.max_num_paths > MAX_NUM_PATHS_LIMIT {
            return Err(IonError::InvalidArg("max_num_paths must be in [1, 64]"));
        }
        if options.max_path_length < 1 || options.max_path_length > MAX_PATH_LENGTH_LIMIT {
            return Err(IonError::InvalidArg("max_path_length must be in [1, 255]"));
        }
        Ok(Self {
            options,
            components: vec![None; options.max_path_length * options.max_num_paths],
            matchers: Vec::new(),
            path_in_progress: false,
            cur_path_len: 0,
            pending_callback: None,
        })
    }

    /// The configuration this extractor was opened with.
    pub const fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Number of registered paths.
    pub fn num_paths(&self) -> usize {
        self.matchers.len()
    }

    fn component_slot(&mut self, depth: usize, path_id: usize) -> &mut Option<StoredComponent> {
        &mut self.components[depth * self.options.max_num_paths + path_id]
    }

    pub(crate) fn component(&self, depth: usize, path_id: usize) -> Option<&StoredComponent> {
        // Depths past the table exist when a terminal match was a
        // container; nothing can match down there.
        if depth >= self.options.max_path_length {
            return None;
        }
        self.components[depth * self.options.max_num_paths + path_id].as_ref()
    }

    /* builder registration */

    /// Start a new path with the callback to fire when it matches. No
    /// other path may be started before this one is finished.
    pub fn register_path_start(
        &mut self,
        callback: impl FnMut(&mut dyn IonReader, PathHandle) -> IonResult<Control> + 'a,
    ) -> IonResult<()> {
        if self.path_in_progress || self.cur_path_len != 0 {
            return Err(IonError::InvalidState(
                "cannot start a new path before finishing the previous one",
            ));
        }
        if self.matchers.len() >= self.options.max_num_paths {
            return Err(IonError::NoMemory("too many registered paths"));
        }
        self.path_in_progress = true;
        self.pending_callback = Some(Box::new(callback));
        Ok(())
    }

    fn append(&mut self, component: PathComponent) -> IonResult<()> {
        if !self.path_in_progress {
            return Err(IonError::InvalidState("no path is in progress"));
        }
        if self.cur_path_len >= self.options.max_path_length {
            return Err(IonError::InvalidArg("path is too long"));
        }
        let depth = self.cur_path_len;
        let path_id = self.matchers.len();
        *self.component_slot(depth, path_id) = Some(StoredComponent {
            component,
            is_terminal: false,
        });
        self.cur_path_len += 1;
        Ok(())
    }

    /// Append a field-name component. The text is copied; the caller need
    /// not retain it.
    pub fn register_path_append_field(&mut self, name: &str) -> IonResult<()> {
        self.append(PathComponent::Field(IonString::from(name)))
    }

    /// Append an ordinal (collection index) component.
    pub fn register_path_append_ordinal(&mut self, ordinal: i64) -> IonResult<()> {
        self.append(PathComponent::Ordinal(ordinal))
    }

    /// Append a wildcard component.
    pub fn register_path_append_wildcard(&mut self) -> IonResult<()> {
        self.append(PathComponent::Wildcard)
    }

    /// Finish the path under construction and hand back its stable
    /// handle.
    pub fn register_path_finish(&mut self) -> IonResult<PathHandle> {
        if !self.path_in_progress {
            return Err(IonError::InvalidState("no path is in progress"));
        }
        if self.cur_path_len == 0 {
            return Err(IonError::InvalidState("path has no components"));
        }
        let path_id = self.matchers.len();
        let path_length = self.cur_path_len;
        self.component_slot(path_length - 1, path_id)
            .as_mut()
            .expect("last appended component exists")
            .is_terminal = true;
        let handle = PathHandle {
            path_id: path_id as u8,
            path_length: path_length as u8,
        };
        self.matchers.push(Matcher {
            handle,
            callback: self.pending_callback.take().expect("callback set at start"),
        });
        self.path_in_progress = false;
        self.cur_path_len = 0;
        debug!(path_id = handle.path_id, path_length = handle.path_length, "registered path");
        Ok(handle)
    }

    /* registration from Ion data */

    /// Register a path from text Ion. The data must hold exactly one
    /// top-level list or sexp. Integer elements become ordinals and text
    /// elements become fields, except that a text element carrying
    /// `$ion_wildcard` as its first annotation becomes a wildcard; that
    /// escape leaves a path able to match a field literally named `*`.
    pub fn register_path_from_ion(
        &mut self,
        callback: impl FnMut(&mut dyn IonReader, PathHandle) -> IonResult<Control> + 'a,
        ion: &str,
    ) -> IonResult<PathHandle> {
        let options = ReaderOptions {
            max_container_depth: self.options.max_path_length.max(DEFAULT_MAX_PATH_LENGTH),
            ..ReaderOptions::default()
        };
        let mut reader = ElementReader::for_text(ion, options)?;
        let mut components = Vec::new();

        match reader.next()? {
            Some(IonType::List) | Some(IonType::Sexp) => {}
            _ => return Err(IonError::InvalidArg("improper path format")),
        }
        reader.step_in()?;
        while let Some(ion_type) = reader.next()? {
            match ion_type {
                IonType::Int => components.push(PathComponent::Ordinal(reader.read_i64()?)),
                IonType::Symbol | IonType::String => {
                    let is_wildcard = reader
                        .annotations()
                        .first()
                        .map(|a| *a == *WILDCARD_ANNOTATION)
                        .unwrap_or(false);
                    if is_wildcard {
                        components.push(PathComponent::Wildcard);
                    } else {
                        components.push(PathComponent::Field(reader.read_string()?));
                    }
                }
                _ => return Err(IonError::InvalidArg("improper path format")),
            }
        }
        reader.step_out()?;

        self.register_path_start(callback)?;
        let registered = components
            .into_iter()
            .try_for_each(|component| self.append(component))
            .and_then(|()| self.register_path_finish());
        if registered.is_err() {
            // Abandon the partial path so the extractor stays usable.
            self.path_in_progress = false;
            self.cur_path_len = 0;
            self.pending_callback = None;
        }
        registered
    }

    /// Drive `reader` to exhaustion, matching every registered path and
    /// invoking callbacks as terminal components match. Unless the
    /// extractor was opened with `match_relative_paths`, the reader must
    /// be at depth zero.
    pub fn match_reader(&mut self, reader: &mut dyn IonReader) -> IonResult<()> {
        if self.path_in_progress {
            return Err(IonError::InvalidState("cannot match with a path in progress"));
        }
        if reader.depth() != 0 && !self.options.match_relative_paths {
            return Err(IonError::InvalidState("reader must be at depth 0 to start matching"));
        }
        if self.matchers.is_empty() {
            return Ok(());
        }
        trace!(num_paths = self.matchers.len(), depth = reader.depth(), "match starting");
        self.match_helper(reader, 0, ALL_PATHS_ACTIVE).map(|_| ())
    }
}
