//! The recursive matching engine.

use tracing::trace;

use crate::error::{IonError, IonResult};
use crate::reader::IonReader;

use super::{Extractor, ALL_PATHS_ACTIVE};

impl<'a> Extractor<'a> {
    /// Process one container level. `prev_actives` carries the paths whose
    /// prefixes matched through the previous depth. Returns the number of
    /// levels still to unwind for a pending step-out directive (zero when
    /// processing should continue normally).
    pub(super) fn match_helper(
        &mut self,
        reader: &mut dyn IonReader,
        depth: usize,
        prev_actives: u64,
    ) -> IonResult<usize> {
        debug_assert!(prev_actives != 0, "a depth with no active paths is never entered");
        let mut ordinal: i64 = 0;
        while let Some(ion_type) = reader.next()? {
            // Each value at depth N can match any path still active from
            // depth N - 1.
            let (cur_actives, step_out) = if depth > 0 {
                self.evaluate_predicates(reader, depth, ordinal, prev_actives)?
            } else {
                // Everything matches at depth 0; the outer frame exists
                // only to recurse into the top-level values.
                (ALL_PATHS_ACTIVE, 0)
            };
            ordinal += 1;
            if step_out > 0 {
                trace!(depth, step_out, "honoring step-out directive");
                return Ok(step_out);
            }
            if ion_type.is_container() && !reader.is_null() && cur_actives != 0 {
                reader.step_in()?;
                let pending = self.match_helper(reader, depth + 1, cur_actives)?;
                reader.step_out()?;
                if pending > 1 {
                    return Ok(pending - 1);
                }
            }
        }
        Ok(0)
    }

    /// Evaluate every active path's component at this depth against the
    /// current value, firing callbacks for terminal matches in ascending
    /// path-id order. All peers are evaluated before any step-out request
    /// is honored; the largest request wins, clamped to this depth.
    fn evaluate_predicates(
        &mut self,
        reader: &mut dyn IonReader,
        depth: usize,
        ordinal: i64,
        prev_actives: u64,
    ) -> IonResult<(u64, usize)> {
        debug_assert!(depth > 0);
        let field_name = reader.field_name().cloned();
        let mut cur_actives: u64 = 0;
        let mut step_out: usize = 0;

        for path_id in 0..self.matchers.len() {
            if prev_actives & (1 << path_id) == 0 {
                continue;
            }
            // A path shorter than this depth has no component here; it
            // was only carried along by a terminal match above.
            let Some(stored) = self.component(depth - 1, path_id) else {
                continue;
            };
            if !stored.component.matches(field_name.as_ref(), ordinal) {
                continue;
            }
            if stored.is_terminal {
                trace!(path_id, depth, ordinal, "path matched");
                let depth_before = reader.depth();
                let matcher = &mut self.matchers[path_id];
                let control = (matcher.callback)(reader, matcher.handle)?;
                if reader.depth() != depth_before {
                    return Err(IonError::InvalidState(
                        "callback must return the reader at the depth it received it",
                    ));
                }
                step_out = step_out.max(control.requested_step_out());
            }
            cur_actives |= 1 << path_id;
        }
        Ok((cur_actives, step_out.min(depth)))
    }
}
