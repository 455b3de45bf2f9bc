//! Reverse-mode sweep engine.
//!
//! [`ReverseEngine`] owns the adjoint scratch buffer (`num_entries x p`
//! values, row-major by tape entry) and borrows the tape and forward
//! coefficient store it sweeps over. Two entry points:
//!
//! - [`reverse`](ReverseEngine::reverse) — full sweep over every tape entry,
//!   all dependent variables seeded at once, arbitrary order count.
//! - [`reverse_one`](ReverseEngine::reverse_one) — selective first-order
//!   sweep over the entries a [`RelevanceIndex`](crate::RelevanceIndex)
//!   marks, followed by a targeted cleanup that restores the buffer's
//!   all-zero state.
//!
//! The buffer's zero-invariant at call boundaries is the central contract of
//! the selective path: `reverse_one` assumes all-zero on entry and
//! re-establishes it on return by clearing exactly the rows the visited
//! operations can have written. A full `reverse` leaves the buffer dirty
//! (caller-owned lifecycle); the engine tracks this and falls back to a full
//! reset the next time the selective path runs.
//!
//! Not thread-safe per instance: a sweep runs to completion and owns the
//! buffer exclusively while doing so. The tape and store are read-only and
//! may back any number of engine instances.

mod full;
mod one;
mod ops;

use crate::error::{Error, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode};
use crate::tape::Tape;
use crate::taylor::TaylorStore;

/// Reverse sweep engine over one tape and one forward coefficient store.
#[derive(Debug)]
pub struct ReverseEngine<'t, F: Float> {
    tape: &'t Tape<F>,
    store: &'t TaylorStore<F>,
    /// Adjoint scratch, `num_entries * p` entries, row-major by tape entry.
    partial: Vec<F>,
    /// True when `partial` is known to be all-zero with `p = 1` layout.
    partial_clean: bool,
    /// Scan-and-log fallback after selective cleanup (see `reverse_one`).
    check_hygiene: bool,
}

impl<'t, F: Float> ReverseEngine<'t, F> {
    /// Create an engine over a tape and the coefficient store produced by a
    /// forward sweep of that same tape.
    pub fn new(tape: &'t Tape<F>, store: &'t TaylorStore<F>) -> Result<Self> {
        if store.num_entries() != tape.num_entries() {
            return Err(Error::StoreMismatch {
                got: store.num_entries(),
                expected: tape.num_entries(),
            });
        }
        Ok(ReverseEngine {
            tape,
            store,
            partial: Vec::new(),
            partial_clean: false,
            check_hygiene: true,
        })
    }

    /// Enable or disable the post-cleanup hygiene scan of `reverse_one`.
    ///
    /// The scan costs one pass over the whole buffer, which cancels the
    /// sparse sweep's advantage on large tapes with small relevant sets.
    /// It is on by default; debug builds assert regardless of this flag.
    pub fn set_hygiene_check(&mut self, enabled: bool) {
        self.check_hygiene = enabled;
    }

    /// True when every adjoint slot is zero.
    ///
    /// Diagnostic accessor: after any `reverse_one` call this must hold, and
    /// the test suite checks it directly.
    pub fn partial_is_zero(&self) -> bool {
        self.partial.iter().all(|v| *v == F::zero())
    }

    /// Resize the scratch buffer for `p` orders and zero it entirely.
    /// Marks the buffer dirty; the caller that restores the all-zero state
    /// is responsible for setting `partial_clean` back.
    fn prepare_partial(&mut self, p: usize) {
        let len = self.tape.num_entries() * p;
        self.partial.clear();
        self.partial.resize(len, F::zero());
        self.partial_clean = false;
    }

    /// Apply the reverse chain rule for the entry at `i`, accumulating into
    /// its operand rows. Structural slots and entries whose adjoint rows are
    /// all zero are skipped.
    fn accumulate_entry(&mut self, p: usize, i: usize) {
        let op = self.tape.opcode(i);
        match op {
            OpCode::Input | OpCode::Const | OpCode::Aux => return,
            _ => {}
        }

        // Zero-adjoint skipping: paired ops own two contiguous rows.
        let nr = opcode::num_results(op);
        let base = (i + 1 - nr) * p;
        if self.partial[base..(i + 1) * p]
            .iter()
            .all(|v| *v == F::zero())
        {
            return;
        }

        let [a, b] = self.tape.args(i);
        ops::accumulate(
            op,
            &mut self.partial,
            self.store,
            p,
            i,
            a as usize,
            b as usize,
        );
    }

    /// Reverse traversal over every tape entry.
    fn sweep_all(&mut self, p: usize) {
        for i in (0..self.tape.num_entries()).rev() {
            self.accumulate_entry(p, i);
        }
    }
}
