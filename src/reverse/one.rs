use crate::error::{Error, Result};
use crate::float::Float;
use crate::opcode;
use crate::relevance::RelevanceIndex;

impl<F: Float> super::ReverseEngine<'_, F> {
    /// Selective first-order reverse sweep for a single dependent variable.
    ///
    /// Seeds a unit adjoint at the dependent variable the `marking` was
    /// built for, propagates it backward through the marked entries only,
    /// and writes the gradient into `value`: `value[j] = d y_i / d x_j` for
    /// every independent position `j` in the marking's inverse index.
    /// Positions not in the inverse index are provably zero and are left
    /// untouched — pre-fill `value` accordingly.
    ///
    /// Work is proportional to the number of marked entries, not the tape
    /// size: after extraction, exactly the adjoint rows the marked
    /// operations can have written are zeroed again (one row per result
    /// slot, using each opcode's result count), which restores the
    /// buffer-wide zero invariant without a full reset.
    ///
    /// `p` must be `1`; the selective path is deliberately restricted to
    /// first-order adjoints.
    ///
    /// # Buffer hygiene
    ///
    /// The scratch buffer must be all-zero on entry and is all-zero on
    /// return. A leftover nonzero after cleanup means the marking missed an
    /// operation that was reached — a programming error, not an input
    /// error. Debug builds panic on it; release builds (with the default
    /// hygiene check enabled) log an error and reset the whole buffer so
    /// subsequent calls are not silently corrupted.
    pub fn reverse_one(
        &mut self,
        p: usize,
        marking: &RelevanceIndex,
        value: &mut [F],
    ) -> Result<()> {
        let n = self.tape.num_inputs();

        if p != 1 {
            return Err(Error::FirstOrderOnly { got: p });
        }
        if self.store.orders() < 1 {
            return Err(Error::InsufficientOrders {
                stored: self.store.orders(),
                required: 1,
            });
        }
        if value.len() != n {
            return Err(Error::ResultLength {
                got: value.len(),
                expected: n,
            });
        }
        if marking.num_entries() != self.tape.num_entries() {
            return Err(Error::MarkingMismatch {
                got: marking.num_entries(),
                expected: self.tape.num_entries(),
            });
        }

        // Establish the zero invariant. Clean from a previous selective
        // call: nothing to do. Dirty (fresh engine, or a full sweep ran in
        // between): pay for one full reset.
        let entries = self.tape.num_entries();
        if self.partial.len() != entries || !self.partial_clean {
            self.prepare_partial(1);
        } else {
            debug_assert!(self.partial_is_zero(), "scratch buffer dirty on entry");
        }
        self.partial_clean = false;

        // Seed a unit adjoint at the chosen dependent variable.
        self.partial[marking.dep_taddr() as usize] = F::one();

        // Propagate through the marked entries only, already in reverse
        // tape order.
        for &e in marking.relevant_entries() {
            self.accumulate_entry(1, e as usize);
        }

        // Extract before cleanup: the inverse index lists every independent
        // position the sweep can have reached.
        for &j in marking.live_independents() {
            let addr = self.tape.independents()[j as usize] as usize;
            value[j as usize] = self.partial[addr];
        }

        // Targeted cleanup: zero the result rows of every marked entry.
        // Operands of marked entries are marked themselves, so this covers
        // every row the sweep wrote.
        for &e in marking.relevant_entries() {
            let i = e as usize;
            for r in 0..opcode::num_results(self.tape.opcode(i)) {
                self.partial[i - r] = F::zero();
            }
        }
        self.partial_clean = true;

        self.verify_partial_clean();
        Ok(())
    }

    /// Post-cleanup hygiene scan. Debug builds assert; release builds log
    /// and fall back to a full reset when the check is enabled.
    fn verify_partial_clean(&mut self) {
        if !(cfg!(debug_assertions) || self.check_hygiene) {
            return;
        }
        let leftovers = self
            .partial
            .iter()
            .filter(|v| **v != F::zero())
            .count();
        if leftovers == 0 {
            return;
        }
        debug_assert_eq!(
            leftovers, 0,
            "relevance marking incomplete: {leftovers} adjoint slot(s) not cleared"
        );
        log::error!(
            "relevance marking incomplete: {leftovers} adjoint slot(s) survived cleanup; \
             resetting scratch buffer"
        );
        for v in &mut self.partial {
            *v = F::zero();
        }
        self.partial_clean = true;
    }
}
