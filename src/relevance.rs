//! Relevance marking for selective reverse sweeps.
//!
//! A [`RelevanceIndex`] records, for one chosen dependent variable, the set
//! of tape entries reachable backward from it — the only operations whose
//! adjoints can be nonzero when that single output is seeded. It also keeps
//! the inverse map back to independent-variable positions, so extraction
//! touches only the gradient entries that can be nonzero.
//!
//! Built once per dependent variable, reused read-only across many
//! [`crate::ReverseEngine::reverse_one`] calls.

use crate::error::{Error, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode};
use crate::tape::Tape;

/// Backward-reachability marking for a single dependent variable.
#[derive(Debug)]
pub struct RelevanceIndex {
    dep_index: usize,
    dep_taddr: u32,
    num_entries: usize,
    /// Marked entries (primary slots only), in reverse tape order — the
    /// traversal order of the selective sweep.
    relevant: Vec<u32>,
    /// Positions into the tape's independent list that are reachable.
    live_independents: Vec<u32>,
}

impl RelevanceIndex {
    /// Mark every tape entry that influences dependent variable `dep_index`.
    ///
    /// A single descending pass suffices: operands always precede results,
    /// so marking flows strictly backward.
    pub fn for_dependent<F: Float>(tape: &Tape<F>, dep_index: usize) -> Result<Self> {
        let m = tape.num_dependents();
        if dep_index >= m {
            return Err(Error::DependentOutOfRange {
                index: dep_index,
                count: m,
            });
        }
        let dep_taddr = tape.dependents()[dep_index];

        let entries = tape.num_entries();
        let mut marked = vec![false; entries];
        marked[dep_taddr as usize] = true;

        let mut relevant = Vec::new();
        for i in (0..entries).rev() {
            if !marked[i] {
                continue;
            }
            let op = tape.opcode(i);
            debug_assert_ne!(op, OpCode::Aux, "operands never reference aux slots");
            match op {
                OpCode::Input | OpCode::Const => {}
                _ => {
                    let [a, b] = tape.args(i);
                    marked[a as usize] = true;
                    if opcode::is_binary(op) {
                        marked[b as usize] = true;
                    }
                }
            }
            relevant.push(i as u32);
        }

        let live_independents = tape
            .independents()
            .iter()
            .enumerate()
            .filter(|&(_, &addr)| marked[addr as usize])
            .map(|(j, _)| j as u32)
            .collect();

        Ok(RelevanceIndex {
            dep_index,
            dep_taddr,
            num_entries: entries,
            relevant,
            live_independents,
        })
    }

    /// Position of the marked dependent variable in the tape's output list.
    #[inline]
    pub fn dep_index(&self) -> usize {
        self.dep_index
    }

    /// Tape address of the marked dependent variable.
    #[inline]
    pub fn dep_taddr(&self) -> u32 {
        self.dep_taddr
    }

    /// Size of the tape this marking was built for.
    #[inline]
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    /// Marked entries in reverse tape order.
    #[inline]
    pub fn relevant_entries(&self) -> &[u32] {
        &self.relevant
    }

    /// Number of marked entries.
    #[inline]
    pub fn num_relevant(&self) -> usize {
        self.relevant.len()
    }

    /// Positions (into the independent list) of reachable inputs — the only
    /// gradient entries the selective sweep writes.
    #[inline]
    pub fn live_independents(&self) -> &[u32] {
        &self.live_independents
    }
}
