//! Flat operation tape: the recorded computation graph.
//!
//! Every scalar produced during recording — inputs, constants, intermediate
//! and dependent values — occupies one slot in a flat address space. Slots
//! are assigned once and never reused; after recording, the tape is
//! read-only. Operand references are plain indices into the same address
//! space, so the graph is an arena, not an object graph.

use crate::error::{Error, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode, UNUSED};

/// A recorded operation sequence for `F: R^n -> R^m`.
///
/// Stored as parallel arrays, one entry per tape slot: the opcode, the two
/// operand indices (`[arg0, arg1]`, with [`UNUSED`] in slot 1 for unary
/// ops), and the order-0 primal value observed at recording time.
#[derive(Debug)]
pub struct Tape<F: Float> {
    pub(crate) opcodes: Vec<OpCode>,
    pub(crate) arg_indices: Vec<[u32; 2]>,
    pub(crate) values: Vec<F>,
    /// Tape addresses of the independent variables, in declaration order.
    pub(crate) ind_taddr: Vec<u32>,
    /// Tape addresses of the dependent variables. Entries may alias.
    pub(crate) dep_taddr: Vec<u32>,
}

impl<F: Float> Tape<F> {
    /// Create an empty tape.
    pub fn new() -> Self {
        Tape {
            opcodes: Vec::new(),
            arg_indices: Vec::new(),
            values: Vec::new(),
            ind_taddr: Vec::new(),
            dep_taddr: Vec::new(),
        }
    }

    /// Create a tape with pre-allocated capacity.
    pub fn with_capacity(est_ops: usize) -> Self {
        Tape {
            opcodes: Vec::with_capacity(est_ops),
            arg_indices: Vec::with_capacity(est_ops),
            values: Vec::with_capacity(est_ops),
            ind_taddr: Vec::new(),
            dep_taddr: Vec::new(),
        }
    }

    /// Register a new independent variable. Returns its tape address.
    #[inline]
    pub fn new_input(&mut self, value: F) -> u32 {
        let idx = self.push_slot(OpCode::Input, [UNUSED, UNUSED], value);
        self.ind_taddr.push(idx);
        idx
    }

    /// Register a scalar constant. Returns its tape address.
    #[inline]
    pub fn push_const(&mut self, value: F) -> u32 {
        self.push_slot(OpCode::Const, [UNUSED, UNUSED], value)
    }

    /// Record an operation and evaluate its order-0 primal. Returns the
    /// address of the primary result slot.
    ///
    /// For unary ops pass anything as `arg1`; it is stored as [`UNUSED`].
    /// Paired ops ([`OpCode::Sin`] and friends) record their auxiliary slot
    /// immediately before the primary one.
    pub fn push_op(&mut self, op: OpCode, arg0: u32, arg1: u32) -> u32 {
        debug_assert!(
            !matches!(op, OpCode::Input | OpCode::Const | OpCode::Aux),
            "structural slots are recorded via new_input/push_const"
        );

        let a = self.values[arg0 as usize];
        let (args, b) = if opcode::is_binary(op) {
            ([arg0, arg1], self.values[arg1 as usize])
        } else {
            ([arg0, UNUSED], F::zero())
        };

        if opcode::num_results(op) == 2 {
            self.push_slot(OpCode::Aux, [arg0, UNUSED], opcode::eval_aux(op, a));
        }
        self.push_slot(op, args, opcode::eval(op, a, b))
    }

    #[inline]
    fn push_slot(&mut self, op: OpCode, args: [u32; 2], value: F) -> u32 {
        let idx = self.opcodes.len() as u32;
        self.opcodes.push(op);
        self.arg_indices.push(args);
        self.values.push(value);
        idx
    }

    /// Mark the dependent variables. Two entries may share an address
    /// (an output may equal another output).
    ///
    /// Addresses must refer to primary tape slots: out-of-range addresses
    /// and auxiliary slots of paired operations are rejected.
    pub fn set_outputs(&mut self, indices: &[u32]) -> Result<()> {
        for &i in indices {
            if i as usize >= self.opcodes.len() {
                return Err(Error::OutputOutOfRange {
                    addr: i,
                    entries: self.opcodes.len(),
                });
            }
            if self.opcodes[i as usize] == OpCode::Aux {
                return Err(Error::OutputIsAuxiliary { addr: i });
            }
        }
        self.dep_taddr = indices.to_vec();
        Ok(())
    }

    // ── Read-only traversal interface ──

    /// Total number of tape slots (the size of the variable address space).
    #[inline]
    pub fn num_entries(&self) -> usize {
        self.opcodes.len()
    }

    /// Number of independent variables `n`.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.ind_taddr.len()
    }

    /// Number of dependent variables `m`.
    #[inline]
    pub fn num_dependents(&self) -> usize {
        self.dep_taddr.len()
    }

    /// Opcode of the entry at `index`.
    #[inline]
    pub fn opcode(&self, index: usize) -> OpCode {
        self.opcodes[index]
    }

    /// Operand addresses of the entry at `index`.
    #[inline]
    pub fn args(&self, index: usize) -> [u32; 2] {
        self.arg_indices[index]
    }

    /// Order-0 primal recorded for the entry at `index`.
    #[inline]
    pub fn value(&self, index: usize) -> F {
        self.values[index]
    }

    /// Addresses of the independent variables, in declaration order.
    #[inline]
    pub fn independents(&self) -> &[u32] {
        &self.ind_taddr
    }

    /// Addresses of the dependent variables, in declaration order.
    #[inline]
    pub fn dependents(&self) -> &[u32] {
        &self.dep_taddr
    }

    /// Primal values of the dependent variables from recording time.
    pub fn output_values(&self) -> Vec<F> {
        self.dep_taddr
            .iter()
            .map(|&idx| self.values[idx as usize])
            .collect()
    }
}

impl<F: Float> Default for Tape<F> {
    fn default() -> Self {
        Self::new()
    }
}
