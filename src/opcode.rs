//! Opcodes for the recorded tape.
//!
//! Each opcode is one elementary operation. Order-0 evaluation lives here;
//! the per-order Taylor recurrences live with the sweeps that use them
//! ([`crate::taylor`] for forward, [`crate::reverse`] for reverse).

use num_traits::Float;

/// Sentinel used in `arg_indices[1]` for unary ops (second slot unused).
pub const UNUSED: u32 = u32::MAX;

/// Elementary operation codes.
///
/// The four circular/hyperbolic ops record **two** consecutive tape slots:
/// the auxiliary half first (tagged [`OpCode::Aux`]), the primary result
/// second. `sin` carries its cosine alongside (and vice versa) because the
/// Taylor recurrences for one require the coefficients of the other.
/// Operand indices always reference primary slots.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpCode {
    // ── Structural ──
    /// Independent variable (leaf node).
    Input,
    /// Scalar constant.
    Const,
    /// Auxiliary result slot of a paired operation. Never dispatched on its
    /// own; the primary slot that follows it owns both adjoint rows.
    Aux,

    // ── Binary arithmetic ──
    Add,
    Sub,
    Mul,
    Div,

    // ── Unary ──
    Neg,
    Abs,
    Sqrt,
    Exp,
    Ln,

    // ── Paired (two result slots) ──
    Sin,
    Cos,
    Sinh,
    Cosh,
}

/// Number of contiguous tape slots the operation writes.
///
/// This is what the selective sweep's cleanup pass uses to know how many
/// adjoint rows to zero per visited operation.
#[inline]
pub fn num_results(op: OpCode) -> usize {
    match op {
        OpCode::Sin | OpCode::Cos | OpCode::Sinh | OpCode::Cosh => 2,
        _ => 1,
    }
}

/// Returns true for opcodes that take two operands.
#[inline]
pub fn is_binary(op: OpCode) -> bool {
    matches!(op, OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div)
}

/// Order-0 evaluation of the primary result, used during recording.
///
/// For unary ops `b` is ignored. `Input`, `Const`, and `Aux` slots carry
/// their value directly and are never evaluated through here.
#[inline]
pub fn eval<T: Float>(op: OpCode, a: T, b: T) -> T {
    match op {
        OpCode::Input | OpCode::Const | OpCode::Aux => {
            unreachable!("structural slots are not evaluated")
        }

        OpCode::Add => a + b,
        OpCode::Sub => a - b,
        OpCode::Mul => a * b,
        OpCode::Div => a / b,

        OpCode::Neg => -a,
        OpCode::Abs => a.abs(),
        OpCode::Sqrt => a.sqrt(),
        OpCode::Exp => a.exp(),
        OpCode::Ln => a.ln(),

        OpCode::Sin => a.sin(),
        OpCode::Cos => a.cos(),
        OpCode::Sinh => a.sinh(),
        OpCode::Cosh => a.cosh(),
    }
}

/// Order-0 value of the auxiliary slot for paired ops.
#[inline]
pub fn eval_aux<T: Float>(op: OpCode, a: T) -> T {
    match op {
        OpCode::Sin => a.cos(),
        OpCode::Cos => a.sin(),
        OpCode::Sinh => a.cosh(),
        OpCode::Cosh => a.sinh(),
        _ => unreachable!("{op:?} has a single result slot"),
    }
}

/// Sign convention used for `Abs`: derivative is `sign(x)` with
/// `sign(0) = 0` (the subgradient midpoint at the kink).
#[inline]
pub fn abs_sign<T: Float>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}
