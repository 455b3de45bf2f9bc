//! Error type for checked sweep preconditions.
//!
//! Every variant corresponds to a precondition that is verified before any
//! buffer mutation takes place. Sweeps are deterministic, so none of these
//! failures is transient.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Precondition violations surfaced by the forward and reverse sweeps.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Weight vector length is neither `m` nor `m * p`.
    #[error("weight vector has length {got}, expected {m} (per output) or {m_times_p} (per output and order)")]
    WeightLength {
        got: usize,
        m: usize,
        m_times_p: usize,
    },

    /// The order count `p` must be at least one.
    #[error("order count must be greater than zero")]
    ZeroOrderCount,

    /// The forward coefficient store does not cover the requested order.
    #[error("forward store holds {stored} Taylor coefficient(s) per variable, but {required} are required")]
    InsufficientOrders { stored: usize, required: usize },

    /// The selective sweep only supports first-order adjoints.
    #[error("selective reverse sweep supports first-order adjoints only, got order count {got}")]
    FirstOrderOnly { got: usize },

    /// Dependent variable index out of range.
    #[error("dependent variable index {index} out of range, tape has {count} dependent(s)")]
    DependentOutOfRange { index: usize, count: usize },

    /// Input coefficient slice has the wrong length.
    #[error("input coefficients have length {got}, expected {expected} (n inputs x p orders)")]
    InputLength { got: usize, expected: usize },

    /// Caller-supplied result buffer has the wrong length.
    #[error("result buffer has length {got}, expected {expected} (one entry per independent variable)")]
    ResultLength { got: usize, expected: usize },

    /// Forward store was produced from a differently-shaped tape.
    #[error("forward store covers {got} tape entries, tape has {expected}")]
    StoreMismatch { got: usize, expected: usize },

    /// Relevance marking was built for a differently-shaped tape.
    #[error("relevance marking covers {got} tape entries, tape has {expected}")]
    MarkingMismatch { got: usize, expected: usize },

    /// Dependent address does not refer to a tape entry.
    #[error("output address {addr} out of range, tape has {entries} entries")]
    OutputOutOfRange { addr: u32, entries: usize },

    /// Dependent address points at the auxiliary slot of a paired operation.
    #[error("output address {addr} is an auxiliary result slot")]
    OutputIsAuxiliary { addr: u32 },
}
