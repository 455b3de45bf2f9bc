//! Reverse-mode sweep engine for Taylor-coefficient tapes.
//!
//! A recorded [`Tape`] represents a function `F: R^n -> R^m` as a flat
//! sequence of elementary operations. [`Tape::forward_taylor`] evaluates the
//! tape on truncated Taylor series, producing a [`TaylorStore`] with `p`
//! coefficients per tape entry. [`ReverseEngine`] then propagates weighted
//! adjoints backward through the tape:
//!
//! - [`ReverseEngine::reverse`] — the full sweep: sensitivities of all
//!   dependent variables at once, at every order up to `p`.
//! - [`ReverseEngine::reverse_one`] — the selective sweep: the first-order
//!   gradient of a single dependent variable, visiting only the operations a
//!   precomputed [`RelevanceIndex`] marks as reachable, and restoring the
//!   shared scratch buffer to all-zero before returning.
//!
//! ```
//! use wombat::{OpCode, ReverseEngine, Tape};
//!
//! let mut tape = Tape::<f64>::new();
//! let x0 = tape.new_input(3.0);
//! let x1 = tape.new_input(4.0);
//! let t = tape.push_op(OpCode::Mul, x0, x1);
//! let y = tape.push_op(OpCode::Add, t, x0);
//! tape.set_outputs(&[y]).unwrap();
//!
//! let store = tape.forward(&[3.0, 4.0]).unwrap();
//! let mut engine = ReverseEngine::new(&tape, &store).unwrap();
//! let dw = engine.reverse(1, &[1.0]).unwrap();
//! assert!((dw[0] - 5.0).abs() < 1e-12); // d(x0*x1 + x0)/dx0 = x1 + 1
//! assert!((dw[1] - 3.0).abs() < 1e-12); // d(x0*x1 + x0)/dx1 = x0
//! ```

pub mod error;
pub mod float;
pub mod opcode;
pub mod relevance;
pub mod reverse;
pub mod tape;
pub mod taylor;

#[cfg(feature = "serde")]
mod serde_support;

pub use error::{Error, Result};
pub use float::Float;
pub use opcode::OpCode;
pub use relevance::RelevanceIndex;
pub use reverse::ReverseEngine;
pub use tape::Tape;
pub use taylor::TaylorStore;

/// Type alias for tapes over `f64`.
pub type Tape64 = Tape<f64>;
/// Type alias for tapes over `f32`.
pub type Tape32 = Tape<f32>;
