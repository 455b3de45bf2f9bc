//! Forward Taylor sweep and the coefficient store it produces.
//!
//! [`Tape::forward_taylor`] evaluates every tape entry on truncated Taylor
//! series of length `p`, given `p` coefficients per independent variable.
//! The resulting [`TaylorStore`] is the read-only input of the reverse
//! sweeps: the per-order chain-rule formulas need the forward coefficients
//! of each operation's operands and results.
//!
//! Coefficients are scaled Taylor coefficients: entry `k` of a row is
//! `f^(k)(0) / k!` with respect to the expansion parameter.

use crate::error::{Error, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode};
use crate::tape::Tape;

/// Dense per-variable Taylor coefficients, row-major by tape entry.
///
/// Produced by [`Tape::forward_taylor`]; consumed read-only by
/// [`crate::ReverseEngine`].
#[derive(Debug)]
pub struct TaylorStore<F: Float> {
    coeff: Vec<F>,
    orders: usize,
    num_entries: usize,
}

impl<F: Float> TaylorStore<F> {
    /// Number of Taylor coefficients stored per variable.
    #[inline]
    pub fn orders(&self) -> usize {
        self.orders
    }

    /// Number of tape entries covered.
    #[inline]
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    /// The order-`k` coefficient of the variable at tape address `var`.
    #[inline]
    pub fn coeff(&self, var: usize, k: usize) -> F {
        self.coeff[var * self.orders + k]
    }

    /// All stored coefficients of one variable, lowest order first.
    #[inline]
    pub fn row(&self, var: usize) -> &[F] {
        &self.coeff[var * self.orders..(var + 1) * self.orders]
    }
}

impl<F: Float> Tape<F> {
    /// Order-0 forward sweep: plain re-evaluation at new input values.
    ///
    /// Equivalent to [`forward_taylor`](Self::forward_taylor) with `p = 1`.
    pub fn forward(&self, x: &[F]) -> Result<TaylorStore<F>> {
        self.forward_taylor(1, x)
    }

    /// Forward Taylor sweep to order `p - 1`.
    ///
    /// `x` supplies `p` coefficients per independent variable, row-major:
    /// `x[j * p + k]` is the order-`k` coefficient of input `j`. Returns the
    /// coefficient store for every tape entry.
    pub fn forward_taylor(&self, p: usize, x: &[F]) -> Result<TaylorStore<F>> {
        if p == 0 {
            return Err(Error::ZeroOrderCount);
        }
        let n = self.num_inputs();
        if x.len() != n * p {
            return Err(Error::InputLength {
                got: x.len(),
                expected: n * p,
            });
        }

        let entries = self.num_entries();
        let mut c = vec![F::zero(); entries * p];

        for (j, &addr) in self.ind_taddr.iter().enumerate() {
            let row = addr as usize * p;
            c[row..row + p].copy_from_slice(&x[j * p..(j + 1) * p]);
        }

        for i in 0..entries {
            let op = self.opcodes[i];
            let [a, b] = self.arg_indices[i];
            let (ax, bx) = (a as usize, b as usize);
            match op {
                // Input rows are seeded above; Aux rows are written by the
                // primary slot that follows them.
                OpCode::Input | OpCode::Aux => {}
                OpCode::Const => c[i * p] = self.values[i],

                OpCode::Add => forward_addsub(&mut c, p, i, ax, bx, false),
                OpCode::Sub => forward_addsub(&mut c, p, i, ax, bx, true),
                OpCode::Mul => forward_mul(&mut c, p, i, ax, bx),
                OpCode::Div => forward_div(&mut c, p, i, ax, bx),

                OpCode::Neg => {
                    for k in 0..p {
                        c[i * p + k] = -c[ax * p + k];
                    }
                }
                OpCode::Abs => {
                    let s = opcode::abs_sign(c[ax * p]);
                    for k in 0..p {
                        c[i * p + k] = s * c[ax * p + k];
                    }
                }
                OpCode::Sqrt => forward_sqrt(&mut c, p, i, ax),
                OpCode::Exp => forward_exp(&mut c, p, i, ax),
                OpCode::Ln => forward_ln(&mut c, p, i, ax),

                // Paired slots: primary at i, auxiliary at i - 1.
                OpCode::Sin => forward_sincos(&mut c, p, i, i - 1, ax, false),
                OpCode::Cos => forward_sincos(&mut c, p, i - 1, i, ax, false),
                OpCode::Sinh => forward_sincos(&mut c, p, i, i - 1, ax, true),
                OpCode::Cosh => forward_sincos(&mut c, p, i - 1, i, ax, true),
            }
        }

        Ok(TaylorStore {
            coeff: c,
            orders: p,
            num_entries: entries,
        })
    }
}

// ── Per-opcode forward recurrences ──
//
// All rows live in one flat buffer with stride `p`; `z` is the result row,
// `x`/`y` the operand rows. Operand rows always precede the result row.

fn forward_addsub<F: Float>(c: &mut [F], p: usize, z: usize, x: usize, y: usize, sub: bool) {
    for k in 0..p {
        let yk = c[y * p + k];
        c[z * p + k] = if sub {
            c[x * p + k] - yk
        } else {
            c[x * p + k] + yk
        };
    }
}

/// `z_k = sum_{j<=k} x_j * y_{k-j}`
fn forward_mul<F: Float>(c: &mut [F], p: usize, z: usize, x: usize, y: usize) {
    for k in 0..p {
        let mut acc = F::zero();
        for j in 0..=k {
            acc = acc + c[x * p + j] * c[y * p + k - j];
        }
        c[z * p + k] = acc;
    }
}

/// `z_k = (x_k - sum_{1<=j<=k} y_j * z_{k-j}) / y_0`
fn forward_div<F: Float>(c: &mut [F], p: usize, z: usize, x: usize, y: usize) {
    let inv_y0 = F::one() / c[y * p];
    for k in 0..p {
        let mut acc = c[x * p + k];
        for j in 1..=k {
            acc = acc - c[y * p + j] * c[z * p + k - j];
        }
        c[z * p + k] = acc * inv_y0;
    }
}

/// `z_0 = sqrt(x_0)`, `z_k = (x_k - sum_{1<=j<k} z_j * z_{k-j}) / (2 z_0)`
fn forward_sqrt<F: Float>(c: &mut [F], p: usize, z: usize, x: usize) {
    c[z * p] = c[x * p].sqrt();
    if p == 1 {
        return;
    }
    let half = F::from(0.5).unwrap();
    let inv_z0 = F::one() / c[z * p];
    for k in 1..p {
        let mut acc = c[x * p + k];
        for j in 1..k {
            acc = acc - c[z * p + j] * c[z * p + k - j];
        }
        c[z * p + k] = acc * inv_z0 * half;
    }
}

/// `z_0 = exp(x_0)`, `z_k = (1/k) sum_{1<=j<=k} j * x_j * z_{k-j}`
fn forward_exp<F: Float>(c: &mut [F], p: usize, z: usize, x: usize) {
    c[z * p] = c[x * p].exp();
    for k in 1..p {
        let mut acc = F::zero();
        for j in 1..=k {
            acc = acc + F::from(j).unwrap() * c[x * p + j] * c[z * p + k - j];
        }
        c[z * p + k] = acc / F::from(k).unwrap();
    }
}

/// `z_0 = ln(x_0)`, `z_k = (x_k - (1/k) sum_{1<=j<k} j * z_j * x_{k-j}) / x_0`
fn forward_ln<F: Float>(c: &mut [F], p: usize, z: usize, x: usize) {
    c[z * p] = c[x * p].ln();
    if p == 1 {
        return;
    }
    let inv_x0 = F::one() / c[x * p];
    for k in 1..p {
        let mut acc = F::zero();
        for j in 1..k {
            acc = acc + F::from(j).unwrap() * c[z * p + j] * c[x * p + k - j];
        }
        c[z * p + k] = (c[x * p + k] - acc / F::from(k).unwrap()) * inv_x0;
    }
}

/// Coupled sine/cosine recurrence. `s`/`cs` are the sine-like and
/// cosine-like rows (whichever of the two is primary is the caller's
/// concern):
///
/// `s_k = (1/k) sum j * x_j * cs_{k-j}`,
/// `cs_k = -/+ (1/k) sum j * x_j * s_{k-j}` (minus circular, plus hyperbolic).
fn forward_sincos<F: Float>(c: &mut [F], p: usize, s: usize, cs: usize, x: usize, hyper: bool) {
    let x0 = c[x * p];
    if hyper {
        c[s * p] = x0.sinh();
        c[cs * p] = x0.cosh();
    } else {
        c[s * p] = x0.sin();
        c[cs * p] = x0.cos();
    }
    for k in 1..p {
        let mut s_acc = F::zero();
        let mut c_acc = F::zero();
        for j in 1..=k {
            let fj = F::from(j).unwrap();
            s_acc = s_acc + fj * c[x * p + j] * c[cs * p + k - j];
            c_acc = c_acc + fj * c[x * p + j] * c[s * p + k - j];
        }
        let fk = F::from(k).unwrap();
        c[s * p + k] = s_acc / fk;
        c[cs * p + k] = if hyper { c_acc / fk } else { -(c_acc / fk) };
    }
}
