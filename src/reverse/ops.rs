//! Per-opcode reverse Taylor accumulation.
//!
//! Each routine is the exact transpose of the corresponding forward
//! recurrence in [`crate::taylor`]: given the adjoint rows of an operation's
//! result slot(s), it adds the chain-rule contribution into the operand
//! rows, for every order `0..p`.
//!
//! Rows live in one flat `partial` buffer with stride `p`; forward
//! coefficients come from the read-only store. Several routines scale
//! `pz[j]` in place while walking orders downward — contributions only ever
//! flow from higher orders to lower ones, so nothing reads a scaled slot as
//! an unscaled one.

use crate::float::Float;
use crate::opcode::{self, OpCode};
use crate::taylor::TaylorStore;

/// Dispatch the reverse accumulation for one tape entry.
///
/// `z` is the primary result slot; for paired ops the auxiliary row is
/// `z - 1`. `y` is only meaningful for binary opcodes.
pub(super) fn accumulate<F: Float>(
    op: OpCode,
    partial: &mut [F],
    store: &TaylorStore<F>,
    p: usize,
    z: usize,
    x: usize,
    y: usize,
) {
    match op {
        OpCode::Input | OpCode::Const | OpCode::Aux => {
            unreachable!("structural slots are filtered before dispatch")
        }

        OpCode::Add => {
            for k in 0..p {
                let pzk = partial[z * p + k];
                partial[x * p + k] = partial[x * p + k] + pzk;
                partial[y * p + k] = partial[y * p + k] + pzk;
            }
        }
        OpCode::Sub => {
            for k in 0..p {
                let pzk = partial[z * p + k];
                partial[x * p + k] = partial[x * p + k] + pzk;
                partial[y * p + k] = partial[y * p + k] - pzk;
            }
        }
        OpCode::Mul => reverse_mul(partial, store, p, z, x, y),
        OpCode::Div => reverse_div(partial, store, p, z, x, y),

        OpCode::Neg => {
            for k in 0..p {
                partial[x * p + k] = partial[x * p + k] - partial[z * p + k];
            }
        }
        OpCode::Abs => {
            let s = opcode::abs_sign(store.coeff(x, 0));
            for k in 0..p {
                partial[x * p + k] = partial[x * p + k] + s * partial[z * p + k];
            }
        }
        OpCode::Sqrt => reverse_sqrt(partial, store, p, z, x),
        OpCode::Exp => reverse_exp(partial, store, p, z, x),
        OpCode::Ln => reverse_ln(partial, store, p, z, x),

        // Paired slots: sine-like and cosine-like rows per opcode.
        OpCode::Sin => reverse_sincos(partial, store, p, z, z - 1, x, false),
        OpCode::Cos => reverse_sincos(partial, store, p, z - 1, z, x, false),
        OpCode::Sinh => reverse_sincos(partial, store, p, z, z - 1, x, true),
        OpCode::Cosh => reverse_sincos(partial, store, p, z - 1, z, x, true),
    }
}

/// Transpose of `z_k = sum_{j<=k} x_j * y_{k-j}`.
fn reverse_mul<F: Float>(
    partial: &mut [F],
    store: &TaylorStore<F>,
    p: usize,
    z: usize,
    x: usize,
    y: usize,
) {
    for j in (0..p).rev() {
        let pzj = partial[z * p + j];
        if pzj == F::zero() {
            continue;
        }
        for k in 0..=j {
            partial[x * p + k] = partial[x * p + k] + pzj * store.coeff(y, j - k);
            partial[y * p + k] = partial[y * p + k] + pzj * store.coeff(x, j - k);
        }
    }
}

/// Transpose of `z_k = (x_k - sum_{1<=j<=k} y_j * z_{k-j}) / y_0`.
fn reverse_div<F: Float>(
    partial: &mut [F],
    store: &TaylorStore<F>,
    p: usize,
    z: usize,
    x: usize,
    y: usize,
) {
    let inv_y0 = F::one() / store.coeff(y, 0);
    for j in (0..p).rev() {
        let pzj = partial[z * p + j] * inv_y0;
        partial[z * p + j] = pzj;
        partial[x * p + j] = partial[x * p + j] + pzj;
        for k in 1..=j {
            partial[z * p + j - k] = partial[z * p + j - k] - pzj * store.coeff(y, k);
            partial[y * p + k] = partial[y * p + k] - pzj * store.coeff(z, j - k);
        }
        partial[y * p] = partial[y * p] - pzj * store.coeff(z, j);
    }
}

/// Transpose of `z_k = (x_k - sum_{1<=j<k} z_j * z_{k-j}) / (2 z_0)`.
fn reverse_sqrt<F: Float>(partial: &mut [F], store: &TaylorStore<F>, p: usize, z: usize, x: usize) {
    let half = F::from(0.5).unwrap();
    let inv_z0 = F::one() / store.coeff(z, 0);
    for j in (1..p).rev() {
        let pzj = partial[z * p + j] * inv_z0;
        partial[z * p + j] = pzj;
        partial[z * p] = partial[z * p] - pzj * store.coeff(z, j);
        partial[x * p + j] = partial[x * p + j] + pzj * half;
        for k in 1..j {
            partial[z * p + k] = partial[z * p + k] - pzj * store.coeff(z, j - k);
        }
    }
    partial[x * p] = partial[x * p] + partial[z * p] * inv_z0 * half;
}

/// Transpose of `z_k = (1/k) sum_{1<=j<=k} j * x_j * z_{k-j}`.
fn reverse_exp<F: Float>(partial: &mut [F], store: &TaylorStore<F>, p: usize, z: usize, x: usize) {
    for j in (1..p).rev() {
        let pzj = partial[z * p + j] / F::from(j).unwrap();
        partial[z * p + j] = pzj;
        for k in 1..=j {
            let fk = F::from(k).unwrap();
            partial[x * p + k] = partial[x * p + k] + pzj * fk * store.coeff(z, j - k);
            partial[z * p + j - k] = partial[z * p + j - k] + pzj * fk * store.coeff(x, k);
        }
    }
    partial[x * p] = partial[x * p] + partial[z * p] * store.coeff(z, 0);
}

/// Transpose of `z_k = (x_k - (1/k) sum_{1<=j<k} j * z_j * x_{k-j}) / x_0`.
fn reverse_ln<F: Float>(partial: &mut [F], store: &TaylorStore<F>, p: usize, z: usize, x: usize) {
    let inv_x0 = F::one() / store.coeff(x, 0);
    for j in (1..p).rev() {
        let pzj = partial[z * p + j] * inv_x0;
        partial[z * p + j] = pzj;
        partial[x * p] = partial[x * p] - pzj * store.coeff(z, j);
        partial[x * p + j] = partial[x * p + j] + pzj;
        let fj = F::from(j).unwrap();
        for k in 1..j {
            let r = F::from(k).unwrap() / fj;
            partial[z * p + k] = partial[z * p + k] - pzj * r * store.coeff(x, j - k);
            partial[x * p + j - k] = partial[x * p + j - k] - pzj * r * store.coeff(z, k);
        }
    }
    partial[x * p] = partial[x * p] + partial[z * p] * inv_x0;
}

/// Transpose of the coupled sine/cosine recurrence. `s`/`cs` are the
/// sine-like and cosine-like rows; signs flip for the hyperbolic pair.
fn reverse_sincos<F: Float>(
    partial: &mut [F],
    store: &TaylorStore<F>,
    p: usize,
    s: usize,
    cs: usize,
    x: usize,
    hyper: bool,
) {
    for j in (1..p).rev() {
        let fj = F::from(j).unwrap();
        let psj = partial[s * p + j] / fj;
        partial[s * p + j] = psj;
        let pcj = partial[cs * p + j] / fj;
        partial[cs * p + j] = pcj;

        for k in 1..=j {
            let fk = F::from(k).unwrap();
            let xk = store.coeff(x, k);
            let s_jk = store.coeff(s, j - k);
            let c_jk = store.coeff(cs, j - k);

            partial[x * p + k] = partial[x * p + k] + psj * fk * c_jk;
            partial[cs * p + j - k] = partial[cs * p + j - k] + psj * fk * xk;
            if hyper {
                partial[x * p + k] = partial[x * p + k] + pcj * fk * s_jk;
                partial[s * p + j - k] = partial[s * p + j - k] + pcj * fk * xk;
            } else {
                partial[x * p + k] = partial[x * p + k] - pcj * fk * s_jk;
                partial[s * p + j - k] = partial[s * p + j - k] - pcj * fk * xk;
            }
        }
    }
    partial[x * p] = partial[x * p] + partial[s * p] * store.coeff(cs, 0);
    if hyper {
        partial[x * p] = partial[x * p] + partial[cs * p] * store.coeff(s, 0);
    } else {
        partial[x * p] = partial[x * p] - partial[cs * p] * store.coeff(s, 0);
    }
}
