use approx::assert_relative_eq;
use wombat::{Error, OpCode, ReverseEngine, Tape};

/// Tape for `y = x0 * x1 + x0`, the running example: returns (tape, y).
fn product_plus_tape(x0: f64, x1: f64) -> (Tape<f64>, u32) {
    let mut tape = Tape::new();
    let a = tape.new_input(x0);
    let b = tape.new_input(x1);
    let t = tape.push_op(OpCode::Mul, a, b);
    let y = tape.push_op(OpCode::Add, t, a);
    tape.set_outputs(&[y]).unwrap();
    (tape, y)
}

#[test]
fn end_to_end_product_plus() {
    let (tape, y) = product_plus_tape(3.0, 4.0);
    let store = tape.forward(&[3.0, 4.0]).unwrap();
    assert_relative_eq!(store.coeff(y as usize, 0), 15.0);

    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(1, &[1.0]).unwrap();
    assert_eq!(dw.len(), 2);
    assert_relative_eq!(dw[0], 5.0); // x1 + 1
    assert_relative_eq!(dw[1], 3.0); // x0
}

#[test]
fn aliased_outputs_sum_their_weights() {
    // Both dependent entries point at the same tape address; seeding must
    // accumulate, so the gradient scales by w0 + w1.
    let (mut tape, y) = product_plus_tape(3.0, 4.0);
    tape.set_outputs(&[y, y]).unwrap();
    let store = tape.forward(&[3.0, 4.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();

    let dw = engine.reverse(1, &[0.25, 0.75]).unwrap();
    assert_relative_eq!(dw[0], 5.0);
    assert_relative_eq!(dw[1], 3.0);

    let dw = engine.reverse(1, &[2.0, 3.0]).unwrap();
    assert_relative_eq!(dw[0], 25.0);
    assert_relative_eq!(dw[1], 15.0);
}

#[test]
fn aliased_outputs_accumulate_in_long_form_too() {
    // y = x0 * x1 recorded once, exposed as two aliased outputs, p = 2.
    // Long-form seeds sum per order: s_k = w[0*2+k] + w[1*2+k].
    // With a = (3, 1), b = (4, 0):
    //   dW/da = (s1*b1 + s0*b0, s1*b0) = (4*s0, 4*s1)
    //   dW/db = (s1*a1 + s0*a0, s1*a0) = (s1 + 3*s0, 3*s1)
    let mut tape = Tape::new();
    let a = tape.new_input(3.0);
    let b = tape.new_input(4.0);
    let y = tape.push_op(OpCode::Mul, a, b);
    tape.set_outputs(&[y, y]).unwrap();

    let store = tape.forward_taylor(2, &[3.0, 1.0, 4.0, 0.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();

    let w = [0.5, 2.0, 1.5, 3.0]; // s0 = 2, s1 = 5
    let dw = engine.reverse(2, &w).unwrap();
    assert_relative_eq!(dw[0], 8.0); // 4 * s0
    assert_relative_eq!(dw[1], 20.0); // 4 * s1
    assert_relative_eq!(dw[2], 11.0); // s1 + 3 * s0
    assert_relative_eq!(dw[3], 15.0); // 3 * s1
}

#[test]
fn reverse_identity_round_trip() {
    // Short form seeded at order p-1 must agree with a one-hot long form,
    // modulo the order flip the identity theorem prescribes:
    //   short[j*p + k] == long[j*p + (p-1-k)].
    let mut tape = Tape::new();
    let a = tape.new_input(1.3);
    let b = tape.new_input(0.7);
    let t = tape.push_op(OpCode::Mul, a, b);
    let s = tape.push_op(OpCode::Sin, t, 0);
    let e = tape.push_op(OpCode::Exp, a, 0);
    let y = tape.push_op(OpCode::Add, s, e);
    tape.set_outputs(&[y]).unwrap();

    let p = 3;
    let x = [1.3, 1.0, 0.0, 0.7, 0.5, 0.0];
    let store = tape.forward_taylor(p, &x).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();

    let short = engine.reverse(p, &[1.0]).unwrap();
    let long = engine.reverse(p, &[0.0, 0.0, 1.0]).unwrap();

    for j in 0..2 {
        for k in 0..p {
            assert_relative_eq!(
                short[j * p + k],
                long[j * p + (p - 1 - k)],
                max_relative = 1e-13
            );
        }
    }
}

#[test]
fn higher_order_exp_sensitivities() {
    // y = exp(x), x(t) = x0 + t, p = 3. The store holds
    // y = (e, e, e/2) with e = exp(x0), and the short-form results are
    //   dw[k] = d y_k / d x0 = (e, e, e/2).
    let x0 = 0.4_f64;
    let e = x0.exp();

    let mut tape = Tape::new();
    let x = tape.new_input(x0);
    let y = tape.push_op(OpCode::Exp, x, 0);
    tape.set_outputs(&[y]).unwrap();

    let store = tape.forward_taylor(3, &[x0, 1.0, 0.0]).unwrap();
    assert_relative_eq!(store.coeff(y as usize, 0), e, max_relative = 1e-14);
    assert_relative_eq!(store.coeff(y as usize, 1), e, max_relative = 1e-14);
    assert_relative_eq!(store.coeff(y as usize, 2), e / 2.0, max_relative = 1e-14);

    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(3, &[1.0]).unwrap();
    assert_relative_eq!(dw[0], e, max_relative = 1e-13);
    assert_relative_eq!(dw[1], e, max_relative = 1e-13);
    assert_relative_eq!(dw[2], e / 2.0, max_relative = 1e-13);
}

#[test]
fn higher_order_mul_matches_coefficient_algebra() {
    // y = a * b at p = 2 with a = (a0, a1), b = (b0, b1):
    //   y1 = a0*b1 + a1*b0, and short-form results are
    //   dw[j*2 + 0] = d y_0/d x_j0, dw[j*2 + 1] = d y_1/d x_j0.
    let (a0, a1, b0, b1) = (3.0, 0.5, 4.0, 0.25);
    let mut tape = Tape::new();
    let a = tape.new_input(a0);
    let b = tape.new_input(b0);
    let y = tape.push_op(OpCode::Mul, a, b);
    tape.set_outputs(&[y]).unwrap();

    let store = tape.forward_taylor(2, &[a0, a1, b0, b1]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(2, &[1.0]).unwrap();

    assert_relative_eq!(dw[0], b0); // d y_0 / d a_0
    assert_relative_eq!(dw[1], b1); // d y_1 / d a_0
    assert_relative_eq!(dw[2], a0); // d y_0 / d b_0
    assert_relative_eq!(dw[3], a1); // d y_1 / d b_0
}

#[test]
fn higher_order_sin_sensitivities() {
    // y = sin(x), x(t) = x0 + t, p = 2:
    //   dw[0] = d y_0/d x0 = cos(x0), dw[1] = d y_1/d x0 = -sin(x0).
    let x0 = 1.1_f64;
    let mut tape = Tape::new();
    let x = tape.new_input(x0);
    let y = tape.push_op(OpCode::Sin, x, 0);
    tape.set_outputs(&[y]).unwrap();

    let store = tape.forward_taylor(2, &[x0, 1.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(2, &[1.0]).unwrap();
    assert_relative_eq!(dw[0], x0.cos(), max_relative = 1e-13);
    assert_relative_eq!(dw[1], -x0.sin(), max_relative = 1e-13);
}

#[test]
fn second_derivative_via_order_two_sweep() {
    // For a scalar f with x(t) = x0 + t, the order-1 output coefficient is
    // f'(x0), so the short-form p = 2 sweep returns
    //   dw[0] = f'(x0), dw[1] = f''(x0).
    fn f(x: f64) -> f64 {
        x.ln() * x.sqrt() / (1.0 + x)
    }

    let x0 = 1.9_f64;
    let mut tape = Tape::new();
    let x = tape.new_input(x0);
    let l = tape.push_op(OpCode::Ln, x, 0);
    let r = tape.push_op(OpCode::Sqrt, x, 0);
    let num = tape.push_op(OpCode::Mul, l, r);
    let one = tape.push_const(1.0);
    let den = tape.push_op(OpCode::Add, one, x);
    let y = tape.push_op(OpCode::Div, num, den);
    tape.set_outputs(&[y]).unwrap();

    let store = tape.forward_taylor(2, &[x0, 1.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(2, &[1.0]).unwrap();

    let h = 1e-4;
    let d1 = (f(x0 + h) - f(x0 - h)) / (2.0 * h);
    let d2 = (f(x0 + h) - 2.0 * f(x0) + f(x0 - h)) / (h * h);
    assert_relative_eq!(dw[0], d1, max_relative = 1e-7);
    assert_relative_eq!(dw[1], d2, max_relative = 1e-5);
}

/// Central finite difference for comparison.
fn finite_diff(f: impl Fn(f64, f64) -> f64, a: f64, b: f64) -> (f64, f64) {
    let h = 1e-6;
    (
        (f(a + h, b) - f(a - h, b)) / (2.0 * h),
        (f(a, b + h) - f(a, b - h)) / (2.0 * h),
    )
}

#[test]
fn gradient_matches_finite_differences_across_all_opcodes() {
    fn f(a: f64, b: f64) -> f64 {
        (a * b).sin() + (a / b).exp() + b.ln() * a.sqrt() - (a - b).abs() + a.cosh() - b.sinh()
            + (-a).cos()
    }

    let (av, bv) = (1.3, 0.7);
    let mut tape = Tape::new();
    let a = tape.new_input(av);
    let b = tape.new_input(bv);
    let t1 = tape.push_op(OpCode::Mul, a, b);
    let t2 = tape.push_op(OpCode::Sin, t1, 0);
    let t3 = tape.push_op(OpCode::Div, a, b);
    let t4 = tape.push_op(OpCode::Exp, t3, 0);
    let t5 = tape.push_op(OpCode::Ln, b, 0);
    let t6 = tape.push_op(OpCode::Sqrt, a, 0);
    let t7 = tape.push_op(OpCode::Mul, t5, t6);
    let t8 = tape.push_op(OpCode::Sub, a, b);
    let t9 = tape.push_op(OpCode::Abs, t8, 0);
    let t10 = tape.push_op(OpCode::Cosh, a, 0);
    let t11 = tape.push_op(OpCode::Sinh, b, 0);
    let t12 = tape.push_op(OpCode::Neg, a, 0);
    let t13 = tape.push_op(OpCode::Cos, t12, 0);

    let mut acc = tape.push_op(OpCode::Add, t2, t4);
    acc = tape.push_op(OpCode::Add, acc, t7);
    acc = tape.push_op(OpCode::Sub, acc, t9);
    acc = tape.push_op(OpCode::Add, acc, t10);
    acc = tape.push_op(OpCode::Sub, acc, t11);
    acc = tape.push_op(OpCode::Add, acc, t13);
    tape.set_outputs(&[acc]).unwrap();

    let store = tape.forward(&[av, bv]).unwrap();
    assert_relative_eq!(
        store.coeff(acc as usize, 0),
        f(av, bv),
        max_relative = 1e-12
    );

    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(1, &[1.0]).unwrap();
    let (da, db) = finite_diff(f, av, bv);
    assert_relative_eq!(dw[0], da, max_relative = 1e-6);
    assert_relative_eq!(dw[1], db, max_relative = 1e-6);
}

#[test]
fn dependent_can_be_an_input() {
    // y = x0 directly: the tape's "identity" function.
    let mut tape = Tape::new();
    let a = tape.new_input(2.5);
    let _b = tape.new_input(1.0);
    tape.set_outputs(&[a]).unwrap();

    let store = tape.forward(&[2.5, 1.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(1, &[3.0]).unwrap();
    assert_relative_eq!(dw[0], 3.0);
    assert_relative_eq!(dw[1], 0.0);
}

#[test]
fn constants_do_not_receive_sensitivities() {
    // y = c * x0 with c recorded as a constant.
    let mut tape = Tape::new();
    let x = tape.new_input(2.0);
    let c = tape.push_const(7.0);
    let y = tape.push_op(OpCode::Mul, c, x);
    tape.set_outputs(&[y]).unwrap();

    let store = tape.forward(&[2.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let dw = engine.reverse(1, &[1.0]).unwrap();
    assert_eq!(dw.len(), 1);
    assert_relative_eq!(dw[0], 7.0);
}

// ── Precondition rejection ──

#[test]
fn rejects_bad_weight_length() {
    let (tape, _) = product_plus_tape(3.0, 4.0);
    let store = tape.forward(&[3.0, 4.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    let err = engine.reverse(1, &[1.0, 2.0, 3.0]).unwrap_err();
    assert_eq!(
        err,
        Error::WeightLength {
            got: 3,
            m: 1,
            m_times_p: 1
        }
    );
}

#[test]
fn rejects_zero_order_count() {
    let (tape, _) = product_plus_tape(3.0, 4.0);
    let store = tape.forward(&[3.0, 4.0]).unwrap();
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    assert_eq!(engine.reverse(0, &[]).unwrap_err(), Error::ZeroOrderCount);
}

#[test]
fn rejects_insufficient_stored_orders() {
    let (tape, _) = product_plus_tape(3.0, 4.0);
    let store = tape.forward(&[3.0, 4.0]).unwrap(); // one order stored
    let mut engine = ReverseEngine::new(&tape, &store).unwrap();
    assert_eq!(
        engine.reverse(2, &[1.0]).unwrap_err(),
        Error::InsufficientOrders {
            stored: 1,
            required: 2
        }
    );
}

#[test]
fn rejects_store_from_another_tape() {
    let (tape, _) = product_plus_tape(3.0, 4.0);
    let (other, _) = product_plus_tape(1.0, 1.0);
    let mut bigger = other;
    let extra = bigger.push_op(OpCode::Exp, 0, 0);
    bigger.set_outputs(&[extra]).unwrap();
    let store = bigger.forward(&[1.0, 1.0]).unwrap();

    let err = ReverseEngine::new(&tape, &store).unwrap_err();
    assert!(matches!(err, Error::StoreMismatch { .. }));
}
