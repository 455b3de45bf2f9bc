use crate::error::{Error, Result};
use crate::float::Float;
use crate::opcode::OpCode;

impl<F: Float> super::ReverseEngine<'_, F> {
    /// Full reverse sweep: weighted sensitivities of all dependent variables.
    ///
    /// Computes the derivative of
    /// `W(u) = sum_k (w^(k))^T * (1/k!) * d^k/dt^k Y(0, u)`
    /// with respect to every Taylor coefficient of every independent
    /// variable. The returned vector has length `n * p`: entry `j * p + k`
    /// is the sensitivity of `W` to the order-`k` coefficient of input `j`.
    ///
    /// `w` selects the seeding policy by its length:
    ///
    /// - length `m` (short form): `w[i]` weights output `i` at the highest
    ///   order `p - 1` only. Extraction then applies the reverse identity
    ///   theorem — the partial of the output's order-`k` coefficient with
    ///   respect to an input's order-0 coefficient equals the partial of the
    ///   order-`p-1` coefficient with respect to order `p-1-k` — so results
    ///   are read back with the order index flipped.
    /// - length `m * p` (long form): `w[i * p + k]` weights output `i` at
    ///   order `k`. Every order is seeded independently and extraction reads
    ///   orders straight through.
    ///
    /// Dependent entries that alias the same tape address accumulate their
    /// seeds by summation in **both** forms. (Upstream implementations of
    /// this sweep assigned instead of accumulating in the long form, which
    /// made aliased outputs order-dependent; here the two forms agree.)
    ///
    /// The scratch buffer is left dirty on return; a later
    /// [`reverse_one`](Self::reverse_one) call detects this and performs a
    /// full reset first.
    pub fn reverse(&mut self, p: usize, w: &[F]) -> Result<Vec<F>> {
        let n = self.tape.num_inputs();
        let m = self.tape.num_dependents();

        if p == 0 {
            return Err(Error::ZeroOrderCount);
        }
        if w.len() != m && w.len() != m * p {
            return Err(Error::WeightLength {
                got: w.len(),
                m,
                m_times_p: m * p,
            });
        }
        if self.store.orders() < p {
            return Err(Error::InsufficientOrders {
                stored: self.store.orders(),
                required: p,
            });
        }
        let short_form = w.len() == m;

        self.prepare_partial(p);

        // Seed the dependent rows. Accumulate, never overwrite: two
        // dependent variables can point at the same tape address.
        for (i, &addr) in self.tape.dependents().iter().enumerate() {
            let row = addr as usize * p;
            if short_form {
                self.partial[row + p - 1] = self.partial[row + p - 1] + w[i];
            } else {
                for k in 0..p {
                    self.partial[row + k] = self.partial[row + k] + w[i * p + k];
                }
            }
        }

        self.sweep_all(p);

        // Extract at the independent variables.
        let mut value = vec![F::zero(); n * p];
        for (j, &addr) in self.tape.independents().iter().enumerate() {
            let row = addr as usize * p;
            debug_assert_eq!(self.tape.opcode(addr as usize), OpCode::Input);
            if short_form {
                // Reverse identity theorem: flip the order index.
                for k in 0..p {
                    value[j * p + k] = self.partial[row + p - 1 - k];
                }
            } else {
                for k in 0..p {
                    value[j * p + k] = self.partial[row + k];
                }
            }
        }

        Ok(value)
    }
}
