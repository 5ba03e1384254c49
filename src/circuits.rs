//! Built-in circuits.
//!
//! | name        | public      | secret     | statement                         |
//! |-------------|-------------|------------|-----------------------------------|
//! | `cubic`     | `y`         | `x`        | `x³ + x + 5 = y`                  |
//! | `factor`    | `n`         | `p`, `q`   | `p·q = n`, `p ≠ 1`, `q ≠ 1`       |
//! | `threshold` | `threshold` | `value`    | `0 ≤ value − threshold < 2^bits`  |

#![forbid(unsafe_code)]

use ark_ff::PrimeField;

use crate::builder::Builder;
use crate::circuit::{Circuit, CompilationError, Inputs, Schema};

/// `x³ + x + 5 == y` with `x` secret and `y` public.
#[derive(Clone, Copy, Debug, Default)]
pub struct CubicCircuit;

impl<F: PrimeField> Circuit<F> for CubicCircuit {
    fn schema(&self) -> Schema {
        Schema::new().secret("x").public("y")
    }

    fn define(&self, api: &mut Builder<F>, inputs: &Inputs) -> Result<(), CompilationError> {
        let x = inputs.get("x")?;
        let y = inputs.get("y")?;
        let x3 = api.mul_many([x, x, x])?;
        let rhs = api.sum([x3, x.into(), api.constant(5u64)]);
        api.assert_is_equal(y, rhs)
    }
}

/// Knowledge of a non-trivial factorization of `n`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FactorCircuit;

impl<F: PrimeField> Circuit<F> for FactorCircuit {
    fn schema(&self) -> Schema {
        Schema::new().public("n").secret("p").secret("q")
    }

    fn define(&self, api: &mut Builder<F>, inputs: &Inputs) -> Result<(), CompilationError> {
        let (n, p, q) = (inputs.get("n")?, inputs.get("p")?, inputs.get("q")?);
        let pq = api.mul(p, q);
        api.assert_is_equal(pq, n)?;
        // p − 1 and q − 1 must be invertible
        for f in [p, q] {
            let shifted = api.sub(f, api.constant(1u64));
            api.inverse(shifted)?;
        }
        Ok(())
    }
}

/// `value ≥ threshold` with `value − threshold` below `2^bits`.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdCircuit {
    pub bits: usize,
}

impl Default for ThresholdCircuit {
    fn default() -> Self {
        Self { bits: 32 }
    }
}

impl<F: PrimeField> Circuit<F> for ThresholdCircuit {
    fn schema(&self) -> Schema {
        Schema::new().public("threshold").secret("value")
    }

    fn define(&self, api: &mut Builder<F>, inputs: &Inputs) -> Result<(), CompilationError> {
        let diff = api.sub(inputs.get("value")?, inputs.get("threshold")?);
        api.to_binary(diff, self.bits)?;
        Ok(())
    }
}

/// Names and one-line descriptions of the built-in circuits.
pub const BUILTIN: &[(&str, &str)] = &[
    ("cubic", "x^3 + x + 5 == y (x secret, y public)"),
    ("factor", "p * q == n with p, q != 1 (p, q secret, n public)"),
    ("threshold", "value >= threshold, difference below 2^32 (value secret)"),
];

/// Look up a built-in circuit by name.
pub fn builtin<F: PrimeField>(name: &str) -> Option<Box<dyn Circuit<F> + Send + Sync>> {
    match name {
        "cubic" => Some(Box::new(CubicCircuit)),
        "factor" => Some(Box::new(FactorCircuit)),
        "threshold" => Some(Box::new(ThresholdCircuit::default())),
        _ => None,
    }
}
