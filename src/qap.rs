//! R1CS → QAP reduction.
//!
//! Row `j` of the constraint matrices is placed on the domain point `ωʲ`.
//! After the `m` constraint rows come `1 + ℓ` input rows (`ℓ` public inputs)
//! with `A = zᵢ`, `B = 0`, `C = 0`. They make the polynomials of the
//! instance wires linearly independent, which the soundness argument needs.
//!
//! - Setup evaluates every wire polynomial `uᵢ, vᵢ, wᵢ` at the secret `τ`
//!   through the Lagrange basis ([`evaluate_at`]).
//! - The prover computes the coefficients of
//!   `h(X) = (A(X)·B(X) − C(X)) / Z_H(X)` on the coset `g·H`
//!   ([`quotient_coefficients`]); `deg h ≤ N − 2`.

#![forbid(unsafe_code)]

use ark_ff::PrimeField;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::{Domain, DomainError};
use crate::r1cs::R1CS;

/// Number of domain rows an R1CS occupies.
pub fn num_rows<F: PrimeField>(r1cs: &R1CS<F>) -> usize {
    r1cs.num_constraints() + r1cs.num_public() + 1
}

/// Domain large enough for `r1cs`.
pub fn domain_for<F: PrimeField>(r1cs: &R1CS<F>) -> Result<Domain<F>, DomainError> {
    Domain::new_r(num_rows(r1cs))
}

/// Wire polynomials evaluated at `τ`.
#[derive(Debug)]
pub struct QapEvaluations<F: PrimeField> {
    pub u: Vec<F>,
    pub v: Vec<F>,
    pub w: Vec<F>,
    /// `Z_H(τ)`.
    pub zt: F,
}

/// `uᵢ(τ), vᵢ(τ), wᵢ(τ)` for every wire `i`.
pub fn evaluate_at<F: PrimeField>(
    r1cs: &R1CS<F>,
    domain: &Domain<F>,
    tau: F,
) -> Result<QapEvaluations<F>, DomainError> {
    let lagrange = domain.lagrange_at_r(tau)?;
    let nv = r1cs.num_variables();
    let (mut u, mut v, mut w) = (vec![F::zero(); nv], vec![F::zero(); nv], vec![F::zero(); nv]);

    for (row, c) in r1cs.constraints().iter().enumerate() {
        let l = lagrange[row];
        for (coeff, var) in c.a.terms() {
            u[var.index()] += l * coeff;
        }
        for (coeff, var) in c.b.terms() {
            v[var.index()] += l * coeff;
        }
        for (coeff, var) in c.c.terms() {
            w[var.index()] += l * coeff;
        }
    }
    let m = r1cs.num_constraints();
    for i in 0..=r1cs.num_public() {
        u[i] += lagrange[m + i];
    }

    Ok(QapEvaluations { u, v, w, zt: domain.vanishing_at(tau) })
}

/// Row evaluations `(⟨Aⱼ, z⟩, ⟨Bⱼ, z⟩, ⟨Cⱼ, z⟩)` padded to `N`.
fn row_evaluations<F: PrimeField>(r1cs: &R1CS<F>, n: usize, z: &[F]) -> (Vec<F>, Vec<F>, Vec<F>) {
    let eval_row = |c: &crate::r1cs::Constraint<F>| (c.a.evaluate(z), c.b.evaluate(z), c.c.evaluate(z));

    #[cfg(feature = "parallel")]
    let rows: Vec<(F, F, F)> = r1cs.constraints().par_iter().map(eval_row).collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<(F, F, F)> = r1cs.constraints().iter().map(eval_row).collect();

    let (mut a, mut b, mut c) = (vec![F::zero(); n], vec![F::zero(); n], vec![F::zero(); n]);
    for (j, (ra, rb, rc)) in rows.into_iter().enumerate() {
        a[j] = ra;
        b[j] = rb;
        c[j] = rc;
    }
    let m = r1cs.num_constraints();
    a[m..=m + r1cs.num_public()].copy_from_slice(&z[..=r1cs.num_public()]);
    (a, b, c)
}

/// Coefficients `h₀ … h_{N−2}` of `(A·B − C) / Z_H`.
///
/// `z` must satisfy `r1cs`; otherwise the division leaves a remainder and the
/// result is meaningless.
pub fn quotient_coefficients<F: PrimeField>(
    r1cs: &R1CS<F>,
    domain: &Domain<F>,
    z: &[F],
) -> Result<Vec<F>, DomainError> {
    let n = domain.n;
    let (mut a, mut b, mut c) = row_evaluations(r1cs, n, z);

    for poly in [&mut a, &mut b, &mut c] {
        domain.intt_r(poly)?;
        domain.coset_ntt_r(poly)?;
    }

    let zh_inv = domain
        .vanishing_on_coset()
        .inverse()
        .ok_or(DomainError::ShiftInDomain)?;

    #[cfg(feature = "parallel")]
    let iter = a.par_iter_mut().zip(b.par_iter()).zip(c.par_iter());
    #[cfg(not(feature = "parallel"))]
    let iter = a.iter_mut().zip(b.iter()).zip(c.iter());
    iter.for_each(|((ai, bi), ci)| {
        *ai = (*ai * bi - ci) * zh_inv;
    });

    domain.coset_intt_r(&mut a)?;
    a.truncate(n.saturating_sub(1).max(1));
    Ok(a)
}
