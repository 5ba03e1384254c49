//! Multi-scalar multiplication helpers.
//!
//! - [`msm`]: variable-base `Σ sᵢ·Pᵢ`. With the `parallel` feature the input
//!   is split into one chunk per rayon worker, each chunk runs a Pippenger
//!   MSM (`VariableBaseMSM::msm_unchecked`) and the partial sums are added.
//! - [`fixed_base`]: `[s₀·G, s₁·G, …]` for one base, as used by key
//!   generation, normalized to affine in one batch.

#![forbid(unsafe_code)]

use ark_ec::CurveGroup;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Below this many terms a single Pippenger call beats splitting.
const MIN_CHUNK: usize = 1 << 8;

/// `Σ scalars[i] · bases[i]`. Extra entries on either side are ignored.
pub fn msm<G: CurveGroup>(bases: &[G::Affine], scalars: &[G::ScalarField]) -> G {
    let len = bases.len().min(scalars.len());
    let (bases, scalars) = (&bases[..len], &scalars[..len]);
    if len == 0 {
        return G::zero();
    }

    #[cfg(feature = "parallel")]
    {
        let workers = rayon::current_num_threads().max(1);
        let chunk = len.div_ceil(workers).max(MIN_CHUNK);
        if chunk < len {
            return bases
                .par_chunks(chunk)
                .zip(scalars.par_chunks(chunk))
                .map(|(b, s)| G::msm_unchecked(b, s))
                .reduce(G::zero, |x, y| x + y);
        }
    }

    G::msm_unchecked(bases, scalars)
}

/// `scalars[i] · base` for every `i`, in affine form.
pub fn fixed_base<G: CurveGroup>(base: G, scalars: &[G::ScalarField]) -> Vec<G::Affine> {
    #[cfg(feature = "parallel")]
    let proj: Vec<G> = scalars.par_iter().map(|s| base * *s).collect();
    #[cfg(not(feature = "parallel"))]
    let proj: Vec<G> = scalars.iter().map(|s| base * *s).collect();
    G::normalize_batch(&proj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fr, G1Projective};
    use ark_ec::{AffineRepr, Group};
    use ark_ff::UniformRand;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn msm_matches_naive_sum() {
        let mut rng = StdRng::seed_from_u64(11);
        let g = G1Projective::generator();
        for len in [0usize, 1, 7, 600] {
            let scalars: Vec<Fr> = (0..len).map(|_| Fr::rand(&mut rng)).collect();
            let base_scalars: Vec<Fr> = (0..len).map(|_| Fr::rand(&mut rng)).collect();
            let bases = fixed_base(g, &base_scalars);
            let naive: G1Projective = bases.iter().zip(&scalars).map(|(b, s)| *b * *s).sum();
            assert_eq!(msm::<G1Projective>(&bases, &scalars), naive, "len {len}");
        }
    }

    #[test]
    fn fixed_base_matches_scalar_mul() {
        let g = G1Projective::generator();
        let scalars = [Fr::from(0u64), Fr::from(1u64), Fr::from(5u64)];
        let out = fixed_base(g, &scalars);
        assert!(out[0].is_zero());
        assert_eq!(out[1], g.into_affine());
        assert_eq!(out[2], (g * Fr::from(5u64)).into_affine());
    }
}
