use ark_bn254::{Bn254, Fr};
use ark_ff::{Field, UniformRand};
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use zkr1cs::{
    api::CircuitKeys, assign, circuits::CubicCircuit, compile, public_witness, verify, Assignment,
    FieldModulus, WitnessError,
};

fn cubic(x: Fr) -> Fr {
    x.pow([3u64]) + x + Fr::from(5u64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn witness_matches_the_polynomial(seed in any::<u64>()) {
        let r1cs = compile::<Fr, _>(&FieldModulus::of::<Fr>(), &CubicCircuit).unwrap();
        let x = Fr::rand(&mut StdRng::seed_from_u64(seed));
        let y = cubic(x);

        let w = assign(&r1cs, &Assignment::new().with("x", x), &Assignment::new().with("y", y)).unwrap();
        prop_assert_eq!(w.values()[0], Fr::from(1u64));
        let pw = w.public();
        prop_assert_eq!(pw.values(), &[y][..]);
        prop_assert!(r1cs.is_satisfied(w.values()).is_ok());

        let off = assign(
            &r1cs,
            &Assignment::new().with("x", x),
            &Assignment::new().with("y", y + Fr::from(1u64)),
        );
        prop_assert!(matches!(off, Err(WitnessError::Unsatisfied(_))));
    }

    #[test]
    fn decimal_literals_agree_with_integers(v in any::<u64>()) {
        let a = Assignment::<Fr>::from_strings([("x", v.to_string())]).unwrap();
        prop_assert_eq!(a.get("x").copied(), Some(Fr::from(v)));
        let h = Assignment::<Fr>::from_strings([("x", format!("0x{v:x}"))]).unwrap();
        prop_assert_eq!(h.get("x").copied(), Some(Fr::from(v)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn random_statements_prove_and_verify(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = CircuitKeys::<Bn254>::generate("cubic", &CubicCircuit, &mut rng).unwrap();
        let x = Fr::rand(&mut rng);
        let public = Assignment::new().with("y", cubic(x));
        let w = assign(&keys.r1cs, &Assignment::new().with("x", x), &public).unwrap();
        let proof = zkr1cs::prove(&keys.r1cs, &keys.pk, &w, &mut rng).unwrap();

        prop_assert!(verify(&proof, keys.vk(), &w.public()).unwrap());
        let other = public_witness(&keys.r1cs, &Assignment::new().with("y", cubic(x) + x)).unwrap();
        // x = 0 leaves the statement unchanged
        prop_assume!(x != Fr::from(0u64));
        prop_assert!(!verify(&proof, keys.vk(), &other).unwrap());
    }
}
