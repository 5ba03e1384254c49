use ark_bn254::{Bn254, Fr};
use ark_ec::{AffineRepr, CurveGroup};
use rand::{rngs::StdRng, SeedableRng};

use zkr1cs::{
    api::{self, io::ArtifactKind, CircuitKeys},
    assign, circuit_fn,
    circuits::{CubicCircuit, FactorCircuit},
    compile, prove, public_witness, setup, verify, verify_with_inputs, Assignment, Builder,
    CompilationError, ConstraintTag, FieldModulus, Inputs, Proof, ProvingError, Schema,
    VerificationError, WitnessError,
};

fn bn254() -> FieldModulus {
    FieldModulus::of::<Fr>()
}

fn cubic_inputs(x: u64, y: u64) -> (Assignment<Fr>, Assignment<Fr>) {
    (Assignment::new().with("x", x), Assignment::new().with("y", y))
}

#[test]
fn cubic_round_trip_on_bn254() {
    let mut rng = StdRng::seed_from_u64(1);
    let r1cs = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let (pk, vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();

    let (secret, public) = cubic_inputs(2, 15);
    let witness = assign(&r1cs, &secret, &public).unwrap();
    let proof = prove(&r1cs, &pk, &witness, &mut rng).unwrap();

    assert!(verify(&proof, &vk, &witness.public()).unwrap());
    // a verifier rebuilds the public witness on its own
    let pw = public_witness(&r1cs, &public).unwrap();
    assert!(verify(&proof, &vk, &pw).unwrap());
}

#[test]
fn wrong_output_is_unsatisfiable() {
    let r1cs = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let (secret, public) = cubic_inputs(2, 16);
    match assign(&r1cs, &secret, &public) {
        Err(WitnessError::Unsatisfied(u)) => assert_eq!(u.tag, ConstraintTag::AssertEqual),
        other => panic!("expected unsatisfiable witness, got {other:?}"),
    }
}

#[test]
fn tampered_proof_bytes_do_not_verify() {
    let mut rng = StdRng::seed_from_u64(2);
    let r1cs = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let (pk, vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
    let (secret, public) = cubic_inputs(3, 35);
    let witness = assign(&r1cs, &secret, &public).unwrap();
    let proof = prove(&r1cs, &pk, &witness, &mut rng).unwrap();
    let bytes = api::io::to_bytes(ArtifactKind::Proof, &proof).unwrap();

    // header is 11 bytes; flip one bit in each point encoding
    for pos in [11, 11 + 32, 11 + 32 + 64] {
        let mut bad = bytes.clone();
        bad[pos + 3] ^= 0x10;
        match api::io::from_bytes::<Proof<Bn254>>(ArtifactKind::Proof, &bad) {
            Err(_) => {}
            Ok(p) => {
                assert_ne!(p, proof);
                assert!(!matches!(verify(&p, &vk, &witness.public()), Ok(true)), "flip at {pos}");
            }
        }
    }
}

#[test]
fn altered_proof_points_are_rejected() {
    let mut rng = StdRng::seed_from_u64(3);
    let r1cs = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let (pk, vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
    let (secret, public) = cubic_inputs(2, 15);
    let witness = assign(&r1cs, &secret, &public).unwrap();
    let proof = prove(&r1cs, &pk, &witness, &mut rng).unwrap();

    let mut shifted = proof.clone();
    shifted.c = (shifted.c.into_group() + <Bn254 as ark_ec::pairing::Pairing>::G1Affine::generator())
        .into_affine();
    assert!(!verify(&shifted, &vk, &witness.public()).unwrap());

    let mut zeroed = proof;
    zeroed.a = <Bn254 as ark_ec::pairing::Pairing>::G1Affine::zero();
    assert!(matches!(
        verify(&zeroed, &vk, &witness.public()),
        Err(VerificationError::MalformedProof(_))
    ));
}

#[test]
fn proof_does_not_transfer_to_other_public_inputs() {
    let mut rng = StdRng::seed_from_u64(4);
    let r1cs = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let (pk, vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
    let (secret, public) = cubic_inputs(2, 15);
    let witness = assign(&r1cs, &secret, &public).unwrap();
    let proof = prove(&r1cs, &pk, &witness, &mut rng).unwrap();

    for y in [16u64, 0, 35] {
        let pw = public_witness(&r1cs, &Assignment::new().with("y", y)).unwrap();
        assert!(!verify(&proof, &vk, &pw).unwrap(), "y = {y}");
    }
}

#[test]
fn raw_inputs_must_match_the_key_arity() {
    let mut rng = StdRng::seed_from_u64(17);
    let keys = CircuitKeys::<Bn254>::generate("cubic", &CubicCircuit, &mut rng).unwrap();
    let (secret, public) = cubic_inputs(2, 15);
    let (proof, _) = api::prove_circuit(&keys, &secret, &public, &mut rng).unwrap();

    assert!(matches!(
        verify_with_inputs(&keys.pvk, &proof, &[]),
        Err(VerificationError::PublicInputLength { expected: 1, got: 0 })
    ));
    assert!(matches!(
        verify_with_inputs(&keys.pvk, &proof, &[Fr::from(15u64), Fr::from(1u64)]),
        Err(VerificationError::PublicInputLength { expected: 1, got: 2 })
    ));
    assert!(verify_with_inputs(&keys.pvk, &proof, &[Fr::from(15u64)]).unwrap());
    assert!(!verify_with_inputs(&keys.pvk, &proof, &[Fr::from(16u64)]).unwrap());
}

#[test]
fn compilation_is_deterministic() {
    let a = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let b = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.num_constraints(), b.num_constraints());
    assert_eq!(a.num_variables(), b.num_variables());
    assert_eq!(a.public_names(), b.public_names());

    let factor = compile::<Fr, _>(&bn254(), &FactorCircuit).unwrap();
    assert_ne!(a.digest(), factor.digest());
}

#[test]
fn keys_are_bound_to_their_circuit() {
    let mut rng = StdRng::seed_from_u64(5);
    let cubic = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let factor = compile::<Fr, _>(&bn254(), &FactorCircuit).unwrap();
    let (cubic_pk, cubic_vk) = setup::<Bn254, _>(&cubic, &mut rng).unwrap();
    let (factor_pk, factor_vk) = setup::<Bn254, _>(&factor, &mut rng).unwrap();

    let (secret, public) = cubic_inputs(2, 15);
    let witness = assign(&cubic, &secret, &public).unwrap();

    assert!(matches!(
        prove(&cubic, &factor_pk, &witness, &mut rng),
        Err(ProvingError::KeyMismatch)
    ));
    assert!(matches!(
        prove(&factor, &factor_pk, &witness, &mut rng),
        Err(ProvingError::WitnessMismatch)
    ));

    let proof = prove(&cubic, &cubic_pk, &witness, &mut rng).unwrap();
    assert!(matches!(
        verify(&proof, &factor_vk, &witness.public()),
        Err(VerificationError::KeyMismatch)
    ));
    assert!(verify(&proof, &cubic_vk, &witness.public()).unwrap());
}

#[test]
fn two_setups_produce_incompatible_keys() {
    let mut rng = StdRng::seed_from_u64(6);
    let r1cs = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let (pk, _) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
    let (_, other_vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();
    let (secret, public) = cubic_inputs(2, 15);
    let witness = assign(&r1cs, &secret, &public).unwrap();
    let proof = prove(&r1cs, &pk, &witness, &mut rng).unwrap();
    // same circuit, so the digest check passes and the pairing check fails
    assert!(!verify(&proof, &other_vk, &witness.public()).unwrap());
}

#[test]
fn cubic_round_trip_on_bls12_381() {
    use ark_bls12_381::{Bls12_381, Fr as BlsFr};

    let mut rng = StdRng::seed_from_u64(7);
    let r1cs = compile::<BlsFr, _>(&FieldModulus::of::<BlsFr>(), &CubicCircuit).unwrap();
    let (pk, vk) = setup::<Bls12_381, _>(&r1cs, &mut rng).unwrap();
    let witness = assign(
        &r1cs,
        &Assignment::new().with("x", 2u64),
        &Assignment::new().with("y", 15u64),
    )
    .unwrap();
    let proof = prove(&r1cs, &pk, &witness, &mut rng).unwrap();
    assert!(verify(&proof, &vk, &witness.public()).unwrap());

    // a BN254 modulus cannot drive a BLS12-381 compilation
    assert!(matches!(
        compile::<BlsFr, _>(&bn254(), &CubicCircuit),
        Err(CompilationError::Field(_))
    ));
}

#[test]
fn closure_circuits_compile_and_prove() {
    // a + b == c and a * b == ab, b secret
    let circuit = circuit_fn(
        Schema::new().public("a").public("c").public("ab").secret("b"),
        |api: &mut Builder<Fr>, inputs: &Inputs| {
            let (a, b, c, ab) = (inputs.get("a")?, inputs.get("b")?, inputs.get("c")?, inputs.get("ab")?);
            let sum = api.add(a, b);
            api.assert_is_equal(sum, c)?;
            let prod = api.mul(a, b);
            api.assert_is_equal(prod, ab)
        },
    );
    let mut rng = StdRng::seed_from_u64(8);
    let keys = CircuitKeys::<Bn254>::generate("sum", &circuit, &mut rng).unwrap();
    assert_eq!(keys.r1cs.public_names(), &["a", "c", "ab"]);

    let secret = Assignment::new().with("b", 4u64);
    let public = Assignment::new().with("a", 3u64).with("c", 7u64).with("ab", 12u64);
    let (proof, pw) = api::prove_circuit(&keys, &secret, &public, &mut rng).unwrap();
    assert_eq!(pw.to_decimal_strings(), vec!["3", "7", "12"]);
    assert!(api::verify_circuit(&keys, &proof, &public).unwrap());
}

#[test]
fn concurrent_proofs_share_one_key() {
    let mut rng = StdRng::seed_from_u64(9);
    let keys = CircuitKeys::<Bn254>::generate("cubic", &CubicCircuit, &mut rng).unwrap();

    let results: Vec<bool> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                let keys = &keys;
                s.spawn(move || {
                    let x = i + 2;
                    let y = x * x * x + x + 5;
                    let (secret, public) = cubic_inputs(x, y);
                    let mut rng = StdRng::seed_from_u64(100 + i);
                    let (proof, _) = api::prove_circuit(keys, &secret, &public, &mut rng).unwrap();
                    api::verify_circuit(keys, &proof, &public).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results, vec![true; 4]);
}

#[test]
fn artifacts_survive_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(10);
    let r1cs = compile::<Fr, _>(&bn254(), &CubicCircuit).unwrap();
    let (pk, vk) = setup::<Bn254, _>(&r1cs, &mut rng).unwrap();

    let (pk_path, vk_path, proof_path) =
        (dir.path().join("pk.bin"), dir.path().join("vk.bin"), dir.path().join("proof.bin"));
    api::io::write_proving_key(&pk_path, &pk).unwrap();
    api::io::write_verifying_key(&vk_path, &vk).unwrap();

    let pk2 = api::io::read_proving_key::<Bn254>(&pk_path).unwrap();
    assert_eq!(pk2, pk);
    let (secret, public) = cubic_inputs(5, 135);
    let witness = assign(&r1cs, &secret, &public).unwrap();
    let proof = prove(&r1cs, &pk2, &witness, &mut rng).unwrap();
    api::io::write_proof(&proof_path, &proof).unwrap();

    let vk2 = api::io::read_verifying_key::<Bn254>(&vk_path).unwrap();
    let proof2 = api::io::read_proof::<Bn254>(&proof_path).unwrap();
    assert!(verify(&proof2, &vk2, &witness.public()).unwrap());

    let mut raw = std::fs::read(&proof_path).unwrap();
    raw.truncate(raw.len() - 1);
    assert!(api::io::from_bytes::<Proof<Bn254>>(ArtifactKind::Proof, &raw).is_err());
}
