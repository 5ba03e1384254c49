//! Witness generation: named input assignments → full wire vector.
//!
//! The compiler records, for every internal wire, a [`Hint`] saying how to
//! compute it from wires allocated earlier. [`assign`] seeds the input wires
//! from two [`Assignment`]s, replays the hints in recording order and then
//! checks every constraint. The resulting [`Witness`] is wiped on drop.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::time::Instant;

use ark_ff::{BigInteger, PrimeField};
use zeroize::Zeroize;

use crate::field::{parse_field_element, to_decimal, FieldError, FieldModulus};
use crate::r1cs::{LinearCombination, Role, UnsatisfiedConstraint, R1CS};

/* ================================ Hints ================================ */

/// How an internal wire is computed.
#[derive(Clone, Debug)]
pub(crate) enum HintOp<F: PrimeField> {
    Product(LinearCombination<F>, LinearCombination<F>),
    Inverse(LinearCombination<F>),
    Quotient(LinearCombination<F>, LinearCombination<F>),
    /// `a⁻¹`, or `0` when `a = 0`.
    IsZeroInverse(LinearCombination<F>),
    IsZero(LinearCombination<F>),
    Bit(LinearCombination<F>, usize),
}

/// `z[output] = op(z)`; `constraint` is the row reported if `op` has no value.
#[derive(Clone, Debug)]
pub(crate) struct Hint<F: PrimeField> {
    pub(crate) output: usize,
    pub(crate) constraint: usize,
    pub(crate) op: HintOp<F>,
}

impl<F: PrimeField> HintOp<F> {
    fn code(&self) -> u8 {
        match self {
            HintOp::Product(..) => 0,
            HintOp::Inverse(..) => 1,
            HintOp::Quotient(..) => 2,
            HintOp::IsZeroInverse(..) => 3,
            HintOp::IsZero(..) => 4,
            HintOp::Bit(..) => 5,
        }
    }

    fn operands(&self) -> Vec<&LinearCombination<F>> {
        match self {
            HintOp::Product(a, b) | HintOp::Quotient(a, b) => vec![a, b],
            HintOp::Inverse(a) | HintOp::IsZeroInverse(a) | HintOp::IsZero(a) | HintOp::Bit(a, _) => {
                vec![a]
            }
        }
    }

    fn solve(&self, z: &[F]) -> Option<F> {
        match self {
            HintOp::Product(a, b) => Some(a.evaluate(z) * b.evaluate(z)),
            HintOp::Inverse(a) => a.evaluate(z).inverse(),
            HintOp::Quotient(num, den) => Some(num.evaluate(z) * den.evaluate(z).inverse()?),
            HintOp::IsZeroInverse(a) => Some(a.evaluate(z).inverse().unwrap_or_else(F::zero)),
            HintOp::IsZero(a) => Some(if a.evaluate(z).is_zero() { F::one() } else { F::zero() }),
            HintOp::Bit(a, i) => {
                let bit = a.evaluate(z).into_bigint().get_bit(*i);
                Some(if bit { F::one() } else { F::zero() })
            }
        }
    }
}

impl<F: PrimeField> Hint<F> {
    pub(crate) fn absorb(&self, h: &mut blake3::Hasher) {
        h.update(&(self.output as u64).to_le_bytes());
        h.update(&(self.constraint as u64).to_le_bytes());
        h.update(&[self.op.code()]);
        if let HintOp::Bit(_, i) = &self.op {
            h.update(&(*i as u64).to_le_bytes());
        }
        for lc in self.op.operands() {
            lc.absorb(h);
        }
    }
}

/* ================================ Errors ================================ */

#[derive(Debug, thiserror::Error)]
pub enum WitnessError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("invalid value for `{name}`: {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: FieldError,
    },
    #[error("missing {role} input `{name}`")]
    MissingInput { name: String, role: Role },
    #[error("unknown input `{0}`")]
    UnknownInput(String),
    #[error("input `{name}` is declared {declared}")]
    RoleMismatch { name: String, declared: Role },
    #[error("unsatisfiable witness: {0}")]
    Unsatisfied(#[from] UnsatisfiedConstraint),
}

/* ============================= Assignments ============================= */

/// Named input values for one role.
#[derive(Clone)]
pub struct Assignment<F: PrimeField> {
    values: BTreeMap<String, F>,
}

impl<F: PrimeField> Default for Assignment<F> {
    fn default() -> Self {
        Self { values: BTreeMap::new() }
    }
}

impl<F: PrimeField> Assignment<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to a field element or integer.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<F>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<F>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name` from a decimal or `0x` hex literal, reduced mod `p`.
    pub fn set_str(&mut self, name: impl Into<String>, literal: &str) -> Result<&mut Self, WitnessError> {
        let name = name.into();
        let value = parse_field_element::<F>(literal)
            .map_err(|source| WitnessError::InvalidValue { name: name.clone(), source })?;
        self.values.insert(name, value);
        Ok(self)
    }

    /// Build from `(name, literal)` pairs.
    pub fn from_strings<I, K, V>(pairs: I) -> Result<Self, WitnessError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut out = Self::new();
        for (k, v) in pairs {
            out.set_str(k, v.as_ref())?;
        }
        Ok(out)
    }

    pub fn get(&self, name: &str) -> Option<&F> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<F: PrimeField> Drop for Assignment<F> {
    fn drop(&mut self) {
        for v in self.values.values_mut() {
            v.zeroize();
        }
    }
}

impl<F: PrimeField> std::fmt::Debug for Assignment<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assignment").field("names", &self.values.keys().collect::<Vec<_>>()).finish()
    }
}

/// Ensure `given` covers exactly `declared`, reporting role confusion.
fn check_names<F: PrimeField>(
    given: &Assignment<F>,
    declared: &[String],
    role: Role,
    other: &[String],
    other_role: Role,
) -> Result<(), WitnessError> {
    for name in given.names() {
        if declared.iter().any(|d| d == name) {
            continue;
        }
        if other.iter().any(|d| d == name) {
            return Err(WitnessError::RoleMismatch { name: name.to_string(), declared: other_role });
        }
        return Err(WitnessError::UnknownInput(name.to_string()));
    }
    for name in declared {
        if given.get(name).is_none() {
            return Err(WitnessError::MissingInput { name: name.clone(), role });
        }
    }
    Ok(())
}

/* ================================ Witness ================================ */

/// Full wire assignment `z` for one R1CS. Wiped on drop.
pub struct Witness<F: PrimeField> {
    values: Vec<F>,
    num_public: usize,
    r1cs_digest: [u8; 32],
    modulus: FieldModulus,
}

impl<F: PrimeField> Witness<F> {
    /// Wire values, index 0 being the constant one.
    pub fn values(&self) -> &[F] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn num_public(&self) -> usize {
        self.num_public
    }

    pub fn r1cs_digest(&self) -> &[u8; 32] {
        &self.r1cs_digest
    }

    pub fn modulus(&self) -> &FieldModulus {
        &self.modulus
    }

    /// Public part of the witness, in declaration order.
    pub fn public(&self) -> PublicWitness<F> {
        PublicWitness {
            values: self.values[1..=self.num_public].to_vec(),
            r1cs_digest: self.r1cs_digest,
            modulus: self.modulus.clone(),
        }
    }
}

impl<F: PrimeField> Drop for Witness<F> {
    fn drop(&mut self) {
        self.values.zeroize();
    }
}

impl<F: PrimeField> std::fmt::Debug for Witness<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Witness")
            .field("len", &self.values.len())
            .field("num_public", &self.num_public)
            .field("r1cs_digest", &hex::encode(self.r1cs_digest))
            .finish()
    }
}

/// Ordered public inputs plus the circuit they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicWitness<F: PrimeField> {
    values: Vec<F>,
    r1cs_digest: [u8; 32],
    modulus: FieldModulus,
}

impl<F: PrimeField> PublicWitness<F> {
    pub fn values(&self) -> &[F] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn r1cs_digest(&self) -> &[u8; 32] {
        &self.r1cs_digest
    }

    pub fn modulus(&self) -> &FieldModulus {
        &self.modulus
    }

    /// Canonical decimal strings, in wire order.
    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.values.iter().map(to_decimal).collect()
    }
}

/// Public witness from a public-only assignment, for verifiers that never
/// see the secret inputs.
pub fn public_witness<F: PrimeField>(
    r1cs: &R1CS<F>,
    public: &Assignment<F>,
) -> Result<PublicWitness<F>, WitnessError> {
    r1cs.modulus().ensure::<F>()?;
    check_names(public, r1cs.public_names(), Role::Public, r1cs.secret_names(), Role::Secret)?;
    let values = r1cs
        .public_names()
        .iter()
        .map(|n| public.get(n).copied().unwrap_or_else(F::zero))
        .collect();
    Ok(PublicWitness { values, r1cs_digest: *r1cs.digest(), modulus: r1cs.modulus().clone() })
}

/// Solve every wire of `r1cs` from the given inputs.
pub fn assign<F: PrimeField>(
    r1cs: &R1CS<F>,
    secret: &Assignment<F>,
    public: &Assignment<F>,
) -> Result<Witness<F>, WitnessError> {
    r1cs.modulus().ensure::<F>()?;
    let (pub_names, sec_names) = (r1cs.public_names(), r1cs.secret_names());
    check_names(public, pub_names, Role::Public, sec_names, Role::Secret)?;
    check_names(secret, sec_names, Role::Secret, pub_names, Role::Public)?;

    let t0 = Instant::now();
    let mut w = Witness {
        values: vec![F::zero(); r1cs.num_variables()],
        num_public: pub_names.len(),
        r1cs_digest: *r1cs.digest(),
        modulus: r1cs.modulus().clone(),
    };
    w.values[0] = F::one();
    let seeded = pub_names.iter().map(|n| public.get(n)).chain(sec_names.iter().map(|n| secret.get(n)));
    for (slot, v) in w.values[1..].iter_mut().zip(seeded) {
        *slot = v.copied().unwrap_or_else(F::zero);
    }

    for hint in &r1cs.hints {
        let v = hint.op.solve(&w.values).ok_or_else(|| UnsatisfiedConstraint {
            index: hint.constraint,
            tag: r1cs.constraints()[hint.constraint].tag,
        })?;
        w.values[hint.output] = v;
    }

    r1cs.is_satisfied(&w.values)?;
    tracing::debug!(
        wires = w.values.len(),
        hints = r1cs.hints.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "witness assigned"
    );
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::circuit::{circuit_fn, compile, CompilationError, Inputs, Schema};
    use crate::circuits::CubicCircuit;
    use crate::r1cs::ConstraintTag;
    use ark_bn254::Fr;

    fn cubic() -> R1CS<Fr> {
        compile(&FieldModulus::of::<Fr>(), &CubicCircuit).unwrap()
    }

    #[test]
    fn cubic_witness_solves() {
        let r1cs = cubic();
        let w = assign(
            &r1cs,
            &Assignment::new().with("x", 2u64),
            &Assignment::new().with("y", 15u64),
        )
        .unwrap();
        let expect: Vec<Fr> = [1u64, 15, 2, 4, 8].iter().map(|v| Fr::from(*v)).collect();
        assert_eq!(w.values(), expect.as_slice());
        assert_eq!(w.public().values(), &[Fr::from(15u64)]);
        assert_eq!(w.public().r1cs_digest(), r1cs.digest());
    }

    #[test]
    fn wrong_output_is_unsatisfiable() {
        let r1cs = cubic();
        let err = assign(
            &r1cs,
            &Assignment::new().with("x", 2u64),
            &Assignment::new().with("y", 16u64),
        )
        .unwrap_err();
        match err {
            WitnessError::Unsatisfied(u) => {
                assert_eq!(u.index, 2);
                assert_eq!(u.tag, ConstraintTag::AssertEqual);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn name_validation() {
        let r1cs = cubic();
        let x = Assignment::<Fr>::new().with("x", 2u64);
        let y = Assignment::<Fr>::new().with("y", 15u64);
        assert!(matches!(
            assign(&r1cs, &Assignment::new(), &y),
            Err(WitnessError::MissingInput { role: Role::Secret, .. })
        ));
        assert!(matches!(
            assign(&r1cs, &x.clone().with("z", 1u64), &y),
            Err(WitnessError::UnknownInput(_))
        ));
        assert!(matches!(
            assign(&r1cs, &x.clone().with("y", 15u64), &y),
            Err(WitnessError::RoleMismatch { declared: Role::Public, .. })
        ));
    }

    #[test]
    fn string_values_are_parsed_and_reduced() {
        let r1cs = cubic();
        let secret = Assignment::<Fr>::from_strings([("x", "0x02")]).unwrap();
        let public = Assignment::<Fr>::from_strings([("y", "15")]).unwrap();
        assert!(assign(&r1cs, &secret, &public).is_ok());
        assert!(matches!(
            Assignment::<Fr>::from_strings([("x", "two")]),
            Err(WitnessError::InvalidValue { .. })
        ));
    }

    #[test]
    fn runtime_division_by_zero_is_unsatisfiable() {
        let c = circuit_fn(
            Schema::new().public("q").secret("a").secret("b"),
            |api: &mut Builder<Fr>, io: &Inputs| -> Result<(), CompilationError> {
                let q = api.div(io.get("a")?, io.get("b")?)?;
                api.assert_is_equal(io.get("q")?, q)
            },
        );
        let r1cs = compile(&FieldModulus::of::<Fr>(), &c).unwrap();
        let ok = assign(
            &r1cs,
            &Assignment::new().with("a", 12u64).with("b", 4u64),
            &Assignment::new().with("q", 3u64),
        );
        assert!(ok.is_ok());
        let err = assign(
            &r1cs,
            &Assignment::new().with("a", 12u64).with("b", 0u64),
            &Assignment::new().with("q", 3u64),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WitnessError::Unsatisfied(UnsatisfiedConstraint { index: 0, tag: ConstraintTag::Division })
        ));
    }

    #[test]
    fn gadgets_compute_expected_values() {
        // out = is_zero(a) ? x : bits(x) recomposed, with x < 2^8
        let c = circuit_fn(
            Schema::new().public("out").secret("a").secret("x"),
            |api: &mut Builder<Fr>, io: &Inputs| -> Result<(), CompilationError> {
                let (a, x) = (io.get("a")?, io.get("x")?);
                let z = api.is_zero(a);
                let bits = api.to_binary(x, 8)?;
                let back = api.from_binary(bits.iter().rev().copied())?;
                let chosen = api.select(z, x, back)?;
                api.assert_is_equal(io.get("out")?, chosen)
            },
        );
        let r1cs = compile(&FieldModulus::of::<Fr>(), &c).unwrap();
        let run = |a: u64, x: u64, out: u64| {
            assign(
                &r1cs,
                &Assignment::new().with("a", a).with("x", x),
                &Assignment::new().with("out", out),
            )
        };
        // 0b0000_0110 reversed is 0b0110_0000
        assert!(run(0, 6, 6).is_ok());
        assert!(run(5, 6, 96).is_ok());
        assert!(run(5, 6, 6).is_err());
        // out of range for 8 bits
        assert!(matches!(
            run(0, 300, 300),
            Err(WitnessError::Unsatisfied(UnsatisfiedConstraint { tag: ConstraintTag::Binary, .. }))
        ));
    }

    #[test]
    fn public_witness_from_public_inputs_only() {
        let r1cs = cubic();
        let pw = public_witness(&r1cs, &Assignment::new().with("y", 15u64)).unwrap();
        assert_eq!(pw.to_decimal_strings(), vec!["15".to_string()]);
        assert!(matches!(
            public_witness(&r1cs, &Assignment::new().with("x", 2u64)),
            Err(WitnessError::RoleMismatch { .. })
        ));
    }
}
