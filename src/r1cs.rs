//! Rank-1 constraint system: variables, linear combinations, constraints.
//!
//! A constraint is a triple `(A, B, C)` of linear combinations over the wire
//! vector `z`, satisfied iff `⟨A, z⟩ · ⟨B, z⟩ = ⟨C, z⟩`.
//!
//! ## Wire layout
//!
//! `z = [1, public..., secret..., internal...]`. Index 0 is the constant-one
//! wire. Public and secret wires are allocated in schema declaration order
//! before any circuit logic runs, so the public block is always
//! `z[1..=num_public]`.
//!
//! ## Digest
//!
//! [`R1CS::digest`] is a blake3 hash over the modulus, the input names, every
//! constraint and the hint program. Keys and witnesses carry it so that
//! artifacts derived from different circuits are rejected up front.

#![forbid(unsafe_code)]

use ark_ff::PrimeField;

use crate::field::FieldModulus;
use crate::witness::Hint;

/* ============================== Variables ============================== */

/// Role of a wire in the constraint system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Constant,
    Public,
    Secret,
    Internal,
}

impl Role {
    fn tag(self) -> u8 {
        match self {
            Role::Constant => 0,
            Role::Public => 1,
            Role::Secret => 2,
            Role::Internal => 3,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Constant => "constant",
            Role::Public => "public",
            Role::Secret => "secret",
            Role::Internal => "internal",
        })
    }
}

/// Handle to a wire. Only meaningful inside the session that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    pub(crate) index: usize,
    pub(crate) role: Role,
    pub(crate) session: u64,
}

impl Variable {
    /// The constant-one wire. Valid in every session.
    pub const ONE: Variable = Variable { index: 0, role: Role::Constant, session: 0 };

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }
}

/* ========================== Linear combinations ========================== */

/// `Σ cᵢ · zᵢ`, kept in normalized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearCombination<F: PrimeField> {
    terms: Vec<(F, Variable)>,
}

impl<F: PrimeField> LinearCombination<F> {
    pub fn zero() -> Self {
        Self { terms: Vec::new() }
    }

    /// `k · 1`.
    pub fn constant(k: F) -> Self {
        Self::from_terms(vec![(k, Variable::ONE)])
    }

    /// Build from arbitrary terms, normalizing: sort by index, merge
    /// duplicates, drop zero coefficients.
    pub fn from_terms(mut terms: Vec<(F, Variable)>) -> Self {
        terms.sort_by_key(|(_, v)| v.index);
        let mut out: Vec<(F, Variable)> = Vec::with_capacity(terms.len());
        for (c, v) in terms {
            match out.last_mut() {
                Some((acc, last)) if last.index == v.index => *acc += c,
                _ => out.push((c, v)),
            }
        }
        out.retain(|(c, _)| !c.is_zero());
        Self { terms: out }
    }

    pub fn terms(&self) -> &[(F, Variable)] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// `Some(k)` if this combination only touches the one-wire.
    pub fn as_constant(&self) -> Option<F> {
        match self.terms.as_slice() {
            [] => Some(F::zero()),
            [(c, v)] if v.index == 0 => Some(*c),
            _ => None,
        }
    }

    /// `⟨self, z⟩`. Panics if a term indexes past `z`.
    pub fn evaluate(&self, z: &[F]) -> F {
        self.terms.iter().map(|(c, v)| *c * z[v.index]).sum()
    }

    pub fn scale(&self, k: F) -> Self {
        if k.is_zero() {
            return Self::zero();
        }
        Self { terms: self.terms.iter().map(|(c, v)| (*c * k, *v)).collect() }
    }

    pub(crate) fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.terms.iter().map(|(_, v)| v)
    }

    pub(crate) fn absorb(&self, hasher: &mut blake3::Hasher) {
        hasher.update(&(self.terms.len() as u64).to_le_bytes());
        let mut buf = Vec::new();
        for (c, v) in &self.terms {
            hasher.update(&(v.index as u64).to_le_bytes());
            hasher.update(&[v.role.tag()]);
            buf.clear();
            // Serializing a field element into a Vec cannot fail.
            let _ = c.serialize_compressed(&mut buf);
            hasher.update(&buf);
        }
    }
}

impl<F: PrimeField> Default for LinearCombination<F> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<F: PrimeField> From<Variable> for LinearCombination<F> {
    fn from(v: Variable) -> Self {
        Self { terms: vec![(F::one(), v)] }
    }
}

impl<F: PrimeField> From<&Variable> for LinearCombination<F> {
    fn from(v: &Variable) -> Self {
        Self::from(*v)
    }
}

impl<F: PrimeField> From<&LinearCombination<F>> for LinearCombination<F> {
    fn from(lc: &LinearCombination<F>) -> Self {
        lc.clone()
    }
}

impl<F: PrimeField> std::ops::Add for LinearCombination<F> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut terms = self.terms;
        terms.extend(rhs.terms);
        Self::from_terms(terms)
    }
}

impl<F: PrimeField> std::ops::Sub for LinearCombination<F> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl<F: PrimeField> std::ops::Neg for LinearCombination<F> {
    type Output = Self;
    fn neg(self) -> Self {
        Self { terms: self.terms.into_iter().map(|(c, v)| (-c, v)).collect() }
    }
}

impl<F: PrimeField> std::ops::Mul<F> for LinearCombination<F> {
    type Output = Self;
    fn mul(self, k: F) -> Self {
        self.scale(k)
    }
}

/* ============================== Constraints ============================== */

/// Which builder operation emitted a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintTag {
    Mul,
    AssertEqual,
    Inverse,
    Division,
    Boolean,
    IsZero,
    Select,
    Binary,
}

impl ConstraintTag {
    fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ConstraintTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConstraintTag::Mul => "mul",
            ConstraintTag::AssertEqual => "assert_is_equal",
            ConstraintTag::Inverse => "inverse",
            ConstraintTag::Division => "div",
            ConstraintTag::Boolean => "assert_is_boolean",
            ConstraintTag::IsZero => "is_zero",
            ConstraintTag::Select => "select",
            ConstraintTag::Binary => "to_binary",
        })
    }
}

/// `A · B = C`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint<F: PrimeField> {
    pub a: LinearCombination<F>,
    pub b: LinearCombination<F>,
    pub c: LinearCombination<F>,
    pub tag: ConstraintTag,
}

impl<F: PrimeField> Constraint<F> {
    pub fn is_satisfied(&self, z: &[F]) -> bool {
        self.a.evaluate(z) * self.b.evaluate(z) == self.c.evaluate(z)
    }
}

/// First constraint a wire assignment violates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("constraint #{index} ({tag}) is not satisfied")]
pub struct UnsatisfiedConstraint {
    pub index: usize,
    pub tag: ConstraintTag,
}

/* ================================= R1CS ================================= */

/// Frozen output of [`crate::compile`].
#[derive(Clone, Debug)]
pub struct R1CS<F: PrimeField> {
    pub(crate) constraints: Vec<Constraint<F>>,
    pub(crate) num_variables: usize,
    pub(crate) public_names: Vec<String>,
    pub(crate) secret_names: Vec<String>,
    pub(crate) hints: Vec<Hint<F>>,
    pub(crate) modulus: FieldModulus,
    pub(crate) digest: [u8; 32],
}

impl<F: PrimeField> R1CS<F> {
    pub(crate) fn new(
        constraints: Vec<Constraint<F>>,
        num_variables: usize,
        public_names: Vec<String>,
        secret_names: Vec<String>,
        hints: Vec<Hint<F>>,
        modulus: FieldModulus,
    ) -> Self {
        let mut r1cs = Self {
            constraints,
            num_variables,
            public_names,
            secret_names,
            hints,
            modulus,
            digest: [0u8; 32],
        };
        r1cs.digest = r1cs.compute_digest();
        r1cs
    }

    pub fn constraints(&self) -> &[Constraint<F>] {
        &self.constraints
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Total wire count including the one-wire.
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_public(&self) -> usize {
        self.public_names.len()
    }

    pub fn num_secret(&self) -> usize {
        self.secret_names.len()
    }

    /// Public input names in wire order.
    pub fn public_names(&self) -> &[String] {
        &self.public_names
    }

    /// Secret input names in wire order.
    pub fn secret_names(&self) -> &[String] {
        &self.secret_names
    }

    pub fn modulus(&self) -> &FieldModulus {
        &self.modulus
    }

    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// Check `z` against every constraint, reporting the first violation.
    pub fn is_satisfied(&self, z: &[F]) -> Result<(), UnsatisfiedConstraint> {
        match self.constraints.iter().position(|c| !c.is_satisfied(z)) {
            None => Ok(()),
            Some(index) => Err(UnsatisfiedConstraint { index, tag: self.constraints[index].tag }),
        }
    }

    fn compute_digest(&self) -> [u8; 32] {
        let mut h = blake3::Hasher::new();
        h.update(b"ZKR1CS.r1cs.v1");
        h.update(&(self.modulus.as_be_bytes().len() as u64).to_le_bytes());
        h.update(self.modulus.as_be_bytes());
        h.update(&(self.num_variables as u64).to_le_bytes());
        for names in [&self.public_names, &self.secret_names] {
            h.update(&(names.len() as u64).to_le_bytes());
            for n in names.iter() {
                h.update(&(n.len() as u64).to_le_bytes());
                h.update(n.as_bytes());
            }
        }
        h.update(&(self.constraints.len() as u64).to_le_bytes());
        for c in &self.constraints {
            h.update(&[c.tag.code()]);
            c.a.absorb(&mut h);
            c.b.absorb(&mut h);
            c.c.absorb(&mut h);
        }
        h.update(&(self.hints.len() as u64).to_le_bytes());
        for hint in &self.hints {
            hint.absorb(&mut h);
        }
        *h.finalize().as_bytes()
    }
}
