//! The type term universe and its unifier.
//!
//! Every term lives in one union-find table. Unifying two handles either merges them
//! (one term now answers for both) or leaves them apart and reports why through a
//! `TypeUnificationResult`. Reference terms are never merged themselves: their
//! mutability, underlying type and lifetime are unified piece by piece.

use crate::compiler_frontend::datatypes::{ConstructorName, DataType, TypeConstraint};
use crate::compiler_frontend::type_inference::lifetimes::Lifetime;
use crate::compiler_frontend::type_inference::unification_result::{
    TypeUnificationResult, UnificationOutcome,
};
use crate::unify_log;
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};

/// Handle to a term in the `TypeVariableStore`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVariableRef(pub u32);

impl UnifyKey for TypeVariableRef {
    type Value = TypeTerm;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TypeVariableRef(u)
    }

    fn tag() -> &'static str {
        "TypeVariableRef"
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MutabilityTerm {
    Fixed(bool),
    /// Handle to a `TypeTerm::Mutability`
    Variable(TypeVariableRef),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeTerm {
    Variable {
        id: u32,
        constraints: Vec<TypeConstraint>,
    },
    Literal(DataType),
    Constructor {
        name: ConstructorName,
        argument: TypeVariableRef,
    },
    Reference {
        mutability: MutabilityTerm,
        underlying: TypeVariableRef,
        lifetime: TypeVariableRef,
    },

    /// Resolved lazily. Unresolved lifetime terms adopt whatever they are unified with.
    Lifetime(Option<Lifetime>),

    /// Accumulates with AND every time it is constrained. None until first constrained.
    Mutability(Option<bool>),
}

impl UnifyValue for TypeTerm {
    type Error = NoError;

    fn unify_values(left: &Self, right: &Self) -> Result<Self, NoError> {
        let merged = match (left, right) {
            (
                TypeTerm::Variable {
                    id,
                    constraints: left_constraints,
                },
                TypeTerm::Variable {
                    constraints: right_constraints,
                    ..
                },
            ) => {
                let mut constraints = left_constraints.clone();
                for constraint in right_constraints {
                    if !constraints.contains(constraint) {
                        constraints.push(*constraint);
                    }
                }
                TypeTerm::Variable {
                    id: *id,
                    constraints,
                }
            }
            (TypeTerm::Variable { .. }, concrete) | (concrete, TypeTerm::Variable { .. }) => {
                concrete.clone()
            }
            (TypeTerm::Lifetime(left), TypeTerm::Lifetime(right)) => {
                TypeTerm::Lifetime(left.or(*right))
            }
            (TypeTerm::Mutability(left), TypeTerm::Mutability(right)) => {
                TypeTerm::Mutability(match (left, right) {
                    (Some(left), Some(right)) => Some(*left && *right),
                    (left, right) => left.or(*right),
                })
            }
            (left, _) => left.clone(),
        };

        Ok(merged)
    }
}

pub struct TypeVariableStore {
    table: InPlaceUnificationTable<TypeVariableRef>,
    next_variable_id: u32,
}

impl Default for TypeVariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeVariableStore {
    pub fn new() -> Self {
        TypeVariableStore {
            table: InPlaceUnificationTable::new(),
            next_variable_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    // ============================================================
    // Term creation
    // ============================================================

    /// Builds the term for a concrete data type.
    /// Constructed types and references are split into constructor and reference terms
    /// so they unify with terms built from signatures.
    pub fn create_literal(&mut self, data_type: &DataType) -> TypeVariableRef {
        match data_type {
            DataType::Unresolved => self.create_fresh_variable(Vec::new()),
            DataType::Constructed(name, inner) => {
                let argument = self.create_literal(inner);
                self.create_constructor(*name, argument)
            }
            DataType::ImmutableReference(inner) | DataType::MutableReference(inner) => {
                let underlying = self.create_literal(inner);
                let lifetime = self.create_lifetime(None);
                self.create_reference(
                    MutabilityTerm::Fixed(data_type.is_mutable_reference()),
                    underlying,
                    lifetime,
                )
            }
            _ => self.table.new_key(TypeTerm::Literal(data_type.clone())),
        }
    }

    pub fn create_fresh_variable(&mut self, constraints: Vec<TypeConstraint>) -> TypeVariableRef {
        let id = self.next_variable_id;
        self.next_variable_id += 1;
        self.table.new_key(TypeTerm::Variable { id, constraints })
    }

    pub fn create_constructor(
        &mut self,
        name: ConstructorName,
        argument: TypeVariableRef,
    ) -> TypeVariableRef {
        self.table.new_key(TypeTerm::Constructor { name, argument })
    }

    pub fn create_reference(
        &mut self,
        mutability: MutabilityTerm,
        underlying: TypeVariableRef,
        lifetime: TypeVariableRef,
    ) -> TypeVariableRef {
        self.table.new_key(TypeTerm::Reference {
            mutability,
            underlying,
            lifetime,
        })
    }

    /// None creates a lazy lifetime that is resolved by unification
    pub fn create_lifetime(&mut self, lifetime: Option<Lifetime>) -> TypeVariableRef {
        self.table.new_key(TypeTerm::Lifetime(lifetime))
    }

    pub fn create_mutability_variable(&mut self) -> TypeVariableRef {
        self.table.new_key(TypeTerm::Mutability(None))
    }

    // ============================================================
    // Queries
    // ============================================================
    pub fn probe(&mut self, term: TypeVariableRef) -> TypeTerm {
        self.table.probe_value(term)
    }

    pub fn same_term(&mut self, left: TypeVariableRef, right: TypeVariableRef) -> bool {
        self.table.find(left) == self.table.find(right)
    }

    pub fn is_reference(&mut self, term: TypeVariableRef) -> bool {
        matches!(self.probe(term), TypeTerm::Reference { .. })
    }

    /// (mutability, underlying, lifetime) of a reference term
    pub fn reference_parts(
        &mut self,
        term: TypeVariableRef,
    ) -> Option<(MutabilityTerm, TypeVariableRef, TypeVariableRef)> {
        match self.probe(term) {
            TypeTerm::Reference {
                mutability,
                underlying,
                lifetime,
            } => Some((mutability, underlying, lifetime)),
            _ => None,
        }
    }

    pub fn resolve_mutability(&mut self, mutability: MutabilityTerm) -> bool {
        match mutability {
            MutabilityTerm::Fixed(mutable) => mutable,
            MutabilityTerm::Variable(variable) => {
                matches!(self.probe(variable), TypeTerm::Mutability(Some(true)))
            }
        }
    }

    /// Some(mutable) for references, None for anything else
    pub fn get_mutability(&mut self, term: TypeVariableRef) -> Option<bool> {
        let (mutability, _, _) = self.reference_parts(term)?;
        Some(self.resolve_mutability(mutability))
    }

    /// Owned values live forever. References report their lifetime term, or Empty while
    /// it is unresolved.
    pub fn get_lifetime(&mut self, term: TypeVariableRef) -> Lifetime {
        match self.probe(term) {
            TypeTerm::Reference { lifetime, .. } => self.lifetime_of_term(lifetime),
            TypeTerm::Literal(_) | TypeTerm::Constructor { .. } => Lifetime::Unbounded,
            _ => Lifetime::Empty,
        }
    }

    pub fn lifetime_of_term(&mut self, lifetime_term: TypeVariableRef) -> Lifetime {
        match self.probe(lifetime_term) {
            TypeTerm::Lifetime(Some(lifetime)) => lifetime,
            _ => Lifetime::Empty,
        }
    }

    pub fn render_type(&mut self, term: TypeVariableRef) -> DataType {
        match self.probe(term) {
            TypeTerm::Variable { .. } | TypeTerm::Lifetime(_) | TypeTerm::Mutability(_) => {
                DataType::Unresolved
            }
            TypeTerm::Literal(data_type) => data_type,
            TypeTerm::Constructor { name, argument } => {
                DataType::Constructed(name, Box::new(self.render_type(argument)))
            }
            TypeTerm::Reference {
                mutability,
                underlying,
                ..
            } => {
                let mutable = self.resolve_mutability(mutability);
                DataType::reference(mutable, self.render_type(underlying))
            }
        }
    }

    // ============================================================
    // Direct constraints
    // ============================================================

    /// Resolves a lifetime term.
    /// A term that already has a different lifetime keeps the first one.
    pub fn resolve_lifetime_term(&mut self, lifetime_term: TypeVariableRef, lifetime: Lifetime) {
        match self.probe(lifetime_term) {
            TypeTerm::Lifetime(None) => {
                self.table
                    .union_value(lifetime_term, TypeTerm::Lifetime(Some(lifetime)));
            }
            TypeTerm::Lifetime(Some(existing)) if existing != lifetime => {
                unify_log!(format!(
                    "[Unify] lifetime term kept {} instead of {}",
                    existing, lifetime
                ));
            }
            _ => {}
        }
    }

    /// ANDs a fixed mutability into a mutability variable
    pub fn constrain_mutability(&mut self, variable: TypeVariableRef, mutable: bool) {
        self.table
            .union_value(variable, TypeTerm::Mutability(Some(mutable)));
    }

    // ============================================================
    // Unification
    // ============================================================

    /// Unifies two terms. `left` is the expected side, `right` the supplied side.
    /// Returns false if the terms could not be made equal; the reason is in `result`.
    pub fn unify<R>(&mut self, left: TypeVariableRef, right: TypeVariableRef, result: &mut R) -> bool
    where
        R: TypeUnificationResult + ?Sized,
    {
        let left = self.table.find(left);
        let right = self.table.find(right);
        if left == right {
            return true;
        }

        let left_term = self.probe(left);
        let right_term = self.probe(right);

        match (&left_term, &right_term) {
            (TypeTerm::Literal(left_type), TypeTerm::Literal(right_type)) => {
                if left_type == right_type {
                    self.table.union(left, right);
                    true
                } else {
                    self.report_mismatch(left, right, result);
                    false
                }
            }

            (
                TypeTerm::Constructor {
                    name: left_name,
                    argument: left_argument,
                },
                TypeTerm::Constructor {
                    name: right_name,
                    argument: right_argument,
                },
            ) => {
                if left_name != right_name {
                    self.report_mismatch(left, right, result);
                    return false;
                }

                let mut inner = UnificationOutcome::new();
                let arguments_unified = self.unify(*left_argument, *right_argument, &mut inner);

                if inner.expected_mutable {
                    result.set_expected_mutable();
                }
                for constraint in inner.failed_constraints {
                    result.add_failed_type_constraint(constraint);
                }

                if arguments_unified {
                    self.table.union(left, right);
                    true
                } else {
                    self.report_mismatch(left, right, result);
                    false
                }
            }

            (
                TypeTerm::Reference {
                    mutability: left_mutability,
                    underlying: left_underlying,
                    lifetime: left_lifetime,
                },
                TypeTerm::Reference {
                    mutability: right_mutability,
                    underlying: right_underlying,
                    lifetime: right_lifetime,
                },
            ) => {
                self.unify_mutability(*left_mutability, *right_mutability, left, right, result);
                let underlying_unified = self.unify(*left_underlying, *right_underlying, result);
                self.unify_lifetimes(*left_lifetime, *right_lifetime);
                underlying_unified
            }

            (TypeTerm::Lifetime(_), TypeTerm::Lifetime(_)) => {
                self.unify_lifetimes(left, right);
                true
            }

            (TypeTerm::Mutability(_), TypeTerm::Mutability(_))
            | (TypeTerm::Variable { .. }, TypeTerm::Variable { .. }) => {
                self.table.union(left, right);
                true
            }

            (TypeTerm::Variable { constraints, .. }, _) => {
                self.bind_variable(left, constraints, right, (left, right), result)
            }

            (_, TypeTerm::Variable { constraints, .. }) => {
                self.bind_variable(right, constraints, left, (left, right), result)
            }

            _ => {
                self.report_mismatch(left, right, result);
                false
            }
        }
    }

    fn bind_variable<R>(
        &mut self,
        variable: TypeVariableRef,
        constraints: &[TypeConstraint],
        term: TypeVariableRef,
        (expected, found): (TypeVariableRef, TypeVariableRef),
        result: &mut R,
    ) -> bool
    where
        R: TypeUnificationResult + ?Sized,
    {
        // Binding a variable into a term that contains it would build an infinite type
        if self.occurs_in(variable, term) {
            self.report_mismatch(expected, found, result);
            return false;
        }

        for constraint in constraints {
            if !self.check_constraint(term, *constraint) {
                unify_log!(format!(
                    "[Unify] '{}' does not satisfy {}",
                    self.render_type(term),
                    constraint.as_str()
                ));
                result.add_failed_type_constraint(*constraint);
            }
        }

        self.table.union(variable, term);
        true
    }

    fn occurs_in(&mut self, variable: TypeVariableRef, term: TypeVariableRef) -> bool {
        if self.same_term(variable, term) {
            return true;
        }

        match self.probe(term) {
            TypeTerm::Constructor { argument, .. } => self.occurs_in(variable, argument),
            TypeTerm::Reference { underlying, .. } => self.occurs_in(variable, underlying),
            _ => false,
        }
    }

    /// Checks a constraint against a term.
    /// Unresolved parts of the term take the constraint on and are checked when bound.
    pub fn check_constraint(&mut self, term: TypeVariableRef, constraint: TypeConstraint) -> bool {
        match self.probe(term) {
            TypeTerm::Variable {
                id,
                mut constraints,
            } => {
                if !constraints.contains(&constraint) {
                    constraints.push(constraint);
                    self.table
                        .union_value(term, TypeTerm::Variable { id, constraints });
                }
                true
            }
            TypeTerm::Literal(data_type) => data_type.satisfies(constraint),
            TypeTerm::Constructor { name, argument } => match (constraint, name) {
                (TypeConstraint::Copy, ConstructorName::Option) => {
                    self.check_constraint(argument, constraint)
                }
                _ => false,
            },
            TypeTerm::Reference {
                mutability,
                underlying,
                ..
            } => match constraint {
                TypeConstraint::Copy => match mutability {
                    MutabilityTerm::Fixed(mutable) => !mutable,
                    MutabilityTerm::Variable(variable) => {
                        !matches!(self.probe(variable), TypeTerm::Mutability(Some(true)))
                    }
                },
                TypeConstraint::Display => self.check_constraint(underlying, constraint),
            },
            TypeTerm::Lifetime(_) | TypeTerm::Mutability(_) => false,
        }
    }

    /// Fixed against fixed must agree. Anything against a variable constrains it.
    fn unify_mutability<R>(
        &mut self,
        left: MutabilityTerm,
        right: MutabilityTerm,
        left_reference: TypeVariableRef,
        right_reference: TypeVariableRef,
        result: &mut R,
    ) where
        R: TypeUnificationResult + ?Sized,
    {
        match (left, right) {
            (MutabilityTerm::Fixed(expected), MutabilityTerm::Fixed(found)) => {
                if expected && !found {
                    result.set_expected_mutable();
                } else if !expected && found {
                    self.report_mismatch(left_reference, right_reference, result);
                }
            }
            (MutabilityTerm::Fixed(mutable), MutabilityTerm::Variable(variable))
            | (MutabilityTerm::Variable(variable), MutabilityTerm::Fixed(mutable)) => {
                self.constrain_mutability(variable, mutable);
            }
            (MutabilityTerm::Variable(left), MutabilityTerm::Variable(right)) => {
                self.table.union(left, right);
            }
        }
    }

    /// One resolved side is adopted by the other, two unresolved sides are linked.
    /// Two different resolved lifetimes are left as they are.
    fn unify_lifetimes(&mut self, left: TypeVariableRef, right: TypeVariableRef) {
        let left = self.table.find(left);
        let right = self.table.find(right);
        if left == right {
            return;
        }

        match (self.probe(left), self.probe(right)) {
            (TypeTerm::Lifetime(Some(left_lifetime)), TypeTerm::Lifetime(Some(right_lifetime))) => {
                if left_lifetime == right_lifetime {
                    self.table.union(left, right);
                } else {
                    unify_log!(format!(
                        "[Unify] conflicting lifetimes {} and {}, keeping both",
                        left_lifetime, right_lifetime
                    ));
                }
            }
            (TypeTerm::Lifetime(_), TypeTerm::Lifetime(_)) => {
                self.table.union(left, right);
            }
            _ => {}
        }
    }

    fn report_mismatch<R>(&mut self, expected: TypeVariableRef, found: TypeVariableRef, result: &mut R)
    where
        R: TypeUnificationResult + ?Sized,
    {
        let expected = self.render_type(expected);
        let found = self.render_type(found);
        unify_log!(format!("[Unify] mismatch: expected {} found {}", expected, found));
        result.set_type_mismatch(expected, found);
    }
}
