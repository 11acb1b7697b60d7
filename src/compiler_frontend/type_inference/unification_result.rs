use crate::compiler_frontend::datatypes::{DataType, TypeConstraint};

/// Where unification reports the problems it finds.
/// Unification never stops at the first problem, it reports and carries on.
pub trait TypeUnificationResult {
    fn set_type_mismatch(&mut self, expected: DataType, found: DataType);

    /// A fixed immutable reference met a place that requires a mutable one
    fn set_expected_mutable(&mut self);

    fn add_failed_type_constraint(&mut self, constraint: TypeConstraint);
}

/// Collects everything a single unification reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnificationOutcome {
    pub mismatches: Vec<(DataType, DataType)>,
    pub expected_mutable: bool,
    pub failed_constraints: Vec<TypeConstraint>,
}

impl UnificationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && !self.expected_mutable && self.failed_constraints.is_empty()
    }
}

impl TypeUnificationResult for UnificationOutcome {
    fn set_type_mismatch(&mut self, expected: DataType, found: DataType) {
        self.mismatches.push((expected, found));
    }

    fn set_expected_mutable(&mut self) {
        self.expected_mutable = true;
    }

    fn add_failed_type_constraint(&mut self, constraint: TypeConstraint) {
        if !self.failed_constraints.contains(&constraint) {
            self.failed_constraints.push(constraint);
        }
    }
}
