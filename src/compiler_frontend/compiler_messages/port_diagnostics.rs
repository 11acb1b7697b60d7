//! Recoverable problems found during inference, attached to the port they were found on.
//!
//! Nothing here aborts inference. Every failure mode of a single unification is kept,
//! so a port can carry both a type mismatch and a mutability violation.

use crate::compiler_frontend::datatypes::{ConstructorName, DataType, TypeConstraint};
use crate::compiler_frontend::dfir::dfir_nodes::PortId;
use crate::compiler_frontend::type_inference::unification_result::UnificationOutcome;
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    TypeMismatch { expected: DataType, found: DataType },

    /// An immutable value was supplied where a mutable reference is required
    NotMutable,

    /// A type does not satisfy a constraint of the generic it was bound to
    FailedConstraint(TypeConstraint),

    FeatureDisabled(ConstructorName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDiagnostic {
    pub port: PortId,
    pub kind: DiagnosticKind,
}

impl PortDiagnostic {
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::TypeMismatch { expected, found } => {
                format!("Expected a value of type '{expected}' but found '{found}'")
            }
            DiagnosticKind::NotMutable => {
                String::from("This input needs a mutable value but the value supplied is not mutable")
            }
            DiagnosticKind::FailedConstraint(constraint) => format!(
                "The type of this value does not satisfy '{}'",
                constraint.as_str()
            ),
            DiagnosticKind::FeatureDisabled(name) => format!(
                "'{}' values are disabled in this configuration",
                name.as_str()
            ),
        }
    }
}

impl fmt::Display for PortDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.port, self.message())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PortDiagnostics {
    by_port: FxHashMap<PortId, Vec<PortDiagnostic>>,
}

impl PortDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, port: PortId, kind: DiagnosticKind) {
        let entries = self.by_port.entry(port).or_default();

        // The same fan-out or group can report an identical problem more than once
        if entries.iter().any(|existing| existing.kind == kind) {
            return;
        }

        entries.push(PortDiagnostic { port, kind });
    }

    /// Attaches every failure of one unification to a port
    pub fn record_outcome(&mut self, port: PortId, outcome: UnificationOutcome) {
        for (expected, found) in outcome.mismatches {
            self.push(port, DiagnosticKind::TypeMismatch { expected, found });
        }

        if outcome.expected_mutable {
            self.push(port, DiagnosticKind::NotMutable);
        }

        for constraint in outcome.failed_constraints {
            self.push(port, DiagnosticKind::FailedConstraint(constraint));
        }
    }

    pub fn for_port(&self, port: PortId) -> &[PortDiagnostic] {
        self.by_port.get(&port).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_port.is_empty()
    }

    /// Number of ports with at least one diagnostic
    pub fn port_count(&self) -> usize {
        self.by_port.len()
    }

    pub fn len(&self) -> usize {
        self.by_port.values().map(Vec::len).sum()
    }

    /// Diagnostics ordered by port so output is stable
    pub fn sorted(&self) -> Vec<&PortDiagnostic> {
        let mut ports = self.by_port.keys().copied().collect::<Vec<_>>();
        ports.sort();

        ports
            .into_iter()
            .flat_map(|port| self.for_port(port).iter())
            .collect()
    }
}
