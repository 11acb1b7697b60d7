//! Type, mutability and lifetime inference over a dataflow graph.
//!
//! Passes, in order:
//!  1. Facade construction gives every port a facade and an initial type term
//!  2. Edge unification walks every wire once and decides every auto-borrow group
//!  3. Borrow insertion materialises the borrows, lifetime terminations and drops
//!
//! Type problems are collected per port and never stop a pass. Broken contracts
//! between the passes are `CompilerError`s.

pub mod auto_borrow;
pub mod lifetime_graph;
pub mod lifetimes;
pub mod port_facades;
pub mod type_variables;
pub mod types;
pub mod unification_result;
pub mod variables;

mod borrow_insertion;
mod edge_unification;
mod facade_construction;

pub(crate) use borrow_insertion::insert_borrows;
pub(crate) use edge_unification::unify_edges;
pub(crate) use facade_construction::construct_facades;

use crate::compiler_frontend::compiler_messages::port_diagnostics::PortDiagnostics;
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{Direction, NodeId};
use crate::compiler_frontend::type_inference::auto_borrow::BorrowGroups;
use crate::compiler_frontend::type_inference::lifetime_graph::LifetimeGraphForest;
use crate::compiler_frontend::type_inference::port_facades::FacadeTable;
use crate::compiler_frontend::type_inference::type_variables::TypeVariableStore;
use crate::compiler_frontend::type_inference::types::{
    InferenceReport, InferenceStats, PortAnnotation,
};
use crate::compiler_frontend::type_inference::variables::VariableStore;
use rustc_hash::FxHashMap;

/// All state of one compilation unit's inference.
/// Owned by a single run and dropped with it.
#[derive(Default)]
pub struct InferenceContext {
    pub types: TypeVariableStore,
    pub variables: VariableStore,
    pub lifetimes: LifetimeGraphForest,
    pub facades: FacadeTable,
    pub groups: BorrowGroups,
    pub diagnostics: PortDiagnostics,
    pub stats: InferenceStats,

    /// Dependency-respecting node order fixed by facade construction
    pub order: Vec<NodeId>,
}

impl InferenceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotates every port that has a facade
    pub fn build_report(mut self, graph: &DataflowGraph) -> InferenceReport {
        let mut annotations = FxHashMap::default();

        for port in graph.ports() {
            let Some(facade) = self.facades.try_get(port.id).copied() else {
                continue;
            };

            let variable = match port.direction {
                Direction::Input => facade.true_variable(),
                Direction::Output => facade.facade_variable(),
            };

            let data = self.variables.get(variable);
            let mutable = if data.data_type.is_reference() {
                data.data_type.is_mutable_reference()
            } else {
                data.mutable
            };

            annotations.insert(
                port.id,
                PortAnnotation {
                    variable: data.id,
                    data_type: data.data_type,
                    mutable,
                    lifetime: data.lifetime,
                },
            );
        }

        InferenceReport {
            annotations,
            diagnostics: self.diagnostics,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests;
