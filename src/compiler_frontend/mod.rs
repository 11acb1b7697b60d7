pub mod compiler_messages {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod display_messages;
    pub mod port_diagnostics;
}
pub use compiler_messages::compiler_errors;
pub use compiler_messages::display_messages;

pub mod datatypes;
pub mod dfir;
pub mod type_inference;

use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages, ErrorMetaDataKey};
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::type_inference::types::InferenceReport;
use crate::compiler_frontend::type_inference::{
    InferenceContext, construct_facades, insert_borrows, unify_edges,
};
use crate::settings::InferenceConfig;
use crate::timer_log;
use std::time::Instant;

/// How far inference has got through one graph.
/// Each pass relies on what the one before it established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InferencePhase {
    NotStarted,
    FacadesConstructed,
    EdgesUnified,
    BorrowsInserted,
}

pub struct InferenceFrontend<'a> {
    graph: &'a mut DataflowGraph,
    config: &'a InferenceConfig,
    context: InferenceContext,
    phase: InferencePhase,
}

impl<'a> InferenceFrontend<'a> {
    pub fn new(graph: &'a mut DataflowGraph, config: &'a InferenceConfig) -> Self {
        Self {
            graph,
            config,
            context: InferenceContext::new(),
            phase: InferencePhase::NotStarted,
        }
    }

    pub fn phase(&self) -> InferencePhase {
        self.phase
    }

    pub fn context(&self) -> &InferenceContext {
        &self.context
    }

    /// -----------------------------
    /// FACADE CONSTRUCTION
    /// -----------------------------
    /// Every node is visited once in dependency order.
    /// Each port gets its facade and initial type term from the node's signature,
    /// and every scope gets its lifetime graph.
    pub fn construct_facades(&mut self) -> Result<(), CompilerError> {
        self.expect_phase(InferencePhase::NotStarted, "Facade construction")?;
        let _time = Instant::now();

        construct_facades(self.graph, self.config, &mut self.context)?;

        timer_log!(_time, "Facades constructed in: ");
        self.phase = InferencePhase::FacadesConstructed;
        Ok(())
    }

    /// -----------------------------
    /// EDGE UNIFICATION
    /// -----------------------------
    /// Every wire is unified once. Reference inputs decide whether to reuse
    /// a lifetime or borrow, and type problems are collected per port.
    pub fn unify_edges(&mut self) -> Result<(), CompilerError> {
        self.expect_phase(InferencePhase::FacadesConstructed, "Edge unification")?;
        let _time = Instant::now();

        unify_edges(self.graph, &mut self.context)?;

        timer_log!(_time, "Edges unified in: ");
        self.phase = InferencePhase::EdgesUnified;
        Ok(())
    }

    /// -----------------------------
    /// BORROW INSERTION
    /// -----------------------------
    /// Rewrites the graph in place: borrow nodes in front of borrowing groups,
    /// lifetime terminations where the references come back, drops after those.
    pub fn insert_borrows(&mut self) -> Result<(), CompilerError> {
        self.expect_phase(InferencePhase::EdgesUnified, "Borrow insertion")?;
        let _time = Instant::now();

        insert_borrows(self.graph, self.config, &mut self.context)?;

        timer_log!(_time, "Borrows inserted in: ");
        self.phase = InferencePhase::BorrowsInserted;
        Ok(())
    }

    /// Annotates every port. Only valid once every pass has run.
    pub fn finish(self) -> Result<InferenceReport, CompilerError> {
        self.expect_phase(InferencePhase::BorrowsInserted, "Reporting")?;
        Ok(self.context.build_report(self.graph))
    }

    fn expect_phase(&self, expected: InferencePhase, pass: &str) -> Result<(), CompilerError> {
        if self.phase == expected {
            return Ok(());
        }

        let mut error = CompilerError::compiler_error(format!(
            "{pass} cannot run in phase {:?}, it needs {:?}",
            self.phase, expected
        ));
        error.new_metadata_entry(
            ErrorMetaDataKey::CompilationStage,
            "Inference Pass Sequencing",
        );
        Err(error)
    }
}

/// Runs every inference pass over the graph in order.
/// The graph may gain borrow, lifetime termination and drop nodes.
pub fn infer_types(
    graph: &mut DataflowGraph,
    config: &InferenceConfig,
) -> Result<InferenceReport, CompilerError> {
    let mut frontend = InferenceFrontend::new(graph, config);

    frontend.construct_facades()?;
    frontend.unify_edges()?;
    frontend.insert_borrows()?;

    frontend.finish()
}

/// Runs inference and gathers everything the host should show the user.
/// The report is only handed back when no fatal error stopped inference.
pub fn infer_and_collect_messages(
    graph: &mut DataflowGraph,
    config: &InferenceConfig,
) -> (Option<InferenceReport>, CompilerMessages) {
    match infer_types(graph, config) {
        Ok(report) => {
            let messages = CompilerMessages::from_diagnostics(report.diagnostics.clone());
            (Some(report), messages)
        }
        Err(error) => (None, CompilerMessages::from_error(error)),
    }
}
