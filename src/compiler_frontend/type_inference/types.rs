use crate::compiler_frontend::compiler_messages::port_diagnostics::PortDiagnostics;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::dfir::dfir_nodes::PortId;
use crate::compiler_frontend::type_inference::lifetimes::Lifetime;
use rustc_hash::FxHashMap;

/// Everything inference hands to the validation and lowering layers
#[derive(Debug, Clone, Default)]
pub struct InferenceReport {
    pub annotations: FxHashMap<PortId, PortAnnotation>,
    pub diagnostics: PortDiagnostics,
    pub stats: InferenceStats,
}

impl InferenceReport {
    pub fn annotation(&self, port: PortId) -> Option<&PortAnnotation> {
        self.annotations.get(&port)
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// The resolved state of one port.
/// Inputs report what the node sees, outputs report what the wires see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortAnnotation {
    /// Ports carrying the same value share this id
    pub variable: u32,
    pub data_type: DataType,
    pub mutable: bool,
    pub lifetime: Lifetime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceStats {
    pub nodes_visited: usize,
    pub facades_created: usize,
    pub wires_unified: usize,
    pub groups_decided: usize,
    pub borrows_inserted: usize,
    pub terminations_inserted: usize,
    pub drops_inserted: usize,
}
