//! Per-port adapters between what a port really holds and what the wires see.
//!
//! For most ports the two are the same variable. A reference input sees the supplied
//! value through its facade while the node works with the reference behind it, which
//! is what lets a borrow be inserted without the rest of the graph noticing.

use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorLocation, ErrorType};
use crate::compiler_frontend::dfir::dfir_nodes::PortId;
use crate::compiler_frontend::type_inference::auto_borrow::GroupId;
use crate::compiler_frontend::type_inference::variables::VariableRef;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortFacade {
    Simple {
        variable: VariableRef,
    },

    /// Takes part in an auto-borrow decision for its group
    ReferenceInput {
        true_variable: VariableRef,
        facade_variable: VariableRef,
        group: GroupId,
    },

    /// Leaves a structure. When the body may not run the outside sees an Option.
    Tunnel {
        true_variable: VariableRef,
        facade_variable: VariableRef,
    },

    /// Output paired with the reference input `closes`. The node produces the reference.
    /// The wires see the supplied value once the group borrowed, or the reference when it
    /// reused a lifetime.
    TerminationOutput {
        true_variable: VariableRef,
        facade_variable: VariableRef,
        closes: PortId,
    },
}

impl PortFacade {
    /// The variable the wires see
    pub fn facade_variable(&self) -> VariableRef {
        match self {
            PortFacade::Simple { variable } => *variable,
            PortFacade::ReferenceInput {
                facade_variable, ..
            }
            | PortFacade::Tunnel {
                facade_variable, ..
            }
            | PortFacade::TerminationOutput {
                facade_variable, ..
            } => *facade_variable,
        }
    }

    /// The variable the node itself works with
    pub fn true_variable(&self) -> VariableRef {
        match self {
            PortFacade::Simple { variable } => *variable,
            PortFacade::ReferenceInput { true_variable, .. }
            | PortFacade::Tunnel { true_variable, .. }
            | PortFacade::TerminationOutput { true_variable, .. } => *true_variable,
        }
    }

    pub fn group(&self) -> Option<GroupId> {
        match self {
            PortFacade::ReferenceInput { group, .. } => Some(*group),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct FacadeTable {
    facades: FxHashMap<PortId, PortFacade>,
}

impl FacadeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every port gets exactly one facade
    pub fn insert(&mut self, port: PortId, facade: PortFacade) -> Result<(), CompilerError> {
        if self.facades.insert(port, facade).is_some() {
            return Err(CompilerError::new(
                format!("{port} was given a second facade"),
                ErrorLocation {
                    port: Some(port),
                    ..ErrorLocation::default()
                },
                ErrorType::Compiler,
            ));
        }

        Ok(())
    }

    pub fn get(&self, port: PortId) -> Result<&PortFacade, CompilerError> {
        match self.facades.get(&port) {
            Some(facade) => Ok(facade),
            None => Err(CompilerError::new(
                format!("{port} has no facade. Facade construction must run before unification"),
                ErrorLocation {
                    port: Some(port),
                    ..ErrorLocation::default()
                },
                ErrorType::Compiler,
            )),
        }
    }

    pub fn try_get(&self, port: PortId) -> Option<&PortFacade> {
        self.facades.get(&port)
    }

    pub fn facade_variable(&self, port: PortId) -> Result<VariableRef, CompilerError> {
        Ok(self.get(port)?.facade_variable())
    }

    pub fn true_variable(&self, port: PortId) -> Result<VariableRef, CompilerError> {
        Ok(self.get(port)?.true_variable())
    }

    /// Once a borrow is explicit in the graph the port carries what the node produces
    pub fn collapse_to_true(&mut self, port: PortId) -> Result<VariableRef, CompilerError> {
        let variable = self.get(port)?.true_variable();
        self.facades.insert(port, PortFacade::Simple { variable });
        Ok(variable)
    }

    pub fn is_reference_input(&self, port: PortId) -> bool {
        matches!(
            self.facades.get(&port),
            Some(PortFacade::ReferenceInput { .. })
        )
    }

    pub fn len(&self) -> usize {
        self.facades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facades.is_empty()
    }
}
