//! Facade construction.
//!
//! Visits every node once in dependency order and gives each of its ports a facade and an
//! initial type term. The facade kind of every port is fixed by the node kind:
//!  - Immutable reference parameters form `AllowImmutable` groups
//!  - Mutable reference parameters and iterate tunnels form `RequireMutable` groups
//!  - Polymorphic reference parameters form `Polymorphic` groups
//!  - Outputs paired with a reference input are termination output facades
//!  - Output tunnels are tunnel facades
//!  - Everything else is a simple facade

use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorLocation, ErrorType};
use crate::compiler_frontend::compiler_messages::port_diagnostics::DiagnosticKind;
use crate::compiler_frontend::datatypes::{ConstructorName, DataType};
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{
    BorderNodeKind, DfirNode, Direction, NodeId, NodeKind, PortId,
};
use crate::compiler_frontend::dfir::signatures::{NodeSignature, SignatureMutability, SignatureType};
use crate::compiler_frontend::dfir::visit_order::visit_order;
use crate::compiler_frontend::type_inference::InferenceContext;
use crate::compiler_frontend::type_inference::auto_borrow::{BorrowPolicy, GroupId};
use crate::compiler_frontend::type_inference::port_facades::PortFacade;
use crate::compiler_frontend::type_inference::type_variables::{MutabilityTerm, TypeVariableRef};
use crate::compiler_frontend::type_inference::variables::VariableRef;
use crate::facade_log;
use crate::return_compiler_error;
use crate::settings::InferenceConfig;
use rustc_hash::FxHashMap;

pub(crate) fn construct_facades(
    graph: &DataflowGraph,
    config: &InferenceConfig,
    context: &mut InferenceContext,
) -> Result<(), CompilerError> {
    // Scopes are created parent first, so every parent graph exists before its children
    for scope in graph.scopes() {
        context.lifetimes.establish_graph(scope.id, scope.parent)?;
    }

    context.order = visit_order(graph)?;

    let mut construction = FacadeConstruction {
        graph,
        config,
        context,
        borrow_tunnels: FxHashMap::default(),
    };

    let order = construction.context.order.clone();
    for node_id in order {
        construction.visit_node(graph.node(node_id)?)?;
        construction.context.stats.nodes_visited += 1;
    }

    facade_log!(format!(
        "[Facades] {} facades over {} nodes, {} borrow groups",
        context.facades.len(),
        context.stats.nodes_visited,
        context.groups.len()
    ));

    Ok(())
}

struct FacadeConstruction<'a> {
    graph: &'a DataflowGraph,
    config: &'a InferenceConfig,
    context: &'a mut InferenceContext,

    /// Input variable of each borrow tunnel, restored by its terminate tunnel
    borrow_tunnels: FxHashMap<NodeId, VariableRef>,
}

impl<'a> FacadeConstruction<'a> {
    fn visit_node(&mut self, node: &DfirNode) -> Result<(), CompilerError> {
        match &node.kind {
            NodeKind::Constant {
                value_type,
                mutable,
            } => self.visit_constant(node, value_type, *mutable),
            NodeKind::Functional(signature) => self.visit_functional(node, signature),
            NodeKind::ExplicitBorrow { mutable, count } => {
                self.visit_explicit_borrow(node, *mutable, *count)
            }
            NodeKind::TerminateLifetime { .. } => Err(CompilerError::new(
                "Lifetime termination nodes are only inserted by inference and cannot be placed",
                ErrorLocation::at_node(node.id),
                ErrorType::Compiler,
            )),
            NodeKind::Drop => {
                let term = self.context.types.create_fresh_variable(Vec::new());
                let variable = self.context.variables.create_typed_variable(false, term);
                self.simple(self.port(&node.inputs, 0)?, variable)
            }
            NodeKind::Structure(_) => Ok(()),
            NodeKind::Border { structure, kind } => self.visit_border(node, *structure, *kind),
        }
    }

    // ============================================================
    // Plain nodes
    // ============================================================
    fn visit_constant(
        &mut self,
        node: &DfirNode,
        value_type: &DataType,
        mutable: bool,
    ) -> Result<(), CompilerError> {
        let output = self.port(&node.outputs, 0)?;
        let term = self.context.types.create_literal(value_type);
        let variable = self.context.variables.create_typed_variable(mutable, term);
        self.simple(output, variable)?;

        self.check_features(output, value_type.constructors());
        Ok(())
    }

    fn visit_functional(
        &mut self,
        node: &DfirNode,
        signature: &NodeSignature,
    ) -> Result<(), CompilerError> {
        let mut instance = SignatureInstance {
            generics: signature
                .type_params
                .iter()
                .map(|param| {
                    self.context
                        .types
                        .create_fresh_variable(param.constraints.clone())
                })
                .collect(),
            lifetimes: FxHashMap::default(),
            mutabilities: FxHashMap::default(),
        };

        let mut groups = FxHashMap::default();
        let mut ports_by_parameter = Vec::with_capacity(signature.parameters.len());
        let mut terms_by_parameter = Vec::with_capacity(signature.parameters.len());

        for (parameter_index, parameter) in signature.parameters.iter().enumerate() {
            let Some(port_index) = signature.port_index(parameter_index) else {
                return_compiler_error!(
                    "Signature '{}' has no parameter {}",
                    signature.name,
                    parameter_index
                );
            };

            let port = match parameter.direction {
                Direction::Input => self.port(&node.inputs, port_index)?,
                Direction::Output => self.port(&node.outputs, port_index)?,
            };
            ports_by_parameter.push(port);

            let term = self.instantiate(&parameter.ty, &mut instance)?;
            terms_by_parameter.push(term);

            let mut constructors = Vec::new();
            parameter.ty.collect_constructors(&mut constructors);
            self.check_features(port, constructors);

            match (parameter.direction, parameter.ty.reference_lifetime()) {
                (Direction::Input, Some((lifetime, mutability))) => {
                    let group = match groups.get(&lifetime) {
                        Some(group) => *group,
                        None => {
                            let Some(lifetime_term) = instance.lifetimes.get(&lifetime).copied()
                            else {
                                return_compiler_error!(
                                    "'{}' has a reference without a lifetime term",
                                    signature.name
                                );
                            };
                            let group = self.context.groups.create_group(
                                node.id,
                                node.scope,
                                policy_for(mutability),
                                lifetime_term,
                            );
                            groups.insert(lifetime, group);
                            group
                        }
                    };

                    self.reference_input(port, term, group)?;
                }
                // Given a termination output facade once every group exists
                (Direction::Output, _) if parameter.pairs_with.is_some() => {}
                (direction, _) => {
                    // Results are fresh temporaries, free to be borrowed mutably
                    let temporary = direction == Direction::Output;
                    let variable = self.context.variables.create_typed_variable(temporary, term);
                    self.simple(port, variable)?;
                }
            }
        }

        for (parameter_index, parameter) in signature.parameters.iter().enumerate() {
            let Some(input_index) = parameter.pairs_with else {
                continue;
            };

            let output = ports_by_parameter[parameter_index];
            let paired_input = ports_by_parameter.get(input_index).copied();
            match paired_input {
                Some(input) if self.context.facades.is_reference_input(input) => {
                    let true_variable = self
                        .context
                        .variables
                        .create_typed_variable(true, terms_by_parameter[parameter_index]);

                    // Settled by edge unification once the group has decided
                    let handed_back = self.context.types.create_fresh_variable(Vec::new());
                    let facade_variable = self
                        .context
                        .variables
                        .create_typed_variable(true, handed_back);

                    self.insert(
                        output,
                        PortFacade::TerminationOutput {
                            true_variable,
                            facade_variable,
                            closes: input,
                        },
                    )?;
                    self.context.groups.pair_output(input, output)?;
                }
                _ => {
                    return_compiler_error!(
                        "'{}' pairs output '{}' with parameter {}, which is not a reference input",
                        signature.name,
                        parameter.name,
                        input_index
                    );
                }
            }
        }

        Ok(())
    }

    /// A borrow the user placed. It opens its lifetime here and now.
    fn visit_explicit_borrow(
        &mut self,
        node: &DfirNode,
        mutable: bool,
        count: usize,
    ) -> Result<(), CompilerError> {
        let lifetime = self.context.lifetimes.create_bounded_lifetime(node.scope)?;
        let lifetime_term = self.context.types.create_lifetime(Some(lifetime));

        for index in 0..count {
            let underlying = self.context.types.create_fresh_variable(Vec::new());
            let borrowed = self.context.variables.create_typed_variable(false, underlying);
            self.simple(self.port(&node.inputs, index)?, borrowed)?;

            let reference = self.context.types.create_reference(
                MutabilityTerm::Fixed(mutable),
                underlying,
                lifetime_term,
            );
            let variable = self.context.variables.create_typed_variable(false, reference);
            self.simple(self.port(&node.outputs, index)?, variable)?;

            self.context
                .variables
                .add_interrupted_variable(lifetime, borrowed);
        }

        Ok(())
    }

    // ============================================================
    // Border nodes
    // ============================================================
    fn visit_border(
        &mut self,
        node: &DfirNode,
        structure: NodeId,
        kind: BorderNodeKind,
    ) -> Result<(), CompilerError> {
        match kind {
            BorderNodeKind::InputTunnel => {
                // The same value is seen on both sides of the boundary
                let term = self.context.types.create_fresh_variable(Vec::new());
                let variable = self.context.variables.create_typed_variable(false, term);
                self.simple(self.port(&node.inputs, 0)?, variable)?;
                for output in &node.outputs {
                    self.simple(*output, variable)?;
                }
                Ok(())
            }

            BorderNodeKind::OutputTunnel => self.visit_output_tunnel(node, structure),

            BorderNodeKind::BorrowTunnel { mutable } => {
                let underlying = self.context.types.create_fresh_variable(Vec::new());
                let borrowed = self.context.variables.create_typed_variable(false, underlying);
                self.simple(self.port(&node.inputs, 0)?, borrowed)?;

                // Lives as long as the structure, so it outlasts the body
                let lifetime = self.context.lifetimes.create_bounded_lifetime(node.scope)?;
                let lifetime_term = self.context.types.create_lifetime(Some(lifetime));
                let reference = self.context.types.create_reference(
                    MutabilityTerm::Fixed(mutable),
                    underlying,
                    lifetime_term,
                );
                let variable = self.context.variables.create_typed_variable(false, reference);
                for output in &node.outputs {
                    self.simple(*output, variable)?;
                }

                self.context
                    .variables
                    .add_interrupted_variable(lifetime, borrowed);
                self.borrow_tunnels.insert(node.id, borrowed);
                Ok(())
            }

            BorderNodeKind::TerminateLifetimeTunnel { borrow_tunnel } => {
                let Some(restored) = self.borrow_tunnels.get(&borrow_tunnel).copied() else {
                    return Err(CompilerError::new(
                        format!("Terminate tunnel reached before its borrow tunnel {borrow_tunnel}"),
                        ErrorLocation::at_node(node.id),
                        ErrorType::Compiler,
                    ));
                };

                for input in &node.inputs {
                    let term = self.context.types.create_fresh_variable(Vec::new());
                    let variable = self.context.variables.create_typed_variable(false, term);
                    self.simple(*input, variable)?;
                }
                self.simple(self.port(&node.outputs, 0)?, restored)
            }

            BorderNodeKind::UnwrapOptionTunnel | BorderNodeKind::OptionSelector => {
                let inner = self.context.types.create_fresh_variable(Vec::new());
                let option = self
                    .context
                    .types
                    .create_constructor(ConstructorName::Option, inner);

                let input = self.port(&node.inputs, 0)?;
                let outer = self.context.variables.create_typed_variable(false, option);
                self.simple(input, outer)?;
                self.check_features(input, vec![ConstructorName::Option]);

                let unwrapped = self.context.variables.create_typed_variable(false, inner);
                self.simple(self.port(&node.outputs, 0)?, unwrapped)
            }

            BorderNodeKind::LoopCondition => {
                let condition = self.context.types.create_literal(&DataType::Bool);
                let outer = self.context.variables.create_typed_variable(true, condition);
                self.simple(self.port(&node.inputs, 0)?, outer)?;

                // Bounded outside the body so it outlasts every iteration
                let lifetime = self.context.lifetimes.create_bounded_lifetime(node.scope)?;
                let lifetime_term = self.context.types.create_lifetime(Some(lifetime));
                let reference = self.context.types.create_reference(
                    MutabilityTerm::Fixed(true),
                    condition,
                    lifetime_term,
                );
                let inner = self.context.variables.create_typed_variable(false, reference);
                self.simple(self.port(&node.outputs, 0)?, inner)
            }

            BorderNodeKind::IterateTunnel => {
                let item = self.context.types.create_fresh_variable(Vec::new());
                let iterator = self
                    .context
                    .types
                    .create_constructor(ConstructorName::Iterator, item);
                let lifetime_term = self.context.types.create_lifetime(None);
                let reference = self.context.types.create_reference(
                    MutabilityTerm::Fixed(true),
                    iterator,
                    lifetime_term,
                );

                let input = self.port(&node.inputs, 0)?;
                let group = self.context.groups.create_group(
                    node.id,
                    node.scope,
                    BorrowPolicy::RequireMutable,
                    lifetime_term,
                );
                self.reference_input(input, reference, group)?;
                self.check_features(input, vec![ConstructorName::Iterator]);

                let element = self.context.variables.create_typed_variable(false, item);
                self.simple(self.port(&node.outputs, 0)?, element)
            }
        }
    }

    /// Every arm feeds the same type. Outside, a body that may not run delivers an Option
    /// unless the structure merges its arms.
    fn visit_output_tunnel(
        &mut self,
        node: &DfirNode,
        structure: NodeId,
    ) -> Result<(), CompilerError> {
        let NodeKind::Structure(structure_kind) = self.graph.node(structure)?.kind else {
            return_compiler_error!("Output tunnel {} is attached to a non-structure", node.id);
        };

        let mut conditional = false;
        for scope in self.graph.inner_scopes(structure)? {
            conditional |= self.graph.scope(*scope)?.executes_conditionally;
        }

        let value = self.context.types.create_fresh_variable(Vec::new());
        let mut inner_variables = Vec::with_capacity(node.inputs.len());
        for input in &node.inputs {
            let variable = self.context.variables.create_typed_variable(false, value);
            self.simple(*input, variable)?;
            inner_variables.push(variable);
        }

        let Some(true_variable) = inner_variables.first().copied() else {
            return_compiler_error!("Output tunnel {} has no inner inputs", node.id);
        };

        let output = self.port(&node.outputs, 0)?;
        let facade_variable = if conditional && !structure_kind.merges_branches() {
            let option = self
                .context
                .types
                .create_constructor(ConstructorName::Option, value);
            self.check_features(output, vec![ConstructorName::Option]);
            self.context.variables.create_typed_variable(false, option)
        } else {
            self.context.variables.create_typed_variable(false, value)
        };

        self.insert(
            output,
            PortFacade::Tunnel {
                true_variable,
                facade_variable,
            },
        )
    }

    // ============================================================
    // Helpers
    // ============================================================
    fn instantiate(
        &mut self,
        ty: &SignatureType,
        instance: &mut SignatureInstance,
    ) -> Result<TypeVariableRef, CompilerError> {
        match ty {
            SignatureType::Generic(index) => match instance.generics.get(*index) {
                Some(term) => Ok(*term),
                None => return_compiler_error!("Signature uses undeclared generic {}", index),
            },
            SignatureType::Concrete(data_type) => Ok(self.context.types.create_literal(data_type)),
            SignatureType::Constructor(name, inner) => {
                let argument = self.instantiate(inner, instance)?;
                Ok(self.context.types.create_constructor(*name, argument))
            }
            SignatureType::Reference {
                mutability,
                referent,
                lifetime,
            } => {
                let underlying = self.instantiate(referent, instance)?;

                let lifetime_term = match instance.lifetimes.get(lifetime) {
                    Some(term) => *term,
                    None => {
                        let term = self.context.types.create_lifetime(None);
                        instance.lifetimes.insert(*lifetime, term);
                        term
                    }
                };

                let mutability = match mutability {
                    SignatureMutability::Immutable => MutabilityTerm::Fixed(false),
                    SignatureMutability::Mutable => MutabilityTerm::Fixed(true),
                    SignatureMutability::Polymorphic => {
                        let variable = match instance.mutabilities.get(lifetime) {
                            Some(variable) => *variable,
                            None => {
                                let variable = self.context.types.create_mutability_variable();
                                instance.mutabilities.insert(*lifetime, variable);
                                variable
                            }
                        };
                        MutabilityTerm::Variable(variable)
                    }
                };

                Ok(self
                    .context
                    .types
                    .create_reference(mutability, underlying, lifetime_term))
            }
        }
    }

    /// The node sees `true_term`. The wire side starts as a fresh variable and becomes
    /// whatever is supplied.
    fn reference_input(
        &mut self,
        port: PortId,
        true_term: TypeVariableRef,
        group: GroupId,
    ) -> Result<(), CompilerError> {
        let true_variable = self.context.variables.create_typed_variable(false, true_term);
        let supplied = self.context.types.create_fresh_variable(Vec::new());
        let facade_variable = self.context.variables.create_typed_variable(false, supplied);

        self.insert(
            port,
            PortFacade::ReferenceInput {
                true_variable,
                facade_variable,
                group,
            },
        )?;
        self.context.groups.add_member(group, port)
    }

    fn simple(&mut self, port: PortId, variable: VariableRef) -> Result<(), CompilerError> {
        self.insert(port, PortFacade::Simple { variable })
    }

    fn insert(&mut self, port: PortId, facade: PortFacade) -> Result<(), CompilerError> {
        self.context.facades.insert(port, facade)?;
        self.context.stats.facades_created += 1;
        Ok(())
    }

    fn port(&self, ports: &[PortId], index: usize) -> Result<PortId, CompilerError> {
        match ports.get(index) {
            Some(port) => Ok(*port),
            None => return_compiler_error!("Node is missing port {}", index),
        }
    }

    fn check_features(&mut self, port: PortId, constructors: Vec<ConstructorName>) {
        for constructor in constructors {
            if !self.config.is_enabled(constructor) {
                self.context
                    .diagnostics
                    .push(port, DiagnosticKind::FeatureDisabled(constructor));
            }
        }
    }
}

/// Terms created for one use of a signature
struct SignatureInstance {
    generics: Vec<TypeVariableRef>,
    lifetimes: FxHashMap<usize, TypeVariableRef>,
    mutabilities: FxHashMap<usize, TypeVariableRef>,
}

fn policy_for(mutability: SignatureMutability) -> BorrowPolicy {
    match mutability {
        SignatureMutability::Immutable => BorrowPolicy::AllowImmutable,
        SignatureMutability::Mutable => BorrowPolicy::RequireMutable,
        SignatureMutability::Polymorphic => BorrowPolicy::Polymorphic,
    }
}
