#![cfg(test)]

use super::test_support::{constant, functional, input, output, wire};
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::compiler_messages::port_diagnostics::DiagnosticKind;
use crate::compiler_frontend::datatypes::{ConstructorName, DataType};
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{BorderNodeKind, NodeKind, StructureKind};
use crate::compiler_frontend::dfir::signatures;
use crate::compiler_frontend::type_inference::auto_borrow::BorrowPolicy;
use crate::compiler_frontend::type_inference::port_facades::PortFacade;
use crate::compiler_frontend::{InferenceFrontend, InferencePhase, infer_types};
use crate::settings::InferenceConfig;

#[test]
fn every_port_gets_one_facade() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let value = constant(&mut graph, root, DataType::Int32, true);
    let increment = functional(&mut graph, root, signatures::increment());
    let select = functional(&mut graph, root, signatures::select_reference());
    wire(&mut graph, value, 0, increment, 0);

    let port_count = graph.ports().len();
    let config = InferenceConfig::default();
    let mut frontend = InferenceFrontend::new(&mut graph, &config);
    frontend.construct_facades().expect("facades");

    let context = frontend.context();
    assert_eq!(context.facades.len(), port_count);
    assert_eq!(context.stats.facades_created, port_count);
    assert_eq!(context.stats.nodes_visited, 3);
    assert_eq!(context.order.len(), 3);
    assert!(context.order.contains(&select));
}

#[test]
fn reference_parameters_form_groups_by_policy() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let increment = functional(&mut graph, root, signatures::increment());
    let select = functional(&mut graph, root, signatures::select_reference());
    let add = functional(&mut graph, root, signatures::add());

    let increment_in = input(&graph, increment, 0);
    let increment_out = output(&graph, increment, 0);
    let selector = input(&graph, select, 0);
    let true_value = input(&graph, select, 1);
    let false_value = input(&graph, select, 2);
    let x = input(&graph, add, 0);
    let y = input(&graph, add, 1);
    let sum = output(&graph, add, 2);

    let config = InferenceConfig::default();
    let mut frontend = InferenceFrontend::new(&mut graph, &config);
    frontend.construct_facades().expect("facades");
    let context = frontend.context();

    let policy = |port| {
        let group = context.groups.group_of(port).expect("port is grouped");
        context.groups.get(group).expect("group").policy
    };

    assert_eq!(policy(increment_in), BorrowPolicy::RequireMutable);
    assert_eq!(policy(selector), BorrowPolicy::AllowImmutable);
    assert_eq!(policy(true_value), BorrowPolicy::Polymorphic);
    assert_eq!(policy(x), BorrowPolicy::AllowImmutable);

    // Inputs sharing a lifetime parameter share a group
    assert_eq!(
        context.groups.group_of(true_value).expect("group"),
        context.groups.group_of(false_value).expect("group")
    );
    assert_eq!(
        context.groups.group_of(x).expect("group"),
        context.groups.group_of(y).expect("group")
    );
    assert_ne!(
        context.groups.group_of(selector).expect("group"),
        context.groups.group_of(true_value).expect("group")
    );

    // Paired outputs are recorded against their input
    let increment_group = context
        .groups
        .get(context.groups.group_of(increment_in).expect("group"))
        .expect("group");
    assert_eq!(increment_group.members[0].paired_output, Some(increment_out));

    // Until the group decides, a paired output hides the reference behind a fresh facade
    let Some(PortFacade::TerminationOutput {
        true_variable,
        facade_variable,
        closes,
    }) = context.facades.try_get(increment_out).copied()
    else {
        panic!("increment output should hand its reference back");
    };
    assert_eq!(closes, increment_in);
    assert_ne!(true_variable, facade_variable);
    assert!(matches!(
        context.facades.try_get(sum),
        Some(PortFacade::Simple { .. })
    ));
}

#[test]
fn loop_output_tunnels_are_tunnel_facades() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let structure = graph
        .add_structure(root, StructureKind::Loop)
        .expect("loop");
    let tunnel = graph
        .add_border_node(structure, BorderNodeKind::OutputTunnel)
        .expect("output tunnel");
    let tunnel_out = output(&graph, tunnel, 0);

    let config = InferenceConfig::default();
    let mut frontend = InferenceFrontend::new(&mut graph, &config);
    frontend.construct_facades().expect("facades");

    let facade = frontend
        .context()
        .facades
        .try_get(tunnel_out)
        .copied()
        .expect("tunnel output has a facade");
    assert!(matches!(facade, PortFacade::Tunnel { .. }));
    assert_ne!(facade.true_variable(), facade.facade_variable());
}

#[test]
fn placed_lifetime_terminations_are_rejected() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    graph
        .add_node(
            root,
            NodeKind::TerminateLifetime {
                inputs: 1,
                outputs: 1,
            },
        )
        .expect("node can be built");

    let error = infer_types(&mut graph, &InferenceConfig::default())
        .expect_err("only inference may place terminations");
    assert_eq!(error.error_type, ErrorType::Compiler);
}

#[test]
fn passes_must_run_in_order() {
    let mut graph = DataflowGraph::new();
    let config = InferenceConfig::default();
    let mut frontend = InferenceFrontend::new(&mut graph, &config);

    let error = frontend
        .unify_edges()
        .expect_err("edges need facades first");
    assert_eq!(error.error_type, ErrorType::Compiler);
    assert_eq!(frontend.phase(), InferencePhase::NotStarted);

    frontend.construct_facades().expect("facades");
    assert!(frontend.construct_facades().is_err());
    assert!(frontend.insert_borrows().is_err());

    frontend.unify_edges().expect("edges");
    assert_eq!(frontend.phase(), InferencePhase::EdgesUnified);
    assert!(frontend.finish().is_err());
}

#[test]
fn disabled_constructors_are_reported_on_each_port_that_uses_them() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let element = constant(&mut graph, root, DataType::Int32, false);
    let create = functional(&mut graph, root, signatures::vector_create());
    wire(&mut graph, element, 0, create, 0);
    let create_in = input(&graph, create, 0);
    let create_out = output(&graph, create, 0);

    let config = InferenceConfig::from_toml_str("[features]\nvectors = false\n")
        .expect("config parses");
    let report = infer_types(&mut graph, &config).expect("inference completes");

    assert_eq!(
        report.diagnostics.for_port(create_out)[0].kind,
        DiagnosticKind::FeatureDisabled(ConstructorName::Vector)
    );
    assert!(report.diagnostics.for_port(create_in).is_empty());

    // Inference still resolves the disabled type
    assert_eq!(
        report.annotation(create_out).expect("annotated").data_type,
        DataType::vector(DataType::Int32)
    );
}
