#![cfg(test)]

use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{
    BorderNodeKind, Direction, NodeId, NodeKind, StructureKind,
};
use crate::compiler_frontend::dfir::signatures;

fn constant(graph: &mut DataflowGraph, value_type: DataType) -> NodeId {
    let root = graph.root_scope();
    graph
        .add_node(
            root,
            NodeKind::Constant {
                value_type,
                mutable: false,
            },
        )
        .expect("constant should be added")
}

#[test]
fn functional_nodes_get_ports_from_their_signature() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let add = graph
        .add_node(root, NodeKind::Functional(signatures::add()))
        .expect("add node");

    let node = graph.node(add).expect("node exists");
    assert_eq!(node.inputs.len(), 2);
    assert_eq!(node.outputs.len(), 3);

    let first_output = graph.port(node.outputs[0]).expect("port exists");
    assert_eq!(first_output.direction, Direction::Output);
    assert_eq!(first_output.index, 0);
    assert_eq!(first_output.scope, root);
}

#[test]
fn connecting_the_same_source_twice_fans_out_one_wire() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let source = constant(&mut graph, DataType::Int32);
    let first = graph
        .add_node(root, NodeKind::Functional(signatures::output()))
        .expect("output node");
    let second = graph
        .add_node(root, NodeKind::Functional(signatures::output()))
        .expect("output node");

    let out = graph.output_port(source, 0).expect("output port");
    let first_in = graph.input_port(first, 0).expect("input port");
    let second_in = graph.input_port(second, 0).expect("input port");

    let wire_a = graph.connect(out, first_in).expect("first connection");
    let wire_b = graph.connect(out, second_in).expect("second connection");

    assert_eq!(wire_a, wire_b);
    assert_eq!(graph.sinks_of(out).expect("sinks"), &[first_in, second_in]);
    assert_eq!(graph.source_of(second_in).expect("source"), Some(out));
}

#[test]
fn an_input_accepts_only_one_wire() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let a = constant(&mut graph, DataType::Int32);
    let b = constant(&mut graph, DataType::Int32);
    let sink = graph.add_node(root, NodeKind::Drop).expect("drop node");
    let sink_in = graph.input_port(sink, 0).expect("input port");

    graph
        .connect(graph.output_port(a, 0).expect("port"), sink_in)
        .expect("first wire");
    let error = graph
        .connect(graph.output_port(b, 0).expect("port"), sink_in)
        .expect_err("second wire must be rejected");

    assert_eq!(error.error_type, ErrorType::Compiler);
    assert_eq!(error.location.scope, None);
    assert_eq!(error.location.node, Some(sink));
    assert_eq!(error.location.port, Some(sink_in));
}

#[test]
fn ports_facing_different_scopes_cannot_be_wired() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let source = constant(&mut graph, DataType::Int32);
    let frame = graph
        .add_structure(root, StructureKind::Frame)
        .expect("frame");
    let body = graph.inner_scopes(frame).expect("inner scopes")[0];
    let drop = graph.add_node(body, NodeKind::Drop).expect("drop node");

    let result = graph.connect(
        graph.output_port(source, 0).expect("port"),
        graph.input_port(drop, 0).expect("port"),
    );

    assert!(result.is_err());
}

#[test]
fn loops_and_matches_have_conditional_bodies() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let frame = graph.add_structure(root, StructureKind::Frame).expect("frame");
    let looped = graph.add_structure(root, StructureKind::Loop).expect("loop");
    let matched = graph
        .add_structure(root, StructureKind::OptionMatch)
        .expect("match");

    let frame_body = graph.inner_scopes(frame).expect("scopes")[0];
    assert!(!graph.scope(frame_body).expect("scope").executes_conditionally);

    let loop_body = graph.inner_scopes(looped).expect("scopes")[0];
    assert!(graph.scope(loop_body).expect("scope").executes_conditionally);

    let arms = graph.inner_scopes(matched).expect("scopes").to_vec();
    assert_eq!(arms.len(), 2);
    for arm in arms {
        let scope = graph.scope(arm).expect("scope");
        assert!(scope.executes_conditionally);
        assert_eq!(scope.parent, Some(root));
        assert_eq!(scope.owner, Some(matched));
    }
}

#[test]
fn unwrap_option_tunnel_makes_a_frame_conditional() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let frame = graph.add_structure(root, StructureKind::Frame).expect("frame");
    graph
        .add_border_node(frame, BorderNodeKind::UnwrapOptionTunnel)
        .expect("unwrap tunnel");

    let body = graph.inner_scopes(frame).expect("scopes")[0];
    assert!(graph.scope(body).expect("scope").executes_conditionally);
}

#[test]
fn border_nodes_are_restricted_to_matching_structures() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let frame = graph.add_structure(root, StructureKind::Frame).expect("frame");

    assert!(
        graph
            .add_border_node(frame, BorderNodeKind::LoopCondition)
            .is_err()
    );
    assert!(
        graph
            .add_border_node(frame, BorderNodeKind::OptionSelector)
            .is_err()
    );
}

#[test]
fn input_tunnels_feed_every_arm_of_a_match() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let matched = graph
        .add_structure(root, StructureKind::OptionMatch)
        .expect("match");
    let tunnel = graph
        .add_border_node(matched, BorderNodeKind::InputTunnel)
        .expect("tunnel");
    let selector = graph
        .add_border_node(matched, BorderNodeKind::OptionSelector)
        .expect("selector");

    let arms = graph.inner_scopes(matched).expect("scopes").to_vec();

    let tunnel_node = graph.node(tunnel).expect("node");
    assert_eq!(tunnel_node.inputs.len(), 1);
    assert_eq!(tunnel_node.outputs.len(), 2);
    assert_eq!(graph.port(tunnel_node.inputs[0]).expect("port").scope, root);
    assert_eq!(graph.port(tunnel_node.outputs[1]).expect("port").scope, arms[1]);

    let selector_node = graph.node(selector).expect("node");
    assert_eq!(selector_node.outputs.len(), 1);
    assert_eq!(graph.port(selector_node.outputs[0]).expect("port").scope, arms[0]);
}

#[test]
fn splice_keeps_sink_order_and_rewires_through_the_new_node() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let source = constant(&mut graph, DataType::Int32);
    let first = graph.add_node(root, NodeKind::Drop).expect("drop");
    let second = graph.add_node(root, NodeKind::Drop).expect("drop");
    let out = graph.output_port(source, 0).expect("port");
    let first_in = graph.input_port(first, 0).expect("port");
    let second_in = graph.input_port(second, 0).expect("port");
    graph.connect(out, first_in).expect("wire");
    graph.connect(out, second_in).expect("wire");

    let borrow = graph
        .add_inserted_node(
            root,
            NodeKind::ExplicitBorrow {
                mutable: false,
                count: 1,
            },
        )
        .expect("borrow");
    let borrow_in = graph.input_port(borrow, 0).expect("port");
    let borrow_out = graph.output_port(borrow, 0).expect("port");

    graph
        .splice(first_in, borrow_in, borrow_out)
        .expect("splice");

    assert_eq!(graph.sinks_of(out).expect("sinks"), &[borrow_in, second_in]);
    assert_eq!(graph.source_of(first_in).expect("source"), Some(borrow_out));
    assert_eq!(graph.inserted_nodes().count(), 1);
}

#[test]
fn disconnecting_the_last_sink_frees_the_source() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let source = constant(&mut graph, DataType::Bool);
    let drop = graph.add_node(root, NodeKind::Drop).expect("drop");
    let out = graph.output_port(source, 0).expect("port");
    let drop_in = graph.input_port(drop, 0).expect("port");
    graph.connect(out, drop_in).expect("wire");

    assert_eq!(graph.disconnect_sink(drop_in).expect("disconnect"), Some(out));
    assert!(!graph.is_connected(out).expect("port"));
    assert_eq!(graph.wires().count(), 0);
}

#[test]
fn splice_after_moves_every_sink_behind_the_new_node() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let source = constant(&mut graph, DataType::Int32);
    let first = graph.add_node(root, NodeKind::Drop).expect("drop");
    let second = graph.add_node(root, NodeKind::Drop).expect("drop");
    let out = graph.output_port(source, 0).expect("port");
    let first_in = graph.input_port(first, 0).expect("port");
    let second_in = graph.input_port(second, 0).expect("port");
    graph.connect(out, first_in).expect("wire");
    graph.connect(out, second_in).expect("wire");

    let terminate = graph
        .add_inserted_node(
            root,
            NodeKind::TerminateLifetime {
                inputs: 1,
                outputs: 1,
            },
        )
        .expect("terminate");
    let terminate_in = graph.input_port(terminate, 0).expect("port");
    let terminate_out = graph.output_port(terminate, 0).expect("port");

    graph
        .splice_after(out, terminate_in, terminate_out)
        .expect("splice");

    assert_eq!(graph.sinks_of(out).expect("sinks"), &[terminate_in]);
    assert_eq!(
        graph.sinks_of(terminate_out).expect("sinks"),
        &[first_in, second_in]
    );
    assert_eq!(graph.source_of(second_in).expect("source"), Some(terminate_out));

    // An unconnected source just gains the new sink
    let lone = constant(&mut graph, DataType::Bool);
    let lone_out = graph.output_port(lone, 0).expect("port");
    let closing = graph
        .add_inserted_node(
            root,
            NodeKind::TerminateLifetime {
                inputs: 1,
                outputs: 1,
            },
        )
        .expect("terminate");
    let closing_in = graph.input_port(closing, 0).expect("port");
    let closing_out = graph.output_port(closing, 0).expect("port");
    graph
        .splice_after(lone_out, closing_in, closing_out)
        .expect("splice");
    assert_eq!(graph.sinks_of(lone_out).expect("sinks"), &[closing_in]);
    assert!(!graph.is_connected(closing_out).expect("port"));
}
