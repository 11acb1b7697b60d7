use weft::compiler_frontend::datatypes::DataType;
use weft::compiler_frontend::dfir::dfir_nodes::{BorderNodeKind, NodeKind, StructureKind};
use weft::compiler_frontend::dfir::signatures;
use weft::compiler_frontend::display_messages::print_compiler_messages;
use weft::{
    DataflowGraph, ErrorType, InferenceConfig, InferenceFrontend, InferencePhase,
    infer_and_collect_messages, infer_types,
};

/// Appends to a vector inside a loop, then hands the vector back out of the loop.
/// Everything the host needs is reachable through the public surface.
#[test]
fn a_host_graph_is_inferred_end_to_end() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();

    let element = graph
        .add_node(
            root,
            NodeKind::Constant {
                value_type: DataType::Int32,
                mutable: false,
            },
        )
        .expect("element");
    let create = graph
        .add_node(root, NodeKind::Functional(signatures::vector_create()))
        .expect("vector create");
    graph
        .connect(
            graph.output_port(element, 0).expect("element out"),
            graph.input_port(create, 0).expect("create in"),
        )
        .expect("wire");

    let repeat = graph
        .add_structure(root, StructureKind::Loop)
        .expect("loop");
    let body = graph.inner_scopes(repeat).expect("body")[0];
    let borrow = graph
        .add_border_node(repeat, BorderNodeKind::BorrowTunnel { mutable: true })
        .expect("borrow tunnel");
    let terminate = graph
        .add_border_node(
            repeat,
            BorderNodeKind::TerminateLifetimeTunnel {
                borrow_tunnel: borrow,
            },
        )
        .expect("terminate tunnel");

    let appended = graph
        .add_node(
            body,
            NodeKind::Constant {
                value_type: DataType::Int32,
                mutable: false,
            },
        )
        .expect("appended value");
    let append = graph
        .add_node(body, NodeKind::Functional(signatures::vector_append()))
        .expect("append");

    let wires = [
        (
            graph.output_port(create, 0).expect("vector"),
            graph.input_port(borrow, 0).expect("borrow in"),
        ),
        (
            graph.output_port(borrow, 0).expect("borrowed vector"),
            graph.input_port(append, 0).expect("append vector"),
        ),
        (
            graph.output_port(appended, 0).expect("value"),
            graph.input_port(append, 1).expect("append element"),
        ),
        (
            graph.output_port(append, 0).expect("vector out"),
            graph.input_port(terminate, 0).expect("terminate in"),
        ),
    ];
    for (source, sink) in wires {
        graph.connect(source, sink).expect("wire");
    }

    let report = infer_types(&mut graph, &InferenceConfig::default()).expect("inference");

    assert!(report.is_clean(), "{:?}", report.diagnostics.sorted());

    // The borrow tunnel already supplies a mutable reference, so nothing is inserted
    assert_eq!(graph.inserted_nodes().count(), 0);

    let handed_back = report
        .annotation(graph.output_port(terminate, 0).expect("terminate out"))
        .expect("annotated");
    assert_eq!(handed_back.data_type, DataType::vector(DataType::Int32));

    let inside = report
        .annotation(graph.output_port(append, 0).expect("append out"))
        .expect("annotated");
    assert_eq!(
        inside.data_type,
        DataType::reference(true, DataType::vector(DataType::Int32))
    );
}

#[test]
fn the_passes_can_be_driven_one_at_a_time() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let value = graph
        .add_node(
            root,
            NodeKind::Constant {
                value_type: DataType::String,
                mutable: false,
            },
        )
        .expect("value");
    let output = graph
        .add_node(root, NodeKind::Functional(signatures::output()))
        .expect("output");
    graph
        .connect(
            graph.output_port(value, 0).expect("value out"),
            graph.input_port(output, 0).expect("output in"),
        )
        .expect("wire");

    let config = InferenceConfig::default();
    let mut frontend = InferenceFrontend::new(&mut graph, &config);
    frontend.construct_facades().expect("facades");
    frontend.unify_edges().expect("edges");
    frontend.insert_borrows().expect("borrows");
    assert_eq!(frontend.phase(), InferencePhase::BorrowsInserted);

    let report = frontend.finish().expect("report");
    assert!(report.is_clean());
    assert_eq!(report.stats.borrows_inserted, 1);
    assert_eq!(report.stats.terminations_inserted, 0);
}

#[test]
fn broken_graphs_surface_as_compiler_errors() {
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
        .expect("node");

    let error = infer_types(&mut graph, &InferenceConfig::default()).expect_err("rejected");
    assert_eq!(error.error_type, ErrorType::Compiler);
}

#[test]
fn messages_gather_diagnostics_and_fatal_errors_for_the_host() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let flag = graph
        .add_node(
            root,
            NodeKind::Constant {
                value_type: DataType::Bool,
                mutable: false,
            },
        )
        .expect("flag");
    let increment = graph
        .add_node(root, NodeKind::Functional(signatures::increment()))
        .expect("increment");
    graph
        .connect(
            graph.output_port(flag, 0).expect("flag out"),
            graph.input_port(increment, 0).expect("increment in"),
        )
        .expect("wire");

    let (report, messages) = infer_and_collect_messages(&mut graph, &InferenceConfig::default());
    assert!(report.is_some());
    assert!(!messages.has_errors());
    assert!(!messages.is_empty());
    assert_eq!(messages.diagnostics.port_count(), 1);
    print_compiler_messages(messages);

    let mut broken = DataflowGraph::new();
    let root = broken.root_scope();
    broken
        .add_node(root, NodeKind::TerminateLifetime { inputs: 0, outputs: 0 })
        .expect("node");

    let (report, messages) = infer_and_collect_messages(&mut broken, &InferenceConfig::default());
    assert!(report.is_none());
    assert!(messages.has_errors());
    print_compiler_messages(messages);
}
