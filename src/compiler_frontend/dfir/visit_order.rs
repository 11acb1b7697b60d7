use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorLocation, ErrorType};
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{BorderSide, NodeId, NodeKind, PortId, ScopeId};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

/// Orders every node so that each node comes after everything that feeds it.
///
/// Each scope is sorted on its own with structures standing in for their border nodes.
/// When a structure is reached its input-side border nodes are emitted, then each inner
/// scope, then its output-side border nodes.
pub fn visit_order(graph: &DataflowGraph) -> Result<Vec<NodeId>, CompilerError> {
    let mut order = Vec::with_capacity(graph.nodes().len());
    visit_scope(graph, graph.root_scope(), &mut order)?;
    Ok(order)
}

fn visit_scope(
    graph: &DataflowGraph,
    scope: ScopeId,
    order: &mut Vec<NodeId>,
) -> Result<(), CompilerError> {
    let mut dependencies: DiGraphMap<NodeId, ()> = DiGraphMap::new();
    for node in &graph.scope(scope)?.nodes {
        dependencies.add_node(*node);
    }

    for wire in graph.wires().filter(|wire| wire.scope == scope) {
        let Some(from) = representative(graph, scope, wire.source)? else {
            continue;
        };

        for sink in &wire.sinks {
            let Some(to) = representative(graph, scope, *sink)? else {
                continue;
            };

            if from == to {
                return Err(cycle_error(scope, from));
            }
            dependencies.add_edge(from, to, ());
        }
    }

    let sorted = match toposort(&dependencies, None) {
        Ok(sorted) => sorted,
        Err(cycle) => return Err(cycle_error(scope, cycle.node_id())),
    };

    for node_id in sorted {
        let node = graph.node(node_id)?;
        order.push(node_id);

        if !node.kind.is_structure() {
            continue;
        }

        let borders = graph.border_nodes(node_id)?;
        for border in borders {
            if border_side(graph, *border)? == BorderSide::Input {
                order.push(*border);
            }
        }

        for inner in graph.inner_scopes(node_id)? {
            visit_scope(graph, *inner, order)?;
        }

        for border in borders {
            if border_side(graph, *border)? == BorderSide::Output {
                order.push(*border);
            }
        }
    }

    Ok(())
}

/// The node standing for a port's owner in this scope's sort.
/// Inner ports of border nodes belong to the structure's body and are skipped.
fn representative(
    graph: &DataflowGraph,
    scope: ScopeId,
    port: PortId,
) -> Result<Option<NodeId>, CompilerError> {
    let port = graph.port(port)?;
    let node = graph.node(port.node)?;

    match node.kind {
        NodeKind::Border { structure, .. } => {
            if node.scope == scope {
                Ok(Some(structure))
            } else {
                Ok(None)
            }
        }
        _ => Ok(Some(node.id)),
    }
}

fn border_side(graph: &DataflowGraph, border: NodeId) -> Result<BorderSide, CompilerError> {
    match graph.node(border)?.kind.border_kind() {
        Some(kind) => Ok(kind.side()),
        None => Err(CompilerError::compiler_error(format!(
            "{border} is registered as a border node but is not one"
        ))),
    }
}

fn cycle_error(scope: ScopeId, node: NodeId) -> CompilerError {
    CompilerError::new(
        format!("Dataflow cycle through {node} in {scope}"),
        ErrorLocation {
            scope: Some(scope),
            node: Some(node),
            port: None,
        },
        ErrorType::Compiler,
    )
}
