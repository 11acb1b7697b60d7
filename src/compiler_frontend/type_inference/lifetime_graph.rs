//! Per-scope lifetime DAGs.
//!
//! Each scope gets one graph whose root node is the scope's own lifetime. An edge
//! `a -> b` records that `a` outlives `b`. Bounded lifetimes carved out of a scope hang
//! below its root, so they end before the scope does. Every graph of an enclosing scope
//! outlives the graphs of the scopes nested in it.

use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorLocation, ErrorType};
use crate::compiler_frontend::dfir::dfir_nodes::ScopeId;
use crate::compiler_frontend::type_inference::lifetimes::{
    BoundedLifetime, Lifetime, LifetimeGraphId,
};
use crate::lifetime_log;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

#[derive(Debug)]
struct LifetimeGraph {
    parent: Option<LifetimeGraphId>,
    dag: DiGraph<(), ()>,
    root: NodeIndex,
}

#[derive(Debug, Default)]
pub struct LifetimeGraphForest {
    graphs: Vec<LifetimeGraph>,
    graph_by_scope: FxHashMap<ScopeId, LifetimeGraphId>,
}

impl LifetimeGraphForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the graph for a scope. The parent scope's graph must already exist.
    pub fn establish_graph(
        &mut self,
        scope: ScopeId,
        parent: Option<ScopeId>,
    ) -> Result<LifetimeGraphId, CompilerError> {
        if self.graph_by_scope.contains_key(&scope) {
            return Err(CompilerError::new(
                format!("Lifetime graph for {scope} was established twice"),
                ErrorLocation::at_scope(scope),
                ErrorType::Compiler,
            ));
        }

        let parent_graph = match parent {
            Some(parent_scope) => Some(self.graph_for_scope(parent_scope)?),
            None => None,
        };

        let mut dag = DiGraph::new();
        let root = dag.add_node(());
        let id = LifetimeGraphId(self.graphs.len() as u32);

        self.graphs.push(LifetimeGraph {
            parent: parent_graph,
            dag,
            root,
        });
        self.graph_by_scope.insert(scope, id);

        lifetime_log!(format!(
            "[Lifetimes] graph g{} for {} (parent {:?})",
            id.0, scope, parent_graph
        ));

        Ok(id)
    }

    pub fn has_graph(&self, scope: ScopeId) -> bool {
        self.graph_by_scope.contains_key(&scope)
    }

    pub fn graph_for_scope(&self, scope: ScopeId) -> Result<LifetimeGraphId, CompilerError> {
        match self.graph_by_scope.get(&scope) {
            Some(id) => Ok(*id),
            None => Err(CompilerError::new(
                format!("No lifetime graph has been established for {scope}"),
                ErrorLocation::at_scope(scope),
                ErrorType::Compiler,
            )),
        }
    }

    /// The scope's own lifetime
    pub fn scope_lifetime(&self, scope: ScopeId) -> Result<Lifetime, CompilerError> {
        let graph = self.graph_for_scope(scope)?;
        Ok(Lifetime::Bounded(BoundedLifetime {
            graph,
            node: self.graphs[graph.0 as usize].root,
        }))
    }

    /// A fresh lifetime that ends before the scope does
    pub fn create_bounded_lifetime(&mut self, scope: ScopeId) -> Result<Lifetime, CompilerError> {
        let graph_id = self.graph_for_scope(scope)?;
        let graph = &mut self.graphs[graph_id.0 as usize];

        let node = graph.dag.add_node(());
        graph.dag.add_edge(graph.root, node, ());

        let lifetime = Lifetime::Bounded(BoundedLifetime {
            graph: graph_id,
            node,
        });
        lifetime_log!(format!("[Lifetimes] new {} in {}", lifetime, scope));

        Ok(lifetime)
    }

    /// Whether a lifetime is still alive when the scope ends
    pub fn does_outlast(&self, lifetime: Lifetime, scope: ScopeId) -> Result<bool, CompilerError> {
        let bounded = match lifetime {
            Lifetime::Unbounded | Lifetime::Static => return Ok(true),
            Lifetime::Empty => return Ok(false),
            Lifetime::Bounded(bounded) => bounded,
        };

        let scope_graph = self.graph_for_scope(scope)?;
        if self.is_strict_ancestor(bounded.graph, scope_graph) {
            return Ok(true);
        }

        if bounded.graph != scope_graph {
            return Ok(false);
        }

        let graph = &self.graphs[scope_graph.0 as usize];
        Ok(bounded.node != graph.root && has_path_connecting(&graph.dag, bounded.node, graph.root, None))
    }

    /// Whether `longer` is alive for all of `shorter`
    pub fn outlives(&self, longer: Lifetime, shorter: Lifetime) -> bool {
        if longer == shorter {
            return true;
        }

        match (longer, shorter) {
            (Lifetime::Unbounded | Lifetime::Static, _) => true,
            (_, Lifetime::Empty) => true,
            (Lifetime::Empty, _) => false,
            (Lifetime::Bounded(_), Lifetime::Unbounded | Lifetime::Static) => false,
            (Lifetime::Bounded(longer), Lifetime::Bounded(shorter)) => {
                if longer.graph == shorter.graph {
                    let graph = &self.graphs[longer.graph.0 as usize];
                    has_path_connecting(&graph.dag, longer.node, shorter.node, None)
                } else {
                    self.is_strict_ancestor(longer.graph, shorter.graph)
                }
            }
        }
    }

    /// Records that `longer` outlives `shorter`.
    /// Only lifetimes of the same scope need an edge; enclosing scopes already outlive nested ones.
    pub fn add_outlives(&mut self, longer: Lifetime, shorter: Lifetime) {
        let (Lifetime::Bounded(longer), Lifetime::Bounded(shorter)) = (longer, shorter) else {
            return;
        };

        if longer.graph != shorter.graph || longer.node == shorter.node {
            return;
        }

        let graph = &mut self.graphs[longer.graph.0 as usize];

        // Keep the graph acyclic
        if has_path_connecting(&graph.dag, shorter.node, longer.node, None) {
            lifetime_log!(format!(
                "[Lifetimes] ignored outlives edge that would form a cycle in g{}",
                longer.graph.0
            ));
            return;
        }

        graph.dag.update_edge(longer.node, shorter.node, ());
    }

    fn is_strict_ancestor(&self, ancestor: LifetimeGraphId, descendant: LifetimeGraphId) -> bool {
        let mut current = self
            .graphs
            .get(descendant.0 as usize)
            .and_then(|graph| graph.parent);

        while let Some(graph) = current {
            if graph == ancestor {
                return true;
            }
            current = self.graphs.get(graph.0 as usize).and_then(|graph| graph.parent);
        }

        false
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }
}
