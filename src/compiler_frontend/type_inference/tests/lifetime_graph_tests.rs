#![cfg(test)]

use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::dfir::dfir_nodes::ScopeId;
use crate::compiler_frontend::type_inference::lifetime_graph::LifetimeGraphForest;
use crate::compiler_frontend::type_inference::lifetimes::Lifetime;

/// root(0) -> body(1) -> inner(2), plus a sibling(3) of body
fn nested_forest() -> LifetimeGraphForest {
    let mut forest = LifetimeGraphForest::new();
    forest.establish_graph(ScopeId(0), None).expect("root graph");
    forest
        .establish_graph(ScopeId(1), Some(ScopeId(0)))
        .expect("body graph");
    forest
        .establish_graph(ScopeId(2), Some(ScopeId(1)))
        .expect("inner graph");
    forest
        .establish_graph(ScopeId(3), Some(ScopeId(0)))
        .expect("sibling graph");
    forest
}

#[test]
fn each_scope_gets_exactly_one_graph() {
    let mut forest = nested_forest();
    assert_eq!(forest.graph_count(), 4);

    let error = forest
        .establish_graph(ScopeId(1), Some(ScopeId(0)))
        .expect_err("second graph for a scope");
    assert_eq!(error.error_type, ErrorType::Compiler);
}

#[test]
fn parent_graph_must_exist_first() {
    let mut forest = LifetimeGraphForest::new();
    let error = forest
        .establish_graph(ScopeId(4), Some(ScopeId(9)))
        .expect_err("parent was never established");

    assert_eq!(error.error_type, ErrorType::Compiler);
    assert!(!forest.has_graph(ScopeId(4)));
}

#[test]
fn a_borrow_ends_with_its_scope_but_outlasts_nested_scopes() {
    let mut forest = nested_forest();
    let lifetime = forest
        .create_bounded_lifetime(ScopeId(1))
        .expect("body lifetime");

    assert!(lifetime.is_bounded());
    assert!(!forest.does_outlast(lifetime, ScopeId(1)).expect("query"));
    assert!(forest.does_outlast(lifetime, ScopeId(2)).expect("query"));
    assert!(!forest.does_outlast(lifetime, ScopeId(0)).expect("query"));
    assert!(!forest.does_outlast(lifetime, ScopeId(3)).expect("query"));
}

#[test]
fn owned_and_empty_lifetimes_are_the_extremes() {
    let forest = nested_forest();

    for scope in [ScopeId(0), ScopeId(2)] {
        assert!(forest.does_outlast(Lifetime::Unbounded, scope).expect("query"));
        assert!(forest.does_outlast(Lifetime::Static, scope).expect("query"));
        assert!(!forest.does_outlast(Lifetime::Empty, scope).expect("query"));
    }
}

#[test]
fn a_scope_lifetime_does_not_outlast_its_own_scope() {
    let forest = nested_forest();
    let body = forest.scope_lifetime(ScopeId(1)).expect("scope lifetime");

    assert!(!forest.does_outlast(body, ScopeId(1)).expect("query"));
    assert!(forest.does_outlast(body, ScopeId(2)).expect("query"));
}

#[test]
fn unknown_scopes_are_contract_violations() {
    let mut forest = nested_forest();
    let lifetime = forest.create_bounded_lifetime(ScopeId(2)).expect("lifetime");

    let error = forest
        .does_outlast(lifetime, ScopeId(7))
        .expect_err("scope 7 has no graph");
    assert_eq!(error.error_type, ErrorType::Compiler);

    assert!(forest.create_bounded_lifetime(ScopeId(7)).is_err());
}

#[test]
fn outlives_edges_stay_acyclic() {
    let mut forest = nested_forest();
    let longer = forest.create_bounded_lifetime(ScopeId(1)).expect("lifetime");
    let shorter = forest.create_bounded_lifetime(ScopeId(1)).expect("lifetime");

    assert!(!forest.outlives(longer, shorter));

    forest.add_outlives(longer, shorter);
    assert!(forest.outlives(longer, shorter));
    assert!(!forest.outlives(shorter, longer));

    // Would close a cycle, so it is ignored
    forest.add_outlives(shorter, longer);
    assert!(!forest.outlives(shorter, longer));
}

#[test]
fn enclosing_lifetimes_outlive_nested_ones() {
    let mut forest = nested_forest();
    let outer = forest.create_bounded_lifetime(ScopeId(0)).expect("lifetime");
    let inner = forest.create_bounded_lifetime(ScopeId(2)).expect("lifetime");
    let sibling = forest.create_bounded_lifetime(ScopeId(3)).expect("lifetime");

    assert!(forest.outlives(outer, inner));
    assert!(!forest.outlives(inner, outer));
    assert!(!forest.outlives(sibling, inner));
    assert!(forest.outlives(Lifetime::Unbounded, inner));
}
