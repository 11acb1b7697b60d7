#![cfg(test)]

use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{NodeId, NodeKind, PortId, ScopeId};
use crate::compiler_frontend::dfir::signatures;
use crate::compiler_frontend::type_inference::auto_borrow::{
    BorrowChoice, BorrowDecision, BorrowGroups, BorrowPolicy, SuppliedValue, decide_borrow,
};
use crate::compiler_frontend::type_inference::lifetime_graph::LifetimeGraphForest;
use crate::compiler_frontend::type_inference::lifetimes::Lifetime;
use crate::compiler_frontend::type_inference::type_variables::TypeVariableStore;

fn two_lifetimes() -> (Lifetime, Lifetime) {
    let mut forest = LifetimeGraphForest::new();
    forest.establish_graph(ScopeId(0), None).expect("root graph");
    (
        forest.create_bounded_lifetime(ScopeId(0)).expect("lifetime"),
        forest.create_bounded_lifetime(ScopeId(0)).expect("lifetime"),
    )
}

#[test]
fn mutable_references_sharing_a_lifetime_are_reused() {
    let (shared, _) = two_lifetimes();
    let supplied = [
        SuppliedValue::reference(true, shared),
        SuppliedValue::reference(true, shared),
    ];

    assert_eq!(
        decide_borrow(BorrowPolicy::RequireMutable, &supplied),
        BorrowChoice::ReuseLifetime(shared)
    );
    assert_eq!(
        decide_borrow(BorrowPolicy::Polymorphic, &supplied),
        BorrowChoice::ReuseLifetime(shared)
    );
}

#[test]
fn pure_operations_reborrow_mutable_references_immutably() {
    let (shared, _) = two_lifetimes();
    let supplied = [SuppliedValue::reference(true, shared)];

    assert_eq!(
        decide_borrow(BorrowPolicy::AllowImmutable, &supplied),
        BorrowChoice::BorrowImmutable
    );
}

#[test]
fn mutable_bindings_and_references_are_borrowed_mutably() {
    let (first, second) = two_lifetimes();

    assert_eq!(
        decide_borrow(BorrowPolicy::RequireMutable, &[SuppliedValue::owned(true)]),
        BorrowChoice::BorrowMutable
    );

    // Two different lifetimes cannot be reused, but everything is mutable
    let mixed = [
        SuppliedValue::reference(true, first),
        SuppliedValue::reference(true, second),
        SuppliedValue::owned(true),
    ];
    assert_eq!(
        decide_borrow(BorrowPolicy::RequireMutable, &mixed),
        BorrowChoice::BorrowMutable
    );
}

#[test]
fn immutable_references_sharing_a_lifetime_are_reused() {
    let (shared, _) = two_lifetimes();
    let supplied = [
        SuppliedValue::reference(false, shared),
        SuppliedValue::reference(false, shared),
    ];

    for policy in [
        BorrowPolicy::AllowImmutable,
        BorrowPolicy::RequireMutable,
        BorrowPolicy::Polymorphic,
    ] {
        assert_eq!(
            decide_borrow(policy, &supplied),
            BorrowChoice::ReuseLifetime(shared)
        );
    }
}

#[test]
fn everything_else_is_borrowed_immutably() {
    let (first, second) = two_lifetimes();

    let cases: [&[SuppliedValue]; 4] = [
        &[SuppliedValue::owned(false)],
        &[SuppliedValue::owned(true), SuppliedValue::owned(false)],
        &[
            SuppliedValue::reference(false, first),
            SuppliedValue::reference(false, second),
        ],
        // Owned values never share a bounded lifetime
        &[SuppliedValue::reference(false, Lifetime::Unbounded)],
    ];

    for supplied in cases {
        assert_eq!(
            decide_borrow(BorrowPolicy::RequireMutable, supplied),
            BorrowChoice::BorrowImmutable
        );
    }

    assert_eq!(
        decide_borrow(BorrowPolicy::AllowImmutable, &[SuppliedValue::owned(true)]),
        BorrowChoice::BorrowImmutable
    );
}

#[test]
fn group_members_and_their_paired_outputs_are_tracked() {
    let mut types = TypeVariableStore::new();
    let mut groups = BorrowGroups::new();
    let lifetime_term = types.create_lifetime(None);

    let group = groups.create_group(
        NodeId(4),
        ScopeId(0),
        BorrowPolicy::AllowImmutable,
        lifetime_term,
    );
    groups.add_member(group, PortId(10)).expect("member");
    groups.add_member(group, PortId(11)).expect("member");
    groups
        .pair_output(PortId(11), PortId(12))
        .expect("pairing a member");

    assert_eq!(groups.group_of(PortId(10)).expect("group"), group);
    assert_eq!(
        groups.get(group).expect("group").members[1].paired_output,
        Some(PortId(12))
    );
    assert!(groups.try_group_of(PortId(12)).is_none());

    let error = groups
        .pair_output(PortId(12), PortId(13))
        .expect_err("an output is not a member");
    assert_eq!(error.error_type, ErrorType::Compiler);
}

#[test]
fn a_group_is_ready_once_every_wired_input_arrived() {
    let mut graph = DataflowGraph::new();
    let root = graph.root_scope();
    let value = graph
        .add_node(
            root,
            NodeKind::Constant {
                value_type: DataType::Int32,
                mutable: false,
            },
        )
        .expect("constant");
    let add = graph
        .add_node(root, NodeKind::Functional(signatures::add()))
        .expect("add");
    let x = graph.input_port(add, 0).expect("x");
    let y = graph.input_port(add, 1).expect("y");
    let source = graph.output_port(value, 0).expect("value out");
    graph.connect(source, x).expect("wire");

    let mut types = TypeVariableStore::new();
    let mut groups = BorrowGroups::new();
    let group = groups.create_group(
        add,
        root,
        BorrowPolicy::AllowImmutable,
        types.create_lifetime(None),
    );
    groups.add_member(group, x).expect("member");
    groups.add_member(group, y).expect("member");

    // The unwired input never arrives and does not hold the decision back
    groups.count_wired_inputs(&graph).expect("count");
    assert_eq!(groups.get(group).expect("group").wired_inputs, 1);
    assert!(groups.arrive(group).expect("arrival"));
}

#[test]
fn a_group_is_decided_once() {
    let mut types = TypeVariableStore::new();
    let mut groups = BorrowGroups::new();
    let group = groups.create_group(
        NodeId(0),
        ScopeId(0),
        BorrowPolicy::RequireMutable,
        types.create_lifetime(None),
    );

    groups
        .set_decision(group, BorrowDecision::ReuseLifetime(Lifetime::Static))
        .expect("first decision");
    let error = groups
        .set_decision(
            group,
            BorrowDecision::Borrow {
                mutable: true,
                lifetime: Lifetime::Static,
            },
        )
        .expect_err("second decision");

    assert_eq!(error.error_type, ErrorType::Compiler);
    assert_eq!(
        groups.get(group).expect("group").decision,
        Some(BorrowDecision::ReuseLifetime(Lifetime::Static))
    );
}
