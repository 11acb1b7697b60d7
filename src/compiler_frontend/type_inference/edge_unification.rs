//! Edge unification.
//!
//! Visits every wire exactly once, in the order facade construction fixed, so every source
//! is unified before the node that reads it. A reference-input group is decided as soon as
//! its last wired input has arrived.

use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::datatypes::TypeConstraint;
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::PortId;
use crate::compiler_frontend::type_inference::InferenceContext;
use crate::compiler_frontend::type_inference::auto_borrow::{
    BorrowChoice, BorrowDecision, GroupId, SuppliedValue, decide_borrow,
};
use crate::compiler_frontend::type_inference::type_variables::MutabilityTerm;
use crate::compiler_frontend::type_inference::unification_result::UnificationOutcome;
use crate::unify_log;

pub(crate) fn unify_edges(
    graph: &DataflowGraph,
    context: &mut InferenceContext,
) -> Result<(), CompilerError> {
    context.groups.count_wired_inputs(graph)?;

    // Nothing ever arrives at these, so their references flow on as they are
    let undecided: Vec<GroupId> = context
        .groups
        .iter()
        .filter(|group| group.wired_inputs == 0)
        .map(|group| group.id)
        .collect();
    for group in undecided {
        settle_paired_outputs(graph, context, group, false)?;
    }

    let order = context.order.clone();
    for node_id in order {
        let node = graph.node(node_id)?;
        for output in &node.outputs {
            let sinks = graph.sinks_of(*output)?;
            if sinks.is_empty() {
                continue;
            }

            unify_wire(graph, context, *output, sinks)?;
            context.stats.wires_unified += 1;
        }
    }

    context.variables.resolve_all(&mut context.types);

    unify_log!(format!(
        "[Unify] {} wires, {} of {} groups decided",
        context.stats.wires_unified,
        context.stats.groups_decided,
        context.groups.len()
    ));

    Ok(())
}

fn unify_wire(
    graph: &DataflowGraph,
    context: &mut InferenceContext,
    source: PortId,
    sinks: &[PortId],
) -> Result<(), CompilerError> {
    let source_variable = context.facades.facade_variable(source)?;
    let source_term = context.variables.type_term(source_variable)?;
    let source_mutable = context.variables.is_mutable(source_variable);

    let shared_by_borrow = sinks
        .iter()
        .all(|sink| context.facades.is_reference_input(*sink));

    // Every sink after the first receives a duplicate
    if sinks.len() > 1 && !shared_by_borrow {
        let copyable = context
            .types
            .create_fresh_variable(vec![TypeConstraint::Copy]);
        let mut outcome = UnificationOutcome::new();
        context.types.unify(copyable, source_term, &mut outcome);
        context.diagnostics.record_outcome(source, outcome);
    }

    let mut first_term = None;
    for sink in sinks {
        let sink_variable = context.facades.facade_variable(*sink)?;
        let sink_term = context.variables.type_term(sink_variable)?;
        let mut outcome = UnificationOutcome::new();

        match first_term {
            None => {
                context.types.unify(sink_term, source_term, &mut outcome);
                context.variables.merge(sink_variable, source_variable);
                first_term = Some(sink_term);
            }
            Some(first_term) => {
                context.types.unify(sink_term, first_term, &mut outcome);
                if shared_by_borrow {
                    context.variables.merge(sink_variable, source_variable);
                } else {
                    context.variables.set_mutable(sink_variable, source_mutable);
                }
            }
        }

        context.diagnostics.record_outcome(*sink, outcome);

        if let Some(group) = context.facades.get(*sink)?.group()
            && context.groups.arrive(group)?
        {
            decide_group(graph, context, group)?;
        }
    }

    Ok(())
}

/// Decides how a group gets its references, then gives every wired member's node-side
/// variable the derived reference type.
fn decide_group(
    graph: &DataflowGraph,
    context: &mut InferenceContext,
    group_id: GroupId,
) -> Result<(), CompilerError> {
    let group = context.groups.get(group_id)?.clone();

    let mut wired = Vec::with_capacity(group.members.len());
    for member in &group.members {
        if !graph.is_connected(member.port)? {
            continue;
        }

        let facade_variable = context.facades.facade_variable(member.port)?;
        let supplied_term = context.variables.type_term(facade_variable)?;
        let supplied = match context.types.get_mutability(supplied_term) {
            Some(mutable) => {
                SuppliedValue::reference(mutable, context.types.get_lifetime(supplied_term))
            }
            None => SuppliedValue::owned(context.variables.is_mutable(facade_variable)),
        };

        wired.push((member.port, facade_variable, supplied_term, supplied));
    }

    let supplied_values: Vec<SuppliedValue> = wired.iter().map(|entry| entry.3).collect();
    let decision = match decide_borrow(group.policy, &supplied_values) {
        BorrowChoice::ReuseLifetime(lifetime) => {
            context
                .types
                .resolve_lifetime_term(group.lifetime_term, lifetime);
            BorrowDecision::ReuseLifetime(lifetime)
        }
        choice => {
            let mutable = matches!(choice, BorrowChoice::BorrowMutable);
            let lifetime = context.lifetimes.create_bounded_lifetime(group.scope)?;
            context
                .types
                .resolve_lifetime_term(group.lifetime_term, lifetime);

            for (_, facade_variable, _, supplied) in &wired {
                match supplied.reference {
                    // Reborrowing ends before the reference it came from
                    Some(_) => context.lifetimes.add_outlives(supplied.lifetime, lifetime),
                    None => context
                        .variables
                        .add_interrupted_variable(lifetime, *facade_variable),
                }
            }

            BorrowDecision::Borrow { mutable, lifetime }
        }
    };

    for (port, _, supplied_term, supplied) in &wired {
        let (mutable, underlying) = match context.types.reference_parts(*supplied_term) {
            Some((_, underlying, _)) => match decision {
                BorrowDecision::ReuseLifetime(_) => {
                    (supplied.reference.unwrap_or(false), underlying)
                }
                BorrowDecision::Borrow { mutable, .. } => (mutable, underlying),
            },
            None => match decision {
                BorrowDecision::Borrow { mutable, .. } => (mutable, *supplied_term),
                BorrowDecision::ReuseLifetime(_) => (false, *supplied_term),
            },
        };

        let derived = context.types.create_reference(
            MutabilityTerm::Fixed(mutable),
            underlying,
            group.lifetime_term,
        );

        let true_variable = context.facades.true_variable(*port)?;
        let true_term = context.variables.type_term(true_variable)?;

        let mut outcome = UnificationOutcome::new();
        context.types.unify(true_term, derived, &mut outcome);
        context.diagnostics.record_outcome(*port, outcome);
    }

    unify_log!(format!(
        "[Unify] group {} on node {} decided {:?}",
        group_id.0, group.node, decision
    ));

    context.groups.set_decision(group_id, decision)?;
    context.stats.groups_decided += 1;

    let borrowed = matches!(decision, BorrowDecision::Borrow { .. });
    settle_paired_outputs(graph, context, group_id, borrowed)
}

/// Decides what the wires leaving each paired output see.
/// A borrowed input's value is handed back as it was supplied. Otherwise the reference
/// itself flows on.
fn settle_paired_outputs(
    graph: &DataflowGraph,
    context: &mut InferenceContext,
    group_id: GroupId,
    borrowed: bool,
) -> Result<(), CompilerError> {
    let members = context.groups.get(group_id)?.members.clone();

    for member in members {
        let Some(output) = member.paired_output else {
            continue;
        };

        let facade = *context.facades.get(output)?;
        let handed_back = if borrowed && graph.is_connected(member.port)? {
            context.facades.facade_variable(member.port)?
        } else {
            facade.true_variable()
        };

        let facade_term = context.variables.type_term(facade.facade_variable())?;
        let handed_back_term = context.variables.type_term(handed_back)?;

        let mut outcome = UnificationOutcome::new();
        context.types.unify(facade_term, handed_back_term, &mut outcome);
        context.diagnostics.record_outcome(output, outcome);
        context.variables.merge(facade.facade_variable(), handed_back);
    }

    Ok(())
}
