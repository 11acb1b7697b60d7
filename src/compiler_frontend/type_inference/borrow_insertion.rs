//! Borrow insertion.
//!
//! Every group that decided to borrow gets one explicit borrow node spliced in front of its
//! wired inputs. When the node hands its references back, a lifetime termination node is
//! spliced in right after those outputs and takes over their wires, so everything
//! downstream keeps the values that were supplied. Handed back values nothing uses are fed
//! to drop nodes.

use crate::borrow_log;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorLocation};
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{NodeKind, PortId};
use crate::compiler_frontend::type_inference::InferenceContext;
use crate::compiler_frontend::type_inference::auto_borrow::{
    BorrowDecision, GroupMember, ReferenceInputGroup,
};
use crate::compiler_frontend::type_inference::port_facades::PortFacade;
use crate::return_lifetime_termination_error;
use crate::settings::InferenceConfig;

pub(crate) fn insert_borrows(
    graph: &mut DataflowGraph,
    config: &InferenceConfig,
    context: &mut InferenceContext,
) -> Result<(), CompilerError> {
    let borrowing: Vec<ReferenceInputGroup> = context
        .groups
        .iter()
        .filter(|group| matches!(group.decision, Some(BorrowDecision::Borrow { .. })))
        .cloned()
        .collect();

    for group in borrowing {
        let Some(BorrowDecision::Borrow { mutable, .. }) = group.decision else {
            continue;
        };

        let mut wired = Vec::with_capacity(group.members.len());
        for member in &group.members {
            if graph.is_connected(member.port)? {
                wired.push(*member);
            }
        }

        if wired.is_empty() {
            continue;
        }

        let paired = paired_outputs(&group, &wired)?;

        // ============================================================
        // Borrow
        // ============================================================
        let borrow = graph.add_inserted_node(
            group.scope,
            NodeKind::ExplicitBorrow {
                mutable,
                count: wired.len(),
            },
        )?;

        for (index, member) in wired.iter().enumerate() {
            let borrow_input = graph.input_port(borrow, index)?;
            let borrow_output = graph.output_port(borrow, index)?;
            graph.splice(member.port, borrow_input, borrow_output)?;

            let facade = *context.facades.get(member.port)?;
            context.facades.insert(
                borrow_input,
                PortFacade::Simple {
                    variable: facade.facade_variable(),
                },
            )?;
            context.facades.insert(
                borrow_output,
                PortFacade::Simple {
                    variable: facade.true_variable(),
                },
            )?;
        }

        context.stats.borrows_inserted += 1;
        borrow_log!(format!(
            "[Borrows] {} borrow {} of {} inputs for {}",
            if mutable { "mutable" } else { "immutable" },
            borrow,
            wired.len(),
            group.node
        ));

        if paired.is_empty() {
            continue;
        }

        // ============================================================
        // Termination
        // ============================================================
        let terminate = graph.add_inserted_node(
            group.scope,
            NodeKind::TerminateLifetime {
                inputs: paired.len(),
                outputs: paired.len(),
            },
        )?;

        for (index, reference) in paired.iter().enumerate() {
            let handed_back = context.facades.facade_variable(*reference)?;
            let carried = context.facades.collapse_to_true(*reference)?;
            let wired_onward = graph.is_connected(*reference)?;

            let input = graph.input_port(terminate, index)?;
            let output = graph.output_port(terminate, index)?;
            graph.splice_after(*reference, input, output)?;

            context
                .facades
                .insert(input, PortFacade::Simple { variable: carried })?;
            context.facades.insert(
                output,
                PortFacade::Simple {
                    variable: handed_back,
                },
            )?;

            if !wired_onward && config.inference.insert_implicit_drops {
                let drop = graph.add_inserted_node(group.scope, NodeKind::Drop)?;
                let drop_input = graph.input_port(drop, 0)?;
                graph.connect(output, drop_input)?;
                context.facades.insert(
                    drop_input,
                    PortFacade::Simple {
                        variable: handed_back,
                    },
                )?;
                context.stats.drops_inserted += 1;
            }
        }

        context.stats.terminations_inserted += 1;
        borrow_log!(format!(
            "[Borrows] {} ends {} after {}",
            terminate, borrow, group.node
        ));
    }

    Ok(())
}

/// The outputs handing back the group's borrowed inputs, in member order.
///
/// A borrow either ends inside the node, when no input is handed back, or right after it,
/// when every wired input has a paired output. Anything in between cannot be ended.
fn paired_outputs(
    group: &ReferenceInputGroup,
    wired: &[GroupMember],
) -> Result<Vec<PortId>, CompilerError> {
    let paired: Vec<PortId> = wired
        .iter()
        .filter_map(|member| member.paired_output)
        .collect();

    if !paired.is_empty() && paired.len() < wired.len() {
        return_lifetime_termination_error!(
            format!(
                "Only {} of the {} inputs borrowed by {} hand their reference back, so the borrow cannot be ended",
                paired.len(),
                wired.len(),
                group.node
            ),
            ErrorLocation::at_node(group.node),
            {
                CompilationStage => "Borrow Insertion",
                LifetimeHint => "Every input sharing a lifetime needs a paired output",
            }
        );
    }

    Ok(paired)
}
