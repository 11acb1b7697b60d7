//! Auto-borrow groups and the decision procedure.
//!
//! Reference inputs of one node that share a lifetime parameter form a group. Once every
//! wired input of the group has received its value, the group either reuses the lifetime
//! the values already share or opens a new lifetime and asks for a borrow node.

use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::dfir::dfir_graph::DataflowGraph;
use crate::compiler_frontend::dfir::dfir_nodes::{NodeId, PortId, ScopeId};
use crate::compiler_frontend::type_inference::lifetimes::Lifetime;
use crate::compiler_frontend::type_inference::type_variables::TypeVariableRef;
use crate::return_compiler_error;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowPolicy {
    /// Mutating operations
    RequireMutable,
    /// Pure operations
    AllowImmutable,
    /// Selection and merge operations. Mutable only if every input is.
    Polymorphic,
}

impl BorrowPolicy {
    pub fn accepts_mutable(self) -> bool {
        !matches!(self, BorrowPolicy::AllowImmutable)
    }
}

/// What arrived at one wired input of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppliedValue {
    /// Some(mutable) if the value is already a reference
    pub reference: Option<bool>,

    /// The owned binding is mutable
    pub mutable_binding: bool,

    pub lifetime: Lifetime,
}

impl SuppliedValue {
    pub fn owned(mutable_binding: bool) -> Self {
        SuppliedValue {
            reference: None,
            mutable_binding,
            lifetime: Lifetime::Unbounded,
        }
    }

    pub fn reference(mutable: bool, lifetime: Lifetime) -> Self {
        SuppliedValue {
            reference: Some(mutable),
            mutable_binding: false,
            lifetime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowChoice {
    ReuseLifetime(Lifetime),
    BorrowMutable,
    BorrowImmutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowDecision {
    ReuseLifetime(Lifetime),
    Borrow { mutable: bool, lifetime: Lifetime },
}

impl BorrowDecision {
    pub fn lifetime(&self) -> Lifetime {
        match self {
            BorrowDecision::ReuseLifetime(lifetime) => *lifetime,
            BorrowDecision::Borrow { lifetime, .. } => *lifetime,
        }
    }
}

/// The first matching rule wins:
/// 1. mutable references sharing one bounded lifetime, policy accepts mutable: reuse
/// 2. policy accepts mutable, every value is a mutable reference or mutable binding: borrow mutably
/// 3. immutable references sharing one bounded lifetime: reuse
/// 4. borrow immutably
pub fn decide_borrow(policy: BorrowPolicy, supplied: &[SuppliedValue]) -> BorrowChoice {
    if policy.accepts_mutable()
        && let Some(lifetime) = shared_bounded_lifetime(supplied, true)
    {
        return BorrowChoice::ReuseLifetime(lifetime);
    }

    if policy.accepts_mutable()
        && !supplied.is_empty()
        && supplied.iter().all(|value| match value.reference {
            Some(mutable) => mutable,
            None => value.mutable_binding,
        })
    {
        return BorrowChoice::BorrowMutable;
    }

    if let Some(lifetime) = shared_bounded_lifetime(supplied, false) {
        return BorrowChoice::ReuseLifetime(lifetime);
    }

    BorrowChoice::BorrowImmutable
}

fn shared_bounded_lifetime(supplied: &[SuppliedValue], mutable: bool) -> Option<Lifetime> {
    let first = supplied.first()?.lifetime;
    if !first.is_bounded() {
        return None;
    }

    supplied
        .iter()
        .all(|value| value.reference == Some(mutable) && value.lifetime == first)
        .then_some(first)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMember {
    pub port: PortId,

    /// Output handing the borrowed value back, where the borrow can end
    pub paired_output: Option<PortId>,
}

#[derive(Debug, Clone)]
pub struct ReferenceInputGroup {
    pub id: GroupId,
    pub node: NodeId,
    pub scope: ScopeId,
    pub policy: BorrowPolicy,
    pub members: Vec<GroupMember>,

    /// Shared by every reference parameter with this group's lifetime
    pub lifetime_term: TypeVariableRef,

    pub wired_inputs: usize,
    pub received: usize,
    pub decision: Option<BorrowDecision>,
}

#[derive(Debug, Default)]
pub struct BorrowGroups {
    groups: Vec<ReferenceInputGroup>,
    group_by_port: FxHashMap<PortId, GroupId>,
}

impl BorrowGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_group(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        policy: BorrowPolicy,
        lifetime_term: TypeVariableRef,
    ) -> GroupId {
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(ReferenceInputGroup {
            id,
            node,
            scope,
            policy,
            members: Vec::new(),
            lifetime_term,
            wired_inputs: 0,
            received: 0,
            decision: None,
        });
        id
    }

    pub fn add_member(&mut self, group: GroupId, port: PortId) -> Result<(), CompilerError> {
        let Some(entry) = self.groups.get_mut(group.0 as usize) else {
            return_compiler_error!("Unknown borrow group {}", group.0);
        };

        entry.members.push(GroupMember {
            port,
            paired_output: None,
        });
        self.group_by_port.insert(port, group);
        Ok(())
    }

    pub fn pair_output(&mut self, input: PortId, output: PortId) -> Result<(), CompilerError> {
        let group = self.group_of(input)?;
        let entry = &mut self.groups[group.0 as usize];

        for member in entry.members.iter_mut() {
            if member.port == input {
                member.paired_output = Some(output);
            }
        }
        Ok(())
    }

    pub fn group_of(&self, port: PortId) -> Result<GroupId, CompilerError> {
        match self.group_by_port.get(&port) {
            Some(group) => Ok(*group),
            None => return_compiler_error!("{} is not a reference input", port),
        }
    }

    pub fn try_group_of(&self, port: PortId) -> Option<GroupId> {
        self.group_by_port.get(&port).copied()
    }

    pub fn get(&self, group: GroupId) -> Result<&ReferenceInputGroup, CompilerError> {
        match self.groups.get(group.0 as usize) {
            Some(entry) => Ok(entry),
            None => return_compiler_error!("Unknown borrow group {}", group.0),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceInputGroup> {
        self.groups.iter()
    }

    /// Counts the inputs of each group that have a wire.
    /// Unwired inputs never arrive and do not hold the decision back.
    pub fn count_wired_inputs(&mut self, graph: &DataflowGraph) -> Result<(), CompilerError> {
        for group in self.groups.iter_mut() {
            let mut wired = 0;
            for member in &group.members {
                if graph.is_connected(member.port)? {
                    wired += 1;
                }
            }
            group.wired_inputs = wired;
            group.received = 0;
        }
        Ok(())
    }

    /// Records one arrived input. Returns true when the group is ready to decide.
    pub fn arrive(&mut self, group: GroupId) -> Result<bool, CompilerError> {
        let Some(entry) = self.groups.get_mut(group.0 as usize) else {
            return_compiler_error!("Unknown borrow group {}", group.0);
        };

        entry.received += 1;
        Ok(entry.decision.is_none() && entry.received == entry.wired_inputs)
    }

    pub fn set_decision(
        &mut self,
        group: GroupId,
        decision: BorrowDecision,
    ) -> Result<(), CompilerError> {
        let Some(entry) = self.groups.get_mut(group.0 as usize) else {
            return_compiler_error!("Unknown borrow group {}", group.0);
        };

        if entry.decision.is_some() {
            return_compiler_error!("Borrow group {} was decided twice", group.0);
        }

        entry.decision = Some(decision);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
