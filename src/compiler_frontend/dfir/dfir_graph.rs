//! Arena-backed dataflow graph.
//!
//! Scopes, nodes, ports and wires are stored in flat vectors and addressed by their ids.
//! Nothing is ever removed; disconnecting a sink only detaches it from its wire.

use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorLocation, ErrorType};
use crate::compiler_frontend::dfir::dfir_nodes::{
    BorderNodeKind, BorderSide, DfirNode, DfirPort, DfirScope, Direction, NodeId, NodeKind,
    PortId, ScopeId, StructureKind, Wire, WireId,
};
use crate::return_compiler_error;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct DataflowGraph {
    scopes: Vec<DfirScope>,
    nodes: Vec<DfirNode>,
    ports: Vec<DfirPort>,
    wires: Vec<Wire>,

    inner_scopes: FxHashMap<NodeId, Vec<ScopeId>>,
    border_nodes: FxHashMap<NodeId, Vec<NodeId>>,
}

impl Default for DataflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DataflowGraph {
    pub fn new() -> Self {
        DataflowGraph {
            scopes: vec![DfirScope {
                id: ScopeId(0),
                parent: None,
                owner: None,
                executes_conditionally: false,
                nodes: Vec::new(),
            }],
            nodes: Vec::new(),
            ports: Vec::new(),
            wires: Vec::new(),
            inner_scopes: FxHashMap::default(),
            border_nodes: FxHashMap::default(),
        }
    }

    pub fn root_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    // ============================================================
    // Building
    // ============================================================

    /// Adds a plain node with ports derived from its kind.
    pub fn add_node(&mut self, scope: ScopeId, kind: NodeKind) -> Result<NodeId, CompilerError> {
        self.push_node(scope, kind, false)
    }

    /// Adds a node that inference created rather than the user.
    pub fn add_inserted_node(
        &mut self,
        scope: ScopeId,
        kind: NodeKind,
    ) -> Result<NodeId, CompilerError> {
        self.push_node(scope, kind, true)
    }

    fn push_node(
        &mut self,
        scope: ScopeId,
        kind: NodeKind,
        inserted: bool,
    ) -> Result<NodeId, CompilerError> {
        self.scope(scope)?;

        let (input_count, output_count) = match &kind {
            NodeKind::Constant { .. } => (0, 1),
            NodeKind::Functional(signature) => {
                (signature.input_count(), signature.output_count())
            }
            NodeKind::ExplicitBorrow { count, .. } => (*count, *count),
            NodeKind::TerminateLifetime { inputs, outputs } => (*inputs, *outputs),
            NodeKind::Drop => (1, 0),
            NodeKind::Structure(_) | NodeKind::Border { .. } => {
                return_compiler_error!(
                    "'{}' nodes must be added through add_structure or add_border_node",
                    kind.name()
                );
            }
        };

        let id = self.allocate_node(scope, kind, inserted);
        for index in 0..input_count {
            self.add_port(id, Direction::Input, index, scope);
        }
        for index in 0..output_count {
            self.add_port(id, Direction::Output, index, scope);
        }
        self.scopes[scope.0 as usize].nodes.push(id);

        Ok(id)
    }

    /// Adds a structure and creates its inner scopes.
    /// Loop bodies and match arms are always conditional.
    pub fn add_structure(
        &mut self,
        scope: ScopeId,
        kind: StructureKind,
    ) -> Result<NodeId, CompilerError> {
        self.scope(scope)?;

        let id = self.allocate_node(scope, NodeKind::Structure(kind), false);
        let conditional = !matches!(kind, StructureKind::Frame);

        let mut inner = Vec::with_capacity(kind.inner_scope_count());
        for _ in 0..kind.inner_scope_count() {
            let inner_id = ScopeId(self.scopes.len() as u32);
            self.scopes.push(DfirScope {
                id: inner_id,
                parent: Some(scope),
                owner: Some(id),
                executes_conditionally: conditional,
                nodes: Vec::new(),
            });
            inner.push(inner_id);
        }

        self.inner_scopes.insert(id, inner);
        self.border_nodes.insert(id, Vec::new());
        self.scopes[scope.0 as usize].nodes.push(id);

        Ok(id)
    }

    /// Adds a border node to a structure.
    ///
    /// The outer port faces the structure's scope. Tunnels that fan into every arm
    /// get one inner port per inner scope.
    pub fn add_border_node(
        &mut self,
        structure: NodeId,
        kind: BorderNodeKind,
    ) -> Result<NodeId, CompilerError> {
        let structure_node = self.node(structure)?;
        let NodeKind::Structure(structure_kind) = structure_node.kind else {
            return_compiler_error!(
                "Border node '{}' attached to '{}', which is not a structure",
                kind.name(),
                structure
            );
        };
        let outer_scope = structure_node.scope;
        let inner = self.inner_scopes(structure)?.to_vec();

        let allowed = match kind {
            BorderNodeKind::InputTunnel
            | BorderNodeKind::OutputTunnel
            | BorderNodeKind::BorrowTunnel { .. } => true,
            BorderNodeKind::TerminateLifetimeTunnel { borrow_tunnel } => {
                let partner = self.node(borrow_tunnel)?;
                matches!(
                    partner.kind,
                    NodeKind::Border {
                        structure: partner_structure,
                        kind: BorderNodeKind::BorrowTunnel { .. },
                    } if partner_structure == structure
                )
            }
            BorderNodeKind::UnwrapOptionTunnel => structure_kind == StructureKind::Frame,
            BorderNodeKind::LoopCondition | BorderNodeKind::IterateTunnel => {
                structure_kind == StructureKind::Loop
            }
            BorderNodeKind::OptionSelector => structure_kind == StructureKind::OptionMatch,
        };

        if !allowed {
            return_compiler_error!(
                "Border node '{}' cannot be attached to a '{}' structure",
                kind.name(),
                structure_kind.name()
            );
        }

        let id = self.allocate_node(outer_scope, NodeKind::Border { structure, kind }, false);

        match kind.side() {
            BorderSide::Input => {
                self.add_port(id, Direction::Input, 0, outer_scope);
                let faces = match kind {
                    BorderNodeKind::InputTunnel | BorderNodeKind::BorrowTunnel { .. } => {
                        inner.as_slice()
                    }
                    // The selector only feeds the Some arm
                    _ => &inner[..1],
                };
                for (index, scope) in faces.iter().enumerate() {
                    self.add_port(id, Direction::Output, index, *scope);
                }
            }
            BorderSide::Output => {
                for (index, scope) in inner.iter().enumerate() {
                    self.add_port(id, Direction::Input, index, *scope);
                }
                self.add_port(id, Direction::Output, 0, outer_scope);
            }
        }

        if kind == BorderNodeKind::UnwrapOptionTunnel {
            for scope in &inner {
                self.scopes[scope.0 as usize].executes_conditionally = true;
            }
        }

        if let Some(borders) = self.border_nodes.get_mut(&structure) {
            borders.push(id);
        }

        Ok(id)
    }

    fn allocate_node(&mut self, scope: ScopeId, kind: NodeKind, inserted: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(DfirNode {
            id,
            scope,
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            inserted,
        });
        id
    }

    fn add_port(&mut self, node: NodeId, direction: Direction, index: usize, scope: ScopeId) {
        let id = PortId(self.ports.len() as u32);
        self.ports.push(DfirPort {
            id,
            node,
            direction,
            index,
            scope,
            wire: None,
        });

        let node = &mut self.nodes[node.0 as usize];
        match direction {
            Direction::Input => node.inputs.push(id),
            Direction::Output => node.outputs.push(id),
        }
    }

    // ============================================================
    // Wiring
    // ============================================================

    /// Connects an output port to an input port.
    /// Extends the source's wire if it already has one, otherwise creates a new wire.
    pub fn connect(&mut self, source: PortId, sink: PortId) -> Result<WireId, CompilerError> {
        let source_port = self.port(source)?;
        let sink_port = self.port(sink)?;

        if source_port.direction != Direction::Output || sink_port.direction != Direction::Input
        {
            return_compiler_error!(
                "Wires must run from an output port to an input port ({} -> {})",
                source,
                sink
            );
        }

        if source_port.scope != sink_port.scope {
            return Err(CompilerError::new(
                format!(
                    "Cannot wire {} to {}: the ports face different scopes ({} and {})",
                    source, sink, source_port.scope, sink_port.scope
                ),
                ErrorLocation::at_port(sink_port.node, sink),
                ErrorType::Compiler,
            ));
        }

        if let Some(existing) = sink_port.wire {
            return Err(CompilerError::new(
                format!("Input {sink} is already connected by {existing}"),
                ErrorLocation::at_port(sink_port.node, sink),
                ErrorType::Compiler,
            ));
        }

        let scope = source_port.scope;
        let existing_wire = source_port.wire;
        let wire_id = match existing_wire {
            Some(wire_id) => {
                self.wires[wire_id.0 as usize].sinks.push(sink);
                wire_id
            }
            None => {
                let wire_id = WireId(self.wires.len() as u32);
                self.wires.push(Wire {
                    id: wire_id,
                    scope,
                    source,
                    sinks: vec![sink],
                });
                self.ports[source.0 as usize].wire = Some(wire_id);
                wire_id
            }
        };

        self.ports[sink.0 as usize].wire = Some(wire_id);
        Ok(wire_id)
    }

    /// Detaches an input from its wire. Returns the port that used to feed it.
    pub fn disconnect_sink(&mut self, sink: PortId) -> Result<Option<PortId>, CompilerError> {
        let Some(wire_id) = self.port(sink)?.wire else {
            return Ok(None);
        };

        let wire = &mut self.wires[wire_id.0 as usize];
        wire.sinks.retain(|port| *port != sink);
        let source = wire.source;

        if wire.sinks.is_empty() {
            self.ports[source.0 as usize].wire = None;
        }
        self.ports[sink.0 as usize].wire = None;

        Ok(Some(source))
    }

    /// Routes the value feeding `sink` through another node.
    /// `through_input` takes the sink's place on the original wire (keeping its sink order)
    /// and `through_output` is wired to `sink`.
    pub fn splice(
        &mut self,
        sink: PortId,
        through_input: PortId,
        through_output: PortId,
    ) -> Result<(), CompilerError> {
        let Some(wire_id) = self.port(sink)?.wire else {
            return_compiler_error!("Cannot splice into unconnected input {}", sink);
        };

        if self.port(through_input)?.wire.is_some() {
            return_compiler_error!("Splice input {} is already connected", through_input);
        }

        let wire = &mut self.wires[wire_id.0 as usize];
        for port in wire.sinks.iter_mut() {
            if *port == sink {
                *port = through_input;
            }
        }
        self.ports[through_input.0 as usize].wire = Some(wire_id);
        self.ports[sink.0 as usize].wire = None;

        self.connect(through_output, sink)?;
        Ok(())
    }

    /// Routes everything `source` feeds through another node.
    /// `through_output` takes over the source's wire (keeping its sinks) and `source` is
    /// wired to `through_input` alone.
    pub fn splice_after(
        &mut self,
        source: PortId,
        through_input: PortId,
        through_output: PortId,
    ) -> Result<(), CompilerError> {
        if self.port(through_output)?.wire.is_some() {
            return_compiler_error!("Splice output {} is already connected", through_output);
        }

        if self.port(through_output)?.scope != self.port(source)?.scope {
            return_compiler_error!(
                "Cannot splice {} after {}: the ports face different scopes",
                through_output,
                source
            );
        }

        let existing_wire = self.port(source)?.wire;
        if let Some(wire_id) = existing_wire {
            self.wires[wire_id.0 as usize].source = through_output;
            self.ports[through_output.0 as usize].wire = Some(wire_id);
            self.ports[source.0 as usize].wire = None;
        }

        self.connect(source, through_input)?;
        Ok(())
    }

    // ============================================================
    // Queries
    // ============================================================
    pub fn scope(&self, id: ScopeId) -> Result<&DfirScope, CompilerError> {
        match self.scopes.get(id.0 as usize) {
            Some(scope) => Ok(scope),
            None => Err(CompilerError::new(
                format!("Unknown scope {id}"),
                ErrorLocation::at_scope(id),
                ErrorType::Compiler,
            )),
        }
    }

    pub fn node(&self, id: NodeId) -> Result<&DfirNode, CompilerError> {
        match self.nodes.get(id.0 as usize) {
            Some(node) => Ok(node),
            None => Err(CompilerError::new(
                format!("Unknown node {id}"),
                ErrorLocation::at_node(id),
                ErrorType::Compiler,
            )),
        }
    }

    pub fn port(&self, id: PortId) -> Result<&DfirPort, CompilerError> {
        match self.ports.get(id.0 as usize) {
            Some(port) => Ok(port),
            None => Err(CompilerError::new(
                format!("Unknown port {id}"),
                ErrorLocation {
                    port: Some(id),
                    ..ErrorLocation::default()
                },
                ErrorType::Compiler,
            )),
        }
    }

    pub fn wire(&self, id: WireId) -> Result<&Wire, CompilerError> {
        match self.wires.get(id.0 as usize) {
            Some(wire) => Ok(wire),
            None => return_compiler_error!("Unknown wire {}", id),
        }
    }

    pub fn scopes(&self) -> &[DfirScope] {
        &self.scopes
    }

    pub fn nodes(&self) -> &[DfirNode] {
        &self.nodes
    }

    pub fn ports(&self) -> &[DfirPort] {
        &self.ports
    }

    /// Wires that still have at least one sink
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter().filter(|wire| !wire.sinks.is_empty())
    }

    pub fn input_port(&self, node: NodeId, index: usize) -> Result<PortId, CompilerError> {
        match self.node(node)?.inputs.get(index) {
            Some(port) => Ok(*port),
            None => return_compiler_error!("{} has no input {}", node, index),
        }
    }

    pub fn output_port(&self, node: NodeId, index: usize) -> Result<PortId, CompilerError> {
        match self.node(node)?.outputs.get(index) {
            Some(port) => Ok(*port),
            None => return_compiler_error!("{} has no output {}", node, index),
        }
    }

    pub fn inner_scopes(&self, structure: NodeId) -> Result<&[ScopeId], CompilerError> {
        match self.inner_scopes.get(&structure) {
            Some(scopes) => Ok(scopes),
            None => return_compiler_error!("{} is not a structure", structure),
        }
    }

    pub fn border_nodes(&self, structure: NodeId) -> Result<&[NodeId], CompilerError> {
        match self.border_nodes.get(&structure) {
            Some(nodes) => Ok(nodes),
            None => return_compiler_error!("{} is not a structure", structure),
        }
    }

    /// The output port feeding an input, if it is wired
    pub fn source_of(&self, sink: PortId) -> Result<Option<PortId>, CompilerError> {
        let port = self.port(sink)?;
        if port.direction != Direction::Input {
            return Ok(None);
        }

        match port.wire {
            Some(wire) => Ok(Some(self.wire(wire)?.source)),
            None => Ok(None),
        }
    }

    /// The inputs an output feeds, in wiring order
    pub fn sinks_of(&self, source: PortId) -> Result<&[PortId], CompilerError> {
        let port = self.port(source)?;
        if port.direction != Direction::Output {
            return Ok(&[]);
        }

        match port.wire {
            Some(wire) => Ok(&self.wire(wire)?.sinks),
            None => Ok(&[]),
        }
    }

    pub fn is_connected(&self, port: PortId) -> Result<bool, CompilerError> {
        Ok(self.port(port)?.wire.is_some())
    }

    pub fn inserted_nodes(&self) -> impl Iterator<Item = &DfirNode> {
        self.nodes.iter().filter(|node| node.inserted)
    }
}
