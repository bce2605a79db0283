//! Dataflow graph construction.
//!
//! Walks a definition and each of its instances, tracing the driver of
//! every driven interface leaf. Anonymous aggregates, slices, element and
//! field reads, and constants become synthetic operator nodes with their
//! own port identities; real modules become definition or instance nodes.
//! Edges carry the `(driver-port, driven-port)` pair.
//!
//! Getter nodes are cached by `(aggregate, index)` so one read feeding many
//! consumers becomes one node with many out-edges.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableGraph};

use silica_netlist::{
    ArrayIndex, ChildKey, DefnId, Direction, HwType, InstId, Netlist, RootModule, TypeId, ValueId,
    ValueRef,
};

use crate::error::CompileError;
use crate::iface::collect_leaves;

/// Identity of a synthetic operator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SynthId(pub u32);

/// Kinds of synthetic operators introduced during graph construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SynthKind {
    ArrayGet { index: ArrayIndex },
    ArrayCreate,
    ProductGet { field: String },
    ProductCreate,
    BitConstant(bool),
    BitsConstant(u64),
}

/// A declared port on a synthetic operator.
#[derive(Debug, Clone)]
pub(crate) struct SynthPort {
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub(crate) struct SynthOp {
    pub kind: SynthKind,
    pub inputs: Vec<SynthPort>,
    pub output: SynthPort,
}

/// A node of the dataflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum GraphNode {
    Defn(DefnId),
    Inst(InstId),
    Synth(SynthId),
}

/// Port identity usable as a value-map key: either a real source value or
/// a port of a synthetic operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PortKey {
    Source(ValueId),
    SynthIn(SynthId, u32),
    SynthOut(SynthId),
}

/// Edge annotation: which port drives which.
#[derive(Debug, Clone)]
pub(crate) struct WireEdge {
    pub src: PortKey,
    pub dst: PortKey,
}

/// The per-definition dataflow graph.
#[derive(Debug, Default)]
pub(crate) struct DataflowGraph {
    pub graph: StableGraph<GraphNode, WireEdge>,
    synths: Vec<SynthOp>,
    index: HashMap<GraphNode, NodeIndex>,
}

impl DataflowGraph {
    /// The node index for `node`, inserting it if new.
    pub fn node_of(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(node, idx);
        idx
    }

    pub fn index_of(&self, node: GraphNode) -> Option<NodeIndex> {
        self.index.get(&node).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> GraphNode {
        self.graph[idx]
    }

    pub fn synth(&self, id: SynthId) -> &SynthOp {
        &self.synths[id.0 as usize]
    }

    fn new_synth(&mut self, op: SynthOp) -> (SynthId, NodeIndex) {
        let id = SynthId(self.synths.len() as u32);
        self.synths.push(op);
        let idx = self.node_of(GraphNode::Synth(id));
        (id, idx)
    }
}

struct GraphBuilder<'n> {
    nl: &'n mut Netlist,
    g: DataflowGraph,
    getters: HashMap<(ValueId, ChildKey), SynthId>,
    flatten_all_tuples: bool,
}

/// Builds the dataflow graph for one definition.
pub(crate) fn build_graph(
    nl: &mut Netlist,
    defn: DefnId,
    flatten_all_tuples: bool,
) -> Result<DataflowGraph, CompileError> {
    let mut b = GraphBuilder {
        nl,
        g: DataflowGraph::default(),
        getters: HashMap::new(),
        flatten_all_tuples,
    };
    b.g.node_of(GraphNode::Defn(defn));
    let instances = b.nl.defn(defn).instances.clone();
    for &inst in &instances {
        b.g.node_of(GraphNode::Inst(inst));
    }
    b.visit_module_inputs(GraphNode::Defn(defn))?;
    for &inst in &instances {
        b.visit_module_inputs(GraphNode::Inst(inst))?;
    }
    Ok(b.g)
}

impl GraphBuilder<'_> {
    fn ports_of(&self, node: GraphNode) -> Vec<ValueId> {
        match node {
            GraphNode::Defn(d) => self.nl.defn(d).ports.values().copied().collect(),
            GraphNode::Inst(i) => self.nl.inst(i).ports.values().copied().collect(),
            GraphNode::Synth(_) => unreachable!("synthetic nodes have no interface to walk"),
        }
    }

    fn visit_module_inputs(&mut self, node: GraphNode) -> Result<(), CompileError> {
        let module_idx = self.g.node_of(node);
        for port in self.ports_of(node) {
            let mut leaves = Vec::new();
            collect_leaves(self.nl, port, "", self.flatten_all_tuples, &mut leaves)?;
            for leaf in leaves {
                if leaf.dir != Direction::Input {
                    continue;
                }
                let driver = self.nl.trace(leaf.value).ok_or_else(|| {
                    CompileError::UnsupportedDriver {
                        reason: format!(
                            "undriven input ValueId({}) on {:?}",
                            leaf.value.0, node
                        ),
                    }
                })?;
                self.visit_driver(PortKey::Source(leaf.value), driver, module_idx)?;
            }
        }
        Ok(())
    }

    /// Adds the edge (and any synthetic nodes) for one `driver -> dst` pair.
    fn visit_driver(
        &mut self,
        dst: PortKey,
        driver: ValueId,
        module: NodeIndex,
    ) -> Result<(), CompileError> {
        let data = self.nl.value(driver).clone();
        match &data.origin {
            ValueRef::ConstDigital(b) => {
                let (sid, idx) = self.g.new_synth(SynthOp {
                    kind: SynthKind::BitConstant(*b),
                    inputs: vec![],
                    output: SynthPort { ty: data.ty },
                });
                self.add_edge(idx, module, PortKey::SynthOut(sid), dst);
                Ok(())
            }
            ValueRef::ConstBits(v) => {
                let (sid, idx) = self.g.new_synth(SynthOp {
                    kind: SynthKind::BitsConstant(*v),
                    inputs: vec![],
                    output: SynthPort { ty: data.ty },
                });
                self.add_edge(idx, module, PortKey::SynthOut(sid), dst);
                Ok(())
            }
            ValueRef::InstPort { inst, .. } => {
                let src_idx = self.g.node_of(GraphNode::Inst(*inst));
                self.add_edge(src_idx, module, PortKey::Source(driver), dst);
                Ok(())
            }
            ValueRef::DefnPort { defn, .. } => {
                let src_idx = self.g.node_of(GraphNode::Defn(*defn));
                self.add_edge(src_idx, module, PortKey::Source(driver), dst);
                Ok(())
            }
            ValueRef::Anon { elements } => {
                let elements = elements.clone();
                let kind = match self.nl.types.get(data.ty) {
                    HwType::Product { .. } => SynthKind::ProductCreate,
                    HwType::Bits(_) | HwType::Array { .. } => SynthKind::ArrayCreate,
                    HwType::Digital(_) => {
                        return Err(CompileError::UnsupportedDriver {
                            reason: "anonymous aggregate with scalar type".into(),
                        })
                    }
                };
                let inputs = elements
                    .iter()
                    .map(|&e| SynthPort {
                        ty: self.nl.value(e).ty,
                    })
                    .collect();
                let (sid, idx) = self.g.new_synth(SynthOp {
                    kind,
                    inputs,
                    output: SynthPort { ty: data.ty },
                });
                for (i, &element) in elements.iter().enumerate() {
                    self.visit_driver(PortKey::SynthIn(sid, i as u32), element, idx)?;
                }
                self.add_edge(idx, module, PortKey::SynthOut(sid), dst);
                Ok(())
            }
            ValueRef::ArrayElem { parent, index } => {
                let parent = *parent;
                let index = *index;
                if self.nl.value(parent).dir == Direction::Mixed {
                    return self.short_circuit_mixed(parent, driver, dst, module);
                }
                if self.is_flattened_leaf(parent, driver) {
                    return self.short_circuit_mixed(parent, driver, dst, module);
                }
                if matches!(index, ArrayIndex::Slice { .. })
                    && !self.nl.types.is_bit_vector(self.nl.value(parent).ty)
                {
                    return Err(CompileError::UnsupportedDriver {
                        reason: "slice of a non-bit-vector aggregate".into(),
                    });
                }
                let key = (parent, ChildKey::Index(index));
                let sid = match self.getters.get(&key) {
                    Some(&sid) => sid,
                    None => {
                        let (sid, idx) = self.g.new_synth(SynthOp {
                            kind: SynthKind::ArrayGet { index },
                            inputs: vec![SynthPort {
                                ty: self.nl.value(parent).ty,
                            }],
                            output: SynthPort { ty: data.ty },
                        });
                        self.getters.insert(key, sid);
                        self.visit_driver(PortKey::SynthIn(sid, 0), parent, idx)?;
                        sid
                    }
                };
                let src_idx = self.g.node_of(GraphNode::Synth(sid));
                self.add_edge(src_idx, module, PortKey::SynthOut(sid), dst);
                Ok(())
            }
            ValueRef::ProductField { parent, field } => {
                let parent = *parent;
                let field = field.clone();
                if self.nl.value(parent).dir == Direction::Mixed {
                    return self.short_circuit_mixed(parent, driver, dst, module);
                }
                if self.is_flattened_leaf(parent, driver) {
                    return self.short_circuit_mixed(parent, driver, dst, module);
                }
                let key = (parent, ChildKey::Field(field.clone()));
                let sid = match self.getters.get(&key) {
                    Some(&sid) => sid,
                    None => {
                        let (sid, idx) = self.g.new_synth(SynthOp {
                            kind: SynthKind::ProductGet {
                                field: field.clone(),
                            },
                            inputs: vec![SynthPort {
                                ty: self.nl.value(parent).ty,
                            }],
                            output: SynthPort { ty: data.ty },
                        });
                        self.getters.insert(key, sid);
                        self.visit_driver(PortKey::SynthIn(sid, 0), parent, idx)?;
                        sid
                    }
                };
                let src_idx = self.g.node_of(GraphNode::Synth(sid));
                self.add_edge(src_idx, module, PortKey::SynthOut(sid), dst);
                Ok(())
            }
        }
    }

    /// With `flatten_all_tuples`, product-carrying module ports are
    /// conveyed leaf-wise, so a direction-pure, product-free piece of one
    /// is already an interface leaf and needs no getter.
    fn is_flattened_leaf(&self, parent: ValueId, driver: ValueId) -> bool {
        self.flatten_all_tuples
            && self.nl.types.contains_product(self.nl.value(parent).ty)
            && !self.nl.types.contains_product(self.nl.value(driver).ty)
            && self.nl.root_module(parent).is_some()
    }

    /// A read out of a mixed-direction aggregate is already a leaf port of
    /// a real module; connect it directly.
    fn short_circuit_mixed(
        &mut self,
        parent: ValueId,
        driver: ValueId,
        dst: PortKey,
        module: NodeIndex,
    ) -> Result<(), CompileError> {
        let root = self
            .nl
            .root_module(parent)
            .ok_or_else(|| CompileError::UnsupportedDriver {
                reason: "mixed aggregate with no owning module".into(),
            })?;
        let src_idx = match root {
            RootModule::Defn(d) => self.g.node_of(GraphNode::Defn(d)),
            RootModule::Inst(i) => self.g.node_of(GraphNode::Inst(i)),
        };
        self.add_edge(src_idx, module, PortKey::Source(driver), dst);
        Ok(())
    }

    fn add_edge(&mut self, src: NodeIndex, dst: NodeIndex, src_port: PortKey, dst_port: PortKey) {
        self.g.graph.add_edge(
            src,
            dst,
            WireEdge {
                src: src_port,
                dst: dst_port,
            },
        );
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_driver_becomes_synth_node() {
        let mut nl = Netlist::new();
        let d = nl.new_definition("m");
        let bit = nl.types.bit();
        let y = nl.add_output(d, "y", bit).unwrap();
        let c = nl.bit_const(true);
        nl.wire(c, y).unwrap();
        let g = build_graph(&mut nl, d, false).unwrap();
        // Definition node + one constant synth.
        assert_eq!(g.graph.node_count(), 2);
        assert_eq!(g.graph.edge_count(), 1);
        let synth = g
            .graph
            .node_indices()
            .find_map(|i| match g.node(i) {
                GraphNode::Synth(s) => Some(s),
                _ => None,
            })
            .unwrap();
        assert_eq!(g.synth(synth).kind, SynthKind::BitConstant(true));
    }

    #[test]
    fn getter_nodes_are_cached() {
        let mut nl = Netlist::new();
        let d = nl.new_definition("m");
        let b8 = nl.types.bits(8);
        let arr = nl.types.array(4, b8);
        let a = nl.add_input(d, "a", arr).unwrap();
        let y = nl.add_output(d, "y", b8).unwrap();
        let z = nl.add_output(d, "z", b8).unwrap();
        let a0 = nl.elem(a, 0).unwrap();
        nl.wire(a0, y).unwrap();
        nl.wire(a0, z).unwrap();
        let g = build_graph(&mut nl, d, false).unwrap();
        // One shared getter: defn + getter = 2 nodes; edges: getter->defn x2
        // plus defn->getter for the aggregate input.
        assert_eq!(g.graph.node_count(), 2);
        assert_eq!(g.graph.edge_count(), 3);
    }

    #[test]
    fn feedthrough_makes_a_self_loop() {
        let mut nl = Netlist::new();
        let d = nl.new_definition("m");
        let b8 = nl.types.bits(8);
        let a = nl.add_input(d, "a", b8).unwrap();
        let y = nl.add_output(d, "y", b8).unwrap();
        nl.wire(a, y).unwrap();
        let g = build_graph(&mut nl, d, false).unwrap();
        assert_eq!(g.graph.node_count(), 1);
        let idx = g.index_of(GraphNode::Defn(d)).unwrap();
        use petgraph::visit::EdgeRef;
        let edge = g.graph.edges(idx).next().unwrap();
        assert_eq!(edge.target(), idx);
    }

    #[test]
    fn undriven_input_errors() {
        let mut nl = Netlist::new();
        let d = nl.new_definition("m");
        let b8 = nl.types.bits(8);
        nl.add_output(d, "y", b8).unwrap();
        let err = build_graph(&mut nl, d, false).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedDriver { .. }));
    }
}
