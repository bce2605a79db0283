//! Per-node MLIR emission.
//!
//! The module visitor walks the dataflow graph in DFS-over-predecessors
//! order: every driver of a node is emitted before the node itself, and the
//! `(driver-port, driven-port)` edge annotations copy the driver's mapped
//! value into the driven port's slot before dispatch. Feedback loops are
//! cut by the visited set and repaired afterwards by the cycle breaker.
//!
//! Dispatch is a closed match over node kinds; the primitive table is the
//! match over `(library, operator)` pairs in [`visit_coreir`] and friends.
//! Unknown pairs surface as `UnsupportedPrimitive`.

use silica_mlir::{
    Block, MlirType, MlirValue, OpKind, Operation,
    ops::{AlwaysFFReset, ClockEdge, ResetStyle},
};
use silica_netlist::{
    ArrayIndex, ConfigValue, Definition, DigitalKind, GuardKind, HwType, InstId, Instance,
    PrimitiveInfo, ResetKind, TypeId,
};

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::error::CompileError;
use crate::graph::{DataflowGraph, GraphNode, PortKey, SynthId, SynthKind};
use crate::iface::collect_leaves;
use crate::unit::{ModuleCx, SymKey, TranslationUnit};

/// A constant value shaped like a source type. Hashable so per-module
/// constant materialization can be cached by `(type, value)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ConstValue {
    Bit(bool),
    Bits(i64),
    Array(Vec<ConstValue>),
    Product(Vec<ConstValue>),
}

/// Materialized operand and result lists for one graph node.
pub(crate) struct ModuleWrapper {
    pub operands: Vec<MlirValue>,
    pub results: Vec<MlirValue>,
}

fn clog2(n: u32) -> u32 {
    debug_assert!(n >= 1);
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}

fn icmp_predicate(name: &str) -> Option<&'static str> {
    Some(match name {
        "eq" => "eq",
        "ne" => "ne",
        "slt" => "slt",
        "sle" => "sle",
        "sgt" => "sgt",
        "sge" => "sge",
        "ult" => "ult",
        "ule" => "ule",
        "ugt" => "ugt",
        "uge" => "uge",
        _ => return None,
    })
}

fn comb_base_op(name: &str) -> Option<&'static str> {
    Some(match name {
        "and" => "and",
        "or" => "or",
        "xor" => "xor",
        "add" => "add",
        "sub" => "sub",
        "mul" => "mul",
        "divs" => "divs",
        "divu" => "divu",
        "mods" => "mods",
        "modu" => "modu",
        "shl" => "shl",
        "ashr" => "shrs",
        "lshr" => "shru",
        _ => return None,
    })
}

fn decode_reset(kind: ResetKind) -> (ResetStyle, ClockEdge) {
    match kind {
        ResetKind::Sync => (ResetStyle::Sync, ClockEdge::Pos),
        ResetKind::SyncN => (ResetStyle::Sync, ClockEdge::Neg),
        ResetKind::Async => (ResetStyle::Async, ClockEdge::Pos),
        ResetKind::AsyncN => (ResetStyle::Async, ClockEdge::Neg),
    }
}

impl TranslationUnit<'_> {
    fn port_type(&self, graph: &DataflowGraph, key: &PortKey) -> TypeId {
        match key {
            PortKey::Source(v) => self.netlist.value(*v).ty,
            PortKey::SynthIn(s, i) => graph.synth(*s).inputs[*i as usize].ty,
            PortKey::SynthOut(s) => graph.synth(*s).output.ty,
        }
    }

    /// The mapped value for a port, created anonymous on first use.
    pub(crate) fn mapped_or_new(
        &mut self,
        cx: &mut ModuleCx,
        graph: &DataflowGraph,
        key: &PortKey,
    ) -> Result<MlirValue, CompileError> {
        if let Some(v) = cx.value_map.get(key) {
            return Ok(v.clone());
        }
        let ty = self.lower(self.port_type(graph, key))?;
        let value = MlirValue::anon(cx.values.fresh(), ty);
        cx.value_map.insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Insert-once mapping of a driven port.
    fn set_mapped(
        &self,
        cx: &mut ModuleCx,
        key: PortKey,
        value: MlirValue,
    ) -> Result<(), CompileError> {
        if cx.value_map.contains_key(&key) {
            return Err(CompileError::ValueMapConflict {
                key: format!("{key:?}"),
            });
        }
        cx.value_map.insert(key, value);
        Ok(())
    }

    fn new_anon(&mut self, cx: &mut ModuleCx, ty: TypeId) -> Result<MlirValue, CompileError> {
        let lowered = self.lower(ty)?;
        Ok(MlirValue::anon(cx.values.fresh(), lowered))
    }

    /// DFS over predecessors; emits every node exactly once.
    pub(crate) fn visit(
        &mut self,
        cx: &mut ModuleCx,
        graph: &DataflowGraph,
        node: NodeIndex,
    ) -> Result<(), CompileError> {
        if !cx.visited.insert(node) {
            return Err(CompileError::ReVisit {
                module: cx.name.clone(),
            });
        }
        let preds: Vec<NodeIndex> = graph
            .graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .collect();
        for pred in preds {
            if !cx.visited.contains(&pred) {
                self.visit(cx, graph, pred)?;
            }
        }
        let in_edges: Vec<_> = graph
            .graph
            .edges_directed(node, petgraph::Direction::Incoming)
            .map(|e| e.weight().clone())
            .collect();
        for edge in in_edges {
            let src = self.mapped_or_new(cx, graph, &edge.src)?;
            self.set_mapped(cx, edge.dst, src)?;
        }
        let wrapper = self.make_wrapper(cx, graph, node)?;
        self.visit_node(cx, graph, node, wrapper)?;
        if let GraphNode::Defn(d) = graph.node(node) {
            let instances = self.netlist.defn(d).instances.clone();
            for inst in instances {
                if let Some(idx) = graph.index_of(GraphNode::Inst(inst)) {
                    if !cx.visited.contains(&idx) {
                        self.visit(cx, graph, idx)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn make_wrapper(
        &mut self,
        cx: &mut ModuleCx,
        graph: &DataflowGraph,
        node: NodeIndex,
    ) -> Result<ModuleWrapper, CompileError> {
        match graph.node(node) {
            GraphNode::Synth(s) => {
                let n_inputs = graph.synth(s).inputs.len();
                let mut operands = Vec::with_capacity(n_inputs);
                for i in 0..n_inputs {
                    operands.push(self.mapped_or_new(cx, graph, &PortKey::SynthIn(s, i as u32))?);
                }
                let results = vec![self.mapped_or_new(cx, graph, &PortKey::SynthOut(s))?];
                Ok(ModuleWrapper { operands, results })
            }
            GraphNode::Defn(d) => {
                let ports: Vec<_> = self.netlist.defn(d).ports.values().copied().collect();
                self.wrapper_from_ports(cx, graph, &ports)
            }
            GraphNode::Inst(i) => {
                let ports: Vec<_> = self.netlist.inst(i).ports.values().copied().collect();
                self.wrapper_from_ports(cx, graph, &ports)
            }
        }
    }

    fn wrapper_from_ports(
        &mut self,
        cx: &mut ModuleCx,
        graph: &DataflowGraph,
        ports: &[silica_netlist::ValueId],
    ) -> Result<ModuleWrapper, CompileError> {
        let flatten = self.opts.flatten_all_tuples;
        let mut operands = Vec::new();
        let mut results = Vec::new();
        for &port in ports {
            let mut leaves = Vec::new();
            collect_leaves(self.netlist, port, "", flatten, &mut leaves)?;
            for leaf in leaves {
                let value = self.mapped_or_new(cx, graph, &PortKey::Source(leaf.value))?;
                match leaf.dir {
                    silica_netlist::Direction::Input => operands.push(value),
                    silica_netlist::Direction::Output => results.push(value),
                    _ => {}
                }
            }
        }
        Ok(ModuleWrapper { operands, results })
    }

    fn visit_node(
        &mut self,
        cx: &mut ModuleCx,
        graph: &DataflowGraph,
        node: NodeIndex,
        wrapper: ModuleWrapper,
    ) -> Result<(), CompileError> {
        match graph.node(node) {
            GraphNode::Defn(_) => Ok(()),
            GraphNode::Synth(s) => self.visit_synth(cx, graph, s, wrapper),
            GraphNode::Inst(i) => self.visit_instance(cx, i, wrapper),
        }
    }

    // -----------------------------------------------------------------------
    // Constants
    // -----------------------------------------------------------------------

    /// Materializes a constant of a source type, cached per `(type, value)`
    /// within the module. `None` means all-zero.
    pub(crate) fn make_constant(
        &mut self,
        cx: &mut ModuleCx,
        ty: TypeId,
        value: Option<ConstValue>,
    ) -> Result<MlirValue, CompileError> {
        let key = (ty, value.clone());
        if let Some(v) = cx.consts.get(&key) {
            return Ok(v.clone());
        }
        let result = match self.netlist.types.get(ty).clone() {
            HwType::Digital(_) | HwType::Bits(_) => {
                let n = match &value {
                    Some(ConstValue::Bit(b)) => *b as i64,
                    Some(ConstValue::Bits(n)) => *n,
                    None => 0,
                    other => {
                        return Err(CompileError::InvalidGraph(format!(
                            "scalar constant from aggregate value {other:?}"
                        )))
                    }
                };
                self.emit_int_constant(cx, ty, n)?
            }
            HwType::Array { len, elem } => {
                if self.netlist.types.is_bit_vector(ty) {
                    let n = match &value {
                        Some(ConstValue::Bits(n)) => *n,
                        None => 0,
                        other => {
                            return Err(CompileError::InvalidGraph(format!(
                                "bit-vector constant from {other:?}"
                            )))
                        }
                    };
                    self.emit_int_constant(cx, ty, n)?
                } else {
                    let values: Vec<Option<ConstValue>> = match value.clone() {
                        Some(ConstValue::Array(vs)) => vs.into_iter().map(Some).collect(),
                        None => vec![None; len as usize],
                        other => {
                            return Err(CompileError::InvalidGraph(format!(
                                "array constant from {other:?}"
                            )))
                        }
                    };
                    let mut operands = Vec::with_capacity(values.len());
                    for v in values {
                        operands.push(self.make_constant(cx, elem, v)?);
                    }
                    let out = self.new_anon(cx, ty)?;
                    cx.builder.emit(Operation::new(
                        OpKind::HwArrayCreate,
                        operands,
                        vec![out.clone()],
                    ));
                    out
                }
            }
            HwType::Product { fields } => {
                let values: Vec<Option<ConstValue>> = match value.clone() {
                    Some(ConstValue::Product(vs)) => vs.into_iter().map(Some).collect(),
                    None => vec![None; fields.len()],
                    other => {
                        return Err(CompileError::InvalidGraph(format!(
                            "product constant from {other:?}"
                        )))
                    }
                };
                let mut operands = Vec::with_capacity(fields.len());
                for ((_, fty), v) in fields.iter().zip(values) {
                    operands.push(self.make_constant(cx, *fty, v)?);
                }
                let out = self.new_anon(cx, ty)?;
                cx.builder.emit(Operation::new(
                    OpKind::HwStructCreate,
                    operands,
                    vec![out.clone()],
                ));
                out
            }
        };
        cx.consts.insert(key, result.clone());
        Ok(result)
    }

    fn emit_int_constant(
        &mut self,
        cx: &mut ModuleCx,
        ty: TypeId,
        value: i64,
    ) -> Result<MlirValue, CompileError> {
        let out = self.new_anon(cx, ty)?;
        cx.builder.emit(Operation::new(
            OpKind::HwConstant { value },
            vec![],
            vec![out.clone()],
        ));
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Synthetic operators
    // -----------------------------------------------------------------------

    fn visit_synth(
        &mut self,
        cx: &mut ModuleCx,
        graph: &DataflowGraph,
        s: SynthId,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let op = graph.synth(s).clone();
        match op.kind {
            SynthKind::BitConstant(b) => {
                cx.builder.emit(Operation::new(
                    OpKind::HwConstant { value: b as i64 },
                    vec![],
                    w.results,
                ));
                Ok(())
            }
            SynthKind::BitsConstant(v) => {
                cx.builder.emit(Operation::new(
                    OpKind::HwConstant { value: v as i64 },
                    vec![],
                    w.results,
                ));
                Ok(())
            }
            SynthKind::ProductGet { field } => {
                cx.builder.emit(Operation::new(
                    OpKind::HwStructExtract { field },
                    w.operands,
                    w.results,
                ));
                Ok(())
            }
            SynthKind::ProductCreate => {
                cx.builder.emit(Operation::new(
                    OpKind::HwStructCreate,
                    w.operands,
                    w.results,
                ));
                Ok(())
            }
            SynthKind::ArrayCreate => {
                // hw.array_create and comb.concat take operands MSB first:
                // the leaf-order operand list is consumed in reverse.
                let mut operands = w.operands;
                operands.reverse();
                let kind = if self.netlist.types.is_bit_vector(op.output.ty) {
                    OpKind::CombConcat
                } else {
                    OpKind::HwArrayCreate
                };
                cx.builder.emit(Operation::new(kind, operands, w.results));
                Ok(())
            }
            SynthKind::ArrayGet { index } => {
                let parent_ty = op.inputs[0].ty;
                if self.netlist.types.is_bit_vector(parent_ty) {
                    let lo = match index {
                        ArrayIndex::Elem(i) => i,
                        ArrayIndex::Slice { lo, .. } => lo,
                    };
                    cx.builder.emit(Operation::new(
                        OpKind::CombExtract { lo },
                        w.operands,
                        w.results,
                    ));
                    return Ok(());
                }
                let i = match index {
                    ArrayIndex::Elem(i) => i,
                    ArrayIndex::Slice { .. } => {
                        return Err(CompileError::UnsupportedDriver {
                            reason: "slice read of a non-bit-vector array".into(),
                        })
                    }
                };
                let mut array = w.operands[0].clone();
                let mut size = self
                    .netlist
                    .types
                    .array_len(parent_ty)
                    .ok_or_else(|| CompileError::InvalidGraph("array get on scalar".into()))?;
                // There is no i0 constant to index a 1-element array with:
                // concatenate a dummy 1-element array to reach size 2, then
                // index with an i1 zero.
                if size == 1 {
                    let elem_ty = self
                        .netlist
                        .types
                        .elem_type(parent_ty)
                        .ok_or_else(|| CompileError::InvalidGraph("array get on scalar".into()))?;
                    let dummy = self.make_constant(cx, parent_ty, None)?;
                    let lowered_elem = self.lower(elem_ty)?;
                    let concat = MlirValue::anon(
                        cx.values.fresh(),
                        MlirType::array(2, lowered_elem),
                    );
                    cx.builder.emit(Operation::new(
                        OpKind::HwArrayConcat,
                        vec![array, dummy],
                        vec![concat.clone()],
                    ));
                    array = concat;
                    size = 2;
                }
                let sel_width = clog2(size);
                let sel_ty = self.netlist.types.bits(sel_width);
                let sel = self.make_constant(cx, sel_ty, Some(ConstValue::Bits(i as i64)))?;
                cx.builder.emit(Operation::new(
                    OpKind::HwArrayGet,
                    vec![array, sel],
                    w.results,
                ));
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    fn visit_instance(
        &mut self,
        cx: &mut ModuleCx,
        inst_id: InstId,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let inst = self.netlist.inst(inst_id).clone();
        let defn = self.netlist.defn(inst.defn).clone();
        if !defn.inline_verilog.is_empty() {
            return self.visit_inline_verilog(cx, &defn, w);
        }
        if let Some(prim) = defn.primitive.clone() {
            return match (prim.lib.as_str(), prim.name.as_str()) {
                ("magma", "mux") => self.visit_magma_mux(cx, &defn, w),
                ("magma", "register") => self.visit_magma_register(cx, &inst, &defn, &prim, w),
                ("coreir", _) | ("corebit", _) => {
                    self.visit_coreir(cx, inst_id, &inst, &defn, &prim, w)
                }
                ("commonlib", "muxn") => self.visit_muxn(cx, &defn, w),
                ("commonlib", "lutN") => self.visit_lutn(cx, &prim, w),
                _ => Err(CompileError::UnsupportedPrimitive {
                    lib: prim.lib.clone(),
                    name: prim.name.clone(),
                }),
            };
        }
        let handle = self.modules.get(&inst.defn).cloned().ok_or_else(|| {
            CompileError::InvalidGraph(format!("instance '{}' of uncompiled module", inst.name))
        })?;
        let op = Operation::new(
            OpKind::HwInstance {
                name: inst.name.clone(),
                module: handle.sym,
                sym: None,
                do_not_print: false,
            },
            w.operands,
            w.results,
        );
        match &inst.compile_guard {
            None => cx.builder.emit(op),
            Some(guard) => {
                let (block, ()) = cx.builder.scoped(|b| {
                    b.emit(op);
                    Ok::<_, CompileError>(())
                })?;
                let kind = match guard.kind {
                    GuardKind::Defined => OpKind::SvIfDef {
                        cond: guard.cond.clone(),
                        body: block,
                        else_body: None,
                    },
                    GuardKind::Undefined => OpKind::SvIfDef {
                        cond: guard.cond.clone(),
                        body: Block::default(),
                        else_body: Some(block),
                    },
                };
                cx.builder.emit(Operation::new(kind, vec![], vec![]));
            }
        }
        Ok(())
    }

    fn src_port_type(&self, defn: &Definition, port: &str) -> Result<TypeId, CompileError> {
        let value = defn.ports.get(port).copied().ok_or_else(|| {
            CompileError::InvalidGraph(format!("primitive '{}' has no '{port}' port", defn.name))
        })?;
        Ok(self.netlist.value(value).ty)
    }

    fn visit_coreir(
        &mut self,
        cx: &mut ModuleCx,
        inst_id: InstId,
        inst: &Instance,
        defn: &Definition,
        prim: &PrimitiveInfo,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        if let Some(pred) = icmp_predicate(&prim.name) {
            cx.builder.emit(Operation::new(
                OpKind::CombICmp { predicate: pred },
                w.operands,
                w.results,
            ));
            return Ok(());
        }
        match prim.name.as_str() {
            "not" => {
                let in_ty = self.src_port_type(defn, "I")?;
                let neg_one = self.make_constant(cx, in_ty, Some(ConstValue::Bits(-1)))?;
                cx.builder.emit(Operation::new(
                    OpKind::CombBase { op: "xor" },
                    vec![neg_one, w.operands[0].clone()],
                    w.results,
                ));
                Ok(())
            }
            "reg" | "reg_arst" => self.visit_coreir_reg(cx, inst, defn, prim, w),
            "orr" => {
                let in_ty = self.src_port_type(defn, "I")?;
                let zero = self.make_constant(cx, in_ty, Some(ConstValue::Bits(0)))?;
                cx.builder.emit(Operation::new(
                    OpKind::CombICmp { predicate: "ne" },
                    vec![w.operands[0].clone(), zero],
                    w.results,
                ));
                Ok(())
            }
            "andr" => {
                let in_ty = self.src_port_type(defn, "I")?;
                let ones = self.make_constant(cx, in_ty, Some(ConstValue::Bits(-1)))?;
                cx.builder.emit(Operation::new(
                    OpKind::CombICmp { predicate: "eq" },
                    vec![w.operands[0].clone(), ones],
                    w.results,
                ));
                Ok(())
            }
            "xorr" => {
                cx.builder.emit(Operation::new(
                    OpKind::CombParity,
                    vec![w.operands[0].clone()],
                    w.results,
                ));
                Ok(())
            }
            "wire" | "wrap" => self.visit_wire(cx, inst_id, inst, w),
            "term" => Ok(()),
            name => match comb_base_op(name) {
                Some(op) => {
                    cx.builder.emit(Operation::new(
                        OpKind::CombBase { op },
                        w.operands,
                        w.results,
                    ));
                    Ok(())
                }
                None => Err(CompileError::UnsupportedPrimitive {
                    lib: prim.lib.clone(),
                    name: prim.name.clone(),
                }),
            },
        }
    }

    /// `sv.wire` + `sv.assign` + `sv.read_inout`, with an inner symbol so
    /// the wire can be referenced from outside the module.
    fn visit_wire(
        &mut self,
        cx: &mut ModuleCx,
        inst_id: InstId,
        inst: &Instance,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let inner = w.operands[0].ty.clone();
        let wire = MlirValue::anon(cx.values.fresh(), MlirType::inout(inner));
        let sym = self.symbol_for(SymKey::Wire(inst_id), &format!("{}.{}", cx.name, inst.name))?;
        cx.builder.emit(Operation::new(
            OpKind::SvWire {
                name: Some(inst.name.clone()),
                sym: Some(sym),
            },
            vec![],
            vec![wire.clone()],
        ));
        cx.builder.emit(Operation::new(
            OpKind::SvAssign,
            vec![wire.clone(), w.operands[0].clone()],
            vec![],
        ));
        cx.builder
            .emit(Operation::new(OpKind::SvReadInOut, vec![wire], w.results));
        Ok(())
    }

    fn config_init(
        &self,
        prim: &PrimitiveInfo,
        ty: TypeId,
    ) -> Result<Option<ConstValue>, CompileError> {
        match prim.config.get("init") {
            None => Ok(None),
            Some(ConfigValue::Bool(b)) => Ok(Some(ConstValue::Bit(*b))),
            Some(ConfigValue::Int(n)) => match self.netlist.types.get(ty) {
                HwType::Digital(_) => Ok(Some(ConstValue::Bit(*n != 0))),
                _ => Ok(Some(ConstValue::Bits(*n))),
            },
            Some(other) => Err(CompileError::InvalidGraph(format!(
                "register init from {other:?}"
            ))),
        }
    }

    fn visit_coreir_reg(
        &mut self,
        cx: &mut ModuleCx,
        inst: &Instance,
        defn: &Definition,
        prim: &PrimitiveInfo,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let out_ty = self.src_port_type(defn, "O")?;
        let data = w.operands[0].clone();
        let clk = w.operands[1].clone();
        let reset = if prim.name == "reg_arst" {
            let edge = match prim.config.get("arst_posedge") {
                Some(ConfigValue::Bool(false)) => ClockEdge::Neg,
                _ => ClockEdge::Pos,
            };
            Some((w.operands[2].clone(), ResetStyle::Async, edge))
        } else {
            None
        };
        let init = self.config_init(prim, out_ty)?;
        self.emit_register(cx, &inst.name, out_ty, data, clk, None, reset, init, w.results)
    }

    fn visit_magma_register(
        &mut self,
        cx: &mut ModuleCx,
        inst: &Instance,
        defn: &Definition,
        prim: &PrimitiveInfo,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let out_ty = self.src_port_type(defn, "O")?;
        let has_enable = defn.ports.contains_key("CE");
        let reset_kind = defn.ports.values().find_map(|&pv| {
            match self.netlist.types.get(self.netlist.value(pv).ty) {
                HwType::Digital(DigitalKind::Reset(kind)) => Some(*kind),
                _ => None,
            }
        });
        let data = w.operands[0].clone();
        let (enable, clk_index) = if has_enable {
            (Some(w.operands[1].clone()), 2)
        } else {
            (None, 1)
        };
        let clk = w.operands[clk_index].clone();
        let reset = match reset_kind {
            Some(kind) => {
                let (style, edge) = decode_reset(kind);
                let signal = w.operands.last().cloned().ok_or_else(|| {
                    CompileError::InvalidGraph(format!(
                        "register '{}' has a reset type but no reset operand",
                        inst.name
                    ))
                })?;
                Some((signal, style, edge))
            }
            None => None,
        };
        let init = self.config_init(prim, out_ty)?;
        self.emit_register(cx, &inst.name, out_ty, data, clk, enable, reset, init, w.results)
    }

    /// Shared register scaffolding: `sv.reg`, clocked `sv.alwaysff` with
    /// optional enable guard and reset block, `sv.initial` preload, and the
    /// `sv.read_inout` producing the register's output value.
    #[allow(clippy::too_many_arguments)]
    fn emit_register(
        &mut self,
        cx: &mut ModuleCx,
        name: &str,
        out_ty: TypeId,
        data: MlirValue,
        clk: MlirValue,
        enable: Option<MlirValue>,
        reset: Option<(MlirValue, ResetStyle, ClockEdge)>,
        init: Option<ConstValue>,
        results: Vec<MlirValue>,
    ) -> Result<(), CompileError> {
        let lowered = self.lower(out_ty)?;
        let reg = MlirValue::anon(cx.values.fresh(), MlirType::inout(lowered));
        cx.builder.emit(Operation::new(
            OpKind::SvReg {
                name: name.to_string(),
            },
            vec![],
            vec![reg.clone()],
        ));
        let init_const = self.make_constant(cx, out_ty, init)?;

        let (body, ()) = cx.builder.scoped(|b| {
            let passign = Operation::new(
                OpKind::SvPAssign,
                vec![reg.clone(), data.clone()],
                vec![],
            );
            match &enable {
                Some(en) => {
                    b.push_block();
                    b.emit(passign);
                    let guarded = b.pop_block();
                    b.emit(Operation::new(
                        OpKind::SvIf {
                            body: guarded,
                            else_body: None,
                        },
                        vec![en.clone()],
                        vec![],
                    ));
                }
                None => b.emit(passign),
            }
            Ok::<_, CompileError>(())
        })?;

        let mut operands = vec![clk];
        let reset_tail = match reset {
            Some((signal, style, edge)) => {
                operands.push(signal);
                let (reset_body, ()) = cx.builder.scoped(|b| {
                    b.emit(Operation::new(
                        OpKind::SvPAssign,
                        vec![reg.clone(), init_const.clone()],
                        vec![],
                    ));
                    Ok::<_, CompileError>(())
                })?;
                Some(AlwaysFFReset {
                    style,
                    edge,
                    body: reset_body,
                })
            }
            None => None,
        };
        cx.builder.emit(Operation::new(
            OpKind::SvAlwaysFF {
                clock_edge: ClockEdge::Pos,
                body,
                reset: reset_tail,
            },
            operands,
            vec![],
        ));

        let (initial_body, ()) = cx.builder.scoped(|b| {
            b.emit(Operation::new(
                OpKind::SvBPAssign,
                vec![reg.clone(), init_const.clone()],
                vec![],
            ));
            Ok::<_, CompileError>(())
        })?;
        cx.builder.emit(Operation::new(
            OpKind::SvInitial { body: initial_body },
            vec![],
            vec![],
        ));
        cx.builder
            .emit(Operation::new(OpKind::SvReadInOut, vec![reg], results));
        Ok(())
    }

    fn visit_muxn(
        &mut self,
        cx: &mut ModuleCx,
        defn: &Definition,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let in_ty = self.src_port_type(defn, "I")?;
        let (data_ty, sel_ty) = match self.netlist.types.get(in_ty) {
            HwType::Product { fields } => {
                let get = |name: &str| {
                    fields
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, t)| *t)
                        .ok_or_else(|| {
                            CompileError::InvalidGraph(format!("muxn input missing '{name}'"))
                        })
                };
                (get("data")?, get("sel")?)
            }
            _ => {
                return Err(CompileError::InvalidGraph(
                    "muxn input is not a product".into(),
                ))
            }
        };
        let data = self.new_anon(cx, data_ty)?;
        let sel = self.new_anon(cx, sel_ty)?;
        cx.builder.emit(Operation::new(
            OpKind::HwStructExtract {
                field: "data".into(),
            },
            vec![w.operands[0].clone()],
            vec![data.clone()],
        ));
        cx.builder.emit(Operation::new(
            OpKind::HwStructExtract {
                field: "sel".into(),
            },
            vec![w.operands[0].clone()],
            vec![sel.clone()],
        ));
        cx.builder.emit(Operation::new(
            OpKind::HwArrayGet,
            vec![data, sel],
            w.results,
        ));
        Ok(())
    }

    fn visit_lutn(
        &mut self,
        cx: &mut ModuleCx,
        prim: &PrimitiveInfo,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let init = match prim.config.get("init") {
            Some(ConfigValue::Bits(bits)) => bits.clone(),
            _ => {
                return Err(CompileError::InvalidGraph(
                    "lutN without a bit-table init".into(),
                ))
            }
        };
        let bit_ty = self.netlist.types.bit();
        let mut entries = Vec::with_capacity(init.len());
        for &b in &init {
            entries.push(self.make_constant(cx, bit_ty, Some(ConstValue::Bit(b)))?);
        }
        let table = MlirValue::anon(
            cx.values.fresh(),
            MlirType::array(init.len() as u32, MlirType::Integer(1)),
        );
        cx.builder.emit(Operation::new(
            OpKind::HwArrayCreate,
            entries,
            vec![table.clone()],
        ));
        cx.builder.emit(Operation::new(
            OpKind::HwArrayGet,
            vec![table, w.operands[0].clone()],
            w.results,
        ));
        Ok(())
    }

    fn visit_magma_mux(
        &mut self,
        cx: &mut ModuleCx,
        defn: &Definition,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        let height = defn
            .ports
            .keys()
            .filter(|k| k.len() > 1 && k.starts_with('I') && k[1..].chars().all(|c| c.is_ascii_digit()))
            .count() as u32;
        if height == 0 {
            return Err(CompileError::InvalidGraph("mux with no data inputs".into()));
        }
        let elem_ty = self.src_port_type(defn, "I0")?;
        let lowered_elem = self.lower(elem_ty)?;
        let array = MlirValue::anon(cx.values.fresh(), MlirType::array(height, lowered_elem));
        let mut data = w.operands;
        let sel = data
            .pop()
            .ok_or_else(|| CompileError::InvalidGraph("mux with no select".into()))?;
        cx.builder.emit(Operation::new(
            OpKind::HwArrayCreate,
            data,
            vec![array.clone()],
        ));
        cx.builder.emit(Operation::new(
            OpKind::HwArrayGet,
            vec![array, sel],
            w.results,
        ));
        Ok(())
    }

    /// One `sv.verbatim` per template, with `{key}` references renumbered
    /// to positional `{{i}}`, longest keys first so `key1` never clobbers
    /// a prefix of `key10`.
    fn visit_inline_verilog(
        &mut self,
        cx: &mut ModuleCx,
        defn: &Definition,
        w: ModuleWrapper,
    ) -> Result<(), CompileError> {
        for iv in &defn.inline_verilog {
            let mut text = iv.template.clone();
            let mut keyed: Vec<(usize, &String)> = iv.references.iter().enumerate().collect();
            keyed.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
            for (i, key) in keyed {
                text = text.replace(&format!("{{{key}}}"), &format!("{{{{{i}}}}}"));
            }
            cx.builder.emit(Operation::new(
                OpKind::SvVerbatim { text },
                w.operands.clone(),
                vec![],
            ));
        }
        Ok(())
    }
}
