//! Translation-unit orchestration.
//!
//! [`TranslationUnit`] owns the process-scope state of one compilation: the
//! symbol table, the table of compiled hardware modules, the lowered-type
//! cache, and the top-level op list. Definitions are discovered top-down
//! from the entry definition and compiled dependencies-first, ties broken
//! by discovery order, so every `hw.instance` refers to an already-emitted
//! module.
//!
//! Per-module state ([`ModuleCx`]) is the value map from port identities to
//! MLIR values, the module-scoped name generator, the constant cache, and
//! the block-stack builder.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;

use silica_mlir::{
    MlirSymbol, MlirType, MlirValue, OpBuilder, OpKind, Operation, ScopedNameGenerator,
};
use silica_netlist::{DefnId, Direction, InstId, Netlist, TypeId};

use crate::cycles::break_cycles;
use crate::error::CompileError;
use crate::graph::{build_graph, GraphNode, PortKey};
use crate::iface::{collect_leaves, sanitize, Leaf};
use crate::lower::lower_type;
use crate::visitor::ConstValue;
use crate::CompileToMlirOpts;

/// Keys of the translation-unit symbol map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SymKey {
    /// A compiled module's output symbol.
    Defn(DefnId),
    /// The inner symbol of a bind instance inside a parent definition.
    Bind(DefnId, DefnId),
    /// The inner symbol of a named wire instance.
    Wire(InstId),
}

/// A compiled (or declared-extern) hardware module.
#[derive(Debug, Clone)]
pub(crate) struct ModuleHandle {
    pub sym: MlirSymbol,
}

/// Per-module compile state.
pub(crate) struct ModuleCx {
    pub name: String,
    pub values: ScopedNameGenerator,
    pub value_map: HashMap<PortKey, MlirValue>,
    pub consts: HashMap<(TypeId, Option<ConstValue>), MlirValue>,
    pub builder: OpBuilder,
    pub visited: HashSet<NodeIndex>,
}

impl ModuleCx {
    fn new(name: String) -> Self {
        ModuleCx {
            name,
            values: ScopedNameGenerator::new(),
            value_map: HashMap::new(),
            consts: HashMap::new(),
            builder: OpBuilder::new(),
            visited: HashSet::new(),
        }
    }
}

/// One compilation of a netlist into top-level MLIR ops.
pub struct TranslationUnit<'n> {
    pub(crate) netlist: &'n mut Netlist,
    pub(crate) opts: CompileToMlirOpts,
    sym_names: ScopedNameGenerator,
    symbols: HashMap<SymKey, MlirSymbol>,
    pub(crate) modules: HashMap<DefnId, ModuleHandle>,
    top: Vec<Operation>,
    type_cache: HashMap<TypeId, MlirType>,
}

impl<'n> TranslationUnit<'n> {
    pub fn new(netlist: &'n mut Netlist, opts: CompileToMlirOpts) -> Self {
        TranslationUnit {
            netlist,
            opts,
            sym_names: ScopedNameGenerator::new(),
            symbols: HashMap::new(),
            modules: HashMap::new(),
            top: Vec::new(),
            type_cache: HashMap::new(),
        }
    }

    /// Compiles the entry definition and everything it depends on.
    pub fn compile(&mut self, top: DefnId) -> Result<(), CompileError> {
        self.compile_defn(top)
    }

    /// The finished top-level op list, in emission (dependency) order.
    pub fn into_ops(self) -> Vec<Operation> {
        self.top
    }

    pub(crate) fn lower(&mut self, id: TypeId) -> Result<MlirType, CompileError> {
        lower_type(&self.netlist.types, &mut self.type_cache, id)
    }

    /// Primitives and inline-verilog carriers are lowered at their
    /// instantiation sites and never become modules of their own.
    pub(crate) fn treat_as_primitive(&self, defn: DefnId) -> bool {
        let d = self.netlist.defn(defn);
        d.is_primitive() || !d.inline_verilog.is_empty()
    }

    fn treat_as_definition(&self, defn: DefnId) -> bool {
        let d = self.netlist.defn(defn);
        !d.declared_only && !d.external_verilog
    }

    pub(crate) fn symbol_for(
        &mut self,
        key: SymKey,
        name: &str,
    ) -> Result<MlirSymbol, CompileError> {
        if let Some(sym) = self.symbols.get(&key) {
            return Ok(sym.clone());
        }
        let reserved = self.sym_names.reserve(name)?;
        let sym = MlirSymbol(reserved);
        self.symbols.insert(key, sym.clone());
        Ok(sym)
    }

    pub(crate) fn compile_defn(&mut self, defn: DefnId) -> Result<(), CompileError> {
        if self.modules.contains_key(&defn) || self.treat_as_primitive(defn) {
            return Ok(());
        }
        let children: Vec<DefnId> = self
            .netlist
            .defn(defn)
            .instances
            .iter()
            .map(|&i| self.netlist.inst(i).defn)
            .collect();
        for child in children {
            if !self.treat_as_primitive(child) {
                self.compile_defn(child)?;
            }
        }
        self.compile_module(defn)
    }

    fn compile_module(&mut self, defn: DefnId) -> Result<(), CompileError> {
        let defn_data = self.netlist.defn(defn).clone();
        let sym = self.symbol_for(SymKey::Defn(defn), defn_data.output_name())?;
        let flatten = self.opts.flatten_all_tuples;

        // Interface leaves. Stored directions are the inside perspective:
        // leaves that drive the body (declared inputs) become the hardware
        // module's operands, driven leaves its results.
        let mut driving: Vec<Leaf> = Vec::new();
        let mut driven: Vec<Leaf> = Vec::new();
        for (pname, &pv) in &defn_data.ports {
            let mut leaves = Vec::new();
            collect_leaves(self.netlist, pv, pname, flatten, &mut leaves)?;
            for leaf in leaves {
                match leaf.dir {
                    Direction::Output => driving.push(leaf),
                    Direction::Input => driven.push(leaf),
                    _ => {}
                }
            }
        }

        if !self.treat_as_definition(defn) {
            let mut inputs = Vec::with_capacity(driving.len());
            for leaf in &driving {
                let ty = self.lower(self.netlist.value(leaf.value).ty)?;
                inputs.push(MlirValue::named(sanitize(&leaf.name), ty));
            }
            let mut outputs = Vec::with_capacity(driven.len());
            for leaf in &driven {
                let ty = self.lower(self.netlist.value(leaf.value).ty)?;
                outputs.push(MlirValue::named(sanitize(&leaf.name), ty));
            }
            self.top.push(Operation::new(
                OpKind::HwModuleExtern {
                    sym: sym.clone(),
                    inputs,
                    outputs,
                },
                vec![],
                vec![],
            ));
            self.modules.insert(defn, ModuleHandle { sym });
            return Ok(());
        }

        // Bound modules compile first, as independent hardware modules.
        for spec in &defn_data.bind_modules {
            self.compile_defn(spec.module)?;
        }

        let mut cx = ModuleCx::new(defn_data.name.clone());
        let mut inputs = Vec::with_capacity(driving.len());
        for leaf in &driving {
            let ty = self.lower(self.netlist.value(leaf.value).ty)?;
            let name = cx.values.reserve(&sanitize(&leaf.name))?;
            let value = MlirValue::named(name, ty);
            cx.value_map
                .insert(PortKey::Source(leaf.value), value.clone());
            inputs.push(value);
        }
        let mut outputs = Vec::with_capacity(driven.len());
        for leaf in &driven {
            let ty = self.lower(self.netlist.value(leaf.value).ty)?;
            let name = cx.values.reserve(&sanitize(&leaf.name))?;
            outputs.push(MlirValue::named(name, ty));
        }

        let graph = build_graph(self.netlist, defn, flatten)?;
        let root = graph
            .index_of(GraphNode::Defn(defn))
            .ok_or_else(|| CompileError::InvalidGraph("missing root definition node".into()))?;
        self.visit(&mut cx, &graph, root)?;

        let bind_syms = self.process_binds(&mut cx, defn, &defn_data)?;

        let mut out_values = Vec::with_capacity(driven.len());
        for leaf in &driven {
            out_values.push(self.mapped_or_new(&mut cx, &graph, &PortKey::Source(leaf.value))?);
        }
        if !outputs.is_empty() {
            cx.builder
                .emit(Operation::new(OpKind::HwOutput, out_values, vec![]));
        }

        let mut body = cx.builder.finish();
        break_cycles(&mut body, &mut cx.values, &defn_data.name)?;

        self.top.push(Operation::new(
            OpKind::HwModule {
                sym: sym.clone(),
                inputs,
                outputs,
                body,
            },
            vec![],
            vec![],
        ));
        self.modules.insert(defn, ModuleHandle { sym: sym.clone() });

        for inner in bind_syms {
            self.top.push(Operation::new(
                OpKind::SvBind {
                    module: sym.clone(),
                    inner,
                },
                vec![],
                vec![],
            ));
        }
        Ok(())
    }
}
