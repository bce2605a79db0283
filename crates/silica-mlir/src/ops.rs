//! Typed operation records and block containers.
//!
//! Each op kind used by the compiler is one [`OpKind`] variant carrying its
//! kind-specific attributes; operand and result value lists live on the
//! wrapping [`Operation`]. Region-bearing kinds (`sv.alwaysff`,
//! `sv.initial`, `sv.if`, `sv.ifdef`, `hw.module`) own their child
//! [`Block`]s inside the variant.
//!
//! The generic accessors at the bottom (`for_each_operand`,
//! `for_each_result`, `replace_operand`) see through child blocks, so a
//! region op consumes and produces everything its nested ops do. Rewrite
//! passes rely on that.

use smallvec::SmallVec;

use crate::value::{MlirSymbol, MlirValue};

pub type OperandList = SmallVec<[MlirValue; 2]>;
pub type ResultList = SmallVec<[MlirValue; 1]>;

/// An ordered list of operations.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub ops: Vec<Operation>,
}

/// Clock or reset sensitivity edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEdge {
    Pos,
    Neg,
}

impl ClockEdge {
    pub fn as_str(self) -> &'static str {
        match self {
            ClockEdge::Pos => "posedge",
            ClockEdge::Neg => "negedge",
        }
    }
}

/// Synchronous vs asynchronous reset on an `sv.alwaysff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStyle {
    Sync,
    Async,
}

impl ResetStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ResetStyle::Sync => "syncreset",
            ResetStyle::Async => "asyncreset",
        }
    }
}

/// The reset tail of an `sv.alwaysff`: style, edge, and the reset block.
/// The reset signal itself is the op's second operand.
#[derive(Debug, Clone)]
pub struct AlwaysFFReset {
    pub style: ResetStyle,
    pub edge: ClockEdge,
    pub body: Block,
}

/// One op kind per concrete operation the compiler emits.
#[derive(Debug, Clone)]
pub enum OpKind {
    // -- hw dialect --------------------------------------------------------
    /// `%r = hw.constant V : T`.
    HwConstant { value: i64 },
    /// `%r = hw.array_create %a, ... : T_elem` (operands MSB first).
    HwArrayCreate,
    /// `%r = hw.array_concat %a, %b : Ta, Tb`.
    HwArrayConcat,
    /// `%r = hw.array_get %arr[%idx] : T_arr`.
    HwArrayGet,
    /// `%r = hw.struct_extract %s["field"] : T_struct`.
    HwStructExtract { field: String },
    /// `%r = hw.struct_create (%a, ...) : T_struct`.
    HwStructCreate,
    /// `hw.instance "name" @Module(...)`, optionally with an inner symbol
    /// and a `doNotPrint` attribute (bind instances).
    HwInstance {
        name: String,
        module: MlirSymbol,
        sym: Option<MlirSymbol>,
        do_not_print: bool,
    },
    /// `hw.output %v, ... : T, ...` — the module terminator.
    HwOutput,
    /// A full hardware module with its body region.
    HwModule {
        sym: MlirSymbol,
        inputs: Vec<MlirValue>,
        outputs: Vec<MlirValue>,
        body: Block,
    },
    /// An external module: signature only.
    HwModuleExtern {
        sym: MlirSymbol,
        inputs: Vec<MlirValue>,
        outputs: Vec<MlirValue>,
    },

    // -- comb dialect ------------------------------------------------------
    /// `%r = comb.<op> %a, %b : T` for the variadic/binary operator set.
    CombBase { op: &'static str },
    /// `%r = comb.icmp <pred> %a, %b : T_in`.
    CombICmp { predicate: &'static str },
    /// `%r = comb.extract %a from LO : (T_in) -> T_out`.
    CombExtract { lo: u32 },
    /// `%r = comb.concat %a, ... : (T, ...) -> T_out` (operands MSB first).
    CombConcat,
    /// `%r = comb.parity %a : T_in`.
    CombParity,

    // -- sv dialect --------------------------------------------------------
    /// `%r = sv.reg {name = "n"} : !hw.inout<T>`.
    SvReg { name: String },
    /// `%r = sv.read_inout %w : !hw.inout<T>`.
    SvReadInOut,
    /// `sv.assign %w, %v : T` (continuous).
    SvAssign,
    /// `sv.passign %w, %v : T` (procedural, non-blocking).
    SvPAssign,
    /// `sv.bpassign %w, %v : T` (procedural, blocking).
    SvBPAssign,
    /// `sv.alwaysff(<edge> %clk) { ... }` with an optional reset tail.
    SvAlwaysFF {
        clock_edge: ClockEdge,
        body: Block,
        reset: Option<AlwaysFFReset>,
    },
    /// `sv.initial { ... }`.
    SvInitial { body: Block },
    /// `sv.if %c { ... }` with an optional else block.
    SvIf {
        body: Block,
        else_body: Option<Block>,
    },
    /// `sv.ifdef "COND" { ... }` with an optional else block.
    SvIfDef {
        cond: String,
        body: Block,
        else_body: Option<Block>,
    },
    /// `%w = sv.wire {name="n"} : !hw.inout<T>`; name and symbol optional.
    SvWire {
        name: Option<String>,
        sym: Option<MlirSymbol>,
    },
    /// `sv.verbatim "..." (%ops) : T, ...`.
    SvVerbatim { text: String },
    /// `sv.bind @Parent::@inner`.
    SvBind { module: MlirSymbol, inner: MlirSymbol },
}

/// An operation: kind plus operand and result value lists.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OpKind,
    pub operands: OperandList,
    pub results: ResultList,
}

impl Operation {
    pub fn new(kind: OpKind, operands: Vec<MlirValue>, results: Vec<MlirValue>) -> Self {
        Operation {
            kind,
            operands: operands.into_iter().collect(),
            results: results.into_iter().collect(),
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, OpKind::HwOutput)
    }

    /// Child blocks of region-bearing sv ops. Hardware modules are handled
    /// separately; they never appear inside another module's body.
    pub fn child_blocks(&self) -> Vec<&Block> {
        match &self.kind {
            OpKind::SvAlwaysFF { body, reset, .. } => {
                let mut blocks = vec![body];
                if let Some(r) = reset {
                    blocks.push(&r.body);
                }
                blocks
            }
            OpKind::SvInitial { body } => vec![body],
            OpKind::SvIf { body, else_body } | OpKind::SvIfDef { body, else_body, .. } => {
                let mut blocks = vec![body];
                if let Some(e) = else_body {
                    blocks.push(e);
                }
                blocks
            }
            _ => Vec::new(),
        }
    }

    pub fn child_blocks_mut(&mut self) -> Vec<&mut Block> {
        match &mut self.kind {
            OpKind::SvAlwaysFF { body, reset, .. } => {
                let mut blocks = vec![body];
                if let Some(r) = reset {
                    blocks.push(&mut r.body);
                }
                blocks
            }
            OpKind::SvInitial { body } => vec![body],
            OpKind::SvIf { body, else_body } | OpKind::SvIfDef { body, else_body, .. } => {
                let mut blocks = vec![body];
                if let Some(e) = else_body {
                    blocks.push(e);
                }
                blocks
            }
            _ => Vec::new(),
        }
    }

    /// Visits every operand, including operands of nested ops.
    pub fn for_each_operand(&self, f: &mut dyn FnMut(&MlirValue)) {
        for v in &self.operands {
            f(v);
        }
        for block in self.child_blocks() {
            for op in &block.ops {
                op.for_each_operand(f);
            }
        }
    }

    /// Visits every result, including results of nested ops.
    pub fn for_each_result(&self, f: &mut dyn FnMut(&MlirValue)) {
        for v in &self.results {
            f(v);
        }
        for block in self.child_blocks() {
            for op in &block.ops {
                op.for_each_result(f);
            }
        }
    }

    /// Replaces every operand named `from` (including nested occurrences)
    /// with `to`.
    pub fn replace_operand(&mut self, from: &str, to: &MlirValue) {
        for v in self.operands.iter_mut() {
            if v.name == from {
                *v = to.clone();
            }
        }
        for block in self.child_blocks_mut() {
            for op in block.ops.iter_mut() {
                op.replace_operand(from, to);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MlirType;

    fn val(name: &str) -> MlirValue {
        MlirValue::anon(name, MlirType::Integer(8))
    }

    #[test]
    fn nested_operands_are_visible() {
        let passign = Operation::new(
            OpKind::SvPAssign,
            vec![val("reg"), val("data")],
            vec![],
        );
        let always = Operation::new(
            OpKind::SvAlwaysFF {
                clock_edge: ClockEdge::Pos,
                body: Block { ops: vec![passign] },
                reset: None,
            },
            vec![val("clk")],
            vec![],
        );
        let mut seen = Vec::new();
        always.for_each_operand(&mut |v| seen.push(v.name.clone()));
        assert_eq!(seen, vec!["clk", "reg", "data"]);
    }

    #[test]
    fn replace_operand_reaches_nested_ops() {
        let passign = Operation::new(OpKind::SvPAssign, vec![val("reg"), val("data")], vec![]);
        let mut always = Operation::new(
            OpKind::SvAlwaysFF {
                clock_edge: ClockEdge::Pos,
                body: Block { ops: vec![passign] },
                reset: None,
            },
            vec![val("clk")],
            vec![],
        );
        let replacement = val("broken");
        always.replace_operand("data", &replacement);
        let mut seen = Vec::new();
        always.for_each_operand(&mut |v| seen.push(v.name.clone()));
        assert_eq!(seen, vec!["clk", "reg", "broken"]);
    }

    #[test]
    fn nested_results_are_visible() {
        let inst = Operation::new(
            OpKind::HwInstance {
                name: "u0".into(),
                module: MlirSymbol("M".into()),
                sym: None,
                do_not_print: false,
            },
            vec![val("a")],
            vec![val("out")],
        );
        let guarded = Operation::new(
            OpKind::SvIfDef {
                cond: "SYNTH".into(),
                body: Block { ops: vec![inst] },
                else_body: None,
            },
            vec![],
            vec![],
        );
        let mut seen = Vec::new();
        guarded.for_each_result(&mut |v| seen.push(v.name.clone()));
        assert_eq!(seen, vec!["out"]);
    }
}
