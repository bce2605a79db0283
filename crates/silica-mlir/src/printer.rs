//! The indenting printer and the textual form of every op.
//!
//! The printer is a line-oriented sink with a push/pop indentation stack.
//! Single-line ops render through [`Operation::print`]; region-bearing ops
//! open a brace, recurse into their blocks, and close.

use std::io::{self, Write};

use crate::ops::{Block, OpKind, Operation};
use crate::value::MlirValue;

/// Line-oriented sink with an indentation stack.
pub struct Printer<'w> {
    out: &'w mut dyn Write,
    indent: usize,
    buf: String,
}

impl<'w> Printer<'w> {
    pub fn new(out: &'w mut dyn Write) -> Self {
        Printer {
            out,
            indent: 0,
            buf: String::new(),
        }
    }

    /// Appends to the current line.
    pub fn print(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// Terminates the current line, writing indentation first.
    pub fn flush_line(&mut self) -> io::Result<()> {
        for _ in 0..self.indent {
            self.out.write_all(b"  ")?;
        }
        self.out.write_all(self.buf.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.buf.clear();
        Ok(())
    }

    pub fn print_line(&mut self, s: &str) -> io::Result<()> {
        self.print(s);
        self.flush_line()
    }

    pub fn push(&mut self) {
        self.indent += 1;
    }

    pub fn pop(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }
}

fn names(values: &[MlirValue]) -> String {
    values
        .iter()
        .map(MlirValue::reference)
        .collect::<Vec<_>>()
        .join(", ")
}

fn types(values: &[MlirValue]) -> String {
    values
        .iter()
        .map(|v| v.ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `%name: type` pairs for module input signatures.
fn input_signature(values: &[MlirValue]) -> String {
    values
        .iter()
        .map(|v| format!("{}: {}", v.reference(), v.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `name: type` pairs for module result signatures.
fn output_signature(values: &[MlirValue]) -> String {
    values
        .iter()
        .map(|v| format!("{}: {}", v.name, v.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

impl Block {
    pub fn print(&self, p: &mut Printer) -> io::Result<()> {
        for op in &self.ops {
            op.print(p)?;
        }
        Ok(())
    }
}

impl Operation {
    /// The single-line form, or `None` for region-bearing ops.
    fn line(&self) -> Option<String> {
        let o = &self.operands;
        let r = &self.results;
        let line = match &self.kind {
            OpKind::HwConstant { value } => {
                format!("{} = hw.constant {} : {}", r[0].reference(), value, r[0].ty)
            }
            OpKind::HwArrayCreate => format!(
                "{} = hw.array_create {} : {}",
                r[0].reference(),
                names(o),
                o[0].ty
            ),
            OpKind::HwArrayConcat => format!(
                "{} = hw.array_concat {} : {}",
                r[0].reference(),
                names(o),
                types(o)
            ),
            OpKind::HwArrayGet => format!(
                "{} = hw.array_get {}[{}] : {}",
                r[0].reference(),
                o[0].reference(),
                o[1].reference(),
                o[0].ty
            ),
            OpKind::HwStructExtract { field } => format!(
                "{} = hw.struct_extract {}[\"{}\"] : {}",
                r[0].reference(),
                o[0].reference(),
                field,
                o[0].ty
            ),
            OpKind::HwStructCreate => format!(
                "{} = hw.struct_create ({}) : {}",
                r[0].reference(),
                names(o),
                r[0].ty
            ),
            OpKind::HwInstance {
                name,
                module,
                sym,
                do_not_print,
            } => {
                let prefix = if r.is_empty() {
                    String::new()
                } else {
                    format!("{} = ", names(r))
                };
                let sym_part = match sym {
                    Some(s) => format!("sym {} ", s.reference()),
                    None => String::new(),
                };
                let attr = if *do_not_print { " {doNotPrint = 1}" } else { "" };
                format!(
                    "{}hw.instance \"{}\" {}{}({}){} : ({}) -> ({})",
                    prefix,
                    name,
                    sym_part,
                    module.reference(),
                    names(o),
                    attr,
                    types(o),
                    types(r)
                )
            }
            OpKind::HwOutput => format!("hw.output {} : {}", names(o), types(o)),
            OpKind::HwModuleExtern {
                sym,
                inputs,
                outputs,
            } => {
                let mut line = format!(
                    "hw.module.extern {}({})",
                    sym.reference(),
                    input_signature(inputs)
                );
                if !outputs.is_empty() {
                    line.push_str(&format!(" -> ({})", output_signature(outputs)));
                }
                line
            }
            OpKind::CombBase { op } => format!(
                "{} = comb.{} {} : {}",
                r[0].reference(),
                op,
                names(o),
                r[0].ty
            ),
            OpKind::CombICmp { predicate } => format!(
                "{} = comb.icmp {} {} : {}",
                r[0].reference(),
                predicate,
                names(o),
                o[0].ty
            ),
            OpKind::CombExtract { lo } => format!(
                "{} = comb.extract {} from {} : ({}) -> {}",
                r[0].reference(),
                o[0].reference(),
                lo,
                o[0].ty,
                r[0].ty
            ),
            OpKind::CombConcat => format!(
                "{} = comb.concat {} : ({}) -> {}",
                r[0].reference(),
                names(o),
                types(o),
                r[0].ty
            ),
            OpKind::CombParity => format!(
                "{} = comb.parity {} : {}",
                r[0].reference(),
                o[0].reference(),
                o[0].ty
            ),
            OpKind::SvReg { name } => format!(
                "{} = sv.reg {{name = \"{}\"}} : {}",
                r[0].reference(),
                name,
                r[0].ty
            ),
            OpKind::SvReadInOut => format!(
                "{} = sv.read_inout {} : {}",
                r[0].reference(),
                o[0].reference(),
                o[0].ty
            ),
            OpKind::SvAssign => format!(
                "sv.assign {}, {} : {}",
                o[0].reference(),
                o[1].reference(),
                o[1].ty
            ),
            OpKind::SvPAssign => format!(
                "sv.passign {}, {} : {}",
                o[0].reference(),
                o[1].reference(),
                o[1].ty
            ),
            OpKind::SvBPAssign => format!(
                "sv.bpassign {}, {} : {}",
                o[0].reference(),
                o[1].reference(),
                o[1].ty
            ),
            OpKind::SvWire { name, sym } => {
                let mut line = format!("{} = sv.wire ", r[0].reference());
                if let Some(s) = sym {
                    line.push_str(&format!("sym {} ", s.reference()));
                }
                if let Some(n) = name {
                    line.push_str(&format!("{{name=\"{}\"}} ", n));
                }
                line.push_str(&format!(": {}", r[0].ty));
                line
            }
            OpKind::SvVerbatim { text } => {
                let mut line = format!("sv.verbatim \"{}\"", escape(text));
                if !o.is_empty() {
                    line.push_str(&format!(" ({}) : {}", names(o), types(o)));
                }
                line
            }
            OpKind::SvBind { module, inner } => {
                format!("sv.bind {}::{}", module.reference(), inner.reference())
            }
            OpKind::HwModule { .. }
            | OpKind::SvAlwaysFF { .. }
            | OpKind::SvInitial { .. }
            | OpKind::SvIf { .. }
            | OpKind::SvIfDef { .. } => return None,
        };
        Some(line)
    }

    pub fn print(&self, p: &mut Printer) -> io::Result<()> {
        if let Some(line) = self.line() {
            return p.print_line(&line);
        }
        match &self.kind {
            OpKind::HwModule {
                sym,
                inputs,
                outputs,
                body,
            } => {
                p.print(&format!(
                    "hw.module {}({})",
                    sym.reference(),
                    input_signature(inputs)
                ));
                if !outputs.is_empty() {
                    p.print(&format!(" -> ({})", output_signature(outputs)));
                }
                p.print(" {");
                p.flush_line()?;
                p.push();
                body.print(p)?;
                p.pop();
                p.print_line("}")
            }
            OpKind::SvAlwaysFF {
                clock_edge,
                body,
                reset,
            } => {
                p.print(&format!(
                    "sv.alwaysff({} {}) {{",
                    clock_edge.as_str(),
                    self.operands[0].reference()
                ));
                p.flush_line()?;
                p.push();
                body.print(p)?;
                p.pop();
                p.print("}");
                match reset {
                    None => p.flush_line(),
                    Some(r) => {
                        p.print(&format!(
                            " ({} : {} {}) {{",
                            r.style.as_str(),
                            r.edge.as_str(),
                            self.operands[1].reference()
                        ));
                        p.flush_line()?;
                        p.push();
                        r.body.print(p)?;
                        p.pop();
                        p.print_line("}")
                    }
                }
            }
            OpKind::SvInitial { body } => {
                p.print("sv.initial {");
                p.flush_line()?;
                p.push();
                body.print(p)?;
                p.pop();
                p.print_line("}")
            }
            OpKind::SvIf { body, else_body } => {
                p.print(&format!("sv.if {} {{", self.operands[0].reference()));
                p.flush_line()?;
                p.push();
                body.print(p)?;
                p.pop();
                p.print("}");
                match else_body {
                    None => p.flush_line(),
                    Some(e) => {
                        p.print(" else {");
                        p.flush_line()?;
                        p.push();
                        e.print(p)?;
                        p.pop();
                        p.print_line("}")
                    }
                }
            }
            OpKind::SvIfDef {
                cond,
                body,
                else_body,
            } => {
                p.print(&format!("sv.ifdef \"{cond}\" {{"));
                p.flush_line()?;
                p.push();
                body.print(p)?;
                p.pop();
                p.print("}");
                match else_body {
                    None => p.flush_line(),
                    Some(e) => {
                        p.print(" else {");
                        p.flush_line()?;
                        p.push();
                        e.print(p)?;
                        p.pop();
                        p.print_line("}")
                    }
                }
            }
            _ => unreachable!("single-line op handled above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{AlwaysFFReset, ClockEdge, ResetStyle};
    use crate::types::MlirType;
    use crate::value::{MlirSymbol, MlirValue};

    fn render(op: &Operation) -> String {
        let mut out = Vec::new();
        let mut p = Printer::new(&mut out);
        op.print(&mut p).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn v(name: &str, ty: MlirType) -> MlirValue {
        MlirValue::anon(name, ty)
    }

    #[test]
    fn constant_line() {
        let op = Operation::new(
            OpKind::HwConstant { value: -1 },
            vec![],
            vec![v("0", MlirType::Integer(16))],
        );
        assert_eq!(render(&op), "%0 = hw.constant -1 : i16\n");
    }

    #[test]
    fn icmp_uses_operand_type() {
        let op = Operation::new(
            OpKind::CombICmp { predicate: "ne" },
            vec![v("a", MlirType::Integer(8)), v("z", MlirType::Integer(8))],
            vec![v("1", MlirType::Integer(1))],
        );
        assert_eq!(render(&op), "%1 = comb.icmp ne %a, %z : i8\n");
    }

    #[test]
    fn extract_and_concat() {
        let ex = Operation::new(
            OpKind::CombExtract { lo: 8 },
            vec![v("a", MlirType::Integer(16))],
            vec![v("0", MlirType::Integer(8))],
        );
        assert_eq!(render(&ex), "%0 = comb.extract %a from 8 : (i16) -> i8\n");
        let cat = Operation::new(
            OpKind::CombConcat,
            vec![v("0", MlirType::Integer(8)), v("1", MlirType::Integer(8))],
            vec![v("2", MlirType::Integer(16))],
        );
        assert_eq!(
            render(&cat),
            "%2 = comb.concat %0, %1 : (i8, i8) -> i16\n"
        );
    }

    #[test]
    fn alwaysff_with_reset_renders_both_blocks() {
        let passign = Operation::new(
            OpKind::SvPAssign,
            vec![
                v("r", MlirType::inout(MlirType::Integer(8))),
                v("d", MlirType::Integer(8)),
            ],
            vec![],
        );
        let reset_assign = Operation::new(
            OpKind::SvPAssign,
            vec![
                v("r", MlirType::inout(MlirType::Integer(8))),
                v("init", MlirType::Integer(8)),
            ],
            vec![],
        );
        let op = Operation::new(
            OpKind::SvAlwaysFF {
                clock_edge: ClockEdge::Pos,
                body: Block { ops: vec![passign] },
                reset: Some(AlwaysFFReset {
                    style: ResetStyle::Async,
                    edge: ClockEdge::Neg,
                    body: Block {
                        ops: vec![reset_assign],
                    },
                }),
            },
            vec![v("clk", MlirType::Integer(1)), v("rst", MlirType::Integer(1))],
            vec![],
        );
        let text = render(&op);
        assert_eq!(
            text,
            "sv.alwaysff(posedge %clk) {\n  sv.passign %r, %d : i8\n} (asyncreset : negedge %rst) {\n  sv.passign %r, %init : i8\n}\n"
        );
    }

    #[test]
    fn instance_with_inner_symbol_and_attr() {
        let op = Operation::new(
            OpKind::HwInstance {
                name: "checker_inst".into(),
                module: MlirSymbol("Checker".into()),
                sym: Some(MlirSymbol("Top.checker_inst".into())),
                do_not_print: true,
            },
            vec![v("a", MlirType::Integer(4))],
            vec![],
        );
        assert_eq!(
            render(&op),
            "hw.instance \"checker_inst\" sym @Top.checker_inst @Checker(%a) {doNotPrint = 1} : (i4) -> ()\n"
        );
    }

    #[test]
    fn verbatim_escapes() {
        let op = Operation::new(
            OpKind::SvVerbatim {
                text: "assert property (@(posedge clk) {{0}} == \"x\");\n".into(),
            },
            vec![v("a", MlirType::Integer(1))],
            vec![],
        );
        assert_eq!(
            render(&op),
            "sv.verbatim \"assert property (@(posedge clk) {{0}} == \\\"x\\\");\\n\" (%a) : i1\n"
        );
    }

    #[test]
    fn module_with_body_indents() {
        let output = Operation::new(
            OpKind::HwOutput,
            vec![v("a", MlirType::Integer(1))],
            vec![],
        );
        let module = Operation::new(
            OpKind::HwModule {
                sym: MlirSymbol("M".into()),
                inputs: vec![MlirValue::named("a", MlirType::Integer(1))],
                outputs: vec![MlirValue::named("y", MlirType::Integer(1))],
                body: Block { ops: vec![output] },
            },
            vec![],
            vec![],
        );
        assert_eq!(
            render(&module),
            "hw.module @M(%a: i1) -> (y: i1) {\n  hw.output %a : i1\n}\n"
        );
    }

    #[test]
    fn extern_module_has_no_body() {
        let module = Operation::new(
            OpKind::HwModuleExtern {
                sym: MlirSymbol("Ext".into()),
                inputs: vec![MlirValue::named("a", MlirType::Integer(8))],
                outputs: vec![],
            },
            vec![],
            vec![],
        );
        assert_eq!(render(&module), "hw.module.extern @Ext(%a: i8)\n");
    }
}
