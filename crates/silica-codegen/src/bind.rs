//! Bind-module processing.
//!
//! A bound module observes its parent from the side: it is pre-compiled as
//! an independent hardware module, instantiated inside the parent with a
//! `doNotPrint` attribute and an inner symbol, and attached from outside
//! via `sv.bind @Parent::@inner`. The hidden instance's operands are the
//! parent's interface values in port order followed by the extra bind
//! arguments.

use silica_mlir::{MlirSymbol, OpKind, Operation};
use silica_netlist::{Definition, DefnId, ValueId};

use crate::error::CompileError;
use crate::graph::PortKey;
use crate::unit::{ModuleCx, SymKey, TranslationUnit};

impl TranslationUnit<'_> {
    /// Emits the hidden bind instances for `defn` and returns their inner
    /// symbols for the trailing `sv.bind` ops.
    pub(crate) fn process_binds(
        &mut self,
        cx: &mut ModuleCx,
        defn_id: DefnId,
        defn: &Definition,
    ) -> Result<Vec<MlirSymbol>, CompileError> {
        let mut syms = Vec::with_capacity(defn.bind_modules.len());
        for spec in &defn.bind_modules {
            let mut operands = Vec::new();
            for &port in defn.ports.values() {
                operands.push(self.bind_operand(cx, defn, port)?);
            }
            for &arg in &spec.args {
                operands.push(self.bind_operand(cx, defn, arg)?);
            }
            let bound_name = self.netlist.defn(spec.module).name.clone();
            let inst_name = format!("{bound_name}_inst");
            let sym = self.symbol_for(
                SymKey::Bind(defn_id, spec.module),
                &format!("{}.{inst_name}", defn.name),
            )?;
            let module_sym = self
                .modules
                .get(&spec.module)
                .map(|h| h.sym.clone())
                .ok_or_else(|| {
                    CompileError::InvalidGraph(format!(
                        "bound module '{bound_name}' was not pre-compiled"
                    ))
                })?;
            cx.builder.emit(Operation::new(
                OpKind::HwInstance {
                    name: inst_name,
                    module: module_sym,
                    sym: Some(sym.clone()),
                    do_not_print: true,
                },
                operands,
                vec![],
            ));
            syms.push(sym);
        }
        Ok(syms)
    }

    fn bind_operand(
        &self,
        cx: &ModuleCx,
        defn: &Definition,
        value: ValueId,
    ) -> Result<silica_mlir::MlirValue, CompileError> {
        cx.value_map
            .get(&PortKey::Source(value))
            .cloned()
            .ok_or_else(|| {
                CompileError::InvalidGraph(format!(
                    "bind in '{}' references an unmapped value",
                    defn.name
                ))
            })
    }
}
