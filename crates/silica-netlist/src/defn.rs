//! Definitions, instances, and primitive metadata.
//!
//! A [`Definition`] is a source module: an ordered interface plus either a
//! body (instances and wiring, held by the netlist) or primitive/external
//! metadata. Instances clone a definition's interface with flipped
//! directions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::{PortDir, ValueId};

/// Stable identity of a definition within one netlist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DefnId(pub u32);

/// Stable identity of an instance within one netlist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct InstId(pub u32);

/// A configuration argument attached to a primitive definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigValue {
    Int(i64),
    Bool(bool),
    /// Bit table, used by LUT initializers. Index 0 is entry 0.
    Bits(Vec<bool>),
    Str(String),
}

/// Identity of a primitive operator: its library and operator name, plus
/// generator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveInfo {
    pub lib: String,
    pub name: String,
    pub config: IndexMap<String, ConfigValue>,
}

/// Preprocessor guard wrapping the instantiation of a sub-module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileGuard {
    pub kind: GuardKind,
    pub cond: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardKind {
    /// Instantiate when the symbol is defined.
    Defined,
    /// Instantiate when the symbol is undefined.
    Undefined,
}

/// A module bound to a parent for side-channel observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindSpec {
    pub module: DefnId,
    /// Extra operand values appended after the parent's interface ports.
    pub args: Vec<ValueId>,
}

/// One inline verilog template attached to a definition. `{key}` references
/// in the template are positional over `references`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineVerilog {
    pub template: String,
    pub references: Vec<String>,
}

/// A source module definition or declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    /// Interface ports in declaration order. Directions on the port values
    /// are stored from the inside perspective; see
    /// [`Direction`](crate::Direction).
    pub ports: IndexMap<String, ValueId>,
    /// Declared (outside-perspective) port directions, kept for cloning the
    /// interface onto instances.
    pub port_dirs: IndexMap<String, PortDir>,
    /// Instances in creation order.
    pub instances: Vec<InstId>,
    /// Present iff this definition is a primitive operator.
    pub primitive: Option<PrimitiveInfo>,
    /// Declaration without a body: emitted as an external module.
    pub declared_only: bool,
    /// Definition whose implementation is external verilog text: also
    /// emitted as an external module.
    pub external_verilog: bool,
    /// Overrides the emitted symbol name.
    pub verilog_name: Option<String>,
    pub bind_modules: Vec<BindSpec>,
    pub inline_verilog: Vec<InlineVerilog>,
}

impl Definition {
    pub fn new(name: &str) -> Self {
        Definition {
            name: name.to_string(),
            ports: IndexMap::new(),
            port_dirs: IndexMap::new(),
            instances: Vec::new(),
            primitive: None,
            declared_only: false,
            external_verilog: false,
            verilog_name: None,
            bind_modules: Vec::new(),
            inline_verilog: Vec::new(),
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive.is_some()
    }

    /// Name used for the emitted module symbol.
    pub fn output_name(&self) -> &str {
        self.verilog_name.as_deref().unwrap_or(&self.name)
    }
}

/// An instance of a definition inside another definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub defn: DefnId,
    pub parent: DefnId,
    /// Interface ports cloned from the definition, directions flipped to
    /// the outside perspective.
    pub ports: IndexMap<String, ValueId>,
    pub compile_guard: Option<CompileGuard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_prefers_verilog_name() {
        let mut d = Definition::new("adder");
        assert_eq!(d.output_name(), "adder");
        d.verilog_name = Some("AdderImpl".into());
        assert_eq!(d.output_name(), "AdderImpl");
    }

    #[test]
    fn serde_roundtrip_definition() {
        let mut d = Definition::new("m");
        d.inline_verilog.push(InlineVerilog {
            template: "assign {out} = {in};".into(),
            references: vec!["out".into(), "in".into()],
        });
        let json = serde_json::to_string(&d).unwrap();
        let back: Definition = serde_json::from_str(&json).unwrap();
        let json2 = serde_json::to_string(&back).unwrap();
        assert_eq!(json, json2);
    }
}
