//! Source circuit model for the silica compiler.
//!
//! A [`Netlist`] owns a set of hardware [`types`](crate::types), module
//! definitions with ordered interface ports, instances of those definitions,
//! and the wiring between port values. Every port value has a stable
//! [`ValueId`] identity and a [`ValueRef`] describing its origin (definition
//! port, instance port, aggregate element, anonymous aggregate, constant).
//!
//! The model is deliberately compiler-facing: it answers "what drives this
//! value?" ([`Netlist::trace`]) and "what is the shape of this interface?"
//! and nothing else. Lowering to MLIR lives in `silica-codegen`.

pub mod defn;
pub mod error;
pub mod netlist;
pub mod types;
pub mod value;

pub use defn::{
    BindSpec, CompileGuard, ConfigValue, Definition, DefnId, GuardKind, InlineVerilog, InstId,
    Instance, PrimitiveInfo,
};
pub use error::NetlistError;
pub use netlist::{Netlist, RootModule};
pub use types::{DigitalKind, HwType, ResetKind, TypeId, TypeTable};
pub use value::{ArrayIndex, ChildKey, Direction, PortDir, ValueData, ValueId, ValueRef};
