//! MLIR surface for the silica compiler.
//!
//! A deliberately small model of the pieces of MLIR the compiler emits:
//! types, SSA values, symbols, typed operation records for the `hw`,
//! `comb`, and `sv` dialects, block containers, an indenting printer, and
//! the block-stack builder ops are emitted through.
//!
//! No semantic logic lives here. Ops are plain records; the printer turns
//! them into text and nothing else.

pub mod builder;
pub mod error;
pub mod names;
pub mod ops;
pub mod printer;
pub mod types;
pub mod value;

pub use builder::OpBuilder;
pub use error::NameCollision;
pub use names::ScopedNameGenerator;
pub use ops::{Block, ClockEdge, OpKind, Operation, ResetStyle};
pub use printer::Printer;
pub use types::MlirType;
pub use value::{MlirSymbol, MlirValue};
