//! Compilation error types covering all failure modes of the pipeline.
//!
//! Every error is fatal at the call site and carries enough context to name
//! the offending source node. No partial module text is produced for a
//! failed definition.

use silica_mlir::NameCollision;
use silica_netlist::NetlistError;

/// Errors produced while compiling a netlist to MLIR.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Type lowering hit a shape it cannot express (zero-width vectors,
    /// empty arrays).
    #[error("unsupported type: {reason}")]
    UnsupportedType { reason: String },

    /// Graph construction hit a driver reference kind it cannot handle.
    #[error("unsupported driver: {reason}")]
    UnsupportedDriver { reason: String },

    /// A `(library, operator)` pair is not in the lowering table.
    #[error("unsupported primitive: {lib}.{name}")]
    UnsupportedPrimitive { lib: String, name: String },

    /// A port was mapped to two different MLIR values.
    #[error("value map conflict on {key}")]
    ValueMapConflict { key: String },

    /// A forced name was already taken in its scope.
    #[error(transparent)]
    NameCollision(#[from] NameCollision),

    /// More than one `hw.output` in a single module.
    #[error("multiple hw.output ops in module '{module}'")]
    MultipleOutputs { module: String },

    /// The module visitor reached a node twice.
    #[error("module node visited twice in '{module}'")]
    ReVisit { module: String },

    /// Graph structure issue preventing compilation.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Source model misuse surfaced during compilation.
    #[error(transparent)]
    Netlist(#[from] NetlistError),

    /// Failure writing the output text.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
