//! Error types for the source circuit model.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! misuse of the netlist construction API.

use crate::defn::{DefnId, InstId};
use crate::value::ValueId;
use thiserror::Error;

/// Errors produced while constructing or querying a netlist.
#[derive(Debug, Error)]
pub enum NetlistError {
    /// A definition ID was not found.
    #[error("definition not found: DefnId({id})", id = id.0)]
    DefnNotFound { id: DefnId },

    /// An instance ID was not found.
    #[error("instance not found: InstId({id})", id = id.0)]
    InstNotFound { id: InstId },

    /// A value ID was not found.
    #[error("value not found: ValueId({id})", id = id.0)]
    ValueNotFound { id: ValueId },

    /// A port name already exists on the definition.
    #[error("duplicate port '{port}' on definition '{defn}'")]
    DuplicatePort { defn: String, port: String },

    /// A port name was not found on a definition or instance.
    #[error("no port named '{port}' on '{owner}'")]
    PortNotFound { owner: String, port: String },

    /// Indexing or field access that does not match the value's type.
    #[error("invalid aggregate access: {reason}")]
    InvalidAccess { reason: String },

    /// A value already has a driver and cannot be rewired.
    #[error("value ValueId({id}) is already driven", id = id.0)]
    AlreadyDriven { id: ValueId },

    /// Wiring into a value that is not an input.
    #[error("cannot drive non-input value ValueId({id})", id = id.0)]
    NotAnInput { id: ValueId },

    /// An operation that only makes sense on a primitive definition.
    #[error("definition '{defn}' is not a primitive")]
    NotAPrimitive { defn: String },
}
