//! Error types for the MLIR layer.

use thiserror::Error;

/// A forced name was already in use in its scope.
#[derive(Debug, Error)]
#[error("name already in use: '{name}'")]
pub struct NameCollision {
    pub name: String,
}
