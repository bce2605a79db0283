//! MLIR values and symbols.

use serde::{Deserialize, Serialize};

use crate::types::MlirType;

/// An SSA value: a type plus a name unique within its hardware-module
/// scope. Renders as `%name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlirValue {
    pub name: String,
    pub ty: MlirType,
    /// True when the name was auto-generated rather than caller-chosen.
    pub anonymous: bool,
}

impl MlirValue {
    pub fn named(name: impl Into<String>, ty: MlirType) -> Self {
        MlirValue {
            name: name.into(),
            ty,
            anonymous: false,
        }
    }

    pub fn anon(name: impl Into<String>, ty: MlirType) -> Self {
        MlirValue {
            name: name.into(),
            ty,
            anonymous: true,
        }
    }

    /// The textual reference, e.g. `%0` or `%a`.
    pub fn reference(&self) -> String {
        format!("%{}", self.name)
    }
}

/// A symbol-table name, rendered as `@name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MlirSymbol(pub String);

impl MlirSymbol {
    pub fn reference(&self) -> String {
        format!("@{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references() {
        let v = MlirValue::anon("0", MlirType::Integer(1));
        assert_eq!(v.reference(), "%0");
        assert!(v.anonymous);
        let s = MlirSymbol("Top".into());
        assert_eq!(s.reference(), "@Top");
    }
}
