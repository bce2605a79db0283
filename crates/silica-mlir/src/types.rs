//! MLIR types used by the emitted IR.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An MLIR type. `Display` renders the textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MlirType {
    /// `iN`.
    Integer(u32),
    /// `!hw.array<NxT>`.
    Array { size: u32, elem: Box<MlirType> },
    /// `!hw.struct<f: T, ...>` with ordered fields.
    Struct { fields: Vec<(String, MlirType)> },
    /// `!hw.inout<T>`.
    InOut(Box<MlirType>),
}

impl MlirType {
    pub fn array(size: u32, elem: MlirType) -> MlirType {
        MlirType::Array {
            size,
            elem: Box::new(elem),
        }
    }

    pub fn inout(inner: MlirType) -> MlirType {
        MlirType::InOut(Box::new(inner))
    }
}

impl fmt::Display for MlirType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlirType::Integer(width) => write!(f, "i{width}"),
            MlirType::Array { size, elem } => write!(f, "!hw.array<{size}x{elem}>"),
            MlirType::Struct { fields } => {
                write!(f, "!hw.struct<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, ">")
            }
            MlirType::InOut(inner) => write!(f, "!hw.inout<{inner}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_integers() {
        assert_eq!(MlirType::Integer(1).to_string(), "i1");
        assert_eq!(MlirType::Integer(16).to_string(), "i16");
    }

    #[test]
    fn renders_aggregates() {
        let arr = MlirType::array(8, MlirType::Integer(16));
        assert_eq!(arr.to_string(), "!hw.array<8xi16>");
        let st = MlirType::Struct {
            fields: vec![
                ("data".into(), arr.clone()),
                ("sel".into(), MlirType::Integer(3)),
            ],
        };
        assert_eq!(st.to_string(), "!hw.struct<data: !hw.array<8xi16>, sel: i3>");
        assert_eq!(
            MlirType::inout(MlirType::Integer(8)).to_string(),
            "!hw.inout<i8>"
        );
    }

    #[test]
    fn renders_nested_arrays() {
        let inner = MlirType::array(4, MlirType::Integer(16));
        let outer = MlirType::array(8, inner);
        assert_eq!(outer.to_string(), "!hw.array<8x!hw.array<4xi16>>");
    }
}
