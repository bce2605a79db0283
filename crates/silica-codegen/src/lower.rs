//! Source type to MLIR type lowering.
//!
//! The mapping: a digital wire is `i1`, a bit vector is `iN`, an array of
//! single wires flattens to `iN`, any other array becomes `!hw.array`, and
//! a product becomes `!hw.struct` preserving field order. Memoized by
//! interned type identity.

use std::collections::HashMap;

use silica_mlir::MlirType;
use silica_netlist::{HwType, TypeId, TypeTable};

use crate::error::CompileError;

pub(crate) fn lower_type(
    types: &TypeTable,
    cache: &mut HashMap<TypeId, MlirType>,
    id: TypeId,
) -> Result<MlirType, CompileError> {
    if let Some(ty) = cache.get(&id) {
        return Ok(ty.clone());
    }
    let lowered = match types.get(id).clone() {
        HwType::Digital(_) => MlirType::Integer(1),
        HwType::Bits(0) => {
            return Err(CompileError::UnsupportedType {
                reason: "zero-width bit vector".into(),
            })
        }
        HwType::Bits(width) => MlirType::Integer(width),
        HwType::Array { len: 0, .. } => {
            return Err(CompileError::UnsupportedType {
                reason: "zero-length array".into(),
            })
        }
        HwType::Array { len, elem } => match types.get(elem) {
            HwType::Digital(_) => MlirType::Integer(len),
            _ => MlirType::array(len, lower_type(types, cache, elem)?),
        },
        HwType::Product { fields } => {
            let mut lowered_fields = Vec::with_capacity(fields.len());
            for (name, fty) in fields {
                lowered_fields.push((name, lower_type(types, cache, fty)?));
            }
            MlirType::Struct {
                fields: lowered_fields,
            }
        }
    };
    cache.insert(id, lowered.clone());
    Ok(lowered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digital_and_bits() {
        let mut t = TypeTable::new();
        let mut cache = HashMap::new();
        let bit = t.bit();
        let clk = t.clock();
        let b9 = t.bits(9);
        assert_eq!(lower_type(&t, &mut cache, bit).unwrap(), MlirType::Integer(1));
        assert_eq!(lower_type(&t, &mut cache, clk).unwrap(), MlirType::Integer(1));
        assert_eq!(lower_type(&t, &mut cache, b9).unwrap(), MlirType::Integer(9));
    }

    #[test]
    fn array_of_bits_flattens() {
        let mut t = TypeTable::new();
        let mut cache = HashMap::new();
        let bit = t.bit();
        let arr = t.array(12, bit);
        assert_eq!(
            lower_type(&t, &mut cache, arr).unwrap(),
            MlirType::Integer(12)
        );
    }

    #[test]
    fn aggregate_lowering() {
        let mut t = TypeTable::new();
        let mut cache = HashMap::new();
        let b16 = t.bits(16);
        let arr = t.array(8, b16);
        let prod = t.product(vec![("data".into(), arr), ("sel".into(), b16)]);
        assert_eq!(
            lower_type(&t, &mut cache, arr).unwrap().to_string(),
            "!hw.array<8xi16>"
        );
        assert_eq!(
            lower_type(&t, &mut cache, prod).unwrap().to_string(),
            "!hw.struct<data: !hw.array<8xi16>, sel: i16>"
        );
    }

    #[test]
    fn zero_width_is_unsupported() {
        let mut t = TypeTable::new();
        let mut cache = HashMap::new();
        let b0 = t.bits(0);
        assert!(matches!(
            lower_type(&t, &mut cache, b0),
            Err(CompileError::UnsupportedType { .. })
        ));
    }

    proptest! {
        #[test]
        fn bits_width_is_preserved(w in 1u32..512) {
            let mut t = TypeTable::new();
            let mut cache = HashMap::new();
            let b = t.bits(w);
            prop_assert_eq!(lower_type(&t, &mut cache, b).unwrap(), MlirType::Integer(w));
        }
    }
}
