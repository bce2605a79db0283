//! The hardware type system.
//!
//! Types are structural and interned: [`TypeTable::intern`] deduplicates by
//! value and hands out copyable [`TypeId`]s, so type equality is ID equality
//! and downstream passes can memoize by ID.
//!
//! Product fields are stored as an ordered list; declaration order is
//! semantic (it fixes struct field order in the emitted IR).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Interned type identity. Equality of IDs is equality of types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TypeId(pub u32);

/// Reset flavor carried by a digital reset wire. Determines the reset kind
/// and active edge of register scaffolding during lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetKind {
    /// Synchronous, active-high.
    Sync,
    /// Synchronous, active-low.
    SyncN,
    /// Asynchronous, active-high.
    Async,
    /// Asynchronous, active-low.
    AsyncN,
}

/// What a single digital wire means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigitalKind {
    /// A plain data bit.
    Bit,
    /// A clock wire.
    Clock,
    /// A reset wire of the given flavor.
    Reset(ResetKind),
}

/// A hardware type. Aggregates reference their element types by [`TypeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HwType {
    /// A single wire.
    Digital(DigitalKind),
    /// A fixed-width bit vector.
    Bits(u32),
    /// A fixed-length array of a single element type.
    Array { len: u32, elem: TypeId },
    /// A named product with ordered fields.
    Product { fields: Vec<(String, TypeId)> },
}

/// Interning table for hardware types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTable {
    types: Vec<HwType>,
    #[serde(skip)]
    interned: HashMap<HwType, TypeId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a type, returning the existing ID if an equal type was seen.
    pub fn intern(&mut self, ty: HwType) -> TypeId {
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    /// Looks up the structure of a type. IDs handed out by this table are
    /// always valid, so this indexes directly.
    pub fn get(&self, id: TypeId) -> &HwType {
        &self.types[id.0 as usize]
    }

    // -- Convenience constructors ------------------------------------------

    pub fn bit(&mut self) -> TypeId {
        self.intern(HwType::Digital(DigitalKind::Bit))
    }

    pub fn clock(&mut self) -> TypeId {
        self.intern(HwType::Digital(DigitalKind::Clock))
    }

    pub fn reset(&mut self, kind: ResetKind) -> TypeId {
        self.intern(HwType::Digital(DigitalKind::Reset(kind)))
    }

    pub fn bits(&mut self, width: u32) -> TypeId {
        self.intern(HwType::Bits(width))
    }

    pub fn array(&mut self, len: u32, elem: TypeId) -> TypeId {
        self.intern(HwType::Array { len, elem })
    }

    pub fn product(&mut self, fields: Vec<(String, TypeId)>) -> TypeId {
        self.intern(HwType::Product { fields })
    }

    // -- Queries -----------------------------------------------------------

    /// Width in bits if the type is a digital wire or a bit vector.
    pub fn scalar_width(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            HwType::Digital(_) => Some(1),
            HwType::Bits(w) => Some(*w),
            _ => None,
        }
    }

    /// True for `Bits(_)` and for arrays whose element is a single digital
    /// wire; both flatten to a plain `iN` integer during lowering.
    pub fn is_bit_vector(&self, id: TypeId) -> bool {
        match self.get(id) {
            HwType::Bits(_) => true,
            HwType::Array { elem, .. } => matches!(self.get(*elem), HwType::Digital(_)),
            _ => false,
        }
    }

    /// Element count of an array-like type (`Bits` counts bits).
    pub fn array_len(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            HwType::Bits(w) => Some(*w),
            HwType::Array { len, .. } => Some(*len),
            _ => None,
        }
    }

    /// Element type of an array-like type (`Bits` elements are bits).
    pub fn elem_type(&mut self, id: TypeId) -> Option<TypeId> {
        match self.get(id).clone() {
            HwType::Bits(_) => Some(self.bit()),
            HwType::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// True if the type is, or transitively contains, a product.
    pub fn contains_product(&self, id: TypeId) -> bool {
        match self.get(id) {
            HwType::Product { .. } => true,
            HwType::Array { elem, .. } => self.contains_product(*elem),
            _ => false,
        }
    }

    /// Rebuilds the interning map after deserialization.
    pub fn rebuild_index(&mut self) {
        self.interned = self
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), TypeId(i as u32)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut table = TypeTable::new();
        let a = table.bits(16);
        let b = table.bits(16);
        assert_eq!(a, b);
        let c = table.bits(8);
        assert_ne!(a, c);
    }

    #[test]
    fn product_field_order_is_significant() {
        let mut table = TypeTable::new();
        let b8 = table.bits(8);
        let b4 = table.bits(4);
        let p1 = table.product(vec![("x".into(), b8), ("y".into(), b4)]);
        let p2 = table.product(vec![("y".into(), b4), ("x".into(), b8)]);
        assert_ne!(p1, p2);
    }

    #[test]
    fn bit_vector_classification() {
        let mut table = TypeTable::new();
        let bit = table.bit();
        let bits = table.bits(7);
        let arr_bit = table.array(4, bit);
        let arr_bits = table.array(4, bits);
        assert!(table.is_bit_vector(bits));
        assert!(table.is_bit_vector(arr_bit));
        assert!(!table.is_bit_vector(arr_bits));
        assert!(!table.is_bit_vector(bit));
    }

    #[test]
    fn scalar_widths() {
        let mut table = TypeTable::new();
        let clk = table.clock();
        let bits = table.bits(32);
        let arr = table.array(2, bits);
        assert_eq!(table.scalar_width(clk), Some(1));
        assert_eq!(table.scalar_width(bits), Some(32));
        assert_eq!(table.scalar_width(arr), None);
    }

    #[test]
    fn rebuild_index_restores_interning() {
        let mut table = TypeTable::new();
        let b16 = table.bits(16);
        let json = serde_json::to_string(&table).unwrap();
        let mut back: TypeTable = serde_json::from_str(&json).unwrap();
        back.rebuild_index();
        assert_eq!(back.bits(16), b16);
    }

    #[test]
    fn contains_product_recurses_through_arrays() {
        let mut table = TypeTable::new();
        let b8 = table.bits(8);
        let p = table.product(vec![("v".into(), b8)]);
        let arr = table.array(3, p);
        let plain = table.array(3, b8);
        assert!(table.contains_product(arr));
        assert!(!table.contains_product(plain));
    }
}
