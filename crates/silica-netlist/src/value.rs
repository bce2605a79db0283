//! Port values and their origins.
//!
//! Every wire-carrying point in a circuit is a value with a stable
//! [`ValueId`]. A value knows its type, its direction, and a [`ValueRef`]
//! describing where it comes from. Aggregate children (array elements,
//! bit slices, product fields) are themselves values, created lazily and
//! cached by the owning [`Netlist`](crate::Netlist) so identity is stable
//! across lookups.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defn::{DefnId, InstId};
use crate::types::TypeId;

/// Stable identity of a value within one netlist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ValueId(pub u32);

/// Direction of a value.
///
/// Definition ports are stored from the inside perspective: a declared
/// module input drives internal logic and is therefore stored as `Output`,
/// while a declared module output is driven from inside and is stored as
/// `Input`. Instance ports keep the natural outside perspective. This makes
/// "which values need a driver?" a single direction test everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Driven by someone else; must have exactly one driver.
    Input,
    /// Drives other values.
    Output,
    /// An aggregate whose sub-values have differing directions.
    Mixed,
    /// Bidirectional; not produced by the construction API today but part
    /// of the direction vocabulary.
    InOut,
}

impl Direction {
    /// The view from the other side of an interface boundary.
    pub fn flip(self) -> Direction {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
            Direction::Mixed => Direction::Mixed,
            Direction::InOut => Direction::InOut,
        }
    }
}

/// Index into an array-like value: a single element or, over bit vectors
/// only, a contiguous slice `[lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayIndex {
    Elem(u32),
    Slice { lo: u32, hi: u32 },
}

/// Cache key for lazily created aggregate children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildKey {
    Index(ArrayIndex),
    Field(String),
}

/// Where a value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueRef {
    /// An interface port of a definition, seen from inside that definition.
    DefnPort { defn: DefnId, port: String },
    /// An interface port of an instance, seen from the enclosing definition.
    InstPort { inst: InstId, port: String },
    /// An element or bit slice of another value.
    ArrayElem { parent: ValueId, index: ArrayIndex },
    /// A named field of another value.
    ProductField { parent: ValueId, field: String },
    /// An anonymous aggregate literal assembled from existing driver values.
    Anon { elements: Vec<ValueId> },
    /// A constant single wire.
    ConstDigital(bool),
    /// A constant bit vector.
    ConstBits(u64),
}

/// Declared direction of an interface port, written from the outside
/// perspective. Mixed products give a direction per field and may nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDir {
    In,
    Out,
    Mixed(Vec<(String, PortDir)>),
}

impl PortDir {
    /// The view from the other side of the interface boundary.
    pub fn flip(&self) -> PortDir {
        match self {
            PortDir::In => PortDir::Out,
            PortDir::Out => PortDir::In,
            PortDir::Mixed(fields) => PortDir::Mixed(
                fields.iter().map(|(k, d)| (k.clone(), d.flip())).collect(),
            ),
        }
    }
}

/// A value record owned by the netlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueData {
    pub ty: TypeId,
    pub dir: Direction,
    pub origin: ValueRef,
    /// Per-field directions, present only on mixed product values.
    pub field_dirs: Option<IndexMap<String, Direction>>,
}

impl ValueData {
    pub fn new(ty: TypeId, dir: Direction, origin: ValueRef) -> Self {
        ValueData {
            ty,
            dir,
            origin,
            field_dirs: None,
        }
    }

    /// True for constant origins (drivers that need no tracing).
    pub fn is_const(&self) -> bool {
        matches!(
            self.origin,
            ValueRef::ConstDigital(_) | ValueRef::ConstBits(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_flip_roundtrips() {
        for dir in [
            Direction::Input,
            Direction::Output,
            Direction::Mixed,
            Direction::InOut,
        ] {
            assert_eq!(dir.flip().flip(), dir);
        }
        assert_eq!(Direction::Input.flip(), Direction::Output);
    }

    #[test]
    fn const_detection() {
        let v = ValueData::new(TypeId(0), Direction::Output, ValueRef::ConstDigital(true));
        assert!(v.is_const());
        let w = ValueData::new(
            TypeId(0),
            Direction::Output,
            ValueRef::Anon { elements: vec![] },
        );
        assert!(!w.is_const());
    }
}
