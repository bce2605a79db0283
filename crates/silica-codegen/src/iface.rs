//! Interface descent to direction-pure leaf ports.
//!
//! Mixed-direction aggregates are descended until every leaf has a single
//! direction. With `flatten_all_tuples`, product-carrying leaves are
//! descended too, expanding products into their constituent scalar/array
//! leaves in interface signatures. Leaf names are the port name extended
//! with `_field` / `_index` path segments.

use silica_netlist::{Direction, HwType, Netlist, ValueId};

use crate::error::CompileError;

#[derive(Debug, Clone)]
pub(crate) struct Leaf {
    pub value: ValueId,
    pub name: String,
    pub dir: Direction,
}

/// Collects the direction-pure leaves of `value` in declaration order.
pub(crate) fn collect_leaves(
    nl: &mut Netlist,
    value: ValueId,
    name: &str,
    flatten_all_tuples: bool,
    out: &mut Vec<Leaf>,
) -> Result<(), CompileError> {
    let dir = nl.value(value).dir;
    let ty = nl.value(value).ty;
    let descend =
        dir == Direction::Mixed || (flatten_all_tuples && nl.types.contains_product(ty));
    if !descend {
        out.push(Leaf {
            value,
            name: name.to_string(),
            dir,
        });
        return Ok(());
    }
    match nl.types.get(ty).clone() {
        HwType::Product { fields } => {
            for (fname, _) in fields {
                let child = nl.field(value, &fname)?;
                collect_leaves(nl, child, &format!("{name}_{fname}"), flatten_all_tuples, out)?;
            }
            Ok(())
        }
        HwType::Array { len, .. } => {
            for i in 0..len {
                let child = nl.elem(value, i)?;
                collect_leaves(nl, child, &format!("{name}_{i}"), flatten_all_tuples, out)?;
            }
            Ok(())
        }
        _ => Err(CompileError::UnsupportedDriver {
            reason: format!("mixed direction on non-aggregate port '{name}'"),
        }),
    }
}

/// Port-name characters that are not valid in MLIR value names.
pub(crate) fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '(' | '[' => out.push('_'),
            ')' | ']' | ' ' => {}
            ',' | '=' | '.' => out.push('_'),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_netlist::PortDir;

    #[test]
    fn pure_port_is_one_leaf() {
        let mut nl = Netlist::new();
        let d = nl.new_definition("m");
        let t = nl.types.bits(8);
        let a = nl.add_input(d, "a", t).unwrap();
        let mut leaves = Vec::new();
        collect_leaves(&mut nl, a, "a", false, &mut leaves).unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].name, "a");
        assert_eq!(leaves[0].dir, Direction::Output);
    }

    #[test]
    fn mixed_port_descends_with_path_names() {
        let mut nl = Netlist::new();
        let d = nl.new_definition("m");
        let b8 = nl.types.bits(8);
        let p = nl.types.product(vec![("req".into(), b8), ("ack".into(), b8)]);
        let ch = nl
            .add_port(
                d,
                "ch",
                p,
                PortDir::Mixed(vec![("req".into(), PortDir::In), ("ack".into(), PortDir::Out)]),
            )
            .unwrap();
        let mut leaves = Vec::new();
        collect_leaves(&mut nl, ch, "ch", false, &mut leaves).unwrap();
        let names: Vec<&str> = leaves.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["ch_req", "ch_ack"]);
    }

    #[test]
    fn flatten_descends_pure_products() {
        let mut nl = Netlist::new();
        let d = nl.new_definition("m");
        let b8 = nl.types.bits(8);
        let p = nl.types.product(vec![("x".into(), b8), ("y".into(), b8)]);
        let a = nl.add_input(d, "a", p).unwrap();
        let mut plain = Vec::new();
        collect_leaves(&mut nl, a, "a", false, &mut plain).unwrap();
        assert_eq!(plain.len(), 1);
        let mut flat = Vec::new();
        collect_leaves(&mut nl, a, "a", true, &mut flat).unwrap();
        let names: Vec<&str> = flat.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["a_x", "a_y"]);
    }

    #[test]
    fn sanitize_strips_brackets() {
        assert_eq!(sanitize("a[0]"), "a_0");
        assert_eq!(sanitize("p.x"), "p_x");
    }
}
