//! Cycle breaking and SSA ordering of an emitted module body.
//!
//! Stateful primitives let a value feed a predecessor of its own producer,
//! so emission order alone does not give dominance. This pass runs after a
//! module's ops are emitted:
//!
//! 1. build the op dependency graph (region ops consume and produce
//!    through their child blocks);
//! 2. while a strongly connected component with more than one op exists,
//!    pick a `(value, consumer)` edge inside it and interpose
//!    `sv.wire` / `sv.assign` / `sv.read_inout`, redirecting the consumer
//!    to the read value;
//! 3. stably re-order the block so every value is produced before it is
//!    consumed, ties broken by construction order, `hw.output` pinned
//!    last.
//!
//! On an acyclic, already-ordered block the pass is the identity.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use silica_mlir::{Block, MlirType, MlirValue, OpKind, Operation, ScopedNameGenerator};

use crate::error::CompileError;

struct Deps {
    producers: HashMap<String, usize>,
    /// Deduplicated `(producer, consumer)` pairs, sorted for determinism.
    edges: Vec<(usize, usize)>,
}

fn op_dependencies(block: &Block) -> Deps {
    let mut producers = HashMap::new();
    for (i, op) in block.ops.iter().enumerate() {
        op.for_each_result(&mut |v| {
            producers.insert(v.name.clone(), i);
        });
    }
    let mut edge_set = HashSet::new();
    for (i, op) in block.ops.iter().enumerate() {
        op.for_each_operand(&mut |v| {
            if let Some(&p) = producers.get(&v.name) {
                if p != i {
                    edge_set.insert((p, i));
                }
            }
        });
    }
    let mut edges: Vec<_> = edge_set.into_iter().collect();
    edges.sort_unstable();
    Deps { producers, edges }
}

/// A `(value, consumer)` edge inside the cyclic component, preferring the
/// lowest-numbered consumer for determinism. Inout-typed values never
/// qualify (their producers have no operands and sit outside any cycle).
fn pick_cycle_edge(
    block: &Block,
    producers: &HashMap<String, usize>,
    members: &HashSet<usize>,
) -> Option<(MlirValue, usize)> {
    let mut ordered: Vec<usize> = members.iter().copied().collect();
    ordered.sort_unstable();
    for &i in &ordered {
        let mut found = None;
        block.ops[i].for_each_operand(&mut |v| {
            if found.is_some() {
                return;
            }
            if let Some(&p) = producers.get(&v.name) {
                if p != i && members.contains(&p) && !matches!(v.ty, MlirType::InOut(_)) {
                    found = Some(v.clone());
                }
            }
        });
        if let Some(value) = found {
            return Some((value, i));
        }
    }
    None
}

/// Breaks feedback cycles and restores SSA dominance in `block`.
pub(crate) fn break_cycles(
    block: &mut Block,
    names: &mut ScopedNameGenerator,
    module: &str,
) -> Result<(), CompileError> {
    let outputs = block.ops.iter().filter(|o| o.is_output()).count();
    if outputs > 1 {
        return Err(CompileError::MultipleOutputs {
            module: module.to_string(),
        });
    }
    loop {
        let deps = op_dependencies(block);
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let indices: Vec<_> = (0..block.ops.len()).map(|i| graph.add_node(i)).collect();
        for &(p, c) in &deps.edges {
            graph.add_edge(indices[p], indices[c], ());
        }
        let cyclic = tarjan_scc(&graph).into_iter().find(|scc| scc.len() > 1);
        let Some(scc) = cyclic else { break };
        let members: HashSet<usize> = scc.iter().map(|&n| graph[n]).collect();
        let (value, consumer) =
            pick_cycle_edge(block, &deps.producers, &members).ok_or_else(|| {
                CompileError::InvalidGraph(format!("unbreakable cycle in module '{module}'"))
            })?;
        let inner = value.ty.clone();
        let wire = MlirValue::anon(names.fresh(), MlirType::inout(inner.clone()));
        let read = MlirValue::anon(names.fresh(), inner);
        block.ops[consumer].replace_operand(&value.name, &read);
        block.ops.push(Operation::new(
            OpKind::SvWire {
                name: None,
                sym: None,
            },
            vec![],
            vec![wire.clone()],
        ));
        block.ops.push(Operation::new(
            OpKind::SvAssign,
            vec![wire.clone(), value],
            vec![],
        ));
        block
            .ops
            .push(Operation::new(OpKind::SvReadInOut, vec![wire], vec![read]));
    }
    sort_block(block, module)
}

/// Stable Kahn ordering by original index; the terminator stays last.
fn sort_block(block: &mut Block, module: &str) -> Result<(), CompileError> {
    let deps = op_dependencies(block);
    let n = block.ops.len();
    let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for &(p, c) in &deps.edges {
        consumers[p].push(c);
        indegree[c] += 1;
    }
    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| indegree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &c in &consumers[i] {
            indegree[c] -= 1;
            if indegree[c] == 0 {
                ready.push(Reverse(c));
            }
        }
    }
    if order.len() != n {
        return Err(CompileError::InvalidGraph(format!(
            "cycle remains after breaking in module '{module}'"
        )));
    }
    let mut slots: Vec<Option<Operation>> = block.ops.drain(..).map(Some).collect();
    let mut rest = Vec::with_capacity(n);
    let mut terminators = Vec::new();
    for i in order {
        let op = slots[i].take().expect("each op is placed exactly once");
        if op.is_output() {
            terminators.push(op);
        } else {
            rest.push(op);
        }
    }
    rest.extend(terminators);
    block.ops = rest;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str, width: u32) -> MlirValue {
        MlirValue::anon(name, MlirType::Integer(width))
    }

    fn or(a: &MlirValue, b: &MlirValue, out: &MlirValue) -> Operation {
        Operation::new(
            OpKind::CombBase { op: "or" },
            vec![a.clone(), b.clone()],
            vec![out.clone()],
        )
    }

    #[test]
    fn ordered_acyclic_block_is_untouched() {
        let a = v("a", 8);
        let x = v("0", 8);
        let y = v("1", 8);
        let mut block = Block {
            ops: vec![
                or(&a, &a, &x),
                or(&x, &a, &y),
                Operation::new(OpKind::HwOutput, vec![y.clone()], vec![]),
            ],
        };
        let before: Vec<String> = block.ops.iter().map(|o| format!("{:?}", o.kind)).collect();
        let mut names = ScopedNameGenerator::new();
        names.reserve("a").unwrap();
        break_cycles(&mut block, &mut names, "m").unwrap();
        let after: Vec<String> = block.ops.iter().map(|o| format!("{:?}", o.kind)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn out_of_order_block_is_reordered() {
        let a = v("a", 8);
        let x = v("0", 8);
        let y = v("1", 8);
        // `y = or(x, a)` emitted before `x = or(a, a)`.
        let mut block = Block {
            ops: vec![or(&x, &a, &y), or(&a, &a, &x)],
        };
        let mut names = ScopedNameGenerator::new();
        break_cycles(&mut block, &mut names, "m").unwrap();
        assert_eq!(block.ops[0].results[0].name, "0");
        assert_eq!(block.ops[1].results[0].name, "1");
    }

    #[test]
    fn true_cycle_gets_wire_interposed() {
        let x = v("0", 8);
        let y = v("1", 8);
        // x = or(y, y); y = or(x, x): a genuine combinational loop.
        let mut block = Block {
            ops: vec![or(&y, &y, &x), or(&x, &x, &y)],
        };
        let mut names = ScopedNameGenerator::new();
        names.reserve("0").unwrap();
        names.reserve("1").unwrap();
        break_cycles(&mut block, &mut names, "m").unwrap();
        let kinds: Vec<bool> = block
            .ops
            .iter()
            .map(|o| matches!(o.kind, OpKind::SvWire { .. }))
            .collect();
        assert!(kinds.contains(&true), "expected an interposed sv.wire");
        assert!(block
            .ops
            .iter()
            .any(|o| matches!(o.kind, OpKind::SvReadInOut)));
        assert!(block.ops.iter().any(|o| matches!(o.kind, OpKind::SvAssign)));
        // And dominance holds: every operand produced in the block is
        // produced by an earlier op.
        let mut produced: HashSet<String> = HashSet::new();
        for op in &block.ops {
            op.for_each_result(&mut |v| {
                produced.insert(v.name.clone());
            });
        }
        let mut seen: HashSet<String> = HashSet::new();
        for op in &block.ops {
            op.for_each_operand(&mut |v| {
                if produced.contains(&v.name) {
                    assert!(seen.contains(&v.name), "%{} consumed before produced", v.name);
                }
            });
            op.for_each_result(&mut |v| {
                seen.insert(v.name.clone());
            });
        }
    }

    #[test]
    fn double_output_is_rejected() {
        let a = v("a", 1);
        let mut block = Block {
            ops: vec![
                Operation::new(OpKind::HwOutput, vec![a.clone()], vec![]),
                Operation::new(OpKind::HwOutput, vec![a.clone()], vec![]),
            ],
        };
        let mut names = ScopedNameGenerator::new();
        let err = break_cycles(&mut block, &mut names, "m").unwrap_err();
        assert!(matches!(err, CompileError::MultipleOutputs { .. }));
    }

    #[test]
    fn idempotent_on_acyclic_blocks() {
        let a = v("a", 4);
        let x = v("0", 4);
        let mut block = Block {
            ops: vec![or(&a, &a, &x)],
        };
        let mut names = ScopedNameGenerator::new();
        break_cycles(&mut block, &mut names, "m").unwrap();
        let once: Vec<String> = block.ops.iter().map(|o| format!("{:?}", o)).collect();
        break_cycles(&mut block, &mut names, "m").unwrap();
        let twice: Vec<String> = block.ops.iter().map(|o| format!("{:?}", o)).collect();
        assert_eq!(once, twice);
    }
}
