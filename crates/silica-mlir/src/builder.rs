//! The block-stack op builder.
//!
//! During one module compile, ops are emitted into an implicit "current
//! block": the top of the builder's stack. Nested regions are built by
//! pushing a fresh block, emitting into it, and popping it back out to
//! store inside the region-bearing op. [`OpBuilder::scoped`] guarantees the
//! pop happens on the error path too.

use crate::ops::{Block, Operation};

/// Stack of in-progress blocks. The bottom block is the module body.
#[derive(Debug, Default)]
pub struct OpBuilder {
    stack: Vec<Block>,
}

impl OpBuilder {
    /// A builder with a single (module body) block.
    pub fn new() -> Self {
        OpBuilder {
            stack: vec![Block::default()],
        }
    }

    /// Appends an op to the current block.
    pub fn emit(&mut self, op: Operation) {
        self.stack
            .last_mut()
            .expect("builder always holds at least one block")
            .push_op(op);
    }

    /// Pushes a fresh current block. Pair with [`pop_block`](Self::pop_block),
    /// or use [`scoped`](Self::scoped).
    pub fn push_block(&mut self) {
        self.stack.push(Block::default());
    }

    /// Pops the current block and returns it.
    pub fn pop_block(&mut self) -> Block {
        debug_assert!(self.stack.len() > 1, "popping the module body block");
        self.stack.pop().expect("block stack underflow")
    }

    /// Runs `f` with a fresh current block and returns that block. The
    /// block is popped whether `f` succeeds or fails.
    pub fn scoped<R, E>(
        &mut self,
        f: impl FnOnce(&mut OpBuilder) -> Result<R, E>,
    ) -> Result<(Block, R), E> {
        self.push_block();
        let out = f(self);
        let block = self.pop_block();
        out.map(|r| (block, r))
    }

    /// Takes the finished module body. The builder is left empty and must
    /// not be reused.
    pub fn finish(mut self) -> Block {
        debug_assert_eq!(self.stack.len(), 1, "unbalanced block stack");
        self.stack.pop().expect("builder always holds the body block")
    }
}

impl Block {
    fn push_op(&mut self, op: Operation) {
        self.ops.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::OpKind;
    use crate::types::MlirType;
    use crate::value::MlirValue;

    fn noop() -> Operation {
        Operation::new(
            OpKind::SvVerbatim { text: "x".into() },
            vec![],
            vec![],
        )
    }

    #[test]
    fn emits_into_current_block() {
        let mut b = OpBuilder::new();
        b.emit(noop());
        let (inner, ()) = b
            .scoped(|b| {
                b.emit(noop());
                b.emit(noop());
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(inner.ops.len(), 2);
        b.emit(noop());
        let body = b.finish();
        assert_eq!(body.ops.len(), 2);
    }

    #[test]
    fn scoped_pops_on_error() {
        let mut b = OpBuilder::new();
        let err: Result<(Block, ()), &str> = b.scoped(|b| {
            b.emit(noop());
            Err("boom")
        });
        assert!(err.is_err());
        // The failed block was popped; emission goes to the body again.
        b.emit(Operation::new(
            OpKind::HwConstant { value: 3 },
            vec![],
            vec![MlirValue::anon("0", MlirType::Integer(2))],
        ));
        let body = b.finish();
        assert_eq!(body.ops.len(), 1);
    }
}
