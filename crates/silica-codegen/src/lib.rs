//! Netlist-to-MLIR compilation.
//!
//! Compiles a structural hardware netlist into a textual MLIR program
//! using the CIRCT `hw`, `comb`, and `sv` dialects. The pipeline per
//! definition:
//!
//! 1. build a dataflow graph of modules, instances, and synthetic
//!    operators with `(driver-port, driven-port)` edges;
//! 2. visit the graph predecessors-first, lowering each node to typed
//!    MLIR ops in the module's body block;
//! 3. append hidden bind instances and trailing `sv.bind` ops;
//! 4. break feedback cycles and restore SSA dominance;
//! 5. print the finished `module { ... }`.
//!
//! Definitions are emitted in dependency order, ties broken by discovery
//! order, so the output is deterministic for a given netlist.

use std::io;

use silica_mlir::Printer;
use silica_netlist::{DefnId, Netlist};

mod bind;
mod cycles;
pub mod demos;
mod error;
mod graph;
mod iface;
mod lower;
mod unit;
mod visitor;

pub use error::CompileError;
pub use unit::TranslationUnit;

/// Caller-visible compilation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileToMlirOpts {
    /// Expand product-typed interface leaves into their constituent
    /// scalar/array leaves in module signatures.
    pub flatten_all_tuples: bool,
}

/// Compiles `top` (and its transitive dependencies) to MLIR text.
pub fn compile_to_mlir<W: io::Write>(
    netlist: &mut Netlist,
    top: DefnId,
    out: &mut W,
    opts: CompileToMlirOpts,
) -> Result<(), CompileError> {
    let mut unit = TranslationUnit::new(netlist, opts);
    unit.compile(top)?;
    let ops = unit.into_ops();
    let mut printer = Printer::new(out);
    printer.print_line("module {")?;
    printer.push();
    for op in &ops {
        op.print(&mut printer)?;
    }
    printer.pop();
    printer.print_line("}")?;
    Ok(())
}

/// [`compile_to_mlir`] into a `String`.
pub fn compile_to_string(
    netlist: &mut Netlist,
    top: DefnId,
    opts: CompileToMlirOpts,
) -> Result<String, CompileError> {
    let mut buf = Vec::new();
    compile_to_mlir(netlist, top, &mut buf, opts)?;
    Ok(String::from_utf8(buf).expect("printer emits UTF-8"))
}
