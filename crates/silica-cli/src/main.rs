//! Silica compiler CLI.
//!
//! Provides the `silica` binary. Currently supports `emit`, which builds
//! one of the built-in demo circuits and prints its MLIR to stdout using
//! the same `silica_codegen::compile_to_mlir` pipeline the library
//! exposes.

use std::io;
use std::process;

use clap::{Parser, Subcommand};

use silica_codegen::{compile_to_mlir, demos, CompileToMlirOpts};

/// Silica netlist-to-MLIR compiler.
#[derive(Parser)]
#[command(name = "silica", about = "Silica netlist-to-MLIR compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compile a built-in demo circuit to MLIR on stdout.
    Emit {
        /// Demo circuit name (see `--list`).
        #[arg(short, long, default_value = "comb_logic")]
        demo: String,

        /// Expand product-typed interface leaves in signatures.
        #[arg(long)]
        flatten_all_tuples: bool,

        /// List the available demo names and exit.
        #[arg(long)]
        list: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Emit {
            demo,
            flatten_all_tuples,
            list,
        } => {
            if list {
                for name in demos::DEMO_NAMES {
                    println!("{name}");
                }
                return;
            }
            process::exit(run_emit(&demo, flatten_all_tuples));
        }
    }
}

fn run_emit(demo: &str, flatten_all_tuples: bool) -> i32 {
    let built = match demos::build(demo) {
        Some(built) => built,
        None => {
            eprintln!("unknown demo '{demo}'; available:");
            for name in demos::DEMO_NAMES {
                eprintln!("  {name}");
            }
            return 2;
        }
    };
    let (mut netlist, top) = match built {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("failed to build demo '{demo}': {err}");
            return 1;
        }
    };
    let opts = CompileToMlirOpts { flatten_all_tuples };
    let mut stdout = io::stdout().lock();
    match compile_to_mlir(&mut netlist, top, &mut stdout, opts) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("compile error: {err}");
            1
        }
    }
}
