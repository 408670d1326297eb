//! Jack Compiler CLI
//!
//! Command-line interface for translating .jack source to Nand2Tetris VM
//! instructions.

use clap::{Parser as ClapParser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use jackc::CompilerConfig;

#[derive(ClapParser)]
#[command(name = "jackc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Jack compiler - translate .jack source to VM code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input .jack file or directory, for the bare `jackc <path>` form
    /// (equivalent to `jackc compile <path>`)
    input: Option<PathBuf>,

    /// Stop at the first file that fails to compile, for the bare form
    #[arg(long)]
    stop_on_error: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .jack file, or every .jack file under a directory
    Compile {
        /// Input .jack file or directory
        input: PathBuf,

        /// Stop at the first file that fails to compile (default: keep
        /// going and compile the rest)
        #[arg(long)]
        stop_on_error: bool,
    },

    /// Run the pipeline for diagnostics only; no .vm output is written
    Check {
        /// Input .jack file or directory
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let failures = match cli.command {
        Some(Commands::Compile { input, stop_on_error }) => {
            let config = CompilerConfig::new().with_keep_going(!stop_on_error);
            jackc::compile_path(&input, &config)
        }
        Some(Commands::Check { input }) => run_check(&input),
        None => match cli.input {
            Some(input) => {
                let config = CompilerConfig::new().with_keep_going(!cli.stop_on_error);
                jackc::compile_path(&input, &config)
            }
            None => {
                eprintln!("Error: no input path given (usage: jackc <path>, or jackc compile/check <path>)");
                process::exit(2);
            }
        },
    };

    if failures > 0 {
        process::exit(1);
    }
}

/// Compile to a scratch directory and discard the output - diagnostics only.
fn run_check(input: &Path) -> usize {
    let scratch = match tempfile_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: could not create scratch directory for check: {}", e);
            return 1;
        }
    };

    let files = if input.is_dir() {
        jackc::find_jack_files(input)
    } else {
        vec![input.to_path_buf()]
    };

    let mut failures = 0;
    for file in &files {
        let source = match std::fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}: I/O error: {}", file.display(), e);
                failures += 1;
                continue;
            }
        };
        let out_path = scratch.join("check.vm");
        let writer = match jackc::vm_writer::VmWriter::create(&out_path) {
            Ok(w) => w,
            Err(e) => {
                eprintln!("{}: I/O error: {}", file.display(), e);
                failures += 1;
                continue;
            }
        };
        match jackc::compiler::Compiler::new(&source, file, writer).and_then(|c| c.compile()) {
            Ok(()) => println!("OK {}", file.display()),
            Err(e) => {
                eprintln!("{}", e);
                failures += 1;
            }
        }
    }
    std::fs::remove_dir_all(&scratch).ok();
    failures
}

fn tempfile_dir() -> std::io::Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("jackc-check-{}", process::id()));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
