//! Jack Compiler Library
//!
//! Translates Jack source (the simple object-based language from the
//! Nand2Tetris course) to Nand2Tetris VM instructions. Each `.jack` input
//! produces a `.vm` sibling; classes compile independently, with
//! cross-class references emitted as symbolic `call`s for the VM linker to
//! resolve.
//!
//! # Pipeline
//!
//! Source text -> [`tokenizer::Tokenizer`] -> token stream ->
//! [`compiler::Compiler`] (consulting [`symbol_table::SymbolTable`],
//! emitting through [`vm_writer::VmWriter`]) -> `.vm` file.
//!
//! There is no intermediate AST: parsing and code generation are
//! interleaved, a production at a time.

pub mod compiler;
pub mod config;
pub mod driver;
pub mod error;
pub mod symbol_table;
pub mod token;
pub mod tokenizer;
pub mod vm_writer;

pub use config::CompilerConfig;
pub use driver::{compile_file, compile_path, find_jack_files};
pub use error::{CompileError, ErrorKind};
