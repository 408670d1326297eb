//! File enumeration and per-file orchestration.
//!
//! Mirrors the teacher crate's `run_build`/`walkdir` split in `main.rs`:
//! a recursive directory walker (here sorted, for reproducible output
//! order) feeding a per-file compile function that the CLI prints results
//! for.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::Compiler;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::vm_writer::VmWriter;

/// Compile a single `.jack` file to its `.vm` sibling.
pub fn compile_file(path: &Path) -> Result<PathBuf, CompileError> {
    let source = fs::read_to_string(path)
        .map_err(|e| CompileError::io(path, format!("failed to read source file: {}", e)))?;

    let out_path = path.with_extension("vm");
    let writer = VmWriter::create(&out_path)
        .map_err(|e| CompileError::io(path, format!("failed to create output file: {}", e)))?;

    let compiler = Compiler::new(&source, path, writer)?;
    match compiler.compile() {
        Ok(()) => Ok(out_path),
        Err(e) => {
            // Don't leave a partial .vm file that downstream tooling could
            // mistake for a complete translation unit.
            fs::remove_file(&out_path).ok();
            Err(e)
        }
    }
}

/// Recursively collect `.jack` files under `dir`, sorted for deterministic
/// output order across platforms (§5 tightens this over raw filesystem
/// enumeration order).
pub fn find_jack_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_jack_files(dir, &mut files);
    files.sort();
    files
}

fn collect_jack_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Warning: could not read directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!(
                    "Warning: could not read directory entry in {}: {}",
                    dir.display(),
                    e
                );
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            collect_jack_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "jack") {
            out.push(path);
        }
    }
}

/// Compile `path` (a `.jack` file or a directory of them) per `config`.
///
/// Returns the number of files that failed to compile. Every failure is
/// printed to stderr as it happens; every success prints a
/// `Compiled <in> -> <out>` line, matching the teacher's `run_build`.
pub fn compile_path(path: &Path, config: &CompilerConfig) -> usize {
    let files = if path.is_dir() {
        find_jack_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    let mut failures = 0;
    for file in &files {
        match compile_file(file) {
            Ok(out) => println!("Compiled {} -> {}", file.display(), out.display()),
            Err(e) => {
                eprintln!("{}", e);
                failures += 1;
                if !config.keep_going {
                    break;
                }
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn compiles_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Main.jack");
        fs::write(&path, "class Main { function void main() { return; } }").unwrap();

        let out = compile_file(&path).unwrap();
        assert_eq!(out, path.with_extension("vm"));
        let contents = fs::read_to_string(&out).unwrap();
        assert!(contents.contains("function Main.main 0"));
    }

    #[test]
    fn removes_partial_output_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bad.jack");
        fs::write(&path, "class Bad { function void f() { let x = ; } }").unwrap();

        assert!(compile_file(&path).is_err());
        assert!(!path.with_extension("vm").exists());
    }

    #[test]
    fn directory_is_compiled_in_sorted_order_and_bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Z.jack"),
            "class Z { function void f() { return; } }",
        )
        .unwrap();
        fs::write(
            dir.path().join("A.jack"),
            "class A { function void f() { return; } }",
        )
        .unwrap();
        fs::write(dir.path().join("Bad.jack"), "class Bad {").unwrap();

        let config = CompilerConfig::default();
        let failures = compile_path(dir.path(), &config);
        assert_eq!(failures, 1);
        assert!(dir.path().join("A.vm").exists());
        assert!(dir.path().join("Z.vm").exists());
        assert!(!dir.path().join("Bad.vm").exists());
    }

    #[test]
    fn find_jack_files_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("B.jack"), "").unwrap();
        fs::write(dir.path().join("A.jack"), "").unwrap();
        let files = find_jack_files(dir.path());
        assert_eq!(
            files,
            vec![dir.path().join("A.jack"), dir.path().join("B.jack")]
        );
    }
}
