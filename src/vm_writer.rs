//! Line-oriented writer for Nand2Tetris VM instructions.
//!
//! Thin wrapper over a buffered file handle: each call appends exactly one
//! textual line, in the fixed VM syntax, with no reordering or batching
//! visible to the caller beyond the buffering `BufWriter` already does.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub struct VmWriter {
    out: BufWriter<File>,
}

impl VmWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(VmWriter {
            out: BufWriter::new(file),
        })
    }

    pub fn push(&mut self, segment: &str, index: usize) -> io::Result<()> {
        writeln!(self.out, "push {} {}", segment, index)
    }

    pub fn pop(&mut self, segment: &str, index: usize) -> io::Result<()> {
        writeln!(self.out, "pop {} {}", segment, index)
    }

    pub fn arithmetic(&mut self, op: &str) -> io::Result<()> {
        writeln!(self.out, "{}", op)
    }

    pub fn label(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "label {}", name)
    }

    pub fn goto(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "goto {}", name)
    }

    pub fn if_goto(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "if-goto {}", name)
    }

    pub fn call(&mut self, name: &str, n_args: usize) -> io::Result<()> {
        writeln!(self.out, "call {} {}", name, n_args)
    }

    pub fn function(&mut self, name: &str, n_locals: usize) -> io::Result<()> {
        writeln!(self.out, "function {} {}", name, n_locals)
    }

    pub fn vm_return(&mut self) -> io::Result<()> {
        writeln!(self.out, "return")
    }

    /// Flush buffered output to the underlying file.
    pub fn close(mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn emits_every_instruction_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Out.vm");
        let mut w = VmWriter::create(&path).unwrap();
        w.push("constant", 3).unwrap();
        w.pop("local", 0).unwrap();
        w.arithmetic("add").unwrap();
        w.label("L1").unwrap();
        w.goto("L1").unwrap();
        w.if_goto("L2").unwrap();
        w.call("Math.multiply", 2).unwrap();
        w.function("Main.main", 0).unwrap();
        w.vm_return().unwrap();
        w.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "push constant 3",
                "pop local 0",
                "add",
                "label L1",
                "goto L1",
                "if-goto L2",
                "call Math.multiply 2",
                "function Main.main 0",
                "return",
            ]
        );
    }
}
