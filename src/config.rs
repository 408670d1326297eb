//! Compiler configuration.
//!
//! A small builder-pattern struct in the same spirit as the teacher
//! crate's `CompilerConfig`: most fields are simple flags today, but the
//! builder shape keeps the door open for future knobs without breaking
//! callers.

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// When compiling a directory, keep compiling remaining files after one
    /// fails instead of stopping at the first error.
    pub keep_going: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig { keep_going: true }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }
}
