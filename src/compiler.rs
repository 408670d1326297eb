//! Recursive-descent parser + code generator for Jack, interleaved per
//! production with no intermediate AST - the same coupling style the
//! teacher crate uses between its parser and codegen modules (tokens drive
//! emission directly).
//!
//! A fresh [`Compiler`] is constructed per input file so the symbol table,
//! label counter, and current class name all start clean.

use std::path::{Path, PathBuf};

use crate::error::{CompileError, ErrorKind};
use crate::symbol_table::{Kind, SymbolTable};
use crate::token::{Keyword, Token, TokenKind};
use crate::tokenizer::Tokenizer;
use crate::vm_writer::VmWriter;

pub struct Compiler {
    tokens: Tokenizer,
    symbols: SymbolTable,
    writer: VmWriter,
    file: PathBuf,
    class_name: String,
    label_counter: usize,
}

type Result<T> = std::result::Result<T, CompileError>;

impl Compiler {
    pub fn new(source: &str, file: &Path, writer: VmWriter) -> Result<Self> {
        let tokens = Tokenizer::new(source).map_err(|e| e.with_file(file))?;
        Ok(Compiler {
            tokens,
            symbols: SymbolTable::new(),
            writer,
            file: file.to_path_buf(),
            class_name: String::new(),
            label_counter: 0,
        })
    }

    /// Compile the single class in the token stream and close the output.
    pub fn compile(mut self) -> Result<()> {
        self.compile_class()?;
        self.writer
            .close()
            .map_err(|e| CompileError::io(&self.file, e.to_string()))
    }

    // -- error helpers --------------------------------------------------

    fn err(&self, tok: &Token, kind: ErrorKind, message: impl Into<String>) -> CompileError {
        CompileError::new(&self.file, tok.line, kind, message.into())
    }

    fn syntax_err(&self, tok: &Token, message: impl Into<String>) -> CompileError {
        self.err(tok, ErrorKind::Syntax, message)
    }

    fn io_err<E: std::fmt::Display>(&self, e: E) -> CompileError {
        CompileError::io(&self.file, e.to_string())
    }

    // -- token helpers ----------------------------------------------------

    fn advance(&mut self) -> Token {
        self.tokens.advance()
    }

    fn peek(&self) -> Token {
        self.tokens.peek().clone()
    }

    fn expect_symbol(&mut self, c: char) -> Result<()> {
        let tok = self.advance();
        if tok.is_symbol(c) {
            Ok(())
        } else {
            Err(self.syntax_err(&tok, format!("expected '{}', found {}", c, tok.describe())))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token> {
        let tok = self.advance();
        if tok.is_keyword(kw) {
            Ok(tok)
        } else {
            Err(self.syntax_err(&tok, format!("expected '{}', found {}", kw, tok.describe())))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let tok = self.advance();
        match tok.as_identifier() {
            Some(name) => Ok(name.to_string()),
            None => Err(self.syntax_err(&tok, format!("expected identifier, found {}", tok.describe()))),
        }
    }

    /// `int | char | boolean | ClassName`
    fn parse_type(&mut self) -> Result<String> {
        let tok = self.advance();
        match &tok.kind {
            TokenKind::Keyword(Keyword::Int) => Ok("int".to_string()),
            TokenKind::Keyword(Keyword::Char) => Ok("char".to_string()),
            TokenKind::Keyword(Keyword::Boolean) => Ok("boolean".to_string()),
            TokenKind::Identifier(name) => Ok(name.clone()),
            _ => Err(self.syntax_err(&tok, format!("expected a type, found {}", tok.describe()))),
        }
    }

    fn fresh_label_pair(&mut self) -> (String, String) {
        let l1 = format!("{}_{}", self.class_name, self.label_counter);
        self.label_counter += 1;
        let l2 = format!("{}_{}", self.class_name, self.label_counter);
        self.label_counter += 1;
        (l1, l2)
    }

    // -- §4.3.1 class -----------------------------------------------------

    fn compile_class(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Class)?;
        let name = self.expect_identifier()?;
        self.class_name = name.clone();
        self.symbols.begin_class(&name);
        self.expect_symbol('{')?;

        while matches!(
            self.peek().kind,
            TokenKind::Keyword(Keyword::Static) | TokenKind::Keyword(Keyword::Field)
        ) {
            self.compile_class_var_dec()?;
        }

        while matches!(
            self.peek().kind,
            TokenKind::Keyword(Keyword::Constructor)
                | TokenKind::Keyword(Keyword::Function)
                | TokenKind::Keyword(Keyword::Method)
        ) {
            self.compile_subroutine_dec()?;
        }

        self.expect_symbol('}')?;
        Ok(())
    }

    /// `('static'|'field') type varName (',' varName)* ';'`
    fn compile_class_var_dec(&mut self) -> Result<()> {
        let kw_tok = self.advance();
        let kind = match kw_tok.kind {
            TokenKind::Keyword(Keyword::Static) => Kind::Static,
            TokenKind::Keyword(Keyword::Field) => Kind::Field,
            _ => return Err(self.syntax_err(&kw_tok, "expected 'static' or 'field'")),
        };
        let type_name = self.parse_type()?;

        loop {
            let name_tok = self.peek();
            let name = self.expect_identifier()?;
            self.symbols
                .define(&name, &type_name, kind)
                .map_err(|e| self.err(&name_tok, ErrorKind::Name, e))?;

            if self.peek().is_symbol(',') {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_symbol(';')?;
        Ok(())
    }

    // -- §4.3.2 subroutine declaration -------------------------------------

    fn compile_subroutine_dec(&mut self) -> Result<()> {
        let kind_tok = self.advance();
        let is_method = kind_tok.is_keyword(Keyword::Method);
        let is_constructor = kind_tok.is_keyword(Keyword::Constructor);

        // Return type: void or a type. Not otherwise used by codegen.
        if self.peek().is_keyword(Keyword::Void) {
            self.advance();
        } else {
            self.parse_type()?;
        }

        let sub_name = self.expect_identifier()?;
        self.symbols.begin_subroutine(is_method);

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.expect_symbol('{')?;
        while self.peek().is_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }
        let n_locals = self.symbols.count(Kind::Var);

        self.writer
            .function(&format!("{}.{}", self.class_name, sub_name), n_locals)
            .map_err(|e| self.io_err(e))?;

        if is_constructor {
            let n_fields = self.symbols.count(Kind::Field);
            self.writer.push("constant", n_fields).map_err(|e| self.io_err(e))?;
            self.writer.call("Memory.alloc", 1).map_err(|e| self.io_err(e))?;
            self.writer.pop("pointer", 0).map_err(|e| self.io_err(e))?;
        } else if is_method {
            self.writer.push("argument", 0).map_err(|e| self.io_err(e))?;
            self.writer.pop("pointer", 0).map_err(|e| self.io_err(e))?;
        }

        self.compile_statements()?;
        self.expect_symbol('}')?;
        Ok(())
    }

    /// `((type varName) (',' type varName)*)?`
    fn compile_parameter_list(&mut self) -> Result<()> {
        if self.peek().is_symbol(')') {
            return Ok(());
        }
        loop {
            let type_name = self.parse_type()?;
            let name_tok = self.peek();
            let name = self.expect_identifier()?;
            self.symbols
                .define(&name, &type_name, Kind::Arg)
                .map_err(|e| self.err(&name_tok, ErrorKind::Name, e))?;

            if self.peek().is_symbol(',') {
                self.advance();
                continue;
            }
            break;
        }
        Ok(())
    }

    /// `'var' type varName (',' varName)* ';'`
    fn compile_var_dec(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Var)?;
        let type_name = self.parse_type()?;
        loop {
            let name_tok = self.peek();
            let name = self.expect_identifier()?;
            self.symbols
                .define(&name, &type_name, Kind::Var)
                .map_err(|e| self.err(&name_tok, ErrorKind::Name, e))?;

            if self.peek().is_symbol(',') {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_symbol(';')?;
        Ok(())
    }

    // -- §4.3.3 statements --------------------------------------------------

    fn compile_statements(&mut self) -> Result<()> {
        loop {
            match self.peek().kind {
                TokenKind::Keyword(Keyword::Let) => self.compile_let()?,
                TokenKind::Keyword(Keyword::If) => self.compile_if()?,
                TokenKind::Keyword(Keyword::While) => self.compile_while()?,
                TokenKind::Keyword(Keyword::Do) => self.compile_do()?,
                TokenKind::Keyword(Keyword::Return) => self.compile_return()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn resolve(&self, tok: &Token, name: &str) -> Result<(String, usize)> {
        match self.symbols.lookup(name) {
            Some(rec) => Ok((rec.kind.segment().to_string(), rec.index)),
            None => Err(self.err(tok, ErrorKind::Name, format!("undefined variable '{}'", name))),
        }
    }

    fn compile_let(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Let)?;
        let name_tok = self.peek();
        let name = self.expect_identifier()?;
        let (segment, index) = self.resolve(&name_tok, &name)?;

        if self.peek().is_symbol('[') {
            self.advance();
            self.writer.push(&segment, index).map_err(|e| self.io_err(e))?;
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.writer.arithmetic("add").map_err(|e| self.io_err(e))?;

            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            self.writer.pop("temp", 0).map_err(|e| self.io_err(e))?;
            self.writer.pop("pointer", 1).map_err(|e| self.io_err(e))?;
            self.writer.push("temp", 0).map_err(|e| self.io_err(e))?;
            self.writer.pop("that", 0).map_err(|e| self.io_err(e))?;
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;
            self.writer.pop(&segment, index).map_err(|e| self.io_err(e))?;
        }
        Ok(())
    }

    fn compile_if(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::If)?;
        let (l1, l2) = self.fresh_label_pair();

        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        self.writer.arithmetic("not").map_err(|e| self.io_err(e))?;
        self.writer.if_goto(&l1).map_err(|e| self.io_err(e))?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.writer.goto(&l2).map_err(|e| self.io_err(e))?;
        self.writer.label(&l1).map_err(|e| self.io_err(e))?;

        if self.peek().is_keyword(Keyword::Else) {
            self.advance();
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
        }

        self.writer.label(&l2).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    fn compile_while(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::While)?;
        let (l1, l2) = self.fresh_label_pair();

        self.writer.label(&l1).map_err(|e| self.io_err(e))?;

        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        self.writer.arithmetic("not").map_err(|e| self.io_err(e))?;
        self.writer.if_goto(&l2).map_err(|e| self.io_err(e))?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.writer.goto(&l1).map_err(|e| self.io_err(e))?;
        self.writer.label(&l2).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    fn compile_do(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Do)?;
        self.compile_subroutine_call()?;
        self.expect_symbol(';')?;
        self.writer.pop("temp", 0).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    fn compile_return(&mut self) -> Result<()> {
        self.expect_keyword(Keyword::Return)?;
        if self.peek().is_symbol(';') {
            self.writer.push("constant", 0).map_err(|e| self.io_err(e))?;
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.writer.vm_return().map_err(|e| self.io_err(e))?;
        Ok(())
    }

    // -- §4.3.4 expressions ---------------------------------------------

    fn compile_expression(&mut self) -> Result<()> {
        self.compile_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Symbol(c) if "+-&|<>=*/".contains(c) => c,
                _ => break,
            };
            self.advance();
            self.compile_term()?;
            self.emit_binary_op(op)?;
        }
        Ok(())
    }

    fn emit_binary_op(&mut self, op: char) -> Result<()> {
        match op {
            '+' => self.writer.arithmetic("add"),
            '-' => self.writer.arithmetic("sub"),
            '&' => self.writer.arithmetic("and"),
            '|' => self.writer.arithmetic("or"),
            '<' => self.writer.arithmetic("lt"),
            '>' => self.writer.arithmetic("gt"),
            '=' => self.writer.arithmetic("eq"),
            '*' => self.writer.call("Math.multiply", 2),
            '/' => self.writer.call("Math.divide", 2),
            _ => unreachable!("dispatch only reaches known binary operators"),
        }
        .map_err(|e| self.io_err(e))
    }

    // -- §4.3.5 terms -----------------------------------------------------

    fn compile_term(&mut self) -> Result<()> {
        let tok = self.peek();
        match &tok.kind {
            TokenKind::IntegerConstant(n) => {
                self.advance();
                self.writer.push("constant", *n as usize).map_err(|e| self.io_err(e))
            }
            TokenKind::StringConstant(s) => {
                let s = s.clone();
                self.advance();
                self.writer
                    .push("constant", s.chars().count())
                    .map_err(|e| self.io_err(e))?;
                self.writer.call("String.new", 1).map_err(|e| self.io_err(e))?;
                for ch in s.chars() {
                    self.writer
                        .push("constant", ch as usize)
                        .map_err(|e| self.io_err(e))?;
                    self.writer.call("String.appendChar", 2).map_err(|e| self.io_err(e))?;
                }
                Ok(())
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                self.writer.push("constant", 0).map_err(|e| self.io_err(e))?;
                self.writer.arithmetic("not").map_err(|e| self.io_err(e))
            }
            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                self.writer.push("constant", 0).map_err(|e| self.io_err(e))
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                self.writer.push("pointer", 0).map_err(|e| self.io_err(e))
            }
            TokenKind::Symbol('-') => {
                self.advance();
                self.compile_term()?;
                self.writer.arithmetic("neg").map_err(|e| self.io_err(e))
            }
            TokenKind::Symbol('~') => {
                self.advance();
                self.compile_term()?;
                self.writer.arithmetic("not").map_err(|e| self.io_err(e))
            }
            TokenKind::Symbol('(') => {
                self.advance();
                self.compile_expression()?;
                self.expect_symbol(')')
            }
            TokenKind::Identifier(_) => self.compile_identifier_term(),
            _ => Err(self.syntax_err(&tok, format!("expected a term, found {}", tok.describe()))),
        }
    }

    /// An identifier term is a variable reference, array element, or
    /// subroutine call - disambiguated by looking one token further ahead.
    fn compile_identifier_term(&mut self) -> Result<()> {
        let next = self.tokens.peek_second().clone();
        if next.is_symbol('[') {
            let name_tok = self.advance();
            let name = name_tok.as_identifier().unwrap().to_string();
            let (segment, index) = self.resolve(&name_tok, &name)?;

            self.advance(); // '['
            self.writer.push(&segment, index).map_err(|e| self.io_err(e))?;
            self.compile_expression()?;
            self.expect_symbol(']')?;

            self.writer.arithmetic("add").map_err(|e| self.io_err(e))?;
            self.writer.pop("pointer", 1).map_err(|e| self.io_err(e))?;
            self.writer.push("that", 0).map_err(|e| self.io_err(e))
        } else if next.is_symbol('(') || next.is_symbol('.') {
            self.compile_subroutine_call()
        } else {
            let name_tok = self.advance();
            let name = name_tok.as_identifier().unwrap().to_string();
            let (segment, index) = self.resolve(&name_tok, &name)?;
            self.writer.push(&segment, index).map_err(|e| self.io_err(e))
        }
    }

    // -- §4.3.6 subroutine calls ------------------------------------------

    fn compile_subroutine_call(&mut self) -> Result<()> {
        let first = self.expect_identifier()?;

        if self.peek().is_symbol('(') {
            // Unqualified call: implicit method call on the current receiver.
            self.writer.push("pointer", 0).map_err(|e| self.io_err(e))?;
            self.advance();
            let n = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            self.writer
                .call(&format!("{}.{}", self.class_name, first), n + 1)
                .map_err(|e| self.io_err(e))
        } else {
            self.expect_symbol('.')?;
            let sub_name = self.expect_identifier()?;
            self.expect_symbol('(')?;

            if let Some(rec) = self.symbols.lookup(&first) {
                let segment = rec.kind.segment().to_string();
                let index = rec.index;
                let type_name = rec.type_name.clone();
                self.writer.push(&segment, index).map_err(|e| self.io_err(e))?;
                let n = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer
                    .call(&format!("{}.{}", type_name, sub_name), n + 1)
                    .map_err(|e| self.io_err(e))
            } else {
                let n = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer
                    .call(&format!("{}.{}", first, sub_name), n)
                    .map_err(|e| self.io_err(e))
            }
        }
    }

    fn compile_expression_list(&mut self) -> Result<usize> {
        if self.peek().is_symbol(')') {
            return Ok(0);
        }
        let mut n = 1;
        self.compile_expression()?;
        while self.peek().is_symbol(',') {
            self.advance();
            self.compile_expression()?;
            n += 1;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn compile_to_string(src: &str) -> String {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("Out.vm");
        let writer = VmWriter::create(&out_path).unwrap();
        let compiler = Compiler::new(src, Path::new("Out.jack"), writer).unwrap();
        compiler.compile().unwrap();
        fs::read_to_string(&out_path).unwrap()
    }

    fn lines(src: &str) -> Vec<String> {
        compile_to_string(src).lines().map(str::to_string).collect()
    }

    #[test]
    fn scenario_simple_function() {
        let out = lines("class A { function int f() { return 3; } }");
        assert_eq!(out, vec!["function A.f 0", "push constant 3", "return"]);
    }

    #[test]
    fn scenario_method_assignment() {
        let out = lines(
            "class P { field int x; method void set(int v) { let x = v; return; } }",
        );
        assert_eq!(
            out,
            vec![
                "function P.set 0",
                "push argument 0",
                "pop pointer 0",
                "push argument 1",
                "pop this 0",
                "push constant 0",
                "return",
            ]
        );
    }

    #[test]
    fn scenario_constructor_with_field() {
        let out = lines(
            "class P { field int x; constructor P new(int a) { let x = a; return this; } }",
        );
        assert_eq!(
            out,
            vec![
                "function P.new 0",
                "push constant 1",
                "call Memory.alloc 1",
                "pop pointer 0",
                "push argument 0",
                "pop this 0",
                "push pointer 0",
                "return",
            ]
        );
    }

    #[test]
    fn expression_has_no_operator_precedence() {
        let out = lines("class A { function int f() { return 2 + 3 * 4; } }");
        assert_eq!(
            out,
            vec![
                "function A.f 0",
                "push constant 2",
                "push constant 3",
                "add",
                "push constant 4",
                "call Math.multiply 2",
                "return",
            ]
        );
    }

    #[test]
    fn array_assignment() {
        let out = lines(
            "class A { function void f(int i) { \
             var Array a; var int v; let a[i] = v; return; } }",
        );
        assert_eq!(
            out,
            vec![
                "function A.f 2",
                "push local 0",
                "push argument 0",
                "add",
                "push local 1",
                "pop temp 0",
                "pop pointer 1",
                "push temp 0",
                "pop that 0",
                "push constant 0",
                "return",
            ]
        );
    }

    #[test]
    fn do_call_discards_return_value() {
        let out = lines(
            "class A { function void f(int x1, int y1, int x2, int y2) { \
             do Screen.drawRectangle(x1, y1, x2, y2); return; } }",
        );
        assert_eq!(
            out,
            vec![
                "function A.f 0",
                "push argument 0",
                "push argument 1",
                "push argument 2",
                "push argument 3",
                "call Screen.drawRectangle 4",
                "pop temp 0",
                "push constant 0",
                "return",
            ]
        );
    }

    #[test]
    fn unqualified_call_is_method_call_on_current_receiver() {
        let out = lines(
            "class A { method void helper() { return; } \
             method void f() { do helper(); return; } }",
        );
        assert!(out.contains(&"push pointer 0".to_string()));
        assert!(out.contains(&"call A.helper 1".to_string()));
    }

    #[test]
    fn if_else_labels_are_distinct_and_each_referenced_twice() {
        let out = compile_to_string(
            "class A { function void f(boolean b) { if (b) { let b = false; } else { let b = true; } return; } }",
        );
        let label_count = out.matches("label A_0").count();
        let label_count2 = out.matches("label A_1").count();
        assert_eq!(label_count, 1);
        assert_eq!(label_count2, 1);
        // Each label is additionally referenced once as a branch target.
        assert_eq!(out.matches("A_0").count(), 2);
        assert_eq!(out.matches("A_1").count(), 2);
    }

    #[test]
    fn while_loop_shape() {
        let out = lines(
            "class A { function void f() { var int x; while (true) { let x = 1; } return; } }",
        );
        assert!(out[1] == "label A_0");
        assert!(out.last().unwrap() == "return");
    }

    #[test]
    fn multiple_var_names_share_declared_type() {
        let out = lines(
            "class A { function int f() { var int x, y; let x = 1; let y = 2; return x + y; } }",
        );
        assert_eq!(
            out,
            vec![
                "function A.f 2",
                "push constant 1",
                "pop local 0",
                "push constant 2",
                "pop local 1",
                "push local 0",
                "push local 1",
                "add",
                "return",
            ]
        );
    }

    #[test]
    fn undefined_variable_is_name_error() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("Out.vm");
        let writer = VmWriter::create(&out_path).unwrap();
        let compiler =
            Compiler::new("class A { function void f() { let y = 1; return; } }", Path::new("A.jack"), writer)
                .unwrap();
        let err = compiler.compile().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
    }

    #[test]
    fn malformed_syntax_is_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("Out.vm");
        let writer = VmWriter::create(&out_path).unwrap();
        let compiler =
            Compiler::new("class A { function void f() return; } }", Path::new("A.jack"), writer).unwrap();
        let err = compiler.compile().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn malformed_do_call_is_syntax_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("Out.vm");
        let writer = VmWriter::create(&out_path).unwrap();
        let compiler =
            Compiler::new("class A { function void f() { do 5(); return; } }", Path::new("A.jack"), writer)
                .unwrap();
        let err = compiler.compile().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }
}
