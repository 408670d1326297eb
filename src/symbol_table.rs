//! Two-scope identifier -> (type, kind, index) table.
//!
//! Class scope holds `static`/`field` entries for the class currently being
//! compiled; subroutine scope holds `arg`/`var` entries for the subroutine
//! currently being compiled. Subroutine scope shadows class scope on
//! lookup.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Arg,
    Var,
}

impl Kind {
    /// The VM memory segment this kind is stored in.
    pub fn segment(&self) -> &'static str {
        match self {
            Kind::Static => "static",
            Kind::Field => "this",
            Kind::Arg => "argument",
            Kind::Var => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolRecord {
    pub type_name: String,
    pub kind: Kind,
    pub index: usize,
}

#[derive(Default)]
struct Scope {
    entries: HashMap<String, SymbolRecord>,
    counts: HashMap<Kind, usize>,
}

impl Scope {
    fn clear(&mut self) {
        self.entries.clear();
        self.counts.clear();
    }

    fn define(&mut self, name: &str, type_name: &str, kind: Kind) -> Result<usize, String> {
        if self.entries.contains_key(name) {
            return Err(format!("'{}' is already defined in this scope", name));
        }
        let index = *self.counts.get(&kind).unwrap_or(&0);
        self.entries.insert(
            name.to_string(),
            SymbolRecord {
                type_name: type_name.to_string(),
                kind,
                index,
            },
        );
        self.counts.insert(kind, index + 1);
        Ok(index)
    }

    fn count(&self, kind: Kind) -> usize {
        *self.counts.get(&kind).unwrap_or(&0)
    }
}

#[derive(Default)]
pub struct SymbolTable {
    class_scope: Scope,
    subroutine_scope: Scope,
    current_class: String,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Clear class scope and start tracking a new class.
    pub fn begin_class(&mut self, name: &str) {
        self.class_scope.clear();
        self.current_class = name.to_string();
    }

    /// Clear subroutine scope; methods implicitly get `this` at arg index 0.
    pub fn begin_subroutine(&mut self, is_method: bool) {
        self.subroutine_scope.clear();
        if is_method {
            // Can't fail: subroutine scope was just cleared.
            self.subroutine_scope
                .define("this", &self.current_class.clone(), Kind::Arg)
                .expect("fresh scope always accepts the receiver binding");
        }
    }

    /// Insert `name` into the scope appropriate for `kind`.
    pub fn define(&mut self, name: &str, type_name: &str, kind: Kind) -> Result<usize, String> {
        match kind {
            Kind::Static | Kind::Field => self.class_scope.define(name, type_name, kind),
            Kind::Arg | Kind::Var => self.subroutine_scope.define(name, type_name, kind),
        }
    }

    pub fn count(&self, kind: Kind) -> usize {
        match kind {
            Kind::Static | Kind::Field => self.class_scope.count(kind),
            Kind::Arg | Kind::Var => self.subroutine_scope.count(kind),
        }
    }

    /// Subroutine scope first, then class scope.
    pub fn lookup(&self, name: &str) -> Option<&SymbolRecord> {
        self.subroutine_scope
            .entries
            .get(name)
            .or_else(|| self.class_scope.entries.get(name))
    }
}
