use crate::utils::{Pl0Error, Pl0Result};
use indexmap::IndexMap;
use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    Variable,
    Procedure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Nesting depth of the declaring scope, 0 for the program scope.
    pub level: usize,
    /// Name emitted by code generators; differs from the source name when mangled.
    pub label: String,
    pub uses: usize,
    pub assignments: usize,
}

impl Symbol {
    pub fn new(kind: SymbolKind, level: usize) -> Self {
        Self {
            kind,
            level,
            label: String::new(),
            uses: 0,
            assignments: 0,
        }
    }

    pub fn variable(level: usize) -> Self {
        Self::new(SymbolKind::Variable, level)
    }

    pub fn procedure(level: usize) -> Self {
        Self::new(SymbolKind::Procedure, level)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn is_variable(&self) -> bool {
        self.kind == SymbolKind::Variable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub name: String,
    pub symbols: IndexMap<String, Symbol>,
}

impl Scope {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: IndexMap::new(),
        }
    }
}

/// Stack of lexical scopes; lookups search innermost first.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new("main")],
        }
    }

    pub fn push_scope(&mut self, name: impl Into<String>) {
        self.scopes.push(Scope::new(name));
    }

    /// Pop the innermost scope and hand it back for inspection.
    pub fn drop_scope(&mut self) -> Pl0Result<Scope> {
        if self.scopes.len() <= 1 {
            return Err(Pl0Error::GlobalScopeDrop);
        }
        self.scopes.pop().ok_or(Pl0Error::GlobalScopeDrop)
    }

    pub fn insert(&mut self, name: &str, mut symbol: Symbol) -> Pl0Result<()> {
        if name.is_empty() {
            return Err(Pl0Error::InvalidIdentifier {
                identifier: name.to_string(),
            });
        }
        let scope = self.current_mut();
        if scope.symbols.contains_key(name) {
            return Err(Pl0Error::SymbolAlreadyDefined {
                name: name.to_string(),
                scope: scope.name.clone(),
            });
        }
        if symbol.label.is_empty() {
            symbol.label = name.to_string();
        }
        scope.symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.symbols.get_mut(name))
    }

    /// Is `name` visible from an enclosing scope other than the innermost one?
    pub fn shadows_outer(&self, name: &str) -> bool {
        let outer = self.scopes.len().saturating_sub(1);
        self.scopes[..outer].iter().any(|scope| scope.symbols.contains_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn contains_in_current(&self, name: &str) -> bool {
        self.current().symbols.contains_key(name)
    }

    pub fn current(&self) -> &Scope {
        // the program scope is never popped
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    /// Current nesting depth, 0 in the program scope.
    pub fn level(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Scope names from the program scope inwards, joined with `::`.
    pub fn path(&self) -> String {
        self.scopes.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join("::")
    }

    /// Every visible name with its symbol; inner declarations hide outer ones.
    pub fn all_symbols(&self) -> IndexMap<&str, &Symbol> {
        let mut visible = IndexMap::new();
        for scope in &self.scopes {
            for (name, symbol) in &scope.symbols {
                visible.insert(name.as_str(), symbol);
            }
        }
        visible
    }
}
