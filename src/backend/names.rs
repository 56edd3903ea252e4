// Maps source names to emitted names through the lexical scope chain.

use crate::semantic::symboltable::{Symbol, SymbolKind, SymbolTable};
use crate::utils::config::names::rename_identifier;
use std::collections::HashSet;
use tracing::debug;

/// Every declaration gets a label unique across the whole program, so a
/// backend may hoist variables or procedures to file scope without clashes.
pub struct NameResolver {
    table: SymbolTable,
    used: HashSet<String>,
    reserved: &'static HashSet<&'static str>,
    prefix: &'static str,
    frame: usize,
}

impl NameResolver {
    pub fn new(reserved: &'static HashSet<&'static str>) -> Self {
        Self::with_prefix(reserved, "")
    }

    /// Labels of variables get `prefix` prepended.
    pub fn with_prefix(reserved: &'static HashSet<&'static str>, prefix: &'static str) -> Self {
        Self {
            table: SymbolTable::new(),
            used: HashSet::new(),
            reserved,
            prefix,
            frame: 0,
        }
    }

    fn unique(&mut self, base: String) -> String {
        let mut label = base.clone();
        let mut n = 1;
        while self.used.contains(&label) || self.reserved.contains(label.as_str()) {
            label = format!("{}_{}", base, n);
            n += 1;
        }
        self.used.insert(label.clone());
        label
    }

    /// Declare `name` in the innermost scope and return its label. A repeated
    /// declaration in the same scope keeps the first label.
    pub fn declare(&mut self, name: &str, kind: SymbolKind) -> String {
        if self.table.contains_in_current(name) {
            return self.resolve(name);
        }
        let base = match kind {
            SymbolKind::Variable => format!("{}{}", self.prefix, rename_identifier(name, self.reserved)),
            SymbolKind::Procedure => rename_identifier(name, self.reserved),
        };
        let label = self.unique(base);
        if label != name {
            debug!(name, label = %label, "renamed identifier");
        }
        // insert only fails on a duplicate, ruled out above
        let _ = self.table.insert(name, Symbol::new(kind, self.frame).with_label(label.clone()));
        label
    }

    /// Enter a procedure body: a new scope and a new frame.
    pub fn enter_procedure(&mut self, name: &str) {
        self.table.push_scope(name);
        self.frame += 1;
    }

    pub fn leave_procedure(&mut self) {
        if self.table.drop_scope().is_ok() {
            self.frame -= 1;
        }
    }

    /// Enter a nested block scope; the frame stays the same.
    pub fn enter_block(&mut self) {
        self.table.push_scope("block");
    }

    pub fn leave_block(&mut self) {
        let _ = self.table.drop_scope();
    }

    /// Label for `name`, or the name itself when nothing declares it.
    pub fn resolve(&self, name: &str) -> String {
        self.table
            .get(name)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.table.get(name)
    }

    /// Procedure nesting depth, 0 for the program body.
    pub fn frame(&self) -> usize {
        self.frame
    }
}
