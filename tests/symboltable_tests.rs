use pl0pipe::semantic::symboltable::{Symbol, SymbolKind, SymbolTable};
use pl0pipe::utils::errors::{Pl0Error, Pl0Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::variable(1);
        assert_eq!(symbol.kind, SymbolKind::Variable);
        assert_eq!(symbol.level, 1);
        assert_eq!(symbol.uses, 0);
        assert_eq!(symbol.assignments, 0);
        assert!(symbol.is_variable());
        assert!(!Symbol::procedure(0).is_variable());
    }

    #[test]
    fn test_symbol_table_creation() {
        let table = SymbolTable::new();
        assert_eq!(table.level(), 0);
        assert_eq!(table.path(), "main");
        assert!(table.global().symbols.is_empty());
    }

    #[test]
    fn test_insert_and_get_symbol() -> Pl0Result<()> {
        let mut table = SymbolTable::new();
        table.insert("test_var", Symbol::variable(0))?;

        let retrieved = table.get("test_var");
        assert!(retrieved.is_some());
        // label defaults to the source name
        assert_eq!(retrieved.map(|s| s.label.as_str()), Some("test_var"));
        assert!(table.get("missing").is_none());
        Ok(())
    }

    #[test]
    fn test_duplicate_in_same_scope() -> Pl0Result<()> {
        let mut table = SymbolTable::new();
        table.insert("x", Symbol::variable(0))?;
        match table.insert("x", Symbol::procedure(0)) {
            Err(Pl0Error::SymbolAlreadyDefined { name, scope }) => {
                assert_eq!(name, "x");
                assert_eq!(scope, "main");
            }
            other => panic!("Expected SymbolAlreadyDefined, got: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let mut table = SymbolTable::new();
        assert!(matches!(
            table.insert("", Symbol::variable(0)),
            Err(Pl0Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_shadowing_and_scope_drop() -> Pl0Result<()> {
        let mut table = SymbolTable::new();
        table.insert("x", Symbol::variable(0))?;
        table.insert("y", Symbol::variable(0))?;
        table.push_scope("p");
        table.insert("x", Symbol::variable(1).with_label("x_1"))?;

        assert_eq!(table.level(), 1);
        assert_eq!(table.path(), "main::p");
        assert_eq!(table.get("x").map(|s| s.level), Some(1));
        assert_eq!(table.get("y").map(|s| s.level), Some(0));
        assert!(table.shadows_outer("x"));
        assert!(!table.contains_in_current("y"));
        assert!(table.contains("y"));

        let visible = table.all_symbols();
        assert_eq!(visible.get("x").map(|s| s.label.as_str()), Some("x_1"));
        assert_eq!(visible.len(), 2);

        let scope = table.drop_scope()?;
        assert_eq!(scope.name, "p");
        assert!(scope.symbols.contains_key("x"));
        assert_eq!(table.get("x").map(|s| s.level), Some(0));
        Ok(())
    }

    #[test]
    fn test_usage_counters() -> Pl0Result<()> {
        let mut table = SymbolTable::new();
        table.insert("n", Symbol::variable(0))?;
        table.push_scope("inner");
        if let Some(symbol) = table.get_mut("n") {
            symbol.uses += 2;
            symbol.assignments += 1;
        }
        table.drop_scope()?;
        let n = table.get("n").cloned().unwrap_or_else(|| Symbol::variable(9));
        assert_eq!((n.uses, n.assignments), (2, 1));
        Ok(())
    }

    #[test]
    fn test_cannot_drop_global_scope() {
        let mut table = SymbolTable::new();
        assert!(matches!(table.drop_scope(), Err(Pl0Error::GlobalScopeDrop)));
    }
}
