pub mod symboltable;
pub mod type_checker;

pub use symboltable::{Scope, Symbol, SymbolKind, SymbolTable};
pub use type_checker::{check_program, Pl0Type, TypeCheckResult, TypeChecker, TypeDiagnostic};
