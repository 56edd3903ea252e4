//! Scope-aware type inference and checking.
//!
//! Every expression gets one of a handful of types. A name that fails to
//! resolve is typed `error` and is reported once per scope; anything built
//! on an `error` operand stays `error` without further diagnostics.

use crate::ast::{BinaryOp, Block, Expression, Statement};
use crate::semantic::symboltable::{Scope, Symbol, SymbolKind, SymbolTable};
use crate::utils::string_utils::heading;
use serde::Serialize;
use std::collections::HashSet;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum Pl0Type {
    Integer,
    Boolean,
    Unknown,
    Error,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDiagnostic {
    pub level: DiagnosticLevel,
    pub scope: String,
    pub text: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeCheckResult {
    pub diagnostics: Vec<TypeDiagnostic>,
    /// Every scope as it looked when it was closed, program scope last.
    pub scopes: Vec<(String, Scope)>,
    pub expressions_checked: usize,
}

impl TypeCheckResult {
    pub fn errors(&self) -> impl Iterator<Item = &TypeDiagnostic> {
        self.diagnostics.iter().filter(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &TypeDiagnostic> {
        self.diagnostics.iter().filter(|d| d.level == DiagnosticLevel::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn symbol_count(&self) -> usize {
        self.scopes.iter().map(|(_, s)| s.symbols.len()).sum()
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Type Checking Report");
        out.push_str(&format!("Scopes analysed:      {}\n", self.scopes.len()));
        out.push_str(&format!("Symbols declared:     {}\n", self.symbol_count()));
        out.push_str(&format!("Expressions checked:  {}\n", self.expressions_checked));
        out.push_str(&format!("Errors:               {}\n", self.error_count()));
        out.push_str(&format!("Warnings:             {}\n", self.warning_count()));
        out.push('\n');
        if self.error_count() == 0 {
            out.push_str("Result: program is well typed\n");
        } else {
            out.push_str("Result: type errors found\n");
        }
        out
    }

    pub fn analysis(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Detailed Type Analysis");
        for (path, scope) in &self.scopes {
            out.push_str(&format!("\nScope {}\n", path));
            if scope.symbols.is_empty() {
                out.push_str("  (no declarations)\n");
                continue;
            }
            for (name, symbol) in &scope.symbols {
                let ty = match symbol.kind {
                    SymbolKind::Variable => Pl0Type::Integer,
                    SymbolKind::Procedure => Pl0Type::Void,
                };
                out.push_str(&format!(
                    "  {:<16} {:<10} {:<8} uses={} assignments={}\n",
                    name, symbol.kind, ty, symbol.uses, symbol.assignments
                ));
            }
        }
        out
    }

    pub fn error_listing(&self) -> String {
        if self.diagnostics.is_empty() {
            return "No type errors found\n".to_string();
        }
        let mut out = String::new();
        for d in &self.diagnostics {
            out.push_str(&format!("[{}] {}: {}\n", d.level, d.scope, d.text));
            if let Some(suggestion) = &d.suggestion {
                out.push_str(&format!("    hint: {}\n", suggestion));
            }
        }
        out
    }
}

pub struct TypeChecker {
    table: SymbolTable,
    result: TypeCheckResult,
    reported: HashSet<String>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            result: TypeCheckResult::default(),
            reported: HashSet::new(),
        }
    }

    pub fn check(mut self, program: &Block) -> TypeCheckResult {
        self.check_block(program);
        let global = self.table.global().clone();
        self.close_scope(global);
        self.result
    }

    fn error(&mut self, text: String, suggestion: Option<String>) {
        self.push(DiagnosticLevel::Error, text, suggestion);
    }

    fn warning(&mut self, text: String) {
        self.push(DiagnosticLevel::Warning, text, None);
    }

    fn push(&mut self, level: DiagnosticLevel, text: String, suggestion: Option<String>) {
        self.result.diagnostics.push(TypeDiagnostic {
            level,
            scope: self.table.path(),
            text,
            suggestion,
        });
    }

    fn declare(&mut self, name: &str, symbol: Symbol) {
        if let Err(e) = self.table.insert(name, symbol) {
            self.error(format!("Redeclaration: {}", e), Some(format!("rename one of the '{}' declarations", name)));
        }
    }

    fn check_block(&mut self, block: &Block) {
        let level = self.table.level();
        for name in &block.variables {
            self.declare(name, Symbol::variable(level));
        }
        for procedure in &block.procedures {
            self.declare(&procedure.name, Symbol::procedure(level));
        }
        for procedure in &block.procedures {
            self.table.push_scope(procedure.name.clone());
            self.check_block(&procedure.body);
            self.pop_scope();
        }
        self.check_statement(&block.statement);
    }

    fn pop_scope(&mut self) {
        let path = self.table.path();
        if let Ok(scope) = self.table.drop_scope() {
            self.close_scope_at(path, scope);
        }
    }

    fn close_scope(&mut self, scope: Scope) {
        let path = self.table.path();
        self.close_scope_at(path, scope);
    }

    fn close_scope_at(&mut self, path: String, scope: Scope) {
        for (name, symbol) in &scope.symbols {
            if !symbol.is_variable() {
                continue;
            }
            let text = if symbol.uses == 0 && symbol.assignments == 0 {
                format!("Variable '{}' is declared but never used", name)
            } else if symbol.uses > 0 && symbol.assignments == 0 {
                format!("Variable '{}' is used but never assigned", name)
            } else {
                continue;
            };
            self.result.diagnostics.push(TypeDiagnostic {
                level: DiagnosticLevel::Warning,
                scope: path.clone(),
                text,
                suggestion: None,
            });
        }
        self.result.scopes.push((path, scope));
    }

    /// Report an unresolved name once per scope.
    fn report_unresolved(&mut self, name: &str, text: String, suggestion: String) {
        let key = format!("{}::{}", self.table.path(), name);
        if self.reported.insert(key) {
            self.error(text, Some(suggestion));
        }
    }

    fn check_target(&mut self, var: &str, value: Pl0Type, action: &str) {
        match self.table.get_mut(var) {
            Some(symbol) if symbol.is_variable() => {
                symbol.assignments += 1;
                if value == Pl0Type::Boolean {
                    self.error(
                        format!("Type mismatch: cannot {} boolean value to integer variable '{}'", action, var),
                        None,
                    );
                }
            }
            Some(_) => self.error(format!("Cannot {} procedure '{}'", action, var), None),
            None => self.report_unresolved(
                var,
                format!("Variable '{}' used before declaration", var),
                format!("declare '{}' with 'var {};'", var, var),
            ),
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Assign { var, expr } => {
                let ty = self.infer(expr);
                self.check_target(var, ty, "assign");
            }
            Statement::Read { var } => self.check_target(var, Pl0Type::Integer, "read into"),
            Statement::Call { proc } => match self.table.get_mut(proc) {
                Some(symbol) if symbol.kind == SymbolKind::Procedure => symbol.uses += 1,
                Some(_) => self.error(format!("'{}' is a variable and cannot be called", proc), None),
                None => self.report_unresolved(
                    proc,
                    format!("Call to undeclared procedure '{}'", proc),
                    format!("declare 'procedure {};' before calling it", proc),
                ),
            },
            Statement::Write { expr } => {
                if self.infer(expr) == Pl0Type::Boolean {
                    self.warning("Writing a boolean value; it is printed as 0 or 1".to_string());
                }
            }
            Statement::Compound { statements } => {
                for s in statements {
                    self.check_statement(s);
                }
            }
            Statement::NestedBlock {
                variables,
                statements,
            } => {
                self.table.push_scope("block");
                let level = self.table.level();
                for name in variables {
                    self.declare(name, Symbol::variable(level));
                }
                for s in statements {
                    self.check_statement(s);
                }
                self.pop_scope();
            }
            Statement::If { condition, then } => {
                self.check_condition(condition, "IF");
                self.check_statement(then);
            }
            Statement::While { condition, body } => {
                self.check_condition(condition, "WHILE");
                self.check_statement(body);
            }
        }
    }

    fn check_condition(&mut self, condition: &Expression, construct: &str) {
        let ty = self.infer(condition);
        if ty != Pl0Type::Boolean && ty != Pl0Type::Error {
            self.error(
                format!("{} condition must be boolean, found {}", construct, ty),
                Some("use a comparison such as 'x > 0'".to_string()),
            );
        }
    }

    pub(crate) fn infer(&mut self, expr: &Expression) -> Pl0Type {
        self.result.expressions_checked += 1;
        match expr {
            Expression::Number(_) => Pl0Type::Integer,
            Expression::Variable(name) => match self.table.get_mut(name) {
                Some(symbol) if symbol.is_variable() => {
                    symbol.uses += 1;
                    Pl0Type::Integer
                }
                Some(_) => {
                    self.report_unresolved(
                        name,
                        format!("Procedure '{}' cannot be used as a value", name),
                        "call the procedure with 'call' instead".to_string(),
                    );
                    Pl0Type::Error
                }
                None => {
                    self.report_unresolved(
                        name,
                        format!("Variable '{}' used before declaration", name),
                        format!("declare '{}' with 'var {};'", name, name),
                    );
                    Pl0Type::Error
                }
            },
            Expression::Operation { op, left, right } => {
                let lt = self.infer(left);
                let rt = self.infer(right);
                if lt == Pl0Type::Error || rt == Pl0Type::Error {
                    return Pl0Type::Error;
                }
                self.infer_operation(*op, lt, rt)
            }
        }
    }

    fn infer_operation(&mut self, op: BinaryOp, lt: Pl0Type, rt: Pl0Type) -> Pl0Type {
        if op.is_comparison() {
            if lt != rt {
                self.error(
                    format!("Comparison '{}' requires operands of the same type, found {} and {}", op, lt, rt),
                    None,
                );
                return Pl0Type::Error;
            }
            return Pl0Type::Boolean;
        }
        if lt != Pl0Type::Integer || rt != Pl0Type::Integer {
            self.error(
                format!("Arithmetic operator '{}' requires integer operands, found {} and {}", op, lt, rt),
                None,
            );
            return Pl0Type::Error;
        }
        Pl0Type::Integer
    }
}

/// Check a whole program.
pub fn check_program(program: &Block) -> TypeCheckResult {
    TypeChecker::new().check(program)
}
