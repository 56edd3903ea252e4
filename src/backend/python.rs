//! Python backend.
//!
//! Program variables are module globals, procedures become nested `def`s so
//! locals keep per-call semantics, and assignments to outer names get the
//! matching `global` or `nonlocal` declaration.

use super::emitter::CodeBuffer;
use super::names::NameResolver;
use super::CodeGenerator;
use crate::ast::{BinaryOp, Block, Expression, Statement};
use crate::semantic::SymbolKind;
use crate::utils::config::names::PYTHON_RESERVED;
use crate::utils::errors::Pl0Result;
use indexmap::IndexSet;

const DIV_HELPER: &[&str] = &[
    "def _div(a, b):",
    "    q = abs(a) // abs(b)",
    "    return q if (a >= 0) == (b >= 0) else -q",
];

/// Outer names a function body assigns to.
#[derive(Default)]
struct FrameDecls {
    globals: IndexSet<String>,
    nonlocals: IndexSet<String>,
}

pub struct PythonGenerator {
    resolver: NameResolver,
    module_vars: Vec<String>,
    uses_division: bool,
}

impl Default for PythonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonGenerator {
    pub fn new() -> Self {
        Self {
            resolver: NameResolver::new(&PYTHON_RESERVED),
            module_vars: Vec::new(),
            uses_division: false,
        }
    }

    /// Emit `def <label>():` for every procedure of `block` into `out`.
    fn procedures(&mut self, out: &mut CodeBuffer, block: &Block) {
        let labels: Vec<String> = block
            .procedures
            .iter()
            .map(|p| self.resolver.declare(&p.name, SymbolKind::Procedure))
            .collect();
        for (procedure, label) in block.procedures.iter().zip(labels) {
            self.resolver.enter_procedure(&procedure.name);
            let mut locals = Vec::new();
            for name in &procedure.body.variables {
                locals.push(self.resolver.declare(name, SymbolKind::Variable));
            }
            let mut body = CodeBuffer::new();
            body.indent();
            for local in &locals {
                body.line(format!("{} = 0", local));
            }
            self.procedures(&mut body, &procedure.body);
            let mut decls = FrameDecls::default();
            self.statement(&mut body, &mut decls, &procedure.body.statement);
            self.resolver.leave_procedure();

            out.line(format!("def {}():", label));
            out.indent();
            write_decls(out, &decls);
            if body.line_count() == 0 {
                out.line("pass");
            }
            out.dedent();
            reindent(out, body);
            out.blank();
        }
    }

    fn statement(&mut self, buf: &mut CodeBuffer, decls: &mut FrameDecls, stmt: &Statement) {
        match stmt {
            Statement::Assign { var, expr } => {
                let value = self.expression(expr);
                let target = self.target(decls, var);
                buf.line(format!("{} = {}", target, value));
            }
            Statement::Call { proc } => buf.line(format!("{}()", self.resolver.resolve(proc))),
            Statement::Read { var } => {
                let target = self.target(decls, var);
                buf.line(format!("{} = int(input())", target));
            }
            Statement::Write { expr } => {
                let value = self.expression(expr);
                buf.line(format!("print({})", value));
            }
            Statement::Compound { statements } => {
                for s in statements {
                    self.statement(buf, decls, s);
                }
            }
            Statement::NestedBlock {
                variables,
                statements,
            } => {
                self.resolver.enter_block();
                for name in variables {
                    let label = self.resolver.declare(name, SymbolKind::Variable);
                    if self.resolver.frame() == 0 {
                        self.module_vars.push(label.clone());
                        decls.globals.insert(label.clone());
                    }
                    buf.line(format!("{} = 0", label));
                }
                for s in statements {
                    self.statement(buf, decls, s);
                }
                self.resolver.leave_block();
            }
            Statement::If { condition, then } => {
                let cond = self.expression(condition);
                buf.line(format!("if {}:", cond));
                self.suite(buf, decls, then);
            }
            Statement::While { condition, body } => {
                let cond = self.expression(condition);
                buf.line(format!("while {}:", cond));
                self.suite(buf, decls, body);
            }
        }
    }

    fn suite(&mut self, buf: &mut CodeBuffer, decls: &mut FrameDecls, stmt: &Statement) {
        buf.indent();
        let before = buf.line_count();
        self.statement(buf, decls, stmt);
        if buf.line_count() == before {
            buf.line("pass");
        }
        buf.dedent();
    }

    /// Label of an assignment target, recording the declaration it needs.
    fn target(&self, decls: &mut FrameDecls, var: &str) -> String {
        let label = self.resolver.resolve(var);
        if let Some(symbol) = self.resolver.lookup(var) {
            if symbol.level == 0 {
                decls.globals.insert(label.clone());
            } else if symbol.level < self.resolver.frame() {
                decls.nonlocals.insert(label.clone());
            }
        }
        label
    }

    fn expression(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::Number(n) if *n < 0 => format!("({})", n),
            Expression::Number(n) => n.to_string(),
            Expression::Variable(name) => self.resolver.resolve(name),
            Expression::Operation { op, left, right } => {
                let l = self.expression(left);
                let r = self.expression(right);
                match op {
                    BinaryOp::Div => {
                        self.uses_division = true;
                        format!("_div({}, {})", l, r)
                    }
                    BinaryOp::Eq => format!("int({} == {})", l, r),
                    op if op.is_comparison() => format!("int({} {} {})", l, op, r),
                    op => format!("({} {} {})", l, op, r),
                }
            }
        }
    }
}

fn write_decls(out: &mut CodeBuffer, decls: &FrameDecls) {
    if !decls.globals.is_empty() {
        out.line(format!("global {}", decls.globals.iter().cloned().collect::<Vec<_>>().join(", ")));
    }
    if !decls.nonlocals.is_empty() {
        out.line(format!("nonlocal {}", decls.nonlocals.iter().cloned().collect::<Vec<_>>().join(", ")));
    }
}

// `body` was built one level deeper than column zero; shift it under `out`.
fn reindent(out: &mut CodeBuffer, body: CodeBuffer) {
    let prefix = crate::utils::config::codegen::INDENT.repeat(out.depth());
    let text = body.finish();
    for line in text.lines() {
        if prefix.is_empty() {
            out.raw(line);
        } else {
            out.raw(format!("{}{}", prefix, line));
        }
    }
}

impl CodeGenerator for PythonGenerator {
    fn language(&self) -> &'static str {
        "Python"
    }

    fn generate(mut self, program: &Block) -> Pl0Result<String> {
        for name in &program.variables {
            let label = self.resolver.declare(name, SymbolKind::Variable);
            self.module_vars.push(label);
        }
        let mut defs = CodeBuffer::new();
        self.procedures(&mut defs, program);

        let mut main = CodeBuffer::new();
        main.indent();
        let mut decls = FrameDecls::default();
        self.statement(&mut main, &mut decls, &program.statement);

        let mut out = CodeBuffer::new();
        out.raw("#!/usr/bin/env python3");
        out.raw("# Generated by pl0pipe");
        out.blank();
        if self.uses_division {
            for line in DIV_HELPER {
                out.raw(*line);
            }
            out.blank();
        }
        for label in &self.module_vars {
            out.raw(format!("{} = 0", label));
        }
        if !self.module_vars.is_empty() {
            out.blank();
        }
        out.append(defs);
        out.raw("def main():");
        out.indent();
        write_decls(&mut out, &decls);
        if main.line_count() == 0 {
            out.line("pass");
        }
        out.dedent();
        out.append(main);
        out.blank();
        out.raw("if __name__ == \"__main__\":");
        out.raw("    main()");
        Ok(out.finish())
    }
}
