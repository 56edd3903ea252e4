//! LLVM IR backend.
//!
//! Variables become `internal global i64` so nested procedures reach the
//! variables of their enclosing scopes, as in the C backend. Procedures are
//! `define void` functions, the program body is `@main`, and I/O goes through
//! `printf`/`scanf`. Arithmetic wraps on overflow.

use super::emitter::{CodeBuffer, NameGenerator};
use super::names::NameResolver;
use super::CodeGenerator;
use crate::ast::{BinaryOp, Block, Expression, Statement};
use crate::semantic::SymbolKind;
use crate::utils::config::names::LLVM_RESERVED;
use crate::utils::errors::Pl0Result;

const MODULE_ID: &str = "pl0pipe";
const TARGET_TRIPLE: &str = "x86_64-unknown-linux-gnu";

pub struct LlvmGenerator {
    resolver: NameResolver,
    names: NameGenerator,
    globals: Vec<String>,
    functions: Vec<String>,
}

impl Default for LlvmGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LlvmGenerator {
    pub fn new() -> Self {
        Self {
            resolver: NameResolver::new(&LLVM_RESERVED),
            names: NameGenerator::default(),
            globals: Vec::new(),
            functions: Vec::new(),
        }
    }

    fn routine(&mut self, block: &Block, signature: &str, is_main: bool) {
        for name in &block.variables {
            let label = self.resolver.declare(name, SymbolKind::Variable);
            self.globals.push(label);
        }
        let labels: Vec<String> = block
            .procedures
            .iter()
            .map(|p| self.resolver.declare(&p.name, SymbolKind::Procedure))
            .collect();
        for (procedure, label) in block.procedures.iter().zip(labels) {
            self.resolver.enter_procedure(&procedure.name);
            self.routine(&procedure.body, &format!("define void @{}()", label), false);
            self.resolver.leave_procedure();
        }

        // temporaries and labels are numbered per function
        let outer = std::mem::take(&mut self.names);
        let mut buf = CodeBuffer::new();
        buf.raw(format!("{} {{", signature));
        buf.raw("entry:");
        buf.indent();
        self.statement(&mut buf, &block.statement);
        buf.line(if is_main { "ret i32 0" } else { "ret void" });
        buf.dedent();
        buf.raw("}");
        self.functions.push(buf.finish());
        self.names = outer;
    }

    fn global(&self, name: &str) -> String {
        format!("@{}", self.resolver.resolve(name))
    }

    fn statement(&mut self, buf: &mut CodeBuffer, stmt: &Statement) {
        match stmt {
            Statement::Assign { var, expr } => {
                let value = self.value(buf, expr);
                buf.line(format!("store i64 {}, ptr {}, align 8", value, self.global(var)));
            }
            Statement::Call { proc } => buf.line(format!("call void {}()", self.global(proc))),
            Statement::Read { var } => {
                buf.line(format!("call i32 (ptr, ...) @scanf(ptr @.str.input, ptr {})", self.global(var)));
            }
            Statement::Write { expr } => {
                let value = self.value(buf, expr);
                buf.line(format!("call i32 (ptr, ...) @printf(ptr @.str.output, i64 {})", value));
            }
            Statement::Compound { statements } => {
                for s in statements {
                    self.statement(buf, s);
                }
            }
            Statement::NestedBlock {
                variables,
                statements,
            } => {
                self.resolver.enter_block();
                for name in variables {
                    let label = self.resolver.declare(name, SymbolKind::Variable);
                    buf.line(format!("store i64 0, ptr @{}, align 8", label));
                    self.globals.push(label);
                }
                for s in statements {
                    self.statement(buf, s);
                }
                self.resolver.leave_block();
            }
            Statement::If { condition, then } => {
                let cond = self.condition(buf, condition);
                let body = self.names.label("L");
                let end = self.names.label("L");
                buf.line(format!("br i1 {}, label %{}, label %{}", cond, body, end));
                buf.raw(format!("{}:", body));
                self.statement(buf, then);
                buf.line(format!("br label %{}", end));
                buf.raw(format!("{}:", end));
            }
            Statement::While { condition, body } => {
                let head = self.names.label("L");
                let loop_body = self.names.label("L");
                let end = self.names.label("L");
                buf.line(format!("br label %{}", head));
                buf.raw(format!("{}:", head));
                let cond = self.condition(buf, condition);
                buf.line(format!("br i1 {}, label %{}, label %{}", cond, loop_body, end));
                buf.raw(format!("{}:", loop_body));
                self.statement(buf, body);
                buf.line(format!("br label %{}", head));
                buf.raw(format!("{}:", end));
            }
        }
    }

    /// Lower `expr` as an `i1` branch condition. Non-comparisons test against zero.
    fn condition(&mut self, buf: &mut CodeBuffer, expr: &Expression) -> String {
        match expr {
            Expression::Operation { op, left, right } if op.is_comparison() => {
                let lhs = self.value(buf, left);
                let rhs = self.value(buf, right);
                let temp = self.names.temp("%t");
                buf.line(format!("{} = icmp {} i64 {}, {}", temp, predicate(*op), lhs, rhs));
                temp
            }
            _ => {
                let value = self.value(buf, expr);
                let temp = self.names.temp("%t");
                buf.line(format!("{} = icmp ne i64 {}, 0", temp, value));
                temp
            }
        }
    }

    /// Lower `expr` as an `i64` operand.
    fn value(&mut self, buf: &mut CodeBuffer, expr: &Expression) -> String {
        match expr {
            Expression::Number(n) => n.to_string(),
            Expression::Variable(name) => {
                let temp = self.names.temp("%t");
                buf.line(format!("{} = load i64, ptr {}, align 8", temp, self.global(name)));
                temp
            }
            Expression::Operation { op, .. } if op.is_comparison() => {
                let flag = self.condition(buf, expr);
                let temp = self.names.temp("%t");
                buf.line(format!("{} = zext i1 {} to i64", temp, flag));
                temp
            }
            Expression::Operation { op, left, right } => {
                let lhs = self.value(buf, left);
                let rhs = self.value(buf, right);
                let instruction = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                    BinaryOp::Mul => "mul",
                    _ => "sdiv",
                };
                let temp = self.names.temp("%t");
                buf.line(format!("{} = {} i64 {}, {}", temp, instruction, lhs, rhs));
                temp
            }
        }
    }
}

fn predicate(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "eq",
        BinaryOp::Lt => "slt",
        BinaryOp::Gt => "sgt",
        BinaryOp::Le => "sle",
        _ => "sge",
    }
}

impl CodeGenerator for LlvmGenerator {
    fn language(&self) -> &'static str {
        "LLVM IR"
    }

    fn generate(mut self, program: &Block) -> Pl0Result<String> {
        self.routine(program, "define i32 @main()", true);

        let mut out = CodeBuffer::new();
        out.raw(format!("; ModuleID = '{}'", MODULE_ID));
        out.raw(format!("source_filename = \"{}\"", MODULE_ID));
        out.raw(format!("target triple = \"{}\"", TARGET_TRIPLE));
        out.blank();
        out.raw("@.str.output = private unnamed_addr constant [5 x i8] c\"%ld\\0A\\00\", align 1");
        out.raw("@.str.input = private unnamed_addr constant [4 x i8] c\"%ld\\00\", align 1");
        out.blank();
        if !self.globals.is_empty() {
            for label in &self.globals {
                out.raw(format!("@{} = internal global i64 0, align 8", label));
            }
            out.blank();
        }
        out.raw("declare i32 @printf(ptr, ...)");
        out.raw("declare i32 @scanf(ptr, ...)");
        let mut text = out.finish();
        for function in &self.functions {
            text.push('\n');
            text.push_str(function);
        }
        Ok(text)
    }
}
