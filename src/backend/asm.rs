//! x86-64 assembly backend (AT&T syntax, System V calling convention).
//!
//! Variables live in `.data` as quadwords; expressions are evaluated into
//! `%rax` with intermediate values on the machine stack; `printf`/`scanf`
//! from the C library do the I/O.

use super::emitter::{CodeBuffer, NameGenerator};
use super::names::NameResolver;
use super::CodeGenerator;
use crate::ast::{BinaryOp, Block, Expression, Statement};
use crate::semantic::SymbolKind;
use crate::utils::config::codegen::{align_stack_size, WORD_SIZE};
use crate::utils::config::names::ASM_RESERVED;
use crate::utils::errors::{Pl0Error, Pl0Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

const VAR_PREFIX: &str = "var_";
const PROC_PREFIX: &str = "proc_";

pub struct AsmGenerator {
    resolver: NameResolver,
    labels: NameGenerator,
    data: Vec<String>,
    functions: Vec<String>,
}

impl Default for AsmGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AsmGenerator {
    pub fn new() -> Self {
        Self {
            resolver: NameResolver::with_prefix(&ASM_RESERVED, VAR_PREFIX),
            labels: NameGenerator::default(),
            data: Vec::new(),
            functions: Vec::new(),
        }
    }

    fn routine(&mut self, block: &Block, label: &str) {
        for name in &block.variables {
            let label = self.resolver.declare(name, SymbolKind::Variable);
            self.data.push(label);
        }
        let labels: Vec<String> = block
            .procedures
            .iter()
            .map(|p| format!("{}{}", PROC_PREFIX, self.resolver.declare(&p.name, SymbolKind::Procedure)))
            .collect();
        for (procedure, proc_label) in block.procedures.iter().zip(labels) {
            self.resolver.enter_procedure(&procedure.name);
            self.routine(&procedure.body, &proc_label);
            self.resolver.leave_procedure();
        }

        let mut buf = CodeBuffer::new();
        buf.raw(format!("{}:", label));
        buf.indent();
        buf.line("pushq %rbp");
        buf.line("movq %rsp, %rbp");
        self.statement(&mut buf, &block.statement);
        if label == "main" {
            buf.line("xorl %eax, %eax");
        }
        buf.line("popq %rbp");
        buf.line("ret");
        self.functions.push(buf.finish());
    }

    fn procedure_label(&self, name: &str) -> String {
        match self.resolver.lookup(name) {
            Some(symbol) if symbol.kind == SymbolKind::Procedure => format!("{}{}", PROC_PREFIX, symbol.label),
            _ => format!("{}{}", PROC_PREFIX, name),
        }
    }

    fn variable_label(&self, name: &str) -> String {
        match self.resolver.lookup(name) {
            Some(symbol) => symbol.label.clone(),
            None => format!("{}{}", VAR_PREFIX, name),
        }
    }

    fn statement(&mut self, buf: &mut CodeBuffer, stmt: &Statement) {
        match stmt {
            Statement::Assign { var, expr } => {
                self.expression(buf, expr);
                buf.line(format!("movq %rax, {}(%rip)", self.variable_label(var)));
            }
            Statement::Call { proc } => buf.line(format!("call {}", self.procedure_label(proc))),
            Statement::Read { var } => {
                buf.line(format!("leaq {}(%rip), %rsi", self.variable_label(var)));
                buf.line("leaq fmt_in(%rip), %rdi");
                buf.line("xorl %eax, %eax");
                buf.line("call scanf");
            }
            Statement::Write { expr } => {
                self.expression(buf, expr);
                buf.line("movq %rax, %rsi");
                buf.line("leaq fmt_out(%rip), %rdi");
                buf.line("xorl %eax, %eax");
                buf.line("call printf");
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
                    buf.line(format!("movq $0, {}(%rip)", label));
                    self.data.push(label);
                }
                for s in statements {
                    self.statement(buf, s);
                }
                self.resolver.leave_block();
            }
            Statement::If { condition, then } => {
                let end = self.labels.label(".L");
                self.expression(buf, condition);
                buf.line("cmpq $0, %rax");
                buf.line(format!("je {}", end));
                self.statement(buf, then);
                buf.raw(format!("{}:", end));
            }
            Statement::While { condition, body } => {
                let start = self.labels.label(".L");
                let end = self.labels.label(".L");
                buf.raw(format!("{}:", start));
                self.expression(buf, condition);
                buf.line("cmpq $0, %rax");
                buf.line(format!("je {}", end));
                self.statement(buf, body);
                buf.line(format!("jmp {}", start));
                buf.raw(format!("{}:", end));
            }
        }
    }

    fn expression(&mut self, buf: &mut CodeBuffer, expr: &Expression) {
        match expr {
            Expression::Number(n) => {
                if i32::try_from(*n).is_ok() {
                    buf.line(format!("movq ${}, %rax", n));
                } else {
                    buf.line(format!("movabsq ${}, %rax", n));
                }
            }
            Expression::Variable(name) => buf.line(format!("movq {}(%rip), %rax", self.variable_label(name))),
            Expression::Operation { op, left, right } => {
                self.expression(buf, left);
                buf.line("pushq %rax");
                self.expression(buf, right);
                buf.line("movq %rax, %rcx");
                buf.line("popq %rax");
                match op {
                    BinaryOp::Add => buf.line("addq %rcx, %rax"),
                    BinaryOp::Sub => buf.line("subq %rcx, %rax"),
                    BinaryOp::Mul => buf.line("imulq %rcx, %rax"),
                    BinaryOp::Div => {
                        buf.line("cqto");
                        buf.line("idivq %rcx");
                    }
                    cmp => {
                        let set = match cmp {
                            BinaryOp::Eq => "sete",
                            BinaryOp::Lt => "setl",
                            BinaryOp::Gt => "setg",
                            BinaryOp::Le => "setle",
                            _ => "setge",
                        };
                        buf.line("cmpq %rcx, %rax");
                        buf.line(format!("{} %al", set));
                        buf.line("movzbq %al, %rax");
                    }
                }
            }
        }
    }
}

impl CodeGenerator for AsmGenerator {
    fn language(&self) -> &'static str {
        "x86-64 assembly"
    }

    fn generate(mut self, program: &Block) -> Pl0Result<String> {
        self.routine(program, "main");

        let mut out = CodeBuffer::new();
        out.raw("# Generated by pl0pipe");
        out.raw("    .section .data");
        out.raw("fmt_out: .asciz \"%ld\\n\"");
        out.raw("fmt_in: .asciz \"%ld\"");
        for label in &self.data {
            out.raw(format!("{}: .quad 0", label));
        }
        out.blank();
        out.raw("    .section .text");
        out.raw("    .globl main");
        let mut text = out.finish();
        for function in &self.functions {
            text.push_str(function);
            text.push('\n');
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AsmMetrics {
    pub instructions: usize,
    pub labels: usize,
    pub functions: usize,
    pub variables: usize,
    pub calls: usize,
    pub jumps: usize,
    pub registers: BTreeSet<String>,
    /// Deepest stack use of expression temporaries, 16-byte aligned.
    pub max_temp_stack: usize,
}

impl AsmMetrics {
    /// Count instructions and registers in generated assembly text.
    pub fn measure(asm: &str) -> Pl0Result<Self> {
        let register = Regex::new(r"%[a-z][a-z0-9]*").map_err(|e| Pl0Error::codegen_error(e.to_string()))?;
        let mut metrics = AsmMetrics::default();
        let mut depth = 0usize;
        let mut max_depth = 0usize;
        for line in asm.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('.') && !trimmed.ends_with(':') {
                continue;
            }
            if trimmed.ends_with(':') || trimmed.contains(": .") {
                if trimmed.contains(".quad") {
                    metrics.variables += 1;
                } else if trimmed.ends_with(':') {
                    metrics.labels += 1;
                    if !trimmed.starts_with(".L") {
                        metrics.functions += 1;
                    }
                }
                continue;
            }
            metrics.instructions += 1;
            let mnemonic = trimmed.split_whitespace().next().unwrap_or_default();
            match mnemonic {
                "call" => metrics.calls += 1,
                "jmp" | "je" => metrics.jumps += 1,
                "pushq" if trimmed != "pushq %rbp" => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                }
                "popq" if trimmed != "popq %rbp" => depth = depth.saturating_sub(1),
                _ => {}
            }
            for m in register.find_iter(trimmed) {
                metrics.registers.insert(m.as_str().to_string());
            }
        }
        metrics.max_temp_stack = align_stack_size(max_depth);
        Ok(metrics)
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        crate::utils::string_utils::heading(&mut out, "Assembly Metrics");
        out.push_str(&format!("Instructions:        {}\n", self.instructions));
        out.push_str(&format!("Functions:           {}\n", self.functions));
        out.push_str(&format!("Labels:              {}\n", self.labels));
        out.push_str(&format!("Variables (.data):   {} ({} bytes)\n", self.variables, self.variables * WORD_SIZE));
        out.push_str(&format!("Calls:               {}\n", self.calls));
        out.push_str(&format!("Jumps:               {}\n", self.jumps));
        out.push_str(&format!("Temp stack (bytes):  {}\n", self.max_temp_stack));
        out.push_str(&format!(
            "Registers used:      {}\n",
            self.registers.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
        out
    }
}
