// Three-address code listing.

use super::emitter::NameGenerator;
use super::names::NameResolver;
use super::CodeGenerator;
use crate::ast::{Block, Expression, Statement};
use crate::semantic::SymbolKind;
use crate::utils::config::names::NO_RESERVED;
use crate::utils::errors::Pl0Result;

pub struct TacGenerator {
    resolver: NameResolver,
    names: NameGenerator,
    code: Vec<String>,
}

impl Default for TacGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TacGenerator {
    pub fn new() -> Self {
        Self {
            resolver: NameResolver::new(&NO_RESERVED),
            names: NameGenerator::default(),
            code: Vec::new(),
        }
    }

    /// Lower `program` to one instruction per element.
    pub fn instructions(mut self, program: &Block) -> Vec<String> {
        self.block(program);
        self.code
    }

    fn emit(&mut self, instruction: String) {
        self.code.push(instruction);
    }

    fn block(&mut self, block: &Block) {
        for name in &block.variables {
            let label = self.resolver.declare(name, SymbolKind::Variable);
            self.emit(format!("DECLARE {}", label));
        }
        let labels: Vec<String> = block
            .procedures
            .iter()
            .map(|p| self.resolver.declare(&p.name, SymbolKind::Procedure))
            .collect();
        for (procedure, label) in block.procedures.iter().zip(labels) {
            self.emit(format!("PROC {}:", label));
            self.resolver.enter_procedure(&procedure.name);
            self.block(&procedure.body);
            self.resolver.leave_procedure();
            self.emit(format!("ENDPROC {}", label));
        }
        self.statement(&block.statement);
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Assign { var, expr } => {
                let value = self.expression(expr);
                let target = self.resolver.resolve(var);
                self.emit(format!("{} := {}", target, value));
            }
            Statement::Call { proc } => {
                let label = self.resolver.resolve(proc);
                self.emit(format!("CALL {}", label));
            }
            Statement::Read { var } => {
                let label = self.resolver.resolve(var);
                self.emit(format!("READ {}", label));
            }
            Statement::Write { expr } => {
                let value = self.expression(expr);
                self.emit(format!("WRITE {}", value));
            }
            Statement::Compound { statements } => {
                for s in statements {
                    self.statement(s);
                }
            }
            Statement::NestedBlock {
                variables,
                statements,
            } => {
                self.resolver.enter_block();
                for name in variables {
                    let label = self.resolver.declare(name, SymbolKind::Variable);
                    self.emit(format!("DECLARE {}", label));
                }
                for s in statements {
                    self.statement(s);
                }
                self.resolver.leave_block();
            }
            Statement::If { condition, then } => {
                let cond = self.expression(condition);
                let end = self.names.label("L");
                self.emit(format!("IF NOT {} GOTO {}", cond, end));
                self.statement(then);
                self.emit(format!("LABEL {}", end));
            }
            Statement::While { condition, body } => {
                let start = self.names.label("L");
                let end = self.names.label("L");
                self.emit(format!("LABEL {}", start));
                let cond = self.expression(condition);
                self.emit(format!("IF NOT {} GOTO {}", cond, end));
                self.statement(body);
                self.emit(format!("GOTO {}", start));
                self.emit(format!("LABEL {}", end));
            }
        }
    }

    /// Operand holding the value of `expr`.
    fn expression(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::Number(n) => n.to_string(),
            Expression::Variable(name) => self.resolver.resolve(name),
            Expression::Operation { op, left, right } => {
                let l = self.expression(left);
                let r = self.expression(right);
                let temp = self.names.temp("t");
                self.emit(format!("{} := {} {} {}", temp, l, op, r));
                temp
            }
        }
    }
}

impl CodeGenerator for TacGenerator {
    fn language(&self) -> &'static str {
        "TAC"
    }

    fn generate(self, program: &Block) -> Pl0Result<String> {
        let mut text = self.instructions(program).join("\n");
        text.push('\n');
        Ok(text)
    }
}
