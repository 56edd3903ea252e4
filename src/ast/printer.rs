// Renders trees back to PL/0-like source text.

use super::nodes::{Block, Expression, Statement};
use crate::utils::config::codegen::INDENT;
use std::fmt;

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Operation { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op)?;
                write_operand(f, right)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expression) -> fmt::Result {
    match expr {
        Expression::Operation { .. } => write!(f, "({})", expr),
        Expression::Number(n) if *n < 0 => write!(f, "({})", n),
        _ => write!(f, "{}", expr),
    }
}

struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn block(&mut self, block: &Block) {
        if !block.variables.is_empty() {
            self.line(&format!("var {};", block.variables.join(", ")));
        }
        for procedure in &block.procedures {
            self.line(&format!("procedure {};", procedure.name));
            self.depth += 1;
            self.block(&procedure.body);
            self.depth -= 1;
            self.append(";");
        }
        self.statement(&block.statement);
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Assign { var, expr } => self.line(&format!("{} := {}", var, expr)),
            Statement::Call { proc } => self.line(&format!("call {}", proc)),
            Statement::Read { var } => self.line(&format!("read {}", var)),
            Statement::Write { expr } => self.line(&format!("write {}", expr)),
            Statement::Compound { statements } => self.sequence(&[], statements),
            Statement::NestedBlock {
                variables,
                statements,
            } => self.sequence(variables, statements),
            Statement::If { condition, then } => {
                self.line(&format!("if {} then", condition));
                self.nested(then);
            }
            Statement::While { condition, body } => {
                self.line(&format!("while {} do", condition));
                self.nested(body);
            }
        }
    }

    fn nested(&mut self, stmt: &Statement) {
        self.depth += 1;
        self.statement(stmt);
        self.depth -= 1;
    }

    fn sequence(&mut self, variables: &[String], statements: &[Statement]) {
        if variables.is_empty() && statements.is_empty() {
            self.line("begin end");
            return;
        }
        self.line("begin");
        self.depth += 1;
        if !variables.is_empty() {
            self.line(&format!("var {};", variables.join(", ")));
        }
        for (i, stmt) in statements.iter().enumerate() {
            self.statement(stmt);
            if i + 1 < statements.len() {
                self.append(";");
            }
        }
        self.depth -= 1;
        self.line("end");
    }

    // Attach a terminator to the line just written.
    fn append(&mut self, text: &str) {
        if self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

/// Pretty-print a whole program, terminated with `.`
pub fn pretty(block: &Block) -> String {
    let mut printer = Printer {
        out: String::new(),
        depth: 0,
    };
    printer.block(block);
    printer.append(".");
    printer.out
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer {
            out: String::new(),
            depth: 0,
        };
        printer.statement(self);
        f.write_str(printer.out.trim_end())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pretty(self))
    }
}
