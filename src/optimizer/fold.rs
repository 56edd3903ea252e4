// Constant folding, algebraic simplification and constant propagation.

use super::{OptimizationStats, OptimizerOptions};
use crate::ast::{BinaryOp, Block, Expression, Procedure, Statement};
use indexmap::IndexSet;
use std::collections::HashMap;

/// Known variable values at the current program point.
type Facts = HashMap<String, i64>;

pub(crate) struct Folder<'a> {
    options: &'a OptimizerOptions,
    facts: Facts,
    pub(crate) stats: OptimizationStats,
    pub(crate) changes: usize,
    pub(crate) division_by_zero: IndexSet<String>,
}

impl<'a> Folder<'a> {
    pub(crate) fn new(options: &'a OptimizerOptions) -> Self {
        Self {
            options,
            facts: Facts::new(),
            stats: OptimizationStats::default(),
            changes: 0,
            division_by_zero: IndexSet::new(),
        }
    }

    // Blocks are only entered at the program root or as a procedure body,
    // so they always start without facts.
    pub(crate) fn fold_block(&mut self, block: &Block) -> Block {
        let saved = std::mem::take(&mut self.facts);
        let procedures = block
            .procedures
            .iter()
            .map(|p| {
                self.facts.clear();
                Procedure::new(p.name.clone(), self.fold_block(&p.body))
            })
            .collect();
        self.facts.clear();
        let statement = self.fold_statement(&block.statement);
        self.facts = saved;
        Block::new(block.variables.clone(), procedures, statement)
    }

    fn fold_statement(&mut self, stmt: &Statement) -> Statement {
        match stmt {
            Statement::Assign { var, expr } => {
                let expr = self.fold_expression(expr);
                match expr.as_number() {
                    Some(value) if self.options.constant_propagation => {
                        self.facts.insert(var.clone(), value);
                    }
                    _ => {
                        self.facts.remove(var);
                    }
                }
                Statement::assign(var.clone(), expr)
            }
            Statement::Call { proc } => {
                self.facts.clear();
                Statement::call(proc.clone())
            }
            Statement::Read { var } => {
                self.facts.clear();
                Statement::read(var.clone())
            }
            Statement::Write { expr } => Statement::write(self.fold_expression(expr)),
            Statement::Compound { statements } => {
                Statement::compound(statements.iter().map(|s| self.fold_statement(s)).collect())
            }
            Statement::NestedBlock {
                variables,
                statements,
            } => {
                for name in variables {
                    self.facts.remove(name);
                }
                let statements = statements.iter().map(|s| self.fold_statement(s)).collect();
                for name in variables {
                    self.facts.remove(name);
                }
                Statement::nested(variables.clone(), statements)
            }
            Statement::If { condition, then } => {
                let condition = self.fold_expression(condition);
                let before = self.facts.clone();
                let then = self.fold_statement(then);
                match condition.as_number() {
                    // branch never taken
                    Some(0) => self.facts = before,
                    // branch always taken, keep its facts
                    Some(_) => {}
                    None => self.facts.retain(|name, value| before.get(name) == Some(value)),
                }
                Statement::if_then(condition, then)
            }
            Statement::While { condition, body } => {
                if body.has_side_entry() {
                    self.facts.clear();
                } else {
                    for name in body.assigned_variables() {
                        self.facts.remove(&name);
                    }
                }
                let condition = self.fold_expression(condition);
                let entry = self.facts.clone();
                let body = self.fold_statement(body);
                self.facts = entry;
                Statement::while_do(condition, body)
            }
        }
    }

    pub(crate) fn fold_expression(&mut self, expr: &Expression) -> Expression {
        match expr {
            Expression::Number(n) => Expression::Number(*n),
            Expression::Variable(name) => match self.facts.get(name) {
                Some(&value) if self.options.constant_propagation => {
                    self.stats.constants_propagated += 1;
                    self.changes += 1;
                    Expression::Number(value)
                }
                _ => Expression::Variable(name.clone()),
            },
            Expression::Operation { op, left, right } => {
                let left = self.fold_expression(left);
                let right = self.fold_expression(right);
                if self.options.constant_folding {
                    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
                        match op.apply(a, b) {
                            Some(value) => {
                                self.stats.constants_folded += 1;
                                self.changes += 1;
                                return Expression::Number(value);
                            }
                            None if *op == BinaryOp::Div && b == 0 => {}
                            None => self.stats.overflows_skipped += 1,
                        }
                    }
                }
                if let Expression::Number(0) = right {
                    if *op == BinaryOp::Div {
                        self.division_by_zero.insert(format!("{} / 0", left));
                    }
                }
                if self.options.algebraic_simplification {
                    if let Some(simplified) = simplify(*op, &left, &right) {
                        self.stats.algebraic_simplifications += 1;
                        self.changes += 1;
                        return simplified;
                    }
                }
                Expression::op(*op, left, right)
            }
        }
    }
}

fn simplify(op: BinaryOp, left: &Expression, right: &Expression) -> Option<Expression> {
    let l = left.as_number();
    let r = right.as_number();
    match op {
        BinaryOp::Add if r == Some(0) => Some(left.clone()),
        BinaryOp::Add if l == Some(0) => Some(right.clone()),
        BinaryOp::Sub if r == Some(0) => Some(left.clone()),
        BinaryOp::Mul if r == Some(1) => Some(left.clone()),
        BinaryOp::Mul if l == Some(1) => Some(right.clone()),
        // keep the product when the other side could still divide by zero at runtime
        BinaryOp::Mul if r == Some(0) && !left.contains_division() => Some(Expression::num(0)),
        BinaryOp::Mul if l == Some(0) && !right.contains_division() => Some(Expression::num(0)),
        BinaryOp::Div if r == Some(1) => Some(left.clone()),
        _ => None,
    }
}
