// Dead-code elimination over constant conditions and empty statements.

use super::OptimizationStats;
use crate::ast::{Block, Procedure, Statement};

pub(crate) struct Eliminator {
    pub(crate) stats: OptimizationStats,
    pub(crate) changes: usize,
}

impl Eliminator {
    pub(crate) fn new() -> Self {
        Self {
            stats: OptimizationStats::default(),
            changes: 0,
        }
    }

    pub(crate) fn eliminate_block(&mut self, block: &Block) -> Block {
        let procedures = block
            .procedures
            .iter()
            .map(|p| Procedure::new(p.name.clone(), self.eliminate_block(&p.body)))
            .collect();
        let statement = self.eliminate(&block.statement);
        Block::new(block.variables.clone(), procedures, statement)
    }

    fn eliminate(&mut self, stmt: &Statement) -> Statement {
        match stmt {
            Statement::If { condition, then } => {
                let then = self.eliminate(then);
                match condition.as_number() {
                    Some(0) => {
                        self.stats.dead_branches_removed += 1;
                        self.changes += 1;
                        Statement::empty()
                    }
                    Some(_) => {
                        self.stats.dead_branches_removed += 1;
                        self.changes += 1;
                        then
                    }
                    None => Statement::if_then(condition.clone(), then),
                }
            }
            Statement::While { condition, body } => {
                if condition.as_number() == Some(0) {
                    self.stats.dead_loops_removed += 1;
                    self.changes += 1;
                    return Statement::empty();
                }
                Statement::while_do(condition.clone(), self.eliminate(body))
            }
            Statement::Compound { statements } => Statement::compound(self.eliminate_sequence(statements)),
            Statement::NestedBlock {
                variables,
                statements,
            } => Statement::nested(variables.clone(), self.eliminate_sequence(statements)),
            other => other.clone(),
        }
    }

    fn eliminate_sequence(&mut self, statements: &[Statement]) -> Vec<Statement> {
        let mut out = Vec::with_capacity(statements.len());
        for stmt in statements {
            match self.eliminate(stmt) {
                s if s.is_empty() => {
                    self.stats.empty_statements_pruned += 1;
                    self.changes += 1;
                }
                Statement::Compound { statements } => {
                    self.stats.empty_statements_pruned += 1;
                    self.changes += 1;
                    out.extend(statements);
                }
                s => out.push(s),
            }
        }
        out
    }
}
