use crate::ast::{Block, Expression, Statement};
use crate::utils::string_utils::heading;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcedureMetrics {
    pub statements: usize,
    pub assignments: usize,
    pub calls: usize,
    pub io: usize,
    pub branches: usize,
    pub loops: usize,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeMetrics {
    /// Keyed by scope path (`main`, `main::p`, `main::p::q`), innermost
    /// procedures first. The program body is `main`.
    pub procedures: IndexMap<String, ProcedureMetrics>,
    /// References per variable, keyed by the path of its declaring scope and
    /// its name (`main::p::x`). Assignment targets are included.
    pub variable_usage: IndexMap<String, usize>,
    pub declared_variables: usize,
}

/// A scope on the walk stack with the names it declares.
struct Scope<'a> {
    path: String,
    variables: &'a [String],
}

struct MetricsWalker<'a> {
    metrics: CodeMetrics,
    scopes: Vec<Scope<'a>>,
}

impl CodeMetrics {
    pub fn analyze(program: &Block) -> Self {
        let mut walker = MetricsWalker {
            metrics: CodeMetrics::default(),
            scopes: Vec::new(),
        };
        walker.visit_block("main".to_string(), program);
        walker.metrics
    }

    pub fn total_statements(&self) -> usize {
        self.procedures.values().map(|p| p.statements).sum()
    }

    pub fn max_depth(&self) -> usize {
        self.procedures.values().map(|p| p.max_depth).max().unwrap_or(0)
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Code Metrics Report");
        out.push_str(&format!("Total statements:    {}\n", self.total_statements()));
        out.push_str(&format!("Procedures:          {}\n", self.procedures.len().saturating_sub(1)));
        out.push_str(&format!("Declared variables:  {}\n", self.declared_variables));
        out.push_str(&format!("Max nesting depth:   {}\n", self.max_depth()));
        out.push_str("\nStatements per procedure:\n");
        for (name, p) in &self.procedures {
            out.push_str(&format!(
                "  {:<16} {:>4} (assign {}, call {}, io {}, if {}, while {})\n",
                name, p.statements, p.assignments, p.calls, p.io, p.branches, p.loops
            ));
        }
        out.push_str("\nVariable usage:\n");
        if self.variable_usage.is_empty() {
            out.push_str("  (none)\n");
        }
        for (name, count) in &self.variable_usage {
            out.push_str(&format!("  {:<16} {:>4}\n", name, count));
        }
        out
    }
}

impl<'a> MetricsWalker<'a> {
    fn visit_block(&mut self, path: String, block: &'a Block) {
        self.metrics.declared_variables += block.variables.len();
        self.scopes.push(Scope {
            path: path.clone(),
            variables: &block.variables,
        });
        for procedure in &block.procedures {
            self.visit_block(format!("{}::{}", path, procedure.name), &procedure.body);
        }
        let mut counts = ProcedureMetrics::default();
        self.visit_statement(&block.statement, &mut counts, 0);
        self.scopes.pop();
        self.metrics.procedures.insert(path, counts);
    }

    fn visit_statement(&mut self, stmt: &'a Statement, counts: &mut ProcedureMetrics, depth: usize) {
        counts.max_depth = counts.max_depth.max(depth);
        match stmt {
            Statement::Assign { var, expr } => {
                counts.statements += 1;
                counts.assignments += 1;
                self.use_variable(var);
                self.visit_expression(expr);
            }
            Statement::Call { .. } => {
                counts.statements += 1;
                counts.calls += 1;
            }
            Statement::Read { var } => {
                counts.statements += 1;
                counts.io += 1;
                self.use_variable(var);
            }
            Statement::Write { expr } => {
                counts.statements += 1;
                counts.io += 1;
                self.visit_expression(expr);
            }
            Statement::Compound { statements } => {
                for s in statements {
                    self.visit_statement(s, counts, depth);
                }
            }
            Statement::NestedBlock { variables, statements } => {
                self.metrics.declared_variables += variables.len();
                let path = format!("{}::block", self.current_path());
                self.scopes.push(Scope { path, variables });
                for s in statements {
                    self.visit_statement(s, counts, depth);
                }
                self.scopes.pop();
            }
            Statement::If { condition, then } => {
                counts.statements += 1;
                counts.branches += 1;
                self.visit_expression(condition);
                self.visit_statement(then, counts, depth + 1);
            }
            Statement::While { condition, body } => {
                counts.statements += 1;
                counts.loops += 1;
                self.visit_expression(condition);
                self.visit_statement(body, counts, depth + 1);
            }
        }
    }

    fn visit_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Variable(name) => self.use_variable(name),
            Expression::Operation { left, right, .. } => {
                self.visit_expression(left);
                self.visit_expression(right);
            }
            Expression::Number(_) => {}
        }
    }

    fn current_path(&self) -> &str {
        self.scopes.last().map(|s| s.path.as_str()).unwrap_or("main")
    }

    /// Charge a reference to the innermost scope declaring `name`, or to the
    /// current scope when nothing declares it.
    fn use_variable(&mut self, name: &str) {
        let owner = self
            .scopes
            .iter()
            .rev()
            .find(|s| s.variables.iter().any(|v| v == name))
            .map(|s| s.path.as_str())
            .unwrap_or_else(|| self.current_path());
        let key = format!("{}::{}", owner, name);
        *self.metrics.variable_usage.entry(key).or_insert(0) += 1;
    }
}
