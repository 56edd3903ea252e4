//! Static performance estimate.
//!
//! Statements are weighted by a fixed cost table and loop bodies by an
//! estimated trip count taken from the loop condition. The result is an
//! order-of-magnitude guide, not a measurement.

use crate::ast::{BinaryOp, Block, Expression, Statement};
use crate::utils::string_utils::heading;
use indexmap::IndexMap;
use serde::Serialize;
use strum::Display;

const CALL_COST: u64 = 10;
const READ_COST: u64 = 100;
const WRITE_COST: u64 = 50;
const DEFAULT_ITERATIONS: u64 = 10;
const MAX_ITERATIONS: u64 = 1000;
const HEAVY_PROCEDURE: u64 = 100;
const COMPLEX_EXPRESSION: u64 = 5;
const DEEP_NESTING: usize = 2;
const DEEP_STACK: usize = 10;
const HIGH_OPERATION_COUNT: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HotspotKind {
    #[strum(to_string = "Heavy Procedure")]
    HeavyProcedure,
    #[strum(to_string = "Complex Loop Assignment")]
    ComplexLoopAssignment,
    #[strum(to_string = "Procedure Call in Loop")]
    CallInLoop,
    #[strum(to_string = "I/O in Loop")]
    IoInLoop,
    #[strum(to_string = "High Iteration Loop")]
    HighIterationLoop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hotspot {
    pub kind: HotspotKind,
    pub description: String,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopProfile {
    /// Scope path of the routine containing the loop.
    pub procedure: String,
    /// 1 for an outermost loop.
    pub nesting: usize,
    pub estimated_iterations: u64,
    pub body_operations: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceProfile {
    /// Big-O class in `n`, without the `O(...)` wrapper.
    pub time_complexity: String,
    pub space_complexity: String,
    pub operation_count: u64,
    pub max_stack_depth: usize,
    pub memory_operations: usize,
    pub io_operations: usize,
    pub procedure_calls: usize,
    pub max_loop_nesting: usize,
    pub loops: Vec<LoopProfile>,
    /// Estimated operations per routine, nested procedures included, keyed
    /// by scope path.
    pub procedure_operations: IndexMap<String, u64>,
    pub hotspots: Vec<Hotspot>,
    pub recommendations: Vec<String>,
}

struct Profiler {
    profile: PerformanceProfile,
    path: Vec<String>,
    stack_depth: usize,
    loop_nesting: usize,
}

impl PerformanceProfile {
    pub fn analyze(program: &Block) -> Self {
        let mut profiler = Profiler {
            profile: PerformanceProfile::default(),
            path: vec!["main".to_string()],
            stack_depth: 0,
            loop_nesting: 0,
        };
        let total = profiler.block(program);
        let mut profile = profiler.profile;
        profile.operation_count = total;
        profile.time_complexity = match profile.max_loop_nesting {
            0 => "1".to_string(),
            1 => "n".to_string(),
            k => format!("n^{}", k),
        };
        profile.space_complexity = profile.max_stack_depth.max(1).to_string();
        profile.recommend();
        profile
    }

    fn recommend(&mut self) {
        if self.io_operations > 0 {
            self.recommendations
                .push("Consider batching I/O operations to reduce system call overhead".to_string());
        }
        if self.max_loop_nesting > DEEP_NESTING {
            self.recommendations
                .push("Consider algorithm redesign to reduce nested loop complexity".to_string());
        }
        if self.hotspots.iter().any(|h| h.kind == HotspotKind::CallInLoop) {
            self.recommendations
                .push("Consider inlining procedures called within loops".to_string());
        }
        if self.max_stack_depth > DEEP_STACK {
            self.recommendations
                .push("High stack usage detected - consider iterative algorithms".to_string());
        }
        if self.operation_count > HIGH_OPERATION_COUNT {
            self.recommendations
                .push("High operation count - consider algorithmic optimizations".to_string());
        }
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Performance Analysis Report");
        out.push_str(&format!("Time complexity:       O({})\n", self.time_complexity));
        out.push_str(&format!("Space complexity:      O({})\n", self.space_complexity));
        out.push_str(&format!("Estimated operations:  {}\n", self.operation_count));
        out.push_str(&format!("Max loop nesting:      {}\n", self.max_loop_nesting));

        out.push_str("\nLoops:\n");
        if self.loops.is_empty() {
            out.push_str("  (none)\n");
        }
        for l in &self.loops {
            out.push_str(&format!(
                "  {:<16} depth {}: ~{} iterations, {} operations per iteration\n",
                l.procedure, l.nesting, l.estimated_iterations, l.body_operations
            ));
        }

        out.push_str("\nHotspots:\n");
        if self.hotspots.is_empty() {
            out.push_str("  (none)\n");
        }
        for h in &self.hotspots {
            out.push_str(&format!("  {}: {} (weight: {})\n", h.kind, h.description, h.weight));
        }

        out.push_str("\nRecommendations:\n");
        if self.recommendations.is_empty() {
            out.push_str("  (none)\n");
        }
        for r in &self.recommendations {
            out.push_str(&format!("  - {}\n", r));
        }

        out.push_str("\nResource usage:\n");
        out.push_str(&format!("  Stack depth:         {}\n", self.max_stack_depth));
        out.push_str(&format!("  Memory allocations:  {}\n", self.memory_operations));
        out.push_str(&format!("  I/O operations:      {}\n", self.io_operations));
        out.push_str(&format!("  Procedure calls:     {}\n", self.procedure_calls));
        out
    }
}

impl Profiler {
    fn enter_frame(&mut self) {
        self.stack_depth += 1;
        self.profile.max_stack_depth = self.profile.max_stack_depth.max(self.stack_depth);
    }

    fn in_loop(&self) -> bool {
        self.loop_nesting > 0
    }

    fn hotspot(&mut self, kind: HotspotKind, description: String, weight: u64) {
        self.profile.hotspots.push(Hotspot {
            kind,
            description,
            weight,
        });
    }

    /// Operations of `block`, its nested procedures included.
    fn block(&mut self, block: &Block) -> u64 {
        self.enter_frame();
        self.profile.memory_operations += block.variables.len();
        let mut total = 0u64;
        for procedure in &block.procedures {
            self.path.push(procedure.name.clone());
            let ops = self.block(&procedure.body);
            let path = self.path.join("::");
            self.path.pop();
            if ops > HEAVY_PROCEDURE {
                self.hotspot(
                    HotspotKind::HeavyProcedure,
                    format!("Procedure '{}' has {} operations", path, ops),
                    ops,
                );
            }
            self.profile.procedure_operations.insert(path, ops);
            total = total.saturating_add(ops);
        }
        total = total.saturating_add(self.statement(&block.statement));
        self.stack_depth -= 1;
        if self.stack_depth == 0 {
            self.profile.procedure_operations.insert("main".to_string(), total);
        }
        total
    }

    fn statement(&mut self, stmt: &Statement) -> u64 {
        match stmt {
            Statement::Assign { var, expr } => {
                let cost = expression_cost(expr);
                if self.in_loop() && cost > COMPLEX_EXPRESSION {
                    self.hotspot(
                        HotspotKind::ComplexLoopAssignment,
                        format!("Assignment to '{}' has {} operations in loop", var, cost),
                        cost * 10,
                    );
                }
                1 + cost
            }
            Statement::Call { proc } => {
                self.profile.procedure_calls += 1;
                self.enter_frame();
                self.stack_depth -= 1;
                if self.in_loop() {
                    self.hotspot(HotspotKind::CallInLoop, format!("Call to '{}' inside loop", proc), 50);
                }
                CALL_COST
            }
            Statement::Read { var } => {
                self.profile.io_operations += 1;
                if self.in_loop() {
                    self.hotspot(HotspotKind::IoInLoop, format!("Input operation for '{}' in loop", var), 200);
                }
                READ_COST
            }
            Statement::Write { expr } => {
                self.profile.io_operations += 1;
                if self.in_loop() {
                    self.hotspot(HotspotKind::IoInLoop, "Output operation in loop".to_string(), 100);
                }
                WRITE_COST + expression_cost(expr)
            }
            Statement::Compound { statements } => statements
                .iter()
                .fold(0u64, |acc, s| acc.saturating_add(self.statement(s))),
            Statement::NestedBlock { variables, statements } => {
                self.enter_frame();
                self.profile.memory_operations += variables.len();
                let total = statements
                    .iter()
                    .fold(0u64, |acc, s| acc.saturating_add(self.statement(s)));
                self.stack_depth -= 1;
                total
            }
            // the branch is assumed to run half the time
            Statement::If { condition, then } => {
                let branch = self.statement(then) / 2;
                1u64.saturating_add(expression_cost(condition)).saturating_add(branch)
            }
            Statement::While { condition, body } => {
                self.loop_nesting += 1;
                self.profile.max_loop_nesting = self.profile.max_loop_nesting.max(self.loop_nesting);
                let iterations = estimate_iterations(condition);
                let condition_cost = expression_cost(condition);
                let body_cost = self.statement(body);
                self.profile.loops.push(LoopProfile {
                    procedure: self.path.join("::"),
                    nesting: self.loop_nesting,
                    estimated_iterations: iterations,
                    body_operations: body_cost,
                });
                if iterations >= MAX_ITERATIONS {
                    self.hotspot(
                        HotspotKind::HighIterationLoop,
                        format!("Loop with ~{} iterations", iterations),
                        iterations,
                    );
                }
                self.loop_nesting -= 1;
                1u64.saturating_add(condition_cost.saturating_add(body_cost).saturating_mul(iterations))
            }
        }
    }
}

/// One per operator, plus 2 extra for `*` and 4 for `/`.
fn expression_cost(expr: &Expression) -> u64 {
    match expr {
        Expression::Operation { op, left, right } => {
            let own = match op {
                BinaryOp::Div => 5,
                BinaryOp::Mul => 3,
                _ => 1,
            };
            own + expression_cost(left) + expression_cost(right)
        }
        Expression::Variable(_) | Expression::Number(_) => 0,
    }
}

/// The constant on the right of the loop condition, capped, or a default
/// when there is none.
fn estimate_iterations(condition: &Expression) -> u64 {
    match condition {
        Expression::Operation { right, .. } => match right.as_number() {
            Some(n) => n.clamp(0, MAX_ITERATIONS as i64) as u64,
            None => DEFAULT_ITERATIONS,
        },
        _ => DEFAULT_ITERATIONS,
    }
}
