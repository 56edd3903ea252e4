//! Whole-tree optimizer run to a fixpoint.
//!
//! Each round folds constants (with algebraic simplification and constant
//! propagation) and then eliminates dead code. Rounds repeat until one makes
//! no replacement or the round cap is reached. Every backend that wants an
//! optimized tree goes through [`optimize`] with its own [`OptimizerOptions`].

mod dce;
mod fold;

use crate::ast::Block;
use crate::pipeline::messages::{Category, MessageCollector};
use crate::utils::config::optimizer::MAX_ITERATIONS;
use crate::utils::string_utils::heading;
use dce::Eliminator;
use fold::Folder;
use serde::Serialize;
use std::ops::AddAssign;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizerOptions {
    pub constant_folding: bool,
    pub algebraic_simplification: bool,
    pub constant_propagation: bool,
    pub dead_code_elimination: bool,
    pub max_iterations: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            constant_folding: true,
            algebraic_simplification: true,
            constant_propagation: true,
            dead_code_elimination: true,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl OptimizerOptions {
    /// Every rule switched off; `optimize` returns its input unchanged.
    pub fn disabled() -> Self {
        Self {
            constant_folding: false,
            algebraic_simplification: false,
            constant_propagation: false,
            dead_code_elimination: false,
            max_iterations: MAX_ITERATIONS,
        }
    }

    pub fn is_disabled(&self) -> bool {
        !(self.constant_folding || self.algebraic_simplification || self.constant_propagation || self.dead_code_elimination)
    }

    pub fn enabled_rules(&self) -> Vec<&'static str> {
        let mut rules = Vec::new();
        if self.constant_folding {
            rules.push("Constant Folding");
        }
        if self.algebraic_simplification {
            rules.push("Algebraic Simplification");
        }
        if self.constant_propagation {
            rules.push("Constant Propagation");
        }
        if self.dead_code_elimination {
            rules.push("Dead Code Elimination");
        }
        rules
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationStats {
    pub iterations: usize,
    pub reached_fixpoint: bool,
    pub constants_folded: usize,
    pub algebraic_simplifications: usize,
    pub constants_propagated: usize,
    pub overflows_skipped: usize,
    pub dead_branches_removed: usize,
    pub dead_loops_removed: usize,
    pub empty_statements_pruned: usize,
}

impl OptimizationStats {
    pub fn total_changes(&self) -> usize {
        self.constants_folded
            + self.algebraic_simplifications
            + self.constants_propagated
            + self.dead_branches_removed
            + self.dead_loops_removed
            + self.empty_statements_pruned
    }
}

impl AddAssign<&OptimizationStats> for OptimizationStats {
    fn add_assign(&mut self, other: &OptimizationStats) {
        self.constants_folded += other.constants_folded;
        self.algebraic_simplifications += other.algebraic_simplifications;
        self.constants_propagated += other.constants_propagated;
        self.overflows_skipped += other.overflows_skipped;
        self.dead_branches_removed += other.dead_branches_removed;
        self.dead_loops_removed += other.dead_loops_removed;
        self.empty_statements_pruned += other.empty_statements_pruned;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizationNote {
    DivisionByZero { site: String },
    IterationCapReached { rounds: usize },
}

impl std::fmt::Display for OptimizationNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationNote::DivisionByZero { site } => {
                write!(f, "Division by zero in '{}' was left unfolded", site)
            }
            OptimizationNote::IterationCapReached { rounds } => write!(
                f,
                "Optimizer stopped after {} iterations without reaching a fixpoint",
                rounds
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationOutcome {
    pub tree: Block,
    pub stats: OptimizationStats,
    pub notes: Vec<OptimizationNote>,
}

impl OptimizationOutcome {
    /// Emit every note as a Warning from `source`.
    pub fn report_to(&self, messages: &mut MessageCollector, source: &str) {
        for note in &self.notes {
            messages.warning(Category::Optimization, source, note.to_string());
        }
    }

    pub fn report(&self, title: &str, options: &OptimizerOptions) -> String {
        let stats = &self.stats;
        let mut out = String::new();
        heading(&mut out, title);
        out.push_str("Optimizations Applied:\n");
        for rule in options.enabled_rules() {
            out.push_str(&format!("  - {}\n", rule));
        }
        out.push('\n');
        out.push_str(&format!("Iterations:                {}\n", stats.iterations));
        out.push_str(&format!("Reached fixpoint:          {}\n", stats.reached_fixpoint));
        out.push_str(&format!("Constants folded:          {}\n", stats.constants_folded));
        out.push_str(&format!("Algebraic simplifications: {}\n", stats.algebraic_simplifications));
        out.push_str(&format!("Constants propagated:      {}\n", stats.constants_propagated));
        out.push_str(&format!("Dead branches removed:     {}\n", stats.dead_branches_removed));
        out.push_str(&format!("Dead loops removed:        {}\n", stats.dead_loops_removed));
        out.push_str(&format!("Empty statements pruned:   {}\n", stats.empty_statements_pruned));
        if !self.notes.is_empty() {
            out.push_str("\nNotes:\n");
            for note in &self.notes {
                out.push_str(&format!("  - {}\n", note));
            }
        }
        out
    }
}

struct Round {
    tree: Block,
    changes: usize,
    stats: OptimizationStats,
    division_by_zero: Vec<String>,
}

fn run_round(tree: &Block, options: &OptimizerOptions) -> Round {
    let mut folder = Folder::new(options);
    let folded = folder.fold_block(tree);
    let mut stats = folder.stats;
    let mut changes = folder.changes;

    let tree = if options.dead_code_elimination {
        let mut eliminator = Eliminator::new();
        let tree = eliminator.eliminate_block(&folded);
        stats += &eliminator.stats;
        changes += eliminator.changes;
        tree
    } else {
        folded
    };

    Round {
        tree,
        changes,
        stats,
        division_by_zero: folder.division_by_zero.into_iter().collect(),
    }
}

/// One round of every enabled rule. Returns the rewritten tree and the number
/// of replacements made; zero means `tree` is already a fixpoint.
pub fn rewrite(tree: &Block, options: &OptimizerOptions) -> (Block, usize) {
    let round = run_round(tree, options);
    (round.tree, round.changes)
}

/// Rewrite until nothing changes or `options.max_iterations` rounds have run.
pub fn optimize(tree: &Block, options: &OptimizerOptions) -> OptimizationOutcome {
    let mut current = tree.clone();
    let mut stats = OptimizationStats::default();
    let mut notes = Vec::new();
    let mut sites: Vec<String> = Vec::new();

    if options.is_disabled() {
        stats.reached_fixpoint = true;
        return OptimizationOutcome {
            tree: current,
            stats,
            notes,
        };
    }

    let cap = options.max_iterations.max(1);
    loop {
        let round = run_round(&current, options);
        stats.iterations += 1;
        stats += &round.stats;
        // site text shifts as propagation rewrites operands, report the last round's view
        sites = round.division_by_zero;
        debug!(round = stats.iterations, changes = round.changes, "optimizer round");
        current = round.tree;
        if round.changes == 0 {
            stats.reached_fixpoint = true;
            break;
        }
        if stats.iterations >= cap {
            notes.push(OptimizationNote::IterationCapReached { rounds: stats.iterations });
            break;
        }
    }

    notes.splice(0..0, sites.into_iter().map(|site| OptimizationNote::DivisionByZero { site }));
    OptimizationOutcome {
        tree: current,
        stats,
        notes,
    }
}
