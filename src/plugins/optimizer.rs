use crate::ast::{pretty, Block};
use crate::optimizer::{optimize, OptimizerOptions};
use crate::pipeline::context::CompilerContext;
use crate::pipeline::messages::{Category, MessageCollector};
use crate::pipeline::plugin::{Plugin, PluginDescriptor};
use crate::utils::config::{artifacts, plugins};
use crate::utils::errors::Pl0Result;
use serde_json::{json, Value};

/// Replaces the context tree with its optimized rewrite.
pub struct AstOptimizerPlugin {
    options: OptimizerOptions,
}

impl AstOptimizerPlugin {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }
}

impl Plugin for AstOptimizerPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            plugins::AST_OPTIMIZER,
            "Constant folding, propagation and dead code elimination to a fixpoint",
        )
        .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let outcome = optimize(ast, &self.options);
        outcome.report_to(messages, plugins::AST_OPTIMIZER);
        messages.info(
            Category::Optimization,
            plugins::AST_OPTIMIZER,
            format!(
                "{} rewrites in {} rounds",
                outcome.stats.total_changes(),
                outcome.stats.iterations
            ),
        );

        context.add_output(artifacts::OPTIMIZED_AST, pretty(&outcome.tree))?;
        context.add_output(
            artifacts::OPTIMIZATION_REPORT,
            outcome.report("AST Optimization Report", &self.options),
        )?;
        let stats = serde_json::to_value(&outcome.stats).map_err(|e| e.to_string())?;
        context.set_ast(outcome.tree, plugins::AST_OPTIMIZER);

        Ok(Some(json!({
            "stats": stats,
            "changes": outcome.stats.total_changes(),
        })))
    }
}
