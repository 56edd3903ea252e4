use crate::analysis::{CodeMetrics, ControlFlowGraph, PerformanceProfile};
use crate::ast::Block;
use crate::backend::{CGenerator, CodeGenerator};
use crate::pipeline::context::CompilerContext;
use crate::pipeline::messages::{Category, MessageCollector};
use crate::pipeline::plugin::{Plugin, PluginDescriptor};
use crate::utils::config::{artifacts, plugins};
use crate::utils::errors::Pl0Result;
use serde_json::{json, Value};

pub struct CfgBuilderPlugin;

impl Plugin for CfgBuilderPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::CFG_BUILDER, "Builds the control flow graph of every routine")
            .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, _messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let cfg = ControlFlowGraph::build(ast);
        context.add_output(artifacts::CFG_DOT, cfg.to_dot())?;
        context.add_output(artifacts::CFG_MERMAID, cfg.to_mermaid())?;
        context.add_output(artifacts::CFG_REPORT, cfg.report())?;
        context.add_output(artifacts::CFG_ANALYSIS, cfg.analysis())?;
        Ok(Some(cfg.stats()))
    }
}

pub struct CodeMetricsPlugin;

impl Plugin for CodeMetricsPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::CODE_METRICS, "Statement counts, nesting depth and variable usage")
            .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, _messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let metrics = CodeMetrics::analyze(ast);
        context.add_output(artifacts::METRICS_REPORT, metrics.report())?;
        Ok(Some(json!({
            "total_statements": metrics.total_statements(),
            "procedures": metrics.procedures.len().saturating_sub(1),
            "max_depth": metrics.max_depth(),
            "declared_variables": metrics.declared_variables,
        })))
    }
}

/// Static cost estimate plus C instrumented to measure the real thing.
pub struct PerformanceProfilerPlugin;

impl Plugin for PerformanceProfilerPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            plugins::PERFORMANCE_PROFILER,
            "Estimates time complexity and generates instrumented C",
        )
        .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let profile = PerformanceProfile::analyze(ast);
        context.add_output(artifacts::PERF_PROFILE, profile.report())?;
        context.add_output(artifacts::INSTR_C_CODE, CGenerator::instrumented().generate(ast)?)?;
        messages.info(
            Category::Optimization,
            plugins::PERFORMANCE_PROFILER,
            format!("estimated complexity: O({})", profile.time_complexity),
        );
        let value = serde_json::to_value(&profile).map_err(|e| e.to_string())?;
        Ok(Some(value))
    }
}
