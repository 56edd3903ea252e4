use crate::ast::Block;
use crate::backend::{AsmGenerator, AsmMetrics, CGenerator, CodeGenerator, LlvmGenerator, PythonGenerator, TacGenerator};
use crate::optimizer::{optimize, OptimizationOutcome, OptimizerOptions};
use crate::pipeline::context::CompilerContext;
use crate::pipeline::messages::{Category, MessageCollector};
use crate::pipeline::plugin::{Plugin, PluginDescriptor};
use crate::utils::config::{artifacts, plugins};
use crate::utils::errors::Pl0Result;
use crate::utils::string_utils::write_line;
use serde_json::{json, Value};
use tracing::debug;

fn line_count(code: &str) -> usize {
    code.lines().count()
}

/// Optimization report followed by a short summary of the emitted code.
fn backend_analysis(title: &str, outcome: &OptimizationOutcome, options: &OptimizerOptions, code: &str) -> Pl0Result<String> {
    let mut out = outcome.report(title, options);
    out.push('\n');
    write_line(&mut out, format_args!("Generated lines:           {}", line_count(code)))?;
    write_line(
        &mut out,
        format_args!("Statements removed:        {}", outcome.stats.dead_branches_removed + outcome.stats.dead_loops_removed),
    )?;
    Ok(out)
}

pub struct TacGeneratorPlugin;

impl Plugin for TacGeneratorPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::TAC_GENERATOR, "Generates three-address code").depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, _messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let instructions = TacGenerator::new().instructions(ast);
        let count = instructions.len();
        let mut code = instructions.join("\n");
        code.push('\n');
        context.add_output(artifacts::TAC_CODE, code)?;
        Ok(Some(json!({ "generated": true, "instructions": count })))
    }
}

pub struct CGeneratorPlugin;

impl Plugin for CGeneratorPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::C_GENERATOR, "Generates C from the unoptimized tree")
            .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, _messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let code = CGenerator::new().generate(ast)?;
        let lines = line_count(&code);
        context.add_output(artifacts::C_CODE, code)?;
        Ok(Some(json!({ "generated": true, "lines": lines })))
    }
}

/// C from a tree optimized by this plugin alone.
pub struct OptimizedCGeneratorPlugin {
    options: OptimizerOptions,
}

impl OptimizedCGeneratorPlugin {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }
}

impl Plugin for OptimizedCGeneratorPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::OPT_C_GENERATOR, "Generates C after a local optimization pass")
            .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let outcome = optimize(ast, &self.options);
        outcome.report_to(messages, plugins::OPT_C_GENERATOR);
        let code = CGenerator::with_banner("Generated by pl0pipe (optimized)").generate(&outcome.tree)?;
        let analysis = backend_analysis("Optimized C Analysis", &outcome, &self.options, &code)?;
        let lines = line_count(&code);
        context.add_output(artifacts::OPT_C_CODE, code)?;
        context.add_output(artifacts::OPT_C_ANALYSIS, analysis)?;
        Ok(Some(json!({
            "generated": true,
            "lines": lines,
            "changes": outcome.stats.total_changes(),
        })))
    }
}

pub struct PythonGeneratorPlugin {
    options: OptimizerOptions,
}

impl PythonGeneratorPlugin {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }
}

impl Plugin for PythonGeneratorPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::PYTHON_GENERATOR, "Generates Python after a local optimization pass")
            .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let outcome = optimize(ast, &self.options);
        outcome.report_to(messages, plugins::PYTHON_GENERATOR);
        let code = PythonGenerator::new().generate(&outcome.tree)?;
        let analysis = backend_analysis("Python Optimization Analysis", &outcome, &self.options, &code)?;
        let lines = line_count(&code);
        context.add_output(artifacts::PY_CODE, code)?;
        context.add_output(artifacts::PY_OPT_ANALYSIS, analysis)?;
        Ok(Some(json!({
            "generated": true,
            "lines": lines,
            "changes": outcome.stats.total_changes(),
        })))
    }
}

/// x86-64 assembly lowered from the context tree, which is the optimizer's
/// rewrite when `ast_optimizer` ran first.
pub struct AssemblyGeneratorPlugin;

impl Plugin for AssemblyGeneratorPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::ASSEMBLY_GENERATOR, "Generates x86-64 assembly (AT&T syntax)")
            .depends_on(plugins::AST_OPTIMIZER)
    }

    fn run(&self, _ast: &Block, context: &mut CompilerContext, messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        if context.ast_rewritten_by().is_none() {
            messages.debug(
                Category::CodeGen,
                plugins::ASSEMBLY_GENERATOR,
                "lowering the unoptimized tree",
            );
        }
        let code = AsmGenerator::new().generate(context.ast())?;
        let metrics = AsmMetrics::measure(&code)?;
        debug!(instructions = metrics.instructions, "assembly generated");
        context.add_output(artifacts::ASM_CODE, code)?;
        context.add_output(artifacts::ASM_METRICS, metrics.report())?;
        let value = serde_json::to_value(&metrics).map_err(|e| e.to_string())?;
        Ok(Some(value))
    }
}

pub struct LlvmGeneratorPlugin;

impl Plugin for LlvmGeneratorPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(plugins::LLVM_GENERATOR, "Generates LLVM IR from the unoptimized tree")
            .depends_on(plugins::TYPE_CHECKER)
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, _messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let code = LlvmGenerator::new().generate(ast)?;
        let lines = line_count(&code);
        context.add_output(artifacts::LLVM_CODE, code)?;
        Ok(Some(json!({ "generated": true, "lines": lines })))
    }
}
