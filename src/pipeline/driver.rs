//! Compiler front door: owns the plugin registry and runs one compilation.

use crate::ast::Block;
use crate::frontend::parse_source;
use crate::optimizer::OptimizerOptions;
use crate::pipeline::context::CompilerContext;
use crate::pipeline::messages::{Category, Message, MessageCollector, Severity};
use crate::pipeline::plugin::{Plugin, PluginDescriptor};
use crate::pipeline::registry::{ExecutionPlan, ExecutionReport, PluginRegistry};
use crate::plugins::register_builtin_plugins;
use crate::utils::errors::{Pl0Error, Pl0Result};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

const DRIVER: &str = "driver";

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub optimizer: OptimizerOptions,
    /// Builtin plugins to switch off before the first run.
    pub disabled: Vec<String>,
}

/// Everything one compilation produced. Outputs and results are kept even
/// when `success` is false.
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    /// The context tree after the run; `None` when the source did not parse.
    pub ast: Option<Block>,
    pub context: Option<CompilerContext>,
    pub messages: MessageCollector,
    pub execution: ExecutionReport,
}

impl CompileResult {
    pub fn outputs(&self) -> IndexMap<String, String> {
        self.context.as_ref().map(|c| c.outputs().clone()).unwrap_or_default()
    }

    pub fn plugin_results(&self) -> IndexMap<String, Value> {
        self.context.as_ref().map(|c| c.results().clone()).unwrap_or_default()
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.output(name))
    }
}

pub struct Compiler {
    registry: PluginRegistry,
    // registration problems, replayed into every compilation's messages
    setup_messages: Vec<Message>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        let mut compiler = Self::empty();
        if let Err(e) = register_builtin_plugins(&mut compiler.registry, &options.optimizer) {
            compiler.record(Severity::Fatal, Category::Internal, e.to_string());
        }
        for name in &options.disabled {
            if let Err(e) = compiler.registry.enable_plugin(name, false) {
                compiler.record(Severity::Warning, Category::Scheduling, e.to_string());
            }
        }
        compiler
    }

    /// A compiler with no plugins registered.
    pub fn empty() -> Self {
        Self {
            registry: PluginRegistry::new(),
            setup_messages: Vec::new(),
        }
    }

    fn record(&mut self, severity: Severity, category: Category, text: String) {
        warn!(%text, "compiler setup");
        self.setup_messages
            .push(Message::new(severity, category, text).with_source(DRIVER));
    }

    /// Register a plugin. A rejected registration is returned and also
    /// reported as an Error in every later compilation.
    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>) -> Pl0Result<()> {
        self.registry.register(plugin).inspect_err(|e| {
            self.setup_messages.push(
                Message::new(Severity::Error, Category::Scheduling, e.to_string()).with_source(DRIVER),
            );
        })
    }

    pub fn add_plugin_fn<F>(&mut self, descriptor: PluginDescriptor, run: F) -> Pl0Result<()>
    where
        F: Fn(&Block, &mut CompilerContext, &mut MessageCollector) -> Pl0Result<Option<Value>> + 'static,
    {
        self.add_plugin(Box::new(crate::pipeline::plugin::FnPlugin::new(descriptor, run)))
    }

    pub fn enable_plugin(&mut self, name: &str, enabled: bool) -> Pl0Result<()> {
        self.registry.enable_plugin(name, enabled)
    }

    pub fn list_plugins(&self) -> &[PluginDescriptor] {
        self.registry.list_plugins()
    }

    pub fn execution_plan(&self) -> Pl0Result<ExecutionPlan> {
        self.registry.execution_plan()
    }

    /// Run every schedulable plugin over `ast`.
    pub fn compile(&self, ast: Block) -> CompileResult {
        let mut messages = MessageCollector::new();
        messages.extend(self.setup_messages.iter().cloned());

        let mut context = CompilerContext::new(ast.clone());
        let execution = self.registry.run_all(&ast, &mut context, &mut messages);
        let success = !messages.has_errors();
        info!(
            executed = execution.executed.len(),
            skipped = execution.skipped.len(),
            failed = execution.failed.len(),
            success,
            "compilation finished"
        );

        CompileResult {
            success,
            ast: Some(context.ast().clone()),
            context: Some(context),
            messages,
            execution,
        }
    }

    /// Parse `source` and compile it. Lexer and parser failures become a
    /// Syntax error message and no plugin runs.
    pub fn compile_source(&self, source: &str) -> CompileResult {
        match parse_source(source) {
            Ok(ast) => self.compile(ast),
            Err(e) => {
                let mut messages = MessageCollector::new();
                messages.extend(self.setup_messages.iter().cloned());
                messages.push(frontend_message(&e));
                CompileResult {
                    success: false,
                    ast: None,
                    context: None,
                    messages,
                    execution: ExecutionReport::default(),
                }
            }
        }
    }
}

fn frontend_message(error: &Pl0Error) -> Message {
    let message = Message::new(Severity::Error, Category::Syntax, error.to_string()).with_source("frontend");
    match error.line() {
        Some(line) => message.with_location(line, None),
        None => message,
    }
}
