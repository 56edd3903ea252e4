use crate::ast::Block;
use crate::pipeline::context::CompilerContext;
use crate::pipeline::messages::{Category, Message, MessageCollector, Severity};
use crate::pipeline::plugin::{Plugin, PluginDescriptor};
use crate::semantic::type_checker::DiagnosticLevel;
use crate::semantic::TypeChecker;
use crate::utils::config::{artifacts, plugins::TYPE_CHECKER};
use crate::utils::errors::Pl0Result;
use serde_json::{json, Value};

/// Scope and type checking over the parsed program.
pub struct TypeCheckerPlugin;

impl Plugin for TypeCheckerPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(TYPE_CHECKER, "Checks declarations, scopes and operand types")
    }

    fn run(&self, ast: &Block, context: &mut CompilerContext, messages: &mut MessageCollector) -> Pl0Result<Option<Value>> {
        let result = TypeChecker::new().check(ast);

        for diagnostic in &result.diagnostics {
            let severity = match diagnostic.level {
                DiagnosticLevel::Error => Severity::Error,
                DiagnosticLevel::Warning => Severity::Warning,
            };
            let mut message = Message::new(
                severity,
                Category::Semantic,
                format!("{} (in {})", diagnostic.text, diagnostic.scope),
            )
            .with_source(TYPE_CHECKER);
            if let Some(suggestion) = &diagnostic.suggestion {
                message = message.with_suggestion(suggestion.as_str());
            }
            messages.push(message);
        }

        context.add_output(artifacts::TYPE_REPORT, result.report())?;
        context.add_output(artifacts::TYPE_ANALYSIS, result.analysis())?;
        context.add_output(artifacts::TYPE_ERRORS, result.error_listing())?;

        Ok(Some(json!({
            "errors": result.error_count(),
            "warnings": result.warning_count(),
            "symbols": result.symbol_count(),
            "expressions_checked": result.expressions_checked,
        })))
    }
}
