use crate::ast::Block;
use crate::utils::errors::{Pl0Error, Pl0Result};
use indexmap::IndexMap;
use serde_json::Value;

/// Shared state of one compilation run.
///
/// Outputs and results are insertion ordered and append-only: a plugin may
/// read anything an earlier plugin wrote but never replace or remove it.
#[derive(Debug, Clone)]
pub struct CompilerContext {
    ast: Block,
    ast_rewritten_by: Option<String>,
    generated_outputs: IndexMap<String, String>,
    plugin_results: IndexMap<String, Value>,
}

impl CompilerContext {
    pub fn new(ast: Block) -> Self {
        Self {
            ast,
            ast_rewritten_by: None,
            generated_outputs: IndexMap::new(),
            plugin_results: IndexMap::new(),
        }
    }

    /// Current tree: the parsed program, or the optimizer's rewrite of it.
    pub fn ast(&self) -> &Block {
        &self.ast
    }

    pub fn set_ast(&mut self, ast: Block, plugin: &str) {
        self.ast = ast;
        self.ast_rewritten_by = Some(plugin.to_string());
    }

    pub fn ast_rewritten_by(&self) -> Option<&str> {
        self.ast_rewritten_by.as_deref()
    }

    pub fn add_output(&mut self, name: impl Into<String>, text: impl Into<String>) -> Pl0Result<()> {
        let name = name.into();
        if self.generated_outputs.contains_key(&name) {
            return Err(Pl0Error::DuplicateArtifact { name });
        }
        self.generated_outputs.insert(name, text.into());
        Ok(())
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.generated_outputs.get(name).map(String::as_str)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.generated_outputs.contains_key(name)
    }

    pub fn outputs(&self) -> &IndexMap<String, String> {
        &self.generated_outputs
    }

    pub(crate) fn set_result(&mut self, plugin: &str, result: Value) {
        self.plugin_results.insert(plugin.to_string(), result);
    }

    pub fn result(&self, plugin: &str) -> Option<&Value> {
        self.plugin_results.get(plugin)
    }

    pub fn results(&self) -> &IndexMap<String, Value> {
        &self.plugin_results
    }
}
