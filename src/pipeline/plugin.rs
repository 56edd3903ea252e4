use crate::ast::Block;
use crate::pipeline::context::CompilerContext;
use crate::pipeline::messages::MessageCollector;
use crate::utils::errors::Pl0Result;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub description: String,
    pub version: String,
    pub dependencies: Vec<String>,
    pub enabled: bool,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: "1.0".to_string(),
            dependencies: Vec::new(),
            enabled: true,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A pass over the program tree.
///
/// `ast` is the tree handed to the scheduler; passes that want the
/// optimizer's rewrite read `context.ast()` instead. A returned value is
/// stored under the plugin's name in the context's results.
pub trait Plugin {
    fn descriptor(&self) -> PluginDescriptor;

    fn run(
        &self,
        ast: &Block,
        context: &mut CompilerContext,
        messages: &mut MessageCollector,
    ) -> Pl0Result<Option<Value>>;
}

type PluginFn = dyn Fn(&Block, &mut CompilerContext, &mut MessageCollector) -> Pl0Result<Option<Value>>;

/// Plugin backed by a closure.
pub struct FnPlugin {
    descriptor: PluginDescriptor,
    run: Box<PluginFn>,
}

impl FnPlugin {
    pub fn new<F>(descriptor: PluginDescriptor, run: F) -> Self
    where
        F: Fn(&Block, &mut CompilerContext, &mut MessageCollector) -> Pl0Result<Option<Value>> + 'static,
    {
        Self {
            descriptor,
            run: Box::new(run),
        }
    }
}

impl Plugin for FnPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        self.descriptor.clone()
    }

    fn run(
        &self,
        ast: &Block,
        context: &mut CompilerContext,
        messages: &mut MessageCollector,
    ) -> Pl0Result<Option<Value>> {
        (self.run)(ast, context, messages)
    }
}
