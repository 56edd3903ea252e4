pub mod context;
pub mod driver;
pub mod messages;
pub mod plugin;
pub mod registry;

pub use context::CompilerContext;
pub use driver::{CompileOptions, CompileResult, Compiler};
pub use messages::{Category, Message, MessageCollector, Severity};
pub use plugin::{FnPlugin, Plugin, PluginDescriptor};
pub use registry::{ExecutionPlan, ExecutionReport, PluginRegistry, SkipReason};
