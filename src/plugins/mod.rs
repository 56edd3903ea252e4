//! Builtin passes wrapped as scheduler plugins.
mod analysis;
mod codegen;
mod optimizer;
mod semantic;

pub use analysis::{CfgBuilderPlugin, CodeMetricsPlugin, PerformanceProfilerPlugin};
pub use codegen::{
    AssemblyGeneratorPlugin, CGeneratorPlugin, LlvmGeneratorPlugin, OptimizedCGeneratorPlugin, PythonGeneratorPlugin,
    TacGeneratorPlugin,
};
pub use optimizer::AstOptimizerPlugin;
pub use semantic::TypeCheckerPlugin;

use crate::optimizer::OptimizerOptions;
use crate::pipeline::registry::PluginRegistry;
use crate::utils::errors::Pl0Result;

/// Register every builtin plugin. `options` drives the tree optimizer and the
/// local passes of the optimizing backends.
pub fn register_builtin_plugins(registry: &mut PluginRegistry, options: &OptimizerOptions) -> Pl0Result<()> {
    registry.register(Box::new(TypeCheckerPlugin))?;
    registry.register(Box::new(AstOptimizerPlugin::new(options.clone())))?;
    registry.register(Box::new(CfgBuilderPlugin))?;
    registry.register(Box::new(CodeMetricsPlugin))?;
    registry.register(Box::new(TacGeneratorPlugin))?;
    registry.register(Box::new(CGeneratorPlugin))?;
    registry.register(Box::new(OptimizedCGeneratorPlugin::new(options.clone())))?;
    registry.register(Box::new(PythonGeneratorPlugin::new(options.clone())))?;
    registry.register(Box::new(AssemblyGeneratorPlugin))?;
    registry.register(Box::new(LlvmGeneratorPlugin))?;
    registry.register(Box::new(PerformanceProfilerPlugin))?;
    Ok(())
}
