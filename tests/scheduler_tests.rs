use pl0pipe::ast::{Block, Expression, Statement};
use pl0pipe::pipeline::{
    Category, CompilerContext, ExecutionReport, MessageCollector, PluginDescriptor, PluginRegistry, Severity,
    SkipReason,
};
use pl0pipe::utils::errors::{Pl0Error, Pl0Result};
use serde_json::json;

fn program() -> Block {
    Block::from_statement(Statement::write(Expression::num(1)))
}

/// A plugin that records its name as an output and returns it as a result.
fn marker(registry: &mut PluginRegistry, name: &str, deps: &[&str]) -> Pl0Result<()> {
    let mut descriptor = PluginDescriptor::new(name, format!("marker {}", name));
    for dep in deps {
        descriptor = descriptor.depends_on(*dep);
    }
    let label = name.to_string();
    registry.register_fn(descriptor, move |_ast, context, _messages| {
        context.add_output(format!("{}_out", label), label.clone())?;
        Ok(Some(json!({ "ran": label })))
    })
}

fn run(registry: &PluginRegistry) -> (CompilerContext, MessageCollector, ExecutionReport) {
    let ast = program();
    let mut context = CompilerContext::new(ast.clone());
    let mut messages = MessageCollector::new();
    let report = registry.run_all(&ast, &mut context, &mut messages);
    (context, messages, report)
}

#[test]
fn test_dependencies_run_first() -> Pl0Result<()> {
    // Test: registration order is the reverse of dependency order
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "emit", &["lower", "check"])?;
    marker(&mut registry, "lower", &["check"])?;
    marker(&mut registry, "check", &[])?;

    let plan = registry.execution_plan()?;
    assert_eq!(plan.order, vec!["check", "lower", "emit"]);
    assert!(plan.skipped.is_empty());

    let (context, messages, report) = run(&registry);
    assert_eq!(report.executed, vec!["check", "lower", "emit"]);
    assert!(!messages.has_errors());
    let names: Vec<&str> = context.outputs().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["check_out", "lower_out", "emit_out"]);
    assert_eq!(context.result("emit"), Some(&json!({ "ran": "emit" })));
    Ok(())
}

#[test]
fn test_ties_follow_registration_order() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "root", &[])?;
    marker(&mut registry, "zeta", &["root"])?;
    marker(&mut registry, "alpha", &["root"])?;
    marker(&mut registry, "mid", &[])?;
    assert_eq!(registry.execution_plan()?.order, vec!["root", "zeta", "alpha", "mid"]);
    Ok(())
}

#[test]
fn test_every_dependency_precedes_dependent() -> Pl0Result<()> {
    let edges: &[(&str, &[&str])] = &[
        ("f", &["d", "e"]),
        ("e", &["b"]),
        ("d", &["c", "a"]),
        ("c", &["b"]),
        ("b", &["a"]),
        ("a", &[]),
    ];
    let mut registry = PluginRegistry::new();
    for (name, deps) in edges {
        marker(&mut registry, name, deps)?;
    }
    let (_, _, report) = run(&registry);
    assert_eq!(report.executed.len(), edges.len());
    for (name, deps) in edges {
        for dep in deps.iter() {
            assert!(report.position(dep) < report.position(name), "{} before {}", dep, name);
        }
    }
    Ok(())
}

#[test]
fn test_cycle_skips_members_only() -> Pl0Result<()> {
    // Purpose: A <-> B never run, independent C still does
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "a", &["b"])?;
    marker(&mut registry, "b", &["a"])?;
    marker(&mut registry, "c", &[])?;

    let plan = registry.execution_plan()?;
    assert_eq!(plan.order, vec!["c"]);
    assert_eq!(plan.cycles, vec![vec!["a".to_string(), "b".to_string(), "a".to_string()]]);
    assert!(matches!(plan.skipped.get("a"), Some(SkipReason::DependencyCycle { .. })));
    assert!(matches!(plan.skipped.get("b"), Some(SkipReason::DependencyCycle { .. })));

    let (context, messages, report) = run(&registry);
    assert!(messages.count(Severity::Error) >= 1);
    assert!(!report.ran("a") && !report.ran("b"));
    assert!(report.ran("c"));
    assert!(context.has_output("c_out"));
    let error = messages.errors().next().map(|m| m.text.clone()).unwrap_or_default();
    assert!(error.contains("a -> b -> a"), "{}", error);
    Ok(())
}

#[test]
fn test_self_dependency_is_a_cycle() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "loop", &["loop"])?;
    let plan = registry.execution_plan()?;
    assert!(plan.order.is_empty());
    assert_eq!(plan.cycles, vec![vec!["loop".to_string(), "loop".to_string()]]);
    Ok(())
}

#[test]
fn test_dependents_of_cycle_are_skipped() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "a", &["b"])?;
    marker(&mut registry, "b", &["a"])?;
    marker(&mut registry, "after", &["a"])?;
    let plan = registry.execution_plan()?;
    assert_eq!(
        plan.skipped.get("after"),
        Some(&SkipReason::DependencySkipped {
            dependency: "a".to_string()
        })
    );
    let (_, messages, _) = run(&registry);
    // one for the cycle, one for the downstream skip
    assert_eq!(messages.count(Severity::Error), 2);
    Ok(())
}

#[test]
fn test_missing_dependency() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "base", &[])?;
    marker(&mut registry, "needy", &["ghost"])?;
    marker(&mut registry, "other", &["base"])?;

    let (_, messages, report) = run(&registry);
    let errors: Vec<_> = messages.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].text.contains("needy"));
    assert!(errors[0].text.contains("ghost"));
    assert_eq!(errors[0].category, Category::Scheduling);
    assert!(errors[0].suggestion.is_some());
    assert_eq!(report.executed, vec!["base", "other"]);
    Ok(())
}

#[test]
fn test_disabled_dependency_warns() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "check", &[])?;
    marker(&mut registry, "opt", &["check"])?;
    marker(&mut registry, "asm", &["opt"])?;
    marker(&mut registry, "metrics", &["check"])?;
    registry.enable_plugin("opt", false)?;

    let plan = registry.execution_plan()?;
    assert_eq!(plan.skipped.get("opt"), Some(&SkipReason::Disabled));
    assert_eq!(
        plan.skipped.get("asm"),
        Some(&SkipReason::DisabledDependency {
            dependency: "opt".to_string()
        })
    );

    let (_, messages, report) = run(&registry);
    assert!(!messages.has_errors());
    assert_eq!(messages.count(Severity::Warning), 1);
    assert_eq!(report.executed, vec!["check", "metrics"]);
    Ok(())
}

#[test]
fn test_reenable_plugin() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "p", &[])?;
    registry.enable_plugin("p", false)?;
    assert!(registry.execution_plan()?.order.is_empty());
    registry.enable_plugin("p", true)?;
    assert_eq!(registry.execution_plan()?.order, vec!["p"]);
    assert!(matches!(
        registry.enable_plugin("nope", true),
        Err(Pl0Error::UnknownPlugin { .. })
    ));
    Ok(())
}

#[test]
fn test_duplicate_registration_rejected() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "p", &[])?;
    match marker(&mut registry, "p", &[]) {
        Err(Pl0Error::DuplicatePlugin { name }) => assert_eq!(name, "p"),
        other => panic!("Expected DuplicatePlugin, got: {:?}", other),
    }
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.list_plugins()[0].name, "p");
    Ok(())
}

#[test]
fn test_failure_skips_dependents() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    registry.register_fn(PluginDescriptor::new("broken", "always fails"), |_ast, _context, _messages| {
        Err(Pl0Error::codegen_error("nothing to emit"))
    })?;
    marker(&mut registry, "downstream", &["broken"])?;
    marker(&mut registry, "independent", &[])?;

    let (_, messages, report) = run(&registry);
    assert_eq!(report.failed, vec!["broken"]);
    assert!(!report.ran("downstream"));
    assert!(report.ran("independent"));
    assert!(matches!(
        report.skipped.get("downstream"),
        Some(SkipReason::DependencyFailed { .. })
    ));
    let texts: Vec<&str> = messages.errors().map(|m| m.text.as_str()).collect();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].starts_with("Plugin 'broken' failed"));
    Ok(())
}

#[test]
fn test_duplicate_artifact_fails_writer() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "first", &[])?;
    registry.register_fn(
        PluginDescriptor::new("second", "writes the same artifact").depends_on("first"),
        |_ast, context, _messages| {
            context.add_output("first_out", "overwrite")?;
            Ok(None)
        },
    )?;
    let (context, messages, report) = run(&registry);
    assert_eq!(report.failed, vec!["second"]);
    assert_eq!(context.output("first_out"), Some("first"));
    assert!(messages.has_errors());
    Ok(())
}

#[test]
fn test_plugins_see_earlier_outputs() -> Pl0Result<()> {
    let mut registry = PluginRegistry::new();
    marker(&mut registry, "producer", &[])?;
    registry.register_fn(
        PluginDescriptor::new("consumer", "reads producer").depends_on("producer"),
        |_ast, context, messages| {
            let seen = context.output("producer_out").map(str::to_string).unwrap_or_default();
            messages.info(Category::Internal, "consumer", format!("saw {}", seen));
            Ok(Some(json!(seen)))
        },
    )?;
    let (context, messages, _) = run(&registry);
    assert_eq!(context.result("consumer"), Some(&json!("producer")));
    assert_eq!(messages.count(Severity::Info), 1);
    Ok(())
}
