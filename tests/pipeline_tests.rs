use indoc::indoc;
use pl0pipe::optimizer::OptimizerOptions;
use pl0pipe::pipeline::{Category, PluginDescriptor, Severity, SkipReason};
use pl0pipe::utils::config::{artifacts, plugins};
use pl0pipe::{CompileOptions, Compiler, Pl0Error, Pl0Result};
use serde_json::json;

const FACTORIAL: &str = indoc! {"
    var n, f;
    procedure fact;
        begin
            f := f * n;
            n := n - 1;
            if n > 1 then call fact
        end;
    begin
        read n;
        f := 1;
        call fact;
        write f
    end.
"};

#[test]
fn test_builtin_plugins_in_order() {
    let compiler = Compiler::new();
    let names: Vec<&str> = compiler.list_plugins().iter().map(|p| p.name.as_str()).collect();
    let expected = vec![
        plugins::TYPE_CHECKER,
        plugins::AST_OPTIMIZER,
        plugins::CFG_BUILDER,
        plugins::CODE_METRICS,
        plugins::TAC_GENERATOR,
        plugins::C_GENERATOR,
        plugins::OPT_C_GENERATOR,
        plugins::PYTHON_GENERATOR,
        plugins::ASSEMBLY_GENERATOR,
        plugins::LLVM_GENERATOR,
        plugins::PERFORMANCE_PROFILER,
    ];
    assert_eq!(names, expected);
    assert!(compiler.list_plugins().iter().all(|p| p.enabled));
}

#[test]
fn test_full_compilation_produces_every_artifact() -> Pl0Result<()> {
    let result = Compiler::new().compile_source(FACTORIAL);
    assert!(result.success, "{:?}", result.messages.messages());
    assert_eq!(result.execution.executed.len(), 11);
    assert!(result.execution.skipped.is_empty());

    let outputs = result.outputs();
    let names: Vec<&str> = outputs.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            artifacts::TYPE_REPORT,
            artifacts::TYPE_ANALYSIS,
            artifacts::TYPE_ERRORS,
            artifacts::OPTIMIZED_AST,
            artifacts::OPTIMIZATION_REPORT,
            artifacts::CFG_DOT,
            artifacts::CFG_MERMAID,
            artifacts::CFG_REPORT,
            artifacts::CFG_ANALYSIS,
            artifacts::METRICS_REPORT,
            artifacts::TAC_CODE,
            artifacts::C_CODE,
            artifacts::OPT_C_CODE,
            artifacts::OPT_C_ANALYSIS,
            artifacts::PY_CODE,
            artifacts::PY_OPT_ANALYSIS,
            artifacts::ASM_CODE,
            artifacts::ASM_METRICS,
            artifacts::LLVM_CODE,
            artifacts::PERF_PROFILE,
            artifacts::INSTR_C_CODE,
        ]
    );
    assert!(outputs.values().all(|text| !text.is_empty()));

    let results = result.plugin_results();
    assert_eq!(results.len(), 11);
    assert_eq!(results[plugins::TYPE_CHECKER]["errors"], 0);
    assert_eq!(results[plugins::TYPE_CHECKER]["symbols"], 3);
    assert_eq!(results[plugins::CODE_METRICS]["procedures"], 1);
    assert_eq!(results[plugins::C_GENERATOR]["generated"], json!(true));
    assert_eq!(results[plugins::ASSEMBLY_GENERATOR]["functions"], 2);
    assert_eq!(results[plugins::PERFORMANCE_PROFILER]["time_complexity"], "1");
    assert_eq!(results[plugins::PERFORMANCE_PROFILER]["procedure_calls"], 2);
    Ok(())
}

#[test]
fn test_assembly_uses_optimized_tree() -> Pl0Result<()> {
    let source = "var x; begin x := 2 + 3; write x end.";
    let result = Compiler::new().compile_source(source);
    assert!(result.success);

    let asm = result.output(artifacts::ASM_CODE).unwrap_or_default();
    assert!(asm.contains("movq $5, %rax"), "{}", asm);
    assert!(!asm.contains("movq $3, %rax"));
    // the plain C backend works on the tree as parsed
    assert!(result.output(artifacts::C_CODE).unwrap_or_default().contains("x = (2L + 3L);"));
    assert!(result.output(artifacts::OPT_C_CODE).unwrap_or_default().contains("x = 5L;"));
    assert!(result.output(artifacts::OPTIMIZED_AST).unwrap_or_default().contains("x := 5"));

    let context = result.context.as_ref().map(|c| c.ast_rewritten_by().map(str::to_string));
    assert_eq!(context, Some(Some(plugins::AST_OPTIMIZER.to_string())));
    Ok(())
}

#[test]
fn test_no_optimize_keeps_tree() -> Pl0Result<()> {
    let options = CompileOptions {
        optimizer: OptimizerOptions::disabled(),
        ..CompileOptions::default()
    };
    let result = Compiler::with_options(options).compile_source("var x; begin x := 2 + 3; write x end.");
    assert!(result.success);
    let asm = result.output(artifacts::ASM_CODE).unwrap_or_default();
    assert!(asm.contains("movq $3, %rax"));
    assert!(result.output(artifacts::OPT_C_CODE).unwrap_or_default().contains("x = (2L + 3L);"));
    assert_eq!(result.plugin_results()[plugins::AST_OPTIMIZER]["changes"], 0);
    Ok(())
}

#[test]
fn test_unresolved_variable_reported_once() -> Pl0Result<()> {
    let result = Compiler::new().compile_source("var x; begin x := 1; write y end.");
    assert!(!result.success);
    let errors: Vec<_> = result.messages.errors().collect();
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert_eq!(errors[0].category, Category::Semantic);
    assert!(errors[0].text.contains("'y'"));
    assert_eq!(errors[0].source.as_deref(), Some(plugins::TYPE_CHECKER));

    // later plugins still run to completion
    assert!(result.execution.failed.is_empty());
    assert_eq!(result.execution.executed.len(), 11);
    assert!(result.output(artifacts::C_CODE).is_some());
    assert!(result.output(artifacts::ASM_CODE).is_some());
    Ok(())
}

#[test]
fn test_syntax_error_stops_before_plugins() {
    let result = Compiler::new().compile_source("var x;\nbegin\n  x := \nend.");
    assert!(!result.success);
    assert!(result.ast.is_none());
    assert!(result.outputs().is_empty());
    assert!(result.execution.executed.is_empty());

    let errors: Vec<_> = result.messages.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, Category::Syntax);
    assert_eq!(errors[0].source.as_deref(), Some("frontend"));
    assert!(errors[0].line.is_some());
}

#[test]
fn test_disabling_optimizer_skips_assembly() -> Pl0Result<()> {
    let options = CompileOptions {
        disabled: vec![plugins::AST_OPTIMIZER.to_string()],
        ..CompileOptions::default()
    };
    let result = Compiler::with_options(options).compile_source(FACTORIAL);
    assert!(result.success);
    assert!(!result.execution.ran(plugins::AST_OPTIMIZER));
    assert!(!result.execution.ran(plugins::ASSEMBLY_GENERATOR));
    assert_eq!(
        result.execution.skipped.get(plugins::ASSEMBLY_GENERATOR),
        Some(&SkipReason::DisabledDependency {
            dependency: plugins::AST_OPTIMIZER.to_string()
        })
    );
    assert_eq!(result.messages.count(Severity::Warning), 1);
    assert!(result.output(artifacts::ASM_CODE).is_none());
    assert!(result.output(artifacts::C_CODE).is_some());
    Ok(())
}

#[test]
fn test_disabling_type_checker_skips_everything() {
    let options = CompileOptions {
        disabled: vec![plugins::TYPE_CHECKER.to_string()],
        ..CompileOptions::default()
    };
    let result = Compiler::with_options(options).compile_source(FACTORIAL);
    assert!(result.execution.executed.is_empty());
    assert_eq!(result.execution.skipped.len(), 11);
    assert!(result.outputs().is_empty());
}

#[test]
fn test_unknown_disabled_plugin_warns() {
    let options = CompileOptions {
        disabled: vec!["no_such_plugin".to_string()],
        ..CompileOptions::default()
    };
    let result = Compiler::with_options(options).compile_source(FACTORIAL);
    assert!(result.success);
    let warnings: Vec<_> = result.messages.with_severity(Severity::Warning).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.contains("no_such_plugin"));
}

#[test]
fn test_division_by_zero_warns_per_optimizing_pass() {
    let result = Compiler::new().compile_source("var x; begin x := 1 / 0; write x end.");
    assert!(result.success);
    let sources: Vec<&str> = result
        .messages
        .with_severity(Severity::Warning)
        .filter(|m| m.text.contains("Division by zero"))
        .filter_map(|m| m.source.as_deref())
        .collect();
    assert_eq!(
        sources,
        vec![plugins::AST_OPTIMIZER, plugins::OPT_C_GENERATOR, plugins::PYTHON_GENERATOR]
    );
    assert!(result.output(artifacts::ASM_CODE).unwrap_or_default().contains("idivq %rcx"));
}

#[test]
fn test_custom_plugin_reads_generated_code() -> Pl0Result<()> {
    let mut compiler = Compiler::new();
    compiler.add_plugin_fn(
        PluginDescriptor::new("line_counter", "Counts generated C lines").depends_on(plugins::C_GENERATOR),
        |_ast, context, _messages| {
            let lines = context.output(artifacts::C_CODE).map(|c| c.lines().count()).unwrap_or(0);
            context.add_output("c_line_count", lines.to_string())?;
            Ok(Some(json!(lines)))
        },
    )?;
    let result = compiler.compile_source(FACTORIAL);
    assert!(result.success);
    assert_eq!(result.execution.executed.last().map(String::as_str), Some("line_counter"));
    let counted = result.output("c_line_count").unwrap_or_default().to_string();
    let actual = result.output(artifacts::C_CODE).unwrap_or_default().lines().count();
    assert_eq!(counted, actual.to_string());
    Ok(())
}

#[test]
fn test_duplicate_builtin_name_is_reported() {
    let mut compiler = Compiler::new();
    let added = compiler.add_plugin_fn(PluginDescriptor::new(plugins::TYPE_CHECKER, "impostor"), |_, _, _| Ok(None));
    assert!(matches!(added, Err(Pl0Error::DuplicatePlugin { .. })));

    let result = compiler.compile_source(FACTORIAL);
    assert!(!result.success);
    assert_eq!(result.messages.count(Severity::Error), 1);
    // the original registration is kept and still runs
    assert!(result.execution.ran(plugins::TYPE_CHECKER));
}

#[test]
fn test_enable_plugin_by_name() -> Pl0Result<()> {
    let mut compiler = Compiler::new();
    compiler.enable_plugin(plugins::C_GENERATOR, false)?;
    let plan = compiler.execution_plan()?;
    assert!(!plan.order.iter().any(|p| p == plugins::C_GENERATOR));
    assert_eq!(plan.skipped.get(plugins::C_GENERATOR), Some(&SkipReason::Disabled));
    assert!(compiler.enable_plugin("missing", true).is_err());
    Ok(())
}

#[test]
fn test_compile_prebuilt_tree() {
    use pl0pipe::ast::{BinaryOp, Block, Expression, Statement};

    let tree = Block::new(
        vec!["b".to_string()],
        vec![],
        Statement::assign("b", Expression::op(BinaryOp::Lt, Expression::num(1), Expression::num(2))),
    );
    let result = Compiler::new().compile(tree);
    assert!(!result.success);
    let semantic = result.messages.errors().filter(|m| m.category == Category::Semantic).count();
    assert_eq!(semantic, 1);
}

#[test]
fn test_empty_compiler_runs_nothing() {
    let result = Compiler::empty().compile_source("write 1.");
    assert!(result.success);
    assert!(result.execution.executed.is_empty());
    assert!(result.outputs().is_empty());
    assert!(result.messages.is_empty());
}
