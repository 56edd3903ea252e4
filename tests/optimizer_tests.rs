use indoc::indoc;
use pl0pipe::ast::{BinaryOp, Block, Expression, Statement};
use pl0pipe::frontend::parse_source;
use pl0pipe::optimizer::{optimize, rewrite, OptimizationNote, OptimizerOptions};
use pl0pipe::pipeline::{Category, MessageCollector, Severity};
use pl0pipe::utils::errors::Pl0Result;
use strum::IntoEnumIterator;

fn optimized(source: &str) -> Pl0Result<Block> {
    Ok(optimize(&parse_source(source)?, &OptimizerOptions::default()).tree)
}

fn num(n: i64) -> Expression {
    Expression::num(n)
}

fn var(name: &str) -> Expression {
    Expression::var(name)
}

#[test]
fn test_propagation_and_dead_branch() -> Pl0Result<()> {
    // Test: x := 2 + 3; if x > 4 then y := 1  ==>  x := 5; y := 1
    let tree = optimized("var x, y; begin x := 2 + 3; if x > 4 then y := 1 end.")?;
    assert_eq!(
        *tree.statement,
        Statement::compound(vec![Statement::assign("x", num(5)), Statement::assign("y", num(1))])
    );
    assert_eq!(tree.variables, vec!["x".to_string(), "y".to_string()]);
    Ok(())
}

#[test]
fn test_while_false_removed() -> Pl0Result<()> {
    let tree = optimized("var y; while 0 do y := y + 1.")?;
    assert!(tree.statement.is_empty());
    Ok(())
}

#[test]
fn test_while_true_unchanged() -> Pl0Result<()> {
    let source = "var y; while 1 do y := y + 1.";
    let original = parse_source(source)?;
    let outcome = optimize(&original, &OptimizerOptions::default());
    assert_eq!(outcome.tree, original);
    assert!(outcome.stats.reached_fixpoint);
    assert_eq!(outcome.stats.total_changes(), 0);
    Ok(())
}

#[test]
fn test_if_false_removed() -> Pl0Result<()> {
    let tree = optimized("var y; begin y := 1; if 2 < 1 then y := 2; write y end.")?;
    assert_eq!(
        *tree.statement,
        Statement::compound(vec![Statement::assign("y", num(1)), Statement::write(num(1))])
    );
    Ok(())
}

#[test]
fn test_folding_matches_evaluation() {
    // Purpose: folded +, -, * agree with direct evaluation, including negatives
    let values = [-17i64, -3, -1, 0, 1, 2, 7, 1000];
    for op in [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul] {
        for &a in &values {
            for &b in &values {
                let program = Block::from_statement(Statement::write(Expression::op(op, num(a), num(b))));
                let tree = optimize(&program, &OptimizerOptions::default()).tree;
                let expected = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    _ => a * b,
                };
                assert_eq!(*tree.statement, Statement::write(num(expected)), "{} {} {}", a, op, b);
            }
        }
    }
}

#[test]
fn test_division_truncates_toward_zero() -> Pl0Result<()> {
    let tree = optimized("begin write -7 / 2; write 7 / (-2) end")?;
    assert_eq!(
        *tree.statement,
        Statement::compound(vec![Statement::write(num(-3)), Statement::write(num(-3))])
    );
    Ok(())
}

#[test]
fn test_division_by_zero_never_folds() -> Pl0Result<()> {
    let program = parse_source("var x; begin x := 8 / 0; write x end")?;
    let outcome = optimize(&program, &OptimizerOptions::default());
    let division = Expression::op(BinaryOp::Div, num(8), num(0));
    assert_eq!(
        *outcome.tree.statement,
        Statement::compound(vec![Statement::assign("x", division), Statement::write(var("x"))])
    );
    assert_eq!(
        outcome.notes,
        vec![OptimizationNote::DivisionByZero {
            site: "8 / 0".to_string()
        }]
    );

    let mut messages = MessageCollector::new();
    outcome.report_to(&mut messages, "test");
    assert_eq!(messages.count(Severity::Warning), 1);
    assert_eq!(messages.messages()[0].category, Category::Optimization);
    Ok(())
}

#[test]
fn test_zero_product_keeps_division() -> Pl0Result<()> {
    // Test: y / 0 * 0 must still trap at runtime, y * 0 may fold
    let tree = optimized("var x, y; begin read y; x := y / 0 * 0; write y * 0; write x end")?;
    let statements = match &*tree.statement {
        Statement::Compound { statements } => statements.clone(),
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(
        statements[1],
        Statement::assign(
            "x",
            Expression::op(BinaryOp::Mul, Expression::op(BinaryOp::Div, var("y"), num(0)), num(0))
        )
    );
    assert_eq!(statements[2], Statement::write(num(0)));
    Ok(())
}

#[test]
fn test_algebraic_identities() -> Pl0Result<()> {
    let tree = optimized("var a; begin read a; write a + 0; write 0 + a; write a - 0; write a * 1; write 1 * a; write a / 1 end")?;
    let expected: Vec<Statement> = std::iter::once(Statement::read("a"))
        .chain((0..6).map(|_| Statement::write(var("a"))))
        .collect();
    assert_eq!(*tree.statement, Statement::compound(expected));
    Ok(())
}

#[test]
fn test_read_and_call_clear_facts() -> Pl0Result<()> {
    let source = indoc! {"
        var a, b;
        procedure p;
            a := 9;
        begin
            a := 1;
            b := 2;
            call p;
            write a;
            b := 3;
            read a;
            write b
        end.
    "};
    let tree = optimized(source)?;
    let expected = Statement::compound(vec![
        Statement::assign("a", num(1)),
        Statement::assign("b", num(2)),
        Statement::call("p"),
        Statement::write(var("a")),
        Statement::assign("b", num(3)),
        Statement::read("a"),
        Statement::write(var("b")),
    ]);
    assert_eq!(*tree.statement, expected);
    Ok(())
}

#[test]
fn test_loop_invalidates_assigned_names() -> Pl0Result<()> {
    let source = indoc! {"
        var i, k;
        begin
            i := 0;
            k := 5;
            while i < 10 do i := i + k;
            write i;
            write k
        end.
    "};
    let tree = optimized(source)?;
    let expected = Statement::compound(vec![
        Statement::assign("i", num(0)),
        Statement::assign("k", num(5)),
        Statement::while_do(
            Expression::op(BinaryOp::Lt, var("i"), num(10)),
            Statement::assign("i", Expression::op(BinaryOp::Add, var("i"), num(5))),
        ),
        Statement::write(var("i")),
        Statement::write(num(5)),
    ]);
    assert_eq!(*tree.statement, expected);
    Ok(())
}

#[test]
fn test_branch_facts_merge() -> Pl0Result<()> {
    let source = "var a, b; begin read b; a := 1; if b > 0 then a := 2; write a end.";
    let tree = optimized(source)?;
    match &*tree.statement {
        Statement::Compound { statements } => {
            assert_eq!(statements.last(), Some(&Statement::write(var("a"))));
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn test_shadowed_name_not_propagated() -> Pl0Result<()> {
    let source = "var x; begin x := 1; begin var x; x := 7; write x end; write x end.";
    let tree = optimized(source)?;
    let expected = Statement::compound(vec![
        Statement::assign("x", num(1)),
        Statement::nested(vec!["x".to_string()], vec![Statement::assign("x", num(7)), Statement::write(num(7))]),
        Statement::write(var("x")),
    ]);
    assert_eq!(*tree.statement, expected);
    Ok(())
}

#[test]
fn test_procedures_optimized_independently() -> Pl0Result<()> {
    let source = indoc! {"
        var g;
        procedure p;
            begin
                if 1 = 1 then g := 3 * 4
            end;
        begin
            g := 2;
            call p;
            write g
        end.
    "};
    let tree = optimized(source)?;
    assert_eq!(
        *tree.procedures[0].body.statement,
        Statement::compound(vec![Statement::assign("g", num(12))])
    );
    Ok(())
}

#[test]
fn test_overflow_is_not_folded() {
    let program = Block::from_statement(Statement::write(Expression::op(BinaryOp::Add, num(i64::MAX), num(1))));
    let outcome = optimize(&program, &OptimizerOptions::default());
    assert_eq!(outcome.tree, program);
    assert_eq!(outcome.stats.overflows_skipped, 1);
}

#[test]
fn test_optimize_is_idempotent() -> Pl0Result<()> {
    let sources = [
        "var x, y; begin x := 2 + 3; if x > 4 then y := 1 end.",
        "var a, b; begin read a; b := a * 1 + 0; while b > 0 do b := b - 1; write b / 1 end.",
        "var x, y; begin x := 5; while 0 do x := 1; y := x end.",
        "var i; begin i := 3; begin var t; t := i * 2; if t > 5 then write t end end.",
    ];
    for source in sources {
        let once = optimize(&parse_source(source)?, &OptimizerOptions::default()).tree;
        let twice = optimize(&once, &OptimizerOptions::default()).tree;
        assert_eq!(once, twice, "{}", source);
        let (_, changes) = rewrite(&once, &OptimizerOptions::default());
        assert_eq!(changes, 0, "{}", source);
    }
    Ok(())
}

#[test]
fn test_iteration_cap_warning() -> Pl0Result<()> {
    let program = parse_source("var x, y; begin x := 5; while 0 do x := 1; y := x end.")?;
    let options = OptimizerOptions {
        max_iterations: 1,
        ..OptimizerOptions::default()
    };
    let outcome = optimize(&program, &options);
    assert_eq!(outcome.stats.iterations, 1);
    assert!(!outcome.stats.reached_fixpoint);
    assert!(outcome
        .notes
        .contains(&OptimizationNote::IterationCapReached { rounds: 1 }));

    // without the cap the second round propagates x into y
    let full = optimize(&program, &OptimizerOptions::default());
    assert!(full.stats.reached_fixpoint);
    assert_eq!(
        *full.tree.statement,
        Statement::compound(vec![Statement::assign("x", num(5)), Statement::assign("y", num(5))])
    );
    Ok(())
}

#[test]
fn test_disabled_options_leave_tree() -> Pl0Result<()> {
    let program = parse_source("var x; begin x := 2 + 3; while 0 do x := 1 end.")?;
    let outcome = optimize(&program, &OptimizerOptions::disabled());
    assert_eq!(outcome.tree, program);
    assert!(OptimizerOptions::disabled().enabled_rules().is_empty());
    Ok(())
}

#[test]
fn test_propagation_only() -> Pl0Result<()> {
    let options = OptimizerOptions {
        constant_folding: false,
        algebraic_simplification: false,
        dead_code_elimination: false,
        ..OptimizerOptions::default()
    };
    let program = parse_source("var x, y; begin x := 4; y := x + 1 end.")?;
    let outcome = optimize(&program, &options);
    assert_eq!(
        *outcome.tree.statement,
        Statement::compound(vec![
            Statement::assign("x", num(4)),
            Statement::assign("y", Expression::op(BinaryOp::Add, num(4), num(1))),
        ])
    );
    Ok(())
}

#[test]
fn test_comparisons_fold_to_flags() {
    for op in BinaryOp::iter().filter(|op| op.is_comparison()) {
        let program = Block::from_statement(Statement::write(Expression::op(op, num(3), num(3))));
        let tree = optimize(&program, &OptimizerOptions::default()).tree;
        let expected = i64::from(matches!(op, BinaryOp::Eq | BinaryOp::Le | BinaryOp::Ge));
        assert_eq!(*tree.statement, Statement::write(num(expected)), "{}", op);
    }
}

#[test]
fn test_report_lists_rules() -> Pl0Result<()> {
    let program = parse_source("var x; begin x := 1 + 1; write x end.")?;
    let options = OptimizerOptions::default();
    let report = optimize(&program, &options).report("AST Optimization Report", &options);
    assert!(report.starts_with("AST Optimization Report\n"));
    assert!(report.contains("Optimizations Applied:"));
    assert!(report.contains("Constants folded:          1"));
    Ok(())
}
