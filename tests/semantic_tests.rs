use indoc::indoc;
use pl0pipe::ast::{BinaryOp, Block, Expression, Statement};
use pl0pipe::frontend::parse_source;
use pl0pipe::semantic::{check_program, TypeCheckResult};
use pl0pipe::utils::errors::Pl0Result;

fn check(source: &str) -> Pl0Result<TypeCheckResult> {
    Ok(check_program(&parse_source(source)?))
}

fn error_texts(result: &TypeCheckResult) -> Vec<String> {
    result.errors().map(|d| d.text.clone()).collect()
}

fn warning_texts(result: &TypeCheckResult) -> Vec<String> {
    result.warnings().map(|d| d.text.clone()).collect()
}

#[test]
fn test_well_typed_program() -> Pl0Result<()> {
    let source = indoc! {"
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
    let result = check(source)?;
    assert_eq!(result.error_count(), 0, "{:?}", result.diagnostics);
    assert_eq!(result.warning_count(), 0, "{:?}", result.diagnostics);
    assert_eq!(result.symbol_count(), 3);
    assert!(result.report().contains("program is well typed"));
    assert_eq!(result.error_listing(), "No type errors found\n");
    Ok(())
}

#[test]
fn test_undeclared_variable_reported_once() -> Pl0Result<()> {
    // Purpose: repeated uses of one unknown name in one scope give one error
    let result = check("begin write z; write z + 1; z := 2 end")?;
    assert_eq!(error_texts(&result), vec!["Variable 'z' used before declaration".to_string()]);
    let listing = result.error_listing();
    assert!(listing.contains("hint: declare 'z' with 'var z;'"));
    Ok(())
}

#[test]
fn test_undeclared_in_each_scope() -> Pl0Result<()> {
    let source = indoc! {"
        procedure p;
            write z;
        begin
            call p;
            write z
        end.
    "};
    let result = check(source)?;
    assert_eq!(result.error_count(), 2);
    let scopes: Vec<&str> = result.errors().map(|d| d.scope.as_str()).collect();
    assert_eq!(scopes, vec!["main::p", "main"]);
    Ok(())
}

#[test]
fn test_redeclaration() -> Pl0Result<()> {
    let result = check("var x, x; x := 1.")?;
    let errors = error_texts(&result);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Redeclaration:"));
    Ok(())
}

#[test]
fn test_call_errors() -> Pl0Result<()> {
    let result = check("var v; begin v := 1; call v; call nowhere; write v end")?;
    assert_eq!(
        error_texts(&result),
        vec![
            "'v' is a variable and cannot be called".to_string(),
            "Call to undeclared procedure 'nowhere'".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_procedure_misused_as_value() -> Pl0Result<()> {
    let source = indoc! {"
        var x;
        procedure p;
            x := 1;
        begin
            x := p + 1;
            p := 2;
            write x
        end.
    "};
    let result = check(source)?;
    assert_eq!(
        error_texts(&result),
        vec![
            "Procedure 'p' cannot be used as a value".to_string(),
            "Cannot assign procedure 'p'".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_boolean_in_arithmetic() {
    // x := (y > 1) + 2, built directly since the grammar only allows comparisons in conditions
    let program = Block::new(
        vec!["x".to_string(), "y".to_string()],
        vec![],
        Statement::compound(vec![
            Statement::assign("y", Expression::num(1)),
            Statement::assign(
                "x",
                Expression::op(
                    BinaryOp::Add,
                    Expression::op(BinaryOp::Gt, Expression::var("y"), Expression::num(1)),
                    Expression::num(2),
                ),
            ),
            Statement::write(Expression::var("x")),
        ]),
    );
    let result = check_program(&program);
    let errors = error_texts(&result);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Arithmetic operator '+' requires integer operands"));
}

#[test]
fn test_boolean_assignment_and_integer_condition() {
    let comparison = Expression::op(BinaryOp::Lt, Expression::num(1), Expression::num(2));
    let program = Block::new(
        vec!["x".to_string()],
        vec![],
        Statement::compound(vec![
            Statement::assign("x", comparison.clone()),
            Statement::if_then(Expression::var("x"), Statement::write(Expression::var("x"))),
            Statement::while_do(
                Expression::op(BinaryOp::Eq, comparison, Expression::num(1)),
                Statement::write(Expression::var("x")),
            ),
        ]),
    );
    let result = check_program(&program);
    let errors = error_texts(&result);
    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors[0].starts_with("Type mismatch: cannot assign boolean value"));
    assert_eq!(errors[1], "IF condition must be boolean, found integer");
    assert!(errors[2].starts_with("Comparison '=' requires operands of the same type"));
}

#[test]
fn test_unused_and_unassigned_warnings() -> Pl0Result<()> {
    let result = check("var a, b, c; begin c := 1; write b + c end")?;
    assert_eq!(result.error_count(), 0);
    assert_eq!(
        warning_texts(&result),
        vec![
            "Variable 'a' is declared but never used".to_string(),
            "Variable 'b' is used but never assigned".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_nested_block_scope() -> Pl0Result<()> {
    let result = check("var x; begin x := 1; begin var x; x := 2; write x end; write x end")?;
    assert_eq!(result.error_count(), 0);
    let paths: Vec<&str> = result.scopes.iter().map(|(path, _)| path.as_str()).collect();
    assert_eq!(paths, vec!["main::block", "main"]);
    assert!(result.analysis().contains("Scope main::block"));
    Ok(())
}

#[test]
fn test_read_counts_as_assignment() -> Pl0Result<()> {
    let result = check("var x; begin read x; write x end")?;
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    Ok(())
}
