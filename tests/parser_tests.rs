use indoc::indoc;
use pl0pipe::ast::{pretty, BinaryOp, Block, Expression, Procedure, Statement};
use pl0pipe::frontend::{lexer::scan, parse_source, parser::Parser};
use pl0pipe::utils::errors::{Pl0Error, Pl0Result};
use pl0pipe::LineNumber;

fn num(n: i64) -> Expression {
    Expression::num(n)
}

fn var(name: &str) -> Expression {
    Expression::var(name)
}

#[test]
fn test_parse_with_explicit_tokens() -> Pl0Result<()> {
    let mut state = LineNumber::default();
    let tokens = scan(&mut state, "var x; x := 1.")?;
    let block = Parser::new(&tokens).parse_program()?;
    assert_eq!(
        block,
        Block::new(vec!["x".to_string()], vec![], Statement::assign("x", num(1)))
    );
    Ok(())
}

#[test]
fn test_final_dot_is_optional() -> Pl0Result<()> {
    assert_eq!(parse_source("write 1")?, parse_source("write 1.")?);
    Ok(())
}

#[test]
fn test_procedures_and_calls() -> Pl0Result<()> {
    let source = indoc! {"
        var x;
        procedure inc;
            x := x + 1;
        begin
            x := 0;
            call inc;
            write x
        end.
    "};
    let block = parse_source(source)?;
    let expected = Block::new(
        vec!["x".to_string()],
        vec![Procedure::new(
            "inc",
            Block::from_statement(Statement::assign("x", Expression::op(BinaryOp::Add, var("x"), num(1)))),
        )],
        Statement::compound(vec![
            Statement::assign("x", num(0)),
            Statement::call("inc"),
            Statement::write(var("x")),
        ]),
    );
    assert_eq!(block, expected);
    Ok(())
}

#[test]
fn test_operator_precedence() -> Pl0Result<()> {
    // Test: * and / bind tighter than + and -, both left associative
    let block = parse_source("x := 1 + 2 * 3 - 8 / 4 / 2")?;
    let expected = Expression::op(
        BinaryOp::Sub,
        Expression::op(BinaryOp::Add, num(1), Expression::op(BinaryOp::Mul, num(2), num(3))),
        Expression::op(
            BinaryOp::Div,
            Expression::op(BinaryOp::Div, num(8), num(4)),
            num(2),
        ),
    );
    assert_eq!(*block.statement, Statement::assign("x", expected));
    Ok(())
}

#[test]
fn test_unary_minus() -> Pl0Result<()> {
    let block = parse_source("begin a := -5; b := -(a + 1) end")?;
    let expected = Statement::compound(vec![
        Statement::assign("a", num(-5)),
        Statement::assign(
            "b",
            Expression::op(BinaryOp::Sub, num(0), Expression::op(BinaryOp::Add, var("a"), num(1))),
        ),
    ]);
    assert_eq!(*block.statement, expected);
    Ok(())
}

#[test]
fn test_conditions_and_loops() -> Pl0Result<()> {
    let source = indoc! {"
        var i;
        begin
            i := 10;
            while i >= 1 do
                begin
                    if i = 5 then write i;
                    i := i - 1
                end
        end.
    "};
    let block = parse_source(source)?;
    let expected = Statement::compound(vec![
        Statement::assign("i", num(10)),
        Statement::while_do(
            Expression::op(BinaryOp::Ge, var("i"), num(1)),
            Statement::compound(vec![
                Statement::if_then(Expression::op(BinaryOp::Eq, var("i"), num(5)), Statement::write(var("i"))),
                Statement::assign("i", Expression::op(BinaryOp::Sub, var("i"), num(1))),
            ]),
        ),
    ]);
    assert_eq!(*block.statement, expected);
    Ok(())
}

#[test]
fn test_nested_block_with_declarations() -> Pl0Result<()> {
    let block = parse_source("begin var t; t := 1; write t end.")?;
    assert_eq!(
        *block.statement,
        Statement::nested(
            vec!["t".to_string()],
            vec![Statement::assign("t", num(1)), Statement::write(var("t"))]
        )
    );
    Ok(())
}

#[test]
fn test_empty_statements_are_dropped() -> Pl0Result<()> {
    let block = parse_source("begin ; x := 1;; ; end")?;
    assert_eq!(
        *block.statement,
        Statement::compound(vec![Statement::assign("x", num(1))])
    );
    Ok(())
}

#[test]
fn test_missing_statement_is_empty() -> Pl0Result<()> {
    let block = parse_source("var x; .")?;
    assert!(block.statement.is_empty());
    Ok(())
}

#[test]
fn test_read_write_shorthand() -> Pl0Result<()> {
    assert_eq!(parse_source("begin ? x; ! x end")?, parse_source("begin read x; write x end")?);
    Ok(())
}

#[test]
fn test_syntax_error_reports_line() {
    let source = "var x;\nbegin\n  x := \nend.";
    match parse_source(source) {
        Err(Pl0Error::SyntaxError { expected, line, .. }) => {
            assert_eq!(expected, "expression");
            assert_eq!(line, 4);
        }
        other => panic!("Expected SyntaxError, got: {:?}", other),
    }
}

#[test]
fn test_condition_requires_comparison() {
    let result = parse_source("if x then write x");
    assert!(matches!(result, Err(Pl0Error::SyntaxError { .. })));
}

#[test]
fn test_trailing_tokens_rejected() {
    let result = parse_source("write 1. write 2");
    match result {
        Err(Pl0Error::UnexpectedToken { line, .. }) => assert_eq!(line, 1),
        other => panic!("Expected UnexpectedToken, got: {:?}", other),
    }
}

#[test]
fn test_pretty_print_reparses() -> Pl0Result<()> {
    // Purpose: the printer's output is valid source for the same tree
    let source = indoc! {"
        var a, b;
        procedure p;
            var c;
            begin
                c := (-3 - a) * 2;
                if c > b then b := c
            end;
        begin
            read a;
            b := 0;
            begin var t; t := a / 2; write t end;
            while a > 0 do a := a - 1;
            call p;
            write b
        end.
    "};
    let block = parse_source(source)?;
    let printed = pretty(&block);
    assert!(printed.ends_with(".\n"));
    assert_eq!(parse_source(&printed)?, block);
    Ok(())
}
