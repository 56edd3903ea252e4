use crate::ast::{BinaryOp, Block, Expression, Procedure, Statement};
use crate::frontend::token::Token;
use crate::utils::errors::{Pl0Error, Pl0Result};
use std::slice::Iter;

pub struct Parser<'a> {
    current_token: Token,
    line_number: usize,
    iter: Iter<'a, (Token, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [(Token, usize)]) -> Self {
        let mut parser = Self {
            current_token: Token::Eof,
            line_number: 1,
            iter: tokens.iter(),
        };
        parser.next();
        parser
    }

    fn next(&mut self) {
        match self.iter.next() {
            Some((element, line)) => {
                self.current_token = element.clone();
                self.line_number = *line;
            }
            None => self.current_token = Token::Eof,
        }
    }

    fn expect(&mut self, expected: Token) -> Pl0Result<()> {
        if !expected.same_kind(&self.current_token) {
            return Err(Pl0Error::syntax_error(
                expected.to_string(),
                self.current_token.to_string(),
                self.line_number,
            ));
        }
        self.next();
        Ok(())
    }

    fn expect_ident(&mut self) -> Pl0Result<String> {
        match &self.current_token {
            Token::Ident(id) => {
                let id = id.clone();
                self.next();
                Ok(id)
            }
            other => Err(Pl0Error::syntax_error("identifier", other.to_string(), self.line_number)),
        }
    }

    /// `program = block ["."]`
    pub fn parse_program(&mut self) -> Pl0Result<Block> {
        let block = self.parse_block()?;
        if self.current_token == Token::Dot {
            self.next();
        }
        if self.current_token != Token::Eof {
            return Err(Pl0Error::UnexpectedToken {
                token: self.current_token.to_string(),
                line: self.line_number,
            });
        }
        Ok(block)
    }

    fn parse_block(&mut self) -> Pl0Result<Block> {
        let variables = self.parse_var_declarations()?;
        let mut procedures = Vec::new();
        while self.current_token == Token::Procedure {
            self.next();
            let name = self.expect_ident()?;
            self.expect(Token::Semicolon)?;
            let body = self.parse_block()?;
            self.expect(Token::Semicolon)?;
            procedures.push(Procedure::new(name, body));
        }
        let statement = self.parse_statement()?;
        Ok(Block::new(variables, procedures, statement))
    }

    fn parse_var_declarations(&mut self) -> Pl0Result<Vec<String>> {
        let mut variables = Vec::new();
        if self.current_token != Token::Var {
            return Ok(variables);
        }
        self.next();
        variables.push(self.expect_ident()?);
        while self.current_token == Token::Comma {
            self.next();
            variables.push(self.expect_ident()?);
        }
        self.expect(Token::Semicolon)?;
        Ok(variables)
    }

    fn parse_statement(&mut self) -> Pl0Result<Statement> {
        match self.current_token.clone() {
            Token::Ident(var) => {
                self.next();
                self.expect(Token::Assign)?;
                Ok(Statement::assign(var, self.parse_expression()?))
            }
            Token::Call => {
                self.next();
                Ok(Statement::call(self.expect_ident()?))
            }
            Token::Read => {
                self.next();
                Ok(Statement::read(self.expect_ident()?))
            }
            Token::Write => {
                self.next();
                Ok(Statement::write(self.parse_expression()?))
            }
            Token::Begin => self.parse_begin(),
            Token::If => {
                self.next();
                let condition = self.parse_condition()?;
                self.expect(Token::Then)?;
                Ok(Statement::if_then(condition, self.parse_statement()?))
            }
            Token::While => {
                self.next();
                let condition = self.parse_condition()?;
                self.expect(Token::Do)?;
                Ok(Statement::while_do(condition, self.parse_statement()?))
            }
            // empty statement
            _ => Ok(Statement::empty()),
        }
    }

    fn parse_begin(&mut self) -> Pl0Result<Statement> {
        self.expect(Token::Begin)?;
        let variables = self.parse_var_declarations()?;
        let mut statements = Vec::new();
        loop {
            let stmt = self.parse_statement()?;
            if !stmt.is_empty() || matches!(stmt, Statement::NestedBlock { .. }) {
                statements.push(stmt);
            }
            if self.current_token != Token::Semicolon {
                break;
            }
            self.next();
        }
        self.expect(Token::End)?;
        if variables.is_empty() {
            Ok(Statement::compound(statements))
        } else {
            Ok(Statement::nested(variables, statements))
        }
    }

    fn parse_condition(&mut self) -> Pl0Result<Expression> {
        let left = self.parse_expression()?;
        let op = match self.current_token {
            Token::Equal => BinaryOp::Eq,
            Token::LessThan => BinaryOp::Lt,
            Token::GreaterThan => BinaryOp::Gt,
            Token::LessThanEqual => BinaryOp::Le,
            Token::GreaterThanEqual => BinaryOp::Ge,
            _ => {
                return Err(Pl0Error::syntax_error(
                    "comparison operator",
                    self.current_token.to_string(),
                    self.line_number,
                ))
            }
        };
        self.next();
        let right = self.parse_expression()?;
        Ok(Expression::op(op, left, right))
    }

    fn parse_expression(&mut self) -> Pl0Result<Expression> {
        let negate = match self.current_token {
            Token::Minus => {
                self.next();
                true
            }
            Token::Plus => {
                self.next();
                false
            }
            _ => false,
        };
        let mut expr = self.parse_term()?;
        if negate {
            expr = match expr {
                Expression::Number(n) => Expression::num(-n),
                other => Expression::op(BinaryOp::Sub, Expression::num(0), other),
            };
        }
        loop {
            let op = match self.current_token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.next();
            let right = self.parse_term()?;
            expr = Expression::op(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Pl0Result<Expression> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = match self.current_token {
                Token::Multiply => BinaryOp::Mul,
                Token::Divide => BinaryOp::Div,
                _ => break,
            };
            self.next();
            let right = self.parse_factor()?;
            expr = Expression::op(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Pl0Result<Expression> {
        match self.current_token.clone() {
            Token::Ident(name) => {
                self.next();
                Ok(Expression::Variable(name))
            }
            Token::Number(value) => {
                self.next();
                Ok(Expression::Number(value))
            }
            Token::LParen => {
                self.next();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            other => Err(Pl0Error::syntax_error("expression", other.to_string(), self.line_number)),
        }
    }
}

/// Parse a token stream produced by [`crate::frontend::lexer::scan`].
pub fn parse(tokens: &[(Token, usize)]) -> Pl0Result<Block> {
    Parser::new(tokens).parse_program()
}
