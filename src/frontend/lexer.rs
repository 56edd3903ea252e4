use crate::frontend::token::Token;
use crate::utils::errors::{Pl0Error, Pl0Result};
use crate::LineNumber;
use std::{iter::Peekable, str::Chars};

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    state: &'a mut LineNumber,
}

impl<'a> Lexer<'a> {
    pub fn new(file_content: &'a str, state: &'a mut LineNumber) -> Self {
        Self {
            chars: file_content.chars().peekable(),
            state,
        }
    }

    pub fn scan(mut self) -> Pl0Result<Vec<(Token, usize)>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            if self.chars.peek().is_none() {
                break;
            }
            let line = self.state.line;
            tokens.push((self.scan_token()?, line));
        }
        Ok(tokens)
    }

    fn skip_whitespace_and_comments(&mut self) -> Pl0Result<()> {
        loop {
            match self.chars.peek() {
                Some(&'{') => self.scan_comment()?,
                Some(&ch) if ch.is_whitespace() => self.scan_whitespace(),
                _ => break,
            }
        }
        Ok(())
    }

    fn scan_token(&mut self) -> Pl0Result<Token> {
        match self.chars.peek() {
            Some(&ch) if ch.is_alphabetic() || ch == '_' => Ok(self.scan_identifier()),
            Some(&ch) if ch.is_ascii_digit() => self.scan_number(),
            Some(&':') => self.scan_assignment(),
            Some(&'<') => Ok(self.scan_compound_operator(Token::LessThan, Token::LessThanEqual)),
            Some(&'>') => Ok(self.scan_compound_operator(Token::GreaterThan, Token::GreaterThanEqual)),
            Some(&ch) => self.scan_single_char_token(ch),
            None => Ok(Token::Eof),
        }
    }

    fn scan_comment(&mut self) -> Pl0Result<()> {
        self.chars.next(); // Consume '{'
        let start_line = self.state.line;
        for ch in self.chars.by_ref() {
            if ch == '\n' {
                self.state.line += 1;
            } else if ch == '}' {
                return Ok(());
            }
        }
        Err(Pl0Error::UnterminatedComment { line: start_line })
    }

    fn scan_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if !ch.is_whitespace() {
                break;
            }
            if ch == '\n' {
                self.state.line += 1;
            }
            self.chars.next();
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let mut identifier = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        keyword_or_identifier(identifier)
    }

    fn scan_number(&mut self) -> Pl0Result<Token> {
        let mut number_str = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_alphanumeric() {
                number_str.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        number_str
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|_| Pl0Error::InvalidNumber {
                number: number_str,
                line: self.state.line,
            })
    }

    fn scan_assignment(&mut self) -> Pl0Result<Token> {
        self.chars.next(); // Consume ':'
        match self.chars.peek() {
            Some(&'=') => {
                self.chars.next();
                Ok(Token::Assign)
            }
            _ => Err(Pl0Error::lexer_error("Expected '=' after ':'", self.state.line)),
        }
    }

    fn scan_compound_operator(&mut self, single: Token, with_equal: Token) -> Token {
        self.chars.next();
        if self.chars.peek() == Some(&'=') {
            self.chars.next();
            with_equal
        } else {
            single
        }
    }

    fn scan_single_char_token(&mut self, ch: char) -> Pl0Result<Token> {
        self.chars.next(); // Consume the character
        let token = match ch {
            '.' => Token::Dot,
            '=' => Token::Equal,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Multiply,
            '/' => Token::Divide,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '?' => Token::Read,
            '!' => Token::Write,
            _ => {
                return Err(Pl0Error::UnknownToken {
                    token: ch,
                    line: self.state.line,
                })
            }
        };
        Ok(token)
    }
}

fn keyword_or_identifier(identifier: String) -> Token {
    match identifier.as_str() {
        "var" => Token::Var,
        "procedure" => Token::Procedure,
        "call" => Token::Call,
        "begin" => Token::Begin,
        "end" => Token::End,
        "if" => Token::If,
        "then" => Token::Then,
        "while" => Token::While,
        "do" => Token::Do,
        "read" => Token::Read,
        "write" => Token::Write,
        _ => Token::Ident(identifier),
    }
}

/// Tokenize a whole source text; each token carries its line number.
pub fn scan(state: &mut LineNumber, file_content: &str) -> Pl0Result<Vec<(Token, usize)>> {
    Lexer::new(file_content, state).scan()
}
