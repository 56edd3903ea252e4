pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;

use crate::ast::Block;
use crate::utils::errors::Pl0Result;
use crate::LineNumber;

/// Lex and parse a complete program.
pub fn parse_source(source: &str) -> Pl0Result<Block> {
    let mut state = LineNumber::default();
    let tokens = lexer::scan(&mut state, source)?;
    parser::parse(&tokens)
}
