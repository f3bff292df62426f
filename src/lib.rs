pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use error::MonkeyError;

use lexer::{token::TokenSlice, Lexer};
use parser::{ast::Program, Parser};

/// Lexes and parses a whole program, failing if there is any syntax error.
pub fn parse_source(source: &str) -> Result<Program, MonkeyError> {
    let tokens = Lexer::new().lex_input(source)?;

    let mut parser = Parser::new();
    let program = parser.parse(TokenSlice::from_tokens(&tokens));

    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(MonkeyError::Parse(parser.errors().to_vec()))
    }
}
