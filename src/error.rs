use crate::lexer::LexError;
use std::io;
use thiserror::Error;

/// Failures of the host around a program: reading it, lexing it, parsing it,
/// or a run that ends in a runtime error.
#[derive(Debug, Error)]
pub enum MonkeyError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("parser errors:\n\t{}", .0.join("\n\t"))]
    Parse(Vec<String>),
    #[error("Error: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
