//! Tokenizer and recursive-descent parser for RSQL text.

mod lexer;
mod rsql_parser;

pub use lexer::*;
pub use rsql_parser::*;
