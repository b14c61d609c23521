//! # RSQL - Query Filter Compiler
//!
//! RSQL is a URI-friendly filter language, a superset of FIQL, for expressing
//! record filters in HTTP query strings:
//!
//! ```text
//! name==john;age=gt=30,status=in=(active,pending)
//! ```
//!
//! This crate parses such text into an immutable syntax tree and compiles the
//! tree against an entity schema into conditions of a storage-specific
//! [PredicateBuilder](resolver::PredicateBuilder).
//!
//! ## Quick Start
//!
//! ```rust
//! use rsql::common::ValueType;
//! use rsql::resolver::{EntitySchema, SchemaRegistry};
//! use rsql::{RsqlCompiler, RsqlConfig};
//!
//! let schema = SchemaRegistry::new();
//! schema.register(
//!     EntitySchema::builder("Person")
//!         .basic("name", ValueType::String)
//!         .basic("age", ValueType::I32)
//!         .build(),
//! );
//!
//! let config = RsqlConfig::new();
//! config.blacklist("Person", &["password"]);
//!
//! let compiler = RsqlCompiler::with_expressions(config, schema);
//! let filter = compiler.compile("name==john,age=gt=30", "Person").unwrap();
//! assert_eq!(filter.leaves().len(), 2);
//! ```
//!
//! ## Grammar
//!
//! `;` is AND, `,` is OR and binds looser than `;`, parentheses group.
//! A comparison is `selector operator arguments`, where arguments are a single
//! value or a parenthesised list for multi-value operators. Values with
//! reserved characters are single or double quoted with `\` escapes.
//!
//! ## Module Organization
//!
//! - [`ast`] - Syntax tree, comparison operators and the visitor protocol
//! - [`parser`] - Lexer and recursive-descent parser
//! - [`visitor`] - Visitors flattening a tree into maps
//! - [`resolver`] - Schema lookup, argument conversion and predicate building
//! - [`common`] - Typed argument values
//! - [`errors`] - Error types and result definitions

pub mod ast;
pub mod common;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod parser;
pub mod resolver;
pub mod visitor;

pub use compiler::RsqlCompiler;
pub use config::{ConversionFailurePolicy, RsqlConfig, RsqlConfigBuilder};
pub use errors::{ErrorKind, RsqlError, RsqlResult};

use ast::Node;
use parser::RsqlParser;

/// Parses `input` with the default operators.
///
/// # Examples
///
/// ```rust
/// let node = rsql::parse("name=='john doe';age=ge=18").unwrap();
/// assert!(node.is_logical());
/// ```
pub fn parse(input: &str) -> RsqlResult<Node> {
    RsqlParser::new().parse(input)
}
