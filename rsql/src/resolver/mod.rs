//! Semantic resolution of a parsed filter.
//!
//! The resolver walks the AST against a [SchemaProvider], applies the
//! selector remappings and access lists of the [RsqlConfig](crate::RsqlConfig),
//! converts arguments to attribute types with a [ValueConverter] and hands the
//! resulting [ResolvedLeaf]s to a [PredicateBuilder].

mod cache;
mod converter;
mod predicate;
mod rsql_resolver;
mod schema;

pub use cache::*;
pub use converter::*;
pub use predicate::*;
pub use rsql_resolver::*;
pub use schema::*;
