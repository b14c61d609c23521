//! Visitors that flatten an AST into maps, for callers that only need the
//! selectors and their raw arguments.

mod map_visitor;

pub use map_visitor::*;
