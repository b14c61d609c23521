//! Typed argument values shared across the compiler.

mod value;

pub use value::*;
