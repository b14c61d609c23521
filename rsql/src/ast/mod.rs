//! The RSQL abstract syntax tree.
//!
//! A parsed filter is a [Node]: either a [ComparisonNode] leaf such as
//! `age=gt=30`, or an AND/OR [LogicalNode] combining two or more children.
//! Nodes are immutable and compare structurally, so two parses of equivalent
//! text produce equal trees.
//!
//! # Operators
//!
//! | Operator              | Symbols          | Multi-value |
//! |-----------------------|------------------|-------------|
//! | equal                 | `==`             | no          |
//! | not equal             | `!=`             | no          |
//! | greater than          | `=gt=`, `>`      | no          |
//! | greater than or equal | `=ge=`, `>=`     | no          |
//! | less than             | `=lt=`, `<`      | no          |
//! | less than or equal    | `=le=`, `<=`     | no          |
//! | in                    | `=in=`           | yes         |
//! | not in                | `=out=`          | yes         |
//!
//! Further operators are added through an [OperatorRegistry]; see
//! [extended_operators] for a ready-made set.

mod factory;
mod node;
mod operator;
mod registry;
mod visitor;

pub use factory::*;
pub use node::*;
pub use operator::*;
pub use registry::*;
pub use visitor::*;
