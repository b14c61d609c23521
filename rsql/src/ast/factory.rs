use super::{ComparisonNode, LogicalOperator, Node, OperatorRegistry};
use crate::errors::{ErrorKind, RsqlError, RsqlResult};

/// Builds AST nodes for the parser.
///
/// The factory owns the operator registry used to interpret comparison
/// symbols, so a parser built over a reduced registry only accepts that
/// subset of operators.
#[derive(Clone, Default)]
pub struct NodesFactory {
    operators: OperatorRegistry,
}

impl NodesFactory {
    pub fn new(operators: OperatorRegistry) -> Self {
        NodesFactory { operators }
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Creates an AND or OR node, collapsing a single child.
    pub fn create_logical_node(
        &self,
        operator: LogicalOperator,
        children: Vec<Node>,
    ) -> RsqlResult<Node> {
        Node::logical(operator, children)
    }

    /// Creates a comparison node for the operator registered under `symbol`.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::UnknownOperator] if `symbol` is not registered
    /// * [ErrorKind::InvalidArgument] if the arguments do not fit the operator
    pub fn create_comparison_node(
        &self,
        symbol: &str,
        selector: &str,
        arguments: Vec<String>,
    ) -> RsqlResult<Node> {
        match self.operators.get(symbol) {
            Some(operator) => {
                ComparisonNode::new(operator, selector, arguments).map(Node::Comparison)
            }
            None => {
                log::error!("Unknown operator: {}", symbol);
                Err(RsqlError::new(
                    &format!("Unknown operator: {}", symbol),
                    ErrorKind::UnknownOperator(symbol.to_string()),
                ))
            }
        }
    }
}
