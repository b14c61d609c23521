use itertools::Itertools;
use std::fmt::Display;

use super::{ComparisonOperator, NoArgRsqlVisitor, NoArgVisitorAdapter, RsqlVisitor};
use crate::errors::{ErrorKind, RsqlError, RsqlResult};
use crate::parser::is_unreserved;

/// A node of the RSQL abstract syntax tree.
///
/// Nodes are immutable; every `with_*` method returns a new node. Consumers
/// either `match` on the variants directly or dispatch through a
/// [RsqlVisitor].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Comparison(ComparisonNode),
    And(LogicalNode),
    Or(LogicalNode),
}

impl Node {
    /// Combines `children` with the given logical operator.
    ///
    /// A single child is returned as is, so a one-element group never wraps
    /// its content.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidArgument] if `children` is empty.
    pub fn logical(operator: LogicalOperator, children: Vec<Node>) -> RsqlResult<Node> {
        let mut children = children;
        match children.len() {
            0 => {
                log::error!("Logical node {} requires at least one child", operator);
                Err(RsqlError::new(
                    "Logical node requires at least one child",
                    ErrorKind::InvalidArgument,
                ))
            }
            1 => Ok(children.remove(0)),
            _ => {
                let node = LogicalNode { operator, children };
                Ok(match operator {
                    LogicalOperator::And => Node::And(node),
                    LogicalOperator::Or => Node::Or(node),
                })
            }
        }
    }

    pub fn and(children: Vec<Node>) -> RsqlResult<Node> {
        Node::logical(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<Node>) -> RsqlResult<Node> {
        Node::logical(LogicalOperator::Or, children)
    }

    /// Creates a comparison node, see [ComparisonNode::new].
    pub fn comparison(
        operator: ComparisonOperator,
        selector: &str,
        arguments: Vec<String>,
    ) -> RsqlResult<Node> {
        ComparisonNode::new(operator, selector, arguments).map(Node::Comparison)
    }

    /// Dispatches to the visitor method of this node's variant.
    pub fn accept_with<R, A, V>(&self, visitor: &mut V, param: A) -> R
    where
        V: RsqlVisitor<R, A> + ?Sized,
    {
        match self {
            Node::Comparison(node) => visitor.visit_comparison(node, param),
            Node::And(node) => visitor.visit_and(node, param),
            Node::Or(node) => visitor.visit_or(node, param),
        }
    }

    /// Dispatches with a default parameter.
    pub fn accept<R, A, V>(&self, visitor: &mut V) -> R
    where
        A: Default,
        V: RsqlVisitor<R, A> + ?Sized,
    {
        self.accept_with(visitor, A::default())
    }

    /// Dispatches to a visitor that takes no parameter.
    pub fn accept_no_arg<R, V>(&self, visitor: &mut V) -> R
    where
        V: NoArgRsqlVisitor<R> + ?Sized,
    {
        self.accept_with(&mut NoArgVisitorAdapter::new(visitor), ())
    }

    pub fn as_comparison(&self) -> Option<&ComparisonNode> {
        match self {
            Node::Comparison(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<&LogicalNode> {
        match self {
            Node::And(node) | Node::Or(node) => Some(node),
            Node::Comparison(_) => None,
        }
    }

    #[inline]
    pub fn is_logical(&self) -> bool {
        !matches!(self, Node::Comparison(_))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Comparison(node) => write!(f, "{}", node),
            Node::And(node) | Node::Or(node) => write!(f, "{}", node),
        }
    }
}

impl From<ComparisonNode> for Node {
    fn from(node: ComparisonNode) -> Self {
        Node::Comparison(node)
    }
}

/// The logical operator joining the children of a [LogicalNode].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    /// `;`
    And,
    /// `,`
    Or,
}

impl LogicalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => ";",
            LogicalOperator::Or => ",",
        }
    }
}

impl Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An AND or OR node with two or more children kept in source order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogicalNode {
    operator: LogicalOperator,
    children: Vec<Node>,
}

impl LogicalNode {
    #[inline]
    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns a node with the same operator and new children.
    pub fn with_children(&self, children: Vec<Node>) -> RsqlResult<Node> {
        Node::logical(self.operator, children)
    }
}

impl<'a> IntoIterator for &'a LogicalNode {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

impl Display for LogicalNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.children.iter().join(self.operator.symbol()))
    }
}

/// A comparison `selector operator arguments`, the leaf of the tree.
///
/// The selector is a non-blank, possibly dotted, attribute path. Single-value
/// operators take exactly one argument; multi-value operators take one or more.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComparisonNode {
    operator: ComparisonOperator,
    selector: String,
    arguments: Vec<String>,
}

impl ComparisonNode {
    /// Creates a comparison node.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidArgument] if the selector is blank or
    /// holds a reserved character, if the argument list is empty, or if a
    /// single-value operator receives more than one argument.
    pub fn new(
        operator: ComparisonOperator,
        selector: &str,
        arguments: Vec<String>,
    ) -> RsqlResult<Self> {
        if selector.trim().is_empty() {
            log::error!("Selector must not be blank");
            return Err(RsqlError::new(
                "Selector must not be blank",
                ErrorKind::InvalidArgument,
            ));
        }

        if let Some(reserved) = selector.chars().find(|c| !is_unreserved(*c)) {
            log::error!("Selector {} contains reserved character '{}'", selector, reserved);
            return Err(RsqlError::new(
                &format!(
                    "Selector '{}' contains reserved character '{}'",
                    selector, reserved
                ),
                ErrorKind::InvalidArgument,
            ));
        }

        if arguments.is_empty() {
            log::error!("Comparison on {} requires at least one argument", selector);
            return Err(RsqlError::new(
                &format!("Comparison on '{}' requires at least one argument", selector),
                ErrorKind::InvalidArgument,
            ));
        }

        if !operator.is_multi_value() && arguments.len() != 1 {
            log::error!(
                "Operator {} expects a single argument, got {}",
                operator,
                arguments.len()
            );
            return Err(RsqlError::new(
                &format!(
                    "Operator {} expects a single argument, but {} were given",
                    operator,
                    arguments.len()
                ),
                ErrorKind::InvalidArgument,
            ));
        }

        Ok(ComparisonNode {
            operator,
            selector: selector.to_string(),
            arguments,
        })
    }

    #[inline]
    pub fn operator(&self) -> &ComparisonOperator {
        &self.operator
    }

    #[inline]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    #[inline]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn with_operator(&self, operator: ComparisonOperator) -> RsqlResult<Self> {
        ComparisonNode::new(operator, &self.selector, self.arguments.clone())
    }

    pub fn with_selector(&self, selector: &str) -> RsqlResult<Self> {
        ComparisonNode::new(self.operator.clone(), selector, self.arguments.clone())
    }

    pub fn with_arguments(&self, arguments: Vec<String>) -> RsqlResult<Self> {
        ComparisonNode::new(self.operator.clone(), &self.selector, arguments)
    }
}

impl Display for ComparisonNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.selector, self.operator)?;
        if self.operator.is_multi_value() {
            write!(f, "({})", self.arguments.iter().map(|a| quote(a)).join(","))
        } else {
            write!(f, "{}", format_argument(&self.arguments[0]))
        }
    }
}

fn format_argument(argument: &str) -> String {
    if !argument.is_empty() && argument.chars().all(is_unreserved) {
        argument.to_string()
    } else {
        quote(argument)
    }
}

fn quote(argument: &str) -> String {
    let mut quoted = String::with_capacity(argument.len() + 2);
    quoted.push('\'');
    for c in argument.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{equal, greater_than, is_in, not_in};

    fn comparison(selector: &str, argument: &str) -> Node {
        Node::comparison(equal(), selector, vec![argument.to_string()]).unwrap()
    }

    #[test]
    fn test_single_value_operator_accepts_one_argument() {
        let node = ComparisonNode::new(equal(), "name", vec!["john".into()]);
        assert!(node.is_ok());
    }

    #[test]
    fn test_single_value_operator_rejects_two_arguments() {
        let node = ComparisonNode::new(equal(), "name", vec!["a".into(), "b".into()]);
        assert_eq!(node.unwrap_err().kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_multi_value_operator_accepts_many_arguments() {
        let node = ComparisonNode::new(is_in(), "status", vec!["a".into(), "b".into()]);
        assert_eq!(node.unwrap().arguments().len(), 2);
    }

    #[test]
    fn test_empty_arguments_rejected() {
        let node = ComparisonNode::new(is_in(), "status", vec![]);
        assert!(node.is_err());
    }

    #[test]
    fn test_blank_selector_rejected() {
        let node = ComparisonNode::new(equal(), "  ", vec!["a".into()]);
        assert_eq!(node.unwrap_err().kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_selector_with_reserved_character_rejected() {
        for selector in ["first name", "a;b", "a=b", "x'y", "(a)"] {
            let node = ComparisonNode::new(equal(), selector, vec!["x".into()]);
            assert_eq!(node.unwrap_err().kind(), &ErrorKind::InvalidArgument, "{}", selector);
        }

        let node = Node::comparison(equal(), "address.zip_code", vec!["x y".into()]).unwrap();
        assert_eq!(crate::parse(&node.to_string()).unwrap(), node);
    }

    #[test]
    fn test_with_methods_return_new_nodes() {
        let node = ComparisonNode::new(equal(), "age", vec!["30".into()]).unwrap();
        let gt = node.with_operator(greater_than()).unwrap();
        assert_eq!(gt.operator(), &greater_than());
        assert_eq!(node.operator(), &equal());

        let renamed = node.with_selector("years").unwrap();
        assert_eq!(renamed.selector(), "years");
        assert_eq!(node.selector(), "age");

        assert!(node.with_arguments(vec!["1".into(), "2".into()]).is_err());
    }

    #[test]
    fn test_equality_includes_arguments() {
        let a = ComparisonNode::new(is_in(), "s", vec!["a".into(), "b".into()]).unwrap();
        let b = ComparisonNode::new(is_in(), "s", vec!["a".into(), "b".into()]).unwrap();
        let c = ComparisonNode::new(is_in(), "s", vec!["b".into(), "a".into()]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_logical_collapses_single_child() {
        let child = comparison("a", "1");
        let node = Node::and(vec![child.clone()]).unwrap();
        assert_eq!(node, child);
    }

    #[test]
    fn test_logical_rejects_no_children() {
        assert!(Node::or(vec![]).is_err());
    }

    #[test]
    fn test_logical_keeps_child_order() {
        let node = Node::or(vec![comparison("a", "1"), comparison("b", "2")]).unwrap();
        let selectors: Vec<_> = node
            .as_logical()
            .unwrap()
            .iter()
            .filter_map(|n| n.as_comparison())
            .map(|c| c.selector().to_string())
            .collect();
        assert_eq!(selectors, vec!["a", "b"]);
    }

    #[test]
    fn test_with_children() {
        let node = Node::and(vec![comparison("a", "1"), comparison("b", "2")]).unwrap();
        let logical = node.as_logical().unwrap();
        let replaced = logical.with_children(vec![comparison("c", "3")]).unwrap();
        assert_eq!(replaced, comparison("c", "3"));
        assert_eq!(logical.len(), 2);
    }

    #[test]
    fn test_display_single_argument() {
        assert_eq!(comparison("name", "john").to_string(), "name==john");
        assert_eq!(comparison("name", "john doe").to_string(), "name=='john doe'");
        assert_eq!(comparison("name", "").to_string(), "name==''");
        assert_eq!(comparison("name", "a'b").to_string(), r"name=='a\'b'");
    }

    #[test]
    fn test_display_multi_argument() {
        let node = Node::comparison(not_in(), "s", vec!["a".into(), "b c".into()]).unwrap();
        assert_eq!(node.to_string(), "s=out=('a','b c')");
    }

    #[test]
    fn test_display_logical() {
        let inner = Node::and(vec![comparison("b", "2"), comparison("c", "3")]).unwrap();
        let node = Node::or(vec![comparison("a", "1"), inner]).unwrap();
        assert_eq!(node.to_string(), "(a==1,(b==2;c==3))");
    }
}
