use indexmap::IndexMap;

use crate::ast::{ComparisonNode, LogicalNode, NoArgRsqlVisitor};

/// Selector → arguments, in first-seen selector order.
pub type SimpleMap = IndexMap<String, Vec<String>>;

/// Selector → operator symbol → arguments.
pub type GroupedMap = IndexMap<String, IndexMap<String, Vec<String>>>;

/// Flattens an AST into a [SimpleMap].
///
/// Logical structure and operators are discarded; arguments of repeated
/// selectors are appended in traversal order.
///
/// # Examples
///
/// ```rust
/// use rsql::visitor::SimpleMapVisitor;
///
/// let node = rsql::parse("name==john;age=gt=30,name==jane").unwrap();
/// let map = node.accept_no_arg(&mut SimpleMapVisitor);
/// assert_eq!(map["name"], vec!["john", "jane"]);
/// assert_eq!(map["age"], vec!["30"]);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleMapVisitor;

impl SimpleMapVisitor {
    fn visit_logical(&mut self, node: &LogicalNode) -> SimpleMap {
        let mut map = SimpleMap::new();
        for child in node {
            for (selector, arguments) in child.accept_no_arg(self) {
                map.entry(selector).or_default().extend(arguments);
            }
        }
        map
    }
}

impl NoArgRsqlVisitor<SimpleMap> for SimpleMapVisitor {
    fn visit_and(&mut self, node: &LogicalNode) -> SimpleMap {
        self.visit_logical(node)
    }

    fn visit_or(&mut self, node: &LogicalNode) -> SimpleMap {
        self.visit_logical(node)
    }

    fn visit_comparison(&mut self, node: &ComparisonNode) -> SimpleMap {
        let mut map = SimpleMap::new();
        map.insert(node.selector().to_string(), node.arguments().to_vec());
        map
    }
}

/// Flattens an AST into a [GroupedMap], keeping arguments apart per operator.
///
/// Operators are keyed by their primary symbol, so `age>30` and `age=gt=40`
/// land in the same `=gt=` bucket.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupedMapVisitor;

impl GroupedMapVisitor {
    fn visit_logical(&mut self, node: &LogicalNode) -> GroupedMap {
        let mut map = GroupedMap::new();
        for child in node {
            for (selector, by_operator) in child.accept_no_arg(self) {
                let entry = map.entry(selector).or_default();
                for (symbol, arguments) in by_operator {
                    entry.entry(symbol).or_default().extend(arguments);
                }
            }
        }
        map
    }
}

impl NoArgRsqlVisitor<GroupedMap> for GroupedMapVisitor {
    fn visit_and(&mut self, node: &LogicalNode) -> GroupedMap {
        self.visit_logical(node)
    }

    fn visit_or(&mut self, node: &LogicalNode) -> GroupedMap {
        self.visit_logical(node)
    }

    fn visit_comparison(&mut self, node: &ComparisonNode) -> GroupedMap {
        let mut by_operator = IndexMap::new();
        by_operator.insert(
            node.operator().symbol().to_string(),
            node.arguments().to_vec(),
        );

        let mut map = GroupedMap::new();
        map.insert(node.selector().to_string(), by_operator);
        map
    }
}
