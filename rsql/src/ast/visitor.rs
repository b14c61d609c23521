use super::{ComparisonNode, LogicalNode};

/// A visitor over the RSQL syntax tree.
///
/// `R` is the result type and `A` an extra parameter threaded through the
/// traversal (for example the entity type being resolved). Implementations of
/// `visit_and`/`visit_or` recurse into the children themselves, in order, with
/// [Node::accept_with](super::Node::accept_with).
///
/// # Examples
///
/// ```rust
/// use rsql::ast::{ComparisonNode, LogicalNode, Node, RsqlVisitor};
///
/// struct Depth;
///
/// impl RsqlVisitor<usize, usize> for Depth {
///     fn visit_and(&mut self, node: &LogicalNode, depth: usize) -> usize {
///         node.iter().map(|c| c.accept_with(self, depth + 1)).max().unwrap_or(depth)
///     }
///     fn visit_or(&mut self, node: &LogicalNode, depth: usize) -> usize {
///         self.visit_and(node, depth)
///     }
///     fn visit_comparison(&mut self, _node: &ComparisonNode, depth: usize) -> usize {
///         depth
///     }
/// }
///
/// let node = rsql::parse("a==1;(b==2,c==3)").unwrap();
/// assert_eq!(node.accept::<usize, usize, _>(&mut Depth), 2);
/// ```
pub trait RsqlVisitor<R, A> {
    fn visit_and(&mut self, node: &LogicalNode, param: A) -> R;

    fn visit_or(&mut self, node: &LogicalNode, param: A) -> R;

    fn visit_comparison(&mut self, node: &ComparisonNode, param: A) -> R;
}

/// A visitor that does not need a traversal parameter.
///
/// Dispatch with [Node::accept_no_arg](super::Node::accept_no_arg).
pub trait NoArgRsqlVisitor<R> {
    fn visit_and(&mut self, node: &LogicalNode) -> R;

    fn visit_or(&mut self, node: &LogicalNode) -> R;

    fn visit_comparison(&mut self, node: &ComparisonNode) -> R;
}

/// Adapts a [NoArgRsqlVisitor] to the [RsqlVisitor] protocol with a `()` parameter.
pub struct NoArgVisitorAdapter<'a, V: ?Sized> {
    visitor: &'a mut V,
}

impl<'a, V: ?Sized> NoArgVisitorAdapter<'a, V> {
    pub fn new(visitor: &'a mut V) -> Self {
        NoArgVisitorAdapter { visitor }
    }
}

impl<R, V> RsqlVisitor<R, ()> for NoArgVisitorAdapter<'_, V>
where
    V: NoArgRsqlVisitor<R> + ?Sized,
{
    #[inline]
    fn visit_and(&mut self, node: &LogicalNode, _param: ()) -> R {
        self.visitor.visit_and(node)
    }

    #[inline]
    fn visit_or(&mut self, node: &LogicalNode, _param: ()) -> R {
        self.visitor.visit_or(node)
    }

    #[inline]
    fn visit_comparison(&mut self, node: &ComparisonNode, _param: ()) -> R {
        self.visitor.visit_comparison(node)
    }
}
