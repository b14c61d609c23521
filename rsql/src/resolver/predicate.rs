use itertools::Itertools;
use std::fmt::Display;
use std::sync::Arc;

use super::AttributeDescriptor;
use crate::ast::ComparisonOperator;
use crate::common::{Value, ValueType};
use crate::errors::RsqlResult;

/// One traversed step of a selector path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSegment {
    entity: String,
    attribute: AttributeDescriptor,
}

impl PathSegment {
    pub fn new(entity: &str, attribute: AttributeDescriptor) -> Self {
        PathSegment {
            entity: entity.to_string(),
            attribute,
        }
    }

    /// The entity owning the attribute.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn attribute(&self) -> &AttributeDescriptor {
        &self.attribute
    }
}

/// A comparison whose selector and arguments have been resolved against the
/// schema, ready to be turned into a storage condition.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedLeaf {
    entity: String,
    selector: String,
    path: Vec<PathSegment>,
    operator: ComparisonOperator,
    values: Vec<Value>,
    value_type: ValueType,
}

impl ResolvedLeaf {
    pub fn new(
        entity: &str,
        selector: &str,
        path: Vec<PathSegment>,
        operator: ComparisonOperator,
        values: Vec<Value>,
        value_type: ValueType,
    ) -> Self {
        ResolvedLeaf {
            entity: entity.to_string(),
            selector: selector.to_string(),
            path,
            operator,
            values,
            value_type,
        }
    }

    /// The root entity the filter was resolved against.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The selector as written in the filter, before remapping.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Traversed segments, one per attribute from the root entity.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// The resolved attribute names joined with `.`.
    pub fn attribute_path(&self) -> String {
        self.path.iter().map(|s| s.attribute().name()).join(".")
    }

    /// The final attribute of the path.
    pub fn attribute(&self) -> Option<&AttributeDescriptor> {
        self.path.last().map(|s| s.attribute())
    }

    pub fn operator(&self) -> &ComparisonOperator {
        &self.operator
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The first value, for single-value operators.
    pub fn value(&self) -> Option<&Value> {
        self.values.first()
    }

    /// The type the values were converted to.
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub(crate) fn with_values(&self, values: Vec<Value>, value_type: ValueType) -> Self {
        ResolvedLeaf {
            values,
            value_type,
            ..self.clone()
        }
    }
}

impl Display for ResolvedLeaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.attribute_path(), self.operator)?;
        if self.operator.is_multi_value() {
            write!(f, "[{}]", self.values.iter().join(", "))
        } else {
            match self.values.first() {
                Some(value) => write!(f, "{}", value),
                None => Ok(()),
            }
        }
    }
}

/// Turns resolved leaves into storage-specific conditions and combines them.
///
/// Implemented by the storage layer. The resolver calls `build_leaf` for each
/// comparison and folds siblings with `and`/`or` in filter order.
pub trait PredicateBuilder {
    type Condition;

    /// Builds the condition for one comparison.
    fn build_leaf(&self, leaf: &ResolvedLeaf) -> RsqlResult<Self::Condition>;

    fn and(&self, left: Self::Condition, right: Self::Condition) -> Self::Condition;

    fn or(&self, left: Self::Condition, right: Self::Condition) -> Self::Condition;

    /// The always-true condition, used when every comparison was skipped.
    fn conjunction(&self) -> Self::Condition;
}

impl<P: PredicateBuilder + ?Sized> PredicateBuilder for Arc<P> {
    type Condition = P::Condition;

    fn build_leaf(&self, leaf: &ResolvedLeaf) -> RsqlResult<Self::Condition> {
        (**self).build_leaf(leaf)
    }

    fn and(&self, left: Self::Condition, right: Self::Condition) -> Self::Condition {
        (**self).and(left, right)
    }

    fn or(&self, left: Self::Condition, right: Self::Condition) -> Self::Condition {
        (**self).or(left, right)
    }

    fn conjunction(&self) -> Self::Condition {
        (**self).conjunction()
    }
}

type CustomPredicateFn<C> = Arc<dyn Fn(&ResolvedLeaf) -> anyhow::Result<C> + Send + Sync>;

/// A user supplied condition for an operator, used instead of
/// [PredicateBuilder::build_leaf].
///
/// The predicate applies to comparisons using `operator`, optionally only on
/// attributes of `attribute_type`. Arguments are converted to the declared
/// `argument_type` rather than to the attribute type.
///
/// # Examples
///
/// ```rust
/// use rsql::ast::ComparisonOperator;
/// use rsql::common::ValueType;
/// use rsql::resolver::{CustomPredicate, FilterExpression};
///
/// let within = ComparisonOperator::new(&["=within="], true).unwrap();
/// let predicate = CustomPredicate::new(within, ValueType::F64, |leaf| {
///     Ok(FilterExpression::Leaf(leaf.clone()))
/// });
/// assert_eq!(predicate.argument_type(), &ValueType::F64);
/// ```
pub struct CustomPredicate<C> {
    operator: ComparisonOperator,
    attribute_type: Option<ValueType>,
    argument_type: ValueType,
    builder: CustomPredicateFn<C>,
}

impl<C> Clone for CustomPredicate<C> {
    fn clone(&self) -> Self {
        CustomPredicate {
            operator: self.operator.clone(),
            attribute_type: self.attribute_type.clone(),
            argument_type: self.argument_type.clone(),
            builder: self.builder.clone(),
        }
    }
}

impl<C> CustomPredicate<C> {
    pub fn new<F>(operator: ComparisonOperator, argument_type: ValueType, builder: F) -> Self
    where
        F: Fn(&ResolvedLeaf) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        CustomPredicate {
            operator,
            attribute_type: None,
            argument_type,
            builder: Arc::new(builder),
        }
    }

    /// Restricts the predicate to attributes of `attribute_type`.
    pub fn for_attribute_type(mut self, attribute_type: ValueType) -> Self {
        self.attribute_type = Some(attribute_type);
        self
    }

    pub fn operator(&self) -> &ComparisonOperator {
        &self.operator
    }

    pub fn attribute_type(&self) -> Option<&ValueType> {
        self.attribute_type.as_ref()
    }

    pub fn argument_type(&self) -> &ValueType {
        &self.argument_type
    }

    pub fn build(&self, leaf: &ResolvedLeaf) -> anyhow::Result<C> {
        (self.builder)(leaf)
    }
}

/// A storage-agnostic condition tree.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpression {
    Leaf(ResolvedLeaf),
    And(Vec<FilterExpression>),
    Or(Vec<FilterExpression>),
    /// Matches everything.
    Conjunction,
}

impl FilterExpression {
    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&ResolvedLeaf> {
        match self {
            FilterExpression::Leaf(leaf) => vec![leaf],
            FilterExpression::And(children) | FilterExpression::Or(children) => {
                children.iter().flat_map(|c| c.leaves()).collect()
            }
            FilterExpression::Conjunction => vec![],
        }
    }

    pub fn as_leaf(&self) -> Option<&ResolvedLeaf> {
        match self {
            FilterExpression::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }
}

impl Display for FilterExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterExpression::Leaf(leaf) => write!(f, "{}", leaf),
            FilterExpression::And(children) => write!(f, "({})", children.iter().join(" AND ")),
            FilterExpression::Or(children) => write!(f, "({})", children.iter().join(" OR ")),
            FilterExpression::Conjunction => write!(f, "TRUE"),
        }
    }
}

/// A [PredicateBuilder] producing [FilterExpression] trees.
///
/// Consecutive operands of the same kind are flattened, so `a;b;c` becomes one
/// `And` with three children.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterExpressionBuilder;

impl FilterExpressionBuilder {
    fn combine(
        left: FilterExpression,
        right: FilterExpression,
        wrap: fn(Vec<FilterExpression>) -> FilterExpression,
        unwrap: fn(FilterExpression) -> Result<Vec<FilterExpression>, FilterExpression>,
    ) -> FilterExpression {
        let mut children = match unwrap(left) {
            Ok(children) => children,
            Err(single) => vec![single],
        };
        match unwrap(right) {
            Ok(more) => children.extend(more),
            Err(single) => children.push(single),
        }
        wrap(children)
    }
}

impl PredicateBuilder for FilterExpressionBuilder {
    type Condition = FilterExpression;

    fn build_leaf(&self, leaf: &ResolvedLeaf) -> RsqlResult<FilterExpression> {
        Ok(FilterExpression::Leaf(leaf.clone()))
    }

    fn and(&self, left: FilterExpression, right: FilterExpression) -> FilterExpression {
        FilterExpressionBuilder::combine(left, right, FilterExpression::And, |e| match e {
            FilterExpression::And(children) => Ok(children),
            other => Err(other),
        })
    }

    fn or(&self, left: FilterExpression, right: FilterExpression) -> FilterExpression {
        FilterExpressionBuilder::combine(left, right, FilterExpression::Or, |e| match e {
            FilterExpression::Or(children) => Ok(children),
            other => Err(other),
        })
    }

    fn conjunction(&self) -> FilterExpression {
        FilterExpression::Conjunction
    }
}
