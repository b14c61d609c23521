use std::collections::VecDeque;

use super::{
    AttributeDescriptor, PathSegment, PredicateBuilder, ResolvedLeaf, SchemaCache, SchemaProvider,
};
use crate::ast::{ComparisonNode, LogicalNode, LogicalOperator, Node, RsqlVisitor};
use crate::common::{Value, ValueType};
use crate::config::{ConversionFailurePolicy, RsqlConfig};
use crate::errors::{ErrorKind, RsqlError, RsqlResult};

/// Resolves an AST against a schema and builds conditions with a
/// [PredicateBuilder].
///
/// For every comparison the selector is remapped, checked against the access
/// lists, looked up segment by segment in the schema, and its arguments are
/// converted to the attribute type. Logical nodes fold their children with
/// [PredicateBuilder::and] and [PredicateBuilder::or] in filter order.
///
/// The visitor result is `None` for a subtree whose comparisons were all
/// skipped under [ConversionFailurePolicy::Skip].
pub struct RsqlResolver<'a, P: PredicateBuilder> {
    config: &'a RsqlConfig,
    schema: &'a dyn SchemaProvider,
    cache: Option<&'a SchemaCache>,
    builder: &'a P,
}

/// Result of resolving one subtree.
pub type Resolution<C> = RsqlResult<Option<C>>;

impl<'a, P> RsqlResolver<'a, P>
where
    P: PredicateBuilder,
    P::Condition: 'static,
{
    pub fn new(
        config: &'a RsqlConfig,
        schema: &'a dyn SchemaProvider,
        cache: Option<&'a SchemaCache>,
        builder: &'a P,
    ) -> Self {
        RsqlResolver {
            config,
            schema,
            cache,
            builder,
        }
    }

    /// Resolves `node` against `entity` into a single condition.
    ///
    /// A filter whose comparisons were all skipped yields
    /// [PredicateBuilder::conjunction].
    pub fn resolve(&mut self, node: &Node, entity: &str) -> RsqlResult<P::Condition> {
        log::debug!("Resolving {} against entity {}", node, entity);
        let condition = node.accept_with::<Resolution<P::Condition>, _, _>(self, entity)?;
        Ok(condition.unwrap_or_else(|| self.builder.conjunction()))
    }

    fn visit_logical(&mut self, node: &LogicalNode, entity: &str) -> Resolution<P::Condition> {
        let mut combined: Option<P::Condition> = None;
        for child in node {
            let Some(condition) = child.accept_with::<Resolution<P::Condition>, _, _>(self, entity)?
            else {
                continue;
            };

            combined = Some(match combined {
                None => condition,
                Some(left) => match node.operator() {
                    LogicalOperator::And => self.builder.and(left, condition),
                    LogicalOperator::Or => self.builder.or(left, condition),
                },
            });
        }
        Ok(combined)
    }

    fn describe(&self, entity: &str, attribute: &str) -> Option<AttributeDescriptor> {
        match self.cache {
            Some(cache) => cache.describe(self.schema, entity, attribute),
            None => self.schema.describe_attribute(entity, attribute),
        }
    }

    /// Walks a dotted selector from `entity`, returning the traversed segments
    /// and the type its arguments convert to.
    pub fn resolve_path(
        &self,
        entity: &str,
        selector: &str,
    ) -> RsqlResult<(Vec<PathSegment>, ValueType)> {
        // (segment, remappable); segments spliced in from a remapping target
        // are taken literally
        let mut segments: VecDeque<(String, bool)> =
            selector.split('.').map(|s| (s.to_string(), true)).collect();
        let mut current = entity.to_string();
        let mut path: Vec<PathSegment> = Vec::with_capacity(segments.len());
        let mut leaf_type: Option<ValueType> = None;

        while let Some((mut segment, remappable)) = segments.pop_front() {
            if leaf_type.is_some() {
                // the previous attribute is scalar, nothing to traverse into
                return Err(unknown_selector(&current, &segment));
            }

            if remappable {
                if let Some(target) = self.config.remapping(&current, &segment) {
                    log::debug!("Selector {}.{} remapped to {}", current, segment, target);
                    let mut parts = target.split('.').map(String::from);
                    if let Some(first) = parts.next() {
                        segment = first;
                    }
                    for part in parts.rev() {
                        segments.push_front((part, false));
                    }
                }
            }

            self.config.check_access(&current, &segment)?;

            let attribute = match self.describe(&current, &segment) {
                Some(attribute) => attribute,
                None => return Err(unknown_selector(&current, &segment)),
            };
            log::debug!(
                "Resolved {}.{} as {} attribute of type {}",
                current,
                segment,
                attribute.kind(),
                attribute.value_type()
            );

            let owner = std::mem::take(&mut current);
            match attribute.target_entity() {
                Some(target) => current = target.to_string(),
                None => {
                    leaf_type = Some(attribute.comparison_type().clone());
                    current = owner.clone();
                }
            }
            path.push(PathSegment::new(&owner, attribute));
        }

        let value_type = match leaf_type {
            Some(value_type) => value_type,
            // selector ends on an entity-valued attribute
            None => match path.last() {
                Some(last) => last.attribute().value_type().clone(),
                None => return Err(unknown_selector(entity, selector)),
            },
        };
        Ok((path, value_type))
    }

    /// Converts `arguments` to `value_type` under the configured policy.
    ///
    /// Returns `None` when the comparison must be skipped.
    fn convert_arguments(
        &self,
        arguments: &[String],
        value_type: &ValueType,
    ) -> RsqlResult<Option<Vec<Value>>> {
        let converters = self.config.converters();
        let policy = self.config.conversion_failure_policy();

        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match converters.convert(argument, value_type) {
                Some(value) => values.push(value),
                None => match policy {
                    ConversionFailurePolicy::Reject => {
                        log::error!("Cannot convert '{}' to {}", argument, value_type);
                        return Err(RsqlError::new(
                            &format!("Cannot convert '{}' to {}", argument, value_type),
                            ErrorKind::ConversionError {
                                value: argument.clone(),
                                value_type: value_type.to_string(),
                            },
                        ));
                    }
                    ConversionFailurePolicy::Skip => {
                        log::debug!("Skipping comparison with unconvertible '{}'", argument);
                        return Ok(None);
                    }
                    ConversionFailurePolicy::PassNull => values.push(Value::Null),
                },
            }
        }
        Ok(Some(values))
    }

    fn build_custom(
        &self,
        node: &ComparisonNode,
        leaf: &ResolvedLeaf,
    ) -> Option<Resolution<P::Condition>> {
        let predicate = self
            .config
            .custom_predicate::<P::Condition>(node.operator().symbol(), leaf.value_type())?;

        log::debug!("Using custom predicate for {}", node);
        let result = match self.convert_arguments(node.arguments(), predicate.argument_type()) {
            Ok(Some(values)) => {
                let leaf = leaf.with_values(values, predicate.argument_type().clone());
                predicate.build(&leaf).map(Some).map_err(|err| {
                    log::error!("Custom predicate for {} failed: {}", node, err);
                    RsqlError::from(err)
                })
            }
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        Some(result)
    }
}

impl<P> RsqlVisitor<Resolution<P::Condition>, &str> for RsqlResolver<'_, P>
where
    P: PredicateBuilder,
    P::Condition: 'static,
{
    fn visit_and(&mut self, node: &LogicalNode, entity: &str) -> Resolution<P::Condition> {
        self.visit_logical(node, entity)
    }

    fn visit_or(&mut self, node: &LogicalNode, entity: &str) -> Resolution<P::Condition> {
        self.visit_logical(node, entity)
    }

    fn visit_comparison(&mut self, node: &ComparisonNode, entity: &str) -> Resolution<P::Condition> {
        let (path, value_type) = self.resolve_path(entity, node.selector())?;
        let leaf = ResolvedLeaf::new(
            entity,
            node.selector(),
            path,
            node.operator().clone(),
            Vec::new(),
            value_type.clone(),
        );

        if self.config.has_custom_predicates() {
            if let Some(result) = self.build_custom(node, &leaf) {
                return result;
            }
        }

        let Some(values) = self.convert_arguments(node.arguments(), &value_type)? else {
            return Ok(None);
        };
        let leaf = leaf.with_values(values, value_type);
        self.builder.build_leaf(&leaf).map(Some)
    }
}

fn unknown_selector(entity: &str, attribute: &str) -> RsqlError {
    log::error!("Unknown selector {} on entity {}", attribute, entity);
    RsqlError::new(
        &format!("Unknown property '{}' on entity {}", attribute, entity),
        ErrorKind::UnknownSelector {
            entity: entity.to_string(),
            attribute: attribute.to_string(),
        },
    )
}
