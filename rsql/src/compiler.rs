//! The compile entry point: parse, then resolve.

use std::sync::Arc;

use crate::ast::Node;
use crate::config::RsqlConfig;
use crate::errors::RsqlResult;
use crate::resolver::{
    FilterExpressionBuilder, PredicateBuilder, RsqlResolver, SchemaCache, SchemaProvider,
};

/// Compiles RSQL text into conditions of a [PredicateBuilder].
///
/// A compiler is built once from a configuration, a schema provider and a
/// predicate builder, and can then be shared and used from many threads.
///
/// # Examples
///
/// ```rust
/// use rsql::common::{Value, ValueType};
/// use rsql::resolver::{EntitySchema, SchemaRegistry};
/// use rsql::{RsqlCompiler, RsqlConfig};
///
/// let schema = SchemaRegistry::new();
/// schema.register(
///     EntitySchema::builder("Person")
///         .basic("name", ValueType::String)
///         .basic("age", ValueType::I32)
///         .build(),
/// );
///
/// let compiler = RsqlCompiler::with_expressions(RsqlConfig::new(), schema);
/// let filter = compiler.compile("name==john;age=gt=30", "Person").unwrap();
/// assert_eq!(filter.to_string(), "(name==\"john\" AND age=gt=30)");
/// assert_eq!(filter.leaves()[1].value(), Some(&Value::I32(30)));
/// ```
pub struct RsqlCompiler<P: PredicateBuilder> {
    config: RsqlConfig,
    schema: Arc<dyn SchemaProvider>,
    builder: P,
    cache: SchemaCache,
}

impl RsqlCompiler<FilterExpressionBuilder> {
    /// Creates a compiler producing [FilterExpression](crate::resolver::FilterExpression)s.
    pub fn with_expressions<S: SchemaProvider + 'static>(config: RsqlConfig, schema: S) -> Self {
        RsqlCompiler::new(config, schema, FilterExpressionBuilder)
    }
}

impl<P> RsqlCompiler<P>
where
    P: PredicateBuilder,
    P::Condition: 'static,
{
    pub fn new<S: SchemaProvider + 'static>(config: RsqlConfig, schema: S, builder: P) -> Self {
        RsqlCompiler {
            config,
            schema: Arc::new(schema),
            builder,
            cache: SchemaCache::new(),
        }
    }

    pub fn config(&self) -> &RsqlConfig {
        &self.config
    }

    pub fn builder(&self) -> &P {
        &self.builder
    }

    pub fn schema_cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Parses `input` with the configured operators.
    pub fn parse(&self, input: &str) -> RsqlResult<Node> {
        self.config.parser().parse(input)
    }

    /// Resolves a parsed filter against `entity`.
    pub fn resolve(&self, node: &Node, entity: &str) -> RsqlResult<P::Condition> {
        let cache = self
            .config
            .is_schema_cache_enabled()
            .then_some(&self.cache);
        let mut resolver = RsqlResolver::new(&self.config, self.schema.as_ref(), cache, &self.builder);
        resolver.resolve(node, entity)
    }

    /// Parses and resolves `input` against `entity`.
    pub fn compile(&self, input: &str, entity: &str) -> RsqlResult<P::Condition> {
        let node = self.parse(input)?;
        self.resolve(&node, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Value, ValueType};
    use crate::errors::ErrorKind;
    use crate::resolver::{EntitySchema, FilterExpression, ResolvedLeaf, SchemaRegistry};

    // runs once for the whole unit test binary
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    fn schema() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        registry.register(
            EntitySchema::builder("Person")
                .basic("name", ValueType::String)
                .basic("age", ValueType::I32)
                .build(),
        );
        registry
    }

    struct SqlBuilder;

    impl PredicateBuilder for SqlBuilder {
        type Condition = String;

        fn build_leaf(&self, leaf: &ResolvedLeaf) -> RsqlResult<String> {
            let op = match leaf.operator().symbol() {
                "==" => "=",
                "=gt=" => ">",
                "=lt=" => "<",
                other => other,
            };
            Ok(format!("{} {} {}", leaf.attribute_path(), op, leaf.values()[0]))
        }

        fn and(&self, left: String, right: String) -> String {
            format!("({} AND {})", left, right)
        }

        fn or(&self, left: String, right: String) -> String {
            format!("({} OR {})", left, right)
        }

        fn conjunction(&self) -> String {
            "1=1".to_string()
        }
    }

    #[test]
    fn test_compile_with_expressions() {
        let compiler = RsqlCompiler::with_expressions(RsqlConfig::new(), schema());
        let filter = compiler.compile("age=gt=30", "Person").unwrap();
        match filter {
            FilterExpression::Leaf(leaf) => assert_eq!(leaf.values(), &[Value::I32(30)]),
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn test_compile_with_custom_builder() {
        let compiler = RsqlCompiler::new(RsqlConfig::new(), schema(), SqlBuilder);
        let sql = compiler.compile("name==john,age=lt=20;age=gt=10", "Person").unwrap();
        assert_eq!(sql, "(name = \"john\" OR (age < 20 AND age > 10))");
    }

    #[test]
    fn test_parse_then_resolve() {
        let compiler = RsqlCompiler::new(RsqlConfig::new(), schema(), SqlBuilder);
        let node = compiler.parse("age==1").unwrap();
        assert_eq!(compiler.resolve(&node, "Person").unwrap(), "age = 1");
    }

    #[test]
    fn test_errors_propagate() {
        let compiler = RsqlCompiler::new(RsqlConfig::new(), schema(), SqlBuilder);
        assert!(matches!(
            compiler.compile("age=", "Person").unwrap_err().kind(),
            ErrorKind::LexicalError { .. }
        ));
        assert!(matches!(
            compiler.compile("height==1", "Person").unwrap_err().kind(),
            ErrorKind::UnknownSelector { .. }
        ));
    }

    #[test]
    fn test_schema_cache_toggle() {
        let config = RsqlConfig::new();
        let compiler = RsqlCompiler::new(config.clone(), schema(), SqlBuilder);

        compiler.compile("age==1", "Person").unwrap();
        assert_eq!(compiler.schema_cache().len(), 1);

        config.set_schema_cache_enabled(false);
        compiler.compile("name==x", "Person").unwrap();
        assert_eq!(compiler.schema_cache().len(), 1);
    }
}
