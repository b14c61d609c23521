//! Configuration shared by parsing and resolution.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::ast::{ComparisonOperator, OperatorRegistry};
use crate::common::{Value, ValueType};
use crate::errors::{ErrorKind, RsqlError, RsqlResult};
use crate::parser::{RsqlParser, DEFAULT_MAX_DEPTH};
use crate::resolver::{CustomPredicate, ValueConverter};

/// What the resolver does with an argument that cannot be converted to the
/// attribute type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConversionFailurePolicy {
    /// Fail the compilation with [ErrorKind::ConversionError].
    #[default]
    Reject,
    /// Drop the comparison; its siblings are combined without it.
    Skip,
    /// Pass [Value::Null] in place of the argument.
    PassNull,
}

type CustomPredicateKey = (String, Option<ValueType>);

/// Configuration of an RSQL compiler.
///
/// Holds the operator registry, argument converters, per-entity selector
/// remappings and access lists, custom predicates and resolution options.
/// Cloning is cheap and clones share state, so a configuration can be set up
/// once and read from many threads. Concurrent writes are last-write-wins.
///
/// # Examples
///
/// ```rust
/// use rsql::{ConversionFailurePolicy, RsqlConfig};
///
/// let config = RsqlConfig::new();
/// config.add_remapping("Person", "zip", "address.zipCode");
/// config.blacklist("Person", &["password"]);
/// config.set_conversion_failure_policy(ConversionFailurePolicy::Skip);
///
/// assert_eq!(config.remapping("Person", "zip").as_deref(), Some("address.zipCode"));
/// assert!(!config.is_allowed("Person", "password"));
/// ```
#[derive(Clone)]
pub struct RsqlConfig {
    inner: Arc<RsqlConfigInner>,
}

impl std::fmt::Debug for RsqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsqlConfig").finish_non_exhaustive()
    }
}

impl Default for RsqlConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RsqlConfig {
    /// Creates a configuration with the default operators.
    pub fn new() -> Self {
        RsqlConfig::with_operators(OperatorRegistry::new())
    }

    pub fn with_operators(operators: OperatorRegistry) -> Self {
        RsqlConfig {
            inner: Arc::new(RsqlConfigInner::new(operators)),
        }
    }

    /// Returns the operator registry. Operators registered on it are
    /// immediately visible to parsers created afterwards.
    pub fn operators(&self) -> &OperatorRegistry {
        &self.inner.operators
    }

    pub fn register_operator(&self, operator: ComparisonOperator) {
        self.inner.operators.register(operator);
    }

    /// Returns a parser over the configured operators and nesting depth.
    pub fn parser(&self) -> RsqlParser {
        RsqlParser::with_operators(self.inner.operators.clone()).max_depth(self.max_depth())
    }

    pub fn converters(&self) -> &ValueConverter {
        &self.inner.converters
    }

    /// Registers a converter for `value_type`, replacing any previous one.
    pub fn register_converter<F>(&self, value_type: ValueType, converter: F)
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.inner.converters.register(value_type, converter);
    }

    pub fn unregister_converter(&self, value_type: &ValueType) -> bool {
        self.inner.converters.unregister(value_type)
    }

    /// Maps `selector` on `entity` to `path`.
    ///
    /// The target may be a dotted path; its remaining segments are resolved
    /// against the entities the first segments lead to.
    pub fn add_remapping(&self, entity: &str, selector: &str, path: &str) {
        log::debug!("Remapping {}.{} to {}", entity, selector, path);
        self.inner
            .remappings
            .entry(entity.to_string())
            .or_default()
            .insert(selector.to_string(), path.to_string());
    }

    pub fn remove_remapping(&self, entity: &str, selector: &str) -> Option<String> {
        self.inner
            .remappings
            .get(entity)
            .and_then(|mappings| mappings.remove(selector).map(|(_, path)| path))
    }

    pub fn remapping(&self, entity: &str, selector: &str) -> Option<String> {
        self.inner
            .remappings
            .get(entity)
            .and_then(|mappings| mappings.get(selector).map(|path| path.value().clone()))
    }

    /// Restricts `entity` to the given attributes, in addition to any already
    /// whitelisted.
    pub fn whitelist(&self, entity: &str, attributes: &[&str]) {
        self.inner
            .whitelists
            .entry(entity.to_string())
            .or_default()
            .extend(attributes.iter().map(|a| a.to_string()));
    }

    /// Forbids the given attributes of `entity`.
    pub fn blacklist(&self, entity: &str, attributes: &[&str]) {
        self.inner
            .blacklists
            .entry(entity.to_string())
            .or_default()
            .extend(attributes.iter().map(|a| a.to_string()));
    }

    pub fn clear_whitelist(&self, entity: &str) {
        self.inner.whitelists.remove(entity);
    }

    pub fn clear_blacklist(&self, entity: &str) {
        self.inner.blacklists.remove(entity);
    }

    /// Returns `false` if `attribute` is outside the whitelist of `entity`
    /// (when one exists) or inside its blacklist.
    pub fn is_allowed(&self, entity: &str, attribute: &str) -> bool {
        let whitelisted = self
            .inner
            .whitelists
            .get(entity)
            .map_or(true, |allowed| allowed.contains(attribute));
        let blacklisted = self
            .inner
            .blacklists
            .get(entity)
            .is_some_and(|denied| denied.contains(attribute));
        whitelisted && !blacklisted
    }

    /// Fails with [ErrorKind::AccessDenied] if `attribute` is not allowed.
    pub fn check_access(&self, entity: &str, attribute: &str) -> RsqlResult<()> {
        if self.is_allowed(entity, attribute) {
            Ok(())
        } else {
            log::error!("Access to {}.{} is denied", entity, attribute);
            Err(RsqlError::new(
                &format!("Access to '{}' on {} is denied", attribute, entity),
                ErrorKind::AccessDenied {
                    entity: entity.to_string(),
                    attribute: attribute.to_string(),
                },
            ))
        }
    }

    /// Registers a custom predicate and its operator.
    ///
    /// The predicate is only consulted by compilers whose predicate builder
    /// produces conditions of type `C`.
    pub fn register_custom_predicate<C: 'static>(&self, predicate: CustomPredicate<C>) {
        let operator = predicate.operator().clone();
        log::debug!(
            "Registering custom predicate for {} on {}",
            operator,
            predicate
                .attribute_type()
                .map_or("any type".to_string(), |t| t.to_string())
        );

        let key = (operator.symbol().to_string(), predicate.attribute_type().cloned());
        self.inner.custom_predicates.insert(key, Arc::new(predicate));
        if !self.inner.operators.contains(operator.symbol()) {
            self.inner.operators.register(operator);
        }
    }

    pub fn unregister_custom_predicate(
        &self,
        symbol: &str,
        attribute_type: Option<&ValueType>,
    ) -> bool {
        let key = (symbol.to_string(), attribute_type.cloned());
        self.inner.custom_predicates.remove(&key).is_some()
    }

    /// Finds the custom predicate for `symbol` on an attribute of
    /// `attribute_type`, preferring one registered for that exact type.
    pub fn custom_predicate<C: 'static>(
        &self,
        symbol: &str,
        attribute_type: &ValueType,
    ) -> Option<CustomPredicate<C>> {
        let typed = (symbol.to_string(), Some(attribute_type.clone()));
        let untyped = (symbol.to_string(), None);

        [typed, untyped].iter().find_map(|key| {
            let entry = self.inner.custom_predicates.get(key)?;
            let predicate = (**entry.value()).downcast_ref::<CustomPredicate<C>>();
            if predicate.is_none() {
                log::warn!(
                    "Custom predicate for {} does not produce the requested condition type",
                    symbol
                );
            }
            predicate.cloned()
        })
    }

    pub fn has_custom_predicates(&self) -> bool {
        !self.inner.custom_predicates.is_empty()
    }

    pub fn conversion_failure_policy(&self) -> ConversionFailurePolicy {
        *self.inner.conversion_failure_policy.read()
    }

    pub fn set_conversion_failure_policy(&self, policy: ConversionFailurePolicy) {
        *self.inner.conversion_failure_policy.write() = policy;
    }

    pub fn is_schema_cache_enabled(&self) -> bool {
        self.inner.schema_cache_enabled.load(Ordering::Relaxed)
    }

    pub fn set_schema_cache_enabled(&self, enabled: bool) {
        self.inner
            .schema_cache_enabled
            .store(enabled, Ordering::Relaxed);
    }

    pub fn max_depth(&self) -> usize {
        self.inner.max_depth.load(Ordering::Relaxed)
    }

    /// Sets the maximum nesting depth of groups.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidArgument] if `max_depth` is zero.
    pub fn set_max_depth(&self, max_depth: usize) -> RsqlResult<()> {
        if max_depth == 0 {
            log::error!("Maximum nesting depth must be positive");
            return Err(RsqlError::new(
                "Maximum nesting depth must be positive",
                ErrorKind::InvalidArgument,
            ));
        }
        self.inner.max_depth.store(max_depth, Ordering::Relaxed);
        Ok(())
    }
}

struct RsqlConfigInner {
    operators: OperatorRegistry,
    converters: ValueConverter,
    /// entity -> selector -> remapped path
    remappings: DashMap<String, DashMap<String, String>>,
    whitelists: DashMap<String, HashSet<String>>,
    blacklists: DashMap<String, HashSet<String>>,
    /// values are `CustomPredicate<C>` for the condition type they were registered with
    custom_predicates: DashMap<CustomPredicateKey, Arc<dyn Any + Send + Sync>>,
    conversion_failure_policy: RwLock<ConversionFailurePolicy>,
    schema_cache_enabled: AtomicBool,
    max_depth: AtomicUsize,
}

impl RsqlConfigInner {
    fn new(operators: OperatorRegistry) -> Self {
        RsqlConfigInner {
            operators,
            converters: ValueConverter::new(),
            remappings: DashMap::new(),
            whitelists: DashMap::new(),
            blacklists: DashMap::new(),
            custom_predicates: DashMap::new(),
            conversion_failure_policy: RwLock::new(ConversionFailurePolicy::default()),
            schema_cache_enabled: AtomicBool::new(true),
            max_depth: AtomicUsize::new(DEFAULT_MAX_DEPTH),
        }
    }
}

/// Builder for [RsqlConfig].
///
/// The first failing step is remembered and returned from [RsqlConfigBuilder::build].
///
/// # Examples
///
/// ```rust
/// use rsql::{ConversionFailurePolicy, RsqlConfigBuilder};
///
/// let config = RsqlConfigBuilder::new()
///     .extended_operators()
///     .whitelist("Person", &["name", "age"])
///     .conversion_failure_policy(ConversionFailurePolicy::PassNull)
///     .max_depth(16)
///     .build()
///     .unwrap();
/// assert!(config.operators().contains("=like="));
/// ```
#[derive(Default)]
pub struct RsqlConfigBuilder {
    error: Option<RsqlError>,
    config: RsqlConfig,
    /// operators added on top of the base set, re-applied when it is replaced
    added_operators: Vec<ComparisonOperator>,
    predicate_operators: Vec<ComparisonOperator>,
}

impl RsqlConfigBuilder {
    pub fn new() -> Self {
        RsqlConfigBuilder {
            error: None,
            config: RsqlConfig::new(),
            added_operators: Vec::new(),
            predicate_operators: Vec::new(),
        }
    }

    /// Replaces the default operators with the ones in `operators`.
    ///
    /// Operators added with [RsqlConfigBuilder::operator],
    /// [RsqlConfigBuilder::extended_operators] or a custom predicate are kept,
    /// whichever order the steps are called in. Every other step is unaffected.
    pub fn operators(self, operators: OperatorRegistry) -> Self {
        let registry = self.config.operators();
        registry.clear();
        for operator in operators.operators() {
            registry.register(operator);
        }
        for operator in &self.added_operators {
            registry.register(operator.clone());
        }
        for operator in &self.predicate_operators {
            if !registry.contains(operator.symbol()) {
                registry.register(operator.clone());
            }
        }
        self
    }

    pub fn operator(mut self, operator: ComparisonOperator) -> Self {
        self.added_operators.push(operator.clone());
        self.config.register_operator(operator);
        self
    }

    /// Registers [extended_operators](crate::ast::extended_operators).
    pub fn extended_operators(mut self) -> Self {
        for operator in crate::ast::extended_operators() {
            self.added_operators.push(operator.clone());
            self.config.register_operator(operator);
        }
        self
    }

    pub fn converter<F>(self, value_type: ValueType, converter: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.config.register_converter(value_type, converter);
        self
    }

    pub fn remapping(self, entity: &str, selector: &str, path: &str) -> Self {
        self.config.add_remapping(entity, selector, path);
        self
    }

    pub fn whitelist(self, entity: &str, attributes: &[&str]) -> Self {
        self.config.whitelist(entity, attributes);
        self
    }

    pub fn blacklist(self, entity: &str, attributes: &[&str]) -> Self {
        self.config.blacklist(entity, attributes);
        self
    }

    pub fn custom_predicate<C: 'static>(mut self, predicate: CustomPredicate<C>) -> Self {
        self.predicate_operators.push(predicate.operator().clone());
        self.config.register_custom_predicate(predicate);
        self
    }

    pub fn conversion_failure_policy(self, policy: ConversionFailurePolicy) -> Self {
        self.config.set_conversion_failure_policy(policy);
        self
    }

    pub fn schema_cache(self, enabled: bool) -> Self {
        self.config.set_schema_cache_enabled(enabled);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_max_depth(max_depth) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> RsqlResult<RsqlConfig> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.config),
        }
    }
}
