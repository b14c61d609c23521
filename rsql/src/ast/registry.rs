use dashmap::DashMap;
use std::sync::Arc;

use super::{default_operators, ComparisonOperator};

/// The set of comparison operators a parser recognises, keyed by symbol.
///
/// Every symbol of an operator (primary and alternates) maps to the same
/// operator. Registering a symbol that is already present overwrites it, which
/// lets an application redefine a default operator.
///
/// Clones share the same underlying table. The registry is meant to be
/// configured at start-up and read concurrently afterwards; concurrent writes
/// are last-write-wins.
///
/// # Examples
///
/// ```rust
/// use rsql::ast::{OperatorRegistry, ComparisonOperator};
///
/// let registry = OperatorRegistry::new();
/// registry.register(ComparisonOperator::new(&["=like="], false).unwrap());
/// assert!(registry.get("=like=").is_some());
/// assert!(registry.get(">").is_some());
/// ```
#[derive(Clone)]
pub struct OperatorRegistry {
    inner: Arc<DashMap<String, ComparisonOperator>>,
}

impl OperatorRegistry {
    /// Creates a registry seeded with the default operators.
    pub fn new() -> Self {
        OperatorRegistry::from_operators(default_operators())
    }

    /// Creates a registry with no operators.
    pub fn empty() -> Self {
        OperatorRegistry {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Creates a registry holding exactly the given operators.
    pub fn from_operators<I>(operators: I) -> Self
    where
        I: IntoIterator<Item = ComparisonOperator>,
    {
        let registry = OperatorRegistry::empty();
        for operator in operators {
            registry.register(operator);
        }
        registry
    }

    /// Registers an operator under all of its symbols.
    pub fn register(&self, operator: ComparisonOperator) {
        for symbol in operator.symbols() {
            if let Some(previous) = self.inner.insert(symbol.clone(), operator.clone()) {
                log::debug!(
                    "Operator symbol {} re-registered, replacing {}",
                    symbol,
                    previous
                );
            }
        }
    }

    /// Removes the operator registered for `symbol` together with all its aliases.
    ///
    /// Returns the removed operator, if any.
    pub fn unregister(&self, symbol: &str) -> Option<ComparisonOperator> {
        let (_, operator) = self.inner.remove(symbol)?;
        for alias in operator.symbols() {
            self.inner.remove_if(alias, |_, registered| registered == &operator);
        }
        Some(operator)
    }

    /// Removes every operator.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Looks up the operator for a symbol.
    pub fn get(&self, symbol: &str) -> Option<ComparisonOperator> {
        self.inner.get(symbol).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.inner.contains_key(symbol)
    }

    /// Returns the distinct registered operators.
    pub fn operators(&self) -> Vec<ComparisonOperator> {
        let mut operators: Vec<ComparisonOperator> = Vec::new();
        for entry in self.inner.iter() {
            if !operators.contains(entry.value()) {
                operators.push(entry.value().clone());
            }
        }
        operators.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        operators
    }

    /// Returns every registered symbol, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        OperatorRegistry::new()
    }
}
