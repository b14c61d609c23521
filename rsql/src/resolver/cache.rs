use dashmap::DashMap;
use std::sync::Arc;

use super::{AttributeDescriptor, SchemaProvider};

/// A read-through cache of attribute descriptors keyed by (entity, attribute).
///
/// Only found attributes are cached, so an attribute added to the schema
/// later is still picked up. Cloning shares the cache.
#[derive(Clone, Default)]
pub struct SchemaCache {
    entries: Arc<DashMap<(String, String), AttributeDescriptor>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        SchemaCache::default()
    }

    /// Returns the cached descriptor, asking `provider` on a miss.
    pub fn describe(
        &self,
        provider: &dyn SchemaProvider,
        entity: &str,
        attribute: &str,
    ) -> Option<AttributeDescriptor> {
        let key = (entity.to_string(), attribute.to_string());
        if let Some(descriptor) = self.entries.get(&key) {
            log::debug!("Schema cache hit for {}.{}", entity, attribute);
            return Some(descriptor.value().clone());
        }

        let descriptor = provider.describe_attribute(entity, attribute)?;
        self.entries.insert(key, descriptor.clone());
        Some(descriptor)
    }

    /// Drops every cached descriptor of `entity`.
    pub fn invalidate(&self, entity: &str) {
        self.entries.retain(|(cached_entity, _), _| cached_entity != entity);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
