use dashmap::DashMap;
use indexmap::IndexMap;
use std::fmt::Display;
use std::sync::Arc;

use crate::common::{EnumType, ValueType};
use crate::errors::{ErrorKind, RsqlError, RsqlResult};

/// How an attribute relates to its owning entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeKind {
    /// A scalar column.
    Basic,
    /// A value object stored inline with its owner.
    Embedded,
    /// A reference to another entity, single or collection valued.
    Association,
    /// A collection of scalars or embeddables.
    ElementCollection,
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeKind::Basic => write!(f, "basic"),
            AttributeKind::Embedded => write!(f, "embedded"),
            AttributeKind::Association => write!(f, "association"),
            AttributeKind::ElementCollection => write!(f, "element collection"),
        }
    }
}

/// Schema information about one attribute of an entity.
///
/// For embedded and association attributes the value type is
/// [ValueType::Entity] naming the target entity. Element collections carry the
/// type of their elements in `element_type`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeDescriptor {
    name: String,
    kind: AttributeKind,
    collection: bool,
    value_type: ValueType,
    element_type: Option<ValueType>,
}

impl AttributeDescriptor {
    pub fn new(
        name: &str,
        kind: AttributeKind,
        collection: bool,
        value_type: ValueType,
        element_type: Option<ValueType>,
    ) -> Self {
        AttributeDescriptor {
            name: name.to_string(),
            kind,
            collection,
            value_type,
            element_type,
        }
    }

    /// A scalar attribute.
    pub fn basic(name: &str, value_type: ValueType) -> Self {
        AttributeDescriptor::new(name, AttributeKind::Basic, false, value_type, None)
    }

    /// An inline value object of entity type `entity`.
    pub fn embedded(name: &str, entity: &str) -> Self {
        AttributeDescriptor::new(
            name,
            AttributeKind::Embedded,
            false,
            ValueType::Entity(entity.to_string()),
            None,
        )
    }

    /// A reference to `entity`; `collection` marks a to-many association.
    pub fn association(name: &str, entity: &str, collection: bool) -> Self {
        let entity_type = ValueType::Entity(entity.to_string());
        AttributeDescriptor::new(
            name,
            AttributeKind::Association,
            collection,
            entity_type.clone(),
            collection.then_some(entity_type),
        )
    }

    /// A collection whose elements are of `element_type`.
    pub fn element_collection(name: &str, element_type: ValueType) -> Self {
        AttributeDescriptor::new(
            name,
            AttributeKind::ElementCollection,
            true,
            element_type.clone(),
            Some(element_type),
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    #[inline]
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn element_type(&self) -> Option<&ValueType> {
        self.element_type.as_ref()
    }

    /// Returns the entity this attribute leads to when a selector continues
    /// past it, or `None` for attributes that end a path.
    pub fn target_entity(&self) -> Option<&str> {
        let target = match self.kind {
            AttributeKind::Basic => return None,
            AttributeKind::Embedded | AttributeKind::Association => Some(&self.value_type),
            AttributeKind::ElementCollection => self.element_type.as_ref(),
        };

        match target {
            Some(ValueType::Entity(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns the type arguments compared against this attribute are
    /// converted to.
    pub fn comparison_type(&self) -> &ValueType {
        match (&self.kind, &self.element_type) {
            (AttributeKind::ElementCollection, Some(element_type)) => element_type,
            _ => &self.value_type,
        }
    }
}

/// Describes the attributes of entities by name.
///
/// Implementations must be safe to call concurrently; the resolver may cache
/// the answers.
pub trait SchemaProvider: Send + Sync {
    /// Returns the descriptor of `attribute` on `entity`, if it exists.
    fn describe_attribute(&self, entity: &str, attribute: &str) -> Option<AttributeDescriptor>;

    fn has_attribute(&self, entity: &str, attribute: &str) -> bool {
        self.describe_attribute(entity, attribute).is_some()
    }
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for Arc<T> {
    fn describe_attribute(&self, entity: &str, attribute: &str) -> Option<AttributeDescriptor> {
        (**self).describe_attribute(entity, attribute)
    }

    fn has_attribute(&self, entity: &str, attribute: &str) -> bool {
        (**self).has_attribute(entity, attribute)
    }
}

/// The attributes of one entity.
///
/// # Examples
///
/// ```rust
/// use rsql::common::ValueType;
/// use rsql::resolver::EntitySchema;
///
/// let schema = EntitySchema::builder("Person")
///     .basic("name", ValueType::String)
///     .basic("age", ValueType::I32)
///     .embedded("address", "Address")
///     .build();
/// assert_eq!(schema.attribute("age").unwrap().value_type(), &ValueType::I32);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntitySchema {
    name: String,
    attributes: IndexMap<String, AttributeDescriptor>,
}

impl EntitySchema {
    pub fn new(name: &str, attributes: Vec<AttributeDescriptor>) -> Self {
        EntitySchema {
            name: name.to_string(),
            attributes: attributes
                .into_iter()
                .map(|attribute| (attribute.name().to_string(), attribute))
                .collect(),
        }
    }

    pub fn builder(name: &str) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            name: name.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.values()
    }
}

/// Builder for [EntitySchema].
pub struct EntitySchemaBuilder {
    name: String,
    attributes: Vec<AttributeDescriptor>,
}

impl EntitySchemaBuilder {
    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn basic(self, name: &str, value_type: ValueType) -> Self {
        self.attribute(AttributeDescriptor::basic(name, value_type))
    }

    pub fn embedded(self, name: &str, entity: &str) -> Self {
        self.attribute(AttributeDescriptor::embedded(name, entity))
    }

    pub fn association(self, name: &str, entity: &str) -> Self {
        self.attribute(AttributeDescriptor::association(name, entity, false))
    }

    pub fn association_collection(self, name: &str, entity: &str) -> Self {
        self.attribute(AttributeDescriptor::association(name, entity, true))
    }

    pub fn element_collection(self, name: &str, element_type: ValueType) -> Self {
        self.attribute(AttributeDescriptor::element_collection(name, element_type))
    }

    pub fn build(self) -> EntitySchema {
        EntitySchema::new(&self.name, self.attributes)
    }
}

/// A type whose attributes can be filtered with RSQL.
///
/// Normally implemented with `#[derive(RsqlEntity)]` from the `rsql_derive`
/// crate.
///
/// # Usage
/// ```ignore
/// #[derive(RsqlEntity)]
/// #[rsql(name = "Person")]
/// pub struct PersonEntity {
///     name: String,
///     age: Option<i32>,
///     #[rsql(embedded)]
///     address: Address,
/// }
/// ```
pub trait RsqlEntity {
    /// Returns the entity name used in schema lookups.
    fn entity_name() -> String;

    /// Returns the descriptor of this entity.
    fn entity_schema() -> EntitySchema;

    /// Registers the entities reachable from this one.
    fn register_dependencies(_registry: &SchemaRegistry) {}
}

/// An enumeration usable as an attribute type.
///
/// Normally implemented with `#[derive(RsqlEnum)]`.
pub trait RsqlEnum {
    fn enum_type() -> EnumType;
}

/// An in-memory [SchemaProvider] keyed by entity name.
///
/// Cloning shares the underlying table.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    inner: Arc<DashMap<String, EntitySchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Adds or replaces an entity schema.
    pub fn register(&self, schema: EntitySchema) {
        log::debug!("Registering schema for entity {}", schema.name());
        self.inner.insert(schema.name().to_string(), schema);
    }

    /// Registers `T` and every entity reachable from it.
    ///
    /// Entities already present are left untouched, so cyclic references
    /// between entities terminate.
    pub fn register_entity<T: RsqlEntity>(&self) {
        let name = T::entity_name();
        if self.inner.contains_key(&name) {
            return;
        }
        self.register(T::entity_schema());
        T::register_dependencies(self);
    }

    pub fn unregister(&self, entity: &str) -> Option<EntitySchema> {
        self.inner.remove(entity).map(|(_, schema)| schema)
    }

    pub fn schema(&self, entity: &str) -> Option<EntitySchema> {
        self.inner.get(entity).map(|schema| schema.value().clone())
    }

    /// Returns the schema of `entity` or fails if it is not registered.
    pub fn require_schema(&self, entity: &str) -> RsqlResult<EntitySchema> {
        match self.schema(entity) {
            Some(schema) => Ok(schema),
            None => {
                log::error!("Entity {} is not registered", entity);
                Err(RsqlError::new(
                    &format!("Entity {} is not registered", entity),
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.inner.contains_key(entity)
    }

    /// Registered entity names, sorted.
    pub fn entities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl SchemaProvider for SchemaRegistry {
    fn describe_attribute(&self, entity: &str, attribute: &str) -> Option<AttributeDescriptor> {
        self.inner
            .get(entity)
            .and_then(|schema| schema.attribute(attribute).cloned())
    }
}
