//! Entity metadata: declared attributes, nested types and primary keys
//!
//! The engine never introspects storage itself. Everything it knows about an
//! entity type comes from a [`MetadataProvider`]:
//! - the declared attributes and their scalar types
//! - which attributes are composite (nested into another type)
//! - which attribute is the primary key
//!
//! [`EntityRegistry`] is the in-process provider. It validates every type once
//! at build time so that configuration mistakes surface at startup rather than
//! on the first request.

use crate::value::ScalarType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One declared attribute of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    pub name: String,
    #[serde(rename = "type", default = "text_type")]
    pub scalar_type: ScalarType,
    /// Type name of a composite attribute; `None` for scalars.
    #[serde(default)]
    pub nested: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
}

fn text_type() -> ScalarType {
    ScalarType::Text
}

impl AttributeMetadata {
    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
            nested: None,
            primary_key: false,
        }
    }

    pub fn nested(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scalar_type: ScalarType::Text,
            nested: Some(type_name.into()),
            primary_key: false,
        }
    }

    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }
}

/// Declared shape of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    pub attributes: Vec<AttributeMetadata>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Declare the primary-key attribute.
    pub fn id(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        let mut attr = AttributeMetadata::scalar(name, scalar_type);
        attr.primary_key = true;
        self.attributes.push(attr);
        self
    }

    pub fn field(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.attributes
            .push(AttributeMetadata::scalar(name, scalar_type));
        self
    }

    pub fn nested(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.attributes
            .push(AttributeMetadata::nested(name, type_name));
        self
    }

    /// Look up an attribute by name. An exact match wins; otherwise names are
    /// compared ASCII case-insensitively.
    pub fn attribute(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|a| a.name.eq_ignore_ascii_case(name))
            })
    }

    /// The first attribute marked as primary key.
    pub fn primary_key(&self) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.primary_key)
    }
}

/// Source of entity metadata for the query engine.
pub trait MetadataProvider: Send + Sync {
    fn entity(&self, type_name: &str) -> Option<&EntityType>;

    fn attributes_of(&self, type_name: &str) -> Option<&[AttributeMetadata]> {
        self.entity(type_name).map(|e| e.attributes.as_slice())
    }

    fn primary_key_of(&self, type_name: &str) -> Option<&AttributeMetadata> {
        self.entity(type_name).and_then(EntityType::primary_key)
    }
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for &T {
    fn entity(&self, type_name: &str) -> Option<&EntityType> {
        (**self).entity(type_name)
    }
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for Arc<T> {
    fn entity(&self, type_name: &str) -> Option<&EntityType> {
        (**self).entity(type_name)
    }
}

/// Validated, immutable set of entity types.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    types: HashMap<String, EntityType>,
}

impl EntityRegistry {
    pub fn builder() -> EntityRegistryBuilder {
        EntityRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl MetadataProvider for EntityRegistry {
    fn entity(&self, type_name: &str) -> Option<&EntityType> {
        self.types.get(type_name)
    }
}

#[derive(Debug, Default)]
pub struct EntityRegistryBuilder {
    types: Vec<EntityType>,
}

impl EntityRegistryBuilder {
    pub fn register(mut self, entity: EntityType) -> Self {
        self.types.push(entity);
        self
    }

    /// Validate every registered type and freeze the registry.
    ///
    /// Fails when a type is declared twice, declares an attribute twice, does
    /// not have exactly one scalar primary key, or nests a type that is not
    /// registered.
    pub fn build(self) -> Result<EntityRegistry> {
        let mut types = HashMap::with_capacity(self.types.len());
        for entity in self.types {
            if entity.name.is_empty() {
                return Err(Error::InvalidMetadata(
                    "entity type name must not be empty".to_string(),
                ));
            }
            if types.contains_key(&entity.name) {
                return Err(Error::InvalidMetadata(format!(
                    "entity type {} declared more than once",
                    entity.name
                )));
            }
            types.insert(entity.name.clone(), entity);
        }

        for entity in types.values() {
            validate_entity(entity, &types)?;
        }

        Ok(EntityRegistry { types })
    }
}

fn validate_entity(entity: &EntityType, types: &HashMap<String, EntityType>) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for attr in &entity.attributes {
        if attr.name.is_empty() || attr.name.contains('.') {
            return Err(Error::InvalidMetadata(format!(
                "{}: invalid attribute name '{}'",
                entity.name, attr.name
            )));
        }
        if !seen.insert(attr.name.as_str()) {
            return Err(Error::InvalidMetadata(format!(
                "{}: attribute {} declared more than once",
                entity.name, attr.name
            )));
        }
        if let Some(nested) = &attr.nested {
            if !types.contains_key(nested) {
                return Err(Error::InvalidMetadata(format!(
                    "{}.{} refers to unknown type {}",
                    entity.name, attr.name, nested
                )));
            }
        }
    }

    let keys: Vec<&AttributeMetadata> = entity
        .attributes
        .iter()
        .filter(|a| a.primary_key)
        .collect();
    match keys.as_slice() {
        [] => Err(Error::MissingPrimaryKey(entity.name.clone())),
        [key] if key.is_nested() => Err(Error::InvalidMetadata(format!(
            "{}: primary key {} must be a scalar attribute",
            entity.name, key.name
        ))),
        [_] => Ok(()),
        _ => Err(Error::InvalidMetadata(format!(
            "{}: more than one primary key declared",
            entity.name
        ))),
    }
}

/// Ordered attribute names from a root type down to a scalar leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_nested(&self) -> bool {
        self.0.len() > 1
    }

    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// One navigation step of a resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Type that declares `attribute`.
    pub owner: String,
    pub attribute: String,
    pub scalar_type: ScalarType,
    pub nested: Option<String>,
}

/// A path navigated from a root type to a scalar leaf attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    pub root: String,
    pub steps: Vec<PathStep>,
}

impl PathExpr {
    /// The scalar attribute the path ends on. `None` only for a hand-built
    /// path with no steps.
    pub fn leaf(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    pub fn attribute_path(&self) -> AttributePath {
        AttributePath(self.steps.iter().map(|s| s.attribute.clone()).collect())
    }
}

/// Navigate `segments` from `root` one attribute at a time.
///
/// Every segment but the last must name a composite attribute and the last
/// must name a scalar one. Returns `None` when any step does not resolve.
pub fn resolve_path<P, S>(provider: &P, root: &str, segments: &[S]) -> Option<PathExpr>
where
    P: MetadataProvider + ?Sized,
    S: AsRef<str>,
{
    if segments.is_empty() {
        return None;
    }

    let mut steps = Vec::with_capacity(segments.len());
    let mut current = provider.entity(root)?;
    for (i, segment) in segments.iter().enumerate() {
        let attr = current.attribute(segment.as_ref())?;
        let is_last = i + 1 == segments.len();
        steps.push(PathStep {
            owner: current.name.clone(),
            attribute: attr.name.clone(),
            scalar_type: attr.scalar_type,
            nested: attr.nested.clone(),
        });

        match (&attr.nested, is_last) {
            (None, true) => {}
            (Some(nested), false) => current = provider.entity(nested)?,
            _ => return None,
        }
    }

    Some(PathExpr {
        root: root.to_string(),
        steps,
    })
}
