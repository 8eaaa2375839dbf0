//! Entity-to-table mapping built from configuration
//!
//! [`Schema`] is the server's [`MetadataProvider`]: the query engine sees
//! entity types and attribute names, while the SQL builder looks up the
//! table, column and join behind each of them here.

use crate::config::EntityConfig;
use heck::ToSnakeCase;
use sieve_query::{EntityRegistry, EntityType, Error, MetadataProvider, QueryShape, Result, ScalarType};
use std::collections::HashMap;

/// Table and columns behind one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    pub entity: String,
    pub table: String,
    pub primary_key: ColumnMapping,
    /// Scalar attributes in declaration order, primary key included.
    pub columns: Vec<ColumnMapping>,
    pub relations: Vec<RelationMapping>,
    pub fetch: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub attribute: String,
    pub column: String,
    pub scalar_type: ScalarType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMapping {
    pub attribute: String,
    pub target: String,
    pub local_column: String,
    pub target_column: String,
    pub many: bool,
}

impl TableMapping {
    pub fn column(&self, attribute: &str) -> Option<&ColumnMapping> {
        self.columns.iter().find(|c| c.attribute == attribute)
    }

    pub fn relation(&self, attribute: &str) -> Option<&RelationMapping> {
        self.relations.iter().find(|r| r.attribute == attribute)
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    registry: EntityRegistry,
    tables: HashMap<String, TableMapping>,
}

impl Schema {
    /// Build and validate the schema. Fails on a missing primary key, a
    /// relation to an undeclared entity or a fetch list naming a non-relation.
    pub fn from_config(entities: &[EntityConfig]) -> Result<Self> {
        let mut builder = EntityRegistry::builder();
        let mut tables = HashMap::with_capacity(entities.len());

        for entity in entities {
            let (entity_type, mapping) = map_entity(entity)?;
            builder = builder.register(entity_type);
            if tables.insert(entity.name.clone(), mapping).is_some() {
                return Err(Error::InvalidMetadata(format!(
                    "entity {} declared twice",
                    entity.name
                )));
            }
        }

        let registry = builder.build()?;
        tracing::debug!(entities = registry.len(), "Schema loaded");

        Ok(Self { registry, tables })
    }

    pub fn table(&self, entity: &str) -> Result<&TableMapping> {
        self.tables
            .get(entity)
            .ok_or_else(|| Error::UnknownEntity(entity.to_string()))
    }

    /// The entity's configured eager joins.
    pub fn default_shape(&self, entity: &str) -> Result<QueryShape> {
        let table = self.table(entity)?;
        Ok(table
            .fetch
            .iter()
            .fold(QueryShape::of(entity), |shape, attr| shape.fetch(attr.clone())))
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }
}

impl MetadataProvider for Schema {
    fn entity(&self, type_name: &str) -> Option<&EntityType> {
        self.registry.entity(type_name)
    }
}

fn map_entity(entity: &EntityConfig) -> Result<(EntityType, TableMapping)> {
    let mut entity_type = EntityType::new(&entity.name);
    let mut columns = Vec::new();
    let mut relations = Vec::new();
    let mut primary_key = None;

    for field in &entity.fields {
        if let Some(relation) = &field.relation {
            if field.primary_key {
                return Err(Error::InvalidMetadata(format!(
                    "{}.{} is a relation and cannot be the primary key",
                    entity.name, field.name
                )));
            }
            entity_type = entity_type.nested(&field.name, &relation.entity);
            relations.push(RelationMapping {
                attribute: field.name.clone(),
                target: relation.entity.clone(),
                local_column: relation.local_column.clone(),
                target_column: relation.target_column.clone(),
                many: relation.many,
            });
            continue;
        }

        let scalar_type = ScalarType::from_type_name(&field.field_type);
        let column = ColumnMapping {
            attribute: field.name.clone(),
            column: field
                .column
                .clone()
                .unwrap_or_else(|| field.name.to_snake_case()),
            scalar_type,
        };

        if field.primary_key {
            entity_type = entity_type.id(&field.name, scalar_type);
            primary_key.get_or_insert_with(|| column.clone());
        } else {
            entity_type = entity_type.field(&field.name, scalar_type);
        }
        columns.push(column);
    }

    for attr in &entity.fetch {
        if !relations.iter().any(|r| &r.attribute == attr) {
            return Err(Error::InvalidMetadata(format!(
                "{} fetches {attr}, which is not a relation",
                entity.name
            )));
        }
    }

    let primary_key = primary_key.ok_or_else(|| Error::MissingPrimaryKey(entity.name.clone()))?;

    Ok((
        entity_type,
        TableMapping {
            entity: entity.name.clone(),
            table: entity.table.clone(),
            primary_key,
            columns,
            relations,
            fetch: entity.fetch.clone(),
        },
    ))
}
