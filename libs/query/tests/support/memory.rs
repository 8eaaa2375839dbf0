//! In-memory executor over JSON documents.
//!
//! Each root row is a document whose nested attributes hold an object
//! (to-one) or an array (to-many). Filtering on a to-many attribute expands
//! the row once per element and drops rows with no element, mirroring an
//! inner join, so the repository's de-duplication is actually exercised.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sieve_query::{
    CountQuery, EntityRegistry, Error, FetchQuery, KeyQuery, MetadataProvider, Predicate,
    QueryExecutor, Result, ScalarType, Value,
};
use std::cmp::Ordering;
use std::collections::HashMap;

pub struct MemoryExecutor {
    registry: EntityRegistry,
    tables: HashMap<String, Vec<JsonValue>>,
    /// Rows the last key query saw after joins, before de-duplication.
    pub last_joined_rows: usize,
}

impl MemoryExecutor {
    pub fn new(registry: EntityRegistry) -> Self {
        Self {
            registry,
            tables: HashMap::new(),
            last_joined_rows: 0,
        }
    }

    pub fn with_rows(mut self, entity: &str, rows: Vec<JsonValue>) -> Self {
        self.tables.insert(entity.to_string(), rows);
        self
    }

    fn table(&self, entity: &str) -> Result<&[JsonValue]> {
        self.tables
            .get(entity)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Execution(format!("no table for {entity}")))
    }

    fn joined(&self, entity: &str, predicate: Option<&Predicate>) -> Result<Vec<JsonValue>> {
        let joins = join_attributes(predicate);
        let mut rows = Vec::new();
        for row in self.table(entity)? {
            for expanded in expand(row, &joins) {
                if predicate.map_or(true, |p| evaluate(p, &expanded)) {
                    rows.push(expanded);
                }
            }
        }
        Ok(rows)
    }

    fn key_type(&self, entity: &str) -> ScalarType {
        self.registry
            .primary_key_of(entity)
            .map(|pk| pk.scalar_type)
            .unwrap_or(ScalarType::Text)
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn select_keys(&mut self, query: &KeyQuery) -> Result<Vec<Value>> {
        let mut rows = self.joined(&query.entity, query.predicate.as_ref())?;
        self.last_joined_rows = rows.len();

        rows.sort_by(|a, b| {
            query
                .sort
                .iter()
                .map(|order| {
                    let attr = order.path.segments()[0].as_str();
                    let ordering = compare(a.get(attr), b.get(attr));
                    if order.direction.is_ascending() {
                        ordering
                    } else {
                        ordering.reverse()
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or_else(|| {
                    compare(a.get(&query.primary_key), b.get(&query.primary_key))
                })
        });

        let mut keys: Vec<JsonValue> = Vec::new();
        for row in rows {
            if let Some(key) = row.get(&query.primary_key) {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }

        let key_type = self.key_type(&query.entity);
        Ok(keys
            .into_iter()
            .skip(query.page.offset as usize)
            .take(query.page.limit as usize)
            .filter_map(|key| to_value(key_type, &key))
            .collect())
    }

    async fn count(&mut self, query: &CountQuery) -> Result<i64> {
        let rows = self.joined(&query.entity, query.predicate.as_ref())?;
        let mut keys: Vec<&JsonValue> = rows
            .iter()
            .filter_map(|row| row.get(&query.primary_key))
            .collect();
        keys.sort_by(|a, b| compare(Some(*a), Some(*b)));
        keys.dedup();
        Ok(keys.len() as i64)
    }

    async fn fetch_rows(&mut self, query: &FetchQuery) -> Result<Vec<JsonValue>> {
        let entity = self
            .registry
            .entity(&query.entity)
            .ok_or_else(|| Error::UnknownEntity(query.entity.clone()))?;
        let nested: Vec<&str> = entity
            .attributes
            .iter()
            .filter(|a| a.is_nested() && !query.fetch.contains(&a.name))
            .map(|a| a.name.as_str())
            .collect();

        Ok(self
            .table(&query.entity)?
            .iter()
            .filter(|row| {
                row.get(&query.primary_key)
                    .is_some_and(|id| query.keys.iter().any(|k| k.matches_json(id)))
            })
            .map(|row| {
                let mut row = row.clone();
                if let Some(object) = row.as_object_mut() {
                    for name in &nested {
                        object.remove(*name);
                    }
                }
                row
            })
            .collect())
    }
}

fn join_attributes(predicate: Option<&Predicate>) -> Vec<String> {
    let mut joins: Vec<String> = Vec::new();
    for path in predicate.map(Predicate::paths).unwrap_or_default() {
        if path.is_nested() {
            let first = path.segments()[0].clone();
            if !joins.contains(&first) {
                joins.push(first);
            }
        }
    }
    joins
}

/// One row per combination of joined elements; a missing or empty relation
/// removes the row.
fn expand(row: &JsonValue, joins: &[String]) -> Vec<JsonValue> {
    let mut rows = vec![row.clone()];
    for join in joins {
        let mut next = Vec::new();
        for current in rows {
            match current.get(join) {
                Some(JsonValue::Array(items)) => {
                    for item in items.clone() {
                        let mut copy = current.clone();
                        copy[join.as_str()] = item;
                        next.push(copy);
                    }
                }
                Some(JsonValue::Object(_)) => next.push(current),
                _ => {}
            }
        }
        rows = next;
    }
    rows
}

fn lookup<'a>(row: &'a JsonValue, segments: &[String]) -> Option<&'a JsonValue> {
    segments.iter().try_fold(row, |node, segment| node.get(segment))
}

fn evaluate(predicate: &Predicate, row: &JsonValue) -> bool {
    match predicate {
        Predicate::Equals { path, value } => {
            lookup(row, path.segments()).is_some_and(|found| value.matches_json(found))
        }
        Predicate::In { path, values } => lookup(row, path.segments())
            .is_some_and(|found| values.iter().any(|v| v.matches_json(found))),
        Predicate::And(left, right) => evaluate(left, row) && evaluate(right, row),
    }
}

fn compare(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (None | Some(JsonValue::Null), None | Some(JsonValue::Null)) => Ordering::Equal,
        (None | Some(JsonValue::Null), _) => Ordering::Greater,
        (_, None | Some(JsonValue::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn to_value(key_type: ScalarType, key: &JsonValue) -> Option<Value> {
    match key {
        JsonValue::String(s) => key_type.coerce("key", s).ok(),
        other => key_type.coerce("key", &other.to_string()).ok(),
    }
}
