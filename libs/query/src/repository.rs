//! Dynamic repository - two-phase paginated search
//!
//! `find_by_params` runs every search as:
//! 1. a key query selecting one page of distinct primary keys, filtered and
//!    sorted on the underlying rows
//! 2. a count of distinct primary keys matching the same filter
//! 3. a fetch of complete rows whose primary key is in the page's key list
//!
//! Joins never see `LIMIT`/`OFFSET`, so a row expanded by a one-to-many join
//! still counts once and still occupies exactly one slot of the page.

use crate::config::{EngineConfig, UnknownParamPolicy};
use crate::executor::{CountQuery, FetchQuery, KeyQuery, QueryExecutor};
use crate::metadata::{EntityType, MetadataProvider};
use crate::normalize::normalize_filters;
use crate::page::PageSpec;
use crate::params::RequestParameters;
use crate::predicate::build_predicate;
use crate::sort::{resolve_sort, SortSpec};
use crate::value::Value;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Root type of a query plus the nested attributes to embed in fetched rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryShape {
    entity: String,
    fetch: Vec<String>,
}

impl QueryShape {
    pub fn of(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fetch: Vec::new(),
        }
    }

    /// Eagerly embed a nested attribute of the root type.
    pub fn fetch(mut self, attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        if !self.fetch.contains(&attribute) {
            self.fetch.push(attribute);
        }
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn joins(&self) -> &[String] {
        &self.fetch
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Distinct rows matching the filter, independent of the page window.
    pub total_count: i64,
    /// The page's rows, in key-selection order.
    pub rows: Vec<JsonValue>,
    /// Parameters dropped because they did not resolve.
    #[serde(skip)]
    pub ignored_params: Vec<String>,
}

/// The queries a search will issue, before any of them runs.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub keys: KeyQuery,
    pub count: CountQuery,
    pub fetch: Vec<String>,
    pub ignored_params: Vec<String>,
}

/// Query orchestrator bound to one metadata provider and one executor.
pub struct DynamicRepository<P, X> {
    metadata: P,
    executor: X,
    config: EngineConfig,
}

impl<P, X> DynamicRepository<P, X>
where
    P: MetadataProvider,
    X: QueryExecutor,
{
    pub fn new(metadata: P, executor: X) -> Self {
        Self {
            metadata,
            executor,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }

    /// Search `entity` with no eager joins.
    pub async fn find_by_params(
        &mut self,
        params: &RequestParameters,
        entity: &str,
    ) -> Result<PageResult> {
        self.find_by_params_with(params, QueryShape::of(entity))
            .await
    }

    /// Search with a caller-built query shape.
    pub async fn find_by_params_with(
        &mut self,
        params: &RequestParameters,
        shape: QueryShape,
    ) -> Result<PageResult> {
        let plan = self.plan(params, &shape)?;

        tracing::debug!(
            entity = shape.entity(),
            predicate = ?plan.keys.predicate.as_ref().map(ToString::to_string),
            offset = plan.keys.page.offset,
            limit = plan.keys.page.limit,
            "Selecting page keys"
        );
        let keys = self.executor.select_keys(&plan.keys).await?;

        let total_count = self.executor.count(&plan.count).await?;

        let rows = if keys.is_empty() {
            Vec::new()
        } else {
            let fetch = FetchQuery {
                entity: plan.keys.entity.clone(),
                primary_key: plan.keys.primary_key.clone(),
                keys,
                fetch: plan.fetch,
            };
            let rows = self.executor.fetch_rows(&fetch).await?;
            order_by_keys(rows, &fetch.keys, &fetch.primary_key)
        };

        tracing::debug!(
            entity = shape.entity(),
            total_count,
            returned = rows.len(),
            "Search complete"
        );

        Ok(PageResult {
            total_count,
            rows,
            ignored_params: plan.ignored_params,
        })
    }

    /// Load one row by primary key, embedding the shape's joins.
    ///
    /// The raw key is coerced against the primary key's declared type.
    pub async fn find_by_id_with_joins(
        &mut self,
        key: &str,
        shape: QueryShape,
    ) -> Result<Option<JsonValue>> {
        let entity = self.entity(shape.entity())?;
        let primary_key = primary_key(entity)?;
        validate_shape(entity, &shape)?;

        let key = primary_key.scalar_type.coerce(&primary_key.name, key)?;
        let fetch = FetchQuery {
            entity: entity.name.clone(),
            primary_key: primary_key.name.clone(),
            keys: vec![key],
            fetch: shape.fetch,
        };

        let rows = self.executor.fetch_rows(&fetch).await?;
        Ok(order_by_keys(rows, &fetch.keys, &fetch.primary_key)
            .into_iter()
            .next())
    }

    /// Build the key and count queries for a search without running them.
    pub fn plan(&self, params: &RequestParameters, shape: &QueryShape) -> Result<QueryPlan> {
        let entity = self.entity(shape.entity())?;
        let primary_key = primary_key(entity)?.name.clone();
        validate_shape(entity, shape)?;

        let normalized = normalize_filters(params, &entity.name, &self.metadata)?;
        let sort_parse = SortSpec::parse(params.sort_by());
        let (sort, unresolved_sort) = resolve_sort(&sort_parse.spec, &entity.name, &self.metadata);
        let page = PageSpec::from_params(params, self.config.default_page_size)?;
        self.validate_page(&page)?;

        let mut ignored_params = normalized.ignored;
        ignored_params.extend(sort_parse.ignored);
        ignored_params.extend(unresolved_sort);

        if self.config.unknown_params == UnknownParamPolicy::Strict && !ignored_params.is_empty()
        {
            return Err(Error::Validation(format!(
                "Unknown or unsupported parameters for {}: {}",
                entity.name,
                ignored_params.join(", ")
            )));
        }

        Ok(QueryPlan {
            keys: KeyQuery {
                entity: entity.name.clone(),
                primary_key: primary_key.clone(),
                predicate: build_predicate(&normalized.filters),
                sort,
                page,
            },
            count: CountQuery {
                entity: entity.name.clone(),
                primary_key,
                predicate: build_predicate(&normalized.filters),
            },
            fetch: shape.fetch.clone(),
            ignored_params,
        })
    }

    fn entity(&self, name: &str) -> Result<&EntityType> {
        self.metadata
            .entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    fn validate_page(&self, page: &PageSpec) -> Result<()> {
        if !page.is_executable() {
            return Err(Error::Validation(format!(
                "page and page_size must be positive (offset {}, limit {})",
                page.offset, page.limit
            )));
        }
        if let Some(max) = self.config.max_page_size {
            if page.limit > max {
                return Err(Error::Validation(format!(
                    "page_size {} exceeds the maximum of {max}",
                    page.limit
                )));
            }
        }
        Ok(())
    }
}

fn primary_key(entity: &EntityType) -> Result<&crate::metadata::AttributeMetadata> {
    entity.primary_key().ok_or_else(|| {
        tracing::error!(entity = %entity.name, "Entity type has no primary key");
        Error::MissingPrimaryKey(entity.name.clone())
    })
}

fn validate_shape(entity: &EntityType, shape: &QueryShape) -> Result<()> {
    for join in &shape.fetch {
        match entity.attribute(join) {
            Some(attr) if attr.is_nested() => {}
            _ => {
                return Err(Error::InvalidShape(format!(
                    "{} has no nested attribute {join}",
                    entity.name
                )))
            }
        }
    }
    Ok(())
}

/// Reorder fetched rows to follow `keys`. Rows whose key is not in the list
/// keep their relative order after the matched ones.
fn order_by_keys(rows: Vec<JsonValue>, keys: &[Value], primary_key: &str) -> Vec<JsonValue> {
    let mut ranked: Vec<(usize, JsonValue)> = rows
        .into_iter()
        .map(|row| {
            let rank = row
                .get(primary_key)
                .and_then(|id| keys.iter().position(|k| k.matches_json(id)))
                .unwrap_or(usize::MAX);
            (rank, row)
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, row)| row).collect()
}
