//! Query descriptions handed to the execution engine
//!
//! A paginated search is executed as three separate queries:
//! - [`KeyQuery`]: distinct primary keys for one page, filtered and sorted
//! - [`CountQuery`]: number of distinct primary keys matching the filter
//! - [`FetchQuery`]: complete rows for the selected keys, with eager joins
//!
//! Keeping pagination on the key query (and never on a joined row set) keeps
//! page boundaries and totals correct when joins multiply rows.

use crate::page::PageSpec;
use crate::predicate::Predicate;
use crate::sort::ResolvedSort;
use crate::value::Value;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Select the primary keys of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyQuery {
    pub entity: String,
    pub primary_key: String,
    /// `None` means no filter at all.
    pub predicate: Option<Predicate>,
    /// Applied to the underlying row, in precedence order.
    pub sort: Vec<ResolvedSort>,
    pub page: PageSpec,
}

/// Count distinct primary keys matching a predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    pub entity: String,
    pub primary_key: String,
    pub predicate: Option<Predicate>,
}

/// Load complete rows by primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchQuery {
    pub entity: String,
    pub primary_key: String,
    pub keys: Vec<Value>,
    /// Nested attributes of the root type to embed in each row.
    pub fetch: Vec<String>,
}

/// Execution engine for the three query kinds.
///
/// One executor is bound to one connection or session; the repository issues
/// its queries strictly one after another.
#[async_trait]
pub trait QueryExecutor: Send {
    /// Distinct primary keys matching the predicate, sorted, windowed.
    ///
    /// Rows multiplied by joins must be collapsed to one per key *before*
    /// `offset`/`limit` are applied.
    async fn select_keys(&mut self, query: &KeyQuery) -> Result<Vec<Value>>;

    /// Number of distinct primary keys matching the predicate.
    async fn count(&mut self, query: &CountQuery) -> Result<i64>;

    /// One JSON object per matching key. Order is unspecified.
    async fn fetch_rows(&mut self, query: &FetchQuery) -> Result<Vec<JsonValue>>;
}

#[async_trait]
impl<X: QueryExecutor + ?Sized> QueryExecutor for &mut X {
    async fn select_keys(&mut self, query: &KeyQuery) -> Result<Vec<Value>> {
        (**self).select_keys(query).await
    }

    async fn count(&mut self, query: &CountQuery) -> Result<i64> {
        (**self).count(query).await
    }

    async fn fetch_rows(&mut self, query: &FetchQuery) -> Result<Vec<JsonValue>> {
        (**self).fetch_rows(query).await
    }
}
