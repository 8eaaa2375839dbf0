//! Dynamic query engine
//!
//! Builds type-safe queries from loosely typed request parameters and runs
//! them as a join-safe, two-phase paginated search:
//! - filter keys are normalized, resolved against entity metadata and coerced
//! - filters become an equality / set-membership predicate tree
//! - `sort_by`, `page` and `page_size` become sort orders and a row window
//! - the repository selects a page of distinct keys, counts matches, then
//!   fetches complete rows for those keys
//!
//! Storage and metadata are supplied through the [`QueryExecutor`] and
//! [`MetadataProvider`] traits.

pub mod config;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod normalize;
pub mod page;
pub mod params;
pub mod predicate;
pub mod repository;
pub mod sort;
pub mod value;

pub use config::{EngineConfig, UnknownParamPolicy};
pub use error::{Error, Result};
pub use executor::{CountQuery, FetchQuery, KeyQuery, QueryExecutor};
pub use metadata::{
    resolve_path, AttributeMetadata, AttributePath, EntityRegistry, EntityType, MetadataProvider,
    PathExpr, PathStep,
};
pub use normalize::{normalize_filters, FilterValue, Normalized, NormalizedFilter};
pub use page::PageSpec;
pub use params::RequestParameters;
pub use predicate::{build_predicate, Predicate};
pub use repository::{DynamicRepository, PageResult, QueryPlan, QueryShape};
pub use sort::{ResolvedSort, SortDirection, SortOrder, SortSpec};
pub use value::{ScalarType, Value};
