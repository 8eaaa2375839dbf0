//! `sort_by` parsing and resolution

use crate::metadata::{resolve_path, AttributePath, MetadataProvider};
use crate::params::{camelize, split_list, LIST_SEPARATOR, PATH_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn is_ascending(self) -> bool {
        matches!(self, Self::Asc)
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// One `attribute[.direction]` entry as written in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub attribute: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(attribute: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            attribute: attribute.into(),
            direction,
        }
    }
}

/// Ordered sort entries; earlier entries take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec(pub Vec<SortOrder>);

/// Output of [`SortSpec::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortParse {
    pub spec: SortSpec,
    /// Tokens skipped because their direction was not `asc` or `desc`, or
    /// because they named no attribute.
    pub ignored: Vec<String>,
}

impl SortSpec {
    /// Parse a `sort_by` value. `None` yields an empty spec.
    pub fn parse(raw: Option<&str>) -> SortParse {
        let mut out = SortParse::default();
        let Some(raw) = raw else {
            return out;
        };

        for token in split_list(raw, LIST_SEPARATOR) {
            let mut parts = token.splitn(2, PATH_SEPARATOR);
            let attribute = parts.next().unwrap_or_default();
            if attribute.is_empty() {
                out.ignored.push(token.to_string());
                continue;
            }

            let direction = match parts.next() {
                None => SortDirection::Asc,
                Some(dir) => match SortDirection::parse(dir) {
                    Some(d) => d,
                    None => {
                        tracing::debug!(token, "Ignoring sort token with unknown direction");
                        out.ignored.push(token.to_string());
                        continue;
                    }
                },
            };

            out.spec.0.push(SortOrder::new(attribute, direction));
        }

        out
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SortOrder> {
        self.0.iter()
    }
}

/// A sort entry resolved to a scalar attribute of the root type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSort {
    pub path: AttributePath,
    pub direction: SortDirection,
}

/// Resolve sort attributes against `entity`. Entries that do not name a
/// scalar attribute of the root type are returned separately.
pub fn resolve_sort<P>(
    spec: &SortSpec,
    entity: &str,
    provider: &P,
) -> (Vec<ResolvedSort>, Vec<String>)
where
    P: MetadataProvider + ?Sized,
{
    let mut resolved = Vec::with_capacity(spec.0.len());
    let mut ignored = Vec::new();

    for order in spec.iter() {
        let attribute = camelize(&order.attribute);
        match resolve_path(provider, entity, &[attribute.as_str()]) {
            Some(path) => resolved.push(ResolvedSort {
                path: path.attribute_path(),
                direction: order.direction,
            }),
            None => {
                tracing::debug!(entity, attribute = %order.attribute, "Ignoring unknown sort attribute");
                ignored.push(order.attribute.clone());
            }
        }
    }

    (resolved, ignored)
}
