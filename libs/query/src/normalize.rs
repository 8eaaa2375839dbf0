//! Parameter normalization
//!
//! Turns raw filter parameters into [`NormalizedFilter`]s:
//! - keys are camelized (`user_name` -> `userName`)
//! - dotted keys are resolved one segment at a time through nested types
//! - values are split on `,` into lists and coerced to the attribute's type
//!
//! Keys that do not resolve are not errors. They are returned in
//! [`Normalized::ignored`] and the caller decides what to do with them.

use crate::metadata::{resolve_path, AttributePath, MetadataProvider};
use crate::params::{camelize, split_list, RequestParameters, LIST_SEPARATOR, PATH_SEPARATOR};
use crate::value::{ScalarType, Value};
use crate::Result;

/// Coerced filter value: a scalar for equality or a list for set membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Single(Value),
    List(Vec<Value>),
}

/// A filter resolved against entity metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFilter {
    pub path: AttributePath,
    pub value: FilterValue,
}

/// Output of [`normalize_filters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub filters: Vec<NormalizedFilter>,
    /// Raw keys that did not resolve to a scalar attribute.
    pub ignored: Vec<String>,
}

/// Normalize every non-reserved parameter against `entity`'s metadata.
///
/// Coercion failures abort the whole request.
pub fn normalize_filters<P>(
    params: &RequestParameters,
    entity: &str,
    provider: &P,
) -> Result<Normalized>
where
    P: MetadataProvider + ?Sized,
{
    let mut out = Normalized::default();

    for (key, raw) in params.filter_candidates() {
        let attribute = camelize(key);
        let segments: Vec<&str> = attribute.split(PATH_SEPARATOR).collect();

        let resolved = resolve_path(provider, entity, &segments);
        let Some((path, leaf_type)) = resolved
            .as_ref()
            .and_then(|path| Some((path, path.leaf()?.scalar_type)))
        else {
            tracing::debug!(entity, parameter = key, "Ignoring unresolvable filter");
            out.ignored.push(key.to_string());
            continue;
        };

        let attribute_path = path.attribute_path();
        let value = parse_value(&attribute_path.to_string(), leaf_type, raw)?;

        out.filters.push(NormalizedFilter {
            path: attribute_path,
            value,
        });
    }

    Ok(out)
}

/// Coerce a raw parameter value, splitting it into a list when it contains
/// the list separator.
pub fn parse_value(attribute: &str, scalar_type: ScalarType, raw: &str) -> Result<FilterValue> {
    if raw.contains(LIST_SEPARATOR) {
        let values = split_list(raw, LIST_SEPARATOR)
            .into_iter()
            .map(|token| scalar_type.coerce(attribute, token))
            .collect::<Result<Vec<_>>>()?;
        Ok(FilterValue::List(values))
    } else {
        scalar_type.coerce(attribute, raw).map(FilterValue::Single)
    }
}
