//! HTTP header handling
//!
//! ## Request Headers
//! - `Prefer: handling=strict|lenient` - how unknown search parameters are treated
//!
//! ## Response Headers
//! - `X-Ignored-Params` - search parameters dropped under lenient handling

use axum::http::{HeaderMap, HeaderValue};
use sieve_query::UnknownParamPolicy;

pub const IGNORED_PARAMS_HEADER: &str = "x-ignored-params";

/// Prefer header handling preference (for search operations)
///
/// Controls how the server handles unknown or unsupported search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferHandling {
    /// Ignore unknown or unsupported parameters
    Lenient,
    /// Return an error for any unknown or unsupported parameter
    Strict,
}

impl From<PreferHandling> for UnknownParamPolicy {
    fn from(handling: PreferHandling) -> Self {
        match handling {
            PreferHandling::Lenient => UnknownParamPolicy::Lenient,
            PreferHandling::Strict => UnknownParamPolicy::Strict,
        }
    }
}

/// Extract the Prefer header handling preference, if the client stated one.
///
/// The Prefer header can contain multiple preferences separated by commas.
///
/// # Examples
/// ```
/// use axum::http::HeaderMap;
/// use sieve_server::api::headers::{extract_prefer_handling, PreferHandling};
/// let mut headers = HeaderMap::new();
/// headers.insert("prefer", "return=minimal, handling=strict".parse().unwrap());
/// assert_eq!(extract_prefer_handling(&headers), Some(PreferHandling::Strict));
/// ```
pub fn extract_prefer_handling(headers: &HeaderMap) -> Option<PreferHandling> {
    let prefer = headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_ascii_lowercase())?;

    if prefer.contains("handling=strict") {
        Some(PreferHandling::Strict)
    } else if prefer.contains("handling=lenient") {
        Some(PreferHandling::Lenient)
    } else {
        None
    }
}

/// Header value listing ignored parameters. `None` when there are none or
/// they cannot be represented as a header value.
pub fn ignored_params_value(ignored: &[String]) -> Option<HeaderValue> {
    if ignored.is_empty() {
        return None;
    }
    HeaderValue::from_str(&ignored.join(",")).ok()
}
