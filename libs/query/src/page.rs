//! Page window calculation from `page` / `page_size`

use crate::params::{RequestParameters, PAGE, PAGE_SIZE};
use crate::{Error, Result};
use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Zero-based row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpec {
    pub offset: i64,
    pub limit: i64,
}

impl PageSpec {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Window for a 1-based page number. Values are not validated.
    pub fn for_page(page: i64, page_size: i64) -> Self {
        Self {
            offset: (page - 1) * page_size,
            limit: page_size,
        }
    }

    /// Compute the window from request parameters.
    ///
    /// Only when both `page` and `page_size` are present are they used;
    /// otherwise the first page of `default_page_size` rows is returned.
    pub fn from_params(params: &RequestParameters, default_page_size: i64) -> Result<Self> {
        match (params.get(PAGE), params.get(PAGE_SIZE)) {
            (Some(page), Some(page_size)) => {
                let page_size = parse_int(PAGE_SIZE, page_size)?;
                let page = parse_int(PAGE, page)?;
                Ok(Self::for_page(page, page_size))
            }
            _ => Ok(Self::for_page(DEFAULT_PAGE, default_page_size)),
        }
    }

    /// True when the window can be executed: a positive limit and a
    /// non-negative offset.
    pub fn is_executable(&self) -> bool {
        self.limit > 0 && self.offset >= 0
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::for_page(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

fn parse_int(param: &'static str, raw: &str) -> Result<i64> {
    raw.parse::<i32>()
        .map(i64::from)
        .map_err(|_| Error::InvalidPageParameter {
            param,
            value: raw.to_string(),
        })
}
