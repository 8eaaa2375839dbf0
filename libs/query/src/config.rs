//! Engine configuration

use crate::page::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do with filter keys and sort tokens that do not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownParamPolicy {
    /// Drop them and run the query with whatever did resolve.
    #[default]
    Lenient,
    /// Reject the request, listing every unresolved parameter.
    Strict,
}

impl FromStr for UnknownParamPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown parameter policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when `page`/`page_size` are not both given.
    pub default_page_size: i64,
    /// Upper bound on `page_size`; `None` disables the check.
    pub max_page_size: Option<i64>,
    pub unknown_params: UnknownParamPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: None,
            unknown_params: UnknownParamPolicy::Lenient,
        }
    }
}

impl EngineConfig {
    pub fn with_policy(mut self, policy: UnknownParamPolicy) -> Self {
        self.unknown_params = policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_page_size < 1 {
            return Err("engine.default_page_size must be at least 1".to_string());
        }
        if let Some(max) = self.max_page_size {
            if max < self.default_page_size {
                return Err(format!(
                    "engine.max_page_size ({max}) must not be smaller than default_page_size ({})",
                    self.default_page_size
                ));
            }
        }
        Ok(())
    }
}
