#![allow(dead_code)]

pub mod fixtures;
pub mod memory;
pub mod recording;

pub use fixtures::*;
pub use memory::MemoryExecutor;
pub use recording::{Issued, RecordingExecutor};

use sieve_query::RequestParameters;

pub fn params(items: &[(&str, &str)]) -> RequestParameters {
    items.iter().copied().collect()
}
