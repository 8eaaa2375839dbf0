//! Executor wrapper that records every query it is asked to run.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sieve_query::{CountQuery, FetchQuery, KeyQuery, QueryExecutor, Result, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Issued {
    Keys(KeyQuery),
    Count(CountQuery),
    Fetch(FetchQuery),
}

pub struct RecordingExecutor<X> {
    inner: X,
    pub issued: Vec<Issued>,
}

impl<X: QueryExecutor> RecordingExecutor<X> {
    pub fn new(inner: X) -> Self {
        Self {
            inner,
            issued: Vec::new(),
        }
    }

    pub fn inner(&self) -> &X {
        &self.inner
    }

    /// Query kinds in issue order, e.g. `["keys", "count", "fetch"]`.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.issued
            .iter()
            .map(|q| match q {
                Issued::Keys(_) => "keys",
                Issued::Count(_) => "count",
                Issued::Fetch(_) => "fetch",
            })
            .collect()
    }
}

#[async_trait]
impl<X: QueryExecutor> QueryExecutor for RecordingExecutor<X> {
    async fn select_keys(&mut self, query: &KeyQuery) -> Result<Vec<Value>> {
        self.issued.push(Issued::Keys(query.clone()));
        self.inner.select_keys(query).await
    }

    async fn count(&mut self, query: &CountQuery) -> Result<i64> {
        self.issued.push(Issued::Count(query.clone()));
        self.inner.count(query).await
    }

    async fn fetch_rows(&mut self, query: &FetchQuery) -> Result<Vec<JsonValue>> {
        self.issued.push(Issued::Fetch(query.clone()));
        self.inner.fetch_rows(query).await
    }
}
