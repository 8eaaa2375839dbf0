#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

use anyhow::Context as _;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    Router,
};
use futures::FutureExt as _;
use sieve_server::{api::create_router, db, AppState, Config};
use sqlx::Connection as _;
use tower::ServiceExt as _;
use url::Url;
use uuid::Uuid;

pub use assertions::*;
pub use fixtures::*;

/// PostgreSQL URL for HTTP tests; tests are skipped when unset.
pub const TEST_DATABASE_URL_ENV: &str = "SIEVE_TEST_DATABASE_URL";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    schema: String,
    admin_database_url: String,
}

impl TestApp {
    pub async fn new(admin_database_url: String) -> anyhow::Result<Self> {
        Self::new_with_config(admin_database_url, |_| {}).await
    }

    pub async fn new_with_config(
        admin_database_url: String,
        configure: impl FnOnce(&mut Config),
    ) -> anyhow::Result<Self> {
        // Per-test schema and DB pool.
        let schema = format!("test_{}", Uuid::new_v4().simple());
        let mut admin_conn = sqlx::PgConnection::connect(&admin_database_url)
            .await
            .context("connect admin db for schema create")?;
        sqlx::query(&format!(r#"CREATE SCHEMA "{}""#, schema))
            .execute(&mut admin_conn)
            .await
            .context("create test schema")?;

        let mut config = Config::default();
        config.schema = schema_config();
        config.database.url = with_search_path(&admin_database_url, &schema)?;
        config.database.pool_min_size = 0;
        config.database.pool_max_size = 2;
        configure(&mut config);

        let pool = db::connect(&config.database)
            .await
            .context("connect test pool")?;
        sqlx::raw_sql(SEED_SQL)
            .execute(&pool)
            .await
            .context("seed test schema")?;

        let state = AppState::with_pool(config, pool).context("initialize AppState")?;
        let router = create_router(state.clone());

        Ok(Self {
            router,
            state,
            schema,
            admin_database_url,
        })
    }

    pub async fn cleanup(self) -> anyhow::Result<()> {
        self.state.db_pool.close().await;

        let mut admin_conn = sqlx::PgConnection::connect(&self.admin_database_url)
            .await
            .context("connect admin db for schema drop")?;
        sqlx::query(&format!(r#"DROP SCHEMA "{}" CASCADE"#, self.schema))
            .execute(&mut admin_conn)
            .await
            .context("drop test schema")?;

        Ok(())
    }

    pub async fn get(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, HeaderMap, serde_json::Value)> {
        self.get_with_headers(path_and_query, &[]).await
    }

    pub async fn get_with_headers(
        &self,
        path_and_query: &str,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, serde_json::Value)> {
        let mut request = Request::builder()
            .method(Method::GET)
            .uri(path_and_query)
            .header("host", "example.org")
            .body(Body::empty())
            .context("build request")?;

        for (name, value) in extra_headers {
            request.headers_mut().insert(
                name.parse::<HeaderName>().context("parse header name")?,
                value.parse::<HeaderValue>().context("parse header value")?,
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
        };

        Ok((status, headers, json))
    }
}

/// Run `f` against a fresh, seeded schema; a no-op when no test database
/// is configured.
pub async fn with_test_app<F>(f: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(
        &'a TestApp,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + 'a>,
    >,
{
    with_test_app_with_config(|_| {}, f).await
}

pub async fn with_test_app_with_config<C, F>(configure: C, f: F) -> anyhow::Result<()>
where
    C: FnOnce(&mut Config),
    F: for<'a> FnOnce(
        &'a TestApp,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + 'a>,
    >,
{
    let Ok(database_url) = std::env::var(TEST_DATABASE_URL_ENV) else {
        eprintln!("{TEST_DATABASE_URL_ENV} not set, skipping");
        return Ok(());
    };

    let app = TestApp::new_with_config(database_url, configure).await?;

    let result = std::panic::AssertUnwindSafe(f(&app)).catch_unwind().await;
    let cleanup_result = app.cleanup().await;

    if let Err(e) = cleanup_result {
        eprintln!("test schema cleanup failed: {e:?}");
    }

    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn with_search_path(database_url: &str, schema: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(database_url).context("parse database URL")?;
    url.query_pairs_mut()
        .append_pair("options", &format!("-c search_path={}", schema));
    Ok(url.to_string())
}
