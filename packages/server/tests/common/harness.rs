//! Test harness with testcontainers for integration testing.
//!
//! Uses a shared Postgres container across all tests. The container and
//! migrations are initialized once on first test, then reused.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::path::PathBuf;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use affiliation_core::config::DEFAULT_MAX_UPLOAD_BYTES;
use affiliation_core::kernel::{LocalBlobStore, ServerDeps};

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        // Run migrations once on the shared database
        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Test harness backed by the shared Postgres container.
///
/// Each test gets a fresh pool and its own blob directory. Tests share the
/// database, so fixtures always create their own users and pages.
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let deps = ctx.deps();
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub storage_root: PathBuf,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        let _ = tokio::fs::remove_dir_all(&self.storage_root).await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        let storage_root =
            std::env::temp_dir().join(format!("affiliation-it-{}", uuid::Uuid::new_v4()));

        Ok(Self {
            db_pool,
            storage_root,
        })
    }

    /// Postgres-backed dependencies writing blobs under this harness's directory
    pub fn deps(&self) -> ServerDeps {
        ServerDeps::postgres(
            self.db_pool.clone(),
            LocalBlobStore::new(self.storage_root.clone()),
            DEFAULT_MAX_UPLOAD_BYTES,
        )
    }

    /// Whether a blob exists on disk
    pub fn blob_exists(&self, path: &str) -> bool {
        self.storage_root.join(path).exists()
    }
}
