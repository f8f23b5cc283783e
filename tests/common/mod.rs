//! Shared test harness: a throwaway Postgres container with the service
//! schema applied. Tests skip gracefully when no container runtime is
//! reachable.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, path::Path, time::Duration};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::time::sleep;

const POSTGRES_PORT: u16 = 5432;
const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Check for a Docker/Podman socket without requiring one.
fn container_runtime_available() -> bool {
    if env::var("DOCKER_HOST").is_ok() {
        return true;
    }
    if Path::new("/var/run/docker.sock").exists() {
        return true;
    }
    if let Ok(runtime_dir) = env::var("XDG_RUNTIME_DIR") {
        if Path::new(&runtime_dir).join("podman/podman.sock").exists() {
            return true;
        }
    }
    false
}

pub struct TestDb {
    _postgres: ContainerAsync<GenericImage>,
    pub pool: PgPool,
}

impl TestDb {
    /// Start a Postgres container and apply the schema. `None` means no
    /// container runtime is available and the caller should skip.
    pub async fn try_new() -> Result<Option<Self>> {
        if !container_runtime_available() {
            return Ok(None);
        }

        let postgres = GenericImage::new("postgres", "16-alpine")
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", "postgres")
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .with_env_var("POSTGRES_DB", "postgres")
            .start()
            .await
            .context("failed to start postgres container")?;

        let host = postgres
            .get_host()
            .await
            .context("failed to resolve container host")?;
        let port = postgres
            .get_host_port_ipv4(POSTGRES_PORT)
            .await
            .context("failed to resolve container port")?;
        let dsn = format!("postgres://postgres:postgres@{host}:{port}/postgres");

        let pool = connect_with_retry(&dsn).await?;

        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("failed to apply schema")?;

        Ok(Some(Self {
            _postgres: postgres,
            pool,
        }))
    }
}

/// The container reports ready during its init phase too; retry until the
/// final server accepts connections.
async fn connect_with_retry(dsn: &str) -> Result<PgPool> {
    let mut last_error = None;
    for _ in 0..60 {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(dsn)
            .await
        {
            Ok(pool) => {
                if sqlx::query("SELECT 1").execute(&pool).await.is_ok() {
                    return Ok(pool);
                }
            }
            Err(err) => last_error = Some(err),
        }
        sleep(Duration::from_millis(500)).await;
    }
    Err(anyhow::anyhow!(
        "postgres container never became ready: {last_error:?}"
    ))
}
