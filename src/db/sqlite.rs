use crate::db::schema::SQLITE_INIT;
use crate::error::PlatformError;
use crate::types::{CountBucket, PlatformCounts};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// Handle to the platform database. Cheap to clone; every clone shares the pool.
#[derive(Clone)]
pub struct PlatformStorage {
    pool: SqlitePool,
}

impl PlatformStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    ///
    /// In-memory databases live only as long as their connection, so they get
    /// a pool of exactly one connection that is never recycled.
    pub async fn connect(database_url: &str) -> Result<Self, PlatformError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        if !in_memory
            && let Some(parent) = connect_opts.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut pool_opts = SqlitePoolOptions::new();
        if in_memory {
            pool_opts = pool_opts
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_opts.connect_with(connect_opts).await?;

        let storage = Self::new(pool);
        storage.init_schema().await?;
        info!(database_url, "database ready");
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), PlatformError> {
        // execute multiple statements one by one; sqlx::query takes a single statement
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Row counts shown on the dashboard.
    pub async fn platform_counts(&self) -> Result<PlatformCounts, PlatformError> {
        let counts = sqlx::query_as::<_, PlatformCounts>(
            r#"SELECT
                (SELECT COUNT(*) FROM security_incidents) AS incidents,
                (SELECT COUNT(*) FROM it_tickets) AS tickets,
                (SELECT COUNT(*) FROM datasets) AS datasets"#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    /// Value counts of one column, most frequent first; feeds the chart series.
    pub(crate) async fn count_by(
        &self,
        table: &'static str,
        column: &'static str,
    ) -> Result<Vec<CountBucket>, PlatformError> {
        let sql = format!(
            "SELECT {column} AS label, COUNT(*) AS count FROM {table} \
             GROUP BY {column} ORDER BY count DESC, label ASC"
        );
        let buckets = sqlx::query_as::<_, CountBucket>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(buckets)
    }
}

/// Turn "no row touched" into a typed not-found error.
pub(crate) fn expect_affected(
    result: SqliteQueryResult,
    entity: &'static str,
    id: i64,
) -> Result<(), PlatformError> {
    if result.rows_affected() == 0 {
        return Err(PlatformError::NotFound { entity, id });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_storage() -> PlatformStorage {
    PlatformStorage::connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}
