use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::services::store::{Document, ProfileStore, StoreError, NEW_DOCUMENT};

/// PostgreSQL-backed document store
///
/// Every profile and questionnaire lives in a single `documents` table keyed by
/// `(collection, id)`, with the JSON body in a JSONB column and a version
/// counter used for conditional updates.
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Create a new store from a connection string and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max {} connections)",
            settings.max_connections
        );

        Self::new(
            &settings.url,
            settings.max_connections,
            settings.min_connections,
            Duration::from_secs(settings.acquire_timeout_secs),
        )
        .await
    }

    async fn current_version(&self, collection: &str, id: &str) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT version FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| version_from(row.get("version"))).transpose()
    }
}

fn version_from(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::Corrupt(format!("negative version {}", raw)))
}

fn version_to(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version).map_err(|_| StoreError::Corrupt(format!("version {} out of range", version)))
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let query = r#"
            SELECT id, body, version
            FROM documents
            WHERE collection = $1 AND id = $2
        "#;

        let row = sqlx::query(query)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Document {
                id: row.get("id"),
                body: row.get::<Value, _>("body"),
                version: version_from(row.get("version"))?,
            })
        })
        .transpose()
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let query = r#"
            SELECT id, body, version
            FROM documents
            WHERE collection = $1
            ORDER BY inserted_at, id
        "#;

        let rows = sqlx::query(query)
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Fetched {} documents from {}", rows.len(), collection);

        rows.iter()
            .map(|row| {
                Ok(Document {
                    id: row.get("id"),
                    body: row.get::<Value, _>("body"),
                    version: version_from(row.get("version"))?,
                })
            })
            .collect()
    }

    /// Conditional write
    ///
    /// Inserts use `ON CONFLICT DO NOTHING`; updates only match the row when
    /// its version is still the expected one. Zero affected rows means another
    /// writer got there first.
    async fn save(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let written: Option<i64> = if expected_version == NEW_DOCUMENT {
            let query = r#"
                INSERT INTO documents (collection, id, body, version, inserted_at, updated_at)
                VALUES ($1, $2, $3, 1, NOW(), NOW())
                ON CONFLICT (collection, id) DO NOTHING
                RETURNING version
            "#;

            sqlx::query_scalar(query)
                .bind(collection)
                .bind(id)
                .bind(&body)
                .fetch_optional(&self.pool)
                .await?
        } else {
            let query = r#"
                UPDATE documents
                SET body = $3, version = version + 1, updated_at = NOW()
                WHERE collection = $1 AND id = $2 AND version = $4
                RETURNING version
            "#;

            sqlx::query_scalar(query)
                .bind(collection)
                .bind(id)
                .bind(&body)
                .bind(version_to(expected_version)?)
                .fetch_optional(&self.pool)
                .await?
        };

        match written {
            Some(version) => {
                tracing::debug!("Saved {}/{} at version {}", collection, id, version);
                version_from(version)
            }
            None => {
                let found = self.current_version(collection, id).await?;
                tracing::warn!(
                    "Version conflict on {}/{}: expected {}, found {:?}",
                    collection,
                    id,
                    expected_version,
                    found
                );
                Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    expected: expected_version,
                    found,
                })
            }
        }
    }

    async fn remove(&self, collection: &str, id: &str, expected_version: u64) -> Result<bool, StoreError> {
        let query = r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = $2 AND version = $3
        "#;

        let result = sqlx::query(query)
            .bind(collection)
            .bind(id)
            .bind(version_to(expected_version)?)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!("Removed {}/{}", collection, id);
            return Ok(true);
        }

        match self.current_version(collection, id).await? {
            None => Ok(false),
            found => Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected: expected_version,
                found,
            }),
        }
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
