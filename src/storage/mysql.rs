use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

use crate::requests::Request;
use crate::storage::configuration::MySqlSettings;
use crate::storage::{RequestRepository, StorageError, StoredRequest};

const CREATE_REQUESTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS requests (
    id INT UNSIGNED NOT NULL AUTO_INCREMENT,
    created_at TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    deleted_at TIMESTAMP NULL DEFAULT NULL,
    uuid VARCHAR(255) NOT NULL,
    hostname VARCHAR(255) NOT NULL,
    PRIMARY KEY (id),
    UNIQUE KEY uix_requests_uuid (uuid),
    KEY idx_requests_deleted_at (deleted_at)
)
"#;

/// Stores requests in the `requests` table of a MySQL database.
///
/// A single connection is kept open: the consumer is the only writer.
#[derive(Debug, Clone)]
pub struct MySqlRequestRepository {
    pool: MySqlPool,
}

impl MySqlRequestRepository {
    /// Wrap an existing pool. The schema is assumed to be in place.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Prepare the database and connect to it.
    ///
    /// This will:
    /// 1. Create the database if it doesn't exist
    /// 2. Create the `requests` table if it doesn't exist
    /// 3. Open the connection used to insert requests
    #[tracing::instrument(name = "mysql_connect", skip(settings), fields(host = %settings.host, database = %settings.database_name))]
    pub async fn connect(settings: &MySqlSettings) -> Result<Self, StorageError> {
        create_database_if_missing(settings).await?;

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(settings.database_options())
            .await
            .map_err(StorageError::Connect)?;
        debug!("Database connection established");

        let repository = Self::new(pool);
        repository.migrate().await?;
        Ok(repository)
    }

    /// Create the `requests` table if it doesn't exist.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_REQUESTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Migrate)?;
        info!("`requests` table is ready");
        Ok(())
    }

    /// Close every connection of the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn create_database_if_missing(settings: &MySqlSettings) -> Result<(), StorageError> {
    let name = &settings.database_name;
    // The name is interpolated in the statement, keep it to plain identifiers.
    if !is_plain_identifier(name) {
        return Err(StorageError::InvalidDatabaseName(name.clone()));
    }

    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect_with(settings.instance_options())
        .await
        .map_err(StorageError::Connect)?;

    let result = sqlx::query(&format!("CREATE DATABASE IF NOT EXISTS `{name}`"))
        .execute(&pool)
        .await;
    pool.close().await;

    result.map_err(|source| StorageError::CreateDatabase {
        name: name.clone(),
        source,
    })?;
    Ok(())
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[async_trait]
impl RequestRepository for MySqlRequestRepository {
    #[tracing::instrument(name = "insert_request", skip_all, fields(uuid = %request.uuid))]
    async fn insert(&self, request: &Request) -> Result<StoredRequest, StorageError> {
        let result = sqlx::query("INSERT INTO requests (uuid, hostname) VALUES (?, ?)")
            .bind(&request.uuid)
            .bind(&request.hostname)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(StoredRequest {
                id: done.last_insert_id() as u32,
                uuid: request.uuid.clone(),
                hostname: request.hostname.clone(),
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StorageError::Duplicate(request.uuid.clone()))
            }
            Err(source) => Err(StorageError::Insert {
                uuid: request.uuid.clone(),
                source,
            }),
        }
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<StoredRequest>, StorageError> {
        sqlx::query_as::<_, StoredRequest>(
            "SELECT id, uuid, hostname FROM requests WHERE uuid = ? AND deleted_at IS NULL",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Query)
    }
}
