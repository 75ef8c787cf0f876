/// Failures of the storage backend.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("`{0}` is not a valid database name")]
    InvalidDatabaseName(String),
    #[error("Failed to open instance connection")]
    Connect(#[source] sqlx::Error),
    #[error("Failed to create database `{name}`")]
    CreateDatabase {
        name: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to migrate the `requests` table")]
    Migrate(#[source] sqlx::Error),
    #[error("A request with uuid `{0}` has already been stored")]
    Duplicate(String),
    #[error("Failed to insert request `{uuid}`")]
    Insert {
        uuid: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to query requests")]
    Query(#[source] sqlx::Error),
}

impl StorageError {
    /// `true` if the failure is caused by the data itself, and would happen again on retry.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Duplicate(_) | Self::InvalidDatabaseName(_))
    }
}
