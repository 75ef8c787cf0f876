//! Persistence of [`Request`]s.
//!
//! [`RequestRepository`] is the seam between message handling and the database;
//! [`MySqlRequestRepository`] is the implementation used in production,
//! [`InMemoryRequestRepository`] keeps everything in memory.
use async_trait::async_trait;

use crate::requests::Request;

pub mod configuration;
mod error;
mod memory;
mod mysql;

pub use error::StorageError;
pub use memory::InMemoryRequestRepository;
pub use mysql::MySqlRequestRepository;

/// A [`Request`] as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredRequest {
    /// Auto-incremented primary key.
    pub id: u32,
    pub uuid: String,
    pub hostname: String,
}

/// Where decoded requests end up.
///
/// Implementations must enforce uniqueness of [`Request::uuid`]: inserting a second request
/// with an existing `uuid` fails with [`StorageError::Duplicate`] and leaves the stored one
/// untouched.
#[async_trait]
pub trait RequestRepository: Send + Sync + 'static {
    /// Store a new request.
    async fn insert(&self, request: &Request) -> Result<StoredRequest, StorageError>;

    /// Look up a stored request by its `uuid`.
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<StoredRequest>, StorageError>;
}
