use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::requests::Request;
use crate::storage::{RequestRepository, StorageError, StoredRequest};

/// Keeps requests in memory, with the same uniqueness rule as the `requests` table.
///
/// Nothing survives the process: use it to run handlers without a database.
#[derive(Debug, Default)]
pub struct InMemoryRequestRepository {
    rows: Mutex<HashMap<String, StoredRequest>>,
}

impl InMemoryRequestRepository {
    /// Number of stored requests.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl RequestRepository for InMemoryRequestRepository {
    async fn insert(&self, request: &Request) -> Result<StoredRequest, StorageError> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&request.uuid) {
            return Err(StorageError::Duplicate(request.uuid.clone()));
        }
        let stored = StoredRequest {
            id: rows.len() as u32 + 1,
            uuid: request.uuid.clone(),
            hostname: request.hostname.clone(),
        };
        rows.insert(request.uuid.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<StoredRequest>, StorageError> {
        Ok(self.rows.lock().await.get(uuid).cloned())
    }
}
