use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AuthError;
use crate::registry::SessionRegistry;

/// In-memory session registry. Used when no database is configured and as
/// the backend for the HTTP test suite. Removal under the write lock is
/// atomic, which is all the rotation protocol needs for its
/// compare-and-delete exclusivity.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Uuid>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions, for tests and diagnostics.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRegistry for MemoryRegistry {
    async fn create(&self, guid: Uuid) -> Result<Uuid, AuthError> {
        let jti = Uuid::new_v4();
        self.sessions.write().await.insert(jti, guid);
        Ok(jti)
    }

    async fn lookup(&self, jti: Uuid) -> Result<Option<Uuid>, AuthError> {
        Ok(self.sessions.read().await.get(&jti).copied())
    }

    async fn delete(&self, jti: Uuid) -> Result<bool, AuthError> {
        Ok(self.sessions.write().await.remove(&jti).is_some())
    }

    async fn delete_all(&self, guid: Uuid) -> Result<u64, AuthError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, owner| *owner != guid);
        Ok((before - sessions.len()) as u64)
    }
}
