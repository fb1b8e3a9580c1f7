//! Concurrent session registry.
//!
//! Sessions are fully independent units of sequential state: the map itself
//! is behind an `RwLock` for safe concurrent insertion/lookup, and each
//! session sits behind its own `Mutex` so at most one answer per session is
//! ever in flight. A lookup miss falls back to the on-disk store, so a
//! restarted server resumes in-flight interviews transparently.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::session::Session;
use crate::session::store::SessionStore;

pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    store: SessionStore,
}

impl SessionRegistry {
    pub fn new(store: SessionStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            store,
        }
    }

    /// Registers a new session and writes its first snapshot.
    pub async fn insert(&self, session: Session) -> Result<SharedSession> {
        self.store.save(&session).await?;
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.inner.write().await.insert(id, shared.clone());
        Ok(shared)
    }

    /// Looks a session up, falling back to disk on a registry miss.
    pub async fn get(&self, id: Uuid) -> Result<Option<SharedSession>> {
        if let Some(shared) = self.inner.read().await.get(&id) {
            return Ok(Some(shared.clone()));
        }
        let Some(session) = self.store.load(id).await? else {
            return Ok(None);
        };
        let mut map = self.inner.write().await;
        // Another task may have revived it while we read from disk.
        let shared = map
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .clone();
        Ok(Some(shared))
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample_session() -> Session {
        Session::new(
            "Ada".to_string(),
            "Backend Engineer".to_string(),
            vec![],
            HashMap::new(),
            vec![],
        )
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new(SessionStore::new(dir.path()).unwrap());
        let session = sample_session();
        let id = session.id;

        registry.insert(session).await.unwrap();
        let shared = registry.get(id).await.unwrap().unwrap();
        assert_eq!(shared.lock().await.id, id);
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new(SessionStore::new(dir.path()).unwrap());
        assert!(registry.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registry_miss_revives_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let session = sample_session();
        let id = session.id;
        store.save(&session).await.unwrap();

        // Fresh registry simulating a restarted server
        let registry = SessionRegistry::new(store);
        let shared = registry.get(id).await.unwrap().unwrap();
        assert_eq!(shared.lock().await.candidate_name, "Ada");
    }
}
