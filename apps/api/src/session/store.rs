//! JSON-file session persistence.
//!
//! One pretty-printed file per session under the data directory, rewritten
//! after every committed mutation so an interview survives a crash or
//! restart. No cross-session transactionality.

use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::models::session::Session;

#[derive(Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.data_dir.join(format!("{id}.json"))
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(session)
            .with_context(|| format!("Failed to serialize session {}", session.id))?;
        tokio::fs::write(self.path(session.id), bytes)
            .await
            .with_context(|| format!("Failed to persist session {}", session.id))?;
        Ok(())
    }

    /// Loads a session from disk; `None` when no file exists.
    pub async fn load(&self, id: Uuid) -> Result<Option<Session>> {
        let path = self.path(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let session = serde_json::from_str(&contents)
                    .with_context(|| format!("Corrupt session file {}", path.display()))?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::session::{Level, Phase};

    fn sample_session() -> Session {
        let mut targets = HashMap::new();
        targets.insert("sql".to_string(), Level::Intermediate);
        let mut s = Session::new(
            "Ada".to_string(),
            "Backend Engineer".to_string(),
            vec!["sql".to_string()],
            targets,
            vec![],
        );
        s.phase = Phase::Skills;
        s.record_answer(
            Phase::Introduction,
            "intro q".into(),
            "intro a".into(),
            61.0,
            Some("ok".into()),
            None,
            None,
        );
        s
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let session = sample_session();

        store.save(&session).await.unwrap();
        let loaded = store.load(session.id).await.unwrap().unwrap();

        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.phase, Phase::Skills);
        assert_eq!(loaded.transcript.len(), 1);
        assert_eq!(loaded.target_level("SQL"), Level::Intermediate);
    }

    #[tokio::test]
    async fn test_load_missing_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let mut session = sample_session();
        store.save(&session).await.unwrap();

        session.phase = Phase::Done;
        store.save(&session).await.unwrap();

        let loaded = store.load(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.phase, Phase::Done);
    }
}
