//! Game session lifecycle.
//!
//! A session is created against an approved word, accumulates guesses while
//! active, and is completed exactly once. Completion is the only transition
//! into the terminal state and is irreversible. Check-then-mutate sequences
//! run under the per-session lock so racing writers serialize.

use crate::directory::WordDirectory;
use crate::errors::{StorageError, WordmintError, WordmintResult};
use crate::locks::LockRegistry;
use crate::storage::Storage;
use crate::types::{
    is_valid_word_text, GameSession, Guess, Page, SessionLifecycle, SessionMetadata,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const SESSION_PREFIX: &str = "game:session:";
const SESSION_INDEX_PREFIX: &str = "game:index:";

const SCAN_BATCH: usize = 256;

fn session_key(publisher_id: Uuid, session_id: Uuid) -> Vec<u8> {
    format!("{}{}:{}", SESSION_PREFIX, publisher_id, session_id).into_bytes()
}

/// Newest-first index: inverted creation millis as the sort key.
fn session_index_key(publisher_id: Uuid, created_millis: u64, session_id: Uuid) -> Vec<u8> {
    let inv = u64::MAX - created_millis;
    format!("{}{}:{:016x}:{}", SESSION_INDEX_PREFIX, publisher_id, inv, session_id).into_bytes()
}

fn session_index_prefix(publisher_id: Uuid) -> Vec<u8> {
    format!("{}{}:", SESSION_INDEX_PREFIX, publisher_id).into_bytes()
}

pub struct SessionManager {
    storage: Arc<Storage>,
    words: Arc<dyn WordDirectory>,
    locks: Arc<LockRegistry>,
}

impl SessionManager {
    pub fn new(
        storage: Arc<Storage>,
        words: Arc<dyn WordDirectory>,
        locks: Arc<LockRegistry>,
    ) -> Self {
        Self { storage, words, locks }
    }

    /// Start a new session. The word must belong to the publisher and be
    /// approved; ownership and existence are not distinguished.
    pub async fn start(
        &self,
        publisher_id: Uuid,
        word_id: Uuid,
        metadata: SessionMetadata,
    ) -> WordmintResult<GameSession> {
        if !self.words.word_is_approved_for(word_id, publisher_id).await? {
            return Err(WordmintError::NotFound(
                "Word not found or not approved".to_string(),
            ));
        }

        let session = GameSession {
            id: Uuid::new_v4(),
            publisher_id,
            word_id,
            guesses: Vec::new(),
            lifecycle: SessionLifecycle::Active,
            metadata,
            created_at: Utc::now(),
        };

        let bytes = encode_session(&session)?;
        let created_millis = session.created_at.timestamp_millis() as u64;
        self.storage.batch_write(&[
            (session_key(publisher_id, session.id), bytes),
            (
                session_index_key(publisher_id, created_millis, session.id),
                Vec::new(),
            ),
        ])?;

        tracing::debug!(session_id = %session.id, publisher_id = %publisher_id, "Session started");
        Ok(session)
    }

    /// Append a guess to a non-terminal session.
    pub async fn submit_guess(
        &self,
        session_id: Uuid,
        publisher_id: Uuid,
        guess_text: &str,
    ) -> WordmintResult<GameSession> {
        if !is_valid_word_text(guess_text) {
            return Err(WordmintError::InvalidInput(
                "Invalid guess format (must be 5 uppercase letters)".to_string(),
            ));
        }

        let _guard = self.locks.acquire(&format!("session:{}", session_id)).await;

        let mut session = self.load_required(publisher_id, session_id)?;
        if session.is_completed() {
            return Err(WordmintError::InvalidState(
                "Game already completed".to_string(),
            ));
        }

        session.guesses.push(Guess {
            guess: guess_text.to_string(),
            timestamp: Utc::now(),
        });
        self.store(&session)?;

        Ok(session)
    }

    /// Complete a session. The only transition into the terminal state; of
    /// two racing completions exactly one succeeds.
    pub async fn complete(
        &self,
        session_id: Uuid,
        publisher_id: Uuid,
        won: bool,
    ) -> WordmintResult<GameSession> {
        let _guard = self.locks.acquire(&format!("session:{}", session_id)).await;

        let mut session = self.load_required(publisher_id, session_id)?;
        if session.is_completed() {
            return Err(WordmintError::InvalidState(
                "Game already completed".to_string(),
            ));
        }

        session.lifecycle = SessionLifecycle::Completed {
            won,
            completed_at: Utc::now(),
        };
        self.store(&session)?;

        tracing::debug!(session_id = %session.id, won, "Session completed");
        Ok(session)
    }

    pub fn get(&self, session_id: Uuid, publisher_id: Uuid) -> WordmintResult<GameSession> {
        self.load_required(publisher_id, session_id)
    }

    /// List sessions newest-created-first. The completed filter is applied
    /// before pagination, matching a filtered-then-paged query.
    pub fn list(
        &self,
        publisher_id: Uuid,
        page: Page,
        completed: Option<bool>,
    ) -> WordmintResult<Vec<GameSession>> {
        let prefix = session_index_prefix(publisher_id);
        let offset = page.offset();

        let mut matched = 0usize;
        let mut out = Vec::new();
        let mut cursor: Option<Vec<u8>> = None;

        loop {
            let rows = self.storage.scan_prefix(&prefix, cursor.as_deref(), SCAN_BATCH);
            if rows.is_empty() {
                break;
            }

            for (key, _) in &rows {
                let Some(session_id) = index_key_session_id(key) else {
                    continue;
                };
                let Some(session) = self.load(publisher_id, session_id)? else {
                    continue;
                };
                if let Some(want_completed) = completed {
                    if session.is_completed() != want_completed {
                        continue;
                    }
                }
                matched += 1;
                if matched > offset && out.len() < page.limit {
                    out.push(session);
                }
            }

            if out.len() >= page.limit || rows.len() < SCAN_BATCH {
                break;
            }
            cursor = rows.last().map(|(key, _)| key.clone());
        }

        Ok(out)
    }

    fn load(&self, publisher_id: Uuid, session_id: Uuid) -> WordmintResult<Option<GameSession>> {
        let Some(bytes) = self.storage.get(&session_key(publisher_id, session_id)) else {
            return Ok(None);
        };
        let session = serde_json::from_slice(&bytes).map_err(|e| {
            WordmintError::Storage(StorageError::CorruptedData(format!(
                "Failed to decode session {}: {}",
                session_id, e
            )))
        })?;
        Ok(Some(session))
    }

    fn load_required(&self, publisher_id: Uuid, session_id: Uuid) -> WordmintResult<GameSession> {
        self.load(publisher_id, session_id)?
            .ok_or_else(|| WordmintError::NotFound("Game not found".to_string()))
    }

    fn store(&self, session: &GameSession) -> WordmintResult<()> {
        let bytes = encode_session(session)?;
        self.storage
            .put(&session_key(session.publisher_id, session.id), &bytes)
    }
}

fn encode_session(session: &GameSession) -> WordmintResult<Vec<u8>> {
    serde_json::to_vec(session).map_err(|e| {
        WordmintError::Storage(StorageError::WriteFailed(format!(
            "Failed to encode session {}: {}",
            session.id, e
        )))
    })
}

fn index_key_session_id(key: &[u8]) -> Option<Uuid> {
    let key = std::str::from_utf8(key).ok()?;
    Uuid::parse_str(key.rsplit(':').next()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{StoredWords, WordRecord, WordStatus};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        sessions: Arc<SessionManager>,
        words: StoredWords,
        publisher_id: Uuid,
        word_id: Uuid,
    }

    fn approved_word(words: &StoredWords, publisher_id: Uuid) -> Uuid {
        let record = WordRecord {
            id: Uuid::new_v4(),
            publisher_id,
            word: "CRANE".to_string(),
            status: WordStatus::Approved { approved_at: Utc::now() },
            created_at: Utc::now(),
        };
        words.put(&record).unwrap();
        record.id
    }

    fn setup() -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(dir.path()).unwrap());
        let words = StoredWords::new(storage.clone());
        let publisher_id = Uuid::new_v4();
        let word_id = approved_word(&words, publisher_id);
        let sessions = Arc::new(SessionManager::new(
            storage,
            Arc::new(words.clone()),
            Arc::new(LockRegistry::new()),
        ));
        Fixture { _dir: dir, sessions, words, publisher_id, word_id }
    }

    #[tokio::test]
    async fn test_start_requires_approved_owned_word() {
        let fx = setup();

        // Unknown word.
        let err = fx
            .sessions
            .start(fx.publisher_id, Uuid::new_v4(), SessionMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WordmintError::NotFound(_)));

        // Word owned by a different publisher: NotFound, not a permission error.
        let other_publisher = Uuid::new_v4();
        let err = fx
            .sessions
            .start(other_publisher, fx.word_id, SessionMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WordmintError::NotFound(_)));

        // Pending word.
        let pending = WordRecord {
            id: Uuid::new_v4(),
            publisher_id: fx.publisher_id,
            word: "SLATE".to_string(),
            status: WordStatus::Pending,
            created_at: Utc::now(),
        };
        fx.words.put(&pending).unwrap();
        let err = fx
            .sessions
            .start(fx.publisher_id, pending.id, SessionMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WordmintError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_start_creates_active_session() {
        let fx = setup();
        let session = fx
            .sessions
            .start(fx.publisher_id, fx.word_id, SessionMetadata::default())
            .await
            .unwrap();

        assert_eq!(session.num_guesses(), 0);
        assert!(!session.is_completed());
        assert_eq!(session.won(), None);
        assert_eq!(session.completed_at(), None);

        let loaded = fx.sessions.get(session.id, fx.publisher_id).unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_guess_format_is_validated() {
        let fx = setup();
        let session = fx
            .sessions
            .start(fx.publisher_id, fx.word_id, SessionMetadata::default())
            .await
            .unwrap();

        for bad in ["crane", "CRAN", "CRANES", "CR4NE", ""] {
            let err = fx
                .sessions
                .submit_guess(session.id, fx.publisher_id, bad)
                .await
                .unwrap_err();
            assert!(matches!(err, WordmintError::InvalidInput(_)), "{:?}", bad);
        }

        let loaded = fx.sessions.get(session.id, fx.publisher_id).unwrap();
        assert_eq!(loaded.num_guesses(), 0);
    }

    #[tokio::test]
    async fn test_valid_guess_on_missing_session_is_not_found() {
        let fx = setup();
        let err = fx
            .sessions
            .submit_guess(Uuid::new_v4(), fx.publisher_id, "ABCDE")
            .await
            .unwrap_err();
        assert!(matches!(err, WordmintError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_guesses_append_in_call_order() {
        let fx = setup();
        let session = fx
            .sessions
            .start(fx.publisher_id, fx.word_id, SessionMetadata::default())
            .await
            .unwrap();

        for (n, guess) in ["AUDIO", "STERN", "CRANE"].iter().enumerate() {
            let updated = fx
                .sessions
                .submit_guess(session.id, fx.publisher_id, guess)
                .await
                .unwrap();
            assert_eq!(updated.num_guesses(), n + 1);
        }

        let loaded = fx.sessions.get(session.id, fx.publisher_id).unwrap();
        let order: Vec<&str> = loaded.guesses.iter().map(|g| g.guess.as_str()).collect();
        assert_eq!(order, vec!["AUDIO", "STERN", "CRANE"]);
    }

    #[tokio::test]
    async fn test_complete_sets_outcome_and_timestamp_together() {
        let fx = setup();
        let session = fx
            .sessions
            .start(fx.publisher_id, fx.word_id, SessionMetadata::default())
            .await
            .unwrap();

        let completed = fx
            .sessions
            .complete(session.id, fx.publisher_id, true)
            .await
            .unwrap();
        assert!(completed.is_completed());
        assert_eq!(completed.won(), Some(true));
        assert!(completed.completed_at().is_some());

        // The same read that reports terminal reports the outcome.
        let loaded = fx.sessions.get(session.id, fx.publisher_id).unwrap();
        assert_eq!(loaded.won().is_some(), loaded.completed_at().is_some());
        assert_eq!(loaded.won(), Some(true));
    }

    #[tokio::test]
    async fn test_terminal_session_rejects_guesses_and_recompletion() {
        let fx = setup();
        let session = fx
            .sessions
            .start(fx.publisher_id, fx.word_id, SessionMetadata::default())
            .await
            .unwrap();
        fx.sessions
            .submit_guess(session.id, fx.publisher_id, "AUDIO")
            .await
            .unwrap();
        fx.sessions
            .complete(session.id, fx.publisher_id, false)
            .await
            .unwrap();

        let err = fx
            .sessions
            .submit_guess(session.id, fx.publisher_id, "CRANE")
            .await
            .unwrap_err();
        assert!(matches!(err, WordmintError::InvalidState(_)));

        let err = fx
            .sessions
            .complete(session.id, fx.publisher_id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, WordmintError::InvalidState(_)));

        // The failed guess never mutated the sequence.
        let loaded = fx.sessions.get(session.id, fx.publisher_id).unwrap();
        assert_eq!(loaded.num_guesses(), 1);
        assert_eq!(loaded.won(), Some(false));
    }

    #[tokio::test]
    async fn test_racing_completions_admit_exactly_one() {
        let fx = setup();
        let session = fx
            .sessions
            .start(fx.publisher_id, fx.word_id, SessionMetadata::default())
            .await
            .unwrap();

        let a = {
            let sessions = fx.sessions.clone();
            let publisher_id = fx.publisher_id;
            let id = session.id;
            tokio::spawn(async move { sessions.complete(id, publisher_id, true).await })
        };
        let b = {
            let sessions = fx.sessions.clone();
            let publisher_id = fx.publisher_id;
            let id = session.id;
            tokio::spawn(async move { sessions.complete(id, publisher_id, false).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(WordmintError::InvalidState(_)))));
    }

    #[tokio::test]
    async fn test_list_orders_paginates_and_filters() {
        let fx = setup();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let session = fx
                .sessions
                .start(fx.publisher_id, fx.word_id, SessionMetadata::default())
                .await
                .unwrap();
            ids.push(session.id);
            // Distinct creation millis keep the newest-first index stable.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        fx.sessions
            .complete(ids[1], fx.publisher_id, true)
            .await
            .unwrap();

        let all = fx
            .sessions
            .list(fx.publisher_id, Page::default(), None)
            .unwrap();
        let listed: Vec<Uuid> = all.iter().map(|s| s.id).collect();
        assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

        let completed = fx
            .sessions
            .list(fx.publisher_id, Page::default(), Some(true))
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, ids[1]);
        assert_eq!(completed[0].won(), Some(true));

        let open = fx
            .sessions
            .list(fx.publisher_id, Page::default(), Some(false))
            .unwrap();
        assert_eq!(open.len(), 2);

        let second_page = fx
            .sessions
            .list(fx.publisher_id, Page { page: 2, limit: 2 }, None)
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id, ids[0]);

        // Another publisher sees nothing.
        let other = fx
            .sessions
            .list(Uuid::new_v4(), Page::default(), None)
            .unwrap();
        assert!(other.is_empty());
    }
}
