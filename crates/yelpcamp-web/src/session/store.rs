use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use yelpcamp_db::Database;
use yelpcamp_db::models::{SessionRow, parse_timestamp};

use super::{SessionData, SessionRecord};

/// Persistence for session records. Implementations are blocking; the
/// manager calls them from `spawn_blocking`.
pub trait SessionStore: Send + Sync + 'static {
    fn load(&self, id: &str) -> Result<Option<SessionRecord>>;
    fn save(&self, id: &str, record: &SessionRecord) -> Result<()>;
    /// Refreshes expiry without rewriting the payload.
    fn touch(&self, id: &str, expires_at: DateTime<Utc>, last_modified: DateTime<Utc>) -> Result<()>;
    fn destroy(&self, id: &str) -> Result<()>;
}

/// Fixed-width RFC 3339 so stored expiries compare correctly as text.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl SessionStore for Database {
    fn load(&self, id: &str) -> Result<Option<SessionRecord>> {
        let Some(row) = self.get_session(id)? else {
            return Ok(None);
        };
        let data: SessionData = serde_json::from_str(&row.data)
            .with_context(|| format!("decoding session '{}'", row.id))?;
        Ok(Some(SessionRecord {
            data,
            expires_at: parse_timestamp(&row.expires_at),
            last_modified: parse_timestamp(&row.last_modified),
        }))
    }

    fn save(&self, id: &str, record: &SessionRecord) -> Result<()> {
        self.upsert_session(&SessionRow {
            id: id.to_string(),
            data: serde_json::to_string(&record.data)?,
            expires_at: format_timestamp(record.expires_at),
            last_modified: format_timestamp(record.last_modified),
        })
    }

    fn touch(&self, id: &str, expires_at: DateTime<Utc>, last_modified: DateTime<Utc>) -> Result<()> {
        self.touch_session(id, &format_timestamp(expires_at), &format_timestamp(last_modified))
    }

    fn destroy(&self, id: &str) -> Result<()> {
        self.delete_session(id)
    }
}

/// In-process store that counts writes; it can also be switched into a
/// failing mode to exercise the degraded path.
#[derive(Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<String, SessionRecord>>,
    saves: AtomicUsize,
    touches: AtomicUsize,
    failing: AtomicBool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    /// Total underlying writes (saves plus touches).
    pub fn writes(&self) -> usize {
        self.saves() + self.touches()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("session store unavailable");
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionRecord>> {
        self.check()?;
        Ok(self.get(id))
    }

    fn save(&self, id: &str, record: &SessionRecord) -> Result<()> {
        self.check()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    fn touch(&self, id: &str, expires_at: DateTime<Utc>, last_modified: DateTime<Utc>) -> Result<()> {
        self.check()?;
        self.touches.fetch_add(1, Ordering::SeqCst);
        if let Some(record) = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(id)
        {
            record.expires_at = expires_at;
            record.last_modified = last_modified;
        }
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<()> {
        self.check()?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashKind;
    use chrono::Duration;

    #[test]
    fn sqlite_store_round_trips_payload() {
        let db = Database::open_in_memory().unwrap();
        let now = "2026-03-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mut record = SessionRecord::new(now, Duration::days(7));
        record.data.user_id = Some(uuid::Uuid::new_v4());
        record.data.flash.enqueue(FlashKind::Success, "Welcome back!");

        db.save("s1", &record).unwrap();
        assert_eq!(db.load("s1").unwrap(), Some(record.clone()));

        let later = now + Duration::days(2);
        db.touch("s1", later + Duration::days(7), later).unwrap();
        let touched = db.load("s1").unwrap().unwrap();
        assert_eq!(touched.data, record.data);
        assert_eq!(touched.last_modified, later);

        db.destroy("s1").unwrap();
        assert_eq!(db.load("s1").unwrap(), None);
    }

    #[test]
    fn failing_memory_store_reports_errors() {
        let store = MemorySessionStore::new();
        store.set_failing(true);
        assert!(store.load("x").is_err());
        store.set_failing(false);
        assert!(store.load("x").unwrap().is_none());
    }
}
