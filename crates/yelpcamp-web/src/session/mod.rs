//! Server-side sessions.
//!
//! A [`Session`] handle is inserted into request extensions by the session
//! stage. Handlers mutate it through the handle; when the response comes back
//! the stage commits it through the [`SessionManager`]: new, regenerated and
//! modified sessions are saved (and get a cookie), untouched ones are only
//! touched, subject to the debounce interval.

pub mod cookie;
pub mod flash;
pub mod manager;
pub mod store;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::flash::{FlashKind, FlashMessages, FlashQueue};
pub use self::manager::{SessionConfig, SessionManager};
pub use self::store::{MemorySessionStore, SessionStore};

/// Session payload persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub flash: FlashQueue,
    #[serde(default)]
    pub return_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
    /// Time of the last full save or touch write.
    pub last_modified: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(now: DateTime<Utc>, max_age: Duration) -> Self {
        Self {
            data: SessionData::default(),
            expires_at: now + max_age,
            last_modified: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Never persisted under the current id.
    Fresh,
    Loaded,
}

struct SessionInner {
    id: String,
    record: SessionRecord,
    origin: Origin,
    modified: bool,
    superseded: Option<String>,
}

/// What the session stage must do once the handler has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    Save {
        id: String,
        record: SessionRecord,
        /// Previous identifier to destroy after a regeneration.
        superseded: Option<String>,
    },
    Touch {
        id: String,
        record: SessionRecord,
    },
}

/// Shared handle to the current request's session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    pub fn fresh(record: SessionRecord) -> Self {
        Self::with(cookie::generate_id(), record, Origin::Fresh)
    }

    pub fn loaded(id: String, record: SessionRecord) -> Self {
        Self::with(id, record, Origin::Loaded)
    }

    fn with(id: String, record: SessionRecord, origin: Origin) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                id,
                record,
                origin,
                modified: false,
                superseded: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn is_fresh(&self) -> bool {
        self.lock().origin == Origin::Fresh
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.lock().record.data.user_id
    }

    pub fn set_user(&self, user_id: Option<Uuid>) {
        let mut inner = self.lock();
        if inner.record.data.user_id != user_id {
            inner.record.data.user_id = user_id;
            inner.modified = true;
        }
    }

    /// Replaces the identifier and clears the payload. The old identifier is
    /// destroyed on commit.
    pub fn regenerate(&self) {
        let mut inner = self.lock();
        if inner.origin == Origin::Loaded {
            inner.superseded = Some(inner.id.clone());
        }
        inner.id = cookie::generate_id();
        inner.origin = Origin::Fresh;
        inner.record.data = SessionData::default();
        inner.modified = true;
    }

    pub fn flash(&self, kind: FlashKind, message: impl Into<String>) {
        let mut inner = self.lock();
        inner.record.data.flash.enqueue(kind, message);
        inner.modified = true;
    }

    /// Drains every pending flash message.
    pub fn take_flash(&self) -> FlashMessages {
        let mut inner = self.lock();
        if inner.record.data.flash.is_empty() {
            return FlashMessages::default();
        }
        inner.modified = true;
        FlashMessages::drain_from(&mut inner.record.data.flash)
    }

    pub fn set_return_to(&self, path: String) {
        let mut inner = self.lock();
        inner.record.data.return_to = Some(path);
        inner.modified = true;
    }

    pub fn take_return_to(&self) -> Option<String> {
        let mut inner = self.lock();
        let path = inner.record.data.return_to.take();
        if path.is_some() {
            inner.modified = true;
        }
        path
    }

    pub fn commit(&self) -> Commit {
        let inner = self.lock();
        if inner.origin == Origin::Fresh || inner.modified {
            Commit::Save {
                id: inner.id.clone(),
                record: inner.record.clone(),
                superseded: inner.superseded.clone(),
            }
        } else {
            Commit::Touch {
                id: inner.id.clone(),
                record: inner.record.clone(),
            }
        }
    }
}
