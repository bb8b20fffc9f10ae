use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::cookie::SessionKey;
use super::store::SessionStore;
use super::{Commit, Session, SessionRecord};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Cookie lifetime and store expiry.
    pub max_age: Duration,
    /// Minimum interval between touch writes for an unchanged session.
    pub touch_after: Duration,
    /// Adds the `Secure` cookie attribute.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            max_age: Duration::days(7),
            touch_after: Duration::hours(24),
            secure: false,
        }
    }
}

/// Applies expiry and touch-debounce policy on top of a [`SessionStore`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    key: SessionKey,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, key: SessionKey, config: SessionConfig) -> Self {
        Self { store, key, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// A new, not yet persisted session.
    pub fn start(&self) -> Session {
        Session::fresh(SessionRecord::new(Utc::now(), self.config.max_age))
    }

    /// Session identifier from a correctly signed cookie, if any.
    pub fn read_cookie(&self, headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        let value = jar.get(&self.config.cookie_name)?.value().to_string();
        let id = self.key.unsign(&value);
        if id.is_none() {
            warn!("Ignoring session cookie with invalid signature");
        }
        id
    }

    pub fn session_cookie(&self, id: &str) -> Cookie<'static> {
        let max_age = time::Duration::seconds(self.config.max_age.num_seconds());
        Cookie::build((self.config.cookie_name.clone(), self.key.sign(id)))
            .path("/")
            .http_only(true)
            .secure(self.config.secure)
            .max_age(max_age)
            .expires(time::OffsetDateTime::now_utc() + max_age)
            .build()
    }

    /// Loads a live record. Expired records are destroyed and reported absent.
    pub async fn load(&self, id: &str) -> Result<Option<SessionRecord>> {
        let key = id.to_string();
        let record = self.blocking(move |store| store.load(&key)).await?;
        match record {
            Some(record) if record.is_expired(Utc::now()) => {
                debug!("Session expired at {}", record.expires_at);
                self.destroy(id).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Full write; stamps `last_modified` and pushes expiry out by `max_age`.
    pub async fn save(&self, id: &str, mut record: SessionRecord) -> Result<()> {
        let now = Utc::now();
        record.last_modified = now;
        record.expires_at = now + self.config.max_age;
        let key = id.to_string();
        self.blocking(move |store| store.save(&key, &record)).await
    }

    /// Refreshes expiry, skipping the write while within `touch_after` of the
    /// last write. Returns whether a write happened.
    pub async fn touch(&self, id: &str, record: &SessionRecord) -> Result<bool> {
        self.touch_at(id, record, Utc::now()).await
    }

    pub async fn touch_at(&self, id: &str, record: &SessionRecord, now: DateTime<Utc>) -> Result<bool> {
        if !self.touch_due(record, now) {
            return Ok(false);
        }
        let key = id.to_string();
        let expires_at = now + self.config.max_age;
        self.blocking(move |store| store.touch(&key, expires_at, now)).await?;
        Ok(true)
    }

    pub fn touch_due(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        now - record.last_modified >= self.config.touch_after
    }

    pub async fn destroy(&self, id: &str) -> Result<()> {
        let key = id.to_string();
        self.blocking(move |store| store.destroy(&key)).await
    }

    /// Persists the outcome of a request. Returns the identifier that needs a
    /// fresh cookie, if any.
    pub async fn commit(&self, commit: Commit) -> Result<Option<String>> {
        match commit {
            Commit::Save {
                id,
                record,
                superseded,
            } => {
                if let Some(old) = superseded {
                    self.destroy(&old).await?;
                }
                self.save(&id, record).await?;
                Ok(Some(id))
            }
            Commit::Touch { id, record } => {
                self.touch(&id, &record).await?;
                Ok(None)
            }
        }
    }

    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn SessionStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .context("session store task failed")?
    }
}
