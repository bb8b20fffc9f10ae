//! Database row types. These map directly to SQLite rows.
//! Distinct from yelpcamp-types models to keep the DB layer independent;
//! `into_model` converts at the boundary.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;
use yelpcamp_types::models::{Author, Campground, Image, Review, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password: String,
    pub created_at: String,
}

pub struct CampgroundRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub location: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ImageRow {
    pub campground_id: String,
    pub url: String,
    pub filename: String,
}

pub struct ReviewRow {
    pub id: String,
    pub campground_id: String,
    pub author_id: String,
    pub author_username: String,
    pub rating: i64,
    pub body: String,
    pub created_at: String,
}

pub struct SessionRow {
    pub id: String,
    pub data: String,
    pub expires_at: String,
    pub last_modified: String,
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

/// Accepts RFC 3339 and SQLite's `datetime('now')` format
/// ("YYYY-MM-DD HH:MM:SS", implicitly UTC).
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

impl UserRow {
    pub fn into_model(self) -> User {
        User {
            id: parse_id(&self.id, "user id"),
            username: self.username,
            email: self.email,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

impl CampgroundRow {
    pub fn into_model(self, images: Vec<Image>) -> Campground {
        Campground {
            id: parse_id(&self.id, "campground id"),
            author: Author {
                id: parse_id(&self.author_id, "author_id"),
                username: self.author_username,
            },
            title: self.title,
            price: self.price,
            description: self.description,
            location: self.location,
            images,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}

impl ImageRow {
    pub fn into_model(self) -> Image {
        Image {
            url: self.url,
            filename: self.filename,
        }
    }
}

impl ReviewRow {
    pub fn into_model(self) -> Review {
        let rating = u8::try_from(self.rating).unwrap_or_else(|_| {
            warn!("Corrupt rating {} on review '{}'", self.rating, self.id);
            1
        });
        Review {
            id: parse_id(&self.id, "review id"),
            campground_id: parse_id(&self.campground_id, "campground_id"),
            author: Author {
                id: parse_id(&self.author_id, "author_id"),
                username: self.author_username,
            },
            rating,
            body: self.body,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}
