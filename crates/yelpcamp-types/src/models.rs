use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The credential hash never leaves the db crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Author reference resolved at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub filename: String,
}

impl Image {
    /// Builds an image reference, using the last path segment as the filename.
    pub fn from_url(url: &str) -> Self {
        let trimmed = url.trim();
        let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
        let filename = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("image")
            .to_string();
        Self {
            url: trimmed.to_string(),
            filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campground {
    pub id: Uuid,
    pub author: Author,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub location: String,
    pub images: Vec<Image>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campground {
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author.id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub campground_id: Uuid,
    pub author: Author,
    pub rating: u8,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Campground detail page payload: the campground plus its reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampgroundDetail {
    pub campground: Campground,
    pub reviews: Vec<Review>,
}
