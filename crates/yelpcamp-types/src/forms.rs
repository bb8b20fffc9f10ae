//! Form payloads submitted by the HTML views.
//!
//! Every field is a plain `String` with `#[serde(default)]` so that a form
//! with missing fields still deserializes: the submitted values are needed
//! to re-render the form, and validation reports what is missing.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Campground, Image};

/// One message per failed rule, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    fn check(messages: Vec<String>) -> Result<(), Self> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Self(messages))
        }
    }
}

fn required(messages: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        messages.push(format!("\"{field}\" is required"));
    }
}

// -- Users --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut messages = Vec::new();
        let username = self.username.trim();
        let email = self.email.trim();

        if username.is_empty() {
            messages.push("\"username\" is required".to_string());
        } else if !(3..=32).contains(&username.chars().count()) {
            messages.push("\"username\" must be between 3 and 32 characters".to_string());
        }
        if email.is_empty() {
            messages.push("\"email\" is required".to_string());
        } else if !email.contains('@') {
            messages.push("\"email\" must be a valid email".to_string());
        }
        if self.password.chars().count() < 8 {
            messages.push("\"password\" must be at least 8 characters long".to_string());
        }

        ValidationErrors::check(messages)?;
        Ok(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Login input with the username trimmed the way registration stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, ValidationErrors> {
        let mut messages = Vec::new();
        required(&mut messages, "username", &self.username);
        if self.password.is_empty() {
            messages.push("\"password\" is required".to_string());
        }
        ValidationErrors::check(messages)?;
        Ok(Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

// -- Campgrounds --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CampgroundForm {
    pub title: String,
    pub location: String,
    pub price: String,
    pub description: String,
    /// One image URL per line.
    pub images: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampgroundInput {
    pub title: String,
    pub location: String,
    pub price: f64,
    pub description: String,
    pub images: Vec<Image>,
}

impl CampgroundForm {
    pub fn validate(&self) -> Result<CampgroundInput, ValidationErrors> {
        let mut messages = Vec::new();
        required(&mut messages, "title", &self.title);
        required(&mut messages, "location", &self.location);

        let price = match self.price.trim() {
            "" => {
                messages.push("\"price\" is required".to_string());
                None
            }
            raw => match raw.parse::<f64>() {
                Ok(p) if !p.is_finite() => {
                    messages.push("\"price\" must be a number".to_string());
                    None
                }
                Ok(p) if p < 0.0 => {
                    messages.push("\"price\" must be greater than or equal to 0".to_string());
                    None
                }
                Ok(p) => Some(p),
                Err(_) => {
                    messages.push("\"price\" must be a number".to_string());
                    None
                }
            },
        };

        required(&mut messages, "description", &self.description);

        let mut images = Vec::new();
        for line in self.images.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.starts_with("https://") || line.starts_with("http://") {
                images.push(Image::from_url(line));
            } else {
                messages.push(format!("\"images\" must contain only http(s) URLs, got '{line}'"));
            }
        }

        ValidationErrors::check(messages)?;
        Ok(CampgroundInput {
            title: self.title.trim().to_string(),
            location: self.location.trim().to_string(),
            price: price.unwrap_or_default(),
            description: self.description.trim().to_string(),
            images,
        })
    }
}

impl From<&Campground> for CampgroundForm {
    /// Prefills the edit form.
    fn from(c: &Campground) -> Self {
        Self {
            title: c.title.clone(),
            location: c.location.clone(),
            price: c.price.to_string(),
            description: c.description.clone(),
            images: c
                .images
                .iter()
                .map(|i| i.url.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// -- Reviews --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub rating: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub rating: u8,
    pub body: String,
}

impl ReviewForm {
    pub fn validate(&self) -> Result<ReviewInput, ValidationErrors> {
        let mut messages = Vec::new();

        let rating = match self.rating.trim().parse::<u8>() {
            Ok(r) if (1..=5).contains(&r) => Some(r),
            Ok(_) => {
                messages.push("\"rating\" must be between 1 and 5".to_string());
                None
            }
            Err(_) if self.rating.trim().is_empty() => {
                messages.push("\"rating\" is required".to_string());
                None
            }
            Err(_) => {
                messages.push("\"rating\" must be a number".to_string());
                None
            }
        };
        required(&mut messages, "body", &self.body);

        ValidationErrors::check(messages)?;
        Ok(ReviewInput {
            rating: rating.unwrap_or(1),
            body: self.body.trim().to_string(),
        })
    }
}
