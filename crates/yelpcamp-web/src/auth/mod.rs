pub mod state;

use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use yelpcamp_db::Database;
use yelpcamp_types::models::User;

use crate::session::{FlashKind, Session};

pub use self::state::{AuthEffect, AuthEvent, AuthState, InvalidTransition, LOGIN_FAILED, Transition};

/// Username/password strategy over the user table. Blocking: Argon2 is
/// CPU-bound, call it from `spawn_blocking`.
pub struct Authenticator {
    argon2: Argon2<'static>,
    /// Verified against when the username is unknown so that both failure
    /// paths cost one Argon2 verification.
    dummy_hash: String,
}

impl Authenticator {
    pub fn new() -> Result<Self> {
        Self::with_params(Params::default())
    }

    pub fn with_params(params: Params) -> Result<Self> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, &crate::session::cookie::generate_id())?;
        Ok(Self { argon2, dummy_hash })
    }

    /// Argon2id PHC string with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash_with(&self.argon2, password)
    }

    /// `stored` is the user's PHC hash, or `None` for an unknown user, which
    /// always fails after the same amount of work.
    pub fn verify(&self, password: &str, stored: Option<&str>) -> Result<bool> {
        let hash = stored.unwrap_or(&self.dummy_hash);
        let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash: {}", e))?;
        let matched = self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        Ok(stored.is_some() && matched)
    }

    /// Looks the user up and checks the credential. Unknown user and wrong
    /// password both yield `Ok(None)`.
    pub fn authenticate(&self, db: &Database, username: &str, password: &str) -> Result<Option<User>> {
        let row = db.get_user_by_username(username)?;
        let verified = self.verify(password, row.as_ref().map(|r| r.password.as_str()))?;
        Ok(row.filter(|_| verified).map(|r| r.into_model()))
    }
}

/// Carries out a transition's effect on the request's session.
pub fn perform(session: &Session, effect: &AuthEffect) {
    match effect {
        AuthEffect::EstablishSession { user_id } => {
            session.regenerate();
            session.set_user(Some(*user_id));
        }
        AuthEffect::EndSession => {
            session.set_user(None);
            session.regenerate();
        }
        AuthEffect::ClearIdentity => session.set_user(None),
        AuthEffect::FlashError(message) => session.flash(FlashKind::Error, *message),
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}
