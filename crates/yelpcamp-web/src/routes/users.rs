use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{debug, info};
use uuid::Uuid;
use yelpcamp_db::{Database, is_constraint_violation};
use yelpcamp_types::forms::{Credentials, LoginForm, NewUser, RegisterForm};

use super::flash_errors;
use crate::auth::{self, AuthEvent, AuthState, Transition};
use crate::error::AppError;
use crate::middleware::Locals;
use crate::session::FlashKind;
use crate::state::{AppState, run_blocking};
use crate::views;

const DUPLICATE_USER: &str = "A user with the given username or email is already registered";
const DEFAULT_LANDING: &str = "/campgrounds";

/// Read from the session, so an identity that failed to resolve this
/// request is still the one logout ends.
fn current_state(locals: &Locals) -> AuthState {
    AuthState::from_session(locals.session.user_id())
}

fn apply(locals: &Locals, transition: &Transition) {
    if let Some(effect) = &transition.effect {
        auth::perform(&locals.session, effect);
    }
}

/// Only same-site absolute paths are followed after login.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

pub async fn register_form(locals: Locals) -> Html<String> {
    views::users::register(&locals, &RegisterForm::default())
}

pub async fn register(
    State(state): State<AppState>,
    locals: Locals,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let new_user = match form.validate() {
        Ok(new_user) => new_user,
        Err(errors) => return Ok(rerender_register(&locals, &form, &errors.0)),
    };

    let authenticating = current_state(&locals)
        .apply(AuthEvent::Submit)
        .map_err(anyhow::Error::from)?
        .next;

    let created = run_blocking(&state, move |s| {
        if s.db.get_user_by_username(&new_user.username)?.is_some()
            || s.db.get_user_by_email(&new_user.email)?.is_some()
        {
            return Ok(None);
        }
        let hash = s.auth.hash_password(&new_user.password)?;
        insert_user(&s.db, &new_user, &hash)
    })
    .await?;

    let Some(user_id) = created else {
        debug!("Registration rejected for duplicate user {}", form.username.trim());
        return Ok(rerender_register(&locals, &form, &[DUPLICATE_USER.to_string()]));
    };

    let transition = authenticating
        .apply(AuthEvent::CredentialsVerified { user_id })
        .map_err(anyhow::Error::from)?;
    apply(&locals, &transition);

    info!("Registered user {}", user_id);
    locals.session.flash(FlashKind::Success, "Welcome to Yelp Camp!");
    Ok(Redirect::to("/").into_response())
}

/// `None` when a concurrent registration took the username or email after
/// the duplicate check.
fn insert_user(db: &Database, new_user: &NewUser, hash: &str) -> anyhow::Result<Option<Uuid>> {
    let id = Uuid::new_v4();
    match db.create_user(&id.to_string(), &new_user.username, &new_user.email, hash) {
        Ok(()) => Ok(Some(id)),
        Err(e) if is_constraint_violation(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

fn rerender_register(locals: &Locals, form: &RegisterForm, messages: &[String]) -> Response {
    flash_errors(locals, messages);
    let form = RegisterForm {
        password: String::new(),
        ..form.clone()
    };
    (StatusCode::UNPROCESSABLE_ENTITY, views::users::register(locals, &form)).into_response()
}

pub async fn login_form(locals: Locals) -> Html<String> {
    views::users::login(&locals, "")
}

pub async fn login(
    State(state): State<AppState>,
    locals: Locals,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            flash_errors(&locals, &errors.0);
            let page = views::users::login(&locals, &form.username);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let authenticating = current_state(&locals)
        .apply(AuthEvent::Submit)
        .map_err(anyhow::Error::from)?
        .next;

    let Credentials { username, password } = credentials;
    let user = run_blocking(&state, move |s| s.auth.authenticate(&s.db, &username, &password)).await?;

    let event = match &user {
        Some(user) => AuthEvent::CredentialsVerified { user_id: user.id },
        None => AuthEvent::CredentialsRejected,
    };
    let transition = authenticating.apply(event).map_err(anyhow::Error::from)?;

    let Some(user) = user else {
        apply(&locals, &transition);
        debug!("Login rejected");
        return Ok(Redirect::to("/login").into_response());
    };

    // Regenerating the session drops its data, so read the target first.
    let return_to = locals.session.take_return_to();
    apply(&locals, &transition);

    info!("User {} logged in", user.username);
    locals.session.flash(FlashKind::Success, "Welcome back!");
    let target = return_to
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| DEFAULT_LANDING.to_string());
    Ok(Redirect::to(&target).into_response())
}

pub async fn logout(locals: Locals) -> Result<Redirect, AppError> {
    let transition = current_state(&locals)
        .apply(AuthEvent::Logout)
        .map_err(anyhow::Error::from)?;
    apply(&locals, &transition);

    locals.session.flash(FlashKind::Success, "Goodbye!");
    Ok(Redirect::to(DEFAULT_LANDING))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_paths_are_followed() {
        assert!(is_local_path("/campgrounds/new"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("/\\evil.example"));
    }

    #[test]
    fn taken_username_is_a_duplicate_not_an_error() {
        let db = Database::open_in_memory().unwrap();
        let first = NewUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "correct horse battery".into(),
        };
        assert!(insert_user(&db, &first, "$argon2id$fake").unwrap().is_some());

        // Same name, different email: only the UNIQUE constraint catches it.
        let racer = NewUser {
            email: "other@example.com".into(),
            ..first
        };
        assert_eq!(insert_user(&db, &racer, "$argon2id$fake").unwrap(), None);
    }
}
