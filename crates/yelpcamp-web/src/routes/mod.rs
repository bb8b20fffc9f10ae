pub mod campgrounds;
pub mod reviews;
pub mod users;

use axum::{
    Router,
    response::Html,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Locals;
use crate::session::FlashKind;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/register", get(users::register_form).post(users::register))
        .route("/login", get(users::login_form).post(users::login))
        .route("/logout", get(users::logout).post(users::logout))
        .route("/campgrounds", get(campgrounds::index).post(campgrounds::create))
        .route("/campgrounds/new", get(campgrounds::new_form))
        .route(
            "/campgrounds/{id}",
            get(campgrounds::show)
                .put(campgrounds::update)
                .delete(campgrounds::destroy),
        )
        .route("/campgrounds/{id}/edit", get(campgrounds::edit_form))
        .route("/campgrounds/{id}/reviews", post(reviews::create))
        .route("/campgrounds/{id}/reviews/{review_id}", delete(reviews::destroy))
}

async fn home(locals: Locals) -> Html<String> {
    views::home(&locals)
}

/// Path ids that are not UUIDs cannot name a stored record.
fn parse_id(raw: &str, missing: &str) -> Result<Uuid, AppError> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::NotFound(missing.to_string()))
}

/// Queues every validation message as an error flash.
fn flash_errors(locals: &Locals, messages: &[String]) {
    for message in messages {
        locals.session.flash(FlashKind::Error, message.as_str());
    }
}
