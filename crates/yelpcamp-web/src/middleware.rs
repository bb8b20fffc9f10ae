use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, Method, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, warn};
use yelpcamp_types::models::User;

use crate::auth::{self, AuthEvent, AuthState};
use crate::error::AppError;
use crate::session::{FlashKind, FlashMessages, Session};
use crate::state::{AppState, run_blocking};

/// Loads (or starts) the session, runs the rest of the pipeline, then
/// commits the session and sets the cookie when needed.
///
/// A store failure while loading degrades to a fresh session, which logs the
/// user out for that request. This is accepted behaviour, logged at `warn`.
pub async fn session_stage(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let sessions = &state.sessions;

    let session = match sessions.read_cookie(req.headers()) {
        Some(id) => match sessions.load(&id).await {
            Ok(Some(record)) => Session::loaded(id, record),
            Ok(None) => sessions.start(),
            Err(e) => {
                warn!("Session store unavailable, continuing with a fresh session: {:#}", e);
                sessions.start()
            }
        },
        None => sessions.start(),
    };

    req.extensions_mut().insert(session.clone());
    let mut res = next.run(req).await;

    match sessions.commit(session.commit()).await {
        Ok(Some(id)) => {
            let cookie = sessions.session_cookie(&id);
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => error!("Invalid session cookie header: {}", e),
            }
        }
        Ok(None) => {}
        Err(e) => error!("Failed to commit session: {:#}", e),
    }

    res
}

/// Resolved user for the current request, `None` when anonymous.
#[derive(Debug, Clone)]
pub struct Identity(pub Option<User>);

/// Deserializes the session identity into a full user.
pub async fn identity_stage(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let user = match req.extensions().get::<Session>().cloned() {
        Some(session) => resolve_identity(&state, &session).await,
        None => None,
    };
    req.extensions_mut().insert(Identity(user));
    next.run(req).await
}

async fn resolve_identity(state: &AppState, session: &Session) -> Option<User> {
    let current = AuthState::from_session(session.user_id());
    let user_id = current.user_id()?;

    let id = user_id.to_string();
    match run_blocking(state, move |s| s.db.get_user_by_id(&id)).await {
        Ok(Some(row)) => Some(row.into_model()),
        Ok(None) => {
            warn!("Session refers to missing user {}", user_id);
            if let Ok(transition) = current.apply(AuthEvent::IdentityLost) {
                if let Some(effect) = &transition.effect {
                    auth::perform(session, effect);
                }
            }
            None
        }
        Err(e) => {
            warn!("Identity lookup failed, treating request as anonymous: {}", e);
            None
        }
    }
}

/// View locals: the current user plus the session, from which flash
/// messages are drained when a page renders.
#[derive(Clone)]
pub struct Locals {
    pub current_user: Option<User>,
    pub session: Session,
}

impl Locals {
    pub fn take_flash(&self) -> FlashMessages {
        self.session.take_flash()
    }
}

pub async fn locals_stage(mut req: Request, next: Next) -> Response {
    let Some(session) = req.extensions().get::<Session>().cloned() else {
        return AppError::Internal(anyhow::anyhow!("session stage did not run")).into_response();
    };
    let current_user = req
        .extensions()
        .get::<Identity>()
        .and_then(|identity| identity.0.clone());

    req.extensions_mut().insert(Locals {
        current_user,
        session,
    });
    next.run(req).await
}

impl<S: Send + Sync> FromRequestParts<S> for Locals {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Locals>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("locals stage did not run")))
    }
}

/// Extractor for routes that need a signed-in user.
///
/// `GET` pages remember the requested path and redirect to the login form;
/// any other method is an authorization failure.
pub struct RequireUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locals = Locals::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if let Some(user) = locals.current_user {
            return Ok(RequireUser(user));
        }

        if parts.method == Method::GET {
            let path = parts
                .uri
                .path_and_query()
                .map(|pq| pq.to_string())
                .unwrap_or_else(|| "/".to_string());
            locals.session.set_return_to(path);
            locals
                .session
                .flash(FlashKind::Error, AppError::Unauthenticated.to_string());
            return Err(Redirect::to("/login").into_response());
        }

        Err(AppError::Unauthenticated.into_response())
    }
}
