use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};
use uuid::Uuid;
use yelpcamp_types::forms::ReviewForm;

use super::campgrounds::{self, load_detail};
use super::{flash_errors, parse_id};
use crate::error::AppError;
use crate::middleware::{Locals, RequireUser};
use crate::session::FlashKind;
use crate::state::{AppState, run_blocking};
use crate::views;

const NOT_FOUND: &str = "Cannot find that review!";

pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    locals: Locals,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let campground_id = parse_id(&id, campgrounds::NOT_FOUND)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            // The review form lives on the detail page.
            let detail = load_detail(&state, campground_id).await?;
            flash_errors(&locals, &errors.0);
            let page = views::campgrounds::show(&locals, &detail, &form);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let review_id = Uuid::new_v4();
    let (key, cid, author) = (
        review_id.to_string(),
        campground_id.to_string(),
        user.id.to_string(),
    );
    let created = run_blocking(&state, move |s| {
        if s.db.get_campground(&cid)?.is_none() {
            return Ok(false);
        }
        s.db.insert_review(&key, &cid, &author, &input)?;
        Ok(true)
    })
    .await?;
    if !created {
        return Err(AppError::NotFound(campgrounds::NOT_FOUND.to_string()));
    }

    info!("User {} reviewed campground {}", user.username, campground_id);
    locals.session.flash(FlashKind::Success, "Created new review!");
    Ok(Redirect::to(&format!("/campgrounds/{campground_id}")).into_response())
}

pub async fn destroy(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    locals: Locals,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let campground_id = parse_id(&id, campgrounds::NOT_FOUND)?;
    let review_id = parse_id(&review_id, NOT_FOUND)?;

    let key = review_id.to_string();
    let review = run_blocking(&state, move |s| s.db.get_review(&key))
        .await?
        .filter(|r| r.campground_id == campground_id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    if review.author.id != user.id {
        warn!("User {} is not the author of review {}", user.id, review_id);
        return Err(AppError::Forbidden);
    }

    let (cid, rid) = (campground_id.to_string(), review_id.to_string());
    if !run_blocking(&state, move |s| s.db.delete_review(&cid, &rid)).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    info!("User {} deleted review {}", user.username, review_id);
    locals.session.flash(FlashKind::Success, "Successfully deleted review");
    Ok(Redirect::to(&format!("/campgrounds/{campground_id}")))
}
