use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};
use uuid::Uuid;
use yelpcamp_types::forms::{CampgroundForm, ReviewForm};
use yelpcamp_types::models::{Campground, CampgroundDetail, User};

use super::{flash_errors, parse_id};
use crate::error::AppError;
use crate::middleware::{Locals, RequireUser};
use crate::session::FlashKind;
use crate::state::{AppState, run_blocking};
use crate::views;

pub const NOT_FOUND: &str = "Cannot find that campground!";

async fn load(state: &AppState, id: Uuid) -> Result<Campground, AppError> {
    let key = id.to_string();
    run_blocking(state, move |s| s.db.get_campground(&key))
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

pub(super) async fn load_detail(state: &AppState, id: Uuid) -> Result<CampgroundDetail, AppError> {
    let key = id.to_string();
    run_blocking(state, move |s| {
        let Some(campground) = s.db.get_campground(&key)? else {
            return Ok(None);
        };
        let reviews = s.db.get_reviews_for_campground(&key)?;
        Ok(Some(CampgroundDetail { campground, reviews }))
    })
    .await?
    .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

fn ensure_author(campground: &Campground, user: &User) -> Result<(), AppError> {
    if campground.is_authored_by(user.id) {
        Ok(())
    } else {
        warn!("User {} is not the author of campground {}", user.id, campground.id);
        Err(AppError::Forbidden)
    }
}

pub async fn index(State(state): State<AppState>, locals: Locals) -> Result<Html<String>, AppError> {
    let campgrounds = run_blocking(&state, |s| s.db.list_campgrounds()).await?;
    Ok(views::campgrounds::index(&locals, &campgrounds))
}

pub async fn new_form(RequireUser(_user): RequireUser, locals: Locals) -> Html<String> {
    views::campgrounds::new_form(&locals, &CampgroundForm::default())
}

pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    locals: Locals,
    Form(form): Form<CampgroundForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            flash_errors(&locals, &errors.0);
            let page = views::campgrounds::new_form(&locals, &form);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let id = Uuid::new_v4();
    let (key, author) = (id.to_string(), user.id.to_string());
    run_blocking(&state, move |s| s.db.insert_campground(&key, &author, &input)).await?;

    info!("User {} created campground {}", user.username, id);
    locals
        .session
        .flash(FlashKind::Success, "Successfully made a new campground!");
    Ok(Redirect::to(&format!("/campgrounds/{id}")).into_response())
}

pub async fn show(
    State(state): State<AppState>,
    locals: Locals,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let detail = load_detail(&state, id).await?;
    Ok(views::campgrounds::show(&locals, &detail, &ReviewForm::default()))
}

pub async fn edit_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    locals: Locals,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let campground = load(&state, id).await?;
    ensure_author(&campground, &user)?;
    Ok(views::campgrounds::edit_form(&locals, id, &CampgroundForm::from(&campground)))
}

pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    locals: Locals,
    Path(id): Path<String>,
    Form(form): Form<CampgroundForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let campground = load(&state, id).await?;
    ensure_author(&campground, &user)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            flash_errors(&locals, &errors.0);
            let page = views::campgrounds::edit_form(&locals, id, &form);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let key = id.to_string();
    let updated = run_blocking(&state, move |s| s.db.update_campground(&key, &input)).await?;
    if !updated {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    info!("User {} updated campground {}", user.username, id);
    locals
        .session
        .flash(FlashKind::Success, "Successfully updated campground!");
    Ok(Redirect::to(&format!("/campgrounds/{id}")).into_response())
}

pub async fn destroy(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    locals: Locals,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let campground = load(&state, id).await?;
    ensure_author(&campground, &user)?;

    let key = id.to_string();
    if !run_blocking(&state, move |s| s.db.delete_campground(&key)).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    info!("User {} deleted campground {}", user.username, id);
    locals
        .session
        .flash(FlashKind::Success, "Successfully deleted campground");
    Ok(Redirect::to("/campgrounds"))
}
