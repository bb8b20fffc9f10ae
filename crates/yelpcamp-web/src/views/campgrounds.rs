use axum::response::Html;
use maud::{Markup, html};
use uuid::Uuid;
use yelpcamp_types::forms::{CampgroundForm, ReviewForm};
use yelpcamp_types::models::{Campground, CampgroundDetail};

use super::{field, page};
use crate::middleware::Locals;

fn price_per_night(price: f64) -> String {
    format!("${price}/night")
}

pub fn index(locals: &Locals, campgrounds: &[Campground]) -> Html<String> {
    page(locals, "All Campgrounds", html! {
        h1 { "All Campgrounds" }
        @if campgrounds.is_empty() {
            p.text-muted { "No campgrounds yet." }
        }
        @for c in campgrounds {
            div class="card mb-3" {
                div.row {
                    div class="col-md-4" {
                        @if let Some(image) = c.images.first() {
                            img class="img-fluid" alt=(image.filename) src=(image.url);
                        }
                    }
                    div class="col-md-8" {
                        div.card-body {
                            h5.card-title { (c.title) }
                            p.card-text { (c.description) }
                            p.card-text {
                                small.text-muted { (c.location) }
                            }
                            a.btn.btn-primary href=(format!("/campgrounds/{}", c.id)) { "View " (c.title) }
                        }
                    }
                }
            }
        }
    })
}

fn campground_fields(form: &CampgroundForm) -> Markup {
    html! {
        (field("title", "Title", "text", &form.title))
        (field("location", "Location", "text", &form.location))
        div class="mb-3" {
            label.form-label for="price" { "Campground Price" }
            div.input-group {
                div.input-group-prepend {
                    span.input-group-text { "$" }
                }
                input.form-control type="text" id="price" name="price" placeholder="0.00" value=(form.price) required;
            }
        }
        div class="mb-3" {
            label.form-label for="description" { "Description" }
            textarea.form-control id="description" name="description" rows="3" required { (form.description) }
        }
        div class="mb-3" {
            label.form-label for="images" { "Image URLs (one per line)" }
            textarea.form-control id="images" name="images" rows="3" { (form.images) }
        }
    }
}

pub fn new_form(locals: &Locals, form: &CampgroundForm) -> Html<String> {
    page(locals, "New Campground", html! {
        div.row {
            h1.text-center { "New Campground" }
            div class="col-md-6 offset-md-3" {
                form action="/campgrounds" method="POST" class="validated-form" novalidate {
                    (campground_fields(form))
                    button.btn.btn-success { "Add Campground" }
                }
                a href="/campgrounds" { "All Campgrounds" }
            }
        }
    })
}

pub fn edit_form(locals: &Locals, id: Uuid, form: &CampgroundForm) -> Html<String> {
    page(locals, "Edit Campground", html! {
        div.row {
            h1.text-center { "Edit Campground" }
            div class="col-md-6 offset-md-3" {
                form action=(format!("/campgrounds/{id}?_method=PUT")) method="POST" class="validated-form" novalidate {
                    (campground_fields(form))
                    button.btn.btn-info { "Update Campground" }
                }
                a href=(format!("/campgrounds/{id}")) { "Back To Campground" }
            }
        }
    })
}

/// Detail page. `review` holds the values of a rejected review submission.
pub fn show(locals: &Locals, detail: &CampgroundDetail, review: &ReviewForm) -> Html<String> {
    let c = &detail.campground;
    let viewer = locals.current_user.as_ref().map(|u| u.id);
    let base = format!("/campgrounds/{}", c.id);

    page(locals, &c.title, html! {
        div.row {
            div class="col-md-6" {
                div class="card mb-3" {
                    @for image in &c.images {
                        img class="card-img-top" src=(image.url) alt=(image.filename);
                    }
                    div.card-body {
                        h5.card-title { (c.title) }
                        p.card-text { (c.description) }
                    }
                    ul class="list-group list-group-flush" {
                        li class="list-group-item text-muted" { (c.location) }
                        li.list-group-item { "Submitted by " (c.author.username) }
                        li.list-group-item { (price_per_night(c.price)) }
                    }
                    @if viewer.is_some_and(|id| c.is_authored_by(id)) {
                        div.card-body {
                            a class="card-link btn btn-info" href=(format!("{base}/edit")) { "Edit" }
                            form class="d-inline" action=(format!("{base}?_method=DELETE")) method="POST" {
                                button.btn.btn-danger { "Delete" }
                            }
                        }
                    }
                    div class="card-footer text-muted" {
                        (c.created_at.format("%B %-d, %Y").to_string())
                    }
                }
            }
            div class="col-md-6" {
                @if viewer.is_some() {
                    h2 { "Leave a Review" }
                    form action=(format!("{base}/reviews")) method="POST" class="mb-3 validated-form" novalidate {
                        div class="mb-3" {
                            label.form-label for="rating" { "Rating" }
                            select.form-control id="rating" name="rating" {
                                @for r in 1..=5u8 {
                                    option value=(r) selected[review.rating.trim() == r.to_string()] { (r) }
                                }
                            }
                        }
                        div class="mb-3" {
                            label.form-label for="body" { "Review Text" }
                            textarea.form-control id="body" name="body" rows="3" required { (review.body) }
                        }
                        button.btn.btn-success { "Submit" }
                    }
                }
                @for r in &detail.reviews {
                    div class="card mb-3" {
                        div.card-body {
                            h5.card-title { "Rating: " (r.rating) }
                            h6 class="card-subtitle mb-2 text-muted" { "By " (r.author.username) }
                            p.card-text { "Review: " (r.body) }
                            @if viewer == Some(r.author.id) {
                                form action=(format!("{base}/reviews/{}?_method=DELETE", r.id)) method="POST" {
                                    button class="btn btn-sm btn-danger" { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}
