//! Server-rendered pages. All dynamic content goes through maud, which
//! escapes it.

pub mod campgrounds;
pub mod users;

use axum::response::Html;
use maud::{DOCTYPE, Markup, html};
use yelpcamp_types::models::User;

use crate::error::NormalizedError;
use crate::middleware::Locals;
use crate::session::FlashMessages;

const BOOTSTRAP_CSS: &str = "https://stackpath.bootstrapcdn.com/bootstrap/4.5.0/css/bootstrap.min.css";
const BOOTSTRAP_JS: &str = "https://stackpath.bootstrapcdn.com/bootstrap/4.5.0/js/bootstrap.bundle.min.js";

/// Renders `content` inside the layout. Pending flash messages are drained
/// here, so only a rendered page consumes them.
pub fn page(locals: &Locals, title: &str, content: Markup) -> Html<String> {
    layout(Some(locals), title, content)
}

fn layout(locals: Option<&Locals>, title: &str, content: Markup) -> Html<String> {
    let flash = locals.map(Locals::take_flash).unwrap_or_default();
    let user = locals.and_then(|l| l.current_user.as_ref());

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | YelpCamp" }
                link rel="stylesheet" href=(BOOTSTRAP_CSS);
                link rel="stylesheet" href="/static/stylesheets/app.css";
            }
            body class="d-flex flex-column vh-100" {
                (navbar(user))
                main class="container mt-5" {
                    (flash_alerts(&flash))
                    (content)
                }
                footer class="footer bg-dark py-3 mt-auto" {
                    div.container {
                        span.text-muted { "© YelpCamp" }
                    }
                }
                script src=(BOOTSTRAP_JS) {}
                script src="/static/javascripts/validateForms.js" {}
            }
        }
    };
    Html(markup.into_string())
}

fn navbar(user: Option<&User>) -> Markup {
    html! {
        nav class="navbar sticky-top navbar-expand-lg navbar-dark bg-dark" {
            div.container-fluid {
                a.navbar-brand href="/" { "YelpCamp" }
                div.navbar-nav {
                    a.nav-link href="/" { "Home" }
                    a.nav-link href="/campgrounds" { "Campgrounds" }
                    a.nav-link href="/campgrounds/new" { "New Campground" }
                }
                div class="navbar-nav ml-auto" {
                    @if let Some(user) = user {
                        span class="navbar-text mr-3" { "Signed in as " (user.username) }
                        a.nav-link href="/logout" { "Logout" }
                    } @else {
                        a.nav-link href="/login" { "Login" }
                        a.nav-link href="/register" { "Register" }
                    }
                }
            }
        }
    }
}

fn flash_alerts(flash: &FlashMessages) -> Markup {
    html! {
        @for message in &flash.success {
            div class="alert alert-success" role="alert" data-flash="success" { (message) }
        }
        @for message in &flash.error {
            div class="alert alert-danger" role="alert" data-flash="error" { (message) }
        }
    }
}

pub fn home(locals: &Locals) -> Html<String> {
    page(locals, "Home", html! {
        div class="text-center py-5" {
            h1 { "YelpCamp" }
            p.lead {
                "Welcome to YelpCamp! Jump right in and explore our many campgrounds."
                br;
                "Feel free to share some of your own and comment on others!"
            }
            a class="btn btn-lg btn-secondary font-weight-bold" href="/campgrounds" { "View Campgrounds" }
        }
    })
}

/// The error view. `locals` is absent when the failure happened before the
/// locals stage ran.
pub fn error_page(locals: Option<&Locals>, err: &NormalizedError) -> Html<String> {
    layout(locals, "Error", html! {
        div.row {
            div class="col-6 offset-3" {
                div class="alert alert-danger" role="alert" {
                    h4.alert-heading { (err.message) }
                    p { "Status " (err.status.as_u16()) }
                }
            }
        }
    })
}

/// Label + input pair used by every form.
pub(crate) fn field(name: &str, label: &str, kind: &str, value: &str) -> Markup {
    html! {
        div class="mb-3" {
            label.form-label for=(name) { (label) }
            input.form-control type=(kind) id=(name) name=(name) value=(value) required;
        }
    }
}
