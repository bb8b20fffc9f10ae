use axum::response::Html;
use maud::html;
use yelpcamp_types::forms::RegisterForm;

use super::{field, page};
use crate::middleware::Locals;

/// The password is never echoed back.
pub fn register(locals: &Locals, form: &RegisterForm) -> Html<String> {
    page(locals, "Register", html! {
        div.row {
            div class="col-md-6 offset-md-3 col-xl-4 offset-xl-4" {
                div class="card shadow" {
                    div.card-body {
                        h2.card-title { "Register" }
                        form action="/register" method="POST" class="validated-form" novalidate {
                            (field("username", "Username", "text", &form.username))
                            (field("email", "Email", "email", &form.email))
                            (field("password", "Password", "password", ""))
                            button class="btn btn-success btn-block" { "Register" }
                        }
                    }
                }
            }
        }
    })
}

pub fn login(locals: &Locals, username: &str) -> Html<String> {
    page(locals, "Login", html! {
        div.row {
            div class="col-md-6 offset-md-3 col-xl-4 offset-xl-4" {
                div class="card shadow" {
                    div.card-body {
                        h2.card-title { "Login" }
                        form action="/login" method="POST" class="validated-form" novalidate {
                            (field("username", "Username", "text", username))
                            (field("password", "Password", "password", ""))
                            button class="btn btn-success btn-block" { "Login" }
                        }
                    }
                }
            }
        }
    })
}
