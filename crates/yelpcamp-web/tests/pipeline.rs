mod common;

use axum::http::{StatusCode, header};
use common::TestApp;

#[tokio::test]
async fn security_headers_are_on_every_response() {
    let app = TestApp::new();
    let mut client = app.client();

    for path in ["/", "/nowhere", "/static/stylesheets/app.css"] {
        let res = client.get(path).await;
        let csp = res
            .headers
            .get("content-security-policy")
            .unwrap_or_else(|| panic!("no CSP on {path}"));
        assert!(csp.to_str().unwrap().contains("https://images.unsplash.com/"));
        assert_eq!(res.headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert_eq!(res.headers.get("x-content-type-options").unwrap(), "nosniff");
    }
}

#[tokio::test]
async fn static_files_bypass_the_session() {
    let app = TestApp::new();
    let mut client = app.client();

    let res = client.get("/static/javascripts/validateForms.js").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(!res.sets_cookie());
    assert!(res.body.contains("validated-form"));

    let css = client.get("/static/stylesheets/app.css").await;
    let content_type = css.headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/css"));
}

#[tokio::test]
async fn missing_static_file_renders_error_view() {
    let app = TestApp::new();
    let mut client = app.client();

    let res = client.get("/static/nope.css").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let content_type = res.headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    assert!(res.body.contains("Page Not Found"));
    assert!(res.body.contains("Status 404"));
    assert!(!res.sets_cookie());
    assert!(res.headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn oversized_form_body_renders_error_view() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;

    let description = "a".repeat(3 * 1024 * 1024);
    let res = alice
        .post_form("/campgrounds", &[("title", "Huge"), ("description", &description)])
        .await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(res.body.contains("Request body too large"));
    assert!(app.db.list_campgrounds().unwrap().is_empty());
}

#[tokio::test]
async fn pages_start_a_session() {
    let app = TestApp::new();
    let mut client = app.client();

    let res = client.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn unsupported_method_renders_error_view() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;

    // `/campgrounds/new` is GET only.
    let res = alice.post_form("/campgrounds/new?_method=PUT", &[]).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.body.contains("Method Not Allowed"));
    assert!(res.body.contains("Signed in as alice"));
}

#[tokio::test]
async fn override_is_ignored_for_get_and_unknown_methods() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;
    let id = alice.create_campground("Misty Hollow").await;

    let res = alice.get(&format!("/campgrounds/{id}?_method=DELETE")).await;
    assert_eq!(res.status, StatusCode::OK);

    // POST /campgrounds/{id} has no handler of its own.
    let res = alice
        .post_form(&format!("/campgrounds/{id}?_method=TRACE"), &[])
        .await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(app.db.get_campground(&id.to_string()).unwrap().is_some());
}
