//! Drives the full pipeline in-process with a cookie-carrying client.

#![allow(dead_code)]

use std::sync::Arc;

use argon2::Params;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use yelpcamp_db::Database;
use yelpcamp_web::auth::Authenticator;
use yelpcamp_web::session::cookie::SessionKey;
use yelpcamp_web::session::{MemorySessionStore, SessionConfig, SessionManager, SessionStore};
use yelpcamp_web::{AppStateInner, build_app};

pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub app: Router,
    pub db: Arc<Database>,
    /// Set when the app runs on a [`MemorySessionStore`].
    pub memory: Option<Arc<MemorySessionStore>>,
}

impl TestApp {
    /// Sessions persisted in the application database.
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let store: Arc<dyn SessionStore> = db.clone();
        Self::build(db, store, None)
    }

    /// Sessions kept in an inspectable in-memory store.
    pub fn with_memory_store() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let memory = Arc::new(MemorySessionStore::new());
        let store: Arc<dyn SessionStore> = memory.clone();
        Self::build(db, store, Some(memory))
    }

    fn build(db: Arc<Database>, store: Arc<dyn SessionStore>, memory: Option<Arc<MemorySessionStore>>) -> Self {
        let sessions = SessionManager::new(
            store,
            SessionKey::new("integration-secret").unwrap(),
            SessionConfig::default(),
        );
        let state = Arc::new(AppStateInner {
            db: db.clone(),
            sessions,
            auth: Authenticator::with_params(Params::new(8, 1, 1, None).unwrap()).unwrap(),
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../../public").into(),
        });
        Self {
            app: build_app(state).unwrap(),
            db,
            memory,
        }
    }

    pub fn client(&self) -> Client {
        Client {
            app: self.app.clone(),
            cookie: None,
        }
    }

    /// A client signed in as a freshly registered user.
    pub async fn user(&self, username: &str) -> (Client, Uuid) {
        let mut client = self.client();
        let res = client.register(username).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "register {username}: {}", res.body);
        let row = self.db.get_user_by_username(username).unwrap().unwrap();
        (client, row.id.parse().unwrap())
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn sets_cookie(&self) -> bool {
        self.headers.contains_key(header::SET_COOKIE)
    }
}

pub struct Client {
    app: Router,
    pub cookie: Option<String>,
}

impl Client {
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let req = self.request(Method::GET, path).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_form(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(form).unwrap();
        let req = self
            .request(Method::POST, path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    pub async fn register(&mut self, username: &str) -> TestResponse {
        let email = format!("{username}@example.com");
        self.post_form(
            "/register",
            &[("username", username), ("email", &email), ("password", PASSWORD)],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("username", username), ("password", password)])
            .await
    }

    /// Creates a campground and returns its id.
    pub async fn create_campground(&mut self, title: &str) -> Uuid {
        let res = self
            .post_form(
                "/campgrounds",
                &[
                    ("title", title),
                    ("location", "Bend, Oregon"),
                    ("price", "12"),
                    ("description", "Tall pines and a cold creek"),
                    ("images", "https://images.unsplash.com/photo-1.jpg"),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "{}", res.body);
        let location = res.location().unwrap();
        location.strip_prefix("/campgrounds/").unwrap().parse().unwrap()
    }

    fn request(&self, method: Method, path: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let res = self.app.clone().oneshot(req).await.unwrap();

        for value in res.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            if let Some(pair) = value.split(';').next().filter(|p| p.starts_with("session=")) {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
