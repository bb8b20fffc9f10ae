mod common;

use axum::http::StatusCode;
use common::TestApp;
use uuid::Uuid;

#[tokio::test]
async fn author_can_create_edit_and_delete() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;

    let id = alice.create_campground("Misty Hollow").await;
    let page = alice.get(&format!("/campgrounds/{id}")).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Successfully made a new campground!"));
    assert!(page.body.contains("Submitted by alice"));
    assert!(page.body.contains("$12/night"));

    let edit = alice.get(&format!("/campgrounds/{id}/edit")).await;
    assert_eq!(edit.status, StatusCode::OK);
    assert!(edit.body.contains(r#"value="Misty Hollow""#));

    let res = alice
        .post_form(
            &format!("/campgrounds/{id}?_method=PUT"),
            &[
                ("title", "Misty Hollow North"),
                ("location", "Bend, Oregon"),
                ("price", "20"),
                ("description", "Further up the creek"),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let stored = app.db.get_campground(&id.to_string()).unwrap().unwrap();
    assert_eq!(stored.title, "Misty Hollow North");
    assert_eq!(stored.price, 20.0);
    assert!(stored.images.is_empty());

    // Override read from the body rather than the query string.
    let res = alice
        .post_form(&format!("/campgrounds/{id}"), &[("_method", "DELETE")])
        .await;
    assert_eq!(res.location(), Some("/campgrounds"));
    let list = alice.get("/campgrounds").await;
    assert!(list.body.contains("Successfully deleted campground"));
    assert!(!list.body.contains("Misty Hollow North"));
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;
    alice.create_campground("Older Camp").await;
    alice.create_campground("Newer Camp").await;

    let body = alice.get("/campgrounds").await.body;
    let older = body.find("Older Camp").unwrap();
    let newer = body.find("Newer Camp").unwrap();
    assert!(newer < older);
}

#[tokio::test]
async fn other_users_cannot_modify_a_campground() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;
    let (mut bob, _) = app.user("bob").await;
    let id = alice.create_campground("Misty Hollow").await;

    let edit = bob.get(&format!("/campgrounds/{id}/edit")).await;
    assert_eq!(edit.status, StatusCode::FORBIDDEN);

    let update = bob
        .post_form(
            &format!("/campgrounds/{id}?_method=PUT"),
            &[
                ("title", "Bob's Camp"),
                ("location", "Nowhere"),
                ("price", "1"),
                ("description", "Mine now"),
            ],
        )
        .await;
    assert_eq!(update.status, StatusCode::FORBIDDEN);
    assert!(update.body.contains("You do not have permission to do that!"));

    let delete = bob
        .post_form(&format!("/campgrounds/{id}?_method=DELETE"), &[])
        .await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let stored = app.db.get_campground(&id.to_string()).unwrap().unwrap();
    assert_eq!(stored.title, "Misty Hollow");
}

#[tokio::test]
async fn anonymous_mutations_are_unauthorized() {
    let app = TestApp::new();
    let mut anon = app.client();

    let res = anon
        .post_form(
            "/campgrounds",
            &[
                ("title", "Sneaky"),
                ("location", "Nowhere"),
                ("price", "1"),
                ("description", "No account"),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.body.contains("You must be signed in first!"));
    assert!(app.db.list_campgrounds().unwrap().is_empty());

    let id = Uuid::new_v4();
    let res = anon
        .post_form(&format!("/campgrounds/{id}?_method=DELETE"), &[])
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_and_malformed_ids_are_not_found() {
    let app = TestApp::new();
    let mut client = app.client();

    let res = client.get(&format!("/campgrounds/{}", Uuid::new_v4())).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.body.contains("Cannot find that campground!"));

    let res = client.get("/campgrounds/not-an-id").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = client.get("/nowhere").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.body.contains("Page Not Found"));
}

#[tokio::test]
async fn invalid_campground_re_renders_with_submitted_values() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;

    let res = alice
        .post_form(
            "/campgrounds",
            &[
                ("title", "Misty Hollow"),
                ("location", "Bend, Oregon"),
                ("price", "-3"),
                ("description", "Tall pines"),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body.contains("must be greater than or equal to 0"));
    assert!(res.body.contains(r#"value="Misty Hollow""#));
    assert!(res.body.contains(r#"value="-3""#));
    assert!(app.db.list_campgrounds().unwrap().is_empty());

    // Shown once, with the re-render.
    let next = alice.get("/campgrounds").await;
    assert!(!next.body.contains("must be greater than or equal to 0"));
}

#[tokio::test]
async fn reviews_are_created_guarded_and_removed_with_their_campground() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;
    let (mut bob, _) = app.user("bob").await;
    let id = alice.create_campground("Misty Hollow").await;

    let res = bob
        .post_form(
            &format!("/campgrounds/{id}/reviews"),
            &[("rating", "4"), ("body", "Lovely creek")],
        )
        .await;
    assert_eq!(res.location(), Some(format!("/campgrounds/{id}").as_str()));

    let reviews = app.db.get_reviews_for_campground(&id.to_string()).unwrap();
    assert_eq!(reviews.len(), 1);
    let review_id = reviews[0].id;

    let page = bob.get(&format!("/campgrounds/{id}")).await;
    assert!(page.body.contains("Created new review!"));
    assert!(page.body.contains("Lovely creek"));

    let res = alice
        .post_form(&format!("/campgrounds/{id}/reviews/{review_id}?_method=DELETE"), &[])
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = bob
        .post_form(&format!("/campgrounds/{id}/reviews"), &[("rating", "9"), ("body", "")])
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body.contains("must be between 1 and 5"));

    alice
        .post_form(&format!("/campgrounds/{id}?_method=DELETE"), &[])
        .await;
    assert!(app.db.get_reviews_for_campground(&id.to_string()).unwrap().is_empty());
    assert!(app.db.get_review(&review_id.to_string()).unwrap().is_none());
    assert_eq!(
        bob.get(&format!("/campgrounds/{id}")).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn review_author_can_delete_their_review() {
    let app = TestApp::new();
    let (mut alice, _) = app.user("alice").await;
    let id = alice.create_campground("Misty Hollow").await;

    alice
        .post_form(
            &format!("/campgrounds/{id}/reviews"),
            &[("rating", "5"), ("body", "Best spot")],
        )
        .await;
    let review_id = app.db.get_reviews_for_campground(&id.to_string()).unwrap()[0].id;

    let res = alice
        .post_form(&format!("/campgrounds/{id}/reviews/{review_id}?_method=DELETE"), &[])
        .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert!(app.db.get_reviews_for_campground(&id.to_string()).unwrap().is_empty());

    // Wrong campground in the path.
    let other = alice.create_campground("Elsewhere").await;
    let res = alice
        .post_form(&format!("/campgrounds/{other}/reviews/{review_id}?_method=DELETE"), &[])
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
