//! API integration tests

use serde_json::{json, Value};

use crate::common::spawn_app;

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app.get("/health").await;
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");

    let response = app.get("/ready").await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_lending_scenario() {
    let app = spawn_app().await;
    let (author_id, book_id, borrower_id) = app.seed().await;
    assert_eq!((author_id, book_id, borrower_id), (1, 1, 1));

    let book: Value = app.get("/books/1").await.json().await.unwrap();
    assert_eq!(book["is_borrowed"], false);

    let response = app
        .post_json(
            "/books/1/borrow",
            json!({ "borrower_id": 1, "date": "2024-01-10" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");
    assert_eq!(body["loan"]["borrow_date"], "2024-01-10");
    assert!(body["loan"]["return_date"].is_null());

    let book: Value = app.get("/books/1").await.json().await.unwrap();
    assert_eq!(book["is_borrowed"], true);

    let response = app
        .post_json("/books/1/return", json!({ "date": "2024-01-20" }))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["id"], loan_id);
    assert_eq!(body["loan"]["return_date"], "2024-01-20");

    let book: Value = app.get("/books/1").await.json().await.unwrap();
    assert_eq!(book["is_borrowed"], false);

    let loan: Value = app.get(&format!("/loans/{}", loan_id)).await.json().await.unwrap();
    assert_eq!(loan["return_date"], "2024-01-20");
}

#[tokio::test]
async fn test_state_machine_conflicts() {
    let app = spawn_app().await;
    let (_, book_id, borrower_id) = app.seed().await;

    let response = app
        .post_json(&format!("/books/{}/return", book_id), json!({}))
        .await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "NotCurrentlyBorrowed");

    let borrow = json!({ "borrower_id": borrower_id, "date": "2024-02-01" });
    let response = app.post_json(&format!("/books/{}/borrow", book_id), borrow.clone()).await;
    assert_eq!(response.status(), 201);

    let response = app.post_json(&format!("/books/{}/borrow", book_id), borrow).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "AlreadyBorrowed");

    let response = app
        .post_json("/books/99/borrow", json!({ "borrower_id": borrower_id }))
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "UnknownBook");

    // Return without a body defaults to today
    let response = app
        .client
        .post(app.url(&format!("/books/{}/return", book_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_create_book_with_unknown_author() {
    let app = spawn_app().await;

    let response = app
        .post_json("/books", json!({ "title": "Orphan", "author_id": 42, "genre": "" }))
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "UnknownAuthor");

    let body: Value = app.get("/books").await.json().await.unwrap();
    assert_eq!(body["total"], 0);
    assert_eq!(body["books"], json!([]));
}

#[tokio::test]
async fn test_validation_errors() {
    let app = spawn_app().await;

    let response = app.post_json("/authors", json!({ "name": "" })).await;
    assert_eq!(response.status(), 400);

    let response = app
        .post_json("/borrowers", json!({ "name": "X", "email": "nope" }))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "BadValue");

    let response = app.get("/loans").await;
    assert_eq!(response.status(), 400);

    let response = app
        .get(&format!("/books?page={}&per_page=10", i64::MAX))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_book_listing_and_history() {
    let app = spawn_app().await;
    let (author_id, book_id, borrower_id) = app.seed().await;
    let other_id = app
        .create(
            "/books",
            json!({ "title": "Emma", "author_id": author_id, "genre": "Romance" }),
        )
        .await;

    app.post_json(
        &format!("/books/{}/borrow", book_id),
        json!({ "borrower_id": borrower_id, "date": "2024-03-01" }),
    )
    .await;

    let body: Value = app.get("/books?available_only=true").await.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["books"][0]["id"], other_id);

    let body: Value = app.get("/books?genre=Romance").await.json().await.unwrap();
    assert_eq!(body["books"][0]["title"], "Emma");

    let history: Value = app
        .get(&format!("/borrowers/{}/loans", borrower_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["book_id"], book_id);

    let history: Value = app
        .get(&format!("/loans?book_id={}&open_only=true", book_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_policies() {
    let app = spawn_app().await;
    let (author_id, book_id, borrower_id) = app.seed().await;

    app.post_json(
        &format!("/books/{}/borrow", book_id),
        json!({ "borrower_id": borrower_id, "date": "2024-04-01" }),
    )
    .await;

    let delete = |path: String| {
        let client = app.client.clone();
        let url = app.url(&path);
        async move { client.delete(url).send().await.unwrap() }
    };

    let response = delete(format!("/books/{}", book_id)).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "BookBorrowed");

    let response = delete(format!("/authors/{}", author_id)).await;
    assert_eq!(response.status(), 409);

    let response = delete(format!("/borrowers/{}", borrower_id)).await;
    assert_eq!(response.status(), 409);

    app.post_json(
        &format!("/books/{}/return", book_id),
        json!({ "date": "2024-04-05" }),
    )
    .await;

    let response = delete(format!("/books/{}", book_id)).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"], "archived");

    assert_eq!(app.get(&format!("/books/{}", book_id)).await.status(), 404);
    let history: Value = app
        .get(&format!("/books/{}/loans", book_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);

    let stats: Value = app.get("/stats").await.json().await.unwrap();
    assert_eq!(stats["books"], 0);
    assert_eq!(stats["loans_total"], 1);
    assert_eq!(stats["status_mismatches"], json!([]));
}
