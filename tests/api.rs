use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use library_api::router;
use library_db::{seed, InMemoryLibrary};
use library_kernel::settings::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    library: InMemoryLibrary,
}

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

impl TestApp {
    fn new() -> Self {
        Self::with_library(InMemoryLibrary::new())
    }

    fn seeded() -> Self {
        Self::with_library(InMemoryLibrary::seeded())
    }

    fn with_library(library: InMemoryLibrary) -> Self {
        let settings = Settings::default();
        Self {
            router: router(&settings, Arc::new(library.clone())),
            library,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            location,
            body,
        }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    async fn create_author(&self, first_name: &str) -> Uuid {
        let response = self
            .send(
                Method::POST,
                "/api/authors",
                Some(author_input(first_name)),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"].as_str().unwrap().parse().unwrap()
    }
}

fn author_input(first_name: &str) -> Value {
    json!({
        "firstName": first_name,
        "lastName": "Tester",
        "dateOfBirth": "1970-01-01",
        "genre": "Mystery"
    })
}

fn error_fields(body: &Value) -> Vec<String> {
    body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn listing_authors_on_an_empty_store_is_ok() {
    let app = TestApp::new();
    let response = app.get("/api/authors").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn created_author_is_reachable_through_location() {
    let app = TestApp::new();
    let response = app
        .send(Method::POST, "/api/authors", Some(author_input("Agatha")))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["name"], "Agatha Tester");
    let location = response.location.unwrap();
    assert_eq!(location, format!("/api/authors/{}", response.body["id"].as_str().unwrap()));

    let fetched = app.get(&location).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, response.body);
}

#[tokio::test]
async fn author_creation_without_body_is_bad_request() {
    let app = TestApp::new();
    assert_eq!(
        app.send(Method::POST, "/api/authors", None).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.send(Method::POST, "/api/authors", Some(Value::Null)).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(app.library.author_count().await, 0);
}

#[tokio::test]
async fn unknown_author_is_not_found() {
    let app = TestApp::new();
    let response = app.get(&format!("/api/authors/{}", Uuid::new_v4())).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"]["code"], "not_found");
}

#[tokio::test]
async fn malformed_ids_in_the_path_are_not_found() {
    let app = TestApp::seeded();
    let book_uri = format!("/api/authors/{}/books/not-a-guid", seed::STEPHEN_KING);

    for (method, uri) in [
        (Method::GET, "/api/authors/not-a-guid"),
        (Method::POST, "/api/authors/not-a-guid"),
        (Method::GET, "/api/authors/not-a-guid/books"),
        (Method::GET, book_uri.as_str()),
        (Method::DELETE, book_uri.as_str()),
    ] {
        let response = app.send(method.clone(), uri, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(response.body["error"]["code"], "not_found", "{method} {uri}");
    }
}

#[tokio::test]
async fn posting_to_an_author_id_never_creates() {
    let app = TestApp::seeded();

    let existing = app
        .send(
            Method::POST,
            &format!("/api/authors/{}", seed::STEPHEN_KING),
            Some(author_input("Stephen")),
        )
        .await;
    assert_eq!(existing.status, StatusCode::CONFLICT);

    let before = app.library.author_count().await;
    let missing = app
        .send(
            Method::POST,
            &format!("/api/authors/{}", Uuid::new_v4()),
            Some(author_input("Nobody")),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(app.library.author_count().await, before);
}

#[tokio::test]
async fn failed_save_is_a_server_error() {
    let app = TestApp::new();
    app.library.set_read_only(true);

    let response = app
        .send(Method::POST, "/api/authors", Some(author_input("Agatha")))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"]["code"], "internal_error");
}

#[tokio::test]
async fn author_collection_round_trip() {
    let app = TestApp::new();
    let response = app
        .send(
            Method::POST,
            "/api/authorscollection",
            Some(json!([author_input("Anne"), author_input("Bram")])),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let ids: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    let location = response.location.clone().unwrap();
    assert_eq!(
        location,
        format!("/api/authorscollection/({})", ids.join(","))
    );

    let fetched = app.get(&location).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_author_collection_is_bad_request() {
    let app = TestApp::new();
    for body in [None, Some(json!([]))] {
        let response = app.send(Method::POST, "/api/authorscollection", body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn failed_collection_save_commits_nothing() {
    let app = TestApp::new();
    app.library.set_read_only(true);
    let response = app
        .send(
            Method::POST,
            "/api/authorscollection",
            Some(json!([author_input("Anne"), author_input("Bram")])),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    app.library.set_read_only(false);
    assert_eq!(app.library.author_count().await, 0);
}

#[tokio::test]
async fn batch_read_is_all_or_nothing() {
    let app = TestApp::seeded();
    let uri = format!(
        "/api/authorscollection/({},{},{})",
        seed::STEPHEN_KING,
        Uuid::new_v4(),
        seed::DOUGLAS_ADAMS
    );
    let response = app.get(&uri).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_read_accepts_spaces_and_repeats() {
    let app = TestApp::seeded();
    let uri = format!(
        "/api/authorscollection/({},%20{},{})",
        seed::STEPHEN_KING,
        seed::DOUGLAS_ADAMS,
        seed::STEPHEN_KING
    );
    let response = app.get(&uri).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn batch_read_rejects_blank_and_malformed_lists() {
    let app = TestApp::seeded();
    assert_eq!(
        app.get("/api/authorscollection/()").await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.get("/api/authorscollection/(%20%20)").await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.get(&format!("/api/authorscollection/({},nope)", seed::STEPHEN_KING))
            .await
            .status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.get(&format!("/api/authorscollection/{}", seed::STEPHEN_KING))
            .await
            .status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn books_of_unknown_author_are_not_found() {
    let app = TestApp::new();
    let author = Uuid::new_v4();
    let book = Uuid::new_v4();

    assert_eq!(
        app.get(&format!("/api/authors/{author}/books")).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get(&format!("/api/authors/{author}/books/{book}")).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.send(
            Method::POST,
            &format!("/api/authors/{author}/books"),
            Some(json!({"title": "t", "description": "d"}))
        )
        .await
        .status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.send(Method::DELETE, &format!("/api/authors/{author}/books/{book}"), None)
            .await
            .status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.send(
            Method::PATCH,
            &format!("/api/authors/{author}/books/{book}"),
            Some(json!([]))
        )
        .await
        .status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn created_book_matches_input() {
    let app = TestApp::new();
    let author = app.create_author("Mary").await;

    let response = app
        .send(
            Method::POST,
            &format!("/api/authors/{author}/books"),
            Some(json!({"title": "Frankenstein", "description": "The Modern Prometheus"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["title"], "Frankenstein");
    assert_eq!(response.body["description"], "The Modern Prometheus");
    assert_eq!(response.body["authorId"], author.to_string());

    let fetched = app.get(&response.location.unwrap()).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, response.body);
}

#[tokio::test]
async fn book_creation_checks_author_before_body() {
    let app = TestApp::new();
    let author = app.create_author("Mary").await;

    let missing_body = app
        .send(Method::POST, &format!("/api/authors/{author}/books"), None)
        .await;
    assert_eq!(missing_body.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn title_equal_to_description_is_unprocessable() {
    let app = TestApp::new();
    let author = app.create_author("Mary").await;
    let same = json!({"title": "Same", "description": "Same"});

    let created = app
        .send(
            Method::POST,
            &format!("/api/authors/{author}/books"),
            Some(same.clone()),
        )
        .await;
    assert_eq!(created.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&created.body), vec!["BookForCreation"]);

    let replaced = app
        .send(
            Method::PUT,
            &format!("/api/authors/{author}/books/{}", Uuid::new_v4()),
            Some(same),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&replaced.body), vec!["BookForUpdate"]);
    assert_eq!(app.library.book_count().await, 0);
}

#[tokio::test]
async fn every_validation_failure_is_reported() {
    let app = TestApp::new();
    let author = app.create_author("Mary").await;

    let response = app
        .send(
            Method::POST,
            &format!("/api/authors/{author}/books"),
            Some(json!({"description": "d".repeat(501)})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let mut fields = error_fields(&response.body);
    fields.sort();
    assert_eq!(fields, vec!["description", "title"]);
}

#[tokio::test]
async fn replace_validates_before_checking_the_author() {
    let app = TestApp::new();
    let response = app
        .send(
            Method::PUT,
            &format!("/api/authors/{}/books/{}", Uuid::new_v4(), Uuid::new_v4()),
            Some(json!({"title": "x".repeat(101)})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn put_upserts_then_replaces_idempotently() {
    let app = TestApp::new();
    let author = app.create_author("Mary").await;
    let book = Uuid::new_v4();
    let uri = format!("/api/authors/{author}/books/{book}");

    let created = app
        .send(
            Method::PUT,
            &uri,
            Some(json!({"title": "The Last Man", "description": "1826"})),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["id"], book.to_string());
    assert_eq!(created.location.as_deref(), Some(uri.as_str()));

    let replacement = json!({"title": "The Last Man", "description": "Apocalyptic novel"});
    for _ in 0..2 {
        let replaced = app.send(Method::PUT, &uri, Some(replacement.clone())).await;
        assert_eq!(replaced.status, StatusCode::NO_CONTENT);
        assert_eq!(replaced.body, Value::Null);

        let fetched = app.get(&uri).await;
        assert_eq!(fetched.body["description"], "Apocalyptic novel");
    }
    assert_eq!(app.library.book_count().await, 1);
}

#[tokio::test]
async fn upserting_another_authors_book_id_conflicts() {
    let app = TestApp::new();
    let owner = app.create_author("Mary").await;
    let other = app.create_author("Percy").await;
    let book = Uuid::new_v4();

    let created = app
        .send(
            Method::PUT,
            &format!("/api/authors/{owner}/books/{book}"),
            Some(json!({"title": "Frankenstein"})),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let replaced = app
        .send(
            Method::PUT,
            &format!("/api/authors/{other}/books/{book}"),
            Some(json!({"title": "Ozymandias"})),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::CONFLICT);

    let patched = app
        .send(
            Method::PATCH,
            &format!("/api/authors/{other}/books/{book}"),
            Some(json!([{"op": "replace", "path": "/title", "value": "Ozymandias"}])),
        )
        .await;
    assert_eq!(patched.status, StatusCode::CONFLICT);

    let kept = app.get(&format!("/api/authors/{owner}/books/{book}")).await;
    assert_eq!(kept.body["title"], "Frankenstein");
    assert_eq!(app.library.book_count().await, 1);
}

#[tokio::test]
async fn put_without_body_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .send(
            Method::PUT,
            &format!("/api/authors/{}/books/{}", Uuid::new_v4(), Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_upserts_with_the_requested_id() {
    let app = TestApp::new();
    let author = app.create_author("Mary").await;
    let book = Uuid::new_v4();
    let uri = format!("/api/authors/{author}/books/{book}");

    let created = app
        .send(
            Method::PATCH,
            &uri,
            Some(json!([
                {"op": "replace", "path": "/title", "value": "Mathilda"},
                {"op": "add", "path": "/description", "value": "Novella"}
            ])),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.location.as_deref(), Some(uri.as_str()));

    let fetched = app.get(&uri).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["id"], book.to_string());
    assert_eq!(fetched.body["title"], "Mathilda");
    assert_eq!(app.library.book_count().await, 1);
}

#[tokio::test]
async fn patch_updates_an_existing_book() {
    let app = TestApp::seeded();
    let uri = format!(
        "/api/authors/{}/books/c7ba6add-09c4-45f8-8dd0-eaca221e5d93",
        seed::STEPHEN_KING
    );

    let patched = app
        .send(
            Method::PATCH,
            &uri,
            Some(json!([
                {"op": "test", "path": "/title", "value": "The Shining"},
                {"op": "replace", "path": "/description", "value": "Overlook Hotel"}
            ])),
        )
        .await;
    assert_eq!(patched.status, StatusCode::NO_CONTENT);

    let fetched = app.get(&uri).await;
    assert_eq!(fetched.body["title"], "The Shining");
    assert_eq!(fetched.body["description"], "Overlook Hotel");
}

#[tokio::test]
async fn patch_failures() {
    let app = TestApp::seeded();
    let uri = format!(
        "/api/authors/{}/books/c7ba6add-09c4-45f8-8dd0-eaca221e5d93",
        seed::STEPHEN_KING
    );

    let no_body = app.send(Method::PATCH, &uri, None).await;
    assert_eq!(no_body.status, StatusCode::BAD_REQUEST);

    let bad_op = app
        .send(
            Method::PATCH,
            &uri,
            Some(json!([{"op": "replace", "path": "/isbn", "value": "x"}])),
        )
        .await;
    assert_eq!(bad_op.status, StatusCode::BAD_REQUEST);

    let failed_test = app
        .send(
            Method::PATCH,
            &uri,
            Some(json!([
                {"op": "replace", "path": "/description", "value": "changed"},
                {"op": "test", "path": "/title", "value": "Carrie"}
            ])),
        )
        .await;
    assert_eq!(failed_test.status, StatusCode::BAD_REQUEST);

    let same_text = app
        .send(
            Method::PATCH,
            &uri,
            Some(json!([{"op": "copy", "from": "/title", "path": "/description"}])),
        )
        .await;
    assert_eq!(same_text.status, StatusCode::UNPROCESSABLE_ENTITY);

    let untouched = app.get(&uri).await;
    assert_ne!(untouched.body["description"], "changed");
    assert_ne!(untouched.body["description"], "The Shining");
}

#[tokio::test]
async fn patch_create_branch_is_validated() {
    let app = TestApp::new();
    let author = app.create_author("Mary").await;
    let response = app
        .send(
            Method::PATCH,
            &format!("/api/authors/{author}/books/{}", Uuid::new_v4()),
            Some(json!([{"op": "add", "path": "/description", "value": "no title"}])),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&response.body), vec!["title"]);
    assert_eq!(app.library.book_count().await, 0);
}

#[tokio::test]
async fn deleting_twice_is_not_found_the_second_time() {
    let app = TestApp::seeded();
    let uri = format!(
        "/api/authors/{}/books/a3749477-f823-4124-aa4a-fc9ad5e79cd6",
        seed::STEPHEN_KING
    );

    let first = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    let second = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn books_are_listed_by_title() {
    let app = TestApp::seeded();
    let response = app
        .get(&format!("/api/authors/{}/books", seed::STEPHEN_KING))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let titles: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Misery", "The Shining"]);
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = TestApp::new();
    let docs = app.get("/docs/openapi.json").await;
    assert_eq!(docs.status, StatusCode::OK);
    assert!(docs.body["paths"]["/api/authors/{authorId}/books/{id}"]["patch"].is_object());
    assert!(docs.body["paths"]["/api/authors/{authorId}"]["get"].is_object());
    assert!(docs.body["paths"]["/api/authors/{authorId}"]["post"].is_object());

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
