/// End-to-end tests through the HTTP router
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use clap::Parser;
use habit_tracker_api::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "habit-test-boundary";

async fn server(mode: &str) -> (TempDir, HabitTrackerServer) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::parse_from([
        "habit-tracker-api".into(),
        "--database".into(),
        dir.path().join("habits.db").into_os_string(),
        "--upload-dir".into(),
        dir.path().join("uploads").into_os_string(),
        "--completion-mode".into(),
        mode.into(),
    ]);

    let server = HabitTrackerServer::new(config)
        .await
        .expect("Failed to create server");
    (dir, server)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(uri: &str, field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(Method::POST, "/habits", json!({"name": name, "description": "test"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_fetch() {
        let (_dir, server) = server("upload").await;
        let app = server.router();

        let created = create(&app, "Drink water").await;
        let id = created["id"].as_str().unwrap();

        let (status, fetched) = send(&app, empty_request(Method::GET, &format!("/habits/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Drink water");
        assert_eq!(fetched["description"], "test");
        assert_eq!(fetched["streak"], 0);
        assert_eq!(fetched["isCompleted"], false);

        let (status, list) = send(&app, empty_request(Method::GET, "/habits")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_without_name_is_rejected() {
        let (_dir, server) = server("upload").await;
        let app = server.router();

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/habits", json!({"description": "no name"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("name"));

        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::POST)
                .uri("/habits")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        assert!(server.service().list_habits().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (_dir, server) = server("upload").await;
        let app = server.router();
        let created = create(&app, "Read").await;
        let uri = format!("/habits/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            json_request(Method::PATCH, &uri, json!({"streak": 5, "is_completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Read");
        assert_eq!(updated["streak"], 5);
        assert_eq!(updated["isCompleted"], true);

        let (status, updated) =
            send(&app, json_request(Method::PUT, &uri, json!({"name": "Read more"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Read more");
        assert_eq!(updated["streak"], 5);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (_dir, server) = server("upload").await;
        let app = server.router();
        create(&app, "Keep me").await;
        let missing = format!("/habits/{}", HabitId::new());

        let (status, body) = send(&app, empty_request(Method::DELETE, &missing)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Habit not found");

        let (status, _) = send(&app, json_request(Method::PATCH, &missing, json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, empty_request(Method::GET, "/habits/not-a-uuid")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert_eq!(server.service().list_habits().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_returns_message_and_habit() {
        let (_dir, server) = server("upload").await;
        let app = server.router();
        let created = create(&app, "Temporary").await;
        let uri = format!("/habits/{}", created["id"].as_str().unwrap());

        let (status, body) = send(&app, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Habit deleted successfully");
        assert_eq!(body["habit"]["id"], created["id"]);

        let (status, _) = send(&app, empty_request(Method::GET, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_flow() {
        let (_dir, server) = server("upload").await;
        let app = server.router();
        let created = create(&app, "Gym").await;
        let upload_uri = format!("/habits/{}/upload", created["id"].as_str().unwrap());

        let (status, habit) = send(&app, multipart_request(&upload_uri, "photo", "gym.jpg", b"jpeg")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habit["streak"], 1);
        assert_eq!(habit["isCompleted"], true);
        let image_url = habit["uploads"][0]["imageUrl"].as_str().unwrap().to_string();
        assert!(image_url.starts_with(&format!("/uploads/{}/", created["id"].as_str().unwrap())));

        // The stored image is served back
        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, &image_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"jpeg");

        // Second upload on the same day
        let (status, body) = send(&app, multipart_request(&upload_uri, "image", "again.jpg", b"jpeg")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, habit) = send(&app, empty_request(Method::DELETE, &upload_uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habit["streak"], 0);
        assert_eq!(habit["isCompleted"], false);
        assert!(habit["uploads"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, empty_request(Method::DELETE, &upload_uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_without_file() {
        let (_dir, server) = server("upload").await;
        let app = server.router();
        let created = create(&app, "Gym").await;
        let upload_uri = format!("/habits/{}/upload", created["id"].as_str().unwrap());

        let (status, body) =
            send(&app, multipart_request(&upload_uri, "caption", "note.txt", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No file uploaded");

        let (status, _) = send(&app, json_request(Method::POST, &upload_uri, json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_to_unknown_habit() {
        let (_dir, server) = server("upload").await;
        let app = server.router();
        let uri = format!("/habits/{}/upload", HabitId::new());

        let (status, _) = send(&app, multipart_request(&uri, "photo", "a.jpg", b"jpeg")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_toggle_mode_routes() {
        let (_dir, server) = server("toggle").await;
        let app = server.router();
        let created = create(&app, "Stretch").await;
        let id = created["id"].as_str().unwrap();

        let (status, habit) =
            send(&app, empty_request(Method::PATCH, &format!("/habits/{id}/complete"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habit["isCompleted"], true);
        assert_eq!(habit["streak"], 1);

        let (status, habit) =
            send(&app, empty_request(Method::PATCH, &format!("/habits/{id}/complete"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habit["isCompleted"], false);
        assert_eq!(habit["streak"], 1);

        // Upload routes are not mounted in toggle mode
        let (status, _) = send(
            &app,
            multipart_request(&format!("/habits/{id}/upload"), "photo", "a.jpg", b"jpeg"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_security_headers_on_every_response() {
        let (_dir, server) = server("upload").await;
        let app = server.router();

        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, "/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        let csp = headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.starts_with("default-src 'self'"));
        assert!(csp.contains("script-src 'self' 'unsafe-inline' https://vercel.live"));
        assert!(csp.contains("connect-src 'self' https://vercel.live"));
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");

        let response = app
            .oneshot(empty_request(Method::GET, "/habits/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let dir = TempDir::new().unwrap();
        let args = || {
            Config::parse_from([
                "habit-tracker-api".into(),
                "--database".into(),
                dir.path().join("habits.db").into_os_string(),
            ])
        };

        let first = HabitTrackerServer::new(args()).await.expect("Failed to create first server");
        let created = create(&first.router(), "Persisted").await;
        drop(first);

        let second = HabitTrackerServer::new(args()).await.expect("Failed to create second server");
        let (status, fetched) = send(
            &second.router(),
            empty_request(Method::GET, &format!("/habits/{}", created["id"].as_str().unwrap())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Persisted");
    }
}
