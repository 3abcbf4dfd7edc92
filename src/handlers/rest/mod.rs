use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{
        CreateNoteRequest, ErrorResponse, HelloResponse, NoteResponse, NotesResponse,
        UpdateNoteRequest,
    },
    service::{NoteService, NoteServiceError},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        hello,
        create_note,
        update_note,
        delete_note,
        get_one_note,
        get_all_notes
    ),
    components(schemas(
        NoteResponse,
        NotesResponse,
        CreateNoteRequest,
        UpdateNoteRequest,
        ErrorResponse,
        HelloResponse
    )),
    tags(
        (name = "notes", description = "Notes management API"),
        (name = "testing", description = "Liveness probes")
    ),
    servers(
        (url = "/api/v1")
    )
)]
pub struct ApiDoc;

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

fn note_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Note not found".to_string(),
        }),
    )
        .into_response()
}

fn internal_error(error: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/hello",
    responses(
        (status = 200, description = "API is up", body = HelloResponse)
    ),
    tag = "testing"
)]
#[debug_handler]
pub async fn hello() -> Response {
    (
        StatusCode::OK,
        Json(HelloResponse {
            message: "Hello, World!".to_string(),
            status: "API is running".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 400, description = "Missing or empty title", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.create_note(payload).await {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(NoteServiceError::Validation(message)) => bad_request(message),
        Err(e) => {
            tracing::error!("failed to create note entry: {e}");
            internal_error("Failed to create note")
        }
    }
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 400, description = "Malformed body or empty title", body = ErrorResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.update_note(&id, payload).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => note_not_found(),
        Err(NoteServiceError::Validation(message)) => bad_request(message),
        Err(e) => {
            tracing::error!("failed to update note entry: {e}");
            internal_error("Failed to update note")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID")
    ),
    responses(
        (status = 204, description = "Note deleted successfully"),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> Response {
    match service.delete_note(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => note_not_found(),
        Err(e) => {
            tracing::error!("failed to delete note entry: {e}");
            internal_error("Failed to delete note")
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> Response {
    match service.get_one_note(&id).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => note_not_found(),
        Err(e) => {
            tracing::error!("failed to get note entry: {e}");
            internal_error("Failed to get note")
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "All stored notes", body = NotesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(State(service): State<Arc<NoteService>>) -> Response {
    match service.get_all_notes().await {
        Ok(notes) => (StatusCode::OK, Json(notes)).into_response(),
        Err(e) => {
            tracing::error!("failed to get note entries: {e}");
            internal_error("Failed to get all notes")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::{Method, StatusCode};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use crate::repository::Repository;
    use crate::service::NoteService;

    async fn spawn_test_server() -> (String, TempDir) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut repo = Repository::new(dir.path().join("notes.db")).expect("failed to open db");
        repo.migrate().expect("failed to migrate db");

        let service = Arc::new(NoteService::new(Arc::new(tokio::sync::Mutex::new(repo))));
        let router = crate::app_router(service);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{addr}/api/v1"), dir)
    }

    #[tokio::test]
    async fn hello_reports_api_running() {
        let (base_url, _dir) = spawn_test_server().await;

        let resp = reqwest::get(format!("{base_url}/hello")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Hello, World!");
        assert_eq!(body["status"], "API is running");
    }

    #[tokio::test]
    async fn full_note_lifecycle() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        // Create
        let resp = client
            .post(format!("{base_url}/notes"))
            .json(&json!({"title": "T", "content": "C"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = resp.json().await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());
        assert_eq!(created["title"], "T");
        assert_eq!(created["content"], "C");
        assert_eq!(created["created_at"], created["updated_at"]);

        // Fetch it back
        let resp = reqwest::get(format!("{base_url}/notes/{id}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: Value = resp.json().await.unwrap();
        assert_eq!(fetched["title"], "T");
        assert_eq!(fetched["content"], "C");

        // Partial update: content only
        let resp = client
            .put(format!("{base_url}/notes/{id}"))
            .json(&json!({"content": "C2"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Value = resp.json().await.unwrap();
        assert_eq!(updated["title"], "T");
        assert_eq!(updated["content"], "C2");
        assert_ne!(updated["updated_at"], created["updated_at"]);

        // Delete
        let resp = client
            .delete(format!("{base_url}/notes/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        // Gone
        let resp = reqwest::get(format!("{base_url}/notes/{id}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_without_title_is_rejected() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base_url}/notes"))
            .json(&json!({"content": "no title"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client
            .post(format!("{base_url}/notes"))
            .json(&json!({"title": "", "content": "empty title"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        // Nothing was persisted.
        let resp = reqwest::get(format!("{base_url}/notes")).await.unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["notes"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn list_returns_most_recently_updated_first() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let mut ids = Vec::new();
        for title in ["A", "B"] {
            let resp = client
                .post(format!("{base_url}/notes"))
                .json(&json!({"title": title}))
                .send()
                .await
                .unwrap();
            let note: Value = resp.json().await.unwrap();
            ids.push(note["id"].as_str().unwrap().to_string());
        }

        let resp = reqwest::get(format!("{base_url}/notes")).await.unwrap();
        let body: Value = resp.json().await.unwrap();
        let titles: Vec<&str> = body["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["B", "A"]);

        // Updating A moves it back to the front.
        client
            .put(format!("{base_url}/notes/{}", ids[0]))
            .json(&json!({"content": "touched"}))
            .send()
            .await
            .unwrap();

        let resp = reqwest::get(format!("{base_url}/notes")).await.unwrap();
        let body: Value = resp.json().await.unwrap();
        let titles: Vec<&str> = body["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[tokio::test]
    async fn update_with_malformed_body_is_rejected() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base_url}/notes"))
            .json(&json!({"title": "T"}))
            .send()
            .await
            .unwrap();
        let note: Value = resp.json().await.unwrap();
        let id = note["id"].as_str().unwrap();

        let resp = client
            .put(format!("{base_url}/notes/{id}"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client
            .put(format!("{base_url}/notes/{id}"))
            .json(&json!({"title": ""}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_ids_return_not_found() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = reqwest::get(format!("{base_url}/notes/no-such-id"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Note not found");

        let resp = client
            .delete(format!("{base_url}/notes/no-such-id"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .put(format!("{base_url}/notes/no-such-id"))
            .json(&json!({"content": "x"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_cors_headers() {
        let (base_url, _dir) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .request(Method::OPTIONS, format!("{base_url}/notes"))
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers()["access-control-allow-origin"].to_str().unwrap(),
            "*"
        );
        assert_eq!(
            resp.headers()["access-control-allow-methods"]
                .to_str()
                .unwrap(),
            "GET, POST, PUT, DELETE, OPTIONS"
        );

        // Plain responses carry the headers too.
        let resp = reqwest::get(format!("{base_url}/notes")).await.unwrap();
        assert_eq!(
            resp.headers()["access-control-allow-origin"].to_str().unwrap(),
            "*"
        );
    }
}
