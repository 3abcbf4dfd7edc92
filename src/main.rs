mod dto;
mod handlers;
mod models;
mod repository;
mod service;

use axum::{
    Router,
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};

use std::{env, sync::Arc};

use handlers::rest;
use repository::Repository;

use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use service::NoteService;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt::init();

    // Fetch env variables
    let db_path = env::var("NOTES_DB_PATH").unwrap_or_else(|_| "notes.db".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // Repository creation and migration
    let mut repo = Repository::new(&db_path).unwrap_or_else(|e| {
        tracing::error!("Failed to open database '{db_path}': {e}");
        panic!("failed to open database: {e}");
    });

    repo.migrate().unwrap_or_else(|e| {
        tracing::error!("Failed to migrate database: {e}");
        panic!("failed to migrate database: {e}");
    });

    // Service creation
    let service = Arc::new(NoteService::new(Arc::new(tokio::sync::Mutex::new(repo))));

    let router = app_router(service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind to address");
    let addr = listener.local_addr().unwrap();

    tracing::info!("Notes API server starting, listening on {}", addr);

    axum::serve(listener, router)
        .await
        .expect("failed to start server");
}

/// Full application router: versioned API, swagger UI, CORS and tracing.
fn app_router(service: Arc<NoteService>) -> Router {
    let api_router = Router::new()
        .route("/hello", get(rest::hello))
        .route("/notes", post(rest::create_note))
        .route("/notes/{id}", put(rest::update_note))
        .route("/notes/{id}", delete(rest::delete_note))
        .route("/notes/{id}", get(rest::get_one_note))
        .route("/notes", get(rest::get_all_notes))
        .with_state(service);

    Router::new()
        .nest("/api/v1", api_router)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", rest::ApiDoc::openapi()),
        )
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
}

/// Catch-all CORS: permissive headers on every response, preflight OPTIONS
/// short-circuited with 204 before route matching.
async fn cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
