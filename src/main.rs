use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

mod appstore;
mod models;
mod normalize;
mod preview;
mod scan;

use models::{PreviewRequest, PreviewResponse};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let app = Router::new()
        .route("/health", get(health))
        .route("/preview", post(preview_endpoint));

    let addr = std::env::var("LINK_PREVIEW_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn preview_endpoint(Json(req): Json<PreviewRequest>) -> Response {
    match preview::fetch_project_metadata(&req.url).await {
        Ok(meta) => {
            let response = PreviewResponse {
                title: meta.title,
                description: meta.description,
                image: meta.image,
                screenshots: meta.screenshots,
                source_url: req.url,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        // Only an invalid input URL reaches here; every other failure
        // degrades inside fetch_project_metadata.
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({"detail": e.to_string()}))).into_response(),
    }
}
