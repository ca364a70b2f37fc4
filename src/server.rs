//! JSON HTTP API.
//!
//! Thin layer over the same functions the CLI uses. The fronting layer is
//! expected to authenticate the caller and pass the account email; this
//! server validates it against the user registry on every request.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/ask` | Answer a question over the caller's documents |
//! | `POST` | `/retrieve` | Context + citations, completion service untouched |
//! | `GET`  | `/documents` | List the caller's documents |
//! | `DELETE` | `/documents/{id}` | Delete one of the caller's documents |
//!
//! # Error Contract
//!
//! All error responses use the shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question too short" } }
//! ```
//!
//! Codes: `bad_request` (400), `forbidden` (403), `not_found` (404),
//! `service_unavailable` (503), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::ask::{self, AskRequest};
use crate::config::Config;
use crate::docs::{self, QueryScope};
use crate::models::{DocumentSummary, WebResult};
use crate::retrieve::Citation;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Starts the HTTP server on `[server].bind`. Runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/ask", post(handle_ask))
        .route("/retrieve", post(handle_retrieve))
        .route("/documents", get(handle_list_documents))
        .route("/documents/{id}", delete(handle_delete_document))
        .layer(cors)
        .with_state(state);

    println!("docqa server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
    }
}

/// Map pipeline errors onto the HTTP error contract. The pipeline reports
/// conditions as message text, so classification mirrors the wording used by
/// `users`, `docs`, `retrieve`, and `completion`.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("question too short") {
        app_error(StatusCode::BAD_REQUEST, "bad_request", msg)
    } else if msg.contains("unknown user") || msg.contains("not approved") {
        app_error(StatusCode::FORBIDDEN, "forbidden", msg)
    } else if msg.contains("not found") || msg.contains("no documents") {
        app_error(StatusCode::NOT_FOUND, "not_found", msg)
    } else if msg.contains("unavailable") {
        app_error(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
    } else {
        app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ask ============

/// Request schema for `/ask` and `/retrieve`, validated at the boundary
/// before anything reaches the retrieval routine.
#[derive(Deserialize)]
struct AskBody {
    user: String,
    question: String,
    #[serde(default)]
    document_id: Option<String>,
    #[serde(default)]
    workspace: Option<String>,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    web: bool,
}

impl AskBody {
    fn scope(&self) -> QueryScope {
        QueryScope {
            document_id: self.document_id.clone(),
            workspace: self.workspace.clone(),
        }
    }
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    model: String,
    citations: Vec<Citation>,
    web_sources: Vec<WebResult>,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Json<AskResponse>, AppError> {
    let request = AskRequest {
        user: body.user.clone(),
        question: body.question.clone(),
        scope: body.scope(),
        top_k: body.top_k,
        web: body.web,
    };

    let outcome = ask::answer_question(&state.config, &request)
        .await
        .map_err(classify_error)?;

    Ok(Json(AskResponse {
        answer: outcome.answer,
        model: outcome.model,
        citations: outcome.citations,
        web_sources: outcome.web_sources,
    }))
}

// ============ POST /retrieve ============

#[derive(Serialize)]
struct RetrieveResponse {
    context: String,
    citations: Vec<Citation>,
}

async fn handle_retrieve(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Json<RetrieveResponse>, AppError> {
    let retrieval = ask::retrieve_context(
        &state.config,
        &body.user,
        &body.question,
        &body.scope(),
        body.top_k,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(RetrieveResponse {
        context: retrieval.context,
        citations: retrieval.citations,
    }))
}

// ============ GET /documents ============

#[derive(Deserialize)]
struct UserQuery {
    user: String,
}

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<DocumentSummary>,
}

async fn handle_list_documents(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = docs::list_documents(&state.config, &query.user)
        .await
        .map_err(classify_error)?;
    Ok(Json(DocumentListResponse { documents }))
}

// ============ DELETE /documents/{id} ============

#[derive(Serialize)]
struct DeleteResponse {
    deleted: String,
}

async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    docs::delete_document(&state.config, &query.user, &id)
        .await
        .map_err(classify_error)?;
    Ok(Json(DeleteResponse { deleted: id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        let cases = [
            ("question too short: need at least 3", StatusCode::BAD_REQUEST),
            ("unknown user: a@b.c", StatusCode::FORBIDDEN),
            ("user not approved: a@b.c", StatusCode::FORBIDDEN),
            ("no documents found in scope", StatusCode::NOT_FOUND),
            ("document not found: xyz", StatusCode::NOT_FOUND),
            ("workspace not found: w", StatusCode::NOT_FOUND),
            ("completion service unavailable, retry later", StatusCode::SERVICE_UNAVAILABLE),
            ("something else broke", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (msg, expected) in cases {
            let err = classify_error(anyhow::anyhow!(msg.to_string()));
            assert_eq!(err.status, expected, "message: {}", msg);
        }
    }
}
