//! Core data models for the document Q&A service.
//!
//! Persistent rows (users, workspaces, documents) live in SQLite; chunks and
//! scores are derived fresh for every question and never stored.

use serde::Serialize;

/// A registered user. Uploads and questions require `approved`.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct User {
    pub id: String,
    pub email: String,
    pub approved: bool,
    pub admin: bool,
    pub created_at: i64,
}

/// A user-defined grouping of documents used to scope multi-document queries.
#[derive(Debug, Clone, Serialize)]
#[allow(dead_code)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// A stored document. Immutable once stored except for deletion.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub workspace_id: Option<String>,
    pub filename: String,
    pub content_type: String,
    pub body: String,
    pub size_bytes: i64,
    pub created_at: i64,
}

/// Document listing row returned by the CLI and the HTTP API (no body).
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub workspace: Option<String>,
    pub size_bytes: i64,
    pub created_at: String, // ISO8601
}

/// A web search hit blended into the prompt when web search is enabled.
#[derive(Debug, Clone, Serialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}
