//! Document listing, inspection, and deletion.
//!
//! Scope loading for the ask pipeline also lives here: a question runs
//! against one document, one workspace, or the user's whole library.
//! Unauthorized or missing documents yield an empty scope, never someone
//! else's data.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::chunk::chunk_words;
use crate::config::Config;
use crate::db;
use crate::models::DocumentSummary;
use crate::retrieve::DocumentInput;
use crate::users;
use crate::workspace;

/// Which documents a question runs against.
#[derive(Debug, Clone, Default)]
pub struct QueryScope {
    pub document_id: Option<String>,
    pub workspace: Option<String>,
}

impl QueryScope {
    /// A scope pinned to one document uses the single-context top-K default.
    pub fn is_single_document(&self) -> bool {
        self.document_id.is_some()
    }
}

/// Load the documents in scope for a user's question.
///
/// A document id that does not exist or belongs to another user resolves to
/// an empty scope. A named workspace that does not exist is an error (the
/// caller asked for something that is not there, not for "no results").
pub async fn load_scope(
    pool: &SqlitePool,
    user_id: &str,
    scope: &QueryScope,
) -> Result<Vec<DocumentInput>> {
    let rows = if let Some(ref doc_id) = scope.document_id {
        sqlx::query("SELECT id, filename, body FROM documents WHERE id = ? AND user_id = ?")
            .bind(doc_id)
            .bind(user_id)
            .fetch_all(pool)
            .await?
    } else if let Some(ref ws_name) = scope.workspace {
        let ws_id = match workspace::find_workspace(pool, user_id, ws_name).await? {
            Some(id) => id,
            None => bail!("workspace not found: {}", ws_name),
        };
        sqlx::query(
            "SELECT id, filename, body FROM documents WHERE workspace_id = ? ORDER BY created_at ASC",
        )
        .bind(&ws_id)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query("SELECT id, filename, body FROM documents WHERE user_id = ? ORDER BY created_at ASC")
            .bind(user_id)
            .fetch_all(pool)
            .await?
    };

    Ok(rows
        .iter()
        .map(|row| DocumentInput {
            id: row.get("id"),
            filename: row.get("filename"),
            content: row.get("body"),
        })
        .collect())
}

/// Core listing function returning structured data (used by CLI and server).
pub async fn list_documents(config: &Config, user_email: &str) -> Result<Vec<DocumentSummary>> {
    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;

    let rows = sqlx::query(
        r#"
        SELECT d.id, d.filename, d.content_type, d.size_bytes, d.created_at, w.name AS workspace
        FROM documents d
        LEFT JOIN workspaces w ON w.id = d.workspace_id
        WHERE d.user_id = ?
        ORDER BY d.created_at ASC
        "#,
    )
    .bind(&user.id)
    .fetch_all(&pool)
    .await?;

    let docs = rows
        .iter()
        .map(|row| DocumentSummary {
            id: row.get("id"),
            filename: row.get("filename"),
            content_type: row.get("content_type"),
            workspace: row.get("workspace"),
            size_bytes: row.get("size_bytes"),
            created_at: format_ts_iso(row.get("created_at")),
        })
        .collect();

    pool.close().await;
    Ok(docs)
}

/// Delete one of the user's documents. Deleting someone else's document (or a
/// nonexistent id) is "not found".
pub async fn delete_document(config: &Config, user_email: &str, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;

    let result = sqlx::query("DELETE FROM documents WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(&user.id)
        .execute(&pool)
        .await?;

    pool.close().await;

    if result.rows_affected() == 0 {
        bail!("document not found: {}", id);
    }
    Ok(())
}

pub async fn run_docs_list(config: &Config, user_email: &str) -> Result<()> {
    let docs = list_documents(config, user_email).await?;

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    for doc in &docs {
        println!("{}  {}", doc.id, doc.filename);
        println!("    type: {}", doc.content_type);
        if let Some(ref ws) = doc.workspace {
            println!("    workspace: {}", ws);
        }
        println!("    bytes: {}", doc.size_bytes);
        println!("    uploaded: {}", doc.created_at);
    }
    Ok(())
}

pub async fn run_docs_show(config: &Config, user_email: &str, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;

    let row = sqlx::query(
        "SELECT id, filename, content_type, body, size_bytes, created_at FROM documents WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(&user.id)
    .fetch_optional(&pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => {
            pool.close().await;
            bail!("document not found: {}", id);
        }
    };

    let body: String = row.get("body");
    let params = config.chunking.params()?;
    let chunk_count = chunk_words(&body, &params).len();

    println!("--- Document ---");
    println!("id:           {}", row.get::<String, _>("id"));
    println!("filename:     {}", row.get::<String, _>("filename"));
    println!("content_type: {}", row.get::<String, _>("content_type"));
    println!("bytes:        {}", row.get::<i64, _>("size_bytes"));
    println!("uploaded:     {}", format_ts_iso(row.get("created_at")));
    println!("chunks:       {} (derived, {} words / {} overlap)", chunk_count, params.size(), params.overlap());
    println!();
    println!("--- Body ---");
    println!("{}", body);

    pool.close().await;
    Ok(())
}

pub async fn run_docs_delete(config: &Config, user_email: &str, id: &str) -> Result<()> {
    delete_document(config, user_email, id).await?;
    println!("deleted {}", id);
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
