//! Document upload.
//!
//! Reads a PDF or plain-text file, extracts its text, and stores it as an
//! immutable document row owned by the uploading user, optionally inside one
//! of their workspaces. A SHA-256 of the extracted body detects duplicate
//! uploads per user.

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::extract;
use crate::users;
use crate::workspace;

pub async fn run_upload(
    config: &Config,
    user_email: &str,
    path: &Path,
    workspace_name: Option<&str>,
) -> Result<()> {
    let content_type = match extract::content_type_for_path(path) {
        Some(ct) => ct,
        None => bail!(
            "unsupported file type: {} (supported: .pdf, .txt, .md)",
            path.display()
        ),
    };

    let bytes = std::fs::read(path)?;
    let body = extract::extract_text(&bytes, content_type)?;
    if body.trim().is_empty() {
        bail!("no extractable text in {}", path.display());
    }

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;

    let workspace_id = match workspace_name {
        Some(name) => match workspace::find_workspace(&pool, &user.id, name).await? {
            Some(id) => Some(id),
            None => {
                pool.close().await;
                bail!("workspace not found: {}", name);
            }
        },
        None => None,
    };

    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    let content_hash = format!("{:x}", hasher.finalize());

    let existing: Option<String> = sqlx::query_scalar(
        "SELECT id FROM documents WHERE user_id = ? AND content_hash = ?",
    )
    .bind(&user.id)
    .bind(&content_hash)
    .fetch_optional(&pool)
    .await?;

    if let Some(id) = existing {
        println!("already uploaded: identical content stored as document {}", id);
        pool.close().await;
        return Ok(());
    }

    let doc_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO documents (id, user_id, workspace_id, filename, content_type, body, content_hash, size_bytes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&doc_id)
    .bind(&user.id)
    .bind(&workspace_id)
    .bind(&filename)
    .bind(content_type)
    .bind(&body)
    .bind(&content_hash)
    .bind(bytes.len() as i64)
    .bind(now)
    .execute(&pool)
    .await?;

    println!("uploaded {}", filename);
    println!("  id: {}", doc_id);
    println!("  bytes: {}", bytes.len());
    if let Some(name) = workspace_name {
        println!("  workspace: {}", name);
    }
    println!("ok");

    pool.close().await;
    Ok(())
}
