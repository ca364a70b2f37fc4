//! Workspace management.
//!
//! A workspace is a per-user named grouping of documents used to scope
//! multi-document questions. Deleting a workspace detaches its documents
//! instead of deleting them.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::users;

/// Resolve a workspace by owner + name.
pub async fn find_workspace(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
) -> Result<Option<String>> {
    let id: Option<String> =
        sqlx::query_scalar("SELECT id FROM workspaces WHERE user_id = ? AND name = ?")
            .bind(user_id)
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(id)
}

pub async fn run_ws_create(config: &Config, user_email: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("workspace name must not be empty");
    }

    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;

    if find_workspace(&pool, &user.id, name).await?.is_some() {
        pool.close().await;
        bail!("workspace already exists: {}", name);
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();
    sqlx::query("INSERT INTO workspaces (id, user_id, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&user.id)
        .bind(name)
        .bind(now)
        .execute(&pool)
        .await?;

    println!("created workspace {}", name);
    pool.close().await;
    Ok(())
}

pub async fn run_ws_list(config: &Config, user_email: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;

    let rows = sqlx::query(
        r#"
        SELECT w.name, COUNT(d.id) AS doc_count
        FROM workspaces w
        LEFT JOIN documents d ON d.workspace_id = w.id
        WHERE w.user_id = ?
        GROUP BY w.id
        ORDER BY w.created_at ASC
        "#,
    )
    .bind(&user.id)
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        println!("No workspaces.");
        pool.close().await;
        return Ok(());
    }

    for row in rows {
        let name: String = row.get("name");
        let doc_count: i64 = row.get("doc_count");
        println!("{}  ({} documents)", name, doc_count);
    }

    pool.close().await;
    Ok(())
}

pub async fn run_ws_delete(config: &Config, user_email: &str, name: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let user = users::require_approved(&pool, user_email).await?;

    let ws_id = match find_workspace(&pool, &user.id, name).await? {
        Some(id) => id,
        None => {
            pool.close().await;
            bail!("workspace not found: {}", name);
        }
    };

    let mut tx = pool.begin().await?;
    // Documents survive their workspace.
    sqlx::query("UPDATE documents SET workspace_id = NULL WHERE workspace_id = ?")
        .bind(&ws_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM workspaces WHERE id = ?")
        .bind(&ws_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    println!("deleted workspace {}", name);
    pool.close().await;
    Ok(())
}
