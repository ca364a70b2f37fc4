//! User registry and admin approval.
//!
//! Registration creates an unapproved row; an admin flips the flag with
//! `dqa user approve`. Every upload and question resolves the caller through
//! [`require_approved`], so unapproved accounts can sign up but not use the
//! service.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::models::User;

/// Look up a user by email. Fails on unknown or unapproved accounts with
/// messages the server boundary classifies as 403.
pub async fn require_approved(pool: &SqlitePool, email: &str) -> Result<User> {
    let row = sqlx::query(
        "SELECT id, email, approved, admin, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => bail!("unknown user: {}", email),
    };

    let user = User {
        id: row.get("id"),
        email: row.get("email"),
        approved: row.get::<i64, _>("approved") != 0,
        admin: row.get::<i64, _>("admin") != 0,
        created_at: row.get("created_at"),
    };

    if !user.approved {
        bail!("user not approved: {}", email);
    }

    Ok(user)
}

pub async fn run_user_add(config: &Config, email: &str, admin: bool) -> Result<()> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        bail!("invalid email address: {}", email);
    }

    let pool = db::connect(config).await?;

    let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&pool)
        .await?;
    if exists {
        pool.close().await;
        bail!("user already registered: {}", email);
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();
    sqlx::query("INSERT INTO users (id, email, approved, admin, created_at) VALUES (?, ?, 0, ?, ?)")
        .bind(&id)
        .bind(&email)
        .bind(admin as i64)
        .bind(now)
        .execute(&pool)
        .await?;

    println!("registered {} (pending approval)", email);
    pool.close().await;
    Ok(())
}

pub async fn run_user_approve(config: &Config, email: &str) -> Result<()> {
    let email = email.trim().to_lowercase();
    let pool = db::connect(config).await?;

    let result = sqlx::query("UPDATE users SET approved = 1 WHERE email = ?")
        .bind(&email)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        pool.close().await;
        bail!("unknown user: {}", email);
    }

    println!("approved {}", email);
    pool.close().await;
    Ok(())
}

pub async fn run_user_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let rows = sqlx::query(
        "SELECT email, approved, admin, created_at FROM users ORDER BY created_at ASC",
    )
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        println!("No users registered.");
        pool.close().await;
        return Ok(());
    }

    for row in rows {
        let email: String = row.get("email");
        let approved: i64 = row.get("approved");
        let admin: i64 = row.get("admin");
        let status = if approved != 0 { "approved" } else { "pending" };
        let role = if admin != 0 { " (admin)" } else { "" };
        println!("{}  {}{}", email, status, role);
    }

    pool.close().await;
    Ok(())
}
