use async_trait::async_trait;
use sqlx::PgPool;

use crate::push::{Recipient, RecipientDirectory};

pub async fn upsert_token(db: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO fcm_tokens (token)
        VALUES ($1)
        ON CONFLICT (token)
        DO UPDATE SET updated_at = NOW()
        "#,
    )
    .bind(token)
    .execute(db)
    .await?;

    Ok(())
}

/// Returns whether a row was removed.
pub async fn delete_token(db: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM fcm_tokens WHERE token = $1")
        .bind(token)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_tokens(db: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT token
        FROM fcm_tokens
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn count_tokens(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM fcm_tokens")
        .fetch_one(db)
        .await
}

/// Reads the recipient set fresh from `fcm_tokens` on every alert.
#[derive(Clone)]
pub struct PgRecipientDirectory {
    db: PgPool,
}

impl PgRecipientDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipientDirectory for PgRecipientDirectory {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, sqlx::Error> {
        let tokens = list_tokens(&self.db).await?;
        Ok(tokens
            .into_iter()
            .filter(|token| !token.trim().is_empty())
            .map(Recipient)
            .collect())
    }
}
