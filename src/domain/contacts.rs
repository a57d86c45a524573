use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub phone_number: String,
}

impl NewContact {
    /// Trimmed copy, or `None` if either field is blank.
    pub fn normalized(&self) -> Option<Self> {
        let name = self.name.trim();
        let phone_number = self.phone_number.trim();
        if name.is_empty() || phone_number.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            phone_number: phone_number.to_string(),
        })
    }
}

pub async fn list_contacts(db: &PgPool) -> Result<Vec<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, name, phone_number, created_at
        FROM contacts
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn insert_contact(db: &PgPool, contact: &NewContact) -> Result<Contact, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (name, phone_number)
        VALUES ($1, $2)
        RETURNING id, name, phone_number, created_at
        "#,
    )
    .bind(&contact.name)
    .bind(&contact.phone_number)
    .fetch_one(db)
    .await
}
