//! User records
//!
//! Identity itself is owned by the credential tables in `api::auth`; this
//! table only anchors ownership of flashlights and credentials.

use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Registered collection owner
#[derive(Debug, Clone)]
pub struct User {
    pub guid: Uuid,
    pub email: String,
}

/// Create a user with a fresh identifier
pub async fn create_user(pool: &SqlitePool, email: &str) -> Result<User> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::InvalidInput("email must not be empty".to_string()));
    }

    let user = User {
        guid: Uuid::new_v4(),
        email: email.to_string(),
    };

    sqlx::query("INSERT INTO users (guid, email) VALUES (?, ?)")
        .bind(user.guid.to_string())
        .bind(&user.email)
        .execute(pool)
        .await?;

    Ok(user)
}

/// Load a user by identifier
pub async fn load_user(pool: &SqlitePool, guid: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT guid, email FROM users WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(User {
                guid: Uuid::parse_str(&guid_str)
                    .map_err(|e| Error::Internal(format!("Corrupt user id: {}", e)))?,
                email: row.get("email"),
            }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_load_user() {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init_database(&dir.path().join("users.db"))
            .await
            .expect("Database initialization failed");

        let user = create_user(&pool, "collector@example.com").await.unwrap();
        let loaded = load_user(&pool, user.guid)
            .await
            .unwrap()
            .expect("User not found");

        assert_eq!(loaded.email, "collector@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init_database(&dir.path().join("users.db"))
            .await
            .unwrap();

        create_user(&pool, "dup@example.com").await.unwrap();
        assert!(create_user(&pool, "dup@example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_blank_email_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init_database(&dir.path().join("users.db"))
            .await
            .unwrap();

        assert!(matches!(
            create_user(&pool, "  ").await,
            Err(Error::InvalidInput(_))
        ));
    }
}
