//! Data Access Layer
//!
//! Handlers talk to persistence through the [`Store`] trait. [`Db`] is the
//! PostgreSQL implementation, built on `sqlx` with connection pooling.

use async_trait::async_trait;
use sqlx::PgPool;
use tutor_core::{ProgressDirective, ProgressStatus};
use uuid::Uuid;

use crate::models::{ProgressRecord, Role, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence operations needed by the API.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a new account. Fails with [`StoreError::DuplicateEmail`] when
    /// the email is taken.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Upserts the learner's progress on a subtopic. A completed subtopic
    /// stays completed.
    async fn record_progress(
        &self,
        user_id: Uuid,
        directive: &ProgressDirective,
    ) -> Result<ProgressRecord, StoreError>;

    /// Lists a learner's progress, most recently updated first.
    async fn list_progress(&self, user_id: Uuid) -> Result<Vec<ProgressRecord>, StoreError>;
}

/// A wrapper around the `PgPool` to provide a clear data access interface.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Creates a new `Db` instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs all pending `sqlx` migrations.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for Db {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn record_progress(
        &self,
        user_id: Uuid,
        directive: &ProgressDirective,
    ) -> Result<ProgressRecord, StoreError> {
        let record = sqlx::query_as::<_, ProgressRecord>(
            r#"
            INSERT INTO topic_progress (user_id, subtopic_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, subtopic_id) DO UPDATE
            SET status = CASE
                    WHEN topic_progress.status = $4 THEN topic_progress.status
                    ELSE EXCLUDED.status
                END,
                updated_at = now()
            RETURNING user_id, subtopic_id, status, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&directive.subtopic_id)
        .bind(directive.status.as_str())
        .bind(ProgressStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_progress(&self, user_id: Uuid) -> Result<Vec<ProgressRecord>, StoreError> {
        let records = sqlx::query_as::<_, ProgressRecord>(
            r#"
            SELECT user_id, subtopic_id, status, updated_at
            FROM topic_progress
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory [`Store`] for handler tests.

    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        users: Mutex<Vec<User>>,
        progress: Mutex<Vec<ProgressRecord>>,
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn create_user(
            &self,
            email: &str,
            password_hash: &str,
            role: Role,
        ) -> Result<User, StoreError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
            let user = User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role,
                created_at: Utc::now(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.id == id).cloned())
        }

        async fn record_progress(
            &self,
            user_id: Uuid,
            directive: &ProgressDirective,
        ) -> Result<ProgressRecord, StoreError> {
            let mut progress = self.progress.lock().unwrap();
            let completed = ProgressStatus::Completed.as_str();
            let existing = progress
                .iter_mut()
                .find(|r| r.user_id == user_id && r.subtopic_id == directive.subtopic_id);
            let record = match existing {
                Some(record) => {
                    if record.status != completed {
                        record.status = directive.status.as_str().to_string();
                    }
                    record.updated_at = Utc::now();
                    record.clone()
                }
                None => {
                    let record = ProgressRecord {
                        user_id,
                        subtopic_id: directive.subtopic_id.clone(),
                        status: directive.status.as_str().to_string(),
                        updated_at: Utc::now(),
                    };
                    progress.push(record.clone());
                    record
                }
            };
            Ok(record)
        }

        async fn list_progress(&self, user_id: Uuid) -> Result<Vec<ProgressRecord>, StoreError> {
            let progress = self.progress.lock().unwrap();
            let mut records: Vec<ProgressRecord> = progress
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(records)
        }
    }

    #[tokio::test]
    async fn test_memory_store_keeps_completed_status() {
        let store = MemoryStore::default();
        let user = store
            .create_user("a@b.co", "hash", Role::Student)
            .await
            .unwrap();

        store
            .record_progress(user.id, &ProgressDirective::completed("t1"))
            .await
            .unwrap();
        let downgrade = ProgressDirective {
            status: ProgressStatus::InProgress,
            ..ProgressDirective::completed("t1")
        };
        let record = store.record_progress(user.id, &downgrade).await.unwrap();

        assert_eq!(record.status, "COMPLETADO");
        assert_eq!(store.list_progress(user.id).await.unwrap().len(), 1);
        assert!(matches!(
            store.create_user("a@b.co", "hash", Role::Student).await,
            Err(StoreError::DuplicateEmail)
        ));
    }
}
