use std::collections::{BTreeMap, HashMap};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI32, Ordering},
};

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{Feedback, User};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers and
/// the authenticator interact with the data layer through this trait without
/// knowing the concrete implementation (Postgres, in-memory, etc.), so the
/// persistence mechanism is swappable.
///
/// Ownership authorization is NOT enforced here: every mutation takes
/// exactly the keys it operates on, and the calling handler is
/// responsible for checking that the acting user owns the target row before
/// invoking it.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError>;
    /// Fails with `AppError::DuplicateUser` when the username already exists;
    /// the write is transactional, so a collision leaves no partial row.
    async fn create_user(&self, user: User) -> Result<User, AppError>;
    /// Removes the user and all feedback rows they own in a single
    /// transaction. Returns false when no such user existed.
    async fn delete_user(&self, username: &str) -> Result<bool, AppError>;

    // --- Feedback ---
    async fn feedback_for_user(&self, username: &str) -> Result<Vec<Feedback>, AppError>;
    async fn find_feedback(&self, id: i32) -> Result<Option<Feedback>, AppError>;
    async fn create_feedback(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Feedback, AppError>;
    /// Returns the updated row, or None when the id is absent.
    async fn update_feedback(
        &self,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<Option<Feedback>, AppError>;
    /// Returns false when the id is absent.
    async fn delete_feedback(&self, id: i32) -> Result<bool, AppError>;

    /// Provisions the two tables if they do not exist yet. Called at startup
    /// in the Local environment; production schema management is external.
    async fn ensure_schema(&self) -> Result<(), AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "username, password, email, first_name, last_name";
const FEEDBACK_COLUMNS: &str = "id, title, content, username";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// create_user
    ///
    /// Inserts the user inside an explicit transaction. When the `users`
    /// primary key rejects the insert, the transaction is rolled back fully
    /// and the collision surfaces as `AppError::DuplicateUser`, a recoverable
    /// validation-level failure rather than a store error.
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password, email, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(created) => {
                tx.commit().await?;
                Ok(created)
            }
            Err(e) => {
                tx.rollback().await?;
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    Err(AppError::DuplicateUser)
                } else {
                    Err(AppError::Store(e))
                }
            }
        }
    }

    /// delete_user
    ///
    /// Cascade delete: the user's feedback rows go first, then the user row,
    /// both in one transaction so a failure leaves everything in place.
    async fn delete_user(&self, username: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM feedback WHERE username = $1")
            .bind(username)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn feedback_for_user(&self, username: &str) -> Result<Vec<Feedback>, AppError> {
        let rows = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE username = $1 ORDER BY id"
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_feedback(&self, id: i32) -> Result<Option<Feedback>, AppError> {
        let row = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create_feedback(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Feedback, AppError> {
        let row = sqlx::query_as::<_, Feedback>(&format!(
            "INSERT INTO feedback (title, content, username) \
             VALUES ($1, $2, $3) RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(title)
        .bind(content)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_feedback(
        &self,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<Option<Feedback>, AppError> {
        let row = sqlx::query_as::<_, Feedback>(&format!(
            "UPDATE feedback SET title = $2, content = $3 \
             WHERE id = $1 RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_feedback(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                username   VARCHAR(20) PRIMARY KEY,
                password   TEXT        NOT NULL,
                email      VARCHAR(50) NOT NULL,
                first_name VARCHAR(30) NOT NULL,
                last_name  VARCHAR(30) NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feedback (
                id       SERIAL PRIMARY KEY,
                title    TEXT NOT NULL,
                content  TEXT NOT NULL,
                username VARCHAR(20) NOT NULL REFERENCES users (username)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// MemoryRepository
///
/// In-memory implementation of the `Repository` trait. Backs the test suites
/// and lets handler logic run end-to-end without a database, the same way the
/// storage-free mock services do in comparable backends. Semantics mirror
/// PostgresRepository, including duplicate detection and cascade deletion.
#[derive(Default)]
pub struct MemoryRepository {
    users: Mutex<HashMap<String, User>>,
    feedback: Mutex<BTreeMap<i32, Feedback>>,
    next_id: AtomicI32,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1),
            ..Self::default()
        }
    }

    /// Number of stored users. Test-facing convenience.
    pub fn user_count(&self) -> usize {
        self.users.lock().expect("users lock poisoned").len()
    }

    /// Number of stored feedback rows. Test-facing convenience.
    pub fn feedback_count(&self) -> usize {
        self.feedback.lock().expect("feedback lock poisoned").len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().expect("users lock poisoned");
        Ok(users.get(username).cloned())
    }

    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.lock().expect("users lock poisoned");
        if users.contains_key(&user.username) {
            return Err(AppError::DuplicateUser);
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, AppError> {
        let mut users = self.users.lock().expect("users lock poisoned");
        let mut feedback = self.feedback.lock().expect("feedback lock poisoned");
        feedback.retain(|_, f| f.username != username);
        Ok(users.remove(username).is_some())
    }

    async fn feedback_for_user(&self, username: &str) -> Result<Vec<Feedback>, AppError> {
        let feedback = self.feedback.lock().expect("feedback lock poisoned");
        Ok(feedback
            .values()
            .filter(|f| f.username == username)
            .cloned()
            .collect())
    }

    async fn find_feedback(&self, id: i32) -> Result<Option<Feedback>, AppError> {
        let feedback = self.feedback.lock().expect("feedback lock poisoned");
        Ok(feedback.get(&id).cloned())
    }

    async fn create_feedback(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Feedback, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = Feedback {
            id,
            title: title.to_string(),
            content: content.to_string(),
            username: username.to_string(),
        };
        let mut feedback = self.feedback.lock().expect("feedback lock poisoned");
        feedback.insert(id, row.clone());
        Ok(row)
    }

    async fn update_feedback(
        &self,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<Option<Feedback>, AppError> {
        let mut feedback = self.feedback.lock().expect("feedback lock poisoned");
        Ok(feedback.get_mut(&id).map(|row| {
            row.title = title.to_string();
            row.content = content.to_string();
            row.clone()
        }))
    }

    async fn delete_feedback(&self, id: i32) -> Result<bool, AppError> {
        let mut feedback = self.feedback.lock().expect("feedback lock poisoned");
        Ok(feedback.remove(&id).is_some())
    }

    async fn ensure_schema(&self) -> Result<(), AppError> {
        Ok(())
    }
}
