//! User repository for database operations.
//!
//! Queries are checked at runtime and mapped through [`UserRow`], so the crate
//! builds without a live database.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use rollcall_core::{Email, PageRequest, UserId, total_pages};

use super::RepositoryError;
use crate::models::{NewUser, User, UserChanges, UserPage};

/// Columns returned by every query that yields a full user.
const SELECT_COLUMNS: &str = "id, name, email, phone, created_at, updated_at";

/// Upper bound on search results; search is not paginated.
pub const SEARCH_LIMIT: i64 = 50;

/// Raw `users` row as stored.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (name, email, phone) VALUES ($1, $2, $3) RETURNING {SELECT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(new_user.name.as_str())
            .bind(&new_user.email)
            .bind(new_user.phone.as_ref().map(|p| p.as_str()))
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "email"))?;

        row.try_into()
    }

    /// Fetch one page of users, newest id first.
    ///
    /// The total comes from a separate `COUNT(*)` and may drift from the
    /// page under concurrent writes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn find_all(&self, page: PageRequest) -> Result<UserPage, RepositoryError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users ORDER BY id DESC LIMIT $1 OFFSET $2");

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(i64::from(page.limit()))
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        let data = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserPage {
            data,
            total,
            page: page.page(),
            limit: page.limit(),
            total_pages: total_pages(total, page.limit()),
        })
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Case-insensitive substring search over name and email.
    ///
    /// `text` is matched literally; LIKE wildcards in it are escaped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, text: &str) -> Result<Vec<User>, RepositoryError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM users \
             WHERE name ILIKE $1 OR email ILIKE $1 \
             ORDER BY id DESC LIMIT $2"
        );
        let pattern = format!("%{}%", escape_like(text));

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(pattern)
            .bind(SEARCH_LIMIT)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Apply a partial update and return the updated record.
    ///
    /// Only supplied fields are written; `updated_at` is always refreshed.
    /// With nothing supplied no write is issued and the current record is
    /// returned. `Ok(None)` means no row has this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let assignments = assignments(changes);
        if assignments.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut query = build_update(id, assignments);
        query
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "email"))?
            .map(User::try_from)
            .transpose()
    }

    /// Delete a user. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether an email is taken, optionally ignoring one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(
        &self,
        email: &Email,
        exclude: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = match exclude {
            Some(id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
                )
                .bind(email)
                .bind(id)
                .fetch_one(self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                    .bind(email)
                    .fetch_one(self.pool)
                    .await?
            }
        };

        Ok(exists)
    }
}

// =============================================================================
// Query helpers
// =============================================================================

/// Column assignments for the fields present in `changes`.
fn assignments(changes: &UserChanges) -> Vec<(&'static str, String)> {
    [
        ("name", changes.name.as_ref().map(|n| n.as_str().to_owned())),
        ("email", changes.email.as_ref().map(|e| e.as_str().to_owned())),
        ("phone", changes.phone.as_ref().map(|p| p.as_str().to_owned())),
    ]
    .into_iter()
    .filter_map(|(column, value)| value.map(|v| (column, v)))
    .collect()
}

/// Render `UPDATE users SET ... WHERE id = $n RETURNING ...`.
fn build_update(
    id: UserId,
    assignments: Vec<(&'static str, String)>,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("UPDATE users SET ");

    let mut set = query.separated(", ");
    for (column, value) in assignments {
        set.push(column);
        set.push_unseparated(" = ");
        set.push_bind_unseparated(value);
    }
    set.push("updated_at = CURRENT_TIMESTAMP");

    query.push(" WHERE id = ");
    query.push_bind(id);
    query.push(" RETURNING ");
    query.push(SELECT_COLUMNS);
    query
}

/// Escape `\`, `%` and `_` so `text` matches literally under `LIKE`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
