//! `PostgreSQL` admin user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cartwright_core::{Email, UserId};

use super::{PgStore, RepositoryError, UserStore, map_write_error};
use crate::models::{Credentials, LoginState, User};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
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
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserAuthRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
    login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, created_at, updated_at
            FROM storefront.admin_user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Credentials)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserAuthRow>(
            r"
            SELECT id, email, created_at, updated_at, password_hash, login_attempts, lock_until
            FROM storefront.admin_user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(r) => {
                let credentials = Credentials {
                    password_hash: r.password_hash,
                    login: LoginState {
                        attempts: r.login_attempts,
                        lock_until: r.lock_until,
                    },
                };
                Ok(Some((User::try_from(r.user)?, credentials)))
            }
            None => Ok(None),
        }
    }

    async fn insert_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.admin_user (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, created_at, updated_at
            ",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "email already exists"))?;

        User::try_from(row)
    }

    async fn set_user_login_state(
        &self,
        id: UserId,
        state: LoginState,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE storefront.admin_user SET login_attempts = $2, lock_until = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(state.attempts)
        .bind(state.lock_until)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
