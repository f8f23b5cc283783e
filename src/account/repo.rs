//! Postgres access for accounts and contact records.
//!
//! Uniqueness is enforced by the storage constraints, never by
//! check-then-insert: concurrent duplicates surface as SQLSTATE 23505 and are
//! mapped to the same field-level errors a pre-existing duplicate produces.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::error::{ContactError, FieldErrors, RegisterError};
use crate::account::models::{ContactKind, ContactRecord, User};
use crate::account::resolver::LoginMethod;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Map a unique-constraint name to the registration form field it guards.
fn duplicate_field(err: &sqlx::Error) -> Option<(&'static str, &'static str)> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    match db_err.constraint() {
        Some("users_username_key") => Some(("username", "Username already exists")),
        Some("phone_numbers_phone_key") => Some(("phone", "Phone already exists")),
        Some("email_addresses_email_key") => Some(("email", "Email already exists")),
        _ => None,
    }
}

/// Validated registration data ready for the atomic insert.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
}

pub struct UserRepo;

impl UserRepo {
    /// Create the user row plus its contact records in one transaction.
    /// A duplicate username, phone or email aborts the whole registration;
    /// the losing side of a concurrent race gets the identical field error.
    ///
    /// # Errors
    /// [`RegisterError::Invalid`] with a field message for duplicates,
    /// [`RegisterError::Storage`] for anything else.
    pub async fn create_account(pool: &PgPool, account: NewAccount) -> Result<User, RegisterError> {
        let mut tx = pool
            .begin()
            .await
            .context("failed to begin registration transaction")?;

        let inserted = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (username, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .fetch_one(&mut *tx)
        .await;

        let user = match inserted {
            Ok(user) => user,
            Err(err) => {
                let _ = tx.rollback().await;
                return Err(map_insert_error(err, "failed to insert user"));
            }
        };

        let phone_insert = sqlx::query("INSERT INTO phone_numbers (user_id, phone) VALUES ($1, $2)")
            .bind(user.id)
            .bind(&account.phone)
            .execute(&mut *tx)
            .await;
        if let Err(err) = phone_insert {
            let _ = tx.rollback().await;
            return Err(map_insert_error(err, "failed to insert phone record"));
        }

        if let Some(email) = &account.email {
            let email_insert =
                sqlx::query("INSERT INTO email_addresses (user_id, email) VALUES ($1, $2)")
                    .bind(user.id)
                    .bind(email)
                    .execute(&mut *tx)
                    .await;
            if let Err(err) = email_insert {
                let _ = tx.rollback().await;
                return Err(map_insert_error(err, "failed to insert email record"));
            }
        }

        tx.commit()
            .await
            .context("failed to commit registration transaction")?;

        Ok(user)
    }

    /// Single lookup in the namespace `method` resolved to. When a relaxed
    /// deployment lets a contact value match several rows, the lowest record
    /// id wins so resolution stays deterministic.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_login(
        pool: &PgPool,
        method: LoginMethod,
        key: &str,
    ) -> Result<Option<User>> {
        let query = match method {
            LoginMethod::Phone => {
                r"
                SELECT u.* FROM users u
                JOIN phone_numbers p ON p.user_id = u.id
                WHERE p.phone = $1
                ORDER BY p.id
                LIMIT 1
                "
            }
            LoginMethod::Email => {
                r"
                SELECT u.* FROM users u
                JOIN email_addresses e ON e.user_id = u.id
                WHERE e.email = $1
                ORDER BY e.id
                LIMIT 1
                "
            }
            LoginMethod::Username => "SELECT * FROM users WHERE username = $1",
        };

        sqlx::query_as::<_, User>(query)
            .bind(key)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("failed to look up user by {method}"))
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to look up user by id")
    }

    /// # Errors
    /// Returns an error if the update fails.
    pub async fn set_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(pool)
            .await
            .context("failed to update password hash")?;
        Ok(())
    }
}

fn map_insert_error(err: sqlx::Error, context: &'static str) -> RegisterError {
    if is_unique_violation(&err) {
        if let Some((field, message)) = duplicate_field(&err) {
            let mut errors = FieldErrors::new();
            errors.add(field, message);
            return RegisterError::Invalid(errors);
        }
    }
    RegisterError::Storage(anyhow::Error::new(err).context(context))
}

pub struct ContactRepo;

impl ContactRepo {
    /// Insert a phone record for `user_id`. Relies on the unique constraint,
    /// so exactly one of two concurrent identical inserts succeeds.
    ///
    /// # Errors
    /// [`ContactError::Duplicate`] when the number is already claimed.
    pub async fn add_phone(
        pool: &PgPool,
        user_id: Uuid,
        phone: &str,
    ) -> Result<ContactRecord, ContactError> {
        Self::add(pool, user_id, ContactKind::Phone, phone).await
    }

    /// Insert an email record for `user_id`.
    ///
    /// # Errors
    /// [`ContactError::Duplicate`] when the address is already claimed.
    pub async fn add_email(
        pool: &PgPool,
        user_id: Uuid,
        email: &str,
    ) -> Result<ContactRecord, ContactError> {
        Self::add(pool, user_id, ContactKind::Email, email).await
    }

    async fn add(
        pool: &PgPool,
        user_id: Uuid,
        kind: ContactKind,
        value: &str,
    ) -> Result<ContactRecord, ContactError> {
        let query = format!(
            "INSERT INTO {table} (user_id, {column}) VALUES ($1, $2) RETURNING *",
            table = kind.table(),
            column = kind.value_column(),
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(value)
            .fetch_one(pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ContactError::Duplicate(kind)
                } else {
                    ContactError::Storage(
                        anyhow::Error::new(err).context("failed to insert contact record"),
                    )
                }
            })?;

        ContactRecord::from_row(kind, &row)
            .map_err(|err| ContactError::Storage(anyhow::Error::new(err)))
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find(pool: &PgPool, kind: ContactKind, id: i64) -> Result<Option<ContactRecord>> {
        let query = format!("SELECT * FROM {} WHERE id = $1", kind.table());
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to look up contact record")?;

        row.map(|row| ContactRecord::from_row(kind, &row))
            .transpose()
            .context("failed to decode contact record")
    }

    /// Record lookup scoped to its owner, for the verification-request flow.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        kind: ContactKind,
        id: i64,
    ) -> Result<Option<ContactRecord>> {
        let query = format!(
            "SELECT * FROM {} WHERE id = $1 AND user_id = $2",
            kind.table()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .context("failed to look up contact record")?;

        row.map(|row| ContactRecord::from_row(kind, &row))
            .transpose()
            .context("failed to decode contact record")
    }

    /// All contact records owned by a user, phones first, each kind ordered
    /// by creation.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ContactRecord>> {
        let mut records = Vec::new();
        for kind in [ContactKind::Phone, ContactKind::Email] {
            let query = format!(
                "SELECT * FROM {} WHERE user_id = $1 ORDER BY id",
                kind.table()
            );
            let rows = sqlx::query(&query)
                .bind(user_id)
                .fetch_all(pool)
                .await
                .context("failed to list contact records")?;
            for row in rows {
                records.push(
                    ContactRecord::from_row(kind, &row)
                        .context("failed to decode contact record")?,
                );
            }
        }
        Ok(records)
    }

    /// Flip the verified flag. Idempotent: re-verifying an already-verified
    /// record is a no-op.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn mark_verified(pool: &PgPool, kind: ContactKind, id: i64) -> Result<()> {
        let query = format!("UPDATE {} SET is_verified = TRUE WHERE id = $1", kind.table());
        sqlx::query(&query)
            .bind(id)
            .execute(pool)
            .await
            .context("failed to mark contact record verified")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    fn unique_violation(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
            constraint: Some(constraint),
        }))
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        assert!(is_unique_violation(&unique_violation("users_username_key")));

        let other = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
            constraint: None,
        }));
        assert!(!is_unique_violation(&other));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn duplicate_constraints_map_to_fields() {
        let cases = [
            ("users_username_key", "username"),
            ("phone_numbers_phone_key", "phone"),
            ("email_addresses_email_key", "email"),
        ];
        for (constraint, field) in cases {
            let (mapped, _) = duplicate_field(&unique_violation(constraint)).expect("mapped");
            assert_eq!(mapped, field);
        }
        assert!(duplicate_field(&unique_violation("something_else")).is_none());
    }

    #[test]
    fn map_insert_error_produces_field_errors() {
        let err = map_insert_error(unique_violation("phone_numbers_phone_key"), "ctx");
        match err {
            RegisterError::Invalid(errors) => {
                assert_eq!(errors.get("phone"), Some("Phone already exists"));
            }
            RegisterError::Storage(_) => panic!("expected field error"),
        }
    }
}
