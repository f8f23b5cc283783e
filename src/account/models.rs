use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

/// Namespace a contact record lives in. The textual tag is exactly five
/// characters so opaque references can be split without a separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Phone,
    Email,
}

impl ContactKind {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    /// Table holding records of this kind.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Phone => "phone_numbers",
            Self::Email => "email_addresses",
        }
    }

    /// Value column inside [`Self::table`].
    #[must_use]
    pub const fn value_column(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for ContactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// An account row. The password hash never leaves this struct; handlers
/// serialize their own response types.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A claimed phone number or email address owned by one user. `value` is
/// stored normalized; `is_verified` flips only through token validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: ContactKind,
    pub value: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl ContactRecord {
    /// Row mapper; the kind is injected by the repo since each kind has its
    /// own table.
    pub(crate) fn from_row(kind: ContactKind, row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            kind,
            value: row.try_get(kind.value_column())?,
            is_verified: row.try_get("is_verified")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_five_chars() {
        assert_eq!(ContactKind::Phone.tag().len(), 5);
        assert_eq!(ContactKind::Email.tag().len(), 5);
    }

    #[test]
    fn kind_round_trips_through_tag() {
        for kind in [ContactKind::Phone, ContactKind::Email] {
            assert_eq!(ContactKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ContactKind::from_tag("pager"), None);
    }
}
