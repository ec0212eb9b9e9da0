use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Store-level error type.
/// Callers can branch on the known variants; anything the layer does not
/// recognize propagates unchanged as `Backend`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed filter/sort/patch shape. Rejected before any query is sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required single-record operation matched no row.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Unique constraint violated (e.g. duplicate user email).
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violated (e.g. child row with missing user).
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// Any other database/transport error, passed through as-is.
    #[error("Database error: {0}")]
    Backend(#[source] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Known constraint-violation kinds classified from a SQLSTATE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViolationKind {
    Unique,
    ForeignKey,
}

pub(crate) fn violation_kind(code: &str) -> Option<ViolationKind> {
    match code {
        UNIQUE_VIOLATION => Some(ViolationKind::Unique),
        FOREIGN_KEY_VIOLATION => Some(ViolationKind::ForeignKey),
        _ => None,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            let kind = db.code().as_deref().and_then(violation_kind);
            if let Some(kind) = kind {
                let constraint = db.constraint().unwrap_or("<unknown>").to_string();
                return match kind {
                    ViolationKind::Unique => StoreError::UniqueViolation { constraint },
                    ViolationKind::ForeignKey => StoreError::ForeignKeyViolation { constraint },
                };
            }
        }
        StoreError::Backend(err)
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, StoreError::ForeignKeyViolation { .. })
    }
}
