use thiserror::Error;

use crate::driver::DriverError;

/// Every failure this crate surfaces, one variant per failure class.
///
/// Variants that originate at the backend wrap the structured [`DriverError`]
/// so callers can reach the SQLSTATE; variants produced by this crate carry a
/// plain message.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend link could not be established (unreachable host, rejected
    /// authentication, malformed descriptor).
    #[error("connect error: {0}")]
    ConnectError(DriverError),

    /// Begin was rejected, a second transaction was attempted on a connection
    /// that already has one active, or a finished/failed transaction was asked
    /// to do more work.
    #[error("transaction error: {0}")]
    TransactionError(String),

    /// A submitted command was rejected by the backend.
    #[error("query error: {0}")]
    QueryError(DriverError),

    /// Commit was rejected; the backend rolled the transaction back.
    #[error("commit error: {0}")]
    CommitError(DriverError),

    /// Out-of-bounds row or column access on a result set.
    #[error("{0}")]
    RangeError(String),

    /// A column name lookup found no match.
    #[error("no such column: {0}")]
    ColumnNotFound(String),

    /// A field's content could not be decoded as the requested type.
    #[error("conversion error: {0}")]
    ConversionError(String),
}

impl SessionError {
    /// The backend's SQLSTATE for driver-originated errors, when reported.
    #[must_use]
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            SessionError::ConnectError(e)
            | SessionError::QueryError(e)
            | SessionError::CommitError(e) => e.sqlstate(),
            _ => None,
        }
    }
}
