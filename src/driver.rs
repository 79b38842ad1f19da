//! Boundary with the underlying driver/transport.
//!
//! The session core never speaks the wire protocol itself: it submits command
//! strings through a [`Link`] and receives either a [`RawResult`] or a
//! [`DriverError`]. The default implementation over the `postgres` crate lives
//! in [`crate::pg`]; tests substitute their own.

use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::results::Column;
use crate::value::CellValue;

/// The notice-processor callback installed on a connection.
pub type NoticeProcessor = Box<dyn FnMut(&str) + Send>;

/// Shared handle to the notice processor.
///
/// The connection owns one of these and hands the driver a clone at connect
/// time, so backend notices and caller-injected notices flow through the same
/// callback, and replacing the processor takes effect for both immediately.
#[derive(Clone)]
pub struct NoticeSink {
    inner: Arc<Mutex<NoticeProcessor>>,
}

impl NoticeSink {
    #[must_use]
    pub fn new(processor: NoticeProcessor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(processor)),
        }
    }

    /// Route one notice through the current processor.
    ///
    /// Never panics: a poisoned lock is recovered, since notice delivery runs
    /// on driver callbacks and during drop cleanup.
    pub fn emit(&self, text: &str) {
        let mut processor = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        (*processor)(text);
    }

    /// Replace the processor; all subsequent notices go to `processor`.
    pub fn replace(&self, processor: NoticeProcessor) {
        let mut slot = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = processor;
    }
}

impl std::fmt::Debug for NoticeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeSink").finish_non_exhaustive()
    }
}

/// A failure reported by the driver or the backend behind it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    sqlstate: Option<String>,
    transaction_poisoned: bool,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sqlstate: None,
            transaction_poisoned: false,
        }
    }

    #[must_use]
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    /// Mark this error as the backend's "transaction is unusable until
    /// rollback" report. The session core only reacts to this flag; which
    /// conditions raise it is backend-defined.
    #[must_use]
    pub fn poisoning_transaction(mut self) -> Self {
        self.transaction_poisoned = true;
        self
    }

    #[must_use]
    pub fn sqlstate(&self) -> Option<&str> {
        self.sqlstate.as_deref()
    }

    #[must_use]
    pub fn is_transaction_poisoned(&self) -> bool {
        self.transaction_poisoned
    }
}

/// Connection metadata captured when the link is established.
#[derive(Debug, Clone, Default)]
pub struct LinkInfo {
    pub host: String,
    pub db_name: String,
    pub user_name: String,
    pub port: u16,
    pub options: String,
    pub backend_pid: i32,
}

/// Rows and column metadata as materialized by the driver for one command.
#[derive(Debug, Clone, Default)]
pub struct RawResult {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Establishes backend links from opaque `key=value` connection descriptors.
pub trait Driver {
    /// Connect and hand back a live link.
    ///
    /// The notice sink is fixed at connect time because real drivers register
    /// their notice callback before the link exists; runtime replacement
    /// happens inside the sink, not here.
    fn connect(&self, descriptor: &str, notices: NoticeSink)
    -> Result<Box<dyn Link>, DriverError>;
}

/// One live backend link: a single sequential conversation.
///
/// Dropping the link releases the backend connection; there is no separate
/// close call.
pub trait Link: Send {
    /// Metadata captured at connect time.
    fn info(&self) -> &LinkInfo;

    /// Submit a command expected to describe rows (SELECT and friends).
    fn query(&mut self, command: &str) -> Result<RawResult, DriverError>;

    /// Submit a command and return the affected-row count.
    fn execute(&mut self, command: &str) -> Result<u64, DriverError>;

    /// Submit command text over the simple path, no result expected.
    /// Transaction control (BEGIN/COMMIT/ROLLBACK) travels this way.
    fn batch(&mut self, commands: &str) -> Result<(), DriverError>;
}
