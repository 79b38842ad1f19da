use std::cell::{Cell, RefCell};
use std::io::Write;

use crate::driver::{Driver, DriverError, Link, LinkInfo, NoticeSink, RawResult};
use crate::error::SessionError;

/// One live link to the backend.
///
/// Construction connects immediately and fails the whole construction if the
/// link cannot be established. The connection owns its link exclusively; a
/// [`crate::Transaction`] borrows it for the duration of a unit of work.
///
/// A `Connection` is a single sequential conversation: it can move between
/// threads but cannot be shared across them (`Send`, not `Sync`). Use separate
/// connections for concurrent work.
pub struct Connection {
    link: RefCell<Option<Box<dyn Link>>>,
    info: LinkInfo,
    notices: NoticeSink,
    txn_active: Cell<bool>,
}

impl Connection {
    /// Open a connection through the default PostgreSQL driver.
    ///
    /// `descriptor` is an opaque set of `key=value` pairs (e.g.
    /// `host=localhost user=postgres dbname=testing`) passed through verbatim
    /// to the driver.
    ///
    /// # Errors
    /// `ConnectError` if the descriptor is malformed, the backend is
    /// unreachable, or authentication is rejected.
    #[cfg(feature = "postgres")]
    pub fn open(descriptor: &str) -> Result<Self, SessionError> {
        Self::open_with(&crate::pg::PgDriver, descriptor)
    }

    /// Open a connection through an explicit driver.
    ///
    /// # Errors
    /// `ConnectError` on any driver-reported connect failure.
    pub fn open_with(driver: &dyn Driver, descriptor: &str) -> Result<Self, SessionError> {
        let notices = NoticeSink::new(Box::new(default_notice_processor));
        let link = driver
            .connect(descriptor, notices.clone())
            .map_err(SessionError::ConnectError)?;
        let info = link.info().clone();
        tracing::debug!(
            host = %info.host,
            db = %info.db_name,
            backend_pid = info.backend_pid,
            "connection opened"
        );
        Ok(Self {
            link: RefCell::new(Some(link)),
            info,
            notices,
            txn_active: Cell::new(false),
        })
    }

    /// True while the backend link is live.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.link.borrow().is_some()
    }

    /// Release the backend link. Idempotent; safe on an already-closed
    /// connection.
    pub fn close(&self) {
        if let Some(link) = self.link.borrow_mut().take() {
            tracing::debug!(db = %link.info().db_name, "connection closed");
            drop(link);
        }
    }

    /// Install a notice processor, replacing any prior one. It receives every
    /// warning and informational message the backend emits on this link, plus
    /// anything routed through [`Connection::process_notice`].
    pub fn set_notice_processor(&self, processor: impl FnMut(&str) + Send + 'static) {
        self.notices.replace(Box::new(processor));
    }

    /// Route caller-supplied text through the same path backend notices take.
    ///
    /// The trailing line terminator is the caller's obligation, matching the
    /// shape of backend-generated notices; it is not validated here.
    pub fn process_notice(&self, text: &str) {
        self.notices.emit(text);
    }

    /// Host of the backend, or an empty string once closed.
    #[must_use]
    pub fn host_name(&self) -> &str {
        if self.is_open() { &self.info.host } else { "" }
    }

    /// Database name, or an empty string once closed.
    #[must_use]
    pub fn db_name(&self) -> &str {
        if self.is_open() { &self.info.db_name } else { "" }
    }

    /// User name, or an empty string once closed.
    #[must_use]
    pub fn user_name(&self) -> &str {
        if self.is_open() {
            &self.info.user_name
        } else {
            ""
        }
    }

    /// Backend port, or 0 once closed.
    #[must_use]
    pub fn port(&self) -> u16 {
        if self.is_open() { self.info.port } else { 0 }
    }

    /// Driver options string, or an empty string once closed.
    #[must_use]
    pub fn options(&self) -> &str {
        if self.is_open() { &self.info.options } else { "" }
    }

    /// Process ID of the backend serving this link, or 0 once closed.
    #[must_use]
    pub fn backend_pid(&self) -> i32 {
        if self.is_open() {
            self.info.backend_pid
        } else {
            0
        }
    }

    pub(crate) fn notices(&self) -> &NoticeSink {
        &self.notices
    }

    pub(crate) fn transaction_active(&self) -> bool {
        self.txn_active.get()
    }

    pub(crate) fn set_transaction_active(&self, active: bool) {
        self.txn_active.set(active);
    }

    pub(crate) fn link_query(&self, command: &str) -> Result<RawResult, DriverError> {
        match self.link.borrow_mut().as_mut() {
            Some(link) => link.query(command),
            None => Err(closed_link_error()),
        }
    }

    pub(crate) fn link_execute(&self, command: &str) -> Result<u64, DriverError> {
        match self.link.borrow_mut().as_mut() {
            Some(link) => link.execute(command),
            None => Err(closed_link_error()),
        }
    }

    pub(crate) fn link_batch(&self, commands: &str) -> Result<(), DriverError> {
        match self.link.borrow_mut().as_mut() {
            Some(link) => link.batch(commands),
            None => Err(closed_link_error()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("open", &self.is_open())
            .field("db_name", &self.info.db_name)
            .field("backend_pid", &self.info.backend_pid)
            .finish_non_exhaustive()
    }
}

fn closed_link_error() -> DriverError {
    DriverError::new("connection is closed")
}

/// Default notice handling: write the text to the standard diagnostic stream.
fn default_notice_processor(text: &str) {
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(text.as_bytes());
}
