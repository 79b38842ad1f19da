use crate::connection::Connection;
use crate::error::SessionError;
use crate::results::ResultSet;

/// Where a [`Transaction`] is in its lifecycle.
///
/// `Committed` and `Aborted` are terminal. `Failed` means the backend marked
/// the transaction unusable mid-sequence; only an abort (explicit or on drop)
/// leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    Aborted,
    Failed,
}

/// A scoped unit of work on one [`Connection`].
///
/// `begin` issues `BEGIN` immediately; a `Transaction` value you hold is
/// always at least `Active`. If it goes out of scope while still `Active` (or
/// `Failed`), it rolls itself back, so no command sequence ever reaches the
/// backend permanently except through an explicit, successful
/// [`commit`](Transaction::commit).
///
/// ```no_run
/// use pg_session::{Connection, Transaction};
///
/// # fn main() -> Result<(), pg_session::SessionError> {
/// let conn = Connection::open("host=localhost user=postgres dbname=testing")?;
/// let mut txn = Transaction::begin(&conn, "demo")?;
/// let tables = txn.exec("SELECT * FROM pg_tables")?;
/// txn.process_notice(&format!("{} tables\n", tables.len()));
/// txn.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'conn> {
    conn: &'conn Connection,
    name: String,
    status: TransactionStatus,
}

impl<'conn> Transaction<'conn> {
    /// Begin a transaction on `conn`.
    ///
    /// The name appears in diagnostics only; it need not be unique.
    ///
    /// # Errors
    /// `TransactionError` if another transaction is already active on this
    /// connection, or if the backend rejects `BEGIN`.
    pub fn begin(conn: &'conn Connection, name: impl Into<String>) -> Result<Self, SessionError> {
        let name = name.into();
        if conn.transaction_active() {
            return Err(SessionError::TransactionError(format!(
                "cannot begin transaction {name:?}: another transaction is already active on this connection"
            )));
        }
        conn.link_batch("BEGIN").map_err(|e| {
            SessionError::TransactionError(format!("BEGIN failed for transaction {name:?}: {e}"))
        })?;
        conn.set_transaction_active(true);
        tracing::debug!(name = %name, "transaction started");
        Ok(Self {
            conn,
            name,
            status: TransactionStatus::Active,
        })
    }

    /// Diagnostic name given at begin.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Submit command text verbatim and materialize the rows it returns.
    ///
    /// A backend rejection leaves the transaction `Active` and usable, unless
    /// the backend itself marks the transaction unusable; then the status
    /// becomes `Failed` and every further `exec`/`execute`/`commit` fails
    /// immediately until the transaction is aborted.
    ///
    /// # Errors
    /// `QueryError` for backend rejections; `TransactionError` when called on
    /// a transaction that is no longer `Active`.
    pub fn exec(&mut self, command: &str) -> Result<ResultSet, SessionError> {
        self.ensure_active("exec")?;
        match self.conn.link_query(command) {
            Ok(raw) => Ok(ResultSet::from(raw)),
            Err(e) => Err(self.note_query_failure(e)),
        }
    }

    /// Submit command text verbatim and return the affected-row count.
    ///
    /// Same state contract as [`exec`](Transaction::exec).
    ///
    /// # Errors
    /// `QueryError` for backend rejections; `TransactionError` when called on
    /// a transaction that is no longer `Active`.
    pub fn execute(&mut self, command: &str) -> Result<u64, SessionError> {
        self.ensure_active("execute")?;
        match self.conn.link_execute(command) {
            Ok(count) => Ok(count),
            Err(e) => Err(self.note_query_failure(e)),
        }
    }

    /// Commit the transaction's work.
    ///
    /// On success the status becomes `Committed`. If the backend rejects the
    /// commit it has rolled the work back; the status becomes `Aborted` and
    /// `CommitError` is returned.
    ///
    /// # Errors
    /// `CommitError` on backend rejection; `TransactionError` when the
    /// transaction is not `Active`.
    pub fn commit(&mut self) -> Result<(), SessionError> {
        self.ensure_active("commit")?;
        match self.conn.link_batch("COMMIT") {
            Ok(()) => {
                self.status = TransactionStatus::Committed;
                self.conn.set_transaction_active(false);
                tracing::debug!(name = %self.name, "transaction committed");
                Ok(())
            }
            Err(e) => {
                // The backend rolls back a transaction whose commit it rejects.
                self.status = TransactionStatus::Aborted;
                self.conn.set_transaction_active(false);
                tracing::warn!(name = %self.name, error = %e, "commit rejected, transaction rolled back");
                Err(SessionError::CommitError(e))
            }
        }
    }

    /// Roll the transaction back, best-effort.
    ///
    /// A rollback failure is reported through the notice channel only;
    /// raising here would mask whatever put the transaction on this path.
    /// No-op on a transaction that is already `Committed` or `Aborted`.
    pub fn abort(&mut self) {
        match self.status {
            TransactionStatus::Active | TransactionStatus::Failed => {}
            TransactionStatus::Committed | TransactionStatus::Aborted => return,
        }
        if let Err(e) = self.conn.link_batch("ROLLBACK") {
            tracing::warn!(name = %self.name, error = %e, "rollback failed");
            self.conn
                .process_notice(&format!("failed to roll back transaction {:?}: {e}\n", self.name));
        } else {
            tracing::debug!(name = %self.name, "transaction aborted");
        }
        self.status = TransactionStatus::Aborted;
        self.conn.set_transaction_active(false);
    }

    /// Forward to the owning connection's
    /// [`process_notice`](Connection::process_notice); identical contract.
    pub fn process_notice(&self, text: &str) {
        self.conn.process_notice(text);
    }

    fn ensure_active(&self, operation: &str) -> Result<(), SessionError> {
        match self.status {
            TransactionStatus::Active => Ok(()),
            TransactionStatus::Failed => Err(SessionError::TransactionError(format!(
                "cannot {operation}: transaction {:?} is in a failed state and must be aborted",
                self.name
            ))),
            TransactionStatus::Committed | TransactionStatus::Aborted => {
                Err(SessionError::TransactionError(format!(
                    "cannot {operation}: transaction {:?} has already finished",
                    self.name
                )))
            }
        }
    }

    fn note_query_failure(&mut self, e: crate::driver::DriverError) -> SessionError {
        if e.is_transaction_poisoned() {
            self.status = TransactionStatus::Failed;
            tracing::warn!(name = %self.name, "backend marked transaction unusable");
        }
        SessionError::QueryError(e)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if matches!(
            self.status,
            TransactionStatus::Active | TransactionStatus::Failed
        ) {
            self.conn.process_notice(&format!(
                "transaction {:?} dropped without commit, rolling back\n",
                self.name
            ));
            self.abort();
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("name", &self.name)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
