//! Blocking PostgreSQL session layer: guarded transactions and self-contained
//! result sets over a pluggable driver link.
//!
//! The core contract: a [`Transaction`] that never reached a successful
//! [`commit`](Transaction::commit) rolls itself back on every exit path, so
//! forgetting to finalize a unit of work can never silently commit partial
//! state. A [`ResultSet`] is a private copy of what one command returned and
//! outlives the connection and transaction that produced it.
//!
//! ```no_run
//! use pg_session::{Connection, Transaction};
//!
//! # fn main() -> Result<(), pg_session::SessionError> {
//! let conn = Connection::open("host=localhost user=postgres dbname=testing")?;
//! let mut txn = Transaction::begin(&conn, "report")?;
//! let tables = txn.exec("SELECT * FROM pg_tables")?;
//! for row in &tables {
//!     let name: String = row.field(0)?.to()?;
//!     println!("{}\t{name}", row.num());
//! }
//! txn.commit()?;
//! # Ok(())
//! # }
//! ```
//!
//! The wire protocol itself belongs to the driver behind the
//! [`driver::Driver`] / [`driver::Link`] boundary; the default implementation
//! ([`pg::PgDriver`], feature `postgres`) rides the `postgres` crate.

mod connection;
mod error;
mod transaction;

pub mod driver;
pub mod results;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pg;

#[cfg(feature = "test-utils-postgres")]
pub mod test_utils;

pub use connection::Connection;
pub use error::SessionError;
pub use results::{Column, Field, ResultSet, Row, RowRef, Rows};
pub use transaction::{Transaction, TransactionStatus};
pub use value::{CellValue, FromCell};

/// Commonly used items in one import.
pub mod prelude {
    pub use crate::connection::Connection;
    pub use crate::error::SessionError;
    pub use crate::results::{Field, ResultSet, Row, RowRef};
    pub use crate::transaction::{Transaction, TransactionStatus};
    pub use crate::value::{CellValue, FromCell};
}
