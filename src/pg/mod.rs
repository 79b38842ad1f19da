//! PostgreSQL driver over the blocking `postgres` crate.
//!
//! This is the default [`Driver`] implementation. Command text is submitted
//! verbatim: row-returning commands go through prepare + query so statement
//! metadata supplies column names and type OIDs, counts go through `execute`,
//! and transaction control travels the simple protocol via `batch_execute`.

mod extract;

use postgres::config::Host;
use postgres::error::{DbError, SqlState};
use postgres::{Client, Config, NoTls};

use crate::driver::{Driver, DriverError, Link, LinkInfo, NoticeSink, RawResult};
use crate::results::Column;

/// Driver connecting over TCP (or unix socket) without TLS.
pub struct PgDriver;

impl Driver for PgDriver {
    fn connect(
        &self,
        descriptor: &str,
        notices: NoticeSink,
    ) -> Result<Box<dyn Link>, DriverError> {
        let mut config: Config = descriptor.parse().map_err(|e: postgres::Error| {
            DriverError::new(format!("invalid connection descriptor: {e}"))
        })?;

        let sink = notices.clone();
        config.notice_callback(move |notice: DbError| {
            sink.emit(&format!("{}:  {}\n", notice.severity(), notice.message()));
        });

        let mut client = config.connect(NoTls).map_err(map_error)?;

        // The blocking client does not expose the startup-message PID.
        let backend_pid: i32 = client
            .query_one("SELECT pg_backend_pid()", &[])
            .map_err(map_error)?
            .try_get(0)
            .map_err(map_error)?;

        let info = link_info(&config, backend_pid);
        Ok(Box::new(PgLink { client, info }))
    }
}

struct PgLink {
    client: Client,
    info: LinkInfo,
}

impl Link for PgLink {
    fn info(&self) -> &LinkInfo {
        &self.info
    }

    fn query(&mut self, command: &str) -> Result<RawResult, DriverError> {
        let stmt = self.client.prepare(command).map_err(map_error)?;
        let columns: Vec<Column> = stmt
            .columns()
            .iter()
            .map(|col| Column {
                name: col.name().to_string(),
                type_oid: col.type_().oid(),
            })
            .collect();

        let db_rows = self.client.query(&stmt, &[]).map_err(map_error)?;
        let mut rows = Vec::with_capacity(db_rows.len());
        for row in &db_rows {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(extract::extract_cell(row, idx).map_err(map_error)?);
            }
            rows.push(values);
        }

        Ok(RawResult { columns, rows })
    }

    fn execute(&mut self, command: &str) -> Result<u64, DriverError> {
        self.client.execute(command, &[]).map_err(map_error)
    }

    fn batch(&mut self, commands: &str) -> Result<(), DriverError> {
        self.client.batch_execute(commands).map_err(map_error)
    }
}

fn link_info(config: &Config, backend_pid: i32) -> LinkInfo {
    let host = match config.get_hosts().first() {
        Some(Host::Tcp(h)) => h.clone(),
        #[cfg(unix)]
        Some(Host::Unix(path)) => path.display().to_string(),
        None => String::new(),
    };
    LinkInfo {
        host,
        db_name: config.get_dbname().unwrap_or_default().to_string(),
        user_name: config.get_user().unwrap_or_default().to_string(),
        port: config.get_ports().first().copied().unwrap_or(5432),
        options: config.get_options().unwrap_or_default().to_string(),
        backend_pid,
    }
}

fn map_error(e: postgres::Error) -> DriverError {
    let poisoned = e.code() == Some(&SqlState::IN_FAILED_SQL_TRANSACTION);
    let mapped = match e.as_db_error() {
        Some(db) => DriverError::new(format!("{}: {}", db.severity(), db.message()))
            .with_sqlstate(db.code().code()),
        None => DriverError::new(e.to_string()),
    };
    if poisoned {
        mapped.poisoning_transaction()
    } else {
        mapped
    }
}
