//! Embedded-PostgreSQL harness for tests and benchmarks.
//!
//! Spins up a bundled server, provisions a database, and yields a connection
//! descriptor in the same `key=value` form [`crate::Connection::open`] takes.

use postgresql_embedded::blocking::PostgreSQL;

/// A running embedded PostgreSQL instance.
///
/// Keep this alive for as long as the server is needed; pass it to
/// [`stop_postgres_embedded`] when done.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// Connection descriptor for the provisioned database.
    pub descriptor: String,
}

/// Set up an embedded PostgreSQL instance and create `db_name` on it.
///
/// # Errors
/// Returns an error if the bundled server cannot be set up or started, or if
/// database provisioning fails.
pub fn setup_postgres_embedded(db_name: &str) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup()?;
    postgresql.start()?;
    postgresql.create_database(db_name)?;

    let settings = postgresql.settings();
    let port = settings.port;
    let descriptor = format!(
        "host={} port={} user={} password={} dbname={}",
        settings.host, settings.port, settings.username, settings.password, db_name
    );

    Ok(EmbeddedPostgres {
        postgresql,
        port,
        descriptor,
    })
}

/// Stop a previously started embedded PostgreSQL instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { mut postgresql, .. } = postgres;
    let _ = postgresql.stop();
}
