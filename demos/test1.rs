//! End-to-end walkthrough of the connection / transaction / result lifecycle.
//!
//! Usage: test1 [connect-descriptor]
//!
//! The descriptor is a set of `key=value` connection options, e.g.
//! `dbname=template1` or `host=foo.bar.net user=smith`.

use std::process::ExitCode;

use pg_session::{Connection, SessionError, Transaction};

fn run(descriptor: &str) -> Result<(), SessionError> {
    // Construction fails outright if the link cannot be established.
    let conn = Connection::open(descriptor)?;
    assert!(conn.is_open());

    // Notices go to stderr by default; install our own processor anyway to
    // show how it is replaced.
    conn.set_notice_processor(|msg| eprint!("{msg}"));

    // Caller-supplied text takes the same path as backend notices. The
    // trailing newline is our obligation.
    conn.process_notice("connection created\n");

    let host = if conn.host_name().is_empty() {
        "<local>"
    } else {
        conn.host_name()
    };
    conn.process_notice(&format!(
        "database={}, username={}, hostname={}, port={}, options='{}', backendpid={}\n",
        conn.db_name(),
        conn.user_name(),
        host,
        conn.port(),
        conn.options(),
        conn.backend_pid(),
    ));

    // Begin a transaction acting on our connection.
    let mut txn = Transaction::begin(&conn, "test1")?;
    txn.process_notice("transaction started\n");

    let result = txn.exec("SELECT * FROM pg_tables")?;
    txn.process_notice(&format!(
        "{} result tuples in transaction {}\n",
        result.len(),
        txn.name(),
    ));

    // Walk the rows, reading column 0 of each as a string.
    for row in &result {
        let name: String = row.field(0)?.to()?;
        println!("\t{}\t{name}", row.num());
    }

    // Without this the work would be rolled back when `txn` leaves scope.
    txn.commit()?;
    Ok(())
}

fn main() -> ExitCode {
    let descriptor = std::env::args().nth(1).unwrap_or_default();
    match std::panic::catch_unwind(|| run(&descriptor)) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
        Err(_) => {
            eprintln!("unexpected internal failure");
            ExitCode::from(100)
        }
    }
}
