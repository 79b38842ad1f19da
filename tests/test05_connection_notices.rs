mod common;

use std::sync::{Arc, Mutex};

use common::MockDriver;
use pg_session::{Connection, SessionError, Transaction};

fn open(driver: &MockDriver) -> Connection {
    Connection::open_with(driver, "dbname=mock user=tester").expect("mock connect")
}

fn capture(conn: &Connection) -> Arc<Mutex<Vec<String>>> {
    let notices: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&notices);
    conn.set_notice_processor(move |text| sink.lock().unwrap().push(text.to_string()));
    notices
}

#[test]
fn connect_failure_fails_construction() {
    let driver = MockDriver::new();
    let err = Connection::open_with(&driver, "host=refuse").unwrap_err();
    assert!(matches!(err, SessionError::ConnectError(_)));
}

#[test]
fn metadata_reflects_the_descriptor_while_open() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    assert!(conn.is_open());
    assert_eq!(conn.db_name(), "mock");
    assert_eq!(conn.user_name(), "tester");
    assert_eq!(conn.host_name(), "mockhost");
    assert_eq!(conn.port(), 5432);
    assert_eq!(conn.backend_pid(), 4242);
}

#[test]
fn close_is_idempotent_and_metadata_returns_sentinels() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    conn.close();
    assert!(!conn.is_open());
    conn.close();
    conn.close();

    assert_eq!(conn.db_name(), "");
    assert_eq!(conn.user_name(), "");
    assert_eq!(conn.host_name(), "");
    assert_eq!(conn.port(), 0);
    assert_eq!(conn.backend_pid(), 0);
}

#[test]
fn caller_and_backend_notices_share_one_path() {
    let driver = MockDriver::new();
    let conn = open(&driver);
    let notices = capture(&conn);

    conn.process_notice("from the caller\n");
    driver.emit_backend_notice("NOTICE:  from the backend\n");

    let mut txn = Transaction::begin(&conn, "noisy").unwrap();
    txn.process_notice("via the transaction\n");
    txn.commit().unwrap();

    let seen = notices.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "from the caller\n",
            "NOTICE:  from the backend\n",
            "via the transaction\n",
        ]
    );
}

#[test]
fn replacing_the_processor_redirects_everything() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    let first = capture(&conn);
    conn.process_notice("one\n");

    let second = capture(&conn);
    conn.process_notice("two\n");
    driver.emit_backend_notice("three\n");

    assert_eq!(first.lock().unwrap().clone(), vec!["one\n"]);
    assert_eq!(second.lock().unwrap().clone(), vec!["two\n", "three\n"]);
}

#[test]
fn work_on_a_closed_connection_fails_cleanly() {
    let driver = MockDriver::new();
    let conn = open(&driver);
    let notices = capture(&conn);

    let mut txn = Transaction::begin(&conn, "stranded").unwrap();
    conn.close();

    assert!(matches!(
        txn.exec("SELECT 1"),
        Err(SessionError::QueryError(_))
    ));

    // Scope-exit abort cannot reach the backend anymore; that is reported on
    // the notice channel, not raised.
    drop(txn);
    let seen = notices.lock().unwrap().clone();
    assert!(
        seen.iter().any(|n| n.contains("failed to roll back")),
        "expected a rollback-failure notice, got {seen:?}"
    );
}
