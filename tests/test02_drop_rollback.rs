//! The central guarantee: nothing becomes durable except through an explicit,
//! successful commit.

mod common;

use std::sync::{Arc, Mutex};

use common::{MockDriver, poisoned_error};
use pg_session::driver::DriverError;
use pg_session::{Connection, Transaction};

fn open(driver: &MockDriver) -> Connection {
    Connection::open_with(driver, "dbname=mock user=tester").expect("mock connect")
}

fn committed_commands(conn: &Connection) -> Vec<String> {
    let mut txn = Transaction::begin(conn, "observer").unwrap();
    let dump = txn.exec("DUMP").unwrap();
    txn.commit().unwrap();
    dump.iter()
        .map(|row| row.get_named("command").unwrap().to::<String>().unwrap())
        .collect()
}

#[test]
fn dropped_transaction_leaves_no_trace() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    {
        let mut txn = Transaction::begin(&conn, "forgotten").unwrap();
        txn.execute("INSERT ghost").unwrap();
        // No commit: scope exit must roll back.
    }

    assert!(driver.journal().contains(&"ROLLBACK".to_string()));
    assert!(committed_commands(&conn).is_empty());
}

#[test]
fn committed_transaction_is_visible_afterwards() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    let mut txn = Transaction::begin(&conn, "kept").unwrap();
    txn.execute("INSERT kept").unwrap();
    txn.commit().unwrap();

    assert_eq!(committed_commands(&conn), vec!["INSERT kept"]);
}

#[test]
fn drop_after_commit_does_not_roll_back() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    {
        let mut txn = Transaction::begin(&conn, "clean").unwrap();
        txn.execute("INSERT clean").unwrap();
        txn.commit().unwrap();
    }

    assert_eq!(driver.rollback_count(), 0);
    assert_eq!(committed_commands(&conn), vec!["INSERT clean"]);
}

#[test]
fn dropped_failed_transaction_still_rolls_back() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    {
        let mut txn = Transaction::begin(&conn, "wounded").unwrap();
        driver.fail_on("INSERT boom", poisoned_error());
        let _ = txn.execute("INSERT boom");
    }

    assert_eq!(driver.rollback_count(), 1);
    assert!(committed_commands(&conn).is_empty());
}

#[test]
fn rollback_failure_on_drop_is_reported_as_notice_only() {
    let driver = MockDriver::new();
    let conn = open(&driver);

    let notices: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&notices);
    conn.set_notice_processor(move |text| sink.lock().unwrap().push(text.to_string()));

    {
        let mut txn = Transaction::begin(&conn, "unlucky").unwrap();
        txn.execute("INSERT lost").unwrap();
        driver.fail_on("ROLLBACK", DriverError::new("link went away"));
        // Drop: the rollback failure must not panic or propagate.
    }

    let notices = notices.lock().unwrap();
    assert!(
        notices
            .iter()
            .any(|n| n.contains("dropped without commit")),
        "scope-exit abort should announce itself: {notices:?}"
    );
    assert!(
        notices
            .iter()
            .any(|n| n.contains("failed to roll back") && n.contains("unlucky")),
        "rollback failure should reach the notice channel: {notices:?}"
    );
}
