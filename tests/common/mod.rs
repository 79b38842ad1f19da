//! In-memory mock driver for hermetic lifecycle tests.
//!
//! The mock keeps a journal of every command it sees and emulates the
//! smallest transactional backend that can exercise the session contract:
//! non-control commands accumulate in a pending buffer while a transaction is
//! open, move to committed state on COMMIT, and vanish on ROLLBACK. The
//! magic `DUMP` query returns the committed commands as a one-column result,
//! so tests can observe what actually became durable.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pg_session::driver::{Driver, DriverError, Link, LinkInfo, NoticeSink, RawResult};
use pg_session::results::Column;
use pg_session::value::CellValue;

#[derive(Default)]
pub struct BackendState {
    pub committed: Vec<String>,
    pub pending: Vec<String>,
    pub in_transaction: bool,
    pub journal: Vec<String>,
    scripted_failures: VecDeque<(String, DriverError)>,
    notices: Option<NoticeSink>,
}

#[derive(Default, Clone)]
pub struct MockDriver {
    pub state: Arc<Mutex<BackendState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next command containing `needle` to fail with `error`.
    pub fn fail_on(&self, needle: &str, error: DriverError) {
        self.state
            .lock()
            .unwrap()
            .scripted_failures
            .push_back((needle.to_string(), error));
    }

    pub fn committed(&self) -> Vec<String> {
        self.state.lock().unwrap().committed.clone()
    }

    pub fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }

    pub fn rollback_count(&self) -> usize {
        self.journal().iter().filter(|c| *c == "ROLLBACK").count()
    }

    /// Deliver a backend-generated notice, as the wire would.
    pub fn emit_backend_notice(&self, text: &str) {
        let sink = self.state.lock().unwrap().notices.clone();
        if let Some(sink) = sink {
            sink.emit(text);
        }
    }
}

impl Driver for MockDriver {
    fn connect(
        &self,
        descriptor: &str,
        notices: NoticeSink,
    ) -> Result<Box<dyn Link>, DriverError> {
        if descriptor.contains("refuse") {
            return Err(DriverError::new("connection refused"));
        }

        let mut info = LinkInfo {
            host: "mockhost".to_string(),
            port: 5432,
            backend_pid: 4242,
            ..LinkInfo::default()
        };
        for pair in descriptor.split_whitespace() {
            match pair.split_once('=') {
                Some(("dbname", v)) => info.db_name = v.to_string(),
                Some(("user", v)) => info.user_name = v.to_string(),
                _ => {}
            }
        }

        self.state.lock().unwrap().notices = Some(notices);
        Ok(Box::new(MockLink {
            state: Arc::clone(&self.state),
            info,
        }))
    }
}

struct MockLink {
    state: Arc<Mutex<BackendState>>,
    info: LinkInfo,
}

fn apply(state: &mut BackendState, command: &str) -> Result<(), DriverError> {
    state.journal.push(command.to_string());
    if let Some(pos) = state
        .scripted_failures
        .iter()
        .position(|(needle, _)| command.contains(needle.as_str()))
    {
        let (_, error) = state
            .scripted_failures
            .remove(pos)
            .expect("position came from the same queue");
        // A backend that rejects COMMIT has rolled the work back.
        if command == "COMMIT" {
            state.pending.clear();
            state.in_transaction = false;
        }
        return Err(error);
    }
    match command {
        "BEGIN" => state.in_transaction = true,
        "COMMIT" => {
            let pending = std::mem::take(&mut state.pending);
            state.committed.extend(pending);
            state.in_transaction = false;
        }
        "ROLLBACK" => {
            state.pending.clear();
            state.in_transaction = false;
        }
        other => {
            if state.in_transaction {
                state.pending.push(other.to_string());
            } else {
                state.committed.push(other.to_string());
            }
        }
    }
    Ok(())
}

impl Link for MockLink {
    fn info(&self) -> &LinkInfo {
        &self.info
    }

    fn query(&mut self, command: &str) -> Result<RawResult, DriverError> {
        let mut state = self.state.lock().unwrap();
        if command == "DUMP" {
            state.journal.push(command.to_string());
            let columns = vec![Column {
                name: "command".to_string(),
                type_oid: 25,
            }];
            let rows = state
                .committed
                .iter()
                .map(|c| vec![CellValue::Text(c.clone())])
                .collect();
            return Ok(RawResult { columns, rows });
        }
        apply(&mut state, command)?;
        Ok(RawResult::default())
    }

    fn execute(&mut self, command: &str) -> Result<u64, DriverError> {
        apply(&mut self.state.lock().unwrap(), command)?;
        Ok(1)
    }

    fn batch(&mut self, commands: &str) -> Result<(), DriverError> {
        apply(&mut self.state.lock().unwrap(), commands)
    }
}

/// An error shaped the way the pg driver reports a poisoned transaction.
pub fn poisoned_error() -> DriverError {
    DriverError::new("ERROR: current transaction is aborted, commands ignored until end of transaction block")
        .with_sqlstate("25P02")
        .poisoning_transaction()
}
