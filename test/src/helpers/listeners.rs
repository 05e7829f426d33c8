use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use trellis_server::{ListenerError, TransactionInfo, TransactionListener};

/// Appends `"<name>:start"` / `"<name>:end"` to a shared log
pub struct RecordingListener {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingListener {
    pub fn new(name: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            log,
        }
    }
}

impl TransactionListener for RecordingListener {
    fn transaction_start(&self, _transaction: &TransactionInfo) -> Result<(), ListenerError> {
        self.log.lock().unwrap().push(format!("{}:start", self.name));
        Ok(())
    }

    fn transaction_end(&self, _transaction: &TransactionInfo) -> Result<(), ListenerError> {
        self.log.lock().unwrap().push(format!("{}:end", self.name));
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct ListenerRefused;

impl fmt::Display for ListenerRefused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refused to start")
    }
}

impl std::error::Error for ListenerRefused {}

/// Fails every start hook
pub struct FailingListener;

impl TransactionListener for FailingListener {
    fn transaction_start(&self, _transaction: &TransactionInfo) -> Result<(), ListenerError> {
        Err(Box::new(ListenerRefused))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Panics in every end hook
pub struct PanickingListener;

impl TransactionListener for PanickingListener {
    fn transaction_end(&self, _transaction: &TransactionInfo) -> Result<(), ListenerError> {
        panic!("end hook exploded");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Tracks how many transactions are between their start and end hooks
#[derive(Default)]
pub struct ActiveCounter {
    active: AtomicUsize,
    max_active: AtomicUsize,
    completed: AtomicUsize,
}

impl ActiveCounter {
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl TransactionListener for ActiveCounter {
    fn transaction_start(&self, _transaction: &TransactionInfo) -> Result<(), ListenerError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        Ok(())
    }

    fn transaction_end(&self, _transaction: &TransactionInfo) -> Result<(), ListenerError> {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
