use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError,
    },
    thread::{self, ThreadId},
};

use log::warn;

use crate::session::ui_session::UiSession;

use super::{
    error::TransactionError, listener::TransactionListener, session_store::SessionId,
    transaction::Transaction,
};

/// One session as seen by the transaction layer: the UI it guards plus the
/// listeners that observe every transaction on it.
///
/// At most one transaction per session is active at any instant. Different
/// sessions never contend with each other.
pub struct SessionContext {
    id: SessionId,
    ui: Mutex<UiSession>,
    holder: Mutex<Option<ThreadId>>,
    listeners: RwLock<Vec<Arc<dyn TransactionListener>>>,
    requests: AtomicU64,
}

impl SessionContext {
    pub fn new(id: SessionId, ui: UiSession) -> Self {
        Self {
            id,
            ui: Mutex::new(ui),
            holder: Mutex::new(None),
            listeners: RwLock::new(Vec::new()),
            requests: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Registers a listener. A transaction that already started keeps the
    /// listener set it started with.
    pub fn add_listener(&self, listener: Arc<dyn TransactionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn TransactionListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|existing| !Arc::ptr_eq(existing, listener));
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of transactions started on this session so far
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Waits for the session to become free, then starts a transaction on it
    pub fn start_transaction(&self) -> Result<Transaction<'_>, TransactionError> {
        self.check_reentrant()?;
        let guard = match self.ui.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    "SessionContext: session {} recovered after a panicked transaction",
                    self.id
                );
                poisoned.into_inner()
            }
        };
        Ok(self.begin(guard))
    }

    /// Starts a transaction only if no other one is active on this session
    pub fn try_start_transaction(&self) -> Result<Transaction<'_>, TransactionError> {
        self.check_reentrant()?;
        let guard = match self.ui.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!(
                    "SessionContext: session {} recovered after a panicked transaction",
                    self.id
                );
                poisoned.into_inner()
            }
            Err(TryLockError::WouldBlock) => {
                return Err(TransactionError::SessionBusy {
                    session: self.id.clone(),
                })
            }
        };
        Ok(self.begin(guard))
    }

    fn check_reentrant(&self) -> Result<(), TransactionError> {
        let holder = *self.holder.lock().unwrap_or_else(PoisonError::into_inner);
        if holder == Some(thread::current().id()) {
            return Err(TransactionError::Reentrant {
                session: self.id.clone(),
            });
        }
        Ok(())
    }

    fn begin<'s>(&'s self, guard: MutexGuard<'s, UiSession>) -> Transaction<'s> {
        self.set_holder(Some(thread::current().id()));
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Transaction::begin(self, guard, request, listeners)
    }

    pub(crate) fn set_holder(&self, holder: Option<ThreadId>) {
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = holder;
    }
}
