use std::{
    any::Any,
    ops::{Deref, DerefMut},
    panic::{self, AssertUnwindSafe},
    sync::{Arc, MutexGuard},
    time::{Duration, Instant},
};

use log::{debug, warn};

use crate::session::ui_session::UiSession;

use super::{
    error::{TransactionListenerFailure, TransactionPhase},
    listener::TransactionListener,
    session_context::SessionContext,
    session_store::SessionId,
};

/// Identifies one transaction to its listeners
#[derive(Clone, Debug)]
pub struct TransactionInfo {
    pub session_id: SessionId,
    /// Position of this transaction among all transactions of its session,
    /// starting at 1
    pub request: u64,
    pub started_at: Instant,
}

/// How a transaction went, from the listeners' point of view
#[derive(Debug)]
pub struct TransactionReport {
    pub info: TransactionInfo,
    pub duration: Duration,
    pub failures: Vec<TransactionListenerFailure>,
}

impl TransactionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Exclusive access to one session's UI.
///
/// Start hooks have run by the time a `Transaction` is handed out. End hooks
/// run in reverse registration order when it is ended or dropped, before the
/// session is released to the next transaction.
pub struct Transaction<'s> {
    context: &'s SessionContext,
    guard: MutexGuard<'s, UiSession>,
    info: TransactionInfo,
    listeners: Vec<Arc<dyn TransactionListener>>,
    failures: Vec<TransactionListenerFailure>,
    ended: bool,
}

impl<'s> Transaction<'s> {
    pub(crate) fn begin(
        context: &'s SessionContext,
        guard: MutexGuard<'s, UiSession>,
        request: u64,
        listeners: Vec<Arc<dyn TransactionListener>>,
    ) -> Self {
        let info = TransactionInfo {
            session_id: context.id().clone(),
            request,
            started_at: Instant::now(),
        };
        debug!(
            "Transaction: start {} #{} with {} listeners",
            info.session_id,
            info.request,
            listeners.len()
        );

        let mut transaction = Self {
            context,
            guard,
            info,
            listeners,
            failures: Vec::new(),
            ended: false,
        };
        for listener in transaction.listeners.clone() {
            transaction.notify(&listener, TransactionPhase::Start);
        }
        transaction
    }

    pub fn info(&self) -> &TransactionInfo {
        &self.info
    }

    /// Listener failures collected so far
    pub fn failures(&self) -> &[TransactionListenerFailure] {
        &self.failures
    }

    /// Runs the end hooks and releases the session
    pub fn end(mut self) -> TransactionReport {
        self.finish();
        TransactionReport {
            info: self.info.clone(),
            duration: self.info.started_at.elapsed(),
            failures: std::mem::take(&mut self.failures),
        }
    }

    fn finish(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        for listener in self.listeners.clone().iter().rev() {
            self.notify(listener, TransactionPhase::End);
        }
        self.context.set_holder(None);
        debug!(
            "Transaction: end {} #{}",
            self.info.session_id, self.info.request
        );
    }

    fn notify(&mut self, listener: &Arc<dyn TransactionListener>, phase: TransactionPhase) {
        let info = &self.info;
        let result = panic::catch_unwind(AssertUnwindSafe(|| match phase {
            TransactionPhase::Start => listener.transaction_start(info),
            TransactionPhase::End => listener.transaction_end(info),
        }));

        let message = match result {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        let failure = TransactionListenerFailure {
            listener: listener.name().to_string(),
            phase,
            message,
        };
        warn!("Transaction: {} #{}: {}", info.session_id, info.request, failure);
        self.failures.push(failure);
    }
}

impl Deref for Transaction<'_> {
    type Target = UiSession;

    fn deref(&self) -> &UiSession {
        &self.guard
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut UiSession {
        &mut self.guard
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "listener panicked".to_string()
    }
}
