use log::debug;

use trellis_shared::SequenceNumber;

use super::error::RpcError;

/// Rejects client invocations that do not move the sequence forward, so that
/// retried or reordered network deliveries are never applied twice
#[derive(Default)]
pub struct SequenceGuard {
    last_applied: Option<SequenceNumber>,
    allow_duplicate: bool,
}

impl SequenceGuard {
    pub fn new(allow_duplicate: bool) -> Self {
        Self {
            last_applied: None,
            allow_duplicate,
        }
    }

    pub fn last_applied(&self) -> Option<SequenceNumber> {
        self.last_applied
    }

    pub fn check(&self, sequence: &SequenceNumber) -> Result<(), RpcError> {
        let Some(last_applied) = self.last_applied else {
            return Ok(());
        };

        let stale = sequence.is_older_than(&last_applied)
            || (*sequence == last_applied && !self.allow_duplicate);
        if stale {
            debug!(
                "SequenceGuard: dropping sequence {} (last applied {})",
                sequence.value(),
                last_applied.value()
            );
            return Err(RpcError::StaleSequence {
                sequence: sequence.value(),
                last_applied: last_applied.value(),
            });
        }

        Ok(())
    }

    pub fn record(&mut self, sequence: SequenceNumber) {
        self.last_applied = Some(sequence);
    }
}
