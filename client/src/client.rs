use log::{debug, info, warn};

use trellis_shared::{
    decode_server_message, encode_client_message, ClientMessage, ClientRpcCall, ComponentId,
    SequenceNumber, ServerMessage, ServerRpcCall, Value,
};

use crate::{error::TrellisClientError, mirror::StateMirror};

/// What became of one server response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Not newer than the last applied response, dropped
    Stale,
    /// One or more responses in between were missed. Dropped; the next
    /// request reports the gap and the server resynchronizes.
    OutOfSync,
}

/// Headless client: mirrors the server's component tree and sends user
/// interactions back as sequenced invocations
pub struct Client {
    mirror: StateMirror,
    next_sequence: SequenceNumber,
    last_response: Option<SequenceNumber>,
    outgoing: Vec<ServerRpcCall>,
    received_calls: Vec<ClientRpcCall>,
}

impl Client {
    pub fn new() -> Self {
        Self {
            mirror: StateMirror::new(),
            next_sequence: SequenceNumber::default(),
            last_response: None,
            outgoing: Vec::new(),
            received_calls: Vec::new(),
        }
    }

    pub fn mirror(&self) -> &StateMirror {
        &self.mirror
    }

    pub fn last_response(&self) -> Option<SequenceNumber> {
        self.last_response
    }

    // Outgoing

    /// Queues an invocation of a server-side RPC handler, sent with the next
    /// request. Returns its sequence number.
    pub fn invoke(
        &mut self,
        component: ComponentId,
        interface: &str,
        method: &str,
        args: Vec<Value>,
    ) -> SequenceNumber {
        let sequence = self.next_sequence;
        self.next_sequence = sequence.next();
        self.outgoing.push(ServerRpcCall {
            component,
            interface: interface.to_string(),
            method: method.to_string(),
            args,
            sequence,
        });
        sequence
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Takes every queued invocation into the next request
    pub fn take_request(&mut self) -> ClientMessage {
        ClientMessage {
            last_response: self.last_response,
            invocations: std::mem::take(&mut self.outgoing),
        }
    }

    pub fn encode_request(&mut self) -> Result<Vec<u8>, TrellisClientError> {
        let message = self.take_request();
        Ok(encode_client_message(&message)?)
    }

    // Incoming

    pub fn receive(&mut self, payload: &[u8]) -> Result<ApplyOutcome, TrellisClientError> {
        let message = decode_server_message(payload)?;
        self.apply(message)
    }

    /// Applies a response to the mirror. The response is applied entirely or,
    /// on error, not at all.
    pub fn apply(&mut self, message: ServerMessage) -> Result<ApplyOutcome, TrellisClientError> {
        if let Some(last) = self.last_response {
            if !message.sequence.is_newer_than(&last) {
                debug!(
                    "Client: dropping stale response {} (last {})",
                    message.sequence.value(),
                    last.value()
                );
                return Ok(ApplyOutcome::Stale);
            }
            if !message.resynchronize && message.sequence != last.next() {
                warn!(
                    "Client: response {} follows {}, waiting for resynchronization",
                    message.sequence.value(),
                    last.value()
                );
                return Ok(ApplyOutcome::OutOfSync);
            }
        }

        let mut mirror = if message.resynchronize {
            info!("Client: resynchronizing at response {}", message.sequence.value());
            StateMirror::new()
        } else {
            self.mirror.clone()
        };
        for change in &message.hierarchy {
            mirror.apply_hierarchy(change)?;
        }
        for change in &message.changes {
            mirror.apply_change(change)?;
        }

        self.mirror = mirror;
        self.received_calls.extend(message.calls);
        self.last_response = Some(message.sequence);
        Ok(ApplyOutcome::Applied)
    }

    /// Server -> client calls received so far, in delivery order
    pub fn take_client_calls(&mut self) -> Vec<ClientRpcCall> {
        std::mem::take(&mut self.received_calls)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
