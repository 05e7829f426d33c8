use trellis_client::{ApplyOutcome, Client};
use trellis_server::{RequestOutcome, Server, SessionId, TrellisServerError};

/// One client talking to a server session, exchanging encoded messages the
/// way a transport would
pub struct TestConnection {
    pub session: SessionId,
    pub client: Client,
}

impl TestConnection {
    pub fn new(session: &str) -> Self {
        Self {
            session: SessionId::new(session),
            client: Client::new(),
        }
    }

    /// Sends every queued invocation and applies the response
    pub fn round_trip(
        &mut self,
        server: &Server,
    ) -> Result<(RequestOutcome, ApplyOutcome), TrellisServerError> {
        let request = self
            .client
            .encode_request()
            .expect("client requests always encode");
        let outcome = server.handle_request(&self.session, &request)?;
        let applied = self
            .client
            .receive(&outcome.response.payload)
            .expect("server responses always decode and apply");
        Ok((outcome, applied))
    }

    /// Sends the queued invocations but loses the response on the way back
    pub fn round_trip_lost(&mut self, server: &Server) -> Result<RequestOutcome, TrellisServerError> {
        let request = self
            .client
            .encode_request()
            .expect("client requests always encode");
        server.handle_request(&self.session, &request)
    }
}
