use std::default::Default;

/// Contains Config properties which will be used by the Server and by every
/// session it creates
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Upper bound on finalize passes in one response cycle. A cascade that
    /// is still marking components dirty after this many passes aborts the
    /// response with `CascadeOverflow`.
    pub max_finalize_passes: usize,
    /// Largest encoded response, in bytes, that may be sent. `None` means
    /// unbounded.
    pub max_response_bytes: Option<usize>,
    /// Whether a client invocation repeating the last applied sequence number
    /// is applied again. When false only strictly newer sequences pass.
    pub allow_duplicate_sequence: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_finalize_passes: 64,
            max_response_bytes: None,
            allow_duplicate_sequence: false,
        }
    }
}
