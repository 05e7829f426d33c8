use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a Component for as long as it stays attached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(u64);

impl ComponentId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Name of an RPC interface, e.g. `"ButtonServerRpc"`
pub type InterfaceName = String;

/// Name of a method inside an RPC interface
pub type MethodName = String;
