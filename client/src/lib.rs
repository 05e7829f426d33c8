//! # Trellis Client
//! A headless client that mirrors the component tree a trellis server
//! synchronizes, and sends user interactions back as sequenced RPC
//! invocations. Rendering is left to whatever embeds it.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod client;
mod error;
mod mirror;

pub use client::{ApplyOutcome, Client};
pub use error::TrellisClientError;
pub use mirror::{MirroredComponent, StateMirror};

pub mod shared {
    pub use trellis_shared::*;
}
