//! Error surface handed to session callbacks.
//!
//! Two channels reach the same error callback and keep distinct message
//! shapes:
//!
//! | Source | Variant | Display |
//! |--------|---------|---------|
//! | transport failure | [`SyncError::Transport`] | `transport error: <code>` |
//! | engine `error` event | [`SyncError::Engine`] | description, verbatim |
//!
//! Undecodable payloads surface as [`SyncError::MalformedEvent`] or
//! [`SyncError::MalformedReply`].

use synckit_wire::EventDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Low-level failure code from the transport or host.
    #[error("transport error: {0}")]
    Transport(String),

    /// Error reported by the engine as an event.
    #[error("{0}")]
    Engine(String),

    /// A streamed event could not be decoded.
    #[error(transparent)]
    MalformedEvent(#[from] EventDecodeError),

    /// A one-shot reply could not be decoded.
    #[error("malformed reply: {0}")]
    MalformedReply(#[from] prost::DecodeError),
}

impl SyncError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_engine(&self) -> bool {
        matches!(self, Self::Engine(_))
    }
}
