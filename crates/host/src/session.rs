//! Hosted session state.

use synckit_wire::SessionId;

/// A synchroniser registered with the host.
#[derive(Debug)]
pub struct HostedSession<S> {
    pub id: SessionId,
    /// URL the synchroniser was created for.
    pub url: String,
    pub name: Option<String>,
    pub engine: S,
}

impl<S> HostedSession<S> {
    /// Create a new hosted session.
    pub fn new(id: SessionId, url: String, name: Option<String>, engine: S) -> Self {
        Self {
            id,
            url,
            name,
            engine,
        }
    }
}
