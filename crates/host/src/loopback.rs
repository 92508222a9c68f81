//! In-process transport from a session straight into a host.

use prost::Message;
use synckit_session::{ReplySender, Transport};
use synckit_wire::RequestEnvelope;

use crate::SyncKitHost;
use crate::engine::SynchroniserFactory;

/// [`Transport`] that executes every request on an owned [`SyncKitHost`].
///
/// Requests are encoded and decoded exactly as across a platform bridge.
/// Replies still travel through the session's event channel, so nothing is
/// dispatched before the session drains it.
pub struct LoopbackTransport<F: SynchroniserFactory> {
    host: SyncKitHost<F>,
}

impl<F: SynchroniserFactory> LoopbackTransport<F> {
    pub fn new(host: SyncKitHost<F>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &SyncKitHost<F> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut SyncKitHost<F> {
        &mut self.host
    }

    pub fn into_host(self) -> SyncKitHost<F> {
        self.host
    }
}

impl<F: SynchroniserFactory> Transport for LoopbackTransport<F> {
    fn exec(&mut self, request: RequestEnvelope, reply: ReplySender) {
        self.host.execute(&request.encode_to_vec(), reply);
    }
}
