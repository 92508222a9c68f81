//! Seam between a session and the engine side.

use synckit_wire::RequestEnvelope;

use crate::channel::ReplySender;

/// Carries requests to the engine.
///
/// `exec` must not block and must not answer by calling back into the
/// session; every result, including failures, goes through `reply` and is
/// dispatched later when the session drains its channel.
pub trait Transport {
    fn exec(&mut self, request: RequestEnvelope, reply: ReplySender);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exec(&mut self, request: RequestEnvelope, reply: ReplySender) {
        (**self).exec(request, reply)
    }
}
