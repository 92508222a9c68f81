//! Event channel between the engine side and a session.
//!
//! Every request a session issues opens a subscription on the channel. The
//! engine side answers through the [`ReplySender`] handed over with the
//! request; replies land in one queue that the session drains in order.
//! Order is preserved per sender, and therefore per subscription.

use prost::Message;
use synckit_wire::Event;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Identifier of one logical subscription (one issued request).
///
/// Allocated in increasing order per channel.
pub type SubscriptionId = u64;

/// A single result delivered for a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Encoded payload; an event envelope for streaming requests.
    Success(Vec<u8>),
    /// Transport-level failure code.
    Failure(String),
}

/// A reply tagged with the subscription it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub subscription: SubscriptionId,
    pub reply: Reply,
}

/// Engine-side handle for answering one subscription.
///
/// Cheap to clone; may be moved to another thread. Sending after the
/// session is gone is not an error, the reply is just dropped.
#[derive(Debug, Clone)]
pub struct ReplySender {
    subscription: SubscriptionId,
    tx: UnboundedSender<Delivery>,
}

impl ReplySender {
    /// Subscription this sender answers.
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Send an encoded success payload.
    pub fn success(&self, payload: Vec<u8>) -> bool {
        self.send(Reply::Success(payload))
    }

    /// Encode and send a message as a success payload.
    pub fn success_message<M: Message>(&self, msg: &M) -> bool {
        self.success(msg.encode_to_vec())
    }

    /// Send a tagged event.
    pub fn event(&self, event: &Event) -> bool {
        self.success(event.encode_to_vec())
    }

    /// Acknowledge with an empty payload.
    pub fn ack(&self) -> bool {
        self.success(Vec::new())
    }

    /// Report a transport-level failure.
    pub fn failure(&self, code: impl Into<String>) -> bool {
        self.send(Reply::Failure(code.into()))
    }

    /// True once the receiving session has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, reply: Reply) -> bool {
        let delivery = Delivery {
            subscription: self.subscription,
            reply,
        };
        if self.tx.send(delivery).is_err() {
            tracing::debug!(
                subscription = self.subscription,
                "event channel closed, reply dropped"
            );
            return false;
        }
        true
    }
}

/// Receiving end of the event channel, owned by one session.
pub struct EventChannel {
    tx: UnboundedSender<Delivery>,
    rx: UnboundedReceiver<Delivery>,
    next_subscription: SubscriptionId,
}

impl EventChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            next_subscription: 1,
        }
    }

    /// Open a new subscription and return the sender that answers it.
    pub fn open(&mut self) -> ReplySender {
        let subscription = self.next_subscription;
        self.next_subscription += 1;
        ReplySender {
            subscription,
            tx: self.tx.clone(),
        }
    }

    /// Next queued delivery, if any, without waiting.
    pub fn try_next(&mut self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next delivery.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}
