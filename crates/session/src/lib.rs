//! SyncKit Session
//!
//! Client side of the SyncKit binding. A [`Session`] forwards operations to
//! a synchronisation engine through a [`Transport`] and redispatches the
//! engine's tagged events to the callbacks registered with each operation.
//! It performs no synchronisation itself.
//!
//! # Flow
//!
//! ```text
//! Session::create ──request──► Transport ──► engine
//!        ▲                                     │
//!        └──── dispatch_pending ◄── EventChannel ◄── tagged events
//! ```
//!
//! All callbacks run inside `dispatch_pending` / `dispatch_next`, on the
//! caller's thread. The only state a session keeps besides its
//! subscriptions is the engine identity and [`ClockValidity`].

#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod error;
pub mod session;
pub mod subscription;
pub mod transport;
pub mod validity;

pub use channel::{Delivery, EventChannel, Reply, ReplySender, SubscriptionId};
pub use config::SessionOptions;
pub use error::SyncError;
pub use session::Session;
pub use subscription::{
    CreateCallbacks, CurrentTimeHandler, ObtainCallbacks, OverrideCallbacks, StartOptions,
    StopHandler,
};
pub use transport::Transport;
pub use validity::{ClockValidity, ValidityTrigger};
