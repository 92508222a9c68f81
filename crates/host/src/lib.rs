//! SyncKit Host
//!
//! The host is the engine-side half of the binding. It owns:
//! - The registry of engine synchronisers, keyed by the identity handed to
//!   sessions
//! - Request decoding and execution
//! - Translation of engine notifications into tagged events
//!
//! # Failure Codes
//!
//! A request the host cannot run is answered with a transport failure whose
//! code is the [`HostError`] text, e.g. `No such Synchroniser: 3`. Errors the
//! engine reports while working are sent as `error` events instead.
//!
//! # Identities
//!
//! Identities are assigned sequentially from 0 and never reused within one
//! host. A request naming an unknown (or absent) identity fails; destroy is
//! the exception and always acknowledges.

#![deny(unsafe_code)]

pub mod emitter;
pub mod engine;
pub mod error;
pub mod loopback;
pub mod session;
pub mod testing;

use std::collections::HashMap;

use prost::Message;
use synckit_session::ReplySender;
use synckit_wire::{Action, CreateSynchroniser, Event, RequestEnvelope, SessionId, TimestampProto};
use url::Url;

pub use emitter::{ContentEmitter, PropertiesUpdate, SyncEmitter, nanos_to_seconds};
pub use engine::{Synchroniser, SynchroniserFactory};
pub use error::HostError;
pub use loopback::LoopbackTransport;
use session::HostedSession;

// ============================================================================
// Host State
// ============================================================================

/// Registry of engine synchronisers serving session requests.
pub struct SyncKitHost<F: SynchroniserFactory> {
    factory: F,
    sessions: HashMap<SessionId, HostedSession<F::Synchroniser>>,
    next_session_id: SessionId,
}

impl<F: SynchroniserFactory> SyncKitHost<F> {
    /// Create an empty host building synchronisers with `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            sessions: HashMap::new(),
            next_session_id: 0,
        }
    }

    /// Get number of registered synchronisers.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Get all registered identities.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn session(&self, id: SessionId) -> Option<&HostedSession<F::Synchroniser>> {
        self.sessions.get(&id)
    }

    pub fn synchroniser(&self, id: SessionId) -> Option<&F::Synchroniser> {
        self.sessions.get(&id).map(|s| &s.engine)
    }

    pub fn synchroniser_mut(&mut self, id: SessionId) -> Option<&mut F::Synchroniser> {
        self.sessions.get_mut(&id).map(|s| &mut s.engine)
    }

    /// Decode and execute one encoded request.
    pub fn execute(&mut self, request: &[u8], reply: ReplySender) {
        match RequestEnvelope::decode(request) {
            Ok(envelope) => self.execute_request(envelope, reply),
            Err(err) => Self::fail(&reply, "request", HostError::InvalidRequest(err.to_string())),
        }
    }

    /// Execute one request. Every outcome is answered through `reply`.
    pub fn execute_request(&mut self, request: RequestEnvelope, reply: ReplySender) {
        let Some(action) = request.action else {
            Self::fail(&reply, "unknown", HostError::InvalidAction);
            return;
        };
        let name = action.name();
        tracing::debug!(action = name, subscription = reply.subscription(), "executing");
        if let Err(err) = self.run(action, &reply) {
            Self::fail(&reply, name, err);
        }
    }

    fn fail(reply: &ReplySender, action: &str, err: HostError) {
        tracing::warn!(action, error = %err, "request failed");
        reply.failure(err.to_string());
    }

    fn run(&mut self, action: Action, reply: &ReplySender) -> Result<(), HostError> {
        match action {
            Action::CreateSynchroniser(request) => {
                let id = self.create(request);
                reply.event(&Event::Created { id });
            }
            Action::DestroySynchroniser(target) => {
                if let Some(id) = target.id {
                    self.destroy(id);
                }
                reply.ack();
            }
            Action::ObtainSynchronisationInformation(target) => {
                let session = self.session_mut(target.id)?;
                session
                    .engine
                    .obtain_synchronisation_information(ContentEmitter::new(reply.clone()));
                reply.event(&Event::ObtainStarted);
            }
            Action::StartSynchroniser(request) => {
                let session = self.session_mut(request.id)?;
                let timeline = session
                    .engine
                    .timelines()
                    .into_iter()
                    .find(|t| t.id == request.timeline_id)
                    .ok_or(HostError::UnknownTimeline(request.timeline_id))?;
                session
                    .engine
                    .start_synchronisation(&timeline, SyncEmitter::new(reply.clone()));
                reply.event(&Event::Started);
            }
            Action::StopSynchroniser(target) => {
                self.session_mut(target.id)?.engine.stop_synchronisation();
                reply.ack();
            }
            Action::GetCurrentTime(target) => {
                let pts = self.session_mut(target.id)?.engine.synchronised_current_pts();
                reply.success_message(&TimestampProto {
                    timestamp: pts.map(nanos_to_seconds),
                });
            }
            Action::OverrideTimelineSyncUrl(request) => {
                let session = self.session_mut(request.id)?;
                session.engine.set_timeline_sync_url(Url::parse(&request.url)?);
                reply.ack();
            }
            Action::OverrideWallclockUrl(request) => {
                let session = self.session_mut(request.id)?;
                session.engine.set_wallclock_url(Url::parse(&request.url)?);
                reply.ack();
            }
        }
        Ok(())
    }

    fn create(&mut self, request: CreateSynchroniser) -> SessionId {
        let CreateSynchroniser {
            url,
            name,
            wallclock_update_period_millis,
        } = request;

        let mut engine = self.factory.create(&url, name.as_deref());
        if let Some(period) = wallclock_update_period_millis.filter(|&p| p > 0) {
            engine.set_wallclock_update_interval(period);
        }

        let id = self.next_session_id;
        self.next_session_id += 1;
        tracing::info!(id, url = %url, name = ?name, "synchroniser created");
        self.sessions
            .insert(id, HostedSession::new(id, url, name, engine));
        id
    }

    fn destroy(&mut self, id: SessionId) {
        if let Some(mut session) = self.sessions.remove(&id) {
            session.engine.stop_synchronisation();
            tracing::info!(id, "synchroniser destroyed");
        }
    }

    fn session_mut(
        &mut self,
        id: Option<SessionId>,
    ) -> Result<&mut HostedSession<F::Synchroniser>, HostError> {
        id.and_then(|id| self.sessions.get_mut(&id))
            .ok_or(HostError::UnknownSynchroniser(id))
    }
}

// ============================================================================
// Tests
// ============================================================================
