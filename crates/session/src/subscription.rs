//! Callback bundles and per-subscription dispatch.
//!
//! Streaming subscriptions (obtain-info, start) keep FnMut callbacks and
//! stay open after each event. One-shot subscriptions keep FnOnce callbacks
//! and close on their first reply.

use prost::Message;
use synckit_wire::{
    Event, SessionId, SyncProperties, TimelineDescriptor, TimelineId, TimestampProto,
};

use crate::channel::Reply;
use crate::error::SyncError;
use crate::validity::{ClockValidity, ValidityTrigger};

pub type Notify = Box<dyn FnMut()>;
pub type ErrorHandler = Box<dyn FnMut(&SyncError)>;
pub type OnceNotify = Box<dyn FnOnce()>;
pub type OnceErrorHandler = Box<dyn FnOnce(&SyncError)>;
pub type ContentHandler = Box<dyn FnMut(&str)>;
pub type TimelinesHandler = Box<dyn FnMut(&[TimelineDescriptor])>;
pub type SyncMessageHandler = Box<dyn FnMut(&serde_json::Value)>;
pub type TimestampHandler = Box<dyn FnMut(Option<f64>)>;
pub type PropertiesHandler = Box<dyn FnMut(Option<f64>, &SyncProperties)>;
pub type StopHandler = Box<dyn FnOnce(Option<&SyncError>)>;
pub type CurrentTimeHandler = Box<dyn FnOnce(Option<f64>)>;

/// Whether a subscription stays registered after a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Keep,
    Close,
}

/// Session state the handlers may mutate.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub identity: Option<SessionId>,
    pub validity: ClockValidity,
}

fn notify(cb: &mut Option<Notify>) {
    if let Some(cb) = cb.as_mut() {
        cb();
    }
}

fn report(cb: &mut Option<ErrorHandler>, err: &SyncError) {
    match cb.as_mut() {
        Some(cb) => cb(err),
        None => tracing::debug!(error = %err, "no error callback registered"),
    }
}

fn decode_event(payload: &[u8]) -> Result<Option<Event>, SyncError> {
    Ok(Event::decode(payload)?)
}

// ============================================================================
// Create
// ============================================================================

/// Callbacks for session construction.
#[derive(Default)]
pub struct CreateCallbacks {
    init: Option<OnceNotify>,
    error: Option<OnceErrorHandler>,
}

impl CreateCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once the engine has assigned an identity.
    pub fn on_init(mut self, f: impl FnOnce() + 'static) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&SyncError) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    fn fail(&mut self, err: SyncError) {
        match self.error.take() {
            Some(cb) => cb(&err),
            None => tracing::debug!(error = %err, "session creation failed"),
        }
    }

    fn handle(&mut self, reply: Reply, state: &mut SessionState) -> Disposition {
        let payload = match reply {
            Reply::Success(payload) => payload,
            Reply::Failure(code) => {
                self.fail(SyncError::Transport(code));
                return Disposition::Close;
            }
        };
        match decode_event(&payload) {
            Ok(Some(Event::Created { id })) => {
                state.identity = Some(id);
                tracing::debug!(identity = id, "session created");
                if let Some(init) = self.init.take() {
                    init();
                }
                Disposition::Close
            }
            Ok(_) => Disposition::Keep,
            Err(err) => {
                self.fail(err);
                Disposition::Close
            }
        }
    }
}

// ============================================================================
// Obtain synchronisation information
// ============================================================================

/// Callbacks for an obtain-info subscription.
#[derive(Default)]
pub struct ObtainCallbacks {
    obtain_started: Option<Notify>,
    content: Option<ContentHandler>,
    timelines_available: Option<TimelinesHandler>,
    sync_message: Option<SyncMessageHandler>,
    error: Option<ErrorHandler>,
}

impl ObtainCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_obtain_started(mut self, f: impl FnMut() + 'static) -> Self {
        self.obtain_started = Some(Box::new(f));
        self
    }

    /// Called with each new content identifier.
    pub fn on_content(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.content = Some(Box::new(f));
        self
    }

    /// Called with the full current timeline list; each call replaces the
    /// previous one.
    pub fn on_timelines_available(
        mut self,
        f: impl FnMut(&[TimelineDescriptor]) + 'static,
    ) -> Self {
        self.timelines_available = Some(Box::new(f));
        self
    }

    /// Called with each raw synchronisation message.
    pub fn on_sync_message(mut self, f: impl FnMut(&serde_json::Value) + 'static) -> Self {
        self.sync_message = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&SyncError) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    fn handle(&mut self, reply: Reply) -> Disposition {
        let payload = match reply {
            Reply::Success(payload) => payload,
            Reply::Failure(code) => {
                report(&mut self.error, &SyncError::Transport(code));
                return Disposition::Close;
            }
        };
        match decode_event(&payload) {
            Ok(Some(event)) => self.on_event(event),
            Ok(None) => tracing::debug!("unknown event tag dropped"),
            Err(err) => {
                tracing::warn!(error = %err, "malformed obtain-info event");
                report(&mut self.error, &err);
            }
        }
        Disposition::Keep
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::ObtainStarted => notify(&mut self.obtain_started),
            Event::ContentIdChanged(content_id) => {
                if let Some(cb) = self.content.as_mut() {
                    cb(&content_id);
                }
            }
            Event::TimelinesAvailable(timelines) => {
                if let Some(cb) = self.timelines_available.as_mut() {
                    cb(&timelines);
                }
            }
            Event::SyncMessage(msg) => {
                if let Some(cb) = self.sync_message.as_mut() {
                    cb(&msg);
                }
            }
            Event::Error(description) => report(&mut self.error, &SyncError::Engine(description)),
            other => tracing::debug!(tag = other.tag(), "event ignored by obtain-info"),
        }
    }
}

// ============================================================================
// Start
// ============================================================================

/// Timeline choice and callbacks for `start`.
pub struct StartOptions {
    pub timeline_id: TimelineId,
    callbacks: StartCallbacks,
}

#[derive(Default)]
pub(crate) struct StartCallbacks {
    started: Option<Notify>,
    wallclock_synced: Option<Notify>,
    wallclock_updated: Option<TimestampHandler>,
    available: Option<Notify>,
    unavailable: Option<Notify>,
    properties_changed: Option<PropertiesHandler>,
    error: Option<ErrorHandler>,
}

impl StartOptions {
    pub fn new(timeline_id: TimelineId) -> Self {
        Self {
            timeline_id,
            callbacks: StartCallbacks::default(),
        }
    }

    pub fn on_started(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.started = Some(Box::new(f));
        self
    }

    pub fn on_wallclock_synced(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.wallclock_synced = Some(Box::new(f));
        self
    }

    /// Called on each wallclock update; the timestamp is `None` until clock
    /// properties are valid.
    pub fn on_wallclock_updated(mut self, f: impl FnMut(Option<f64>) + 'static) -> Self {
        self.callbacks.wallclock_updated = Some(Box::new(f));
        self
    }

    pub fn on_available(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.available = Some(Box::new(f));
        self
    }

    pub fn on_unavailable(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.unavailable = Some(Box::new(f));
        self
    }

    pub fn on_properties_changed(
        mut self,
        f: impl FnMut(Option<f64>, &SyncProperties) + 'static,
    ) -> Self {
        self.callbacks.properties_changed = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&SyncError) + 'static) -> Self {
        self.callbacks.error = Some(Box::new(f));
        self
    }

    pub(crate) fn into_callbacks(self) -> StartCallbacks {
        self.callbacks
    }
}

impl StartCallbacks {
    fn handle(&mut self, reply: Reply, validity: &mut ClockValidity) -> Disposition {
        let payload = match reply {
            Reply::Success(payload) => payload,
            Reply::Failure(code) => {
                report(&mut self.error, &SyncError::Transport(code));
                return Disposition::Close;
            }
        };
        match decode_event(&payload) {
            Ok(Some(event)) => self.on_event(event, validity),
            Ok(None) => tracing::debug!("unknown event tag dropped"),
            Err(err) => {
                tracing::warn!(error = %err, "malformed start event");
                report(&mut self.error, &err);
            }
        }
        Disposition::Keep
    }

    fn on_event(&mut self, event: Event, validity: &mut ClockValidity) {
        match event {
            Event::Started => notify(&mut self.started),
            Event::WallclockSynced => notify(&mut self.wallclock_synced),
            Event::WallclockUpdated(timestamp) => {
                if let Some(cb) = self.wallclock_updated.as_mut() {
                    cb(validity.mask(timestamp));
                }
            }
            Event::Available => notify(&mut self.available),
            Event::Unavailable => {
                *validity = validity.on(ValidityTrigger::Unavailable);
                notify(&mut self.unavailable);
            }
            Event::PropertiesChanged {
                timestamp,
                properties,
            } => {
                *validity = validity.on(ValidityTrigger::PropertiesChanged);
                if let Some(cb) = self.properties_changed.as_mut() {
                    cb(timestamp, &properties);
                }
            }
            Event::Error(description) => report(&mut self.error, &SyncError::Engine(description)),
            other => tracing::debug!(tag = other.tag(), "event ignored by start"),
        }
    }
}

// ============================================================================
// One-shot requests
// ============================================================================

/// Callbacks for a URL override.
#[derive(Default)]
pub struct OverrideCallbacks {
    done: Option<OnceNotify>,
    error: Option<OnceErrorHandler>,
}

impl OverrideCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_done(mut self, f: impl FnOnce() + 'static) -> Self {
        self.done = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&SyncError) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

pub(crate) struct CurrentTimeCallbacks {
    pub on_time: Option<CurrentTimeHandler>,
    pub on_error: Option<OnceErrorHandler>,
}

/// A registered subscription awaiting replies.
pub(crate) enum Subscription {
    Create(CreateCallbacks),
    Obtain(ObtainCallbacks),
    Start(StartCallbacks),
    Stop(Option<StopHandler>),
    CurrentTime(CurrentTimeCallbacks),
    Override(OverrideCallbacks),
    Destroy,
}

impl Subscription {
    /// Streaming subscriptions receive events until closed by the engine.
    pub(crate) fn is_stream(&self) -> bool {
        matches!(self, Self::Obtain(_) | Self::Start(_))
    }

    pub(crate) fn handle(&mut self, reply: Reply, state: &mut SessionState) -> Disposition {
        match self {
            Self::Create(cbs) => cbs.handle(reply, state),
            Self::Obtain(cbs) => cbs.handle(reply),
            Self::Start(cbs) => cbs.handle(reply, &mut state.validity),
            Self::Stop(cb) => {
                let err = match reply {
                    Reply::Success(_) => None,
                    Reply::Failure(code) => Some(SyncError::Transport(code)),
                };
                if let Some(cb) = cb.take() {
                    cb(err.as_ref());
                }
                Disposition::Close
            }
            Self::CurrentTime(cbs) => {
                let result = match reply {
                    Reply::Success(payload) => TimestampProto::decode(payload.as_slice())
                        .map(|t| t.timestamp)
                        .map_err(SyncError::from),
                    Reply::Failure(code) => Err(SyncError::Transport(code)),
                };
                match result {
                    Ok(timestamp) => {
                        if let Some(on_time) = cbs.on_time.take() {
                            on_time(timestamp);
                        }
                    }
                    Err(err) => match cbs.on_error.take() {
                        Some(cb) => cb(&err),
                        None => tracing::debug!(error = %err, "current time query failed"),
                    },
                }
                Disposition::Close
            }
            Self::Override(cbs) => {
                match reply {
                    Reply::Success(_) => {
                        if let Some(done) = cbs.done.take() {
                            done();
                        }
                    }
                    Reply::Failure(code) => {
                        let err = SyncError::Transport(code);
                        match cbs.error.take() {
                            Some(cb) => cb(&err),
                            None => tracing::debug!(error = %err, "url override failed"),
                        }
                    }
                }
                Disposition::Close
            }
            Self::Destroy => {
                if let Reply::Failure(code) = reply {
                    tracing::debug!(code = %code, "destroy failed, ignored");
                }
                Disposition::Close
            }
        }
    }
}
