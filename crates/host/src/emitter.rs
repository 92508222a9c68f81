//! Event emitters handed to the engine.
//!
//! Each emitter is bound to one session subscription and turns engine
//! notifications into tagged events on it. Emitters are `Send` so the engine
//! may report from its own threads.

use synckit_session::ReplySender;
use synckit_wire::{Event, SyncProperties, TimelineDescriptor};

/// Nanoseconds per second, for engine timestamp conversion.
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Convert an engine presentation timestamp to seconds.
pub fn nanos_to_seconds(nanos: i64) -> f64 {
    nanos as f64 / NANOS_PER_SECOND
}

fn emit(reply: &ReplySender, event: Event) {
    let tag = event.tag();
    if !reply.event(&event) {
        tracing::debug!(
            subscription = reply.subscription(),
            tag,
            "session gone, event dropped"
        );
    }
}

/// Reports content and timeline information for an obtain-info request.
#[derive(Debug, Clone)]
pub struct ContentEmitter {
    reply: ReplySender,
}

impl ContentEmitter {
    pub fn new(reply: ReplySender) -> Self {
        Self { reply }
    }

    pub fn content_id_changed(&self, content_id: &str) {
        emit(&self.reply, Event::ContentIdChanged(content_id.to_string()));
    }

    /// Report the full current timeline list.
    pub fn timelines_available(&self, timelines: &[TimelineDescriptor]) {
        emit(&self.reply, Event::TimelinesAvailable(timelines.to_vec()));
    }

    pub fn error(&self, description: &str) {
        emit(&self.reply, Event::Error(description.to_string()));
    }

    pub fn sync_message(&self, msg: &serde_json::Value) {
        emit(&self.reply, Event::SyncMessage(msg.clone()));
    }

    /// True once the receiving session is gone.
    pub fn is_closed(&self) -> bool {
        self.reply.is_closed()
    }
}

/// Timeline state reported by the engine with each control timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertiesUpdate {
    pub available: bool,
    pub speed_multiplier: f32,
    pub remote_wallclock: i64,
    pub remote_content_time: i64,
}

/// Reports synchronisation progress for a start request.
#[derive(Debug, Clone)]
pub struct SyncEmitter {
    reply: ReplySender,
}

impl SyncEmitter {
    pub fn new(reply: ReplySender) -> Self {
        Self { reply }
    }

    pub fn wallclock_synced(&self) {
        emit(&self.reply, Event::WallclockSynced);
    }

    /// `current_pts` is the engine's presentation timestamp in nanoseconds,
    /// `None` when not valid.
    pub fn wallclock_updated(&self, current_pts: Option<i64>) {
        emit(
            &self.reply,
            Event::WallclockUpdated(current_pts.map(nanos_to_seconds)),
        );
    }

    pub fn timeline_available(&self) {
        emit(&self.reply, Event::Available);
    }

    pub fn timeline_unavailable(&self) {
        emit(&self.reply, Event::Unavailable);
    }

    /// Detail fields and the timestamp are only sent while the timeline is
    /// available and `current_pts` is valid.
    pub fn properties_changed(&self, update: PropertiesUpdate, current_pts: Option<i64>) {
        let event = match current_pts {
            Some(pts) if update.available => Event::PropertiesChanged {
                timestamp: Some(nanos_to_seconds(pts)),
                properties: SyncProperties {
                    available: true,
                    speed_multiplier: Some(update.speed_multiplier),
                    remote_wallclock: Some(update.remote_wallclock),
                    remote_content_time: Some(update.remote_content_time),
                },
            },
            _ => Event::PropertiesChanged {
                timestamp: None,
                properties: SyncProperties {
                    available: update.available,
                    ..Default::default()
                },
            },
        };
        emit(&self.reply, event);
    }

    /// True once the receiving session is gone.
    pub fn is_closed(&self) -> bool {
        self.reply.is_closed()
    }
}
