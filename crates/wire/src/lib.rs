//! SyncKit Wire Types
//!
//! This crate defines the envelopes exchanged between a client `Session` and
//! the engine host. Both sides MUST depend on this crate so the encoding of
//! requests and events cannot drift apart.
//!
//! # Message Categories
//!
//! - **Requests** (session → host): one [`RequestEnvelope`] per operation,
//!   carrying exactly one [`Action`].
//! - **Events** (host → session): one [`EventEnvelope`] per delivery,
//!   carrying exactly one [`EventKind`]. An envelope whose tag this build
//!   does not know decodes with `kind: None` and is dropped by the receiver.
//! - **Replies** without a tag: [`TimestampProto`] answers a current-time
//!   query; acknowledgements carry an empty payload.

#![deny(unsafe_code)]

use prost::{Message, Oneof};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Engine-assigned identity of one synchroniser.
pub type SessionId = u64;

/// Timeline identifier, unique within one `timelinesAvailable` batch.
pub type TimelineId = i32;

// ============================================================================
// Requests
// ============================================================================

/// Request sent from a session to the engine host.
#[derive(Clone, PartialEq, Message)]
pub struct RequestEnvelope {
    #[prost(oneof = "Action", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub action: Option<Action>,
}

/// The operation a request asks the host to run.
#[derive(Clone, PartialEq, Oneof)]
pub enum Action {
    #[prost(message, tag = "1")]
    CreateSynchroniser(CreateSynchroniser),
    #[prost(message, tag = "2")]
    DestroySynchroniser(SessionRef),
    #[prost(message, tag = "3")]
    ObtainSynchronisationInformation(SessionRef),
    #[prost(message, tag = "4")]
    StartSynchroniser(StartSynchroniser),
    #[prost(message, tag = "5")]
    StopSynchroniser(SessionRef),
    #[prost(message, tag = "6")]
    GetCurrentTime(SessionRef),
    #[prost(message, tag = "7")]
    OverrideTimelineSyncUrl(OverrideUrl),
    #[prost(message, tag = "8")]
    OverrideWallclockUrl(OverrideUrl),
}

impl Action {
    /// Action name as used in host logs and failure codes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSynchroniser(_) => "createSynchroniser",
            Self::DestroySynchroniser(_) => "destroySynchroniser",
            Self::ObtainSynchronisationInformation(_) => "obtainSynchronisationInformation",
            Self::StartSynchroniser(_) => "startSynchroniser",
            Self::StopSynchroniser(_) => "stopSynchroniser",
            Self::GetCurrentTime(_) => "getSynchroniserCurrentTime",
            Self::OverrideTimelineSyncUrl(_) => "overrideTimelineSyncUrl",
            Self::OverrideWallclockUrl(_) => "overrideWallclockUrl",
        }
    }
}

impl From<Action> for RequestEnvelope {
    fn from(action: Action) -> Self {
        Self {
            action: Some(action),
        }
    }
}

/// Create a synchroniser for `url`.
#[derive(Clone, PartialEq, Message)]
pub struct CreateSynchroniser {
    #[prost(string, tag = "1")]
    pub url: String,

    /// Optional human label.
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,

    /// Wallclock update cadence. Applied by the host only when positive.
    #[prost(uint32, optional, tag = "3")]
    pub wallclock_update_period_millis: Option<u32>,
}

/// Reference to an existing synchroniser.
///
/// `id` is absent when the caller issues a request before creation has
/// completed; the host rejects it like any unknown identity.
#[derive(Clone, PartialEq, Message)]
pub struct SessionRef {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<SessionId>,
}

/// Start synchronising against one timeline.
#[derive(Clone, PartialEq, Message)]
pub struct StartSynchroniser {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<SessionId>,

    #[prost(int32, tag = "2")]
    pub timeline_id: TimelineId,
}

/// Replace one of the engine's service URLs.
#[derive(Clone, PartialEq, Message)]
pub struct OverrideUrl {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<SessionId>,

    #[prost(string, tag = "2")]
    pub url: String,
}

// ============================================================================
// Events
// ============================================================================

/// Tagged event pushed from the host to a session subscription.
#[derive(Clone, PartialEq, Message)]
pub struct EventEnvelope {
    #[prost(oneof = "EventKind", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12")]
    pub kind: Option<EventKind>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum EventKind {
    #[prost(message, tag = "1")]
    Created(Created),
    #[prost(message, tag = "2")]
    ObtainStarted(Empty),
    #[prost(message, tag = "3")]
    ContentIdChanged(ContentIdChanged),
    #[prost(message, tag = "4")]
    TimelinesAvailable(TimelineList),
    #[prost(message, tag = "5")]
    Started(Empty),
    #[prost(message, tag = "6")]
    WallclockSynced(Empty),
    #[prost(message, tag = "7")]
    WallclockUpdated(TimestampProto),
    #[prost(message, tag = "8")]
    Available(Empty),
    #[prost(message, tag = "9")]
    Unavailable(Empty),
    #[prost(message, tag = "10")]
    PropertiesChanged(PropertiesChanged),
    #[prost(message, tag = "11")]
    SyncMessage(SyncMessage),
    #[prost(message, tag = "12")]
    Error(ErrorDescription),
}

/// Payload-free event body.
#[derive(Clone, PartialEq, Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, Message)]
pub struct Created {
    #[prost(uint64, tag = "1")]
    pub id: SessionId,
}

#[derive(Clone, PartialEq, Message)]
pub struct ContentIdChanged {
    #[prost(string, tag = "1")]
    pub content_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct TimelineList {
    #[prost(message, repeated, tag = "1")]
    pub timelines: Vec<TimelineProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TimelineProto {
    #[prost(int32, tag = "1")]
    pub id: TimelineId,

    #[prost(string, tag = "2")]
    pub selector: String,
}

/// Timeline position in seconds, or absent when not meaningful.
///
/// Also used as the reply body of a current-time query.
#[derive(Clone, PartialEq, Message)]
pub struct TimestampProto {
    #[prost(double, optional, tag = "1")]
    pub timestamp: Option<f64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PropertiesChanged {
    #[prost(double, optional, tag = "1")]
    pub timestamp: Option<f64>,

    #[prost(message, optional, tag = "2")]
    pub properties: Option<SyncPropertiesProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SyncPropertiesProto {
    #[prost(bool, tag = "1")]
    pub available: bool,

    #[prost(float, optional, tag = "2")]
    pub speed_multiplier: Option<f32>,

    #[prost(int64, optional, tag = "3")]
    pub remote_wallclock: Option<i64>,

    #[prost(int64, optional, tag = "4")]
    pub remote_content_time: Option<i64>,
}

/// Raw synchronisation message, carried as JSON text.
#[derive(Clone, PartialEq, Message)]
pub struct SyncMessage {
    #[prost(string, tag = "1")]
    pub json: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ErrorDescription {
    #[prost(string, tag = "1")]
    pub description: String,
}

// ============================================================================
// Domain Types
// ============================================================================

/// A timeline the engine can synchronise against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineDescriptor {
    pub id: TimelineId,
    pub selector: String,
}

/// Metadata accompanying a clock timestamp.
///
/// Everything except `available` is present only while the remote timeline
/// is available and the engine's presentation timestamp is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProperties {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_wallclock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_content_time: Option<i64>,
}

/// Event pushed by the engine, one variant per tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Created { id: SessionId },
    ObtainStarted,
    ContentIdChanged(String),
    TimelinesAvailable(Vec<TimelineDescriptor>),
    Started,
    WallclockSynced,
    WallclockUpdated(Option<f64>),
    Available,
    Unavailable,
    PropertiesChanged {
        timestamp: Option<f64>,
        properties: SyncProperties,
    },
    SyncMessage(serde_json::Value),
    Error(String),
}

/// Failure to turn an event payload into an [`Event`].
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("malformed event envelope: {0}")]
    Envelope(#[from] prost::DecodeError),
    #[error("malformed sync message: {0}")]
    SyncMessage(#[from] serde_json::Error),
}

impl Event {
    /// Event tag as named on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::ObtainStarted => "obtainStarted",
            Self::ContentIdChanged(_) => "contentIdChanged",
            Self::TimelinesAvailable(_) => "timelinesAvailable",
            Self::Started => "started",
            Self::WallclockSynced => "wallclockSynced",
            Self::WallclockUpdated(_) => "wallclockUpdated",
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::PropertiesChanged { .. } => "propertiesChanged",
            Self::SyncMessage(_) => "syncMessage",
            Self::Error(_) => "error",
        }
    }

    /// Decode one event payload.
    ///
    /// Returns `Ok(None)` for an envelope with no recognised tag.
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>, EventDecodeError> {
        let envelope = EventEnvelope::decode(bytes)?;
        Self::from_envelope(envelope)
    }

    /// Convert a decoded envelope. Unknown tags yield `Ok(None)`.
    pub fn from_envelope(envelope: EventEnvelope) -> Result<Option<Self>, EventDecodeError> {
        let Some(kind) = envelope.kind else {
            return Ok(None);
        };
        let event = match kind {
            EventKind::Created(c) => Self::Created { id: c.id },
            EventKind::ObtainStarted(_) => Self::ObtainStarted,
            EventKind::ContentIdChanged(c) => Self::ContentIdChanged(c.content_id),
            EventKind::TimelinesAvailable(list) => {
                Self::TimelinesAvailable(list.timelines.into_iter().map(Into::into).collect())
            }
            EventKind::Started(_) => Self::Started,
            EventKind::WallclockSynced(_) => Self::WallclockSynced,
            EventKind::WallclockUpdated(t) => Self::WallclockUpdated(t.timestamp),
            EventKind::Available(_) => Self::Available,
            EventKind::Unavailable(_) => Self::Unavailable,
            EventKind::PropertiesChanged(p) => Self::PropertiesChanged {
                timestamp: p.timestamp,
                properties: p.properties.map(Into::into).unwrap_or_default(),
            },
            EventKind::SyncMessage(m) => Self::SyncMessage(serde_json::from_str(&m.json)?),
            EventKind::Error(e) => Self::Error(e.description),
        };
        Ok(Some(event))
    }

    /// Encode as an [`EventEnvelope`].
    pub fn encode_to_vec(&self) -> Vec<u8> {
        EventEnvelope::from(self.clone()).encode_to_vec()
    }
}

// ============================================================================
// Conversion Traits
// ============================================================================

impl From<Event> for EventEnvelope {
    fn from(event: Event) -> Self {
        let kind = match event {
            Event::Created { id } => EventKind::Created(Created { id }),
            Event::ObtainStarted => EventKind::ObtainStarted(Empty {}),
            Event::ContentIdChanged(content_id) => {
                EventKind::ContentIdChanged(ContentIdChanged { content_id })
            }
            Event::TimelinesAvailable(timelines) => EventKind::TimelinesAvailable(TimelineList {
                timelines: timelines.into_iter().map(Into::into).collect(),
            }),
            Event::Started => EventKind::Started(Empty {}),
            Event::WallclockSynced => EventKind::WallclockSynced(Empty {}),
            Event::WallclockUpdated(timestamp) => {
                EventKind::WallclockUpdated(TimestampProto { timestamp })
            }
            Event::Available => EventKind::Available(Empty {}),
            Event::Unavailable => EventKind::Unavailable(Empty {}),
            Event::PropertiesChanged {
                timestamp,
                properties,
            } => EventKind::PropertiesChanged(PropertiesChanged {
                timestamp,
                properties: Some(properties.into()),
            }),
            Event::SyncMessage(msg) => EventKind::SyncMessage(SyncMessage {
                json: msg.to_string(),
            }),
            Event::Error(description) => EventKind::Error(ErrorDescription { description }),
        };
        Self { kind: Some(kind) }
    }
}

impl From<TimelineDescriptor> for TimelineProto {
    fn from(t: TimelineDescriptor) -> Self {
        Self {
            id: t.id,
            selector: t.selector,
        }
    }
}

impl From<TimelineProto> for TimelineDescriptor {
    fn from(t: TimelineProto) -> Self {
        Self {
            id: t.id,
            selector: t.selector,
        }
    }
}

impl From<SyncProperties> for SyncPropertiesProto {
    fn from(p: SyncProperties) -> Self {
        Self {
            available: p.available,
            speed_multiplier: p.speed_multiplier,
            remote_wallclock: p.remote_wallclock,
            remote_content_time: p.remote_content_time,
        }
    }
}

impl From<SyncPropertiesProto> for SyncProperties {
    fn from(p: SyncPropertiesProto) -> Self {
        Self {
            available: p.available,
            speed_multiplier: p.speed_multiplier,
            remote_wallclock: p.remote_wallclock,
            remote_content_time: p.remote_content_time,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
