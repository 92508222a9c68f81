//! Host failures. The `Display` text is the failure code sent to the
//! session.

use synckit_wire::{SessionId, TimelineId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("No such Synchroniser: {}", describe_id(.0))]
    UnknownSynchroniser(Option<SessionId>),

    #[error("No such Timeline: {0}")]
    UnknownTimeline(TimelineId),

    #[error("URI syntax error: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid action")]
    InvalidAction,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn describe_id(id: &Option<SessionId>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}
