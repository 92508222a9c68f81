//! Clock property validity.
//!
//! A session only hands out timeline timestamps while it holds valid clock
//! properties. Validity is a two-state machine driven by exactly three
//! triggers; nothing else may change it.

/// Whether the session currently holds valid clock properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockValidity {
    #[default]
    Invalid,
    Valid,
}

/// Event that moves [`ClockValidity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityTrigger {
    /// `start` was called.
    StartRequested,
    /// A `propertiesChanged` event was dispatched.
    PropertiesChanged,
    /// An `unavailable` event was dispatched.
    Unavailable,
}

impl ClockValidity {
    /// State after `trigger`.
    pub fn on(self, trigger: ValidityTrigger) -> Self {
        match trigger {
            ValidityTrigger::PropertiesChanged => Self::Valid,
            ValidityTrigger::StartRequested | ValidityTrigger::Unavailable => Self::Invalid,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }

    /// Pass `value` through only while valid.
    pub fn mask<T>(self, value: Option<T>) -> Option<T> {
        if self.is_valid() { value } else { None }
    }
}
