//! Scripted engine for exercising the host without a native engine.
//!
//! [`ScriptedSynchroniser`] records what the host asks of it and keeps the
//! emitters it is handed, so a test can play the engine's side of a
//! conversation step by step.
//!
//! ```
//! use synckit_host::testing::ScriptedFactory;
//! use synckit_host::SyncKitHost;
//!
//! let host = SyncKitHost::new(ScriptedFactory::default());
//! assert_eq!(host.session_count(), 0);
//! ```

use synckit_wire::TimelineDescriptor;
use url::Url;

use crate::emitter::{ContentEmitter, SyncEmitter};
use crate::engine::{Synchroniser, SynchroniserFactory};

/// Engine stand-in driven by the test.
#[derive(Debug, Default)]
pub struct ScriptedSynchroniser {
    pub url: String,
    pub name: Option<String>,
    pub wallclock_update_interval: Option<u32>,
    pub timelines: Vec<TimelineDescriptor>,
    /// Presentation timestamp returned to current-time queries.
    pub current_pts: Option<i64>,
    pub content_events: Option<ContentEmitter>,
    pub sync_events: Option<SyncEmitter>,
    pub synchronised_timeline: Option<TimelineDescriptor>,
    pub timeline_sync_url: Option<Url>,
    pub wallclock_url: Option<Url>,
    pub stop_count: usize,
}

impl ScriptedSynchroniser {
    /// Emitter from the last obtain-info request.
    ///
    /// # Panics
    /// If no obtain-info request has been executed.
    pub fn content(&self) -> &ContentEmitter {
        self.content_events
            .as_ref()
            .expect("obtain_synchronisation_information was not called")
    }

    /// Emitter from the last start request.
    ///
    /// # Panics
    /// If no start request has been executed.
    pub fn sync(&self) -> &SyncEmitter {
        self.sync_events
            .as_ref()
            .expect("start_synchronisation was not called")
    }
}

impl Synchroniser for ScriptedSynchroniser {
    fn set_wallclock_update_interval(&mut self, millis: u32) {
        self.wallclock_update_interval = Some(millis);
    }

    fn obtain_synchronisation_information(&mut self, events: ContentEmitter) {
        self.content_events = Some(events);
    }

    fn timelines(&self) -> Vec<TimelineDescriptor> {
        self.timelines.clone()
    }

    fn start_synchronisation(&mut self, timeline: &TimelineDescriptor, events: SyncEmitter) {
        self.synchronised_timeline = Some(timeline.clone());
        self.sync_events = Some(events);
    }

    fn stop_synchronisation(&mut self) {
        self.stop_count += 1;
        self.sync_events = None;
    }

    fn synchronised_current_pts(&self) -> Option<i64> {
        self.current_pts
    }

    fn set_timeline_sync_url(&mut self, url: Url) {
        self.timeline_sync_url = Some(url);
    }

    fn set_wallclock_url(&mut self, url: Url) {
        self.wallclock_url = Some(url);
    }
}

/// Factory producing [`ScriptedSynchroniser`]s preloaded with `timelines`.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    pub timelines: Vec<TimelineDescriptor>,
}

impl ScriptedFactory {
    pub fn with_timelines(timelines: Vec<TimelineDescriptor>) -> Self {
        Self { timelines }
    }
}

impl SynchroniserFactory for ScriptedFactory {
    type Synchroniser = ScriptedSynchroniser;

    fn create(&mut self, url: &str, name: Option<&str>) -> ScriptedSynchroniser {
        ScriptedSynchroniser {
            url: url.to_string(),
            name: name.map(str::to_string),
            timelines: self.timelines.clone(),
            ..Default::default()
        }
    }
}
