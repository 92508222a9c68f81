//! Seam to the native synchronisation engine.
//!
//! The engine performs wallclock synchronisation and timeline tracking; the
//! host only drives it through these traits and relays what it reports via
//! the emitters it is handed.

use synckit_wire::TimelineDescriptor;
use url::Url;

use crate::emitter::{ContentEmitter, SyncEmitter};

/// One engine-side synchroniser.
pub trait Synchroniser {
    fn set_wallclock_update_interval(&mut self, millis: u32);

    /// Begin fetching content and timeline information. Results are
    /// reported through `events` for as long as the engine has them.
    fn obtain_synchronisation_information(&mut self, events: ContentEmitter);

    /// Timelines currently known to the engine.
    fn timelines(&self) -> Vec<TimelineDescriptor>;

    fn start_synchronisation(&mut self, timeline: &TimelineDescriptor, events: SyncEmitter);

    fn stop_synchronisation(&mut self);

    /// Synchronised presentation timestamp in nanoseconds, or `None` while
    /// the wallclock or the remote content is not available.
    fn synchronised_current_pts(&self) -> Option<i64>;

    fn set_timeline_sync_url(&mut self, url: Url);

    fn set_wallclock_url(&mut self, url: Url);
}

/// Builds synchronisers for new sessions.
pub trait SynchroniserFactory {
    type Synchroniser: Synchroniser;

    fn create(&mut self, url: &str, name: Option<&str>) -> Self::Synchroniser;
}
