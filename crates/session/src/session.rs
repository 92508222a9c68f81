//! The client-side session.
//!
//! A [`Session`] issues requests through its [`Transport`] and dispatches the
//! replies that come back on its [`EventChannel`] to the callbacks registered
//! with each request. It owns the engine-assigned identity and the clock
//! validity flag, and never blocks or retries.

use std::collections::HashMap;

use synckit_wire::{
    Action, CreateSynchroniser, OverrideUrl, SessionId, SessionRef, StartSynchroniser,
};

use crate::channel::{Delivery, EventChannel, SubscriptionId};
use crate::config::SessionOptions;
use crate::error::SyncError;
use crate::subscription::{
    CreateCallbacks, CurrentTimeCallbacks, Disposition, ObtainCallbacks, OverrideCallbacks,
    SessionState, StartOptions, StopHandler, Subscription,
};
use crate::transport::Transport;
use crate::validity::{ClockValidity, ValidityTrigger};

/// Which engine URL an override replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlKind {
    TimelineSync,
    Wallclock,
}

/// Client handle to one engine-managed synchronisation context.
pub struct Session<T: Transport> {
    transport: T,
    channel: EventChannel,
    state: SessionState,
    subscriptions: HashMap<SubscriptionId, Subscription>,
}

impl<T: Transport> Session<T> {
    /// Issue a create request. `callbacks` fire once the reply is dispatched.
    pub fn create(transport: T, options: SessionOptions, callbacks: CreateCallbacks) -> Self {
        let mut session = Self {
            transport,
            channel: EventChannel::new(),
            state: SessionState::default(),
            subscriptions: HashMap::new(),
        };
        let SessionOptions {
            url,
            name,
            wallclock_update_period_millis,
        } = options;
        session.issue(
            Action::CreateSynchroniser(CreateSynchroniser {
                url,
                name,
                wallclock_update_period_millis,
            }),
            Subscription::Create(callbacks),
        );
        session
    }

    /// Engine-assigned identity, once creation has completed.
    pub fn identity(&self) -> Option<SessionId> {
        self.state.identity
    }

    pub fn clock_validity(&self) -> ClockValidity {
        self.state.validity
    }

    pub fn has_valid_properties(&self) -> bool {
        self.state.validity.is_valid()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// True while `subscription` is still registered.
    pub fn is_pending(&self, subscription: SubscriptionId) -> bool {
        self.subscriptions.contains_key(&subscription)
    }

    /// Destroy the engine-side synchroniser.
    ///
    /// The identity is invalidated immediately. The outcome is not reported;
    /// once the reply is dispatched, streaming subscriptions opened before
    /// this call are dropped. The returned id can be polled with
    /// [`Session::is_pending`].
    pub fn destroy(&mut self) -> SubscriptionId {
        let target = self.session_ref();
        self.state.identity = None;
        self.issue(Action::DestroySynchroniser(target), Subscription::Destroy)
    }

    /// Request content and timeline information.
    pub fn obtain_synchronisation_information(
        &mut self,
        callbacks: ObtainCallbacks,
    ) -> SubscriptionId {
        self.issue(
            Action::ObtainSynchronisationInformation(self.session_ref()),
            Subscription::Obtain(callbacks),
        )
    }

    /// Start synchronising against `options.timeline_id`.
    ///
    /// Clock properties are invalid from this call until the next
    /// `propertiesChanged` event.
    pub fn start(&mut self, options: StartOptions) -> SubscriptionId {
        self.state.validity = self.state.validity.on(ValidityTrigger::StartRequested);
        let action = Action::StartSynchroniser(StartSynchroniser {
            id: self.state.identity,
            timeline_id: options.timeline_id,
        });
        self.issue(action, Subscription::Start(options.into_callbacks()))
    }

    /// Stop synchronisation. `callback` receives `None` on success.
    pub fn stop(&mut self, callback: Option<StopHandler>) -> SubscriptionId {
        self.issue(
            Action::StopSynchroniser(self.session_ref()),
            Subscription::Stop(callback),
        )
    }

    /// Current timeline position in seconds.
    ///
    /// Without valid clock properties `on_time` is called right away with
    /// `None` and no request is issued; the return value is then `None`.
    pub fn get_current_time(
        &mut self,
        on_time: impl FnOnce(Option<f64>) + 'static,
        on_error: Option<Box<dyn FnOnce(&SyncError)>>,
    ) -> Option<SubscriptionId> {
        if !self.state.validity.is_valid() {
            on_time(None);
            return None;
        }
        let subscription = Subscription::CurrentTime(CurrentTimeCallbacks {
            on_time: Some(Box::new(on_time)),
            on_error,
        });
        Some(self.issue(Action::GetCurrentTime(self.session_ref()), subscription))
    }

    pub fn override_timeline_sync_url(
        &mut self,
        url: impl Into<String>,
        callbacks: OverrideCallbacks,
    ) -> SubscriptionId {
        self.override_url(UrlKind::TimelineSync, url.into(), callbacks)
    }

    pub fn override_wallclock_url(
        &mut self,
        url: impl Into<String>,
        callbacks: OverrideCallbacks,
    ) -> SubscriptionId {
        self.override_url(UrlKind::Wallclock, url.into(), callbacks)
    }

    fn override_url(
        &mut self,
        kind: UrlKind,
        url: String,
        callbacks: OverrideCallbacks,
    ) -> SubscriptionId {
        let request = OverrideUrl {
            id: self.state.identity,
            url,
        };
        let action = match kind {
            UrlKind::TimelineSync => Action::OverrideTimelineSyncUrl(request),
            UrlKind::Wallclock => Action::OverrideWallclockUrl(request),
        };
        self.issue(action, Subscription::Override(callbacks))
    }

    /// Route one delivery to its subscription.
    pub fn dispatch(&mut self, delivery: Delivery) {
        let Delivery {
            subscription: id,
            reply,
        } = delivery;
        let Some(subscription) = self.subscriptions.get_mut(&id) else {
            tracing::warn!(subscription = id, "delivery for unknown subscription dropped");
            return;
        };
        tracing::debug!(subscription = id, "dispatching reply");

        let is_destroy = matches!(subscription, Subscription::Destroy);
        if subscription.handle(reply, &mut self.state) == Disposition::Close {
            self.subscriptions.remove(&id);
        }
        if is_destroy {
            // Streams opened before the destroy belong to the old identity.
            self.subscriptions
                .retain(|&sid, sub| sid > id || !sub.is_stream());
        }
    }

    /// Dispatch everything already queued. Returns the number dispatched.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(delivery) = self.channel.try_next() {
            self.dispatch(delivery);
            count += 1;
        }
        count
    }

    /// Wait for the next delivery and dispatch it.
    pub async fn dispatch_next(&mut self) -> bool {
        match self.channel.next().await {
            Some(delivery) => {
                self.dispatch(delivery);
                true
            }
            None => false,
        }
    }

    fn session_ref(&self) -> SessionRef {
        SessionRef {
            id: self.state.identity,
        }
    }

    fn issue(&mut self, action: Action, subscription: Subscription) -> SubscriptionId {
        let reply = self.channel.open();
        let id = reply.subscription();
        tracing::debug!(subscription = id, action = action.name(), "issuing request");
        self.subscriptions.insert(id, subscription);
        self.transport.exec(action.into(), reply);
        id
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use synckit_wire::{Event, RequestEnvelope, SyncProperties, TimelineDescriptor, TimestampProto};

    use super::*;
    use crate::channel::ReplySender;

    /// Records every request together with the sender that answers it.
    #[derive(Default)]
    struct RecordingTransport {
        requests: Vec<(Action, ReplySender)>,
    }

    impl Transport for RecordingTransport {
        fn exec(&mut self, request: RequestEnvelope, reply: ReplySender) {
            self.requests
                .push((request.action.expect("request without action"), reply));
        }
    }

    impl RecordingTransport {
        fn last(&self) -> &(Action, ReplySender) {
            self.requests.last().expect("no request issued")
        }
    }

    fn last_reply(session: &Session<RecordingTransport>) -> ReplySender {
        session.transport().last().1.clone()
    }

    /// Session whose creation has completed with identity 7.
    fn created_session() -> Session<RecordingTransport> {
        let mut session = Session::create(
            RecordingTransport::default(),
            SessionOptions::new("ws://tv.local/cii"),
            CreateCallbacks::new(),
        );
        last_reply(&session).event(&Event::Created { id: 7 });
        session.dispatch_pending();
        assert_eq!(session.identity(), Some(7));
        session
    }

    fn properties() -> SyncProperties {
        SyncProperties {
            available: true,
            speed_multiplier: Some(1.0),
            remote_wallclock: Some(1_000),
            remote_content_time: Some(2_000),
        }
    }

    #[test]
    fn test_create_sends_options_and_fires_init_once() {
        let inits = Rc::new(Cell::new(0));
        let counter = inits.clone();
        let mut session = Session::create(
            RecordingTransport::default(),
            SessionOptions::new("ws://tv.local/cii")
                .with_name("tablet")
                .with_wallclock_update_period_millis(250),
            CreateCallbacks::new().on_init(move || counter.set(counter.get() + 1)),
        );
        assert_eq!(session.identity(), None);
        assert_eq!(
            session.transport().last().0,
            Action::CreateSynchroniser(CreateSynchroniser {
                url: "ws://tv.local/cii".to_string(),
                name: Some("tablet".to_string()),
                wallclock_update_period_millis: Some(250),
            })
        );

        let reply = last_reply(&session);
        reply.event(&Event::Created { id: 3 });
        reply.event(&Event::Created { id: 4 });
        assert_eq!(session.dispatch_pending(), 2);

        assert_eq!(inits.get(), 1);
        assert_eq!(session.identity(), Some(3));
    }

    #[test]
    fn test_create_transport_failure_wraps_code() {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        let mut session = Session::create(
            RecordingTransport::default(),
            SessionOptions::new("ws://tv.local/cii"),
            CreateCallbacks::new()
                .on_init(|| panic!("init must not fire"))
                .on_error(move |err| sink.borrow_mut().push(err.to_string())),
        );
        last_reply(&session).failure("Invalid action");
        session.dispatch_pending();

        assert_eq!(*errors.borrow(), vec!["transport error: Invalid action"]);
        assert_eq!(session.identity(), None);
        assert_eq!(session.transport().requests.len(), 1);
    }

    #[test]
    fn test_requests_before_creation_pass_through() {
        let mut session = Session::create(
            RecordingTransport::default(),
            SessionOptions::new("ws://tv.local/cii"),
            CreateCallbacks::new(),
        );
        session.stop(None);
        assert_eq!(
            session.transport().last().0,
            Action::StopSynchroniser(SessionRef { id: None })
        );
    }

    /// The full start scenario: masking follows property validity.
    #[test]
    fn test_start_scenario_masks_wallclock_until_properties() {
        let mut session = created_session();
        let updates = Rc::new(RefCell::new(Vec::new()));
        let props = Rc::new(RefCell::new(Vec::new()));
        let unavailable = Rc::new(Cell::new(0));

        let (u, p, n) = (updates.clone(), props.clone(), unavailable.clone());
        session.start(
            StartOptions::new(7)
                .on_wallclock_updated(move |ts| u.borrow_mut().push(ts))
                .on_properties_changed(move |ts, pr| p.borrow_mut().push((ts, pr.clone())))
                .on_unavailable(move || n.set(n.get() + 1)),
        );
        assert_eq!(
            session.transport().last().0,
            Action::StartSynchroniser(StartSynchroniser {
                id: Some(7),
                timeline_id: 7,
            })
        );
        let reply = last_reply(&session);

        reply.event(&Event::Unavailable);
        session.dispatch_pending();
        assert!(!session.has_valid_properties());
        let times = Rc::new(RefCell::new(Vec::new()));
        let t = times.clone();
        assert_eq!(session.get_current_time(move |ts| t.borrow_mut().push(ts), None), None);
        assert_eq!(*times.borrow(), vec![None]);

        reply.event(&Event::PropertiesChanged {
            timestamp: Some(100.0),
            properties: properties(),
        });
        session.dispatch_pending();
        assert!(session.has_valid_properties());
        assert_eq!(*props.borrow(), vec![(Some(100.0), properties())]);

        reply.event(&Event::WallclockUpdated(Some(105.0)));
        reply.event(&Event::Unavailable);
        reply.event(&Event::WallclockUpdated(Some(110.0)));
        session.dispatch_pending();

        assert!(!session.has_valid_properties());
        assert_eq!(*updates.borrow(), vec![Some(105.0), None]);
        assert_eq!(unavailable.get(), 2);
    }

    #[test]
    fn test_start_resets_validity() {
        let mut session = created_session();
        session.start(StartOptions::new(1));
        last_reply(&session).event(&Event::PropertiesChanged {
            timestamp: Some(1.0),
            properties: properties(),
        });
        session.dispatch_pending();
        assert!(session.has_valid_properties());

        session.start(StartOptions::new(2));
        assert_eq!(session.clock_validity(), ClockValidity::Invalid);
    }

    #[test]
    fn test_payload_free_start_events_leave_validity() {
        let mut session = created_session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c) = (seen.clone(), seen.clone(), seen.clone());
        session.start(
            StartOptions::new(1)
                .on_started(move || a.borrow_mut().push("started"))
                .on_wallclock_synced(move || b.borrow_mut().push("wallclockSynced"))
                .on_available(move || c.borrow_mut().push("available")),
        );
        let reply = last_reply(&session);
        reply.event(&Event::Started);
        reply.event(&Event::WallclockSynced);
        reply.event(&Event::Available);
        session.dispatch_pending();

        assert_eq!(*seen.borrow(), vec!["started", "wallclockSynced", "available"]);
        assert!(!session.has_valid_properties());
    }

    #[test]
    fn test_validity_changes_without_callbacks() {
        let mut session = created_session();
        session.start(StartOptions::new(1));
        let reply = last_reply(&session);

        reply.event(&Event::PropertiesChanged {
            timestamp: None,
            properties: SyncProperties::default(),
        });
        session.dispatch_pending();
        assert!(session.has_valid_properties());

        reply.event(&Event::Unavailable);
        session.dispatch_pending();
        assert!(!session.has_valid_properties());
    }

    #[test]
    fn test_start_transport_failure_keeps_validity() {
        let mut session = created_session();
        session.start(StartOptions::new(1));
        last_reply(&session).event(&Event::PropertiesChanged {
            timestamp: Some(5.0),
            properties: properties(),
        });
        session.dispatch_pending();

        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        let second = session.start(
            StartOptions::new(99).on_error(move |err| sink.borrow_mut().push(err.to_string())),
        );
        // Re-validate through the first stream, then fail the second start.
        session.transport().requests[1].1.event(&Event::PropertiesChanged {
            timestamp: Some(6.0),
            properties: properties(),
        });
        last_reply(&session).failure("No such Timeline: 99");
        session.dispatch_pending();

        assert_eq!(*errors.borrow(), vec!["transport error: No such Timeline: 99"]);
        assert!(session.has_valid_properties());
        assert!(!session.is_pending(second));
    }

    #[test]
    fn test_engine_error_is_verbatim() {
        let mut session = created_session();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        session.obtain_synchronisation_information(
            ObtainCallbacks::new().on_error(move |err| {
                sink.borrow_mut().push((err.is_engine(), err.to_string()))
            }),
        );
        let reply = last_reply(&session);
        reply.event(&Event::Error("Error parsing CII".to_string()));
        reply.failure("No such Synchroniser: 7");
        session.dispatch_pending();

        assert_eq!(
            *errors.borrow(),
            vec![
                (true, "Error parsing CII".to_string()),
                (false, "transport error: No such Synchroniser: 7".to_string()),
            ]
        );
    }

    #[test]
    fn test_timelines_available_replaces_list() {
        let mut session = created_session();
        let batches = Rc::new(RefCell::new(Vec::new()));
        let sink = batches.clone();
        session.obtain_synchronisation_information(
            ObtainCallbacks::new().on_timelines_available(move |t| sink.borrow_mut().push(t.to_vec())),
        );
        let first = vec![TimelineDescriptor {
            id: 1,
            selector: "urn:dvb:css:timeline:pts".to_string(),
        }];
        let second = vec![
            TimelineDescriptor {
                id: 1,
                selector: "urn:dvb:css:timeline:temi:1:1".to_string(),
            },
            TimelineDescriptor {
                id: 2,
                selector: "urn:dvb:css:timeline:pts".to_string(),
            },
        ];
        let reply = last_reply(&session);
        reply.event(&Event::TimelinesAvailable(first.clone()));
        reply.event(&Event::TimelinesAvailable(second.clone()));
        session.dispatch_pending();

        assert_eq!(*batches.borrow(), vec![first, second]);
    }

    #[test]
    fn test_obtain_routes_each_tag() {
        let mut session = created_session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c) = (seen.clone(), seen.clone(), seen.clone());
        let sub = session.obtain_synchronisation_information(
            ObtainCallbacks::new()
                .on_obtain_started(move || a.borrow_mut().push("started".to_string()))
                .on_content(move |id| b.borrow_mut().push(format!("content {id}")))
                .on_sync_message(move |msg| c.borrow_mut().push(format!("msg {}", msg["contentId"]))),
        );
        let reply = last_reply(&session);
        reply.event(&Event::ObtainStarted);
        reply.event(&Event::ContentIdChanged("dvb://1.2.3".to_string()));
        reply.event(&Event::SyncMessage(serde_json::json!({ "contentId": "dvb://1.2.3" })));
        // Start-only events are ignored here.
        reply.event(&Event::WallclockUpdated(Some(1.0)));
        session.dispatch_pending();

        assert_eq!(
            *seen.borrow(),
            vec![
                "started".to_string(),
                "content dvb://1.2.3".to_string(),
                "msg \"dvb://1.2.3\"".to_string(),
            ]
        );
        assert!(session.is_pending(sub));
    }

    #[test]
    fn test_unknown_tag_is_dropped() {
        #[derive(Clone, PartialEq, prost::Message)]
        struct FutureEnvelope {
            #[prost(string, tag = "42")]
            future: String,
        }

        let mut session = created_session();
        let errors = Rc::new(Cell::new(0));
        let sink = errors.clone();
        let sub = session.start(
            StartOptions::new(1).on_error(move |_| sink.set(sink.get() + 1)),
        );
        last_reply(&session).success_message(&FutureEnvelope {
            future: "later".to_string(),
        });
        session.dispatch_pending();

        assert_eq!(errors.get(), 0);
        assert!(session.is_pending(sub));
    }

    #[test]
    fn test_malformed_event_reports_error_and_keeps_stream() {
        let mut session = created_session();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        let sub = session.start(
            StartOptions::new(1).on_error(move |err| {
                sink.borrow_mut()
                    .push(matches!(err, SyncError::MalformedEvent(_)))
            }),
        );
        last_reply(&session).success(vec![0xff, 0xff, 0xff]);
        session.dispatch_pending();

        assert_eq!(*errors.borrow(), vec![true]);
        assert!(session.is_pending(sub));
    }

    #[test]
    fn test_stop_reports_null_or_error() {
        let mut session = created_session();
        let outcomes = Rc::new(RefCell::new(Vec::new()));

        let sink = outcomes.clone();
        session.stop(Some(Box::new(move |err: Option<&SyncError>| {
            sink.borrow_mut().push(err.map(ToString::to_string))
        })));
        last_reply(&session).ack();

        let sink = outcomes.clone();
        session.stop(Some(Box::new(move |err: Option<&SyncError>| {
            sink.borrow_mut().push(err.map(ToString::to_string))
        })));
        last_reply(&session).failure("No such Synchroniser: 7");
        session.dispatch_pending();

        assert_eq!(
            *outcomes.borrow(),
            vec![
                None,
                Some("transport error: No such Synchroniser: 7".to_string())
            ]
        );
    }

    #[test]
    fn test_stop_and_start_coexist() {
        let mut session = created_session();
        let start = session.start(StartOptions::new(1));
        let stop = session.stop(None);
        session.transport().requests[1].1.event(&Event::Started);
        last_reply(&session).ack();
        session.dispatch_pending();

        assert!(session.is_pending(start));
        assert!(!session.is_pending(stop));
    }

    #[test]
    fn test_current_time_queries_engine_when_valid() {
        let mut session = created_session();
        session.start(StartOptions::new(1));
        last_reply(&session).event(&Event::PropertiesChanged {
            timestamp: Some(100.0),
            properties: properties(),
        });
        session.dispatch_pending();
        let before = session.transport().requests.len();

        let times = Rc::new(RefCell::new(Vec::new()));
        let t = times.clone();
        let sub = session.get_current_time(move |ts| t.borrow_mut().push(ts), None);
        assert!(sub.is_some());
        assert_eq!(session.transport().requests.len(), before + 1);
        assert_eq!(
            session.transport().last().0,
            Action::GetCurrentTime(SessionRef { id: Some(7) })
        );
        assert!(times.borrow().is_empty());

        last_reply(&session).success_message(&TimestampProto {
            timestamp: Some(101.5),
        });
        session.dispatch_pending();
        assert_eq!(*times.borrow(), vec![Some(101.5)]);
    }

    #[test]
    fn test_current_time_without_properties_issues_nothing() {
        let mut session = created_session();
        let before = session.transport().requests.len();
        let called = Rc::new(Cell::new(false));
        let c = called.clone();

        let sub = session.get_current_time(
            move |ts| {
                assert_eq!(ts, None);
                c.set(true);
            },
            None,
        );

        assert!(called.get());
        assert_eq!(sub, None);
        assert_eq!(session.transport().requests.len(), before);
    }

    #[test]
    fn test_current_time_failure_routes_to_error_callback() {
        let mut session = created_session();
        session.start(StartOptions::new(1));
        last_reply(&session).event(&Event::PropertiesChanged {
            timestamp: Some(1.0),
            properties: properties(),
        });
        session.dispatch_pending();

        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        session.get_current_time(
            |_| panic!("timestamp must not be delivered"),
            Some(Box::new(move |err: &SyncError| {
                sink.borrow_mut().push(err.to_string())
            })),
        );
        last_reply(&session).failure("No such Synchroniser: 7");
        session.dispatch_pending();

        assert_eq!(*errors.borrow(), vec!["transport error: No such Synchroniser: 7"]);
    }

    #[test]
    fn test_url_overrides_share_completion() {
        let mut session = created_session();
        let results = Rc::new(RefCell::new(Vec::new()));

        let (ok, err) = (results.clone(), results.clone());
        session.override_timeline_sync_url(
            "ws://tv.local/ts",
            OverrideCallbacks::new()
                .on_done(move || ok.borrow_mut().push("done".to_string()))
                .on_error(move |e| err.borrow_mut().push(e.to_string())),
        );
        assert_eq!(
            session.transport().last().0,
            Action::OverrideTimelineSyncUrl(OverrideUrl {
                id: Some(7),
                url: "ws://tv.local/ts".to_string(),
            })
        );
        last_reply(&session).ack();

        let (ok, err) = (results.clone(), results.clone());
        session.override_wallclock_url(
            "not a url",
            OverrideCallbacks::new()
                .on_done(move || ok.borrow_mut().push("done".to_string()))
                .on_error(move |e| err.borrow_mut().push(e.to_string())),
        );
        assert!(matches!(
            session.transport().last().0,
            Action::OverrideWallclockUrl(_)
        ));
        last_reply(&session).failure("URI syntax error: relative URL without a base");
        session.dispatch_pending();

        assert_eq!(
            *results.borrow(),
            vec![
                "done".to_string(),
                "transport error: URI syntax error: relative URL without a base".to_string(),
            ]
        );
    }

    #[test]
    fn test_destroy_invalidates_identity_and_drops_streams() {
        let mut session = created_session();
        let events = Rc::new(Cell::new(0));
        let sink = events.clone();
        let start = session.start(StartOptions::new(1).on_started(move || sink.set(sink.get() + 1)));
        let start_reply = last_reply(&session);

        let destroy = session.destroy();
        assert_eq!(session.identity(), None);
        assert_eq!(
            session.transport().last().0,
            Action::DestroySynchroniser(SessionRef { id: Some(7) })
        );
        assert!(session.is_pending(destroy));

        last_reply(&session).failure("No such Synchroniser: 7");
        session.dispatch_pending();
        assert!(!session.is_pending(destroy));
        assert!(!session.is_pending(start));

        start_reply.event(&Event::Started);
        session.dispatch_pending();
        assert_eq!(events.get(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_next_waits_for_delivery() {
        let mut session = Session::create(
            RecordingTransport::default(),
            SessionOptions::new("ws://tv.local/cii"),
            CreateCallbacks::new(),
        );
        let reply = last_reply(&session);
        let handle = std::thread::spawn(move || reply.event(&Event::Created { id: 11 }));

        assert!(session.dispatch_next().await);
        assert_eq!(session.identity(), Some(11));
        assert!(handle.join().unwrap());
    }
}
