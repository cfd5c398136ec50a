//! The signed-in user's schedule.
//!
//! Edits are local until an explicit [`ScheduleSession::save`], which
//! replaces the server copy wholesale. Sync progress is tracked as
//!
//! ```text
//! Clean -> Dirty -> Saving -> Clean | Error
//! ```
//!
//! All methods take `&self`. State sits behind a mutex that is released
//! before every network call, so a second caller on the same runtime sees
//! the save in flight and is turned away instead of racing it.
//!
//! Every load and token change starts a new generation. A response that
//! comes back for an older generation is dropped without touching state.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

use crate::api::ScheduleApi;
use crate::error::SessionError;
use crate::event::{AvailabilityEvent, DragOutcome, EventId, EventKind};
use crate::selection::{Rejected, Selection};
use crate::wire::{WireEvent, WireWarning, from_wire, to_wire};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Local set matches what the server last confirmed.
    Clean,
    /// Local edits not yet saved.
    Dirty,
    Saving,
    /// The last load/save failed; local edits are still there.
    Error(String),
}

/// Unsaved session state, persisted between runs of the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Who the events belong to; a draft for someone else is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub dirty: bool,
    #[serde(default)]
    pub events: Vec<WireEvent>,
}

struct Inner {
    token: Option<String>,
    generation: u64,
    /// Bumped on every local mutation.
    revision: u64,
    /// Sequence number of the overwrite currently in flight.
    saving: Option<u64>,
    next_save: u64,
    events: Vec<AvailabilityEvent>,
    status: SyncState,
}

pub struct ScheduleSession<A> {
    api: A,
    reference: Tz,
    inner: Mutex<Inner>,
}

impl<A: ScheduleApi> ScheduleSession<A> {
    pub fn new(api: A, reference: Tz, token: Option<String>) -> Self {
        ScheduleSession {
            api,
            reference,
            inner: Mutex::new(Inner {
                token,
                generation: 0,
                revision: 0,
                saving: None,
                next_save: 0,
                events: Vec::new(),
                status: SyncState::Clean,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reference_timezone(&self) -> Tz {
        self.reference
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Switch to another user's token (or none).
    ///
    /// Local events are discarded and any request still in flight becomes
    /// stale. Returns true when the token actually changed, in which case
    /// the caller should [`load`](Self::load) again.
    pub fn set_token(&self, token: Option<String>) -> bool {
        let mut inner = self.lock();
        if inner.token == token {
            return false;
        }
        inner.token = token;
        inner.generation += 1;
        inner.revision += 1;
        inner.saving = None;
        inner.events.clear();
        inner.status = SyncState::Clean;
        true
    }

    pub fn state(&self) -> SyncState {
        let inner = self.lock();
        if inner.saving.is_some() {
            SyncState::Saving
        } else {
            inner.status.clone()
        }
    }

    pub fn is_saving(&self) -> bool {
        self.lock().saving.is_some()
    }

    pub fn events(&self) -> Vec<AvailabilityEvent> {
        self.lock().events.clone()
    }

    pub fn event(&self, id: &EventId) -> Option<AvailabilityEvent> {
        self.lock().events.iter().find(|e| &e.id == id).cloned()
    }

    fn touch(inner: &mut Inner) {
        inner.revision += 1;
        inner.status = SyncState::Dirty;
    }

    /// Append an event locally.
    pub fn add_event(&self, event: AvailabilityEvent) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.events.iter().any(|e| e.id == event.id) {
            return Err(SessionError::DuplicateEvent(event.id.to_string()));
        }
        inner.events.push(event);
        Self::touch(&mut inner);
        Ok(())
    }

    /// Turn a selection into a new event and append it.
    pub fn add_selection(
        &self,
        selection: &Selection,
        kind: EventKind,
    ) -> Result<AvailabilityEvent, Rejected> {
        let event = AvailabilityEvent::from_selection(selection, kind, self.reference)?;
        let mut inner = self.lock();
        inner.events.push(event.clone());
        Self::touch(&mut inner);
        Ok(event)
    }

    /// Remove an event locally. Asking the user first is the caller's job.
    pub fn remove_event(&self, id: &EventId) -> bool {
        let mut inner = self.lock();
        let before = inner.events.len();
        inner.events.retain(|e| &e.id != id);
        let removed = inner.events.len() != before;
        if removed {
            Self::touch(&mut inner);
        }
        removed
    }

    /// Drag an event to `target`. On `Unchanged` nothing was modified.
    pub fn move_event(&self, id: &EventId, target: &Selection) -> Result<DragOutcome, SessionError> {
        let mut inner = self.lock();
        let Some(pos) = inner.events.iter().position(|e| &e.id == id) else {
            return Err(SessionError::EventNotFound(id.to_string()));
        };

        let outcome = inner.events[pos].apply_drag(target, self.reference);
        if let DragOutcome::Moved(moved) = &outcome {
            inner.events[pos] = moved.clone();
            Self::touch(&mut inner);
        }
        Ok(outcome)
    }

    /// Replace local state with the server's copy.
    ///
    /// Returns the entries that were dropped as malformed.
    pub async fn load(&self) -> Result<Vec<WireWarning>, SessionError> {
        let (token, generation) = {
            let mut inner = self.lock();
            let token = inner.token.clone().ok_or(SessionError::NotAuthenticated)?;
            inner.generation += 1;
            (token, inner.generation)
        };

        let result = self.api.fetch_schedule(&token).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            warn!("schedule load superseded, discarding response");
            return Err(SessionError::Stale);
        }

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "failed to load schedule");
                inner.status = SyncState::Error(e.to_string());
                return Err(e.into());
            }
        };
        let ingest = from_wire(&entries, self.reference);

        inner.events = ingest.events;
        inner.revision += 1;
        inner.status = SyncState::Clean;
        info!(count = inner.events.len(), dropped = ingest.warnings.len(), "schedule loaded");

        Ok(ingest.warnings)
    }

    /// Overwrite the server copy with the full local set.
    ///
    /// Returns the entries of the server's echo that could not be read. When
    /// there are any, the echo is ignored and the local set is kept as sent.
    pub async fn save(&self) -> Result<Vec<WireWarning>, SessionError> {
        self.overwrite(false).await
    }

    /// Overwrite both the server copy and local state with an empty set.
    pub async fn reset(&self) -> Result<Vec<WireWarning>, SessionError> {
        self.overwrite(true).await
    }

    async fn overwrite(&self, clear: bool) -> Result<Vec<WireWarning>, SessionError> {
        let (token, generation, revision, seq, payload) = {
            let mut inner = self.lock();
            if inner.saving.is_some() {
                return Err(SessionError::SaveInFlight);
            }
            let token = inner.token.clone().ok_or(SessionError::NotAuthenticated)?;

            inner.next_save += 1;
            let seq = inner.next_save;
            inner.saving = Some(seq);

            let payload = if clear { Vec::new() } else { to_wire(&inner.events) };
            (token, inner.generation, inner.revision, seq, payload)
        };

        let count = payload.len();
        let result = self.api.replace_schedule(&token, payload).await;

        let mut inner = self.lock();
        if inner.saving == Some(seq) {
            inner.saving = None;
        }
        if inner.generation != generation {
            warn!("schedule save superseded, discarding response");
            return Err(SessionError::Stale);
        }

        let accepted = match result {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "failed to save schedule");
                inner.status = SyncState::Error(e.to_string());
                return Err(e.into());
            }
        };

        if inner.revision != revision {
            // Edited while the request was out; the server has an older copy.
            inner.status = SyncState::Dirty;
            return Ok(Vec::new());
        }

        let mut warnings = Vec::new();
        if clear {
            inner.events.clear();
        } else if let Some(entries) = accepted {
            let ingest = from_wire(&entries, self.reference);
            if ingest.warnings.is_empty() {
                inner.events = ingest.events;
            } else {
                warn!(
                    dropped = ingest.warnings.len(),
                    "server echoed unreadable entries, keeping the local copy"
                );
                warnings = ingest.warnings;
            }
        }
        inner.revision += 1;
        inner.status = SyncState::Clean;
        info!(count, reset = clear, "schedule saved");

        Ok(warnings)
    }

    /// Capture the local set for persisting.
    pub fn snapshot(&self, owner: Option<String>) -> Draft {
        let inner = self.lock();
        Draft {
            owner,
            dirty: !matches!(inner.status, SyncState::Clean),
            events: to_wire(&inner.events),
        }
    }

    /// Replace local state with a persisted draft.
    pub fn restore(&self, draft: Draft) -> Vec<WireWarning> {
        let entries: Vec<serde_json::Value> = draft
            .events
            .iter()
            .filter_map(|e| serde_json::to_value(e).ok())
            .collect();
        let ingest = from_wire(&entries, self.reference);

        let mut inner = self.lock();
        inner.events = ingest.events;
        inner.revision += 1;
        inner.status = if draft.dirty {
            SyncState::Dirty
        } else {
            SyncState::Clean
        };
        ingest.warnings
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::event::EventSlot;
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use chrono_tz::America::Vancouver;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeApi {
        stored: Mutex<Vec<serde_json::Value>>,
        fetches: AtomicUsize,
        replaces: AtomicUsize,
        fail: AtomicBool,
        /// Returned from a save instead of the stored entries.
        echo: Option<Vec<serde_json::Value>>,
        /// When set, every call waits for a permit before answering.
        gate: Option<Arc<Notify>>,
    }

    impl FakeApi {
        fn gated() -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let api = FakeApi {
                gate: Some(gate.clone()),
                ..FakeApi::default()
            };
            (api, gate)
        }

        fn with_stored(entries: Vec<serde_json::Value>) -> Self {
            FakeApi {
                stored: Mutex::new(entries),
                ..FakeApi::default()
            }
        }

        async fn wait(&self) {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }

        fn failure(&self) -> Option<ApiError> {
            self.fail.load(Ordering::SeqCst).then(|| ApiError::Server {
                status: 500,
                detail: "boom".into(),
            })
        }
    }

    impl ScheduleApi for FakeApi {
        async fn fetch_schedule(&self, _token: &str) -> Result<Vec<serde_json::Value>, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.wait().await;
            if let Some(e) = self.failure() {
                return Err(e);
            }
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn replace_schedule(
            &self,
            _token: &str,
            events: Vec<WireEvent>,
        ) -> Result<Option<Vec<serde_json::Value>>, ApiError> {
            self.replaces.fetch_add(1, Ordering::SeqCst);
            self.wait().await;
            if let Some(e) = self.failure() {
                return Err(e);
            }
            let entries: Vec<_> = events
                .iter()
                .map(|e| serde_json::to_value(e).unwrap())
                .collect();
            *self.stored.lock().unwrap() = entries.clone();
            Ok(Some(self.echo.clone().unwrap_or(entries)))
        }
    }

    fn session(api: FakeApi) -> ScheduleSession<FakeApi> {
        ScheduleSession::new(api, Vancouver, Some("token-a".into()))
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn selection(day: u32, from: u32, to: u32) -> Selection {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        Selection::from_local(date, time(from), time(to), &Vancouver).unwrap()
    }

    #[test]
    fn local_edits_mark_dirty() {
        let session = session(FakeApi::default());
        assert_eq!(session.state(), SyncState::Clean);

        let event = session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();
        assert_eq!(session.state(), SyncState::Dirty);
        assert_eq!(session.events(), vec![event.clone()]);

        assert!(session.remove_event(&event.id));
        assert!(session.events().is_empty());
        assert!(!session.remove_event(&event.id));
    }

    #[test]
    fn rejected_selection_adds_nothing() {
        let session = session(FakeApi::default());
        let start = selection(2, 23, 23).start;
        let sel = Selection::timed(start, start + chrono::Duration::hours(2));

        assert_eq!(
            session.add_selection(&sel, EventKind::OneOff),
            Err(Rejected::CrossesDayBoundary)
        );
        assert!(session.events().is_empty());
        assert_eq!(session.state(), SyncState::Clean);
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let session = session(FakeApi::default());
        let event = session
            .add_selection(&selection(2, 9, 10), EventKind::OneOff)
            .unwrap();

        assert!(matches!(
            session.add_event(event),
            Err(SessionError::DuplicateEvent(_))
        ));
        assert_eq!(session.events().len(), 1);
    }

    #[test]
    fn move_recurring_event_keeps_id() {
        let session = session(FakeApi::default());
        let event = session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();

        let outcome = session.move_event(&event.id, &selection(3, 14, 15)).unwrap();
        assert!(matches!(outcome, DragOutcome::Moved(_)));

        let moved = session.event(&event.id).unwrap();
        assert_eq!(
            moved.slot,
            EventSlot::Recurring {
                day_of_week: Weekday::Tue,
                start_time: time(14),
                end_time: time(15),
            }
        );
    }

    #[test]
    fn move_to_all_day_row_leaves_set_unchanged() {
        let session = session(FakeApi::default());
        let event = session
            .add_selection(&selection(2, 9, 10), EventKind::OneOff)
            .unwrap();
        let before = session.events();

        let date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let target = Selection::all_day(date, &Vancouver).unwrap();

        assert_eq!(
            session.move_event(&event.id, &target).unwrap(),
            DragOutcome::Unchanged
        );
        assert_eq!(session.events(), before);
    }

    #[test]
    fn move_unknown_event_is_an_error() {
        let session = session(FakeApi::default());
        assert!(matches!(
            session.move_event(&EventId::from("missing"), &selection(3, 14, 15)),
            Err(SessionError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let session = session(FakeApi::default());
        session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();
        session
            .add_selection(&selection(5, 11, 12), EventKind::OneOff)
            .unwrap();
        let events = session.events();

        session.save().await.unwrap();
        assert_eq!(session.state(), SyncState::Clean);

        assert!(session.set_token(Some("token-b".into())));
        assert!(session.events().is_empty());
        assert!(session.set_token(Some("token-a".into())));

        let warnings = session.load().await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(session.events(), events);
        assert_eq!(session.state(), SyncState::Clean);
    }

    #[tokio::test]
    async fn load_replaces_local_state_and_reports_drops() {
        let api = FakeApi::with_stored(vec![
            serde_json::json!({ "id": "a", "dayOfWeek": 1,
                                "startTime": "09:00:00", "endTime": "10:00:00" }),
            serde_json::json!({ "id": "b" }),
        ]);
        let session = session(api);
        session
            .add_selection(&selection(4, 9, 10), EventKind::OneOff)
            .unwrap();

        let warnings = session.load().await.unwrap();

        assert_eq!(warnings.len(), 1);
        let ids: Vec<_> = session.events().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![EventId::from("a")]);
    }

    #[tokio::test]
    async fn second_save_observes_the_in_flight_guard() {
        let (api, gate) = FakeApi::gated();
        let session = session(api);
        session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();

        let (first, second, ()) = tokio::join!(
            session.save(),
            async {
                assert_eq!(session.state(), SyncState::Saving);
                session.save().await
            },
            async { gate.notify_one() }
        );

        first.unwrap();
        assert!(matches!(second, Err(SessionError::SaveInFlight)));
        assert_eq!(session.api().replaces.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), SyncState::Clean);
    }

    #[tokio::test]
    async fn reset_shares_the_guard_with_save() {
        let (api, gate) = FakeApi::gated();
        let session = session(api);

        let (first, second, ()) =
            tokio::join!(session.save(), session.reset(), async { gate.notify_one() });

        first.unwrap();
        assert!(matches!(second, Err(SessionError::SaveInFlight)));
    }

    #[tokio::test]
    async fn failed_save_keeps_local_state() {
        let session = session(FakeApi::default());
        session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();
        let before = session.events();
        session.api().fail.store(true, Ordering::SeqCst);

        assert!(session.save().await.is_err());
        assert_eq!(session.events(), before);
        assert!(matches!(session.state(), SyncState::Error(_)));
        assert!(!session.is_saving());

        session.api().fail.store(false, Ordering::SeqCst);
        session.save().await.unwrap();
        assert_eq!(session.state(), SyncState::Clean);
    }

    #[tokio::test]
    async fn failed_load_keeps_local_state() {
        let session = session(FakeApi::default());
        session
            .add_selection(&selection(2, 9, 10), EventKind::OneOff)
            .unwrap();
        let before = session.events();
        session.api().fail.store(true, Ordering::SeqCst);

        assert!(session.load().await.is_err());
        assert_eq!(session.events(), before);
        assert!(matches!(session.state(), SyncState::Error(_)));
    }

    #[tokio::test]
    async fn unreadable_echo_keeps_what_was_sent() {
        let api = FakeApi {
            echo: Some(vec![serde_json::json!({ "id": "x" })]),
            ..FakeApi::default()
        };
        let session = session(api);
        let event = session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();

        let warnings = session.save().await.unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].index, 0);
        assert_eq!(session.events(), vec![event]);
        assert_eq!(session.state(), SyncState::Clean);
        assert_eq!(session.api().stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_both_sides() {
        let session = session(FakeApi::default());
        session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();
        session.save().await.unwrap();

        session.reset().await.unwrap();

        assert!(session.events().is_empty());
        assert!(session.api().stored.lock().unwrap().is_empty());
        assert_eq!(session.state(), SyncState::Clean);
    }

    #[tokio::test]
    async fn load_for_an_old_token_is_discarded() {
        let (api, gate) = FakeApi::gated();
        let api = FakeApi {
            stored: Mutex::new(vec![serde_json::json!({ "id": "a", "dayOfWeek": 1,
                                "startTime": "09:00:00", "endTime": "10:00:00" })]),
            ..api
        };
        let session = session(api);

        let (result, ()) = tokio::join!(session.load(), async {
            session.set_token(Some("token-b".into()));
            gate.notify_one();
        });

        assert!(matches!(result, Err(SessionError::Stale)));
        assert!(session.events().is_empty());
        assert_eq!(session.token().as_deref(), Some("token-b"));
    }

    #[tokio::test]
    async fn edits_made_during_a_save_are_kept() {
        let (api, gate) = FakeApi::gated();
        let session = session(api);
        session
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();

        let (saved, late) = tokio::join!(session.save(), async {
            let late = session
                .add_selection(&selection(3, 9, 10), EventKind::OneOff)
                .unwrap();
            gate.notify_one();
            late
        });

        saved.unwrap();
        assert!(session.event(&late.id).is_some());
        assert_eq!(session.state(), SyncState::Dirty);
    }

    #[tokio::test]
    async fn calls_without_a_token_fail_fast() {
        let session = ScheduleSession::new(FakeApi::default(), Vancouver, None);
        assert!(matches!(session.load().await, Err(SessionError::NotAuthenticated)));
        assert!(matches!(session.save().await, Err(SessionError::NotAuthenticated)));
        assert_eq!(session.api().fetches.load(Ordering::SeqCst), 0);
        assert!(!session.is_saving());
    }

    #[test]
    fn snapshot_and_restore_preserve_events_and_dirtiness() {
        let first = session(FakeApi::default());
        first
            .add_selection(&selection(2, 9, 10), EventKind::Recurring)
            .unwrap();
        let draft = first.snapshot(Some("me@example.com".into()));
        assert!(draft.dirty);

        let second = session(FakeApi::default());
        assert!(second.restore(draft).is_empty());
        assert_eq!(second.events(), first.events());
        assert_eq!(second.state(), SyncState::Dirty);
    }
}
