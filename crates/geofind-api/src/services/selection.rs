//! Currently selected location, shared by the search, map, and detail views.
//!
//! Every update goes through a ticket. [`SelectionState::begin`] issues
//! monotonically increasing tickets and [`SelectionState::apply`] only
//! accepts the most recently issued one, so a slow resolution can never
//! overwrite the result of a newer request.
//!
//! Sessions live in a [`SelectionHub`]. A session nobody holds or listens to
//! is dropped once it has been idle for the configured TTL, or earlier when
//! the hub is full.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockWriteGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use geofind_core::{defaults, ResolvedLocation, Result};

/// What caused a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrigin {
    Search,
    MapClick,
    Favorite,
    History,
}

impl SelectionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionOrigin::Search => "search",
            SelectionOrigin::MapClick => "map_click",
            SelectionOrigin::Favorite => "favorite",
            SelectionOrigin::History => "history",
        }
    }
}

/// Permission to update the selection, valid until a newer one is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SelectionTicket(u64);

impl SelectionTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// An applied selection, as broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionChange {
    pub sequence: u64,
    pub location: ResolvedLocation,
    pub origin: SelectionOrigin,
}

/// Point-in-time view of the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    /// Latest ticket issued, applied or not.
    pub issued: u64,
    /// The selected location, `None` until the first change.
    pub current: Option<SelectionChange>,
}

struct Inner {
    issued: u64,
    current: Option<SelectionChange>,
    last_active: Instant,
}

/// Holds at most one selected location.
pub struct SelectionState {
    inner: Mutex<Inner>,
    events: broadcast::Sender<SelectionChange>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(defaults::SELECTION_EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                issued: 0,
                current: None,
                last_active: Instant::now(),
            }),
            events,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.last_active = Instant::now();
        inner
    }

    /// Time since the last ticket, update, or subscription.
    fn idle_for(&self, now: Instant) -> Duration {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        now.saturating_duration_since(inner.last_active)
    }

    fn last_active(&self) -> Instant {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_active
    }

    /// Issue a new ticket, invalidating all earlier ones.
    pub fn begin(&self) -> SelectionTicket {
        let mut inner = self.lock();
        inner.issued += 1;
        SelectionTicket(inner.issued)
    }

    /// Replace the selection if `ticket` is still the latest issued.
    ///
    /// Returns `Ok(false)` for a stale ticket, leaving the selection as is.
    pub fn apply(
        &self,
        ticket: SelectionTicket,
        location: ResolvedLocation,
        origin: SelectionOrigin,
    ) -> Result<bool> {
        location.validate()?;
        let change = {
            let mut inner = self.lock();
            if ticket.0 != inner.issued {
                debug!(
                    subsystem = "api",
                    component = "selection",
                    sequence = ticket.0,
                    latest = inner.issued,
                    "Discarding stale selection"
                );
                return Ok(false);
            }
            let change = SelectionChange {
                sequence: ticket.0,
                location,
                origin,
            };
            inner.current = Some(change.clone());
            change
        };
        // No subscribers is fine.
        let _ = self.events.send(change);
        Ok(true)
    }

    /// Issue a ticket and apply it at once.
    pub fn select(
        &self,
        location: ResolvedLocation,
        origin: SelectionOrigin,
    ) -> Result<SelectionChange> {
        location.validate()?;
        let change = {
            let mut inner = self.lock();
            inner.issued += 1;
            let change = SelectionChange {
                sequence: inner.issued,
                location,
                origin,
            };
            inner.current = Some(change.clone());
            change
        };
        let _ = self.events.send(change.clone());
        Ok(change)
    }

    /// Reading does not count as activity.
    pub fn snapshot(&self) -> SelectionSnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        SelectionSnapshot {
            issued: inner.issued,
            current: inner.current.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionChange> {
        let _touch = self.lock();
        self.events.subscribe()
    }
}

/// Held only by the hub and nobody is listening.
fn unused(state: &Arc<SelectionState>) -> bool {
    Arc::strong_count(state) == 1 && state.events.receiver_count() == 0
}

/// One [`SelectionState`] per client session.
#[derive(Clone)]
pub struct SelectionHub {
    sessions: Arc<RwLock<HashMap<String, Arc<SelectionState>>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SelectionHub {
    fn default() -> Self {
        Self::with_limits(
            Duration::from_secs(defaults::SELECTION_IDLE_TTL_SECS),
            defaults::SELECTION_MAX_SESSIONS,
        )
    }
}

impl SelectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<SelectionState>>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// The selection for `session`, if it exists. Never creates one.
    pub fn get(&self, session: &str) -> Option<Arc<SelectionState>> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(session)
            .cloned()
    }

    /// The selection for `session`, created on first use.
    ///
    /// When the hub is full, expired sessions are dropped first, then the
    /// least recently active unused one. Sessions in use are never evicted.
    pub fn session(&self, session: &str) -> Arc<SelectionState> {
        if let Some(state) = self.get(session) {
            return state;
        }
        let mut sessions = self.write();
        if let Some(state) = sessions.get(session) {
            return state.clone();
        }
        if sessions.len() >= self.max_sessions {
            let evicted = self.make_room(&mut sessions);
            debug!(
                subsystem = "api",
                component = "selection",
                evicted,
                sessions = sessions.len(),
                "Selection hub full"
            );
        }
        let state = Arc::new(SelectionState::new());
        sessions.insert(session.to_string(), state.clone());
        state
    }

    fn make_room(&self, sessions: &mut HashMap<String, Arc<SelectionState>>) -> usize {
        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|_, s| !(unused(s) && s.idle_for(now) >= self.idle_ttl));
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, s)| unused(s))
                .min_by_key(|(_, s)| s.last_active())
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                sessions.remove(&key);
            }
        }
        before - sessions.len()
    }

    /// Drop unused sessions idle for at least the TTL. Returns how many.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| !(unused(s) && s.idle_for(now) >= self.idle_ttl));
        before - sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Run [`evict_idle`](Self::evict_idle) every `every` until the runtime
    /// shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = hub.evict_idle();
                if evicted > 0 {
                    debug!(
                        subsystem = "api",
                        component = "selection",
                        evicted,
                        sessions = hub.session_count(),
                        "Evicted idle selection sessions"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> ResolvedLocation {
        ResolvedLocation::from_coordinates(lat, lon).unwrap()
    }

    #[test]
    fn test_latest_ticket_wins() {
        let state = SelectionState::new();
        let first = state.begin();
        let second = state.begin();

        assert!(state.apply(second, at(2.0, 2.0), SelectionOrigin::Search).unwrap());
        assert!(!state.apply(first, at(1.0, 1.0), SelectionOrigin::Search).unwrap());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.issued, 2);
        let current = snapshot.current.unwrap();
        assert_eq!(current.sequence, 2);
        assert_eq!(current.location.latitude, 2.0);
    }

    #[test]
    fn test_older_ticket_rejected_even_before_newer_applies() {
        let state = SelectionState::new();
        let first = state.begin();
        let _second = state.begin();

        assert!(!state.apply(first, at(1.0, 1.0), SelectionOrigin::Search).unwrap());
        assert!(state.snapshot().current.is_none());
    }

    #[test]
    fn test_select_invalidates_pending_ticket() {
        let state = SelectionState::new();
        let pending = state.begin();
        let change = state
            .select(at(5.0, 5.0), SelectionOrigin::MapClick)
            .unwrap();
        assert_eq!(change.sequence, 2);

        assert!(!state.apply(pending, at(1.0, 1.0), SelectionOrigin::Search).unwrap());
        assert_eq!(state.snapshot().current.unwrap().location.latitude, 5.0);
    }

    #[test]
    fn test_apply_rejects_invalid_location() {
        let state = SelectionState::new();
        let ticket = state.begin();
        let bad = ResolvedLocation {
            latitude: 120.0,
            longitude: 0.0,
            address: "x".into(),
            formatted_address: "x".into(),
        };
        assert!(state.apply(ticket, bad, SelectionOrigin::Search).is_err());
        assert!(state.snapshot().current.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_receive_applied_changes_only() {
        let state = SelectionState::new();
        let mut rx = state.subscribe();

        let stale = state.begin();
        let fresh = state.begin();
        state.apply(stale, at(1.0, 1.0), SelectionOrigin::Search).unwrap();
        state.apply(fresh, at(3.0, 4.0), SelectionOrigin::History).unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.sequence, 2);
        assert_eq!(change.origin, SelectionOrigin::History);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_hub_isolates_sessions() {
        let hub = SelectionHub::new();
        let a = hub.session("a");
        let b = hub.session("b");
        a.select(at(1.0, 1.0), SelectionOrigin::MapClick).unwrap();

        assert!(b.snapshot().current.is_none());
        assert!(Arc::ptr_eq(&a, &hub.session("a")));
        assert_eq!(hub.session_count(), 2);
    }

    #[test]
    fn test_get_does_not_create_session() {
        let hub = SelectionHub::new();
        assert!(hub.get("reader").is_none());
        assert!(hub.get("reader").is_none());
        assert_eq!(hub.session_count(), 0);

        hub.session("writer");
        assert!(hub.get("writer").is_some());
        assert_eq!(hub.session_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_evicted_unless_in_use() {
        let hub = SelectionHub::with_limits(Duration::from_secs(60), 100);
        hub.session("stale")
            .select(at(1.0, 1.0), SelectionOrigin::Search)
            .unwrap();
        let held = hub.session("held");
        let _rx = hub.session("listening").subscribe();

        tokio::time::advance(Duration::from_secs(45)).await;
        hub.session("fresh").begin();
        assert_eq!(hub.evict_idle(), 0);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(hub.evict_idle(), 1);
        assert!(hub.get("stale").is_none());
        assert!(hub.get("fresh").is_some());
        assert!(hub.get("listening").is_some());
        assert!(hub.get("held").is_some());

        drop(held);
        assert_eq!(hub.evict_idle(), 1);
        assert_eq!(hub.session_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reading_does_not_keep_session_alive() {
        let hub = SelectionHub::with_limits(Duration::from_secs(60), 100);
        hub.session("a").begin();

        tokio::time::advance(Duration::from_secs(59)).await;
        let read = hub.get("a").map(|s| s.snapshot()).unwrap_or_default();
        assert_eq!(read.issued, 1);
        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(hub.evict_idle(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_hub_drops_least_recently_active() {
        let hub = SelectionHub::with_limits(Duration::from_secs(3600), 3);
        for key in ["a", "b", "c"] {
            hub.session(key).begin();
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        hub.session("a").begin();

        hub.session("d");

        assert_eq!(hub.session_count(), 3);
        assert!(hub.get("b").is_none());
        for key in ["a", "c", "d"] {
            assert!(hub.get(key).is_some(), "{key}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_hub_grows_when_every_session_is_busy() {
        let hub = SelectionHub::with_limits(Duration::from_secs(3600), 2);
        let _a = hub.session("a");
        let _b = hub.session("b");

        hub.session("c");

        assert_eq!(hub.session_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let hub = SelectionHub::with_limits(Duration::from_secs(60), 100);
        hub.session("a").begin();
        let sweeper = hub.spawn_sweeper(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(75)).await;

        assert_eq!(hub.session_count(), 0);
        sweeper.abort();
    }
}
