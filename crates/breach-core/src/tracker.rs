//! Breach event tracker: the reconciliation state machine.
//!
//! [`EventTracker`] owns every tracked event, keyed by [`EntityId`]. Once per
//! frame [`EventTracker::reconcile`] compares the tracked set against the
//! latest entity snapshot:
//!
//! 1. Active events whose entity is gone are dropped immediately.
//! 2. Active events whose entity now reports `transitioned` move to the
//!    archive with their transition timestamp stamped once.
//! 3. Matching entities not yet known are tracked as new active events.
//! 4. Archived events older than the validity window are swept.
//!
//! Archived events no longer need their entity to be present; they live
//! only long enough to draw the expanding circle and countdown.
//!
//! Stale references (invalid flag, zero address, missing or non-finite
//! position) never raise. They are treated as if the entity were absent.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use breach_types::{
    EntityId, EntitySnapshot, EventPhase, EventView, GridPos, TrackerSummary, TransitionView,
};
use tracing::{debug, info};

use crate::clock::Timestamp;
use crate::config::DEFAULT_TYPE_PATH;
use crate::easing;

/// Default validity window after a transition.
pub const DEFAULT_VALIDITY_WINDOW: Duration = Duration::from_secs(53);

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Tracking rules for an [`EventTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Substring an entity's type path must contain to be tracked.
    pub type_path: String,
    /// How long a transitioned event stays visible.
    pub validity_window: Duration,
    /// Maximum number of events returned by the display queries; 0 means
    /// no limit.
    pub display_cap: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            type_path: DEFAULT_TYPE_PATH.to_owned(),
            validity_window: DEFAULT_VALIDITY_WINDOW,
            display_cap: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// TrackedEvent
// ---------------------------------------------------------------------------

/// One tracked breach.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    id: EntityId,
    position: GridPos,
    phase: EventPhase,
    first_seen_at: Timestamp,
    transition_started_at: Option<Timestamp>,
    last_confirmed_at: Timestamp,
    /// Insertion order, used to break distance ties.
    seq: u64,
}

impl TrackedEvent {
    fn discovered(id: EntityId, position: GridPos, now: Timestamp, seq: u64) -> Self {
        Self {
            id,
            position,
            phase: EventPhase::Active,
            first_seen_at: now,
            transition_started_at: None,
            last_confirmed_at: now,
            seq,
        }
    }

    /// Identity of the backing entity.
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Position captured at discovery.
    pub const fn position(&self) -> GridPos {
        self.position
    }

    /// Stored phase (`Active` or `Transitioning`).
    pub const fn phase(&self) -> EventPhase {
        self.phase
    }

    /// When the event was first observed.
    pub const fn first_seen_at(&self) -> Timestamp {
        self.first_seen_at
    }

    /// When the transition was first observed, if it has happened.
    pub const fn transition_started_at(&self) -> Option<Timestamp> {
        self.transition_started_at
    }

    /// Last frame in which the backing entity was present and valid.
    pub const fn last_confirmed_at(&self) -> Timestamp {
        self.last_confirmed_at
    }

    /// Whether the event has transitioned.
    pub const fn is_transitioning(&self) -> bool {
        self.transition_started_at.is_some()
    }

    /// Time spent transitioning as of `now`; `None` while active.
    pub fn elapsed_in_transition(&self, now: Timestamp) -> Option<Duration> {
        self.transition_started_at
            .map(|started| now.saturating_since(started))
    }

    /// Phase as of `now`, including `Expired` once the window has passed.
    pub fn phase_at(&self, now: Timestamp, window: Duration) -> EventPhase {
        match self.elapsed_in_transition(now) {
            Some(elapsed) if elapsed > window => EventPhase::Expired,
            _ => self.phase,
        }
    }

    /// Whether the event is transitioning and inside its window at `now`.
    pub fn is_within_window(&self, now: Timestamp, window: Duration) -> bool {
        self.phase_at(now, window) == EventPhase::Transitioning
    }

    /// Eased progress in `[0, 1]`; 0 while active.
    pub fn progress(&self, now: Timestamp, window: Duration) -> f32 {
        self.elapsed_in_transition(now)
            .map_or(0.0, |elapsed| easing::eased_progress(elapsed, window))
    }

    /// Time left in the window; the full window while active.
    pub fn remaining(&self, now: Timestamp, window: Duration) -> Duration {
        self.elapsed_in_transition(now)
            .map_or(window, |elapsed| easing::remaining(elapsed, window))
    }

    fn begin_transition(&mut self, now: Timestamp) {
        // Stamped once; later flag reads never move it.
        if self.transition_started_at.is_none() {
            self.transition_started_at = Some(now);
            self.phase = EventPhase::Transitioning;
        }
    }

    fn view(&self) -> EventView {
        EventView {
            id: self.id,
            position: self.position,
            is_transitioning: self.is_transitioning(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcile report
// ---------------------------------------------------------------------------

/// What a single [`EventTracker::reconcile`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// New active events.
    pub created: usize,
    /// Active events that moved to the archive.
    pub transitioned: usize,
    /// Active events removed because their entity vanished.
    pub disappeared: usize,
    /// Archived events removed because their window elapsed.
    pub expired: usize,
    /// Snapshot entries skipped as stale or malformed.
    pub skipped: usize,
}

impl ReconcileReport {
    /// Whether the tracked set changed at all.
    pub const fn has_changes(&self) -> bool {
        self.created > 0 || self.transitioned > 0 || self.disappeared > 0 || self.expired > 0
    }
}

/// Deduplicated view of one entity for the current frame.
#[derive(Debug, Clone, Copy)]
struct Observation {
    position: Option<GridPos>,
    transitioned: bool,
    /// Index of the first occurrence in the snapshot.
    order: usize,
}

// ---------------------------------------------------------------------------
// EventTracker
// ---------------------------------------------------------------------------

/// Authoritative set of tracked breach events.
#[derive(Debug, Clone, Default)]
pub struct EventTracker {
    settings: TrackerSettings,
    /// Discovered events whose entity has not transitioned.
    active: BTreeMap<EntityId, TrackedEvent>,
    /// Transitioned events kept for the countdown display.
    archive: BTreeMap<EntityId, TrackedEvent>,
    /// Identities whose archive entry expired while the entity was still
    /// present. Cleared once the entity leaves the snapshot.
    retired: BTreeSet<EntityId>,
    next_seq: u64,
}

impl EventTracker {
    /// Create an empty tracker.
    pub const fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            active: BTreeMap::new(),
            archive: BTreeMap::new(),
            retired: BTreeSet::new(),
            next_seq: 0,
        }
    }

    /// Tracking rules in effect.
    pub const fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// The validity window.
    pub const fn window(&self) -> Duration {
        self.settings.validity_window
    }

    /// Reconcile tracked events against this frame's entity snapshot.
    ///
    /// Must be called exactly once per frame, before any query, with the
    /// timestamp sampled for that frame.
    pub fn reconcile(&mut self, entities: &[EntitySnapshot], now: Timestamp) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let present = self.observe(entities, &mut report);

        // 1. Active events without a live entity end here.
        let before = self.active.len();
        self.active.retain(|id, event| {
            let keep = present.contains_key(id);
            if !keep {
                debug!(identity = %id, position = ?event.position, "breach disappeared without transitioning");
            }
            keep
        });
        report.disappeared = before.saturating_sub(self.active.len());

        // 2. Confirm presence and pick up transition edges.
        let mut newly_transitioned = Vec::new();
        for (id, event) in &mut self.active {
            if let Some(seen) = present.get(id) {
                event.last_confirmed_at = now;
                if seen.transitioned {
                    newly_transitioned.push(*id);
                }
            }
        }
        for (id, event) in &mut self.archive {
            if present.contains_key(id) {
                event.last_confirmed_at = now;
            }
        }
        for id in newly_transitioned {
            if let Some(mut event) = self.active.remove(&id) {
                event.begin_transition(now);
                debug!(identity = %id, "breach transitioned, countdown started");
                self.archive.insert(id, event);
                report.transitioned = report.transitioned.saturating_add(1);
            }
        }

        // 3. Track newly discovered entities, in snapshot order.
        self.retired.retain(|id| present.contains_key(id));
        let mut discovered: Vec<(&EntityId, &Observation)> = present
            .iter()
            .filter(|(id, _)| {
                !self.active.contains_key(id)
                    && !self.archive.contains_key(id)
                    && !self.retired.contains(id)
            })
            .collect();
        discovered.sort_by_key(|(_, seen)| seen.order);
        for (id, seen) in discovered {
            let Some(position) = seen.position else {
                report.skipped = report.skipped.saturating_add(1);
                continue;
            };
            let seq = self.next_seq;
            self.next_seq = self.next_seq.saturating_add(1);
            debug!(identity = %id, x = position.x, y = position.y, "breach discovered");
            self.active
                .insert(*id, TrackedEvent::discovered(*id, position, now, seq));
            report.created = report.created.saturating_add(1);
        }

        // 4. Sweep the archive.
        let window = self.settings.validity_window;
        let retired = &mut self.retired;
        let before = self.archive.len();
        self.archive.retain(|id, event| {
            let keep = event.phase_at(now, window).is_visible();
            if !keep {
                debug!(identity = %id, "breach countdown expired");
                if present.contains_key(id) {
                    retired.insert(*id);
                }
            }
            keep
        });
        report.expired = before.saturating_sub(self.archive.len());

        report
    }

    /// Filter and deduplicate the snapshot down to live, matching entities.
    fn observe(
        &self,
        entities: &[EntitySnapshot],
        report: &mut ReconcileReport,
    ) -> BTreeMap<EntityId, Observation> {
        let mut present: BTreeMap<EntityId, Observation> = BTreeMap::new();
        for (order, entity) in entities.iter().enumerate() {
            if !entity.type_path.contains(&self.settings.type_path) {
                continue;
            }
            if !entity.is_live() {
                report.skipped = report.skipped.saturating_add(1);
                continue;
            }
            let position = entity.position.filter(|pos| pos.is_finite());
            present
                .entry(entity.id)
                .and_modify(|seen| {
                    seen.transitioned |= entity.transitioned;
                    if seen.position.is_none() {
                        seen.position = position;
                    }
                })
                .or_insert(Observation {
                    position,
                    transitioned: entity.transitioned,
                    order,
                });
        }
        present
    }

    /// Drop every tracked and archived event (area or context change).
    pub fn reset(&mut self) {
        let dropped = self.len();
        self.active.clear();
        self.archive.clear();
        self.retired.clear();
        self.next_seq = 0;
        info!(dropped, "breach tracker reset");
    }

    /// Number of tracked events (active and archived).
    pub fn len(&self) -> usize {
        self.active.len().saturating_add(self.archive.len())
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.archive.is_empty()
    }

    /// Look up an event by identity in either set.
    pub fn get(&self, id: EntityId) -> Option<&TrackedEvent> {
        self.active.get(&id).or_else(|| self.archive.get(&id))
    }

    /// All tracked events, active first, each set in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedEvent> {
        self.active.values().chain(self.archive.values())
    }

    /// Archived (transitioned) events.
    pub fn archived(&self) -> impl Iterator<Item = &TrackedEvent> {
        self.archive.values()
    }

    /// Counts for the HUD line.
    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            tracked: self.len(),
            transitioning: self.archive.len(),
        }
    }

    /// Eased progress of `event` at `now`, using this tracker's window.
    pub fn progress_of(&self, event: &TrackedEvent, now: Timestamp) -> f32 {
        event.progress(now, self.settings.validity_window)
    }

    /// Remaining countdown of `event` at `now`, using this tracker's window.
    pub fn remaining_time(&self, event: &TrackedEvent, now: Timestamp) -> Duration {
        event.remaining(now, self.settings.validity_window)
    }

    /// Tracked and archived events, nearest to `observer` first, limited to
    /// the display cap.
    pub fn active_events(&self, observer: GridPos) -> Vec<EventView> {
        nearest_first(self.iter(), observer, self.settings.display_cap)
            .into_iter()
            .map(TrackedEvent::view)
            .collect()
    }

    /// Events inside their transition window at `now`, nearest to
    /// `observer` first, limited to the display cap.
    pub fn transitioning_events(&self, observer: GridPos, now: Timestamp) -> Vec<TransitionView> {
        let window = self.settings.validity_window;
        let in_window = self
            .archive
            .values()
            .filter(|event| event.is_within_window(now, window));
        nearest_first(in_window, observer, self.settings.display_cap)
            .into_iter()
            .map(|event| TransitionView {
                id: event.id,
                position: event.position,
                progress: event.progress(now, window),
                remaining: event.remaining(now, window),
            })
            .collect()
    }
}

/// Order events by distance to `observer`, ties by insertion order, and
/// keep at most `cap` of them (0 keeps all).
pub fn nearest_first<'a>(
    events: impl Iterator<Item = &'a TrackedEvent>,
    observer: GridPos,
    cap: usize,
) -> Vec<&'a TrackedEvent> {
    let mut ranked: Vec<(f32, &TrackedEvent)> = events
        .map(|event| (event.position.distance_sq(observer), event))
        .collect();
    ranked.sort_by(|(da, a), (db, b)| da.total_cmp(db).then(a.seq.cmp(&b.seq)));
    if cap > 0 {
        ranked.truncate(cap);
    }
    ranked.into_iter().map(|(_, event)| event).collect()
}
