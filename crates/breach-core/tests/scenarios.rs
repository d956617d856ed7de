//! Multi-frame tracker scenarios.
//!
//! Each test drives an [`EventTracker`] (or a full [`run_tick`] loop)
//! through a scripted sequence of snapshots and checks the lifecycle
//! guarantees: identity uniqueness, immediate removal on disappearance,
//! a one-shot transition stamp, and eviction after the validity window.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::BTreeSet;
use std::time::Duration;

use breach_core::clock::{ManualTime, Timestamp};
use breach_core::presentation::{DisplaySettings, NullPresenter};
use breach_core::source::ScriptedSource;
use breach_core::tick::{OverlayState, run_tick};
use breach_core::tracker::{EventTracker, TrackerSettings};
use breach_types::{AreaId, EntityId, EntitySnapshot, EventPhase, GridPos, WorldSnapshot};

const PATH: &str = "Metadata/MiscellaneousObjects/Breach/BreachObject";

fn breach(id: u64, x: f32, y: f32, transitioned: bool) -> EntitySnapshot {
    EntitySnapshot {
        id: EntityId(id),
        type_path: PATH.to_owned(),
        position: Some(GridPos::new(x, y)),
        transitioned,
        is_valid: true,
    }
}

fn window() -> Duration {
    TrackerSettings::default().validity_window
}

#[test]
fn breach_42_lifecycle() {
    let mut tracker = EventTracker::new(TrackerSettings::default());
    let t0 = Timestamp::ZERO;
    let t5 = Timestamp::from_secs(5);

    tracker.reconcile(&[breach(42, 3.0, 4.0, false)], t0);
    assert_eq!(tracker.get(EntityId(42)).unwrap().phase(), EventPhase::Active);

    for secs in 1..5 {
        tracker.reconcile(&[breach(42, 3.0, 4.0, false)], Timestamp::from_secs(secs));
    }
    tracker.reconcile(&[breach(42, 3.0, 4.0, true)], t5);
    let event = tracker.get(EntityId(42)).unwrap();
    assert_eq!(event.phase(), EventPhase::Transitioning);
    assert_eq!(event.transition_started_at(), Some(t5));

    let just_after = t5.saturating_add(window()).saturating_add(Duration::from_millis(1));
    tracker.reconcile(&[], just_after);

    assert!(tracker.get(EntityId(42)).is_none());
    assert!(tracker.active_events(GridPos::ORIGIN).is_empty());
    assert!(
        tracker
            .transitioning_events(GridPos::ORIGIN, just_after)
            .is_empty()
    );
}

#[test]
fn breach_7_disappears_without_transition() {
    let mut tracker = EventTracker::new(TrackerSettings::default());
    tracker.reconcile(&[breach(7, 1.0, 1.0, false)], Timestamp::ZERO);
    tracker.reconcile(&[breach(7, 1.0, 1.0, false)], Timestamp::from_secs(1));
    tracker.reconcile(&[], Timestamp::from_secs(2));

    assert!(tracker.is_empty());
    for secs in 2..10 {
        let now = Timestamp::from_secs(secs);
        tracker.reconcile(&[], now);
        assert!(tracker.transitioning_events(GridPos::ORIGIN, now).is_empty());
    }
}

#[test]
fn nearest_two_of_three() {
    let mut tracker = EventTracker::new(TrackerSettings {
        display_cap: 2,
        ..TrackerSettings::default()
    });
    tracker.reconcile(
        &[
            breach(1, 1.0, 0.0, false),
            breach(5, 0.0, 5.0, false),
            breach(2, 0.0, -2.0, false),
        ],
        Timestamp::ZERO,
    );

    let selected: Vec<EntityId> = tracker
        .active_events(GridPos::ORIGIN)
        .into_iter()
        .map(|view| view.id)
        .collect();
    assert_eq!(selected, vec![EntityId(1), EntityId(2)]);
}

#[test]
fn same_tick_spawns_are_tracked_independently() {
    let mut tracker = EventTracker::new(TrackerSettings::default());
    let report = tracker.reconcile(
        &[breach(100, 0.0, 0.0, false), breach(101, 0.0, 0.0, false)],
        Timestamp::ZERO,
    );
    assert_eq!(report.created, 2);

    tracker.reconcile(
        &[breach(100, 0.0, 0.0, true), breach(101, 0.0, 0.0, false)],
        Timestamp::from_secs(1),
    );
    assert!(tracker.get(EntityId(100)).unwrap().is_transitioning());
    assert!(!tracker.get(EntityId(101)).unwrap().is_transitioning());
}

#[test]
fn identities_stay_unique_over_a_noisy_stream() {
    let mut tracker = EventTracker::new(TrackerSettings::default());
    let mut seen_stamps = std::collections::BTreeMap::new();

    for frame in 0_u64..200 {
        let now = Timestamp::from_millis(frame.saturating_mul(500));
        let mut entities = Vec::new();
        for id in 1_u64..=12 {
            // Each id is present on a different cadence and transitions late.
            if (frame.saturating_add(id)) % (id.saturating_add(2)) == 0 {
                continue;
            }
            let transitioned = frame > id.saturating_mul(8);
            entities.push(breach(id, 1.0, 1.0, transitioned));
            // Duplicates within the same snapshot.
            if id % 3 == 0 {
                entities.push(breach(id, 9.0, 9.0, false));
            }
        }
        tracker.reconcile(&entities, now);

        let ids: Vec<EntityId> = tracker.iter().map(|event| event.id()).collect();
        let unique: BTreeSet<EntityId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate identity at frame {frame}");

        for event in tracker.iter() {
            // Never retained past the window.
            if let Some(elapsed) = event.elapsed_in_transition(now) {
                assert!(elapsed <= window());
            }
            // Transition stamp never moves while the record lives.
            if let Some(started) = event.transition_started_at() {
                let first = *seen_stamps.entry((event.id(), event.first_seen_at())).or_insert(started);
                assert_eq!(first, started);
            }
        }
    }
}

#[test]
fn progress_is_monotonic_and_clamped() {
    let mut tracker = EventTracker::new(TrackerSettings::default());
    tracker.reconcile(&[breach(1, 0.0, 0.0, false)], Timestamp::ZERO);
    tracker.reconcile(&[breach(1, 0.0, 0.0, true)], Timestamp::from_secs(1));
    let event = tracker.get(EntityId(1)).unwrap().clone();

    let mut previous = 0.0_f32;
    for ms in (1_000_u64..=80_000).step_by(250) {
        let progress = tracker.progress_of(&event, Timestamp::from_millis(ms));
        assert!(progress >= previous);
        assert!((0.0..=1.0).contains(&progress));
        previous = progress;
    }
    assert!((previous - 1.0).abs() < 1e-6);
}

#[test]
fn full_frames_with_area_change() {
    let first = AreaId::new();
    let second = AreaId::new();
    let frame = |area: AreaId, entities: Vec<EntitySnapshot>| WorldSnapshot {
        area,
        observer: Some(GridPos::ORIGIN),
        entities,
    };

    let mut source = ScriptedSource::new(vec![
        frame(first, vec![breach(1, 0.0, 0.0, false), breach(2, 5.0, 5.0, false)]),
        frame(first, vec![breach(1, 0.0, 0.0, true), breach(2, 5.0, 5.0, false)]),
        frame(first, vec![breach(2, 5.0, 5.0, false)]),
        frame(second, vec![breach(1, 0.0, 0.0, false)]),
    ]);
    let time = ManualTime::with_step(Timestamp::ZERO, Duration::from_secs(1));
    let mut state = OverlayState::new(
        EventTracker::new(TrackerSettings::default()),
        DisplaySettings::default(),
    );
    let mut presenter = NullPresenter;

    let s1 = run_tick(&mut state, &mut source, &time, &mut presenter).unwrap();
    assert_eq!(s1.summary.tracked, 2);

    let s2 = run_tick(&mut state, &mut source, &time, &mut presenter).unwrap();
    assert_eq!(s2.summary.transitioning, 1);

    // Entity 1 vanished after transitioning: still archived.
    let s3 = run_tick(&mut state, &mut source, &time, &mut presenter).unwrap();
    assert_eq!(s3.summary.tracked, 2);
    assert_eq!(s3.summary.transitioning, 1);

    // New area: everything from the old one is gone and id 1 is fresh.
    let s4 = run_tick(&mut state, &mut source, &time, &mut presenter).unwrap();
    assert!(s4.area_changed);
    assert_eq!(s4.summary.tracked, 1);
    let fresh = state.tracker.get(EntityId(1)).unwrap();
    assert_eq!(fresh.phase(), EventPhase::Active);
    assert_eq!(fresh.first_seen_at(), Timestamp::from_secs(3));
}
