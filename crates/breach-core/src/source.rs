//! World snapshot source trait and a scripted implementation.
//!
//! Once per frame the overlay asks its [`WorldSnapshotSource`] for the
//! current area, the observer position, and the live entity list. The
//! source copies values out of whatever it reads; nothing it returns
//! borrows from the game.
//!
//! [`ScriptedSource`] replays a fixed sequence of snapshots, which makes
//! multi-frame scenarios easy to express in tests.

use std::collections::VecDeque;

use breach_types::{AreaId, WorldSnapshot};

/// A source of per-frame world snapshots.
pub trait WorldSnapshotSource {
    /// Sample the world for the current frame.
    ///
    /// Entries may be duplicated or stale; the tracker filters them.
    fn snapshot(&mut self) -> WorldSnapshot;
}

/// Replays a queue of snapshots, one per frame.
///
/// Once the queue is exhausted every further frame reports the last seen
/// area with no entities.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    frames: VecDeque<WorldSnapshot>,
    area: AreaId,
}

impl ScriptedSource {
    /// Create a source that plays `frames` in order.
    pub fn new(frames: impl IntoIterator<Item = WorldSnapshot>) -> Self {
        let frames: VecDeque<WorldSnapshot> = frames.into_iter().collect();
        let area = frames.front().map_or_else(AreaId::new, |frame| frame.area);
        Self { frames, area }
    }

    /// Append a frame to the end of the script.
    pub fn push(&mut self, frame: WorldSnapshot) {
        self.frames.push_back(frame);
    }

    /// Number of frames not yet played.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl WorldSnapshotSource for ScriptedSource {
    fn snapshot(&mut self) -> WorldSnapshot {
        match self.frames.pop_front() {
            Some(frame) => {
                self.area = frame.area;
                frame
            }
            None => WorldSnapshot {
                area: self.area,
                observer: None,
                entities: Vec::new(),
            },
        }
    }
}
