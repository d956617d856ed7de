//! Simulated world source for running the overlay without a game.
//!
//! [`SimulatedWorld`] plays a small random world: breaches open around a
//! wandering observer, some of them transition and later vanish, some
//! vanish without ever transitioning, and now and then the whole area
//! changes. The entity list it reports is deliberately noisy (duplicate
//! entries, stale entries, unrelated objects) so that the tracker's
//! filtering is exercised on every run.
//!
//! The world is driven entirely by a seeded RNG, so a given seed and
//! config always produce the same snapshot sequence.

use breach_core::source::WorldSnapshotSource;
use breach_types::{AreaId, EntityId, EntitySnapshot, GridPos, WorldSnapshot};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Configuration for the simulated world, read from the `simulation`
/// section of `breach-overlay.yaml`.
///
/// Chances are per frame and must lie in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Most breaches open at the same time.
    #[serde(default = "default_max_breaches")]
    pub max_breaches: usize,

    /// Chance that a new breach opens.
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f64,

    /// Chance that an open breach is activated.
    #[serde(default = "default_transition_chance")]
    pub transition_chance: f64,

    /// Chance that an open, never-activated breach disappears.
    #[serde(default = "default_vanish_chance")]
    pub vanish_chance: f64,

    /// Chance that an activated breach is removed from the entity list.
    #[serde(default = "default_despawn_chance")]
    pub despawn_chance: f64,

    /// Chance that a breach entry is reported twice.
    #[serde(default = "default_noise_chance")]
    pub duplicate_chance: f64,

    /// Chance that a stale, invalid entry is mixed in.
    #[serde(default = "default_noise_chance")]
    pub stale_chance: f64,

    /// Breaches open within this distance of the observer.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f32,

    /// Change area every this many frames; 0 never changes area.
    #[serde(default = "default_area_change_every")]
    pub area_change_every: u64,

    /// RNG seed; the same seed replays the same world.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_breaches: default_max_breaches(),
            spawn_chance: default_spawn_chance(),
            transition_chance: default_transition_chance(),
            vanish_chance: default_vanish_chance(),
            despawn_chance: default_despawn_chance(),
            duplicate_chance: default_noise_chance(),
            stale_chance: default_noise_chance(),
            spawn_radius: default_spawn_radius(),
            area_change_every: default_area_change_every(),
            seed: default_seed(),
        }
    }
}

impl SimulationConfig {
    /// Check that every chance is a probability and the radius is usable.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        let chances = [
            ("spawn_chance", self.spawn_chance),
            ("transition_chance", self.transition_chance),
            ("vanish_chance", self.vanish_chance),
            ("despawn_chance", self.despawn_chance),
            ("duplicate_chance", self.duplicate_chance),
            ("stale_chance", self.stale_chance),
        ];
        for (field, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("simulation.{field} must be within 0..=1, got {value}"));
            }
        }
        if !(self.spawn_radius.is_finite() && self.spawn_radius > 0.0) {
            return Err(format!(
                "simulation.spawn_radius must be positive, got {}",
                self.spawn_radius
            ));
        }
        Ok(())
    }
}

const fn default_max_breaches() -> usize {
    4
}

const fn default_spawn_chance() -> f64 {
    0.01
}

const fn default_transition_chance() -> f64 {
    0.005
}

const fn default_vanish_chance() -> f64 {
    0.001
}

const fn default_despawn_chance() -> f64 {
    0.004
}

const fn default_noise_chance() -> f64 {
    0.05
}

const fn default_spawn_radius() -> f32 {
    120.0
}

const fn default_area_change_every() -> u64 {
    6000
}

const fn default_seed() -> u64 {
    42
}

// -----------------------------------------------------------------------
// World
// -----------------------------------------------------------------------

/// Type paths of objects that are never breaches.
const CLUTTER: &[&str] = &[
    "Metadata/Monsters/Zombies/ZombieBoss",
    "Metadata/Chests/StrongBoxes/Arcanist",
    "Metadata/MiscellaneousObjects/Stash",
];

/// How far the observer moves per frame on each axis.
const OBSERVER_STEP: f32 = 0.5;

#[derive(Debug, Clone)]
struct SimBreach {
    id: EntityId,
    position: GridPos,
    transitioned: bool,
}

/// A seeded, self-contained world that implements [`WorldSnapshotSource`].
#[derive(Debug)]
pub struct SimulatedWorld {
    config: SimulationConfig,
    type_path: String,
    rng: SmallRng,
    area: AreaId,
    observer: GridPos,
    frame: u64,
    next_id: u64,
    breaches: Vec<SimBreach>,
}

impl SimulatedWorld {
    /// Create a world reporting breaches under `type_path`.
    pub fn new(config: SimulationConfig, type_path: &str) -> Self {
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let area = random_area(&mut rng);
        Self {
            config,
            type_path: type_path.to_owned(),
            rng,
            area,
            observer: GridPos::ORIGIN,
            frame: 0,
            next_id: 1,
            breaches: Vec::new(),
        }
    }

    /// Number of breaches currently present in the world.
    pub fn open_breaches(&self) -> usize {
        self.breaches.len()
    }

    /// The current area.
    pub const fn area(&self) -> AreaId {
        self.area
    }

    fn roll(&mut self, chance: f64) -> bool {
        chance > 0.0 && self.rng.random::<f64>() < chance
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn maybe_change_area(&mut self) {
        let due = self
            .frame
            .checked_rem(self.config.area_change_every)
            .is_some_and(|rem| rem == 0);
        if due {
            self.area = random_area(&mut self.rng);
            self.breaches.clear();
            self.observer = GridPos::ORIGIN;
            info!(area = %self.area, frame = self.frame, "simulated area change");
        }
    }

    fn wander(&mut self) {
        let dx = self.rng.random_range(-OBSERVER_STEP..=OBSERVER_STEP);
        let dy = self.rng.random_range(-OBSERVER_STEP..=OBSERVER_STEP);
        self.observer = GridPos::new(self.observer.x + dx, self.observer.y + dy);
    }

    fn evolve(&mut self) {
        let transition = self.config.transition_chance;
        let vanish = self.config.vanish_chance;
        let despawn = self.config.despawn_chance;

        let mut kept = Vec::with_capacity(self.breaches.len());
        for mut breach in std::mem::take(&mut self.breaches) {
            if breach.transitioned {
                if self.roll(despawn) {
                    debug!(identity = %breach.id, "simulated breach despawned");
                    continue;
                }
            } else if self.roll(vanish) {
                debug!(identity = %breach.id, "simulated breach vanished");
                continue;
            } else if self.roll(transition) {
                debug!(identity = %breach.id, "simulated breach activated");
                breach.transitioned = true;
            }
            kept.push(breach);
        }
        self.breaches = kept;

        if self.breaches.len() < self.config.max_breaches && self.roll(self.config.spawn_chance) {
            let radius = self.config.spawn_radius;
            let position = GridPos::new(
                self.observer.x + self.rng.random_range(-radius..=radius),
                self.observer.y + self.rng.random_range(-radius..=radius),
            );
            let id = self.allocate_id();
            debug!(identity = %id, x = position.x, y = position.y, "simulated breach opened");
            self.breaches.push(SimBreach {
                id,
                position,
                transitioned: false,
            });
        }
    }

    fn entity_list(&mut self) -> Vec<EntitySnapshot> {
        let mut entities = Vec::with_capacity(self.breaches.len().saturating_add(CLUTTER.len()));

        for breach in self.breaches.clone() {
            let entry = EntitySnapshot {
                id: breach.id,
                type_path: self.type_path.clone(),
                position: Some(breach.position),
                transitioned: breach.transitioned,
                is_valid: true,
            };
            if self.roll(self.config.duplicate_chance) {
                entities.push(entry.clone());
            }
            entities.push(entry);
        }

        if self.roll(self.config.stale_chance) {
            entities.push(EntitySnapshot {
                id: EntityId(self.rng.random_range(1..=self.next_id)),
                type_path: self.type_path.clone(),
                position: None,
                transitioned: false,
                is_valid: false,
            });
        }

        for (offset, path) in (1_u64..).zip(CLUTTER) {
            entities.push(EntitySnapshot {
                id: EntityId(u64::MAX.saturating_sub(offset)),
                type_path: (*path).to_owned(),
                position: Some(self.observer),
                transitioned: false,
                is_valid: true,
            });
        }

        entities
    }
}

impl WorldSnapshotSource for SimulatedWorld {
    fn snapshot(&mut self) -> WorldSnapshot {
        self.frame = self.frame.saturating_add(1);
        self.maybe_change_area();
        self.wander();
        self.evolve();

        WorldSnapshot {
            area: self.area,
            observer: Some(self.observer),
            entities: self.entity_list(),
        }
    }
}

fn random_area(rng: &mut SmallRng) -> AreaId {
    AreaId::from(uuid::Builder::from_random_bytes(rng.random()).into_uuid())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    const PATH: &str = "Metadata/MiscellaneousObjects/Breach/BreachObject";

    fn busy(seed: u64) -> SimulationConfig {
        SimulationConfig {
            max_breaches: 3,
            spawn_chance: 0.5,
            transition_chance: 0.2,
            vanish_chance: 0.05,
            despawn_chance: 0.1,
            duplicate_chance: 0.3,
            stale_chance: 0.3,
            spawn_radius: 50.0,
            area_change_every: 0,
            seed,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn chance_out_of_range_is_rejected() {
        let config = SimulationConfig {
            spawn_chance: 1.5,
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("spawn_chance"));

        let config = SimulationConfig {
            stale_chance: f64::NAN,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn same_seed_same_world() {
        let mut a = SimulatedWorld::new(busy(9), PATH);
        let mut b = SimulatedWorld::new(busy(9), PATH);
        for _ in 0..50 {
            assert_eq!(a.snapshot(), b.snapshot());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SimulatedWorld::new(busy(1), PATH);
        let mut b = SimulatedWorld::new(busy(2), PATH);
        assert_ne!(a.area(), b.area());
        let diverged = (0..50).any(|_| a.snapshot().entities != b.snapshot().entities);
        assert!(diverged);
    }

    #[test]
    fn breach_count_stays_under_cap() {
        let mut world = SimulatedWorld::new(busy(1), PATH);
        for _ in 0..200 {
            let snapshot = world.snapshot();
            assert!(world.open_breaches() <= 3);
            let live: BTreeSet<EntityId> = snapshot
                .entities
                .iter()
                .filter(|e| e.is_valid && e.type_path == PATH)
                .map(|e| e.id)
                .collect();
            assert_eq!(live.len(), world.open_breaches());
        }
    }

    #[test]
    fn breaches_eventually_transition() {
        let mut world = SimulatedWorld::new(busy(3), PATH);
        let transitioned = (0..500)
            .flat_map(|_| world.snapshot().entities)
            .any(|e| e.type_path == PATH && e.transitioned);
        assert!(transitioned);
    }

    #[test]
    fn clutter_is_always_reported() {
        let mut world = SimulatedWorld::new(SimulationConfig::default(), PATH);
        let snapshot = world.snapshot();
        let clutter = snapshot
            .entities
            .iter()
            .filter(|e| !e.type_path.contains("Breach"))
            .count();
        assert_eq!(clutter, CLUTTER.len());
    }

    #[test]
    fn area_changes_on_schedule() {
        let config = SimulationConfig {
            area_change_every: 10,
            ..busy(5)
        };
        let mut world = SimulatedWorld::new(config, PATH);
        let first = world.snapshot().area;
        for _ in 0..8 {
            assert_eq!(world.snapshot().area, first);
        }
        // Frame 10.
        let changed = world.snapshot().area;
        assert_ne!(changed, first);
    }
}
