//! Procedural map layout
//!
//! Places the house, the repair targets and decorative obstacles with bounded
//! rejection sampling. Generation never fails: when space runs out, entities
//! are dropped instead of looping forever.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::*;
use crate::polar_to_cartesian;

/// Playable area and the margin kept clear along its edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            margin: MAP_MARGIN,
        }
    }
}

impl MapBounds {
    /// Top-left corner of the placement area
    #[inline]
    pub fn inner_min(&self) -> Vec2 {
        Vec2::splat(self.margin)
    }

    /// Bottom-right corner of the placement area
    #[inline]
    pub fn inner_max(&self) -> Vec2 {
        Vec2::new(self.width - self.margin, self.height - self.margin)
    }
}

/// A broken unit the player repairs by solving a problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairTarget {
    pub id: u32,
    pub rect: Rect,
    pub fixed: bool,
    /// Visual variant (0..TARGET_VARIANTS), no gameplay effect
    pub variant: u32,
}

/// Decorative obstacle kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    Tree,
}

/// Purely decorative scenery; never blocks the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub rect: Rect,
    pub kind: ObstacleKind,
}

/// A generated round map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub house: Rect,
    /// Sorted by id
    pub targets: Vec<RepairTarget>,
    /// Sorted by id
    pub obstacles: Vec<Obstacle>,
    /// Player starting rectangle
    pub spawn: Rect,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    /// Zone around the spawn reserved for the player
    pub fn spawn_buffer(&self) -> Rect {
        self.spawn.expanded(SPAWN_BUFFER_PADDING)
    }

    pub fn target(&self, id: u32) -> Option<&RepairTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn target_mut(&mut self, id: u32) -> Option<&mut RepairTarget> {
        self.targets.iter_mut().find(|t| t.id == id)
    }

    /// Number of targets still broken
    pub fn unfixed_count(&self) -> usize {
        self.targets.iter().filter(|t| !t.fixed).count()
    }

    /// True once every target is fixed (vacuously true for an empty layout)
    pub fn all_fixed(&self) -> bool {
        self.targets.iter().all(|t| t.fixed)
    }
}

/// Spawn rectangle: fixed offset from the left margin, vertically centered
pub fn spawn_rect(bounds: &MapBounds) -> Rect {
    Rect::new(
        bounds.margin + SPAWN_OFFSET_X,
        bounds.height / 2.0 - PLAYER_HEIGHT / 2.0,
        PLAYER_WIDTH,
        PLAYER_HEIGHT,
    )
}

/// Uniform sample in `[lo, hi)`, collapsing to `lo` when the span is empty
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Generate a complete layout with up to `target_count` repair targets
pub fn generate_layout<R: Rng + ?Sized>(rng: &mut R, target_count: u32, bounds: MapBounds) -> Layout {
    let spawn = spawn_rect(&bounds);
    let spawn_buffer = spawn.expanded(SPAWN_BUFFER_PADDING);
    let (min, max) = (bounds.inner_min(), bounds.inner_max());

    let house = place_house(rng, &bounds, &spawn_buffer);
    let targets = place_targets(rng, target_count, &bounds, &spawn_buffer, &house);
    let obstacles = place_obstacles(rng, min, max, &spawn_buffer, &house, &targets);

    if targets.len() < target_count as usize {
        log::warn!(
            "Placed {} of {} targets (map too crowded)",
            targets.len(),
            target_count
        );
    }
    log::info!(
        "Layout: house at ({:.0}, {:.0}), {} targets, {} obstacles",
        house.x,
        house.y,
        targets.len(),
        obstacles.len()
    );

    Layout {
        house,
        targets,
        obstacles,
        spawn,
        width: bounds.width,
        height: bounds.height,
    }
}

fn place_house<R: Rng + ?Sized>(rng: &mut R, bounds: &MapBounds, spawn_buffer: &Rect) -> Rect {
    let mut house = Rect::new(bounds.margin, bounds.margin, HOUSE_WIDTH, HOUSE_HEIGHT);
    for attempt in 1..=HOUSE_MAX_ATTEMPTS {
        house.x = uniform(
            rng,
            bounds.margin,
            bounds.width - bounds.margin - HOUSE_WIDTH,
        );
        house.y = uniform(
            rng,
            bounds.margin,
            bounds.height - bounds.margin - HOUSE_HEIGHT,
        );
        if !house.overlaps(spawn_buffer, HOUSE_SPAWN_PADDING) {
            return house;
        }
        log::debug!("House attempt {} rejected (spawn buffer)", attempt);
    }
    // Best effort: keep the last sample
    log::warn!("House placement exhausted attempts, keeping last sample");
    house
}

fn place_targets<R: Rng + ?Sized>(
    rng: &mut R,
    target_count: u32,
    bounds: &MapBounds,
    spawn_buffer: &Rect,
    house: &Rect,
) -> Vec<RepairTarget> {
    let (min, max) = (bounds.inner_min(), bounds.inner_max());
    let house_center = house.center();
    let min_spacing = TARGET_SIZE + TARGET_GAP;
    let mut targets: Vec<RepairTarget> = Vec::with_capacity(target_count as usize);

    for slot in 0..target_count {
        let placed = (0..TARGET_MAX_ATTEMPTS).find_map(|_| {
            let angle = rng.random_range(0.0..TAU);
            let distance = uniform(rng, TARGET_MIN_DIST_FROM_HOUSE, TARGET_MAX_DIST_FROM_HOUSE);
            let center = house_center + polar_to_cartesian(distance, angle);
            let rect = Rect::new(
                center.x - TARGET_SIZE / 2.0,
                center.y - TARGET_SIZE / 2.0,
                TARGET_SIZE,
                TARGET_SIZE,
            );

            let valid = rect.within(min, max)
                && !rect.overlaps(spawn_buffer, TARGET_PADDING)
                && !rect.overlaps(house, TARGET_PADDING)
                && targets
                    .iter()
                    .all(|t| t.rect.center_distance(&rect) >= min_spacing);
            valid.then_some(rect)
        });

        match placed {
            Some(rect) => {
                let index = targets.len() as u32;
                targets.push(RepairTarget {
                    id: index,
                    rect,
                    fixed: false,
                    variant: index % TARGET_VARIANTS,
                });
            }
            None => log::debug!("Target slot {} skipped after {} attempts", slot, TARGET_MAX_ATTEMPTS),
        }
    }

    targets
}

fn place_obstacles<R: Rng + ?Sized>(
    rng: &mut R,
    min: Vec2,
    max: Vec2,
    spawn_buffer: &Rect,
    house: &Rect,
    targets: &[RepairTarget],
) -> Vec<Obstacle> {
    let wanted = rng.random_range(OBSTACLE_MIN_COUNT..=OBSTACLE_MAX_COUNT);
    let mut obstacles: Vec<Obstacle> = Vec::with_capacity(wanted as usize);

    for _ in 0..wanted {
        let placed = (0..OBSTACLE_MAX_ATTEMPTS).find_map(|_| {
            let size = uniform(rng, OBSTACLE_MIN_SIZE, OBSTACLE_MAX_SIZE);
            let rect = Rect::new(
                uniform(rng, min.x, max.x - size),
                uniform(rng, min.y, max.y - size),
                size,
                size,
            );

            let valid = rect.within(min, max)
                && !rect.overlaps(spawn_buffer, OBSTACLE_PADDING)
                && !rect.overlaps(house, OBSTACLE_PADDING)
                && !targets
                    .iter()
                    .any(|t| rect.overlaps(&t.rect, OBSTACLE_PADDING))
                && !obstacles
                    .iter()
                    .any(|o| rect.overlaps(&o.rect, OBSTACLE_SPACING));
            valid.then_some(rect)
        });

        if let Some(rect) = placed {
            obstacles.push(Obstacle {
                id: obstacles.len() as u32,
                rect,
                kind: ObstacleKind::Tree,
            });
        }
    }

    obstacles
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn layout_for(seed: u64, count: u32) -> Layout {
        let mut rng = Pcg32::seed_from_u64(seed);
        generate_layout(&mut rng, count, MapBounds::default())
    }

    #[test]
    fn test_spawn_is_fixed() {
        let a = layout_for(1, 3);
        let b = layout_for(2, 3);
        assert_eq!(a.spawn, b.spawn);
        assert_eq!(a.spawn, Rect::new(200.0, 492.0, PLAYER_WIDTH, PLAYER_HEIGHT));
    }

    #[test]
    fn test_same_seed_same_layout() {
        assert_eq!(layout_for(42, 5), layout_for(42, 5));
    }

    #[test]
    fn test_ids_and_variants() {
        let layout = layout_for(7, 10);
        for (i, target) in layout.targets.iter().enumerate() {
            assert_eq!(target.id, i as u32);
            assert_eq!(target.variant, i as u32 % 4);
            assert!(!target.fixed);
        }
        for (i, obstacle) in layout.obstacles.iter().enumerate() {
            assert_eq!(obstacle.id, i as u32);
        }
        assert!(layout.obstacles.len() <= OBSTACLE_MAX_COUNT as usize);
    }

    #[test]
    fn test_small_counts_fill_up() {
        for seed in 0..20 {
            assert_eq!(layout_for(seed, 2).targets.len(), 2, "seed {seed}");
        }
    }

    #[test]
    fn test_cramped_map_degrades() {
        // Smaller than the house itself: nothing fits, but generation returns
        let bounds = MapBounds {
            width: 300.0,
            height: 200.0,
            margin: 50.0,
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let layout = generate_layout(&mut rng, 10, bounds);
        assert!(layout.targets.is_empty());
        assert!(layout.obstacles.is_empty());
        assert!(layout.all_fixed());
    }

    proptest! {
        #[test]
        fn layout_respects_clearances(seed in any::<u64>(), count in 1u32..=10) {
            let layout = layout_for(seed, count);
            let buffer = layout.spawn_buffer();

            prop_assert!(layout.targets.len() <= count as usize);
            prop_assert!(!layout.house.overlaps(&buffer, HOUSE_SPAWN_PADDING));

            for (i, t) in layout.targets.iter().enumerate() {
                prop_assert!(!t.rect.overlaps(&buffer, TARGET_PADDING));
                prop_assert!(!t.rect.overlaps(&layout.house, TARGET_PADDING));
                for other in &layout.targets[i + 1..] {
                    prop_assert!(t.rect.center_distance(&other.rect) >= TARGET_SIZE + TARGET_GAP);
                }
            }

            for (i, o) in layout.obstacles.iter().enumerate() {
                prop_assert!(!o.rect.overlaps(&buffer, OBSTACLE_PADDING));
                prop_assert!(!o.rect.overlaps(&layout.house, OBSTACLE_PADDING));
                for t in &layout.targets {
                    prop_assert!(!o.rect.overlaps(&t.rect, OBSTACLE_PADDING));
                }
                for other in &layout.obstacles[i + 1..] {
                    prop_assert!(!o.rect.overlaps(&other.rect, OBSTACLE_SPACING));
                }
            }
        }

        #[test]
        fn layout_stays_in_bounds(seed in any::<u64>(), count in 1u32..=10) {
            let layout = layout_for(seed, count);
            let bounds = MapBounds::default();
            let (min, max) = (bounds.inner_min(), bounds.inner_max());
            prop_assert!(layout.house.within(min, max));
            for t in &layout.targets {
                prop_assert!(t.rect.within(min, max));
            }
            for o in &layout.obstacles {
                prop_assert!(o.rect.within(min, max));
            }
        }

        #[test]
        fn generation_terminates_in_tight_maps(
            seed in any::<u64>(),
            count in 1u32..=10,
            width in 100.0f32..900.0,
            height in 100.0f32..700.0,
        ) {
            let bounds = MapBounds { width, height, margin: 40.0 };
            let mut rng = Pcg32::seed_from_u64(seed);
            let layout = generate_layout(&mut rng, count, bounds);
            prop_assert!(layout.targets.len() <= count as usize);
            let (min, max) = (bounds.inner_min(), bounds.inner_max());
            for t in &layout.targets {
                prop_assert!(t.rect.within(min, max));
            }
        }
    }
}
