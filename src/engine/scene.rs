// Scene setup: the ground slab, the character, and the obstacle field.
//
// Obstacles are scattered once at startup and never move afterwards.
// Every scatter position is rejection-sampled to keep a minimum clearance
// from the character's spawn point so the player never starts wedged
// inside a sphere.

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::info;
use rand::Rng;

use super::components::{CharacterBody, Collider, Color, Obstacle, RenderShape, ShapeKind, Transform};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of static sphere obstacles.
pub const OBSTACLE_COUNT: usize = 50;
/// Obstacle sphere radius in world units.
pub const OBSTACLE_RADIUS: f32 = 75.0;
/// Fixed obstacle height above the ground plane.
pub const OBSTACLE_HEIGHT: f32 = 25.0;
/// Obstacles scatter over [-SCATTER_HALF, SCATTER_HALF] on X and Z.
pub const SCATTER_HALF: f32 = 1000.0;
/// Minimum distance between an obstacle center and the character spawn.
pub const MIN_SPAWN_CLEARANCE: f32 = 300.0;
/// Half-extents of the character's collision box; its center sits
/// `half_extents.y` above the character position (feet on the ground).
pub const CHARACTER_HALF_EXTENTS: Vec3 = Vec3::new(35.0, 90.0, 35.0);
/// Ground slab half-width on X and Z.
pub const GROUND_HALF: f32 = 2000.0;

// ============================================================================
// SPAWNING
// ============================================================================

/// Scatter positions for the obstacle field. Each position is re-rolled
/// until it clears `MIN_SPAWN_CLEARANCE` from `character_spawn`.
pub fn scatter_obstacles(rng: &mut impl Rng, character_spawn: Vec3) -> Vec<Vec3> {
    let mut positions = Vec::with_capacity(OBSTACLE_COUNT);
    while positions.len() < OBSTACLE_COUNT {
        let candidate = Vec3::new(
            rng.gen_range(-SCATTER_HALF..SCATTER_HALF),
            OBSTACLE_HEIGHT,
            rng.gen_range(-SCATTER_HALF..SCATTER_HALF),
        );
        if candidate.distance(character_spawn) >= MIN_SPAWN_CLEARANCE {
            positions.push(candidate);
        }
    }
    positions
}

/// Populate the world: ground, character at the origin, obstacle field.
pub fn spawn_scene(world: &mut World, rng: &mut impl Rng) {
    // Ground: render-only, no collider.
    world.spawn((
        Transform::default(),
        RenderShape {
            kind: ShapeKind::Box,
            offset: Vec3::new(0.0, -2.0, 0.0),
            scale: Vec3::new(GROUND_HALF, 2.0, GROUND_HALF),
        },
        Color::rgb(0.93, 0.58, 0.85),
    ));

    let character_spawn = Vec3::ZERO;
    world.spawn((
        Transform::from_position(character_spawn),
        CharacterBody,
        Collider {
            center_offset: Vec3::new(0.0, CHARACTER_HALF_EXTENTS.y, 0.0),
            half_extents: CHARACTER_HALF_EXTENTS,
        },
        RenderShape {
            kind: ShapeKind::Box,
            offset: Vec3::new(0.0, CHARACTER_HALF_EXTENTS.y, 0.0),
            scale: CHARACTER_HALF_EXTENTS,
        },
        Color::rgb(0.25, 0.65, 0.95),
    ));

    for position in scatter_obstacles(rng, character_spawn) {
        world.spawn((
            Transform::from_position(position),
            Obstacle,
            // Collision uses the sphere's AABB, center ± radius.
            Collider {
                center_offset: Vec3::ZERO,
                half_extents: Vec3::splat(OBSTACLE_RADIUS),
            },
            RenderShape {
                kind: ShapeKind::Sphere,
                offset: Vec3::ZERO,
                scale: Vec3::splat(OBSTACLE_RADIUS),
            },
            Color::rgb(0.46, 0.48, 0.72),
        ));
    }

    info!("scene ready: {} obstacles scattered", OBSTACLE_COUNT);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_obstacle_clears_the_character_spawn() {
        let mut rng = rand::thread_rng();
        let spawn = Vec3::ZERO;
        let positions = scatter_obstacles(&mut rng, spawn);

        assert_eq!(positions.len(), OBSTACLE_COUNT);
        for p in &positions {
            assert!(
                p.distance(spawn) >= MIN_SPAWN_CLEARANCE,
                "obstacle at {p} is too close to the spawn"
            );
        }
    }

    #[test]
    fn obstacles_stay_in_the_scatter_area_at_fixed_height() {
        let mut rng = rand::thread_rng();
        for p in scatter_obstacles(&mut rng, Vec3::ZERO) {
            assert!(p.x >= -SCATTER_HALF && p.x <= SCATTER_HALF);
            assert!(p.z >= -SCATTER_HALF && p.z <= SCATTER_HALF);
            assert_eq!(p.y, OBSTACLE_HEIGHT);
        }
    }

    #[test]
    fn spawn_scene_creates_character_and_obstacles() {
        let mut world = World::new();
        spawn_scene(&mut world, &mut rand::thread_rng());

        let mut characters = world.query_filtered::<&Transform, With<CharacterBody>>();
        assert_eq!(characters.iter(&world).count(), 1);

        let mut obstacles = world.query_filtered::<&Collider, With<Obstacle>>();
        assert_eq!(obstacles.iter(&world).count(), OBSTACLE_COUNT);
    }
}
