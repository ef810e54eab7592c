// Movement planning and the per-frame locomotion step.
//
// `Sim` is the whole simulation context — world, input, catalog, state
// machine, loader, camera — passed around explicitly instead of living in
// globals. All mutation happens on the frame step, so the only
// synchronization anywhere is the loader channel.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use log::info;
use winit::keyboard::KeyCode;

use super::animation::{AnimationCatalog, StateMachine, desired_state};
use super::camera::FollowCamera;
use super::collide::{Aabb, would_collide};
use super::components::{CharacterBody, Collider, Obstacle, Transform};
use super::input::InputState;
use super::loader::ClipLoader;
use super::scene;

/// Character speed in world units per second.
pub const MOVE_SPEED: f32 = 150.0;

// ============================================================================
// MOVEMENT PLANNER
// ============================================================================

/// Compute the candidate displacement for this frame, or `None` when no
/// movement key is held.
///
/// Raw intent accumulates per axis (W → -Z, S → +Z, A → -X, D → +X) and is
/// deliberately NOT normalized: holding two keys moves √2 times faster than
/// one, faithfully reproducing the original demo's feel. The intent is
/// scaled by speed and time, rotated into camera space so "forward" means
/// "away from the camera", and flattened onto the ground plane.
pub fn plan_move(
    input: &InputState,
    dt: f32,
    camera_rotation: Quat,
    move_speed: f32,
) -> Option<Vec3> {
    let step = move_speed * dt;

    let mut intent = Vec3::ZERO;
    if input.is_key_held(KeyCode::KeyW) {
        intent.z -= step;
    }
    if input.is_key_held(KeyCode::KeyS) {
        intent.z += step;
    }
    if input.is_key_held(KeyCode::KeyA) {
        intent.x -= step;
    }
    if input.is_key_held(KeyCode::KeyD) {
        intent.x += step;
    }

    if intent == Vec3::ZERO {
        return None;
    }

    let mut displacement = camera_rotation * intent;
    // Movement is planar; the camera pitch must not push the character
    // into the ground or the air.
    displacement.y = 0.0;

    if displacement == Vec3::ZERO {
        return None;
    }
    Some(displacement)
}

// ============================================================================
// SIMULATION CONTEXT
// ============================================================================

pub struct Sim {
    pub world: World,
    pub input: InputState,
    pub catalog: AnimationCatalog,
    pub state_machine: StateMachine,
    pub loader: ClipLoader,
    pub camera: FollowCamera,
    /// True when the last attempted move was rejected by the collision
    /// gate. Surfaced in the HUD.
    pub last_move_blocked: bool,
}

impl Sim {
    pub fn new(loader: ClipLoader) -> Self {
        let mut world = World::new();
        scene::spawn_scene(&mut world, &mut rand::thread_rng());

        Self {
            world,
            input: InputState::new(),
            catalog: AnimationCatalog::new(),
            state_machine: StateMachine::new(),
            loader,
            camera: FollowCamera::new(),
            last_move_blocked: false,
        }
    }

    /// One frame of simulation. Never blocks.
    ///
    /// Order matters: clip arrivals first so this frame can already use
    /// them, then the mixer, then movement (facing is committed even when
    /// the move is rejected), then the input-driven animation transition,
    /// then the trailing camera.
    pub fn step(&mut self, dt: f32) {
        // 1. Drain clip loads that completed since the last frame.
        for clip in self.loader.poll() {
            info!("animation clip '{}' ready", clip.name.label());
            self.catalog.insert_clip(clip);
        }
        self.state_machine.activate_default(&mut self.catalog);

        // 2. Advance the mixer.
        self.catalog.update(dt);

        // 3. Candidate move, gated by collision.
        let camera_rotation = self.camera.orientation();
        if let Some(displacement) = plan_move(&self.input, dt, camera_rotation, MOVE_SPEED) {
            // Obstacle extents are rebuilt from the live transforms on
            // every query — no cached boxes.
            let mut obstacle_query =
                self.world
                    .query_filtered::<(&Transform, &Collider), With<Obstacle>>();
            let obstacles: Vec<Aabb> = obstacle_query
                .iter(&self.world)
                .map(|(t, c)| c.world_aabb(t.position))
                .collect();

            let mut character_query =
                self.world
                    .query_filtered::<(&mut Transform, &Collider), With<CharacterBody>>();
            if let Some((mut transform, collider)) =
                character_query.iter_mut(&mut self.world).next()
            {
                // Face the attempted direction no matter what the gate says.
                transform.yaw = displacement.x.atan2(displacement.z);

                let current = collider.world_aabb(transform.position);
                let blocked = would_collide(&current, displacement, &obstacles);
                if !blocked {
                    transform.position += displacement;
                }
                self.last_move_blocked = blocked;
            }
        } else {
            self.last_move_blocked = false;
        }

        // 4. Animation follows input, not movement outcome: a character
        //    pushing against a sphere still walks in place.
        let desired = desired_state(&self.input);
        self.state_machine.transition(&mut self.catalog, desired);

        // 5. Trailing camera.
        if let Some(position) = self.character_position() {
            self.camera.update(position);
        }
    }

    pub fn character_position(&mut self) -> Option<Vec3> {
        let mut query = self.world.query_filtered::<&Transform, With<CharacterBody>>();
        query.iter(&self.world).next().map(|t| t.position)
    }

    pub fn character_transform(&mut self) -> Option<Transform> {
        let mut query = self.world.query_filtered::<&Transform, With<CharacterBody>>();
        query.iter(&self.world).next().copied()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::engine::animation::{AnimName, AnimationClip};

    fn all_clips() -> Vec<AnimationClip> {
        AnimName::ALL
            .into_iter()
            .map(|name| AnimationClip {
                name,
                duration: 2.0,
                looping: true,
            })
            .collect()
    }

    fn pressed(keys: &[KeyCode]) -> InputState {
        let mut input = InputState::new();
        for &key in keys {
            input.set_key(key, true);
        }
        input
    }

    /// Sim with every clip delivered on the first step and the camera
    /// parked straight behind the character on +Z, so camera-relative
    /// forward is world -Z.
    fn sim_behind_character() -> Sim {
        let mut sim = Sim::new(ClipLoader::preloaded(all_clips()));
        sim.camera.position = Vec3::new(0.0, 0.0, 350.0);
        sim.camera.target = Vec3::ZERO;
        sim
    }

    // ---- planner ----------------------------------------------------------

    #[test]
    fn no_keys_plans_no_move() {
        let input = InputState::new();
        assert_eq!(plan_move(&input, 0.1, Quat::IDENTITY, MOVE_SPEED), None);
    }

    #[test]
    fn opposing_keys_cancel_out() {
        let input = pressed(&[KeyCode::KeyW, KeyCode::KeyS]);
        assert_eq!(plan_move(&input, 0.1, Quat::IDENTITY, MOVE_SPEED), None);
    }

    #[test]
    fn forward_moves_along_negative_z() {
        let input = pressed(&[KeyCode::KeyW]);
        let d = plan_move(&input, 0.1, Quat::IDENTITY, 150.0).unwrap();
        assert!((d - Vec3::new(0.0, 0.0, -15.0)).length() < 1e-5);
    }

    #[test]
    fn diagonal_input_is_not_normalized() {
        let forward = pressed(&[KeyCode::KeyW]);
        let diagonal = pressed(&[KeyCode::KeyW, KeyCode::KeyA]);

        let single = plan_move(&forward, 0.1, Quat::IDENTITY, 150.0).unwrap();
        let double = plan_move(&diagonal, 0.1, Quat::IDENTITY, 150.0).unwrap();

        // √2 faster on the diagonal, by design.
        assert!((double.length() - single.length() * 2.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn displacement_is_camera_relative() {
        let input = pressed(&[KeyCode::KeyW]);
        let quarter_turn = Quat::from_rotation_y(FRAC_PI_2);
        let d = plan_move(&input, 0.1, quarter_turn, 150.0).unwrap();
        assert!((d - Vec3::new(-15.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn displacement_stays_on_the_ground_plane() {
        let input = pressed(&[KeyCode::KeyW]);
        // Camera pitched down 45°: the rotated intent gains a Y component,
        // which must be discarded without renormalizing.
        let pitched = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4);
        let d = plan_move(&input, 0.1, pitched, 150.0).unwrap();
        assert_eq!(d.y, 0.0);
        assert!(d.length() < 15.0);
    }

    // ---- end-to-end -------------------------------------------------------

    #[test]
    fn forward_step_moves_and_crossfades_to_walk() {
        let mut sim = sim_behind_character();
        sim.input.set_key(KeyCode::KeyW, true);

        sim.step(0.1);

        let t = sim.character_transform().unwrap();
        assert!((t.position - Vec3::new(0.0, 0.0, -15.0)).length() < 1e-3);
        // Facing the attempted direction: -Z is yaw π for a +Z-forward model.
        assert!((t.yaw.abs() - PI).abs() < 1e-4);
        assert!(!sim.last_move_blocked);

        assert_eq!(sim.state_machine.active(), Some(AnimName::Walk));
        assert_eq!(sim.state_machine.previous(), Some(AnimName::Idle));
        let idle = sim.catalog.get(AnimName::Idle).unwrap();
        let walk = sim.catalog.get(AnimName::Walk).unwrap();
        assert!(idle.is_playing() && idle.is_fading());
        assert!(walk.is_playing() && walk.is_fading());
    }

    #[test]
    fn blocked_step_keeps_position_but_turns_and_walks() {
        let mut sim = sim_behind_character();
        // A big box squatting exactly on the candidate position.
        sim.world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -15.0)),
            Obstacle,
            Collider {
                center_offset: Vec3::ZERO,
                half_extents: Vec3::splat(300.0),
            },
        ));
        sim.input.set_key(KeyCode::KeyW, true);

        sim.step(0.1);

        let t = sim.character_transform().unwrap();
        assert_eq!(t.position, Vec3::ZERO);
        assert!((t.yaw.abs() - PI).abs() < 1e-4);
        assert!(sim.last_move_blocked);
        // Animation is input-driven, not collision-gated.
        assert_eq!(sim.state_machine.active(), Some(AnimName::Walk));
    }

    #[test]
    fn idle_only_catalog_settles_without_fades() {
        let idle_clip = AnimationClip {
            name: AnimName::Idle,
            duration: 2.4,
            looping: true,
        };
        let mut sim = Sim::new(ClipLoader::preloaded(vec![idle_clip]));

        sim.step(0.1);

        assert_eq!(sim.state_machine.active(), Some(AnimName::Idle));
        assert_eq!(sim.state_machine.previous(), None);
        let idle = sim.catalog.get(AnimName::Idle).unwrap();
        assert!(idle.is_playing());
        assert!(!idle.is_fading());
    }

    #[test]
    fn input_edits_between_steps_are_not_observed_separately() {
        let mut sim = sim_behind_character();
        sim.step(0.1); // settle on idle

        // Press 1, release it, press 2 — all before the next step.
        sim.input.set_key(KeyCode::Digit1, true);
        sim.input.set_key(KeyCode::Digit1, false);
        sim.input.set_key(KeyCode::Digit2, true);
        sim.step(0.1);

        assert_eq!(sim.state_machine.active(), Some(AnimName::Attack2));
        // Attack1 was never entered.
        assert!(!sim.catalog.get(AnimName::Attack1).unwrap().is_playing());
    }

    #[test]
    fn frames_tolerate_a_partially_loaded_catalog() {
        // No clips at all: stepping with input held must stay a no-op.
        let mut sim = Sim::new(ClipLoader::preloaded(Vec::new()));
        sim.input.set_key(KeyCode::KeyW, true);

        sim.step(0.1);

        assert_eq!(sim.state_machine.active(), None);
        assert_eq!(sim.catalog.loaded_count(), 0);
        // Movement still works; only the animation request was dropped.
        assert!(sim.character_position().unwrap().length() > 0.0);
    }

    #[test]
    fn camera_trails_the_character() {
        let mut sim = sim_behind_character();
        sim.input.set_key(KeyCode::KeyW, true);
        for _ in 0..200 {
            sim.step(0.016);
        }

        let position = sim.character_position().unwrap();
        let desired = position + sim.camera.offset;
        // After many steps the camera has mostly converged on the offset.
        assert!(sim.camera.position.distance(desired) < 100.0);
        assert_eq!(sim.camera.target, position);
    }
}
