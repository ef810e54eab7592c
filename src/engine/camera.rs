// Trailing third-person camera.
//
// Camera model:
//   - Eases toward a fixed offset behind and above the character each step
//   - Always aims at the character, so the view direction settles as the
//     character moves
//   - Its world orientation feeds the movement planner: "forward" input
//     means "away from the camera"

use glam::{Mat4, Quat, Vec3};

pub struct FollowCamera {
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,

    /// Desired offset from the character to the camera eye.
    pub offset: Vec3,
    /// Fraction of the remaining distance covered per step.
    pub follow_lerp: f32,

    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl FollowCamera {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 300.0, 350.0),
            target: Vec3::new(0.0, 100.0, 0.0),
            offset: Vec3::new(0.0, 200.0, -500.0),
            follow_lerp: 0.1,
            fov: 50.0_f32.to_radians(),
            near: 1.0,
            far: 2000.0,
        }
    }

    /// Ease toward the trailing position and aim at the character.
    /// Call once per step, after the character has moved.
    pub fn update(&mut self, character_position: Vec3) {
        let desired = character_position + self.offset;
        self.position = self.position.lerp(desired, self.follow_lerp);
        self.target = character_position;
    }

    /// World-space rotation of the camera. Rotating local -Z by this
    /// quaternion gives the view direction; the movement planner uses it
    /// to turn raw input into camera-relative displacement.
    pub fn orientation(&self) -> Quat {
        Quat::from_mat4(&self.view_matrix().inverse()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_eases_toward_the_trailing_offset() {
        let mut camera = FollowCamera::new();
        camera.position = Vec3::ZERO;
        let character = Vec3::new(100.0, 0.0, 0.0);

        camera.update(character);
        let desired = character + camera.offset;
        // One step covers exactly follow_lerp of the distance.
        assert!((camera.position - desired * camera.follow_lerp).length() < 1e-4);
        assert_eq!(camera.target, character);
    }

    #[test]
    fn orientation_is_identity_when_looking_down_negative_z() {
        let mut camera = FollowCamera::new();
        camera.position = Vec3::new(0.0, 0.0, 350.0);
        camera.target = Vec3::ZERO;

        let forward = camera.orientation() * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn orientation_tracks_the_view_direction() {
        let mut camera = FollowCamera::new();
        camera.position = Vec3::new(-350.0, 0.0, 0.0);
        camera.target = Vec3::ZERO;

        // Looking along +X: local -Z maps to +X.
        let forward = camera.orientation() * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-5);
    }
}
