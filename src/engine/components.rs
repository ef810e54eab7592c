// Core ECS components for the demo scene.

use bevy_ecs::prelude::*;
use glam::Vec3;

use super::collide::Aabb;

/// Position and facing of an entity in 3D space.
/// `yaw` is rotation around the world Y axis; 0 faces +Z.
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub yaw: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
        }
    }
}

/// RGB color for rendering.
#[derive(Component, Debug, Clone, Copy)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Collision extent relative to the entity position.
/// The world-space box is recomputed from the live transform on every query.
#[derive(Component, Debug, Clone, Copy)]
pub struct Collider {
    /// Offset from `Transform::position` to the box center.
    pub center_offset: Vec3,
    pub half_extents: Vec3,
}

impl Collider {
    pub fn world_aabb(&self, position: Vec3) -> Aabb {
        Aabb::from_center_half_extents(position + self.center_offset, self.half_extents)
    }
}

/// Marker: the one player-controlled character.
#[derive(Component, Debug, Clone, Copy)]
pub struct CharacterBody;

/// Marker: a static collidable obstacle. Never moves after spawn.
#[derive(Component, Debug, Clone, Copy)]
pub struct Obstacle;

/// Which procedural mesh an entity is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Box,
    Sphere,
}

/// Instanced-rendering parameters: a unit mesh scaled by `scale` (half-extents
/// for the box, radius for the sphere) and centered at position + `offset`.
#[derive(Component, Debug, Clone, Copy)]
pub struct RenderShape {
    pub kind: ShapeKind,
    pub offset: Vec3,
    pub scale: Vec3,
}
