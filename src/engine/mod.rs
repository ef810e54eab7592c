// Engine modules for the character movement demo.

pub mod animation;
pub mod camera;
pub mod collide;
pub mod components;
pub mod hud;
pub mod input;
pub mod loader;
pub mod locomotion;
pub mod mesh;
pub mod scene;

// Re-export commonly used items
pub use components::*;
