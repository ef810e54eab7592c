// Input state tracking for the keyboard.
// Abstracts winit events into a queryable per-frame snapshot.
//
// Physical key codes are layout- and case-normalized by winit, so `KeyW`
// covers both `w` and `W`. Keys the demo never asks about are stored too
// and simply ignored on read.

use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

pub struct InputState {
    keys_held: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the game's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                self.set_key(key, event.state == ElementState::Pressed);
            }
        }
    }

    /// Record a key edge directly. The locomotion step reads the resulting
    /// snapshot once per frame; edits between frames are never observed
    /// individually.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
    }

    /// False for any key never seen.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_read_as_released() {
        let input = InputState::new();
        assert!(!input.is_key_held(KeyCode::KeyW));
        assert!(!input.is_key_held(KeyCode::F24));
    }

    #[test]
    fn set_key_toggles_state() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        assert!(input.is_key_held(KeyCode::KeyW));
        input.set_key(KeyCode::KeyW, false);
        assert!(!input.is_key_held(KeyCode::KeyW));
    }

    #[test]
    fn releasing_an_unpressed_key_is_harmless() {
        let mut input = InputState::new();
        input.set_key(KeyCode::Digit1, false);
        assert!(!input.is_key_held(KeyCode::Digit1));
    }
}
