// Animation clips, playable handles, the catalog, and the state machine.
//
// Clips arrive asynchronously and independently (see loader.rs), so the
// catalog is partially populated for the first few frames. Referencing a
// clip that has not arrived yet is an expected race and resolves to a
// silent no-op — the state machine re-evaluates every frame, so the
// transition simply happens once the clip shows up.
//
// During a crossfade two handles play at once: the outgoing one keeps
// running while its weight ramps to zero, the incoming one ramps from zero
// to one. The state machine tracks both slots explicitly.

use std::collections::HashMap;

use winit::keyboard::KeyCode;

use super::input::InputState;

/// Crossfade window between animation states, in seconds.
pub const CROSSFADE_SECS: f32 = 0.5;

// ============================================================================
// NAMES & CLIPS
// ============================================================================

/// The seven animation states the demo knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimName {
    Idle,
    Walk,
    Attack1,
    Attack2,
    Defense,
    Emote,
    Kick,
}

impl AnimName {
    pub const ALL: [AnimName; 7] = [
        AnimName::Idle,
        AnimName::Walk,
        AnimName::Attack1,
        AnimName::Attack2,
        AnimName::Defense,
        AnimName::Emote,
        AnimName::Kick,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnimName::Idle => "idle",
            AnimName::Walk => "walk",
            AnimName::Attack1 => "attack1",
            AnimName::Attack2 => "attack2",
            AnimName::Defense => "defense",
            AnimName::Emote => "emote",
            AnimName::Kick => "kick",
        }
    }
}

/// A pre-baked animation clip. Asset parsing happens upstream; by the time
/// a clip reaches the catalog it is already playable.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: AnimName,
    /// Clip length in seconds.
    pub duration: f32,
    pub looping: bool,
}

// ============================================================================
// HANDLE
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

/// A playable binding of one clip to the character's skeleton.
///
/// Tracks its own clip time and blend weight. A handle fading out keeps
/// playing until the fade completes, then stops itself.
#[derive(Debug)]
pub struct AnimationHandle {
    clip: AnimationClip,
    playing: bool,
    time: f32,
    weight: f32,
    fade: Option<Fade>,
}

impl AnimationHandle {
    fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            playing: false,
            time: 0.0,
            weight: 1.0,
            fade: None,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.fade = None;
    }

    /// Rewind to the start pose.
    pub fn reset(&mut self) {
        self.time = 0.0;
    }

    /// Ramp the blend weight from zero to one over `secs`.
    pub fn fade_in(&mut self, secs: f32) {
        self.weight = 0.0;
        self.fade = Some(Fade {
            from: 0.0,
            to: 1.0,
            duration: secs,
            elapsed: 0.0,
        });
    }

    /// Ramp the blend weight from its current value to zero over `secs`.
    pub fn fade_out(&mut self, secs: f32) {
        self.fade = Some(Fade {
            from: self.weight,
            to: 0.0,
            duration: secs,
            elapsed: 0.0,
        });
    }

    /// Advance clip time and any in-flight fade. Called by the catalog.
    fn update(&mut self, dt: f32) {
        if !self.playing {
            return;
        }

        self.time += dt;
        if self.clip.duration > 0.0 {
            if self.clip.looping {
                self.time %= self.clip.duration;
            } else {
                self.time = self.time.min(self.clip.duration);
            }
        }

        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            let t = if fade.duration > 0.0 {
                (fade.elapsed / fade.duration).min(1.0)
            } else {
                1.0
            };
            self.weight = fade.from + (fade.to - fade.from) * t;
            if t >= 1.0 {
                let faded_to_silence = fade.to == 0.0;
                self.fade = None;
                if faded_to_silence {
                    // Finished fading out: release the skeleton.
                    self.playing = false;
                }
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Name → handle registry, populated one entry at a time as clip loads
/// complete. Absence of an entry is a legitimate steady state, never an
/// error. Doubles as the mixer: `update` advances every playing handle.
pub struct AnimationCatalog {
    handles: HashMap<AnimName, AnimationHandle>,
}

impl AnimationCatalog {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Register a freshly loaded clip under its name.
    pub fn insert_clip(&mut self, clip: AnimationClip) {
        self.handles.insert(clip.name, AnimationHandle::new(clip));
    }

    pub fn contains(&self, name: AnimName) -> bool {
        self.handles.contains_key(&name)
    }

    pub fn get(&self, name: AnimName) -> Option<&AnimationHandle> {
        self.handles.get(&name)
    }

    pub fn get_mut(&mut self, name: AnimName) -> Option<&mut AnimationHandle> {
        self.handles.get_mut(&name)
    }

    pub fn loaded_count(&self) -> usize {
        self.handles.len()
    }

    /// Advance every playing handle by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for handle in self.handles.values_mut() {
            handle.update(dt);
        }
    }
}

impl Default for AnimationCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

/// Map the current input snapshot to the single desired animation state.
///
/// Ordered tie-break, first match wins: movement dominates all actions,
/// actions dominate in numeric order, idle is the fallback. Simultaneous
/// keys never blend — exactly one state comes out.
pub fn desired_state(input: &InputState) -> AnimName {
    if input.is_key_held(KeyCode::KeyW)
        || input.is_key_held(KeyCode::KeyS)
        || input.is_key_held(KeyCode::KeyA)
        || input.is_key_held(KeyCode::KeyD)
    {
        AnimName::Walk
    } else if input.is_key_held(KeyCode::Digit1) {
        AnimName::Attack1
    } else if input.is_key_held(KeyCode::Digit2) {
        AnimName::Attack2
    } else if input.is_key_held(KeyCode::Digit3) {
        AnimName::Defense
    } else if input.is_key_held(KeyCode::Digit4) {
        AnimName::Emote
    } else if input.is_key_held(KeyCode::Digit5) {
        AnimName::Kick
    } else {
        AnimName::Idle
    }
}

/// Crossfading animation state machine: one active state plus an explicit
/// fading-out slot. No state until idle loads, at which point idle starts
/// automatically.
pub struct StateMachine {
    active: Option<AnimName>,
    previous: Option<AnimName>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            active: None,
            previous: None,
        }
    }

    pub fn active(&self) -> Option<AnimName> {
        self.active
    }

    /// The state currently fading out, if a crossfade is in flight.
    pub fn previous(&self) -> Option<AnimName> {
        self.previous
    }

    /// Auto-play the default state: the first time idle appears in the
    /// catalog with nothing active yet, it starts at full weight, no fade.
    pub fn activate_default(&mut self, catalog: &mut AnimationCatalog) {
        if self.active.is_some() {
            return;
        }
        if let Some(handle) = catalog.get_mut(AnimName::Idle) {
            handle.play();
            self.active = Some(AnimName::Idle);
        }
    }

    /// Crossfade to `new`.
    ///
    /// No-op when `new` is already active, and when `new` has not loaded
    /// yet (the request is dropped, not queued — next frame re-evaluates
    /// anyway). Rapid repeated transitions just retarget the two slots;
    /// there is no queue and no guard beyond the fade window itself.
    pub fn transition(&mut self, catalog: &mut AnimationCatalog, new: AnimName) {
        if self.active == Some(new) {
            return;
        }
        if !catalog.contains(new) {
            return;
        }

        if let Some(current) = self.active {
            if let Some(handle) = catalog.get_mut(current) {
                handle.fade_out(CROSSFADE_SECS);
            }
            self.previous = Some(current);
        }

        if let Some(handle) = catalog.get_mut(new) {
            handle.reset();
            handle.fade_in(CROSSFADE_SECS);
            handle.play();
            self.active = Some(new);
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(name: AnimName) -> AnimationClip {
        AnimationClip {
            name,
            duration: 2.0,
            looping: true,
        }
    }

    fn full_catalog() -> AnimationCatalog {
        let mut catalog = AnimationCatalog::new();
        for name in AnimName::ALL {
            catalog.insert_clip(clip(name));
        }
        catalog
    }

    #[test]
    fn desired_state_falls_back_to_idle() {
        let input = InputState::new();
        assert_eq!(desired_state(&input), AnimName::Idle);
    }

    #[test]
    fn movement_keys_dominate_action_keys() {
        let mut input = InputState::new();
        input.set_key(KeyCode::Digit1, true);
        input.set_key(KeyCode::Digit5, true);
        assert_eq!(desired_state(&input), AnimName::Attack1);

        input.set_key(KeyCode::KeyA, true);
        assert_eq!(desired_state(&input), AnimName::Walk);
    }

    #[test]
    fn action_keys_resolve_in_numeric_order() {
        let keys = [
            (KeyCode::Digit1, AnimName::Attack1),
            (KeyCode::Digit2, AnimName::Attack2),
            (KeyCode::Digit3, AnimName::Defense),
            (KeyCode::Digit4, AnimName::Emote),
            (KeyCode::Digit5, AnimName::Kick),
        ];

        // Hold all five; release from the front and watch priority walk down.
        let mut input = InputState::new();
        for (key, _) in keys {
            input.set_key(key, true);
        }
        for (key, expected) in keys {
            assert_eq!(desired_state(&input), expected);
            input.set_key(key, false);
        }
        assert_eq!(desired_state(&input), AnimName::Idle);
    }

    #[test]
    fn any_single_movement_key_walks() {
        for key in [KeyCode::KeyW, KeyCode::KeyS, KeyCode::KeyA, KeyCode::KeyD] {
            let mut input = InputState::new();
            input.set_key(key, true);
            assert_eq!(desired_state(&input), AnimName::Walk);
        }
    }

    #[test]
    fn idle_auto_plays_once_loaded() {
        let mut catalog = AnimationCatalog::new();
        let mut sm = StateMachine::new();

        // Nothing loaded yet: no state.
        sm.activate_default(&mut catalog);
        assert_eq!(sm.active(), None);

        catalog.insert_clip(clip(AnimName::Idle));
        sm.activate_default(&mut catalog);
        assert_eq!(sm.active(), Some(AnimName::Idle));

        let idle = catalog.get(AnimName::Idle).unwrap();
        assert!(idle.is_playing());
        assert!(!idle.is_fading());
        assert_eq!(idle.weight(), 1.0);
    }

    #[test]
    fn transition_to_active_state_is_a_no_op() {
        let mut catalog = full_catalog();
        let mut sm = StateMachine::new();
        sm.activate_default(&mut catalog);

        sm.transition(&mut catalog, AnimName::Idle);
        assert_eq!(sm.active(), Some(AnimName::Idle));
        assert_eq!(sm.previous(), None);
        assert!(!catalog.get(AnimName::Idle).unwrap().is_fading());
    }

    #[test]
    fn transition_to_unloaded_state_is_dropped() {
        let mut catalog = AnimationCatalog::new();
        catalog.insert_clip(clip(AnimName::Idle));
        let mut sm = StateMachine::new();
        sm.activate_default(&mut catalog);

        sm.transition(&mut catalog, AnimName::Walk);
        assert_eq!(sm.active(), Some(AnimName::Idle));
        assert_eq!(sm.previous(), None);
        assert_eq!(catalog.loaded_count(), 1);
        assert!(catalog.get(AnimName::Idle).unwrap().is_playing());
    }

    #[test]
    fn transition_crossfades_both_handles() {
        let mut catalog = full_catalog();
        let mut sm = StateMachine::new();
        sm.activate_default(&mut catalog);

        sm.transition(&mut catalog, AnimName::Walk);
        assert_eq!(sm.active(), Some(AnimName::Walk));
        assert_eq!(sm.previous(), Some(AnimName::Idle));

        let idle = catalog.get(AnimName::Idle).unwrap();
        let walk = catalog.get(AnimName::Walk).unwrap();
        // Both play concurrently during the crossfade window.
        assert!(idle.is_playing() && idle.is_fading());
        assert!(walk.is_playing() && walk.is_fading());
        assert_eq!(walk.weight(), 0.0);
        assert_eq!(walk.time(), 0.0);
    }

    #[test]
    fn fade_out_completes_and_stops_the_handle() {
        let mut catalog = full_catalog();
        let mut sm = StateMachine::new();
        sm.activate_default(&mut catalog);
        sm.transition(&mut catalog, AnimName::Walk);

        // Halfway through the fade both are still playing.
        catalog.update(CROSSFADE_SECS / 2.0);
        let idle = catalog.get(AnimName::Idle).unwrap();
        assert!(idle.is_playing());
        assert!(idle.weight() > 0.0 && idle.weight() < 1.0);

        // Past the window: idle released, walk at full weight.
        catalog.update(CROSSFADE_SECS);
        assert!(!catalog.get(AnimName::Idle).unwrap().is_playing());
        let walk = catalog.get(AnimName::Walk).unwrap();
        assert!(walk.is_playing());
        assert_eq!(walk.weight(), 1.0);
        assert!(!walk.is_fading());
    }

    #[test]
    fn rapid_transitions_retarget_the_slots() {
        let mut catalog = full_catalog();
        let mut sm = StateMachine::new();
        sm.activate_default(&mut catalog);

        sm.transition(&mut catalog, AnimName::Walk);
        sm.transition(&mut catalog, AnimName::Kick);

        assert_eq!(sm.active(), Some(AnimName::Kick));
        assert_eq!(sm.previous(), Some(AnimName::Walk));
        assert!(catalog.get(AnimName::Walk).unwrap().is_fading());
        assert!(catalog.get(AnimName::Kick).unwrap().is_playing());
    }

    #[test]
    fn looping_clip_time_wraps() {
        let mut catalog = AnimationCatalog::new();
        catalog.insert_clip(clip(AnimName::Idle));
        let handle = catalog.get_mut(AnimName::Idle).unwrap();
        handle.play();

        catalog.update(2.5);
        let t = catalog.get(AnimName::Idle).unwrap().time();
        assert!((t - 0.5).abs() < 1e-5);
    }
}
