// Asynchronous clip delivery.
//
// Each clip is produced by its own fire-and-forget worker thread and sent
// over a channel; completions arrive in any order and at any time relative
// to frame steps. The locomotion step drains the channel once per frame,
// so catalog insertion stays single-writer. There is no cancellation and
// no timeout — a started load runs to completion.
//
// Asset parsing is out of scope here: the workers stand in for the decode
// stage of a real pipeline and deliver pre-baked clip descriptions.

use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::warn;

use super::animation::{AnimName, AnimationClip};

/// The clip set the demo ships with: name and duration in seconds.
/// All clips loop.
const CLIP_MANIFEST: [(AnimName, f32); 7] = [
    (AnimName::Idle, 2.4),
    (AnimName::Walk, 1.0),
    (AnimName::Attack1, 3.2),
    (AnimName::Attack2, 2.8),
    (AnimName::Defense, 2.1),
    (AnimName::Emote, 4.6),
    (AnimName::Kick, 1.8),
];

pub struct ClipLoader {
    rx: Receiver<AnimationClip>,
}

impl ClipLoader {
    /// Kick off one worker per manifest entry.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();

        for (name, duration) in CLIP_MANIFEST {
            let tx = tx.clone();
            thread::spawn(move || {
                let clip = AnimationClip {
                    name,
                    duration,
                    looping: true,
                };
                if tx.send(clip).is_err() {
                    warn!("clip {} finished loading after shutdown", name.label());
                }
            });
        }

        Self { rx }
    }

    /// A loader whose "loads" have all already completed. The clips are
    /// delivered by the first `poll`. Used by tests to control exactly
    /// which entries the catalog holds.
    pub fn preloaded(clips: Vec<AnimationClip>) -> Self {
        let (tx, rx) = mpsc::channel();
        for clip in clips {
            // Receiver is alive and unbounded; send cannot fail here.
            let _ = tx.send(clip);
        }
        Self { rx }
    }

    /// Drain every clip that finished loading since the last call.
    /// Never blocks.
    pub fn poll(&self) -> impl Iterator<Item = AnimationClip> + '_ {
        self.rx.try_iter()
    }
}
