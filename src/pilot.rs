//! Seeded demo pilot that plays the game through key events
//!
//! Used by the headless driver in place of a keyboard.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::input::{Key, KeyEvent};
use crate::sim::Session;

/// Frames to wait on the game-over screen before pressing Start again
const RESTART_DELAY_FRAMES: u32 = 120;

#[derive(Debug, Clone)]
pub struct DemoPilot {
    rng: Pcg32,
    held: Vec<Key>,
    hold_frames: u32,
    over_frames: u32,
}

impl DemoPilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            held: Vec::new(),
            hold_frames: 0,
            over_frames: 0,
        }
    }

    /// Keys currently held down
    pub fn held(&self) -> &[Key] {
        &self.held
    }

    /// Key events for the coming frame
    pub fn next_events(&mut self, session: &Session) -> Vec<KeyEvent> {
        let clock = session.clock();
        if !clock.started {
            return vec![KeyEvent::Pressed(Key::Start), KeyEvent::Released(Key::Start)];
        }

        if clock.is_over() {
            let mut events = self.release_all();
            self.over_frames += 1;
            if self.over_frames >= RESTART_DELAY_FRAMES {
                self.over_frames = 0;
                self.hold_frames = 0;
                events.push(KeyEvent::Pressed(Key::Start));
                events.push(KeyEvent::Released(Key::Start));
            }
            return events;
        }

        if self.hold_frames > 0 {
            self.hold_frames -= 1;
            return Vec::new();
        }

        let mut events = self.release_all();
        self.held = self.pick_keys();
        self.hold_frames = self.rng.random_range(10..60);
        events.extend(self.held.iter().map(|&key| KeyEvent::Pressed(key)));
        events
    }

    fn release_all(&mut self) -> Vec<KeyEvent> {
        self.held.drain(..).map(KeyEvent::Released).collect()
    }

    fn pick_keys(&mut self) -> Vec<Key> {
        let mut keys = Vec::new();
        if self.rng.random_bool(0.7) {
            keys.push(Key::Forward);
        } else if self.rng.random_bool(0.3) {
            keys.push(Key::Reverse);
        }
        match self.rng.random_range(0..3) {
            0 => keys.push(Key::TurnLeft),
            1 => keys.push(Key::TurnRight),
            _ => {}
        }
        if self.rng.random_bool(0.5) {
            keys.push(Key::Shoot);
        }
        if self.rng.random_bool(0.1) {
            keys.push(Key::Grip);
        }
        keys
    }
}
