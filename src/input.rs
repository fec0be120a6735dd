//! Key events to player controls and session actions

use serde::{Deserialize, Serialize};

use crate::sim::{Control, Session};

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Forward,
    Reverse,
    TurnLeft,
    TurnRight,
    Shoot,
    Grip,
    Start,
    Quit,
}

impl Key {
    /// Map a platform key name (browser `KeyboardEvent.key` style)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" | "w" | "W" => Some(Key::Forward),
            "ArrowDown" | "s" | "S" => Some(Key::Reverse),
            "ArrowLeft" | "a" | "A" => Some(Key::TurnLeft),
            "ArrowRight" | "d" | "D" => Some(Key::TurnRight),
            "Control" | " " => Some(Key::Shoot),
            "Shift" => Some(Key::Grip),
            "Enter" => Some(Key::Start),
            "Escape" => Some(Key::Quit),
            _ => None,
        }
    }

    /// The player control a key drives, if any
    pub fn control(self) -> Option<Control> {
        match self {
            Key::Forward => Some(Control::Forward),
            Key::Reverse => Some(Control::Reverse),
            Key::TurnLeft => Some(Control::TurnLeft),
            Key::TurnRight => Some(Control::TurnRight),
            Key::Shoot => Some(Control::Shoot),
            Key::Grip => Some(Control::Grip),
            Key::Start | Key::Quit => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// What the driver should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Quit,
}

/// Apply one key event to the session
///
/// Presses are ignored once the game is over, releases always go through.
pub fn apply_key_event(session: &mut Session, event: KeyEvent) -> InputOutcome {
    match event {
        KeyEvent::Pressed(Key::Quit) => return InputOutcome::Quit,
        KeyEvent::Pressed(Key::Start) => session.start(),
        KeyEvent::Pressed(key) => {
            let Some(control) = key.control() else {
                return InputOutcome::Continue;
            };
            if session.clock().is_over() {
                return InputOutcome::Continue;
            }
            if control == Control::Grip && !session.config().grip_enabled {
                return InputOutcome::Continue;
            }
            session.set_player_control(control, true);
            if control == Control::Shoot {
                if let Some(player) = session.player_entity_mut() {
                    player.shoot_timer_ms = 0;
                }
            }
        }
        KeyEvent::Released(key) => {
            if let Some(control) = key.control() {
                session.set_player_control(control, false);
            }
        }
    }
    InputOutcome::Continue
}
