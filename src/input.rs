//! Held steering flags, written by key/touch handlers and read once per tick

use crate::sim::TickInput;

/// Steering state as seen by the input layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub move_left: bool,
    pub move_right: bool,
}

/// Steering direction a key maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

impl Steer {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(Steer::Left),
            "ArrowRight" | "d" | "D" => Some(Steer::Right),
            _ => None,
        }
    }
}

impl InputFlags {
    /// Apply a key transition. Presses are ignored while the game is not
    /// running; releases always clear the flag so nothing stays stuck.
    /// Returns whether the key is a steering key.
    pub fn apply_key(&mut self, key: &str, pressed: bool, running: bool) -> bool {
        let Some(steer) = Steer::from_key(key) else {
            return false;
        };
        if pressed && !running {
            return true;
        }
        match steer {
            Steer::Left => self.move_left = pressed,
            Steer::Right => self.move_right = pressed,
        }
        true
    }

    /// Touch/pointer press at `x` on a surface `width` wide: the left half
    /// steers left, the right half steers right
    pub fn press_at(&mut self, x: f32, width: f32) {
        let left = x < width * 0.5;
        self.move_left = left;
        self.move_right = !left;
    }

    /// Touch/pointer released
    pub fn release(&mut self) {
        *self = Self::default();
    }

    pub fn tick_input(&self) -> TickInput {
        TickInput {
            move_left: self.move_left,
            move_right: self.move_right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_map_to_flags() {
        let mut flags = InputFlags::default();
        assert!(flags.apply_key("ArrowLeft", true, true));
        assert!(flags.move_left);
        assert!(flags.apply_key("D", true, true));
        assert!(flags.move_right);
        assert!(flags.apply_key("a", false, true));
        assert!(!flags.move_left);
        assert!(!flags.apply_key("Escape", true, true));
    }

    #[test]
    fn test_presses_ignored_when_not_running_but_releases_honoured() {
        let mut flags = InputFlags {
            move_left: true,
            move_right: false,
        };
        flags.apply_key("ArrowRight", true, false);
        assert!(!flags.move_right);
        flags.apply_key("ArrowLeft", false, false);
        assert!(!flags.move_left);
    }

    #[test]
    fn test_touch_halves() {
        let mut flags = InputFlags::default();
        flags.press_at(10.0, 400.0);
        assert_eq!(flags.tick_input(), TickInput { move_left: true, move_right: false });
        flags.press_at(390.0, 400.0);
        assert_eq!(flags.tick_input(), TickInput { move_left: false, move_right: true });
        flags.release();
        assert_eq!(flags.tick_input(), TickInput::default());
    }
}
