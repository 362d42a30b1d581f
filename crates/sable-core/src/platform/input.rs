// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Backend-agnostic input events and the per-tick input snapshot.
//!
//! The core never polls devices. The windowing backend translates its native
//! events into [`InputEvent`]s, the frame loop accumulates them, and game
//! logic receives one resolved [`InputSnapshot`] per tick.

/// An engine-internal representation of a user input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A keyboard key was pressed.
    KeyPressed {
        /// A string representation of the physical key code.
        key_code: String,
    },
    /// A keyboard key was released.
    KeyReleased {
        /// A string representation of the physical key code.
        key_code: String,
    },
    /// A mouse button was pressed.
    MouseButtonPressed {
        /// The mouse button that was pressed.
        button: MouseButton,
    },
    /// A mouse button was released.
    MouseButtonReleased {
        /// The mouse button that was released.
        button: MouseButton,
    },
    /// The mouse cursor moved.
    MouseMoved {
        /// The new x-coordinate of the cursor.
        x: f32,
        /// The new y-coordinate of the cursor.
        y: f32,
    },
    /// The mouse wheel was scrolled.
    MouseWheelScrolled {
        /// The horizontal scroll delta.
        delta_x: f32,
        /// The vertical scroll delta.
        delta_y: f32,
    },
}

/// An engine-internal representation of a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// The left mouse button.
    Left,
    /// The right mouse button.
    Right,
    /// The middle mouse button.
    Middle,
    /// Another mouse button, identified by a numeric code.
    Other(u16),
}

/// All input events resolved for one frame tick.
///
/// The frame loop owns one snapshot, pushes translated events into it as they
/// arrive, and hands the finished snapshot to game logic at `Update` time.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    events: Vec<InputEvent>,
}

impl InputSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the snapshot.
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Returns the events captured this tick, in arrival order.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Returns `true` if the given key was pressed during this tick.
    pub fn key_pressed(&self, key_code: &str) -> bool {
        self.events.iter().any(|e| {
            matches!(e, InputEvent::KeyPressed { key_code: k } if k == key_code)
        })
    }

    /// Moves the captured events out, leaving the snapshot empty for the next
    /// tick.
    pub fn take(&mut self) -> Self {
        Self {
            events: std::mem::take(&mut self.events),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_pressed_matches_only_pressed_events() {
        let mut snapshot = InputSnapshot::new();
        snapshot.push(InputEvent::KeyReleased {
            key_code: "Space".to_string(),
        });
        assert!(!snapshot.key_pressed("Space"));

        snapshot.push(InputEvent::KeyPressed {
            key_code: "Space".to_string(),
        });
        assert!(snapshot.key_pressed("Space"));
        assert!(!snapshot.key_pressed("Escape"));
    }

    #[test]
    fn take_leaves_snapshot_empty() {
        let mut snapshot = InputSnapshot::new();
        snapshot.push(InputEvent::MouseMoved { x: 1.0, y: 2.0 });

        let taken = snapshot.take();
        assert_eq!(taken.events().len(), 1);
        assert!(snapshot.events().is_empty());
    }
}
