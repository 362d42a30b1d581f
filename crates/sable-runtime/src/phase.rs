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

//! The engine's top-level phase state machine.

/// The lifecycle phase of the running engine.
///
/// `Starting` is only reachable once, at boot; afterwards the engine swings
/// between `Running` and `Paused` as the window gains and loses input
/// focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Boot: content is not loaded yet.
    Starting,
    /// Ticking normally: Update and Render run each frame.
    Running,
    /// The window lost focus: Update and Render are skipped and the frame
    /// clock is frozen.
    Paused,
}

impl EnginePhase {
    /// Transitions to `Paused`. Only a running engine can pause; returns
    /// `true` if the transition happened.
    pub fn pause(&mut self) -> bool {
        if *self == EnginePhase::Running {
            *self = EnginePhase::Paused;
            true
        } else {
            false
        }
    }

    /// Transitions to `Running`, either from boot or from pause. Returns
    /// `true` if the transition happened.
    pub fn resume(&mut self) -> bool {
        match *self {
            EnginePhase::Starting | EnginePhase::Paused => {
                *self = EnginePhase::Running;
                true
            }
            EnginePhase::Running => false,
        }
    }

    /// Returns `true` while Update/Render should run.
    pub fn is_running(&self) -> bool {
        *self == EnginePhase::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_resumes_into_running_exactly_once() {
        let mut phase = EnginePhase::Starting;
        assert!(phase.resume());
        assert_eq!(phase, EnginePhase::Running);
        assert!(!phase.resume());
    }

    #[test]
    fn pause_only_applies_while_running() {
        let mut phase = EnginePhase::Starting;
        assert!(!phase.pause());
        assert_eq!(phase, EnginePhase::Starting);

        phase.resume();
        assert!(phase.pause());
        assert_eq!(phase, EnginePhase::Paused);
        assert!(!phase.pause());
    }

    #[test]
    fn running_and_paused_alternate_with_focus() {
        let mut phase = EnginePhase::Starting;
        phase.resume();
        phase.pause();
        assert!(!phase.is_running());
        assert!(phase.resume());
        assert!(phase.is_running());
    }
}
