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

//! Errors produced by the dirty-state engine.

use std::fmt;

/// An error raised while reconciling a stateful object.
#[derive(Debug)]
pub enum StateError {
    /// A type-specific reconciliation step failed. The object stays enrolled
    /// and is retried on the next tick.
    ReconcileFailed {
        /// The debug name of the failing object.
        object: String,
        /// A description of the underlying failure.
        details: String,
    },
    /// The mutex guarding an enrolled object was poisoned by a panic.
    LockPoisoned {
        /// The debug name of the poisoned object.
        object: String,
    },
    /// An object failed to reconcile for more consecutive ticks than the
    /// registry's retry budget allows.
    RetryBudgetExhausted {
        /// The debug name of the failing object.
        object: String,
        /// The number of consecutive failed attempts.
        attempts: u32,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::ReconcileFailed { object, details } => {
                write!(f, "Reconciliation of '{object}' failed: {details}")
            }
            StateError::LockPoisoned { object } => {
                write!(f, "State lock for '{object}' was poisoned")
            }
            StateError::RetryBudgetExhausted { object, attempts } => {
                write!(
                    f,
                    "Reconciliation of '{object}' failed {attempts} consecutive times; giving up"
                )
            }
        }
    }
}

impl std::error::Error for StateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_failed_display() {
        let err = StateError::ReconcileFailed {
            object: "camera".to_string(),
            details: "view target collapsed onto eye".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Reconciliation of 'camera' failed: view target collapsed onto eye"
        );
    }

    #[test]
    fn retry_budget_display_carries_attempts() {
        let err = StateError::RetryBudgetExhausted {
            object: "dispatch-topology".to_string(),
            attempts: 120,
        };
        assert!(format!("{err}").contains("120 consecutive times"));
    }
}
