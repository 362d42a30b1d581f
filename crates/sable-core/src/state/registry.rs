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

//! The engine-owned registry of objects with pending property changes.

use super::error::StateError;
use std::sync::{Arc, Mutex};

/// The default number of consecutive failed reconciliation attempts before
/// the registry escalates to a fatal [`StateError::RetryBudgetExhausted`].
pub const DEFAULT_RETRY_BUDGET: u32 = 120;

/// The reconciliation capability every dirty-trackable object implements.
///
/// Implementations must be idempotent: calling [`Reconcile::reconcile`] on a
/// clean object returns `Ok(())` immediately without side effects.
pub trait Reconcile: Send {
    /// Applies all staged property changes to the underlying resources and
    /// clears them. Returns `Ok(())` once the object is clean.
    fn reconcile(&mut self) -> Result<(), StateError>;

    /// Returns `true` if the object has no staged property changes.
    fn is_clean(&self) -> bool;

    /// A stable name for logs and error reports.
    fn debug_name(&self) -> &'static str;
}

/// A shared, lockable handle to a dirty-trackable object.
pub type DirtyHandle = Arc<Mutex<dyn Reconcile>>;

struct Entry {
    target: DirtyHandle,
    consecutive_failures: u32,
}

/// The outcome of one registry reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Objects that reconciled successfully and left the registry.
    pub reconciled: usize,
    /// Objects that failed and stay enrolled for a retry next tick.
    pub retried: usize,
}

/// An ordered collection of objects with pending property changes.
///
/// The registry is a plain value owned by the frame loop, handed to
/// components by reference; there is no ambient global list. Enrollment is
/// idempotent per object identity, and one [`reconcile_all`] pass visits
/// each enrolled object exactly once, walking from the most recently
/// enrolled entry back to the oldest so that removal during iteration stays
/// index-safe and freshly dirtied objects (which rarely depend on older
/// entries) settle first.
///
/// [`reconcile_all`]: DirtyRegistry::reconcile_all
pub struct DirtyRegistry {
    entries: Vec<Entry>,
    retry_budget: u32,
}

impl DirtyRegistry {
    /// Creates an empty registry with the default retry budget.
    pub fn new() -> Self {
        Self::with_retry_budget(DEFAULT_RETRY_BUDGET)
    }

    /// Creates an empty registry that escalates to a fatal error after
    /// `retry_budget` consecutive failures of a single entry.
    pub fn with_retry_budget(retry_budget: u32) -> Self {
        Self {
            entries: Vec::new(),
            retry_budget: retry_budget.max(1),
        }
    }

    /// Enrolls an object for reconciliation on the next pass.
    ///
    /// Returns `false` if the object (by `Arc` identity) is already
    /// enrolled; an object never holds more than one entry no matter how
    /// many of its properties were staged since the last pass.
    pub fn enroll(&mut self, target: DirtyHandle) -> bool {
        if self.contains(&target) {
            return false;
        }
        self.entries.push(Entry {
            target,
            consecutive_failures: 0,
        });
        true
    }

    /// Returns `true` if the object is currently enrolled.
    ///
    /// Identity is the object's allocation, compared by thin data pointer;
    /// comparing fat pointers would also compare vtable addresses, which are
    /// not guaranteed unique per type.
    pub fn contains(&self, target: &DirtyHandle) -> bool {
        let wanted = Arc::as_ptr(target) as *const ();
        self.entries
            .iter()
            .any(|entry| Arc::as_ptr(&entry.target) as *const () == wanted)
    }

    /// The number of enrolled objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no objects are enrolled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every enrolled entry without reconciling. Called on engine
    /// shutdown.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!(
                "DirtyRegistry cleared with {} unreconciled entries",
                self.entries.len()
            );
        }
        self.entries.clear();
    }

    /// Visits every enrolled object once, newest enrollment first.
    ///
    /// Successfully reconciled objects are removed. A failing object is
    /// logged and kept for a retry on the next tick, unless it has now
    /// failed `retry_budget` consecutive times, in which case the pass
    /// aborts with [`StateError::RetryBudgetExhausted`]. A failure never
    /// corrupts the membership of other entries.
    pub fn reconcile_all(&mut self) -> Result<ReconcileReport, StateError> {
        let mut report = ReconcileReport::default();
        let mut index = self.entries.len();
        while index > 0 {
            index -= 1;
            let entry = &mut self.entries[index];
            let (name, outcome) = match entry.target.lock() {
                Ok(mut guard) => (guard.debug_name(), guard.reconcile()),
                Err(_) => (
                    "poisoned",
                    Err(StateError::LockPoisoned {
                        object: "poisoned".to_string(),
                    }),
                ),
            };
            match outcome {
                Ok(()) => {
                    log::trace!("'{name}' reconciled, leaving registry");
                    self.entries.remove(index);
                    report.reconciled += 1;
                }
                Err(err) => {
                    entry.consecutive_failures += 1;
                    if entry.consecutive_failures >= self.retry_budget {
                        let attempts = entry.consecutive_failures;
                        self.entries.remove(index);
                        return Err(StateError::RetryBudgetExhausted {
                            object: name.to_string(),
                            attempts,
                        });
                    }
                    log::error!(
                        "Reconciliation of '{name}' failed (attempt {}): {err}",
                        entry.consecutive_failures
                    );
                    report.retried += 1;
                }
            }
        }
        Ok(report)
    }
}

impl Default for DirtyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChangeSet;

    /// A dirty-trackable test object that appends its name to a shared log
    /// when reconciled.
    struct Probe {
        name: &'static str,
        value: u32,
        changes: ChangeSet,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail_times: u32,
    }

    impl Probe {
        fn new(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self {
                name,
                value: 0,
                changes: ChangeSet::new(name),
                log,
                fail_times: 0,
            }
        }

        fn set_value(&mut self, value: u32) {
            self.changes.stage(&mut self.value, value, "value");
        }
    }

    impl Reconcile for Probe {
        fn reconcile(&mut self) -> Result<(), StateError> {
            if self.changes.is_clean() {
                return Ok(());
            }
            if self.fail_times > 0 {
                self.fail_times -= 1;
                return Err(StateError::ReconcileFailed {
                    object: self.name.to_string(),
                    details: "requested failure".to_string(),
                });
            }
            self.log.lock().unwrap().push(self.name);
            self.changes.finish();
            Ok(())
        }

        fn is_clean(&self) -> bool {
            self.changes.is_clean()
        }

        fn debug_name(&self) -> &'static str {
            self.name
        }
    }

    fn dirty_probe(
        name: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<Mutex<Probe>> {
        let mut probe = Probe::new(name, Arc::clone(log));
        probe.set_value(1);
        Arc::new(Mutex::new(probe))
    }

    #[test]
    fn enroll_deduplicates_by_identity() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let probe = dirty_probe("a", &log);
        let mut registry = DirtyRegistry::new();

        assert!(registry.enroll(probe.clone()));
        assert!(!registry.enroll(probe.clone()));
        assert!(!registry.enroll(probe));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn pass_visits_newest_enrollment_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = dirty_probe("a", &log);
        let b = dirty_probe("b", &log);
        let mut registry = DirtyRegistry::new();
        registry.enroll(a);
        registry.enroll(b);

        let report = registry.reconcile_all().expect("pass succeeds");
        assert_eq!(report.reconciled, 2);
        assert_eq!(*log.lock().unwrap(), vec!["b", "a"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn reconciled_object_leaves_and_reenters_on_new_mutation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let probe = dirty_probe("a", &log);
        let mut registry = DirtyRegistry::new();
        registry.enroll(probe.clone());

        registry.reconcile_all().expect("pass succeeds");
        assert!(registry.is_empty());
        assert!(probe.lock().unwrap().is_clean());

        probe.lock().unwrap().set_value(2);
        probe.lock().unwrap().set_value(3);
        assert!(registry.enroll(probe.clone()));
        assert!(!registry.enroll(probe));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failing_entry_is_retried_and_does_not_disturb_others() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let healthy = dirty_probe("healthy", &log);
        let failing = dirty_probe("failing", &log);
        failing.lock().unwrap().fail_times = 1;

        let mut registry = DirtyRegistry::new();
        registry.enroll(healthy);
        registry.enroll(failing.clone());

        let first = registry.reconcile_all().expect("first pass survives");
        assert_eq!(first.reconciled, 1);
        assert_eq!(first.retried, 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&(failing.clone() as DirtyHandle)));

        let second = registry.reconcile_all().expect("second pass succeeds");
        assert_eq!(second.reconciled, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn exhausted_retry_budget_is_fatal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = dirty_probe("failing", &log);
        failing.lock().unwrap().fail_times = u32::MAX;

        let mut registry = DirtyRegistry::with_retry_budget(3);
        registry.enroll(failing);

        registry.reconcile_all().expect("attempt 1 retries");
        registry.reconcile_all().expect("attempt 2 retries");
        let fatal = registry.reconcile_all();
        assert!(matches!(
            fatal,
            Err(StateError::RetryBudgetExhausted { attempts: 3, .. })
        ));
    }

    #[test]
    fn clean_object_reconciles_idempotently() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let probe = Probe::new("a", log.clone());
        let handle: Arc<Mutex<Probe>> = Arc::new(Mutex::new(probe));

        let mut registry = DirtyRegistry::new();
        registry.enroll(handle.clone());
        registry.reconcile_all().expect("pass succeeds");

        // The object was clean, so reconcile() was a no-op: no log entry.
        assert!(log.lock().unwrap().is_empty());
        assert!(registry.is_empty());
    }
}
