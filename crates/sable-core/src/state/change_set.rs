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

//! Per-object staging of property changes.

use std::collections::HashMap;
use std::fmt;

/// A notification emitted by the dirty-state engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// A tracked property of an object changed value.
    PropertyChanged {
        /// The debug name of the mutated object.
        object: &'static str,
        /// The name of the property that changed.
        property: &'static str,
    },
    /// An object applied all of its staged changes.
    Reconciled {
        /// The debug name of the reconciled object.
        object: &'static str,
    },
}

/// Records which properties of one object changed since its last
/// reconciliation.
///
/// The captured values are kept only for membership tests and inspection
/// (reconcilers branch on *which* properties are staged; the authoritative
/// new value lives in the field itself). Staging the same property twice
/// before reconciliation keeps the latest capture, so the reconciler always
/// sees the final value. Distinct properties never overwrite each other.
#[derive(Debug)]
pub struct ChangeSet {
    object: &'static str,
    staged: HashMap<&'static str, String>,
    notifier: Option<flume::Sender<StateEvent>>,
}

impl ChangeSet {
    /// Creates a change set that stays silent: no notifications are emitted.
    ///
    /// Engine-owned objects use this form to avoid notification feedback
    /// loops when the engine itself is the mutator.
    pub fn new(object: &'static str) -> Self {
        Self {
            object,
            staged: HashMap::new(),
            notifier: None,
        }
    }

    /// Creates a change set that publishes [`StateEvent`]s through `notifier`.
    pub fn with_notifier(object: &'static str, notifier: flume::Sender<StateEvent>) -> Self {
        Self {
            object,
            staged: HashMap::new(),
            notifier: Some(notifier),
        }
    }

    /// The debug name of the object this change set belongs to.
    pub fn object(&self) -> &'static str {
        self.object
    }

    /// The guarded setter: assigns `value` to `field` and stages the change.
    ///
    /// Returns `false` without staging anything when the new value equals the
    /// old one (structural equality). Otherwise the field is assigned, the
    /// property is recorded as staged, and a
    /// [`StateEvent::PropertyChanged`] is published unless the set was
    /// created silent.
    pub fn stage<T>(&mut self, field: &mut T, value: T, property: &'static str) -> bool
    where
        T: PartialEq + fmt::Debug,
    {
        if *field == value {
            return false;
        }
        *field = value;
        self.staged.insert(property, format!("{:?}", *field));
        log::trace!("'{}' staged property '{}'", self.object, property);
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send(StateEvent::PropertyChanged {
                object: self.object,
                property,
            }) {
                log::error!("Failed to publish property change: {e}");
            }
        }
        true
    }

    /// Returns `true` if `property` has a staged change.
    pub fn contains(&self, property: &str) -> bool {
        self.staged.contains_key(property)
    }

    /// Returns the captured debug representation of a staged property, for
    /// inspection and logging.
    pub fn staged_value(&self, property: &str) -> Option<&str> {
        self.staged.get(property).map(String::as_str)
    }

    /// Returns `true` if no property changes are staged.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
    }

    /// The number of staged properties.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Returns `true` if the change set holds no staged properties.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Consumes all staged changes and publishes
    /// [`StateEvent::Reconciled`].
    ///
    /// Reconcilers call this after their type-specific side effects have
    /// succeeded; afterwards the object is clean again.
    pub fn finish(&mut self) {
        self.staged.clear();
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send(StateEvent::Reconciled {
                object: self.object,
            }) {
                log::error!("Failed to publish reconciled event: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Knob {
        level: u32,
        label: String,
        changes: ChangeSet,
    }

    impl Knob {
        fn new() -> Self {
            Self {
                level: 0,
                label: String::new(),
                changes: ChangeSet::new("knob"),
            }
        }
    }

    #[test]
    fn staging_an_equal_value_is_a_no_op() {
        let mut knob = Knob::new();
        let mut level = knob.level;
        assert!(!knob.changes.stage(&mut level, 0, "level"));
        assert!(knob.changes.is_clean());
    }

    #[test]
    fn staging_assigns_and_records_the_property() {
        let mut knob = Knob::new();
        assert!(knob.changes.stage(&mut knob.level, 3, "level"));
        assert_eq!(knob.level, 3);
        assert!(knob.changes.contains("level"));
        assert!(!knob.changes.is_clean());
    }

    #[test]
    fn restaging_the_same_property_keeps_the_final_value() {
        let mut knob = Knob::new();
        knob.changes.stage(&mut knob.level, 3, "level");
        knob.changes.stage(&mut knob.level, 7, "level");
        assert_eq!(knob.changes.len(), 1);
        assert_eq!(knob.changes.staged_value("level"), Some("7"));
        assert_eq!(knob.level, 7);
    }

    #[test]
    fn distinct_properties_do_not_overwrite_each_other() {
        let mut knob = Knob::new();
        knob.changes.stage(&mut knob.level, 3, "level");
        knob.changes
            .stage(&mut knob.label, "hi".to_string(), "label");
        assert_eq!(knob.changes.staged_value("level"), Some("3"));
        assert_eq!(knob.changes.len(), 2);
    }

    #[test]
    fn finish_clears_staged_changes() {
        let mut knob = Knob::new();
        knob.changes.stage(&mut knob.level, 3, "level");
        knob.changes.finish();
        assert!(knob.changes.is_clean());
        assert!(!knob.changes.contains("level"));
    }

    #[test]
    fn notifier_receives_change_and_reconcile_events() {
        let (tx, rx) = flume::unbounded();
        let mut changes = ChangeSet::with_notifier("knob", tx);
        let mut level = 0u32;

        changes.stage(&mut level, 5, "level");
        changes.finish();

        let events: Vec<StateEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                StateEvent::PropertyChanged {
                    object: "knob",
                    property: "level"
                },
                StateEvent::Reconciled { object: "knob" },
            ]
        );
    }

    #[test]
    fn silent_change_set_emits_nothing() {
        let mut changes = ChangeSet::new("knob");
        let mut level = 0u32;
        changes.stage(&mut level, 5, "level");
        changes.finish();
        // No notifier was wired; nothing observable beyond the staged state.
        assert!(changes.is_clean());
    }
}
