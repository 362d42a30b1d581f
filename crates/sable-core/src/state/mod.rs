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

//! The dirty-property state engine.
//!
//! Mutable graphics objects (cameras, dispatch topology, render settings)
//! stage property changes through a [`ChangeSet`], are enrolled into the
//! engine-owned [`DirtyRegistry`], and are revisited exactly once per frame
//! tick by a type-specific [`Reconcile`] implementation that applies the
//! staged changes to the underlying GPU/engine resources.
//!
//! Two deliberate departures from a classic dirty-flag design:
//!
//! - There is no process-wide registry. The [`DirtyRegistry`] is a plain
//!   value owned by the frame loop and handed to components by reference.
//! - Staging and enrollment are separate steps. A setter only records the
//!   change locally; the caller enrolls the object afterwards, which keeps
//!   the registry side effect visible at every call site.

pub mod change_set;
pub mod error;
pub mod registry;

pub use change_set::{ChangeSet, StateEvent};
pub use error::StateError;
pub use registry::{DirtyHandle, DirtyRegistry, Reconcile, ReconcileReport};
