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

//! # Sable Core
//!
//! Foundational crate containing traits, core types, and interface contracts
//! that define the engine's architecture: the dirty-state engine, the render
//! dispatch logic, the render-target lifecycle, and the backend-agnostic
//! rendering seams implemented by `sable-infra`.

#![warn(missing_docs)]

pub mod event;
pub mod math;
pub mod platform;
pub mod render;
pub mod scene;
pub mod state;
pub mod utils;

pub use utils::timer::Stopwatch;
