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

//! The windowing contract consumed by the renderer and the frame loop.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

/// Combines the windowing handle traits required by graphics backends into a
/// single trait, so it can be used as a trait object.
pub trait WindowHandle: HasWindowHandle + HasDisplayHandle {}

impl<T: HasWindowHandle + HasDisplayHandle> WindowHandle for T {}

/// A thread-safe, reference-counted handle to a native window, suitable for
/// surface creation on any backend.
pub type SableWindowHandle = Arc<dyn WindowHandle + Send + Sync>;

/// Abstracts the behavior of a window.
///
/// The engine core only reads the client-area size and asks for redraws; the
/// resize and focus notifications themselves arrive through the windowing
/// backend's event loop in `sable-runtime`.
pub trait EngineWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Returns the physical dimensions (width, height) of the window's inner
    /// area.
    fn inner_size(&self) -> (u32, u32);

    /// Returns the scale factor of the window.
    fn scale_factor(&self) -> f64;

    /// Requests that the window be redrawn.
    fn request_redraw(&self);

    /// Clones an `Arc`'d, thread-safe handle to the window, needed by the
    /// renderer to create a surface.
    fn clone_handle_arc(&self) -> SableWindowHandle;

    /// Returns a stable, unique identifier for the window.
    fn id(&self) -> u64;
}
