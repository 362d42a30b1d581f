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

//! Backend-agnostic rendering contracts and the frame-scheduling core.
//!
//! This module defines the 'what' of rendering (the dispatch logic, the
//! render-target lifecycle, and the trait seams), while the 'how' is handled
//! by a concrete backend implementation in `sable-infra` (wgpu) or by the
//! in-tree [`software`] backend.

pub mod dispatch;
pub mod error;
pub mod handle;
pub mod settings;
pub mod software;
pub mod stats;
pub mod targets;
pub mod traits;

pub use self::dispatch::{
    partition_ranges, DispatchOutcome, DispatchState, FrameSurfaces, RenderDispatcher,
};
pub use self::error::{ConfigError, RenderError};
pub use self::handle::{
    BindGroupId, BitmapAliasId, BufferId, IndexFormat, RenderPipelineId, ShaderModuleId,
    TextureDescriptor, TextureFormat, TextureId, TextureViewId,
};
pub use self::settings::{RenderMode, RenderSettings, MAX_RENDER_WORKERS};
pub use self::stats::FrameStats;
pub use self::targets::{RenderTarget, TargetLifecycle, TargetObserver, TargetSet};
pub use self::traits::{
    CommandBuffer, CommandRecorder, ExecutionContexts, GraphicsDevice, RenderSystem,
};
