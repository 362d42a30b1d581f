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

//! Defines the hierarchy of error types for the rendering subsystem.

use std::fmt;

/// A programming error in screen or effect setup.
///
/// Configuration errors are fatal for the current frame and are never
/// retried: they indicate a mistake in how the screen was assembled, not a
/// transient condition.
#[derive(Debug)]
pub enum ConfigError {
    /// An effect reached the dispatcher without owning a single material.
    EffectWithoutMaterials {
        /// The name of the offending effect.
        effect: String,
    },
    /// Two post-process nodes were registered under the same ordering key.
    DuplicatePostEffectKey {
        /// The contested key.
        key: i32,
    },
    /// A mesh's material selection did not resolve against its effect.
    MaterialNotFound {
        /// The name of the effect searched.
        effect: String,
        /// A description of the failed selection.
        selection: String,
    },
    /// A non-final post-process node has no intermediate output target.
    MissingIntermediateTarget {
        /// The name of the offending node.
        effect: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EffectWithoutMaterials { effect } => {
                write!(f, "Effect '{effect}' owns no materials")
            }
            ConfigError::DuplicatePostEffectKey { key } => {
                write!(f, "Post-process ordering key {key} is already taken")
            }
            ConfigError::MaterialNotFound { effect, selection } => {
                write!(
                    f,
                    "Material selection {selection} did not resolve in effect '{effect}'"
                )
            }
            ConfigError::MissingIntermediateTarget { effect } => {
                write!(
                    f,
                    "Post-process node '{effect}' is not final but has no intermediate target"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A high-level error that can occur within the rendering system or its
/// graphics backend.
#[derive(Debug)]
pub enum RenderError {
    /// An operation was attempted before the rendering system was
    /// initialized.
    NotInitialized,
    /// Creating the graphics device or swap chain failed at startup. Fatal
    /// to the whole process.
    DeviceCreation(String),
    /// Failed to acquire the next frame from the swapchain for rendering.
    SurfaceAcquisition(String),
    /// A screen was mis-assembled; see [`ConfigError`].
    Configuration(ConfigError),
    /// The render-target resize protocol failed partway. The renderer is in
    /// an inconsistent state; the error is logged and rethrown, never
    /// swallowed.
    TargetLifecycle(String),
    /// An error originating from the specific graphics backend.
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotInitialized => {
                write!(f, "The rendering system is not initialized.")
            }
            RenderError::DeviceCreation(msg) => {
                write!(f, "Failed to create the graphics device: {msg}")
            }
            RenderError::SurfaceAcquisition(msg) => {
                write!(f, "Failed to acquire surface for rendering: {msg}")
            }
            RenderError::Configuration(err) => {
                write!(f, "Rendering configuration error: {err}")
            }
            RenderError::TargetLifecycle(msg) => {
                write!(f, "Render-target lifecycle failure: {msg}")
            }
            RenderError::Backend(msg) => {
                write!(f, "Backend-specific error: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Configuration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for RenderError {
    fn from(err: ConfigError) -> Self {
        RenderError::Configuration(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let err = ConfigError::EffectWithoutMaterials {
            effect: "bloom".to_string(),
        };
        assert_eq!(format!("{err}"), "Effect 'bloom' owns no materials");

        let dup = ConfigError::DuplicatePostEffectKey { key: 3 };
        assert_eq!(
            format!("{dup}"),
            "Post-process ordering key 3 is already taken"
        );
    }

    #[test]
    fn render_error_wraps_config_error_with_source() {
        let err: RenderError = ConfigError::EffectWithoutMaterials {
            effect: "bloom".to_string(),
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Rendering configuration error: Effect 'bloom' owns no materials"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn device_creation_display_carries_driver_details() {
        let err = RenderError::DeviceCreation("no suitable adapter".to_string());
        assert_eq!(
            format!("{err}"),
            "Failed to create the graphics device: no suitable adapter"
        );
    }
}
