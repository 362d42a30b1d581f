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

//! # Sable Runtime
//!
//! The engine loop. [`Engine::run`] initializes the window and renderer,
//! loads the application's content, and drives the per-tick sequence:
//! services → input resolution → screen logic → registry reconciliation →
//! render, pausing whenever the window loses input focus.

use anyhow::Result;
use sable_core::platform::input::InputSnapshot;
use sable_core::render::{
    DispatchState, RenderError, RenderSettings, RenderSystem,
};
use sable_core::scene::{Camera, Screen};
use sable_core::state::{DirtyRegistry, StateError, StateEvent};
use sable_core::event::EventBus;
use sable_infra::platform::input::translate_winit_input;
use sable_infra::platform::window::{WinitWindow, WinitWindowBuilder};
use sable_infra::{WgpuDevice, WgpuRenderSystem};
use std::sync::{Arc, Mutex};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

pub mod clock;
pub mod config;
pub mod phase;
pub mod service;

pub use clock::FrameClock;
pub use config::EngineConfig;
pub use phase::EnginePhase;
pub use service::{Service, ServiceSet};

/// What an application receives while loading its content.
pub struct EngineContext {
    /// The graphics device, for creating buffers, pipelines, and bind
    /// groups.
    pub device: Arc<WgpuDevice>,
    /// A sender for wiring stateful objects' change notifications into the
    /// engine's state-event stream.
    pub state_events: flume::Sender<StateEvent>,
}

/// What an application receives on every logic tick.
pub struct EngineTick<'a> {
    /// Seconds elapsed since the previous unpaused tick.
    pub dt: f32,
    /// The input resolved for this tick.
    pub input: &'a InputSnapshot,
    /// The dirty registry: enroll staged objects here so the end-of-update
    /// reconciliation pass picks them up.
    pub registry: &'a mut DirtyRegistry,
    /// The dirty-tracked render dispatch topology.
    pub dispatch_state: &'a Arc<Mutex<DispatchState>>,
    /// Set to `true` to request engine shutdown at the end of the tick.
    pub exit_requested: &'a mut bool,
}

/// The application contract the engine runs.
pub trait App: Sized + 'static {
    /// Called once after the renderer is initialized, to load content and
    /// build the active screen.
    fn create(context: &mut EngineContext) -> Result<Self>;

    /// Called every unpaused tick for game logic.
    fn update(&mut self, tick: &mut EngineTick);

    /// The active screen to render this frame.
    fn screen(&self) -> &Screen;

    /// The active camera. Shared so the engine can enroll it for
    /// reconciliation after logic mutates it.
    fn camera(&self) -> &Arc<Mutex<Camera>>;
}

/// The internal state of the running engine, managed by the winit event
/// loop. Holds the user's application state.
struct EngineState<A: App> {
    app: Option<A>,
    window: Option<WinitWindow>,
    renderer: Option<Box<dyn RenderSystem>>,
    config: EngineConfig,
    settings: RenderSettings,
    services: ServiceSet,
    registry: DirtyRegistry,
    state_events: EventBus<StateEvent>,
    phase: EnginePhase,
    clock: FrameClock,
    pending_input: InputSnapshot,
    fatal_error: Option<anyhow::Error>,
}

impl<A: App> EngineState<A> {
    fn new(config: EngineConfig, services: ServiceSet) -> Self {
        let settings = config.render_settings();
        let registry = DirtyRegistry::with_retry_budget(config.reconcile_retry_budget);
        Self {
            app: None,
            window: None,
            renderer: None,
            config,
            settings,
            services,
            registry,
            state_events: EventBus::new(),
            phase: EnginePhase::Starting,
            clock: FrameClock::new(),
            pending_input: InputSnapshot::new(),
            fatal_error: None,
        }
    }

    /// Records a fatal error and stops the event loop; the error is
    /// rethrown from [`Engine::run_with`] once the loop unwinds.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        if self.fatal_error.is_none() {
            self.fatal_error = Some(error);
        }
        event_loop.exit();
    }

    /// One engine tick: the full Update fan-out, then Render.
    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        if !self.phase.is_running() {
            return;
        }
        let (Some(app), Some(renderer)) = (self.app.as_mut(), self.renderer.as_mut()) else {
            return;
        };

        let dt = self.clock.tick();

        // 1. Engine services.
        self.services.update_all(dt);

        // 2. Input resolution for the active screen.
        let input = self.pending_input.take();

        // 3. The active screen's logic.
        let dispatch_state = renderer.dispatch_state();
        let mut exit_requested = false;
        {
            let mut tick = EngineTick {
                dt,
                input: &input,
                registry: &mut self.registry,
                dispatch_state: &dispatch_state,
                exit_requested: &mut exit_requested,
            };
            app.update(&mut tick);
        }

        // The engine commits the objects it owns itself: a camera left
        // dirty by logic gets enrolled here.
        let camera = Arc::clone(app.camera());
        let camera_dirty = camera
            .lock()
            .map(|guard| !guard.changes().is_clean())
            .unwrap_or(false);
        if camera_dirty {
            self.registry.enroll(camera.clone());
        }

        // 4. The registry reconciliation pass.
        match self.registry.reconcile_all() {
            Ok(report) => {
                if report.reconciled > 0 || report.retried > 0 {
                    log::trace!(
                        "Reconciled {} object(s), {} retried",
                        report.reconciled,
                        report.retried
                    );
                }
            }
            Err(err @ StateError::RetryBudgetExhausted { .. }) => {
                log::error!("Reconciliation gave up: {err}");
                if self.fatal_error.is_none() {
                    self.fatal_error = Some(anyhow::Error::new(err));
                }
                event_loop.exit();
                return;
            }
            Err(err) => {
                log::error!("Reconciliation pass failed: {err}");
            }
        }
        for event in self.state_events.drain() {
            log::trace!("State event: {event:?}");
        }

        // 5. Render.
        let render_result = match camera.lock() {
            Ok(camera_guard) => renderer.render(app.screen(), &camera_guard, &self.settings),
            Err(_) => {
                log::error!("Camera lock poisoned; skipping frame.");
                return;
            }
        };
        match render_result {
            Ok(stats) => log::trace!("Frame {} rendered.", stats.frame_number),
            // Configuration faults are programming errors, resize failures
            // leave the targets inconsistent, device loss is unrecoverable:
            // none of these retry.
            Err(
                err @ (RenderError::Configuration(_)
                | RenderError::TargetLifecycle(_)
                | RenderError::DeviceCreation(_)),
            ) => {
                log::error!("Fatal rendering error: {err}");
                if self.fatal_error.is_none() {
                    self.fatal_error = Some(anyhow::Error::new(err));
                }
                event_loop.exit();
            }
            Err(err) => log::error!("Rendering error: {err}"),
        }

        if exit_requested {
            log::info!("Application requested shutdown.");
            event_loop.exit();
        }
    }
}

/// When `EngineState` goes out of scope (after the event loop exits), this
/// performs the controlled shutdown.
impl<A: App> Drop for EngineState<A> {
    fn drop(&mut self) {
        log::info!("EngineState is being dropped. Performing controlled shutdown...");
        self.registry.clear();
        if let Some(mut renderer) = self.renderer.take() {
            renderer.shutdown();
        }
        log::info!("Engine systems shutdown complete.");
    }
}

impl<A: App> ApplicationHandler for EngineState<A> {
    /// Initialize: create the window and renderer, then load content. This
    /// is the only place `Starting` transitions out of.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized; ignore repeated resumes.
        }

        log::info!("Application resumed. Initializing window and engine systems...");

        let window = WinitWindowBuilder::new()
            .with_title(self.config.window_title.clone())
            .with_dimensions(self.config.window_width, self.config.window_height)
            .build(event_loop)
            .expect("window creation failed");

        let mut renderer = WgpuRenderSystem::new(&self.settings);
        if let Err(err) = renderer.init(&window, &self.settings) {
            // Device-creation failures are fatal to the whole process.
            self.fail(
                event_loop,
                anyhow::Error::new(err).context("renderer initialization failed"),
            );
            return;
        }
        let device = renderer
            .device()
            .expect("device exists after successful init");

        // LoadContent: the application builds its screen and GPU resources.
        let mut context = EngineContext {
            device,
            state_events: self.state_events.sender(),
        };
        match A::create(&mut context) {
            Ok(app) => self.app = Some(app),
            Err(err) => {
                self.fail(event_loop, err.context("content loading failed"));
                return;
            }
        }

        self.window = Some(window);
        self.renderer = Some(Box::new(renderer));
        self.phase.resume();
        log::info!("Engine started.");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let event_window_id = {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            let mut hasher = DefaultHasher::new();
            id.hash(&mut hasher);
            hasher.finish()
        };
        if window.id() != event_window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Shutdown requested, exiting event loop...");
                event_loop.exit();
            }
            WindowEvent::Focused(false) => {
                if self.phase.pause() {
                    self.clock.pause();
                    log::info!("Window lost focus; engine paused.");
                }
            }
            WindowEvent::Focused(true) => {
                if self.phase.resume() {
                    self.clock.resume();
                    log::info!("Window focused; engine running.");
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    log::debug!("Window resized to {}x{}", size.width, size.height);
                    renderer.request_resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.tick(event_loop);
            }
            other => {
                if let Some(input_event) = translate_winit_input(&other) {
                    self.pending_input.push(input_event);
                }
            }
        }
    }

    /// Continuous rendering: ask for the next frame once the queue drains.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// The public entry point for the Sable Engine.
pub struct Engine;

impl Engine {
    /// Runs an application with default configuration and no services.
    pub fn run<A: App>() -> Result<()> {
        Self::run_with::<A>(EngineConfig::default(), ServiceSet::new())
    }

    /// Runs an application with the given configuration and services,
    /// blocking the current thread until the window closes or the
    /// application requests shutdown.
    pub fn run_with<A: App>(config: EngineConfig, services: ServiceSet) -> Result<()> {
        log::info!("Sable Engine starting...");
        let event_loop = EventLoop::new()?;
        let mut state = EngineState::<A>::new(config.sanitized(), services);
        event_loop.run_app(&mut state)?;
        match state.fatal_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
