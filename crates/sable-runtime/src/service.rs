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

//! Engine services updated ahead of game logic every tick.

/// A long-lived engine subsystem updated once per tick, before input
/// resolution and screen logic.
pub trait Service: Send {
    /// A stable name for logs.
    fn name(&self) -> &str;

    /// Advances the service by `dt` seconds.
    fn update(&mut self, dt: f32);
}

/// An ordered collection of services. Update order is registration order.
#[derive(Default)]
pub struct ServiceSet {
    services: Vec<Box<dyn Service>>,
}

impl ServiceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a service. Services update in registration order.
    pub fn register(&mut self, service: Box<dyn Service>) {
        log::debug!("Registered service '{}'", service.name());
        self.services.push(service);
    }

    /// Updates every service in order.
    pub fn update_all(&mut self, dt: f32) {
        for service in &mut self.services {
            service.update(dt);
        }
    }

    /// The number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Service for Recorder {
        fn name(&self) -> &str {
            self.name
        }
        fn update(&mut self, _dt: f32) {
            self.log.lock().unwrap().push(self.name);
        }
    }

    #[test]
    fn services_update_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut services = ServiceSet::new();
        for name in ["audio", "telemetry", "scripting"] {
            services.register(Box::new(Recorder {
                name,
                log: Arc::clone(&log),
            }));
        }

        services.update_all(0.016);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["audio", "telemetry", "scripting"]
        );
    }
}
