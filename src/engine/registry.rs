// SPDX-License-Identifier: Apache-2.0

//! Driver Registry
//!
//! Holds the available connectors and routes a URL to the first one that
//! accepts it, in registration order.

use std::sync::Arc;

use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::{Connector, Session};
use crate::engine::types::ConnectionProperties;

/// Registry that holds all available connectors
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn Connector>>,
}

impl DriverRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Registers a connector
    ///
    /// The connector's `driver_id()` is used as the key; registering the
    /// same id again replaces the earlier connector in place.
    pub fn register(&mut self, driver: Arc<dyn Connector>) {
        let id = driver.driver_id();
        match self.drivers.iter_mut().find(|d| d.driver_id() == id) {
            Some(slot) => *slot = driver,
            None => self.drivers.push(driver),
        }
    }

    /// Gets a connector by its ID
    pub fn get(&self, driver_id: &str) -> Option<Arc<dyn Connector>> {
        self.drivers
            .iter()
            .find(|d| d.driver_id() == driver_id)
            .cloned()
    }

    /// Lists all registered connector IDs in registration order
    pub fn list(&self) -> Vec<&str> {
        self.drivers.iter().map(|d| d.driver_id()).collect()
    }

    /// Opens a session with the first connector that accepts `url`.
    ///
    /// A connector that accepts the URL but declines to connect is skipped.
    pub async fn connect(
        &self,
        url: &str,
        props: &ConnectionProperties,
    ) -> EngineResult<Box<dyn Session>> {
        for driver in self.drivers.iter().filter(|d| d.accepts_url(url)) {
            if let Some(session) = driver.connect(url, props).await? {
                debug!(driver = driver.driver_id(), "Session opened");
                return Ok(session);
            }
        }
        Err(EngineError::driver_not_found(url))
    }

    /// Returns the number of registered connectors
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Returns true if no connectors are registered
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
