// SPDX-License-Identifier: Apache-2.0

// Connector surface
// Engine-neutral traits and types shared by real connectors and the shim

pub mod connection_url;
pub mod drivers;
pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{EngineError, EngineResult};
pub use registry::DriverRegistry;
pub use traits::{Connector, PreparedStatement, Session, Statement};
pub use types::*;
