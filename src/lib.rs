// SPDX-License-Identifier: Apache-2.0

// sqlshim - escape-sequence translation between applications and SQL engines
// Core library

pub mod config;
pub mod driver;
pub mod engine;
pub mod escape;
pub mod interceptor;
pub mod observability;

pub use config::{LogLevel, LogSettings};
pub use driver::{DriverPrefix, EscapeDriver};
pub use engine::{
    Connector, DriverRegistry, EngineError, EngineResult, PreparedStatement, Session, Statement,
};
pub use escape::{translate, translate_opt, Translator};
pub use interceptor::{wrap_session, wrap_session_with};
