// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the shim's connector surface
//!
//! Connector-specific errors are mapped to these unified error types.
//! The interception layer never creates or rewrites them; it only
//! propagates whatever the wrapped handle returned.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all connector operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum EngineError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Query syntax error: {message}")]
    SyntaxError { message: String },

    #[error("Query execution error: {message}")]
    ExecutionError { message: String },

    #[error("No driver accepts URL: {url}")]
    DriverNotFound { url: String },

    #[error("{handle} is closed")]
    Closed { handle: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Feature not supported: {message}")]
    NotSupported { message: String },

    #[error("Transaction error: {message}")]
    TransactionError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl EngineError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Self::SyntaxError { message: msg.into() }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn driver_not_found(url: impl Into<String>) -> Self {
        Self::DriverNotFound { url: url.into() }
    }

    pub fn closed(handle: impl Into<String>) -> Self {
        Self::Closed { handle: handle.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported { message: msg.into() }
    }

    pub fn transaction_error(msg: impl Into<String>) -> Self {
        Self::TransactionError { message: msg.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError { message: msg.into() }
    }
}

/// Result type alias for connector operations
pub type EngineResult<T> = Result<T, EngineError>;
