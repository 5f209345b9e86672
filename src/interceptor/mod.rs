// SPDX-License-Identifier: Apache-2.0

//! Escape Interceptor
//!
//! Decorators over the connector traits that translate escape sequences in
//! query text before it reaches the real handle:
//! - **Hook table**: which operation of which handle role carries text to translate
//! - **Session**: translates `prepare_statement` and wraps every statement it returns
//! - **Statements**: translate the text-taking execution calls
//!
//! Wrapped handles forward inline inside the caller's future and never hand
//! out the handle they wrap.

pub mod hooks;
pub mod session;
pub mod statement;

#[cfg(test)]
mod mock;

use std::sync::Arc;

use crate::engine::traits::Session;
use crate::escape::Translator;

pub use hooks::{rewrite, rewrite_with, Operation, Role};
pub use session::EscapingSession;
pub use statement::{EscapingPreparedStatement, EscapingStatement};

/// Wraps a session so escape sequences are translated with the default translator
pub fn wrap_session(session: Box<dyn Session>) -> Box<dyn Session> {
    wrap_session_with(session, Arc::new(Translator::default()))
}

/// Wraps a session with a specific translator
pub fn wrap_session_with(session: Box<dyn Session>, translator: Arc<Translator>) -> Box<dyn Session> {
    Box::new(EscapingSession::new(session, translator))
}
