// SPDX-License-Identifier: Apache-2.0

//! Escape driver
//!
//! A [`Connector`] that fronts a real connector. It claims URLs under its own
//! prefix, applies the shim's logging parameters, rewrites the URL to the
//! real connector's form and hands back a session wrapped by the
//! interceptor.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LogSettings;
use crate::engine::connection_url::{strip_driver_params, to_native_url};
use crate::engine::drivers::sqlite::{SqliteConnector, URL_PREFIX as SQLITE_URL_PREFIX};
use crate::engine::error::EngineResult;
use crate::engine::traits::{Connector, Session};
use crate::engine::types::ConnectionProperties;
use crate::escape::Translator;
use crate::interceptor::wrap_session_with;
use crate::observability;

/// URL prefix pair: the one the shim answers to and the one the wrapped
/// connector expects in its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPrefix {
    pub driver: String,
    pub native: String,
}

impl DriverPrefix {
    pub fn new(driver: impl Into<String>, native: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            native: native.into(),
        }
    }

    /// `sqlshim:sqlite:` in front of SQLx SQLite URLs
    pub fn sqlite() -> Self {
        Self::new("sqlshim:sqlite:", SQLITE_URL_PREFIX)
    }
}

pub struct EscapeDriver {
    inner: Arc<dyn Connector>,
    prefix: DriverPrefix,
    translator: Arc<Translator>,
}

impl EscapeDriver {
    pub fn new(inner: Arc<dyn Connector>, prefix: DriverPrefix) -> Self {
        Self {
            inner,
            prefix,
            translator: Arc::new(Translator::default()),
        }
    }

    /// Escape driver over the bundled SQLite connector
    pub fn sqlite() -> Self {
        Self::new(Arc::new(SqliteConnector::new()), DriverPrefix::sqlite())
    }

    /// Uses `translator` for every session opened from now on
    pub fn with_translator(mut self, translator: Arc<Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn prefix(&self) -> &DriverPrefix {
        &self.prefix
    }
}

#[async_trait]
impl Connector for EscapeDriver {
    fn driver_id(&self) -> &'static str {
        "sqlshim"
    }

    fn driver_name(&self) -> &'static str {
        "SQL escape shim"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with(&self.prefix.driver) || url.starts_with(&self.prefix.native)
    }

    async fn connect(
        &self,
        url: &str,
        props: &ConnectionProperties,
    ) -> EngineResult<Option<Box<dyn Session>>> {
        if !self.accepts_url(url) {
            return Ok(None);
        }

        observability::apply(&LogSettings::resolve(url, props));

        let native_url = to_native_url(
            &strip_driver_params(url),
            &self.prefix.driver,
            &self.prefix.native,
        );
        debug!(driver = self.inner.driver_id(), "Connecting through escape driver");

        let session = self.inner.connect(&native_url, props).await?;
        Ok(session.map(|session| wrap_session_with(session, self.translator.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::EngineError;
    use parking_lot::Mutex;

    /// Records the URL it was asked to open and never opens anything
    #[derive(Default)]
    struct UrlCapture {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Connector for UrlCapture {
        fn driver_id(&self) -> &'static str {
            "capture"
        }

        fn driver_name(&self) -> &'static str {
            "URL capture"
        }

        fn accepts_url(&self, url: &str) -> bool {
            url.starts_with("native:")
        }

        async fn connect(
            &self,
            url: &str,
            _props: &ConnectionProperties,
        ) -> EngineResult<Option<Box<dyn Session>>> {
            self.seen.lock().push(url.to_string());
            if url.contains("fail") {
                return Err(EngineError::connection_failed("refused"));
            }
            Ok(None)
        }
    }

    #[test]
    fn test_accepts_driver_and_native_prefixes() {
        let driver = EscapeDriver::sqlite();
        assert!(driver.accepts_url("sqlshim:sqlite::memory:"));
        assert!(driver.accepts_url("sqlshim:sqlite:data/app.db"));
        assert!(driver.accepts_url("sqlite::memory:"));
    }

    #[test]
    fn test_rejects_other_prefixes() {
        let driver = EscapeDriver::sqlite();
        assert!(!driver.accepts_url("postgres://localhost:5432/"));
        assert!(!driver.accepts_url("sqlshim:postgres://localhost/"));
        assert!(!driver.accepts_url(""));
    }

    #[tokio::test]
    async fn test_unaccepted_url_returns_none() {
        let driver = EscapeDriver::sqlite();
        let session = driver
            .connect("mysql://localhost:3306/", &ConnectionProperties::new())
            .await
            .unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn test_url_is_stripped_and_rewritten() {
        let capture = Arc::new(UrlCapture::default());
        let driver = EscapeDriver::new(capture.clone(), DriverPrefix::new("shim:", "native:"));

        let session = driver
            .connect("shim:db?mode=ro&logLevel=&logFile=", &ConnectionProperties::new())
            .await
            .unwrap();
        assert!(session.is_none());

        driver
            .connect("native:other", &ConnectionProperties::new())
            .await
            .unwrap();

        assert_eq!(
            *capture.seen.lock(),
            vec!["native:db?mode=ro".to_string(), "native:other".to_string()]
        );
    }

    #[tokio::test]
    async fn test_inner_errors_propagate() {
        let driver = EscapeDriver::new(
            Arc::new(UrlCapture::default()),
            DriverPrefix::new("shim:", "native:"),
        );
        let result = driver.connect("shim:fail", &ConnectionProperties::new()).await;
        assert!(matches!(result, Err(EngineError::ConnectionFailed { .. })));
    }

    #[tokio::test]
    async fn test_sqlite_session_is_wrapped() {
        let driver = EscapeDriver::sqlite();
        let session = driver
            .connect("sqlshim:sqlite::memory:", &ConnectionProperties::new())
            .await
            .unwrap()
            .unwrap();

        let stmt = session.create_statement().await.unwrap();
        let result = stmt
            .execute_query("SELECT {fn UPPER('shim')} AS v")
            .await
            .unwrap();
        assert_eq!(result.rows[0].values[0].as_text(), Some("SHIM"));
        session.close().await.unwrap();
    }
}
