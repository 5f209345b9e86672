// SPDX-License-Identifier: Apache-2.0

//! Connection URL helpers
//!
//! Shim URLs look like `sqlshim:sqlite:path/to.db?logLevel=debug&mode=rwc`.
//! The query string can carry driver parameters meant for the shim itself;
//! those are read here and removed before the URL reaches the connector.

/// URL parameter selecting the log level
pub const PARAM_LOG_LEVEL: &str = "logLevel";

/// URL parameter selecting the log file
pub const PARAM_LOG_FILE: &str = "logFile";

const DRIVER_PARAMS: [&str; 2] = [PARAM_LOG_LEVEL, PARAM_LOG_FILE];

/// Splits a URL at its first `?`
fn split_query(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    }
}

/// Returns the value of the first query parameter named `key`.
///
/// Keys are compared case-insensitively after trimming. Values are trimmed
/// and percent-decoded; a value that does not decode to UTF-8 is returned raw.
pub fn param_from_url(url: &str, key: &str) -> Option<String> {
    let (_, query) = split_query(url);

    query?.split('&').find_map(|param| {
        let (name, value) = param.split_once('=')?;
        let name = name.trim();
        if name.is_empty() || !name.eq_ignore_ascii_case(key) {
            return None;
        }
        let value = value.trim();
        Some(percent_decode(value).unwrap_or_else(|_| value.to_string()))
    })
}

/// Removes the shim's own parameters from the query string.
///
/// Other parameters keep their order and original spelling. Empty segments
/// are dropped, and so is the `?` once nothing is left.
pub fn strip_driver_params(url: &str) -> String {
    let (base, query) = split_query(url);
    let Some(query) = query else {
        return url.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|param| {
            let name = param.split_once('=').map_or(*param, |(name, _)| name).trim();
            !name.is_empty() && !is_driver_param(name)
        })
        .collect();

    if kept.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, kept.join("&"))
    }
}

/// Swaps a leading `driver_prefix` for `native_prefix`.
///
/// URLs that do not start with `driver_prefix` are returned unchanged.
pub fn to_native_url(url: &str, driver_prefix: &str, native_prefix: &str) -> String {
    match url.strip_prefix(driver_prefix) {
        Some(rest) => format!("{native_prefix}{rest}"),
        None => url.to_string(),
    }
}

fn is_driver_param(name: &str) -> bool {
    DRIVER_PARAMS.iter().any(|p| p.eq_ignore_ascii_case(name))
}

fn percent_decode(s: &str) -> Result<String, std::str::Utf8Error> {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_without_query_is_unchanged() {
        let url = "sqlite:data/app.db";
        assert_eq!(strip_driver_params(url), url);
    }

    #[test]
    fn test_strip_log_level_only() {
        assert_eq!(
            strip_driver_params("sqlite:data/app.db?logLevel=FINE"),
            "sqlite:data/app.db"
        );
    }

    #[test]
    fn test_strip_log_file_with_backslashes() {
        assert_eq!(
            strip_driver_params(r"sqlite:data/app.db?logFile=C:\logs\driver.log"),
            "sqlite:data/app.db"
        );
    }

    #[test]
    fn test_strip_keeps_other_params_in_order() {
        assert_eq!(
            strip_driver_params(
                "sqlite:data/app.db?mode=rwc&logLevel=FINE&logFile=/tmp/d.log&cache=shared"
            ),
            "sqlite:data/app.db?mode=rwc&cache=shared"
        );
    }

    #[test]
    fn test_strip_all_driver_params_leaves_base() {
        assert_eq!(
            strip_driver_params("sqlshim:sqlite:demo.db?logLevel=INFO&logFile=/var/log/driver.log"),
            "sqlshim:sqlite:demo.db"
        );
    }

    #[test]
    fn test_strip_is_case_insensitive_and_drops_empty_segments() {
        assert_eq!(
            strip_driver_params("sqlite:a.db?LOGLEVEL=debug&&=x&mode=ro& logfile =x"),
            "sqlite:a.db?mode=ro"
        );
    }

    #[test]
    fn test_param_from_url() {
        assert_eq!(
            param_from_url("sqlite:a.db?logLevel=FINE", PARAM_LOG_LEVEL).as_deref(),
            Some("FINE")
        );
        assert_eq!(
            param_from_url("sqlite:a.db?logLevel=FINE&user=a", PARAM_LOG_LEVEL).as_deref(),
            Some("FINE")
        );
        assert_eq!(
            param_from_url("sqlite:a.db?loglevel= debug ", PARAM_LOG_LEVEL).as_deref(),
            Some("debug")
        );
    }

    #[test]
    fn test_param_from_url_decodes_value() {
        assert_eq!(
            param_from_url("sqlite:a.db?logFile=%2Ftmp%2Fshim%20log.txt", PARAM_LOG_FILE).as_deref(),
            Some("/tmp/shim log.txt")
        );
    }

    #[test]
    fn test_param_from_url_missing() {
        assert_eq!(param_from_url("sqlite:a.db", PARAM_LOG_LEVEL), None);
        assert_eq!(param_from_url("sqlite:a.db?user=test", PARAM_LOG_LEVEL), None);
        assert_eq!(param_from_url("sqlite:a.db?logLevel", PARAM_LOG_LEVEL), None);
    }

    #[test]
    fn test_param_from_url_first_match_wins() {
        assert_eq!(
            param_from_url("sqlite:a.db?logLevel=warn&logLevel=trace", PARAM_LOG_LEVEL).as_deref(),
            Some("warn")
        );
    }

    #[test]
    fn test_to_native_url() {
        assert_eq!(
            to_native_url("sqlshim:sqlite::memory:", "sqlshim:sqlite:", "sqlite:"),
            "sqlite::memory:"
        );
        assert_eq!(
            to_native_url("sqlite::memory:", "sqlshim:sqlite:", "sqlite:"),
            "sqlite::memory:"
        );
    }
}
