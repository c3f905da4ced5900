//! Fallback values shared by configuration and endpoint derivation.

use std::env;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Environment variable naming the per-user runtime directory.
pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";

/// File name prefix shared with external tooling that locates the socket.
pub const SOCKET_PREFIX: &str = "mc-cli-ipc";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Directory that holds the control socket when no override is configured.
///
/// Uses `$XDG_RUNTIME_DIR` when it is set to a non-empty UTF-8 value and the
/// system temporary directory otherwise.
#[must_use]
pub fn default_runtime_dir() -> Utf8PathBuf {
    runtime_base_directory().unwrap_or_else(fallback_base_directory)
}

fn runtime_base_directory() -> Option<Utf8PathBuf> {
    env::var(RUNTIME_DIR_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .map(Utf8PathBuf::from)
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_filter_matches_constant() {
        assert_eq!(default_log_filter_string(), DEFAULT_LOG_FILTER);
        assert_eq!(default_log_format(), LogFormat::Compact);
    }

    #[test]
    fn runtime_dir_is_never_empty() {
        assert!(!default_runtime_dir().as_str().is_empty());
    }
}
