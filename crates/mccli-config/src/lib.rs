//! Shared configuration for the mc-cli control channel.
//!
//! The control socket lives at `<runtime-dir>/mc-cli-ipc-<pid>.sock`. External
//! tooling derives the same path from the pid of the client it wants to talk
//! to, so the naming rules in [`EndpointAddress`] are part of the public
//! contract. Logging settings are shared by every binary in the workspace.

mod defaults;
mod endpoint;
mod logging;

use std::ffi::OsString;
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, RUNTIME_DIR_ENV, SOCKET_PREFIX, default_log_filter_string,
    default_log_format, default_runtime_dir,
};
pub use endpoint::{EndpointAddress, EndpointError};
pub use logging::LogFormat;

/// Runtime configuration shared by the control server binaries.
///
/// Values come from command-line flags, then `MCCLI_*` environment variables,
/// then the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Parser, Deserialize, Serialize)]
#[command(
    name = "mccli-headless",
    version,
    about = "Serve the mc-cli control channel for a headless client"
)]
pub struct Config {
    /// Tracing filter directive, e.g. `info` or `mccli_server=debug`.
    #[arg(long, env = "MCCLI_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[arg(long, env = "MCCLI_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Directory for the control socket instead of the runtime directory.
    #[arg(long, env = "MCCLI_RUNTIME_DIR")]
    #[serde(default)]
    pub runtime_dir: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            runtime_dir: None,
        }
    }
}

impl Config {
    /// Parses configuration from the process arguments and environment.
    pub fn load() -> Result<Self, clap::Error> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Parses configuration from an explicit argument list.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Tracing filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Directory that will hold the control socket.
    #[must_use]
    pub fn runtime_dir(&self) -> Utf8PathBuf {
        self.runtime_dir.clone().unwrap_or_else(default_runtime_dir)
    }

    /// Control socket address for the current process.
    #[must_use]
    pub fn endpoint(&self) -> EndpointAddress {
        let runtime_dir = self.runtime_dir();
        EndpointAddress::for_process(&runtime_dir, process::id())
    }
}
