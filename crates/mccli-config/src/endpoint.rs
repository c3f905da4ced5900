use std::fmt;
use std::fs;
use std::io;
use std::process;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::defaults::{SOCKET_PREFIX, default_runtime_dir};

/// Filesystem address of the control socket for one running process.
///
/// The path embeds the process id so that several clients can run side by
/// side and external tooling can locate a specific instance from its pid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAddress {
    path: Utf8PathBuf,
}

impl EndpointAddress {
    /// Address for the current process inside the default runtime directory.
    #[must_use]
    pub fn for_current_process() -> Self {
        Self::for_process(&default_runtime_dir(), process::id())
    }

    /// Address for `pid` inside `runtime_dir`.
    #[must_use]
    pub fn for_process(runtime_dir: &Utf8Path, pid: u32) -> Self {
        Self {
            path: runtime_dir.join(format!("{SOCKET_PREFIX}-{pid}.sock")),
        }
    }

    /// Wraps an explicit socket path.
    #[must_use]
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Socket path on disk.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_ref()
    }

    /// Reports whether a file currently occupies the address.
    #[must_use]
    pub fn is_present(&self) -> bool {
        fs::symlink_metadata(self.path.as_std_path()).is_ok()
    }

    /// Deletes whatever file occupies the address.
    ///
    /// Returns `Ok(true)` when a file was removed and `Ok(false)` when the
    /// address was already free.
    pub fn remove_file(&self) -> Result<bool, EndpointError> {
        match fs::remove_file(self.path.as_std_path()) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(EndpointError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "unix://{}", self.path)
    }
}

/// Errors raised while managing the socket file.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The file at the socket path could not be deleted.
    #[error("failed to remove socket file '{path}': {source}")]
    Remove {
        /// Socket path that could not be cleared.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
