//! Error types for socket listener operations.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use mccli_config::EndpointError;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// A leftover file at the socket path could not be removed.
    #[error("failed to clear stale socket: {0}")]
    StaleSocket(#[from] EndpointError),
    /// The socket could not be bound.
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        /// Socket path that was requested.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener could not be switched to non-blocking accepts.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be spawned.
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked before it could be joined.
    #[error("listener thread panicked")]
    ThreadPanic,
}
