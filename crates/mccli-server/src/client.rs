//! Blocking client for the control socket.
//!
//! Used by tooling and tests to talk to a running server. One
//! [`ControlClient`] holds one connection; requests on it are answered in
//! order.

use std::io::{self, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use camino::Utf8PathBuf;
use thiserror::Error;

use mccli_config::EndpointAddress;

use crate::codec::CodecError;
use crate::message::{Message, Response};

/// Default read and write timeout applied to new connections.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised by [`ControlClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The socket could not be reached.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        /// Socket path that was dialled.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Socket timeouts could not be applied.
    #[error("failed to configure connection: {0}")]
    Configure(#[source] io::Error),
    /// A frame could not be written or read.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Connection to a control server.
#[derive(Debug)]
pub struct ControlClient {
    stream: UnixStream,
}

impl ControlClient {
    /// Connects to `endpoint` with [`CONNECTION_TIMEOUT`] on reads and writes.
    pub fn connect(endpoint: &EndpointAddress) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(endpoint.path().as_std_path()).map_err(|source| {
            ClientError::Connect {
                path: endpoint.path().to_path_buf(),
                source,
            }
        })?;
        let client = Self { stream };
        client.set_timeout(Some(CONNECTION_TIMEOUT))?;
        Ok(client)
    }

    /// Replaces the read and write timeout. `None` blocks indefinitely.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.stream
            .set_read_timeout(timeout)
            .and_then(|()| self.stream.set_write_timeout(timeout))
            .map_err(ClientError::Configure)
    }

    /// Sends one request and waits for its response.
    pub fn request<I, S>(&mut self, parts: I) -> Result<Response, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(&Message::new(parts))
    }

    /// Sends an already built message and waits for its response.
    pub fn send(&mut self, message: &Message) -> Result<Response, ClientError> {
        let bytes = message.encode()?;
        self.stream.write_all(&bytes).map_err(CodecError::from)?;
        self.stream.flush().map_err(CodecError::from)?;
        Ok(Response::read_from(&mut self.stream)?)
    }

    /// Writes raw bytes without waiting for a reply.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(bytes).map_err(CodecError::from)?;
        Ok(())
    }
}
