//! Per-connection request loop.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::codec::CodecError;
use crate::commands::CommandTable;
use crate::message::{Message, Response};

use super::LISTENER_TARGET;

/// Socket timeout used to notice shutdown while a peer sits idle or stops
/// draining its replies.
pub(crate) const IO_POLL: Duration = Duration::from_millis(100);

/// Accepted stream that gives up blocking IO once shutdown begins.
///
/// Read and write timeouts are retried transparently, so callers only ever
/// observe progress, end of stream, a real IO error, or `ConnectionAborted`
/// after the shutdown flag is raised.
pub(crate) struct ConnectionStream {
    stream: UnixStream,
    shutdown: Arc<AtomicBool>,
}

impl ConnectionStream {
    pub(crate) fn new(stream: UnixStream, shutdown: Arc<AtomicBool>) -> io::Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(IO_POLL))?;
        stream.set_write_timeout(Some(IO_POLL))?;
        Ok(Self { stream, shutdown })
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Repeats `op` across socket timeouts until it completes or shutdown
    /// begins.
    fn retry<T>(&mut self, mut op: impl FnMut(&mut UnixStream) -> io::Result<T>) -> io::Result<T> {
        loop {
            match op(&mut self.stream) {
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    if self.is_shutting_down() {
                        return Err(io::Error::new(
                            io::ErrorKind::ConnectionAborted,
                            "server is shutting down",
                        ));
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                other => return other,
            }
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.retry(|stream| stream.read(buf))
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.retry(|stream| stream.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves one connection to completion. Implementations should avoid
    /// panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Connection handler that decodes requests and dispatches them as commands.
///
/// Requests on one connection are served strictly in order: a message is
/// read completely, dispatched, and its response written before the next
/// read starts.
pub(crate) struct DispatchConnectionHandler<A> {
    commands: CommandTable<A>,
    bridge: Bridge<A>,
}

impl<A> DispatchConnectionHandler<A> {
    pub(crate) const fn new(commands: CommandTable<A>, bridge: Bridge<A>) -> Self {
        Self { commands, bridge }
    }
}

impl<A: 'static> ConnectionHandler for DispatchConnectionHandler<A> {
    fn handle(&self, mut stream: ConnectionStream) {
        debug!(target: LISTENER_TARGET, "client connected");
        loop {
            let message = match Message::read_from(&mut stream) {
                Ok(message) => message,
                Err(CodecError::PeerClosed) => {
                    debug!(target: LISTENER_TARGET, "client disconnected");
                    return;
                }
                Err(error) if stream.is_shutting_down() => {
                    debug!(
                        target: LISTENER_TARGET,
                        %error,
                        "closing connection for shutdown"
                    );
                    return;
                }
                Err(error) => {
                    warn!(
                        target: LISTENER_TARGET,
                        %error,
                        "malformed request, closing connection"
                    );
                    return;
                }
            };

            let response = self.commands.dispatch(&message, &self.bridge);
            if let Err(error) = write_response(&mut stream, &response) {
                if stream.is_shutting_down() {
                    debug!(
                        target: LISTENER_TARGET,
                        %error,
                        "dropping unsent response for shutdown"
                    );
                } else {
                    warn!(
                        target: LISTENER_TARGET,
                        %error,
                        "failed to write response"
                    );
                }
                return;
            }
        }
    }
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<(), CodecError> {
    let bytes = match response.encode() {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(
                target: LISTENER_TARGET,
                %error,
                "response could not be encoded"
            );
            Response::failure(error.to_string()).encode()?
        }
    };
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
