//! Lifecycle of the control server.
//!
//! A [`ControlServer`] moves through `Unbound → Listening → Stopping →
//! Stopped`. Starting binds the endpoint and spawns the accept thread;
//! stopping raises the shared shutdown flag, joins that thread and removes
//! the socket file. Dropping a running server stops it.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use tracing::{info, warn};

use mccli_config::{EndpointAddress, EndpointError};

use crate::bridge::{Bridge, TaskSender};
use crate::commands::CommandTable;
use crate::transport::{DispatchConnectionHandler, ListenerError, ListenerHandle, SocketListener};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Observable lifecycle state of a [`ControlServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Created but never started.
    Unbound,
    /// Accepting connections on the endpoint.
    Listening,
    /// Shutting down, or the accept thread exited on its own.
    Stopping,
    /// Fully stopped; the endpoint file has been removed.
    Stopped,
}

/// Errors reported by lifecycle operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start` was called on a server that is already listening.
    #[error("control server is already running")]
    AlreadyRunning,
    /// `start` was called after the server stopped.
    #[error("control server has been stopped and cannot be restarted")]
    AlreadyStopped,
    /// Binding or running the socket listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The socket file could not be removed.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Local control server for one client process.
pub struct ControlServer<A> {
    endpoint: EndpointAddress,
    commands: CommandTable<A>,
    shutdown: Arc<AtomicBool>,
    state: ServerState,
    listener: Option<ListenerHandle>,
}

impl<A> ControlServer<A> {
    /// Creates an unbound server that will serve `commands` on `endpoint`.
    #[must_use]
    pub fn new(endpoint: EndpointAddress, commands: CommandTable<A>) -> Self {
        Self {
            endpoint,
            commands,
            shutdown: Arc::new(AtomicBool::new(false)),
            state: ServerState::Unbound,
            listener: None,
        }
    }

    /// Address the server binds to.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointAddress {
        &self.endpoint
    }

    /// Reports whether shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    ///
    /// A server whose accept thread died on an unrecoverable error reports
    /// [`ServerState::Stopping`] until [`stop`](Self::stop) is called.
    #[must_use]
    pub fn state(&self) -> ServerState {
        match (&self.state, &self.listener) {
            (ServerState::Listening, Some(handle)) if handle.is_finished() => {
                ServerState::Stopping
            }
            (state, _) => *state,
        }
    }

    /// Stops the server and waits for the accept thread to exit.
    ///
    /// Idempotent: stopping an unbound or stopped server does nothing. The
    /// socket file is gone when this returns, even if joining failed.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        let Some(handle) = self.listener.take() else {
            return Ok(());
        };
        self.state = ServerState::Stopping;
        info!(
            target: SERVER_TARGET,
            endpoint = %self.endpoint,
            "stopping control server"
        );
        handle.shutdown();
        let joined = handle.join();
        let removed = self.endpoint.remove_file();
        self.state = ServerState::Stopped;
        joined?;
        removed?;
        info!(target: SERVER_TARGET, "control server stopped");
        Ok(())
    }
}

impl<A: 'static> ControlServer<A> {
    /// Binds the endpoint and starts accepting connections.
    ///
    /// `executor` receives the work that commands hand to the client's owner
    /// thread; that thread must keep draining its
    /// [`TaskQueue`](crate::TaskQueue) while the server runs. On failure the
    /// server stays [`ServerState::Unbound`].
    pub fn start(&mut self, executor: TaskSender<A>) -> Result<(), ServerError> {
        match self.state {
            ServerState::Unbound => {}
            ServerState::Listening | ServerState::Stopping => {
                return Err(ServerError::AlreadyRunning);
            }
            ServerState::Stopped => return Err(ServerError::AlreadyStopped),
        }

        let listener = SocketListener::bind(&self.endpoint)?;
        let bridge = Bridge::new(executor, Arc::clone(&self.shutdown));
        let handler = Arc::new(DispatchConnectionHandler::new(self.commands.clone(), bridge));
        let handle = listener.start(handler, Arc::clone(&self.shutdown))?;

        self.listener = Some(handle);
        self.state = ServerState::Listening;
        info!(
            target: SERVER_TARGET,
            endpoint = %self.endpoint,
            commands = self.commands.names().count(),
            "control server started"
        );
        Ok(())
    }
}

impl<A> Drop for ControlServer<A> {
    fn drop(&mut self) {
        if self.listener.is_none() {
            return;
        }
        if let Err(error) = self.stop() {
            warn!(
                target: SERVER_TARGET,
                %error,
                "control server did not stop cleanly"
            );
        }
    }
}
