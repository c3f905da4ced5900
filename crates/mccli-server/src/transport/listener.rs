//! Accept loop for the control socket.

use std::io;
use std::os::unix::net::UnixListener;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use mccli_config::EndpointAddress;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ACCEPT_THREAD_NAME: &str = "mccli-accept";

/// Listener bound to the control socket path.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: EndpointAddress,
    listener: UnixListener,
}

impl SocketListener {
    /// Removes whatever occupies the endpoint path, then binds a fresh socket.
    pub(crate) fn bind(endpoint: &EndpointAddress) -> Result<Self, ListenerError> {
        if endpoint.remove_file()? {
            info!(
                target: LISTENER_TARGET,
                path = %endpoint.path(),
                "removed stale socket file"
            );
        }
        let listener = UnixListener::bind(endpoint.path().as_std_path()).map_err(|source| {
            ListenerError::BindUnix {
                path: endpoint.path().to_path_buf(),
                source,
            }
        })?;
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
        })
    }

    /// Starts serving connections on a background thread until `shutdown`
    /// is raised or accepting fails.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.listener.set_nonblocking(true) {
            cleanup_socket(&self.endpoint);
            return Err(ListenerError::NonBlocking { source });
        }
        let endpoint = self.endpoint.clone();
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(ACCEPT_THREAD_NAME.to_owned())
            .spawn(move || run_accept_loop(self, &shutdown_flag, handler.as_ref()))
            .map_err(|source| {
                cleanup_socket(&endpoint);
                ListenerError::Spawn { source }
            })?;
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Reports whether the accept thread has exited on its own or after
    /// shutdown.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .is_none_or(thread::JoinHandle::is_finished)
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        self.handle.take().map_or(Ok(()), |handle| {
            handle.join().map_err(|_| ListenerError::ThreadPanic)
        })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: SocketListener,
    shutdown: &Arc<AtomicBool>,
    handler: &dyn ConnectionHandler,
) {
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "control socket listening"
    );
    while !shutdown.load(Ordering::SeqCst) {
        match listener.listener.accept() {
            Ok((socket, _)) => match ConnectionStream::new(socket, Arc::clone(shutdown)) {
                Ok(stream) => handler.handle(stream),
                Err(error) => warn!(
                    target: LISTENER_TARGET,
                    %error,
                    "failed to configure accepted connection"
                ),
            },
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::ConnectionAborted
                ) =>
            {
                debug!(
                    target: LISTENER_TARGET,
                    %error,
                    "transient accept error"
                );
            }
            Err(error) => {
                warn!(
                    target: LISTENER_TARGET,
                    %error,
                    "socket accept failed, stopping listener"
                );
                break;
            }
        }
    }

    let SocketListener {
        endpoint,
        listener: socket,
    } = listener;
    drop(socket);
    cleanup_socket(&endpoint);
    info!(
        target: LISTENER_TARGET,
        endpoint = %endpoint,
        "control socket closed"
    );
}

fn cleanup_socket(endpoint: &EndpointAddress) {
    if let Err(error) = endpoint.remove_file() {
        warn!(
            target: LISTENER_TARGET,
            %error,
            "failed to remove socket file"
        );
    }
}
