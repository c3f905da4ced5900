//! Process host for the headless client.
//!
//! The calling thread owns the client and drains the task queue between
//! shutdown checks; the control server runs on its own accept thread.

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use mccli_config::{Config, EndpointAddress};

use crate::application::ClientApplication;
use crate::bridge::task_queue;
use crate::commands::CommandTable;
use crate::headless::HeadlessClient;
use crate::server::{ControlServer, ServerError, ServerState};
use crate::telemetry::{self, TelemetryError};

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");
const BINARY_NAME: &str = "mccli-headless";

/// How long the owner thread waits for work before rechecking shutdown.
pub const HOST_TICK: Duration = Duration::from_millis(50);

/// Errors that end the headless host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Logging could not be configured.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// Termination signals could not be registered.
    #[error("failed to install signal handlers: {source}")]
    Signals {
        /// Underlying registration error.
        #[source]
        source: io::Error,
    },
    /// The control server failed to start or stop.
    #[error(transparent)]
    Server(#[from] ServerError),
    /// The accept thread exited while the host was still running.
    #[error("control server stopped unexpectedly")]
    ServerDied,
}

/// Runs the headless client and reports any fatal error on `stderr`.
///
/// Telemetry may not be installed when the failure happens, so the error is
/// written directly rather than logged.
pub fn run<W: Write>(config: &Config, stderr: &mut W) -> ExitCode {
    match run_headless(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report_failure(&error, stderr),
    }
}

fn report_failure<W: Write>(error: &HostError, stderr: &mut W) -> ExitCode {
    writeln!(stderr, "{BINARY_NAME}: {error}").ok();
    ExitCode::FAILURE
}

/// Runs the headless client until a termination signal arrives.
pub fn run_headless(config: &Config) -> Result<(), HostError> {
    telemetry::initialise(config)?;
    let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
        .map_err(|source| HostError::Signals { source })?;
    let mut client = HeadlessClient::default();

    serve_until(config.endpoint(), &mut client, || {
        signals.pending().next().is_some_and(|signal| {
            info!(target: HOST_TARGET, signal, "shutdown signal received");
            true
        })
    })
}

/// Serves `client` on `endpoint` from the calling thread until
/// `should_stop` returns `true`.
///
/// The server is stopped and its socket file removed before this returns,
/// whether it ends normally or with an error.
pub fn serve_until<A, F>(
    endpoint: EndpointAddress,
    client: &mut A,
    mut should_stop: F,
) -> Result<(), HostError>
where
    A: ClientApplication + 'static,
    F: FnMut() -> bool,
{
    let (sender, queue) = task_queue::<A>();
    let mut server = ControlServer::new(endpoint, CommandTable::standard());
    server.start(sender)?;
    info!(
        target: HOST_TARGET,
        endpoint = %server.endpoint(),
        "headless client ready"
    );

    let outcome = loop {
        if should_stop() {
            break Ok(());
        }
        if server.state() != ServerState::Listening {
            break Err(HostError::ServerDied);
        }
        queue.run_for(client, HOST_TICK);
    };

    server.stop()?;
    outcome
}
