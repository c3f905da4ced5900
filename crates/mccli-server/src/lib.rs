//! Local control channel for a running game client.
//!
//! The server listens on a Unix domain socket at
//! `<runtime-dir>/mc-cli-ipc-<pid>.sock` and answers requests from external
//! tooling. Each request is a length-prefixed list of strings whose first
//! element names a command; each reply is a success flag and one string.
//! Connections are served one at a time, and requests on a connection are
//! answered strictly in order.
//!
//! Client state belongs to a single owner thread. Command handlers run on
//! the server's IO thread and reach that state only through a [`Bridge`],
//! which queues a closure for the owner and blocks until it has run. The
//! owner keeps the channel moving by draining its [`TaskQueue`] from its own
//! loop, as [`host::serve_until`] does for the headless client.
//!
//! ```no_run
//! use mccli_config::EndpointAddress;
//! use mccli_server::{CommandTable, ControlServer, HeadlessClient, task_queue};
//!
//! # fn main() -> Result<(), mccli_server::ServerError> {
//! let (sender, queue) = task_queue();
//! let mut server = ControlServer::new(
//!     EndpointAddress::for_current_process(),
//!     CommandTable::standard(),
//! );
//! server.start(sender)?;
//!
//! let mut client = HeadlessClient::default();
//! queue.run_for(&mut client, std::time::Duration::from_secs(1));
//! server.stop()?;
//! # Ok(())
//! # }
//! ```

#[cfg(not(unix))]
compile_error!("the control channel requires Unix domain sockets");

mod application;
mod bridge;
mod client;
mod codec;
pub mod commands;
mod headless;
pub mod host;
mod message;
mod server;
pub mod telemetry;
mod transport;

pub use application::{ClientApplication, ModInfo};
pub use bridge::{Bridge, BridgeError, Task, TaskQueue, TaskSender, task_queue};
pub use client::{CONNECTION_TIMEOUT, ClientError, ControlClient};
pub use codec::{
    CodecError, MAX_STRING_BYTES, MAX_VARINT_BYTES, encode_string, encode_varint, read_string,
    read_varint,
};
pub use commands::{
    Arity, CommandDescriptor, CommandError, CommandResult, CommandTable, Handler, SendKind,
};
pub use headless::{HeadlessClient, Outgoing, Session};
pub use host::{HostError, run_headless};
pub use message::{MAX_MESSAGE_PARTS, Message, Response};
pub use server::{ControlServer, ServerError, ServerState};
pub use telemetry::TelemetryError;
pub use transport::ListenerError;
