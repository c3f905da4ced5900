//! Request-level failures reported back to the peer.
//!
//! The `Display` text of each variant is exactly what the client receives in
//! a `success = false` response, so external tooling may match on it.

use thiserror::Error;

use super::Arity;
use crate::bridge::BridgeError;

/// Reasons a well-formed request could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The request had no parts.
    #[error("empty message")]
    EmptyMessage,

    /// No command with this name is registered.
    #[error("invalid message type: {name}")]
    UnknownCommand {
        /// Name as received.
        name: String,
    },

    /// The request carried the wrong number of arguments.
    #[error("{command} takes {arity}")]
    Arity {
        /// Command that was called.
        command: String,
        /// Argument count it accepts.
        arity: Arity,
    },

    /// An argument could not be parsed; `input` is echoed verbatim.
    #[error("invalid {what}: {input}")]
    InvalidArgument {
        /// Setting the argument was meant for.
        what: &'static str,
        /// Argument as received.
        input: String,
    },

    /// The client is not connected to a server.
    #[error("not connected to server")]
    NotConnected,

    /// The named extension is unknown or has no settings screen.
    #[error("{name} has no config screen")]
    NoConfigScreen {
        /// Extension name as received.
        name: String,
    },

    /// `send` was given a kind other than `chat`, `chat-local` or `command`.
    #[error("invalid send type")]
    InvalidSendType,

    /// The client had nowhere to deliver the text.
    #[error("failed to send")]
    SendFailed,

    /// The owning thread did not run the work.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl CommandError {
    /// Builds [`Self::UnknownCommand`].
    #[must_use]
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    /// Builds [`Self::Arity`].
    #[must_use]
    pub fn arity(command: impl Into<String>, arity: Arity) -> Self {
        Self::Arity {
            command: command.into(),
            arity,
        }
    }

    /// Builds [`Self::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(what: &'static str, input: impl Into<String>) -> Self {
        Self::InvalidArgument {
            what,
            input: input.into(),
        }
    }

    /// Builds [`Self::NoConfigScreen`].
    #[must_use]
    pub fn no_config_screen(name: impl Into<String>) -> Self {
        Self::NoConfigScreen { name: name.into() }
    }
}
