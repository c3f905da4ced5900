//! Command table and request dispatch.
//!
//! Each command is described by a [`CommandDescriptor`]: its name, the number
//! of arguments it accepts and a handler. The table is plain data, so new
//! commands are added by registering another descriptor; dispatch itself
//! never changes.
//!
//! Dispatch turns every request into exactly one [`Response`]. Empty
//! messages, unknown names, arity mismatches and handler failures all become
//! `success = false` responses whose text is the [`CommandError`] message.
//!
//! Handlers parse their own arguments on the IO thread and only then cross
//! the [`Bridge`] to touch client state, so a request with a malformed
//! argument never reaches the client.

mod errors;
mod handlers;
#[cfg(test)]
mod tests;

use std::fmt;

use tracing::debug;

use crate::application::ClientApplication;
use crate::bridge::Bridge;
use crate::message::{Message, Response};

pub use self::errors::CommandError;
pub use self::handlers::SendKind;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Result of running one command handler.
pub type CommandResult = Result<String, CommandError>;

/// Signature shared by all command handlers.
pub type Handler<A> = fn(&Bridge<A>, &[String]) -> CommandResult;

/// Inclusive bounds on the number of arguments a command takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    min: usize,
    max: usize,
}

impl Arity {
    /// Exactly `count` arguments.
    #[must_use]
    pub const fn exactly(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    /// Between `min` and `max` arguments inclusive.
    #[must_use]
    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Whether a request with `count` arguments fits these bounds.
    #[must_use]
    pub const fn accepts(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }

    fn check(&self, command: &str, count: usize) -> Result<(), CommandError> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(CommandError::arity(command, *self))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(formatter, "{} arguments", self.min)
        } else {
            write!(formatter, "between {} and {} arguments", self.min, self.max)
        }
    }
}

/// Name, arity and handler of one command.
pub struct CommandDescriptor<A> {
    name: &'static str,
    arity: Arity,
    handler: Handler<A>,
}

impl<A> Clone for CommandDescriptor<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for CommandDescriptor<A> {}

impl<A> fmt::Debug for CommandDescriptor<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl<A> CommandDescriptor<A> {
    /// Describes a command named `name` served by `handler`.
    #[must_use]
    pub const fn new(name: &'static str, arity: Arity, handler: Handler<A>) -> Self {
        Self {
            name,
            arity,
            handler,
        }
    }

    /// Name matched against the first part of a request.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Accepted argument count.
    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }
}

/// Immutable set of commands understood by the server.
pub struct CommandTable<A> {
    descriptors: Vec<CommandDescriptor<A>>,
}

impl<A> Clone for CommandTable<A> {
    fn clone(&self) -> Self {
        Self {
            descriptors: self.descriptors.clone(),
        }
    }
}

impl<A> fmt::Debug for CommandTable<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(&self.descriptors).finish()
    }
}

impl<A> Default for CommandTable<A> {
    fn default() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }
}

impl<A> CommandTable<A> {
    /// Creates a table with no commands.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds `descriptor`, replacing any command with the same name.
    #[must_use]
    pub fn with(mut self, descriptor: CommandDescriptor<A>) -> Self {
        if let Some(existing) = self
            .descriptors
            .iter_mut()
            .find(|existing| existing.name == descriptor.name)
        {
            *existing = descriptor;
        } else {
            self.descriptors.push(descriptor);
        }
        self
    }

    /// Looks up a command by exact, case-sensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandDescriptor<A>> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.name == name)
    }

    /// Registered command names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|descriptor| descriptor.name)
    }

    /// Runs `message` and produces the response to send back.
    #[must_use]
    pub fn dispatch(&self, message: &Message, bridge: &Bridge<A>) -> Response {
        let result = self.execute(message, bridge);
        if let Err(error) = &result {
            debug!(
                target: DISPATCH_TARGET,
                command = message.command().unwrap_or_default(),
                %error,
                "command failed"
            );
        }
        Response::from(result)
    }

    fn execute(&self, message: &Message, bridge: &Bridge<A>) -> CommandResult {
        let name = message.command().ok_or(CommandError::EmptyMessage)?;
        let descriptor = self
            .get(name)
            .ok_or_else(|| CommandError::unknown_command(name))?;
        let arguments = message.arguments();
        descriptor.arity.check(name, arguments.len())?;

        debug!(
            target: DISPATCH_TARGET,
            command = name,
            arguments = arguments.len(),
            "dispatching command"
        );
        (descriptor.handler)(bridge, arguments)
    }
}

impl<A: ClientApplication + 'static> CommandTable<A> {
    /// The full command surface offered to external tooling.
    #[must_use]
    pub fn standard() -> Self {
        handlers::standard_commands()
            .into_iter()
            .fold(Self::empty(), Self::with)
    }
}
