// src/sink.rs
use crate::gesture::Command;
use tracing::info;

/// Executes commands against the player. Fire-and-forget: failures are the
/// sink's own business and never reach the controller.
pub trait CommandSink {
    fn execute(&mut self, command: Command);
}

/// Logs the key an input injector would press.
#[derive(Debug, Default)]
pub struct LoggingSink {
    executed: usize,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> usize {
        self.executed
    }
}

impl CommandSink for LoggingSink {
    fn execute(&mut self, command: Command) {
        self.executed += 1;
        info!(key = command.key_chord(), "execute {command}");
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub commands: Vec<Command>,
}

impl CommandSink for RecordingSink {
    fn execute(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn execute(&mut self, command: Command) {
        (**self).execute(command);
    }
}
