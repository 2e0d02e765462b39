use serde::{Deserialize, Serialize};

use crate::domain::{Command, CommandId};

pub fn commands_route() -> &'static str {
    "/api/commands"
}

pub fn command_item_route() -> &'static str {
    "/api/commands/:id"
}

/// Canonical location of a single command, as reported after creation.
pub fn command_location(id: CommandId) -> String {
    format!("{}/{}", commands_route(), id)
}

/// Acknowledgment of a persisted create: where the record lives and what was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCreated {
    pub location: String,
    pub command: Command,
}

impl CommandCreated {
    pub fn new(command: Command) -> Self {
        Self {
            location: command_location(command.id),
            command,
        }
    }
}
