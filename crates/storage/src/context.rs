use async_trait::async_trait;
use shared::domain::{Command, CommandId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a command with id {0} already exists")]
    DuplicateId(CommandId),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A change staged on a context and applied by [`CommandContext::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Added(Command),
    Modified(Command),
    Removed(Command),
}

impl PendingChange {
    pub fn command(&self) -> &Command {
        match self {
            Self::Added(command) | Self::Modified(command) | Self::Removed(command) => command,
        }
    }
}

/// Ordered list of staged changes, shared by every context implementation.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    pending: Vec<PendingChange>,
}

impl ChangeTracker {
    pub fn stage(&mut self, change: PendingChange) {
        self.pending.push(change);
    }

    /// Hands the staged changes to a commit, leaving the tracker empty.
    pub fn drain(&mut self) -> Vec<PendingChange> {
        std::mem::take(&mut self.pending)
    }
}

/// Unit of work over the command set.
///
/// Reads go straight to committed state. Writes are only staged until
/// [`commit`](CommandContext::commit) applies them, all or nothing, in the
/// order they were staged. Staged changes are dropped whether or not the
/// commit succeeds.
#[async_trait]
pub trait CommandContext: Send + Sync {
    /// Every committed command, in insertion order.
    async fn list(&self) -> StoreResult<Vec<Command>>;

    async fn find_by_id(&self, id: CommandId) -> StoreResult<Option<Command>>;

    fn add(&mut self, command: Command);

    fn remove(&mut self, command: Command);

    /// Stages an overwrite of the mutable fields of the record sharing
    /// `command.id`. Committing against a missing id touches nothing.
    fn mark_modified(&mut self, command: Command);

    /// Returns the number of records affected.
    async fn commit(&mut self) -> StoreResult<usize>;
}

/// Process-wide handle that opens one [`CommandContext`] per request.
pub trait CommandStore: Clone + Send + Sync + 'static {
    type Context: CommandContext + 'static;

    fn context(&self) -> Self::Context;
}
