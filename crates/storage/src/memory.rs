use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use shared::domain::{Command, CommandId};
use tracing::debug;

use crate::context::{
    ChangeTracker, CommandContext, CommandStore, PendingChange, StoreError, StoreResult,
};

/// Command set held in process memory. Clones share the same records; every
/// `new()` is a separate, empty database.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<Vec<Command>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a new store. Fails on the first id that appears twice.
    pub fn with_commands(commands: impl IntoIterator<Item = Command>) -> StoreResult<Self> {
        let mut records: Vec<Command> = Vec::new();
        for command in commands {
            if records.iter().any(|existing| existing.id == command.id) {
                return Err(StoreError::DuplicateId(command.id));
            }
            records.push(command);
        }
        Ok(Self {
            records: Arc::new(Mutex::new(records)),
        })
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<Command>>> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("in-memory command store lock poisoned")))
    }
}

impl CommandStore for InMemoryStore {
    type Context = InMemoryCommandContext;

    fn context(&self) -> Self::Context {
        InMemoryCommandContext {
            store: self.clone(),
            tracker: ChangeTracker::default(),
        }
    }
}

pub struct InMemoryCommandContext {
    store: InMemoryStore,
    tracker: ChangeTracker,
}

#[async_trait]
impl CommandContext for InMemoryCommandContext {
    async fn list(&self) -> StoreResult<Vec<Command>> {
        Ok(self.store.lock()?.clone())
    }

    async fn find_by_id(&self, id: CommandId) -> StoreResult<Option<Command>> {
        Ok(self
            .store
            .lock()?
            .iter()
            .find(|command| command.id == id)
            .cloned())
    }

    fn add(&mut self, command: Command) {
        self.tracker.stage(PendingChange::Added(command));
    }

    fn remove(&mut self, command: Command) {
        self.tracker.stage(PendingChange::Removed(command));
    }

    fn mark_modified(&mut self, command: Command) {
        self.tracker.stage(PendingChange::Modified(command));
    }

    async fn commit(&mut self) -> StoreResult<usize> {
        let changes = self.tracker.drain();
        let mut records = self.store.lock()?;

        // Work on a copy so a failing change leaves the committed set untouched.
        let mut working = records.clone();
        let mut affected = 0;
        for change in changes {
            match change {
                PendingChange::Added(command) => {
                    if working.iter().any(|existing| existing.id == command.id) {
                        return Err(StoreError::DuplicateId(command.id));
                    }
                    working.push(command);
                    affected += 1;
                }
                PendingChange::Modified(command) => {
                    if let Some(existing) = working.iter_mut().find(|c| c.id == command.id) {
                        existing.apply(&command);
                        affected += 1;
                    } else {
                        debug!(id = %command.id, "modified command not present; nothing updated");
                    }
                }
                PendingChange::Removed(command) => {
                    let before = working.len();
                    working.retain(|existing| existing.id != command.id);
                    affected += before - working.len();
                }
            }
        }

        *records = working;
        Ok(affected)
    }
}
