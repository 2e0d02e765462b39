use shared::{
    domain::{Command, CommandId},
    error::{ApiError, ErrorCode},
    protocol::CommandCreated,
};
use storage::{CommandContext, StoreError};
use tracing::{info, warn};

/// Request handlers for the command resource.
///
/// A controller owns the unit of work it was built with and keeps nothing
/// else between calls; the HTTP layer builds one per request.
pub struct CommandsController<C> {
    context: C,
}

impl<C: CommandContext> CommandsController<C> {
    pub fn new(context: C) -> Self {
        Self { context }
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub async fn list_commands(&self) -> Result<Vec<Command>, ApiError> {
        self.context.list().await.map_err(store_error)
    }

    /// A missing id is a successful lookup with no command, never `NotFound`.
    pub async fn get_command(&self, id: CommandId) -> Result<Option<Command>, ApiError> {
        self.context.find_by_id(id).await.map_err(store_error)
    }

    pub async fn create_command(&mut self, command: Command) -> Result<CommandCreated, ApiError> {
        self.context.add(command.clone());
        self.context.commit().await.map_err(store_error)?;
        info!(id = %command.id, "command created");
        Ok(CommandCreated::new(command))
    }

    /// Overwrites the stored fields of `id` with those of `command`.
    ///
    /// The body must carry the same id as the route. An id that matches no
    /// stored command still succeeds and leaves the store as it was.
    pub async fn update_command(&mut self, id: CommandId, command: Command) -> Result<(), ApiError> {
        if id != command.id {
            return Err(ApiError::new(
                ErrorCode::Validation,
                format!("route id {id} does not match body id {}", command.id),
            ));
        }

        self.context.mark_modified(command);
        let affected = self.context.commit().await.map_err(store_error)?;
        if affected == 0 {
            warn!(%id, "update matched no stored command");
        }
        Ok(())
    }

    pub async fn delete_command(&mut self, id: CommandId) -> Result<Command, ApiError> {
        let command = self
            .context
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ApiError::new(ErrorCode::NotFound, format!("command {id} not found")))?;

        self.context.remove(command.clone());
        // Another request may have removed it between the lookup and the commit.
        if self.context.commit().await.map_err(store_error)? == 0 {
            return Err(ApiError::new(
                ErrorCode::NotFound,
                format!("command {id} not found"),
            ));
        }
        info!(%id, "command deleted");
        Ok(command)
    }
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::DuplicateId(id) => ApiError::new(
            ErrorCode::Conflict,
            format!("a command with id {id} already exists"),
        ),
        StoreError::Backend(err) => ApiError::new(ErrorCode::Internal, format!("{err:#}")),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
