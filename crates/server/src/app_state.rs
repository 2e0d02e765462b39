use server_api::CommandsController;
use storage::CommandStore;

pub(crate) struct AppState<S> {
    pub(crate) store: S,
}

impl<S: CommandStore> AppState<S> {
    pub(crate) fn new(store: S) -> Self {
        Self { store }
    }

    /// Controller bound to a fresh unit of work for a single request.
    pub(crate) fn controller(&self) -> CommandsController<S::Context> {
        CommandsController::new(self.store.context())
    }
}
