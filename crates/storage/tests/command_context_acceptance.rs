use shared::domain::{Command, CommandId};
use storage::{CommandContext, CommandStore, InMemoryStore, Storage};

/// Runs the same lifecycle against any backend and returns what `list` saw at the end.
async fn exercise_lifecycle<S: CommandStore>(store: S) -> Vec<Command> {
    let mut ctx = store.context();
    for id in 1..=3 {
        ctx.add(Command::new(id, "HowTo test", "CommandLine test", "Platform test"));
    }
    assert_eq!(ctx.commit().await.expect("seed"), 3);

    let mut ctx = store.context();
    let target = ctx
        .find_by_id(CommandId(2))
        .await
        .expect("find")
        .expect("seeded command");
    let mut replacement = target.clone();
    replacement.platform = "windows".into();
    ctx.mark_modified(replacement);
    ctx.remove(Command::new(1, "", "", ""));
    ctx.mark_modified(Command::new(9, "ghost", "ghost", "ghost"));
    assert_eq!(ctx.commit().await.expect("commit"), 2);

    store.context().list().await.expect("list")
}

#[tokio::test]
async fn sqlite_and_in_memory_backends_agree() {
    let sqlite = Storage::new("sqlite::memory:").await.expect("db");
    let from_sqlite = exercise_lifecycle(sqlite).await;
    let from_memory = exercise_lifecycle(InMemoryStore::new()).await;

    assert_eq!(from_sqlite, from_memory);
    assert_eq!(
        from_memory,
        vec![
            Command::new(2, "HowTo test", "CommandLine test", "windows"),
            Command::new(3, "HowTo test", "CommandLine test", "Platform test"),
        ]
    );
}
