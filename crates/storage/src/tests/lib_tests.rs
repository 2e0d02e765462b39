use super::*;

fn seed_commands() -> Vec<Command> {
    (1..=3)
        .map(|id| {
            Command::new(
                id,
                format!("how to test {id}"),
                format!("command line test {id}"),
                format!("platform fake {id}"),
            )
        })
        .collect()
}

async fn seeded_storage() -> Storage {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut ctx = storage.context();
    for command in seed_commands() {
        ctx.add(command);
    }
    assert_eq!(ctx.commit().await.expect("seed"), 3);
    storage
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("cmd_api_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn lists_commands_in_insertion_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut ctx = storage.context();
    ctx.add(Command::new(30, "c", "c", "c"));
    ctx.add(Command::new(10, "a", "a", "a"));
    ctx.add(Command::new(20, "b", "b", "b"));
    ctx.commit().await.expect("commit");

    let ids: Vec<i64> = ctx
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|c| c.id.0)
        .collect();
    assert_eq!(ids, vec![30, 10, 20]);
}

#[tokio::test]
async fn staged_changes_are_invisible_until_commit() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut ctx = storage.context();
    ctx.add(Command::new(1, "h", "c", "p"));

    assert!(ctx.find_by_id(CommandId(1)).await.expect("find").is_none());
    ctx.commit().await.expect("commit");
    assert_eq!(
        ctx.find_by_id(CommandId(1)).await.expect("find"),
        Some(Command::new(1, "h", "c", "p"))
    );
}

#[tokio::test]
async fn find_by_id_returns_none_for_missing_id() {
    let storage = seeded_storage().await;
    let found = storage
        .context()
        .find_by_id(CommandId(100))
        .await
        .expect("find");
    assert!(found.is_none());
}

#[tokio::test]
async fn duplicate_insert_is_rejected_and_rolled_back() {
    let storage = seeded_storage().await;
    let mut ctx = storage.context();
    ctx.add(Command::new(4, "new", "new", "new"));
    ctx.add(Command::new(2, "dup", "dup", "dup"));

    let err = ctx.commit().await.expect_err("duplicate id");
    assert!(matches!(err, StoreError::DuplicateId(CommandId(2))));

    let commands = ctx.list().await.expect("list");
    assert_eq!(commands, seed_commands());
}

#[tokio::test]
async fn modifying_missing_id_affects_nothing() {
    let storage = seeded_storage().await;
    let mut ctx = storage.context();
    ctx.mark_modified(Command::new(42, "h", "c", "p"));

    assert_eq!(ctx.commit().await.expect("commit"), 0);
    assert!(ctx.find_by_id(CommandId(42)).await.expect("find").is_none());
    assert_eq!(ctx.list().await.expect("list").len(), 3);
}

#[tokio::test]
async fn modify_and_remove_report_affected_rows() {
    let storage = seeded_storage().await;
    let mut ctx = storage.context();
    ctx.mark_modified(Command::new(1, "updated", "updated", "updated"));
    ctx.remove(Command::new(3, "", "", ""));

    assert_eq!(ctx.commit().await.expect("commit"), 2);
    let commands = ctx.list().await.expect("list");
    assert_eq!(
        commands,
        vec![
            Command::new(1, "updated", "updated", "updated"),
            seed_commands()[1].clone(),
        ]
    );
}

#[tokio::test]
async fn contexts_share_committed_state() {
    let storage = seeded_storage().await;
    let mut writer = storage.context();
    writer.remove(Command::new(1, "", "", ""));
    writer.commit().await.expect("commit");

    let reader = storage.context();
    assert_eq!(reader.list().await.expect("list").len(), 2);
}
