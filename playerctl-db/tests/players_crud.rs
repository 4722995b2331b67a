//! Integration tests against a live TiDB/MySQL server.
//!
//! Run with: TIDB_HOST=... cargo test -p playerctl-db -- --ignored
//!
//! Every test recreates the `players` table, so they share one lock.

use std::sync::{Mutex, MutexGuard};

use playerctl_db::{
    define_players, Comparison, ConnectionConfig, DbError, Filter, NewPlayer, PlayerChanges,
    PlayerField, Session,
};

static TABLE_LOCK: Mutex<()> = Mutex::new(());

fn lock_table() -> MutexGuard<'static, ()> {
    TABLE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn session() -> Session {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    playerctl_db::load_dotenv();
    let config = ConnectionConfig::from_env().expect("TIDB_* configuration");
    Session::new(config)
}

fn seed_rows() -> Vec<NewPlayer> {
    (1..=5).map(|i| NewPlayer::with_id(i, i * 100, i * 100)).collect()
}

async fn reset_and_seed(session: &mut Session) {
    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);
    players.sync(true).await.expect("sync");
    let written = players.bulk_insert(&seed_rows()).await.expect("seed");
    assert_eq!(written, 5);
}

#[tokio::test]
#[ignore = "requires database"]
async fn connection_is_reused_until_closed() {
    let _guard = lock_table();
    let mut session = session();

    let first = session.connection_id().await.expect("connection id");
    let second = session.connection_id().await.expect("connection id");
    assert_eq!(first, second);

    session.close().await.expect("close");
    assert!(!session.is_open());

    let third = session.connection_id().await.expect("connection id");
    assert_ne!(first, third);
    session.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn sync_recreates_empty_table() {
    let _guard = lock_table();
    let mut session = session();
    reset_and_seed(&mut session).await;

    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);
    players.sync(true).await.expect("sync");
    assert_eq!(players.count().await.expect("count"), 0);

    let columns = players.describe().await.expect("describe");
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "coins", "goods"]);
    assert!(columns.iter().all(|c| !c.nullable));

    session.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn sync_without_reset_keeps_rows() {
    let _guard = lock_table();
    let mut session = session();
    reset_and_seed(&mut session).await;

    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);
    players.sync(false).await.expect("sync");
    assert_eq!(players.count().await.expect("count"), 5);

    session.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn crud_cycle() {
    let _guard = lock_table();
    let mut session = session();
    reset_and_seed(&mut session).await;

    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);

    let created = players
        .insert(NewPlayer::with_id(6, 600, 600))
        .await
        .expect("insert");
    assert_eq!((created.id, created.coins, created.goods), (6, 600, 600));

    let rich = players
        .find_where(&Filter::when(PlayerField::Coins, Comparison::Gt, 300))
        .await
        .expect("find_where");
    let ids: Vec<i32> = rich.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![4, 5, 6]);

    let updated = players
        .update_by_id(6, PlayerChanges::default().coins(700).goods(700))
        .await
        .expect("update")
        .expect("row 6 exists");
    assert_eq!((updated.id, updated.coins, updated.goods), (6, 700, 700));

    let refetched = players.find_by_id(6).await.expect("find_by_id");
    assert_eq!(refetched, Some(updated));

    assert!(players.delete_by_id(6).await.expect("delete"));
    assert_eq!(players.find_by_id(6).await.expect("find_by_id"), None);
    assert!(!players.delete_by_id(6).await.expect("second delete"));

    session.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_id_is_constraint_error() {
    let _guard = lock_table();
    let mut session = session();
    reset_and_seed(&mut session).await;

    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);
    players
        .insert(NewPlayer::with_id(6, 600, 600))
        .await
        .expect("insert");

    let err = players
        .insert(NewPlayer::with_id(6, 1, 1))
        .await
        .expect_err("duplicate id");
    assert!(matches!(err, DbError::Constraint(_)), "got {err:?}");

    let kept = players.find_by_id(6).await.expect("find_by_id").expect("row 6");
    assert_eq!((kept.coins, kept.goods), (600, 600));
    assert_eq!(players.count().await.expect("count"), 6);

    session.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn bulk_insert_is_all_or_nothing() {
    let _guard = lock_table();
    let mut session = session();
    reset_and_seed(&mut session).await;

    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);

    // id 3 already exists; id 7 must not be written either.
    let err = players
        .bulk_insert(&[NewPlayer::with_id(7, 700, 700), NewPlayer::with_id(3, 1, 1)])
        .await
        .expect_err("duplicate in batch");
    assert!(err.is_constraint());
    assert_eq!(players.find_by_id(7).await.expect("find_by_id"), None);
    assert_eq!(players.count().await.expect("count"), 5);

    session.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn omitted_id_is_assigned_by_server() {
    let _guard = lock_table();
    let mut session = session();
    reset_and_seed(&mut session).await;

    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);

    let created = players.insert(NewPlayer::new(50, 60)).await.expect("insert");
    assert!(created.id > 5);
    assert_eq!(
        players.find_by_id(created.id).await.expect("find_by_id"),
        Some(created)
    );

    session.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_of_missing_row_is_none() {
    let _guard = lock_table();
    let mut session = session();
    reset_and_seed(&mut session).await;

    let conn = session.connection().await.expect("connect");
    let mut players = define_players(conn);
    let missing = players
        .update_by_id(42, PlayerChanges::default().coins(1))
        .await
        .expect("update");
    assert_eq!(missing, None);

    session.close().await.expect("close");
}
