//! On-disk database initialization tests

use karaoke_common::db::init_database;

#[tokio::test]
async fn test_creates_parent_folder_and_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("karaoke.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM song_requests")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_reopen_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("karaoke.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO songs (artist, title) VALUES ('Gilda', 'Fuiste')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("karaoke.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO song_requests (event_id, song_id, requester_name, play_order, created_at) \
         VALUES (99, 99, 'nobody', 0, '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "Dangling event/song references must be rejected");
}
