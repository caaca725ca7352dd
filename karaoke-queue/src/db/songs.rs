//! Song catalog queries
//!
//! The catalog is read-only from the queue's point of view; the only write
//! path is the all-or-nothing bulk import.

use crate::error::{QueueError, Result};
use karaoke_common::db::{NewSong, Song, SongId};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

const SONG_COLUMNS: &str = "id, artist, title, language, duration_seconds, genre_tags";

/// Look up a single song
///
/// Fails with `NotFound`; the queue service reports that as an invalid
/// reference during submission.
pub async fn get_song<'e, E>(db: E, song_id: SongId) -> Result<Song>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Song>(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?"))
        .bind(song_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| QueueError::NotFound(format!("Song {}", song_id)))
}

/// Whole catalog, ordered for display
pub async fn list_songs(db: &SqlitePool) -> Result<Vec<Song>> {
    let songs = sqlx::query_as::<_, Song>(&format!(
        "SELECT {SONG_COLUMNS} FROM songs ORDER BY artist COLLATE NOCASE, title COLLATE NOCASE, id"
    ))
    .fetch_all(db)
    .await?;

    Ok(songs)
}

pub async fn count_songs(db: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Insert a batch of songs in one transaction
///
/// Either every row is inserted or none is.
pub async fn insert_songs(db: &SqlitePool, songs: &[NewSong]) -> Result<usize> {
    let mut tx = db.begin().await?;

    for song in songs {
        sqlx::query(
            r#"
            INSERT INTO songs (artist, title, language, duration_seconds, genre_tags)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&song.artist)
        .bind(&song.title)
        .bind(&song.language)
        .bind(song.duration_seconds)
        .bind(song.genre_tags_column())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!("Inserted {} songs into catalog", songs.len());
    Ok(songs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use karaoke_common::db::init_in_memory;

    fn new_song(artist: &str, title: &str) -> NewSong {
        NewSong {
            artist: artist.to_string(),
            title: title.to_string(),
            language: Some("Spanish".to_string()),
            duration_seconds: Some(210),
            genre_tags: vec!["Bolero".to_string(), "Latin".to_string()],
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_song() {
        let pool = init_in_memory().await.unwrap();

        let inserted = insert_songs(&pool, &[new_song("Luis Miguel", "La Barca")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let songs = list_songs(&pool).await.unwrap();
        let song = get_song(&pool, songs[0].id).await.unwrap();
        assert_eq!(song.title, "La Barca");
        assert_eq!(song.genre_tags, vec!["Bolero", "Latin"]);
        assert_eq!(song.duration_seconds, Some(210));
    }

    #[tokio::test]
    async fn test_get_unknown_song() {
        let pool = init_in_memory().await.unwrap();
        let err = get_song(&pool, 999).await.unwrap_err();
        assert!(matches!(err, QueueError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_songs_sorted_by_artist() {
        let pool = init_in_memory().await.unwrap();
        insert_songs(
            &pool,
            &[
                new_song("soda Stereo", "De Música Ligera"),
                new_song("Adele", "Rolling in the Deep"),
                new_song("Gilda", "Fuiste"),
            ],
        )
        .await
        .unwrap();

        let artists: Vec<String> = list_songs(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.artist)
            .collect();
        assert_eq!(artists, vec!["Adele", "Gilda", "soda Stereo"]);
        assert_eq!(count_songs(&pool).await.unwrap(), 3);
    }
}
