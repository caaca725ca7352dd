//! Catalog import parsing
//!
//! Rows arrive either as JSON objects or as a CSV document with a header
//! row. Validation is all-or-nothing: the first row missing `artist` or
//! `title` (or carrying an unusable duration) rejects the whole import.
//! Blank optional fields are stored as NULL.

use crate::error::{QueueError, Result};
use karaoke_common::db::{split_genre_tags, NewSong};
use serde::Deserialize;

/// Genre tags as a list or as one comma-separated string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GenreTags {
    List(Vec<String>),
    Joined(String),
}

/// One unvalidated import row
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SongRow {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, alias = "durationSeconds")]
    pub duration_seconds: Option<i64>,
    #[serde(default, alias = "genreTags")]
    pub genre_tags: Option<GenreTags>,
}

/// Reject uploads that do not claim to be CSV
pub fn ensure_csv_filename(filename: &str) -> Result<()> {
    if filename.to_ascii_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(QueueError::MalformedInput(
            "Only CSV files are allowed".to_string(),
        ))
    }
}

/// Turn raw rows into catalog entries
///
/// Row numbers in errors are 1-based over data rows.
pub fn validate_rows(rows: Vec<SongRow>) -> Result<Vec<NewSong>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| validate_row(index + 1, row))
        .collect()
}

fn validate_row(row_number: usize, row: SongRow) -> Result<NewSong> {
    let artist = required(row_number, "artist", row.artist)?;
    let title = required(row_number, "title", row.title)?;

    if let Some(duration) = row.duration_seconds {
        if duration < 0 {
            return Err(QueueError::MalformedInput(format!(
                "Row {}: duration_seconds must not be negative",
                row_number
            )));
        }
    }

    let genre_tags = match row.genre_tags {
        Some(GenreTags::List(tags)) => split_genre_tags(&tags.join(",")),
        Some(GenreTags::Joined(raw)) => split_genre_tags(&raw),
        None => Vec::new(),
    };

    Ok(NewSong {
        artist,
        title,
        language: optional(row.language),
        duration_seconds: row.duration_seconds,
        genre_tags,
    })
}

fn required(row_number: usize, field: &str, value: Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| {
        QueueError::MalformedInput(format!("Row {}: missing required field '{}'", row_number, field))
    })
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Starter catalog for an empty database
pub fn sample_songs() -> Vec<NewSong> {
    let song = |artist: &str, title: &str, language: &str, duration: i64, tags: &str| NewSong {
        artist: artist.to_string(),
        title: title.to_string(),
        language: Some(language.to_string()),
        duration_seconds: Some(duration),
        genre_tags: split_genre_tags(tags),
    };

    vec![
        song("Queen", "Bohemian Rhapsody", "English", 354, "Rock,Classic"),
        song("Luis Miguel", "La Barca", "Spanish", 210, "Bolero,Latin"),
        song("Soda Stereo", "De Música Ligera", "Spanish", 212, "Rock Nacional"),
        song("Adele", "Rolling in the Deep", "English", 228, "Pop,Soul"),
        song("Gilda", "Fuiste", "Spanish", 240, "Cumbia,Latin"),
    ]
}

/// Parse a CSV document with a header row
///
/// Columns are matched by name, case-insensitively; unknown columns are
/// ignored. `artist` and `title` columns must exist.
pub fn parse_csv(content: &str) -> Result<Vec<SongRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| QueueError::MalformedInput(format!("Unreadable CSV header: {}", e)))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };

    let artist_col = column("artist")
        .ok_or_else(|| QueueError::MalformedInput("CSV header has no 'artist' column".into()))?;
    let title_col = column("title")
        .ok_or_else(|| QueueError::MalformedInput("CSV header has no 'title' column".into()))?;
    let language_col = column("language");
    let duration_col = column("duration_seconds");
    let tags_col = column("genre_tags");

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row_number = index + 1;
        let record = record
            .map_err(|e| QueueError::MalformedInput(format!("Row {}: {}", row_number, e)))?;

        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        };

        let duration_seconds = match field(duration_col) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                QueueError::MalformedInput(format!(
                    "Row {}: duration_seconds '{}' is not a whole number",
                    row_number, raw
                ))
            })?),
            None => None,
        };

        rows.push(SongRow {
            artist: field(Some(artist_col)),
            title: field(Some(title_col)),
            language: field(language_col),
            duration_seconds,
            genre_tags: field(tags_col).map(GenreTags::Joined),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "artist,title,language,duration_seconds,genre_tags\n\
        Queen,Bohemian Rhapsody,English,354,\"Rock,Classic\"\n\
        Gilda,Fuiste,,,\n";

    #[test]
    fn test_parse_and_validate_csv() {
        let songs = validate_rows(parse_csv(SAMPLE).unwrap()).unwrap();
        assert_eq!(songs.len(), 2);

        assert_eq!(songs[0].duration_seconds, Some(354));
        assert_eq!(songs[0].genre_tags, vec!["Rock", "Classic"]);

        assert_eq!(songs[1].artist, "Gilda");
        assert_eq!(songs[1].language, None);
        assert_eq!(songs[1].duration_seconds, None);
        assert!(songs[1].genre_tags.is_empty());
    }

    #[test]
    fn test_missing_title_rejects_whole_import() {
        let csv = "artist,title\nQueen,Bohemian Rhapsody\nAdele,\n";
        let err = validate_rows(parse_csv(csv).unwrap()).unwrap_err();
        match err {
            QueueError::MalformedInput(msg) => assert!(msg.contains("Row 2"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_row_treated_as_missing_field() {
        let csv = "artist,title\nQueen\n";
        assert!(validate_rows(parse_csv(csv).unwrap()).is_err());
    }

    #[test]
    fn test_missing_header_column() {
        assert!(matches!(
            parse_csv("artist,name\nQueen,x\n").unwrap_err(),
            QueueError::MalformedInput(_)
        ));
    }

    #[test]
    fn test_bad_duration() {
        let csv = "title,artist,duration_seconds\nLa Barca,Luis Miguel,3:30\n";
        assert!(parse_csv(csv).is_err());
    }

    #[test]
    fn test_header_case_and_column_order() {
        let csv = "Title,ARTIST,extra\nDe Música Ligera,Soda Stereo,ignored\n";
        let songs = validate_rows(parse_csv(csv).unwrap()).unwrap();
        assert_eq!(songs[0].artist, "Soda Stereo");
        assert_eq!(songs[0].title, "De Música Ligera");
    }

    #[test]
    fn test_json_rows_accept_both_tag_shapes() {
        let rows: Vec<SongRow> = serde_json::from_str(
            r#"[
                {"artist": "Adele", "title": "Rolling in the Deep", "genreTags": ["Pop", "Soul"], "durationSeconds": 228},
                {"artist": "Gilda", "title": "Fuiste", "genre_tags": "Cumbia, Latin"}
            ]"#,
        )
        .unwrap();

        let songs = validate_rows(rows).unwrap();
        assert_eq!(songs[0].genre_tags, vec!["Pop", "Soul"]);
        assert_eq!(songs[0].duration_seconds, Some(228));
        assert_eq!(songs[1].genre_tags, vec!["Cumbia", "Latin"]);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let row = SongRow {
            artist: Some("a".into()),
            title: Some("t".into()),
            duration_seconds: Some(-1),
            ..SongRow::default()
        };
        assert!(validate_rows(vec![row]).is_err());
    }

    #[test]
    fn test_csv_filename_check() {
        assert!(ensure_csv_filename("songs.CSV").is_ok());
        assert!(ensure_csv_filename("songs.xlsx").is_err());
    }
}
