//! Parser for MovieLens-style CSV files.
//!
//! This module handles parsing the CSV sources:
//! - movies.csv: movieId,title,genres[,year]
//! - ratings.csv: userId,movieId,rating[,timestamp]
//! - tags.csv: userId,movieId,tag[,timestamp]
//!
//! Every parser reads from any `impl Read`, so callers can hand it a file or
//! an in-memory buffer. A row with a missing id or title, or a field that is
//! not a number, is skipped with a warning; only an unreadable header stops
//! the parse.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use tracing::{debug, warn};

/// Words too common to say anything about a movie
const STOP_WORDS: &[&str] = &[
    "an", "and", "at", "by", "for", "from", "in", "is", "it", "of", "on", "or", "the", "to",
    "with",
];

/// Raw row of movies.csv; everything optional so bad rows can be reported
#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId", alias = "id", default)]
    movie_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default)]
    year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId", alias = "user_id", default)]
    user_id: Option<String>,
    #[serde(rename = "movieId", alias = "movie_id", default)]
    movie_id: Option<String>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    #[serde(rename = "movieId", alias = "movie_id", default)]
    movie_id: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

/// Build a csv reader that tolerates ragged rows
fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Check that the header carries one of the accepted names for a column
fn require_column(headers: &StringRecord, file: &str, names: &[&str]) -> Result<()> {
    if headers.iter().any(|h| names.contains(&h)) {
        Ok(())
    } else {
        Err(DataLoadError::MissingColumn {
            file: file.to_string(),
            column: names[0].to_string(),
        })
    }
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>, file: &str) -> Result<StringRecord> {
    reader
        .headers()
        .cloned()
        .map_err(|e| DataLoadError::InvalidHeader {
            file: file.to_string(),
            reason: e.to_string(),
        })
}

/// Treat empty strings the same as absent fields
fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Read the next row along with the line it starts on
///
/// Returns `Ok(None)` at end of input. A row that can't be read or
/// deserialized comes back as an inner `Err` so the caller can log and skip
/// it; only an I/O failure ends the parse. Lines come from the csv reader,
/// so quoted fields spanning several lines are counted correctly.
fn next_row<R: Read, T: DeserializeOwned>(
    reader: &mut csv::Reader<R>,
    headers: &StringRecord,
    raw: &mut StringRecord,
) -> Result<Option<(u64, csv::Result<T>)>> {
    match reader.read_record(raw) {
        Ok(false) => Ok(None),
        Ok(true) => {
            let line = raw.position().map_or(0, |p| p.line());
            Ok(Some((line, raw.deserialize(Some(headers)))))
        }
        Err(e) if e.is_io_error() => Err(DataLoadError::IoError(e.into())),
        Err(e) => {
            let line = e.position().map_or(0, |p| p.line());
            Ok(Some((line, Err(e))))
        }
    }
}

/// Parse the movies source
///
/// The title often includes year in parentheses: "Toy Story (1995)".
/// Genres are pipe-separated: "Animation|Children|Comedy".
/// `tags` maps movie ids to free-text tags that get folded into the tokens.
pub fn parse_movies<R: Read>(
    reader: R,
    file: &str,
    tags: &BTreeMap<MovieId, Vec<String>>,
) -> Result<Vec<Movie>> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, file)?;
    require_column(&headers, file, &["movieId", "id"])?;
    require_column(&headers, file, &["title"])?;

    let mut movies = Vec::new();
    let mut skipped = 0usize;

    let mut raw = StringRecord::new();
    while let Some((line_no, result)) =
        next_row::<_, MovieRecord>(&mut reader, &headers, &mut raw)?
    {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(file, line = line_no, error = %e, "Skipping unreadable movie row");
                skipped += 1;
                continue;
            }
        };

        let Some(id_str) = non_empty(record.movie_id) else {
            warn!(file, line = line_no, "Skipping movie row: missing movieId");
            skipped += 1;
            continue;
        };
        let movie_id: MovieId = match id_str.parse() {
            Ok(id) => id,
            Err(e) => {
                warn!(file, line = line_no, value = %id_str, error = %e, "Skipping movie row: invalid movieId");
                skipped += 1;
                continue;
            }
        };
        let Some(title) = non_empty(record.title) else {
            warn!(file, line = line_no, movie_id, "Skipping movie row: missing title");
            skipped += 1;
            continue;
        };

        let year = non_empty(record.year)
            .and_then(|y| y.parse::<u16>().ok())
            .or_else(|| extract_year_from_title(&title));
        let genres = parse_genres(record.genres.as_deref().unwrap_or(""));

        let mut tokens = tokenize(strip_year_suffix(&title));
        if let Some(movie_tags) = tags.get(&movie_id) {
            for tag in movie_tags {
                tokens.extend(tokenize(tag));
            }
        }

        movies.push(Movie {
            id: movie_id,
            title,
            year,
            genres,
            tokens,
        });
    }

    if skipped > 0 {
        warn!(file, skipped, "Skipped malformed movie rows");
    }
    Ok(movies)
}

/// Parse the ratings source
///
/// Format: userId,movieId,rating[,timestamp]
pub fn parse_ratings<R: Read>(reader: R, file: &str) -> Result<Vec<Rating>> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, file)?;
    require_column(&headers, file, &["userId", "user_id"])?;
    require_column(&headers, file, &["movieId", "movie_id"])?;
    require_column(&headers, file, &["rating"])?;

    let mut ratings = Vec::new();
    let mut skipped = 0usize;

    let mut raw = StringRecord::new();
    while let Some((line_no, result)) =
        next_row::<_, RatingRecord>(&mut reader, &headers, &mut raw)?
    {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(file, line = line_no, error = %e, "Skipping unreadable rating row");
                skipped += 1;
                continue;
            }
        };

        match rating_from_record(record) {
            Ok(rating) => ratings.push(rating),
            Err(reason) => {
                warn!(file, line = line_no, %reason, "Skipping rating row");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(file, skipped, "Skipped malformed rating rows");
    }
    Ok(ratings)
}

fn rating_from_record(record: RatingRecord) -> std::result::Result<Rating, String> {
    let user_id = non_empty(record.user_id).ok_or("missing userId")?;
    let movie_id = non_empty(record.movie_id).ok_or("missing movieId")?;
    let rating = non_empty(record.rating).ok_or("missing rating")?;

    Ok(Rating {
        user_id: user_id
            .parse()
            .map_err(|e| format!("Invalid userId '{}': {}", user_id, e))?,
        movie_id: movie_id
            .parse()
            .map_err(|e| format!("Invalid movieId '{}': {}", movie_id, e))?,
        rating: rating
            .parse()
            .map_err(|e| format!("Invalid rating '{}': {}", rating, e))?,
        timestamp: match non_empty(record.timestamp) {
            Some(ts) => ts
                .parse()
                .map_err(|e| format!("Invalid timestamp '{}': {}", ts, e))?,
            None => 0,
        },
    })
}

/// Parse the tags source into raw tag text per movie
///
/// Format: userId,movieId,tag[,timestamp]
pub fn parse_tags<R: Read>(reader: R, file: &str) -> Result<BTreeMap<MovieId, Vec<String>>> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, file)?;
    require_column(&headers, file, &["movieId", "movie_id"])?;
    require_column(&headers, file, &["tag"])?;

    let mut tags: BTreeMap<MovieId, Vec<String>> = BTreeMap::new();

    let mut raw = StringRecord::new();
    while let Some((line_no, result)) =
        next_row::<_, TagRecord>(&mut reader, &headers, &mut raw)?
    {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(file, line = line_no, error = %e, "Skipping unreadable tag row");
                continue;
            }
        };
        let (Some(movie_id), Some(tag)) = (non_empty(record.movie_id), non_empty(record.tag))
        else {
            warn!(file, line = line_no, "Skipping tag row: missing movieId or tag");
            continue;
        };
        match movie_id.parse::<MovieId>() {
            Ok(id) => tags.entry(id).or_default().push(tag),
            Err(e) => warn!(file, line = line_no, error = %e, "Skipping tag row: invalid movieId"),
        }
    }

    Ok(tags)
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
pub fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        let year_str = title[start + 1..end].trim();
        if year_str.len() == 4 {
            if let Ok(year) = year_str.parse::<u16>() {
                return Some(year);
            }
        }
    }
    None
}

/// Drop a trailing "(YYYY)" so the year doesn't become a token
fn strip_year_suffix(title: &str) -> &str {
    let trimmed = title.trim_end();
    match trimmed.rfind('(') {
        Some(start) if trimmed.ends_with(')') && extract_year_from_title(trimmed).is_some() => {
            trimmed[..start].trim_end()
        }
        _ => trimmed,
    }
}

/// Parse pipe-separated genres into a deduplicated, ordered list
///
/// Unknown names and "(no genres listed)" are ignored.
///
/// Example: "Action|Adventure|Sci-Fi" -> vec![Genre::Action, Genre::Adventure, Genre::SciFi]
pub fn parse_genres(s: &str) -> Vec<Genre> {
    let mut genres = BTreeSet::new();
    for genre_str in s.split('|').map(str::trim).filter(|g| !g.is_empty()) {
        match genre_str.parse::<Genre>() {
            Ok(genre) => {
                genres.insert(genre);
            }
            Err(e) => debug!(error = %e, "Ignoring genre tag"),
        }
    }
    genres.into_iter().collect()
}

/// Split free text into lowercase word tokens
///
/// Tokens shorter than two characters and common stop words are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}
