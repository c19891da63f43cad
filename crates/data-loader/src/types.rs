//! Core domain types for the movie catalog and rating history.
//!
//! - Type aliases for domain clarity (UserId, MovieId)
//! - `Movie`: immutable catalog record
//! - `Genre`: closed vocabulary of MovieLens genres
//! - `Rating`: a single user → movie observation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique, stable identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the catalog
///
/// Built once while loading and never mutated afterwards; every other
/// structure refers to movies by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Canonical title, unique within the catalog (e.g. "Toy Story (1995)")
    pub title: String,
    /// Release year, from the source's year column or the title suffix
    pub year: Option<u16>,
    /// Genre tags, deduplicated, in vocabulary order
    pub genres: Vec<Genre>,
    /// Free-text tokens (title words and user tags), lowercase
    ///
    /// Kept as a bag rather than a set so term frequency survives.
    pub tokens: Vec<String>,
}

impl Movie {
    /// True if the movie is tagged with `genre`
    pub fn has_genre(&self, genre: Genre) -> bool {
        self.genres.contains(&genre)
    }
}

/// Movie genres from MovieLens
///
/// The declaration order is the vocabulary order used for feature encoding,
/// so new variants go at the end of [`Genre::ALL`] only with care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Imax,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// Every genre, in fixed vocabulary order
    pub const ALL: [Genre; 19] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Children,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Fantasy,
        Genre::FilmNoir,
        Genre::Horror,
        Genre::Imax,
        Genre::Musical,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
    ];

    /// Position of this genre in [`Genre::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name as written in MovieLens files
    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Children => "Children",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "Film-Noir",
            Genre::Horror => "Horror",
            Genre::Imax => "IMAX",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known genre name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGenre(pub String);

impl fmt::Display for UnknownGenre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown genre '{}'", self.0)
    }
}

impl std::error::Error for UnknownGenre {}

impl FromStr for Genre {
    type Err = UnknownGenre;

    /// Parses MovieLens spellings case-insensitively.
    ///
    /// Example: "Sci-Fi" -> Ok(Genre::SciFi), "Children's" -> Ok(Genre::Children)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "action" => Ok(Genre::Action),
            "adventure" => Ok(Genre::Adventure),
            "animation" => Ok(Genre::Animation),
            // ml-1m writes "Children's", later releases "Children"
            "children" | "childrens" => Ok(Genre::Children),
            "comedy" => Ok(Genre::Comedy),
            "crime" => Ok(Genre::Crime),
            "documentary" => Ok(Genre::Documentary),
            "drama" => Ok(Genre::Drama),
            "fantasy" => Ok(Genre::Fantasy),
            "filmnoir" => Ok(Genre::FilmNoir),
            "horror" => Ok(Genre::Horror),
            "imax" => Ok(Genre::Imax),
            "musical" => Ok(Genre::Musical),
            "mystery" => Ok(Genre::Mystery),
            "romance" => Ok(Genre::Romance),
            "scifi" => Ok(Genre::SciFi),
            "thriller" => Ok(Genre::Thriller),
            "war" => Ok(Genre::War),
            "western" => Ok(Genre::Western),
            _ => Err(UnknownGenre(s.to_string())),
        }
    }
}

// =============================================================================
// Rating Type
// =============================================================================

/// Represents a single rating from a user for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value, 0.5 to 5.0 in MovieLens
    pub rating: f32,
    /// Unix timestamp when rating was made (0 when the source has none)
    pub timestamp: i64,
}
