//! Integration tests for the engine.
//!
//! These build a small dataset in memory (and once on disk) and exercise the
//! full title → recommendation path for both strategies.

use data_loader::{Dataset, Genre, Movie, MovieId, MovieQuery, Rating, UserId};
use engine::{EngineConfig, RecommendationEngine, Strategy};
use recommenders::RecommendError;
use std::collections::HashSet;
use std::path::PathBuf;

const SEEDS: [&str; 3] = [
    "Star Quest (1977)",
    "Star Quest II (1980)",
    "Robot Dawn (1984)",
];

fn movie(id: MovieId, title: &str, year: u16, genres: Vec<Genre>, tokens: &[&str]) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        year: Some(year),
        genres,
        tokens: tokens.iter().map(|t| t.to_string()).collect(),
    }
}

fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
    Rating {
        user_id,
        movie_id,
        rating: value,
        timestamp: 1_000_000,
    }
}

fn create_test_movies() -> Vec<Movie> {
    use Genre::*;
    vec![
        movie(1, "Star Quest (1977)", 1977, vec![SciFi, Adventure], &["star", "quest"]),
        movie(2, "Star Quest II (1980)", 1980, vec![SciFi, Adventure], &["star", "quest"]),
        movie(3, "Robot Dawn (1984)", 1984, vec![SciFi, Action], &["robot", "dawn"]),
        movie(4, "Robot Dusk (1991)", 1991, vec![SciFi, Action], &["robot", "dusk"]),
        movie(5, "Galaxy Run (1999)", 1999, vec![SciFi, Adventure], &["galaxy", "star"]),
        movie(6, "Paris Nights (1995)", 1995, vec![Romance, Drama], &["paris", "nights"]),
        movie(7, "Paris Mornings (1998)", 1998, vec![Romance, Comedy], &["paris", "mornings"]),
        movie(8, "Haunted Dusk (1980)", 1980, vec![Horror], &["haunted", "dusk"]),
        movie(9, "Quiet Nights (2003)", 2003, vec![Drama], &["quiet", "nights"]),
        movie(10, "Lone Western (1965)", 1965, vec![Western], &["lone", "western"]),
    ]
}

/// Sci-fi fans (users 1-4) and romance fans (users 5-8); movie 10 is unrated
fn create_test_ratings() -> Vec<Rating> {
    let mut ratings = Vec::new();
    for user in 1..=4 {
        for movie_id in [1, 2, 3, 4, 5] {
            ratings.push(rating(user, movie_id, 4.5));
        }
        for movie_id in [6, 7, 9] {
            ratings.push(rating(user, movie_id, 1.5));
        }
    }
    for user in 5..=8 {
        for movie_id in [1, 2, 3, 4, 5] {
            ratings.push(rating(user, movie_id, 2.0));
        }
        for movie_id in [6, 7, 9] {
            ratings.push(rating(user, movie_id, 5.0));
        }
        ratings.push(rating(user, 8, 3.0));
    }
    ratings
}

fn create_test_engine(config: EngineConfig) -> RecommendationEngine {
    let dataset = Dataset::from_parts(create_test_movies(), create_test_ratings());
    RecommendationEngine::new(dataset, config).unwrap()
}

#[test]
fn test_results_never_contain_seeds_or_duplicates() {
    let engine = create_test_engine(EngineConfig::default());

    for strategy in Strategy::ALL {
        let titles = engine.recommend(&SEEDS, 10, strategy).unwrap();

        assert!(titles.iter().all(|t| !SEEDS.contains(&t.as_str())), "{}", strategy);
        let unique: HashSet<&String> = titles.iter().collect();
        assert_eq!(unique.len(), titles.len(), "{}", strategy);
        // 10 movies, 3 seeds
        assert_eq!(titles.len(), 7, "{}", strategy);
    }
}

#[test]
fn test_length_is_capped_by_top_n() {
    let engine = create_test_engine(EngineConfig::default());

    for strategy in Strategy::ALL {
        assert_eq!(engine.recommend(&SEEDS, 3, strategy).unwrap().len(), 3);
        assert_eq!(engine.recommend(&SEEDS, 1, strategy).unwrap().len(), 1);
    }
}

#[test]
fn test_fewer_eligible_than_requested() {
    let movies: Vec<Movie> = create_test_movies().into_iter().take(7).collect();
    let dataset = Dataset::from_parts(movies, create_test_ratings());
    let engine = RecommendationEngine::new(dataset, EngineConfig::default()).unwrap();

    for strategy in Strategy::ALL {
        assert_eq!(engine.recommend(&SEEDS, 10, strategy).unwrap().len(), 4);
    }
}

#[test]
fn test_content_prefers_similar_metadata() {
    let engine = create_test_engine(EngineConfig::default());
    let titles = engine.recommend(&SEEDS, 2, Strategy::Content).unwrap();

    // Galaxy Run shares genres and "star" with two seeds; Robot Dusk is
    // close to only one
    assert_eq!(titles, vec!["Galaxy Run (1999)", "Robot Dusk (1991)"]);
}

#[test]
fn test_collaborative_prefers_shared_taste() {
    let engine = create_test_engine(EngineConfig::default());
    let results = engine
        .recommend_detailed(&["Paris Nights (1995)"], 10, Strategy::Collaborative)
        .unwrap();

    let top: HashSet<&str> = results[..2].iter().map(|r| r.title.as_str()).collect();
    assert!(top.contains("Paris Mornings (1998)"));
    assert!(top.contains("Quiet Nights (2003)"));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_deterministic_across_runs() {
    let first = create_test_engine(EngineConfig::default());
    let second = create_test_engine(EngineConfig::default());

    for strategy in Strategy::ALL {
        let expected = first.recommend_detailed(&SEEDS, 10, strategy).unwrap();
        assert_eq!(first.recommend_detailed(&SEEDS, 10, strategy).unwrap(), expected);
        assert_eq!(second.recommend_detailed(&SEEDS, 10, strategy).unwrap(), expected);
    }
}

#[test]
fn test_unknown_title_is_not_found() {
    let engine = create_test_engine(EngineConfig::default());
    let seeds = ["Star Quest (1977)", "Missing Movie (2020)", "Robot Dawn (1984)"];

    for strategy in Strategy::ALL {
        assert_eq!(
            engine.recommend(&seeds, 10, strategy),
            Err(RecommendError::NotFound("Missing Movie (2020)".to_string()))
        );
    }
}

#[test]
fn test_all_cold_seeds_is_insufficient_data() {
    let mut movies = create_test_movies();
    movies.push(movie(11, "Lone Western II (1968)", 1968, vec![Genre::Western], &["lone"]));
    let engine = RecommendationEngine::new(
        Dataset::from_parts(movies, create_test_ratings()),
        EngineConfig::default(),
    )
    .unwrap();
    let cold = ["Lone Western (1965)", "Lone Western II (1968)"];

    assert_eq!(
        engine.recommend(&cold, 10, Strategy::Collaborative),
        Err(RecommendError::InsufficientData { seeds: 2 })
    );
    // Content doesn't need ratings
    assert!(engine.recommend(&cold, 10, Strategy::Content).is_ok());
    // One warm seed is enough
    assert!(
        engine
            .recommend(&["Lone Western (1965)", "Star Quest (1977)"], 10, Strategy::Collaborative)
            .is_ok()
    );
}

#[test]
fn test_validation_order() {
    let empty = RecommendationEngine::new(Dataset::default(), EngineConfig::default()).unwrap();
    let none: [&str; 0] = [];

    assert!(matches!(
        empty.recommend(&none, 10, Strategy::Content),
        Err(RecommendError::InvalidRequest(_))
    ));
    assert!(matches!(
        empty.recommend(&["Anything"], 0, Strategy::Content),
        Err(RecommendError::InvalidRequest(_))
    ));
    assert_eq!(
        empty.recommend(&["Anything"], 10, Strategy::Collaborative),
        Err(RecommendError::EmptyCatalog)
    );
}

#[test]
fn test_precomputed_neighbors_match_query_time() {
    let query_time = create_test_engine(EngineConfig::default());
    let precomputed = create_test_engine(EngineConfig::default().with_neighbor_limit(Some(100)));

    assert!(precomputed.snapshot().content.neighbor_index().is_some());
    for strategy in Strategy::ALL {
        assert_eq!(
            precomputed.recommend_detailed(&SEEDS, 10, strategy).unwrap(),
            query_time.recommend_detailed(&SEEDS, 10, strategy).unwrap()
        );
    }
}

#[test]
fn test_reload_swaps_snapshot() {
    let engine = create_test_engine(EngineConfig::default());
    let before = engine.snapshot();
    assert_eq!(before.generation, 1);

    let mut movies = create_test_movies();
    movies.push(movie(11, "Star Quest III (1983)", 1983, vec![Genre::SciFi, Genre::Adventure], &["star", "quest"]));
    let generation = engine
        .reload(Dataset::from_parts(movies, create_test_ratings()))
        .unwrap();

    assert_eq!(generation, 2);
    assert_eq!(engine.snapshot().generation, 2);
    // The old snapshot is untouched
    assert_eq!(before.catalog.len(), 10);
    assert_eq!(engine.snapshot().catalog.len(), 11);

    let titles = engine.recommend(&SEEDS, 1, Strategy::Content).unwrap();
    assert_eq!(titles, vec!["Star Quest III (1983)"]);
}

#[test]
fn test_concurrent_queries_during_reload() {
    let engine = create_test_engine(EngineConfig::default());
    let expected = engine.recommend(&SEEDS, 5, Strategy::Content).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for strategy in Strategy::ALL {
                    for _ in 0..10 {
                        let titles = engine.recommend(&SEEDS, 5, strategy).unwrap();
                        assert_eq!(titles.len(), 5);
                    }
                }
            });
        }
        scope.spawn(|| {
            engine
                .reload(Dataset::from_parts(create_test_movies(), create_test_ratings()))
                .unwrap();
        });
    });

    // Same data reloaded, same answer
    assert_eq!(engine.recommend(&SEEDS, 5, Strategy::Content).unwrap(), expected);
    assert_eq!(engine.snapshot().generation, 2);
}

#[test]
fn test_invalid_config_is_rejected_at_build() {
    let dataset = || Dataset::from_parts(create_test_movies(), create_test_ratings());

    let err = RecommendationEngine::new(dataset(), EngineConfig::default().with_neighbor_limit(Some(0)))
        .err()
        .unwrap();
    assert!(err.to_string().contains("neighbor_limit"), "{}", err);

    let err = RecommendationEngine::new(dataset(), EngineConfig::default().with_rating_range(5.0, 1.0))
        .err()
        .unwrap();
    assert!(err.to_string().contains("rating_min"), "{}", err);

    // A positive limit still builds and answers queries
    let engine = create_test_engine(EngineConfig::default().with_neighbor_limit(Some(5)));
    for strategy in Strategy::ALL {
        assert!(!engine.recommend(&SEEDS, 10, strategy).unwrap().is_empty());
    }
}

#[test]
fn test_search_and_titles() {
    let engine = create_test_engine(EngineConfig::default());

    let query = MovieQuery {
        title_contains: Some("paris".to_string()),
        ..Default::default()
    };
    let found: Vec<MovieId> = engine.search(&query).iter().map(|m| m.id).collect();
    assert_eq!(found, vec![6, 7]);

    let query = MovieQuery {
        genre: Some(Genre::SciFi),
        min_year: Some(1980),
        max_year: Some(1990),
        ..Default::default()
    };
    let found: Vec<MovieId> = engine.search(&query).iter().map(|m| m.id).collect();
    assert_eq!(found, vec![2, 3]);

    let titles = engine.titles();
    assert_eq!(titles.len(), 10);
    assert_eq!(titles[0], "Star Quest (1977)");
}

#[test]
fn test_recommendation_serializes_to_json() {
    let engine = create_test_engine(EngineConfig::default());
    let results = engine.recommend_detailed(&SEEDS, 1, Strategy::Collaborative).unwrap();
    let json = serde_json::to_value(&results).unwrap();

    assert_eq!(json[0]["strategy"], "collaborative");
    assert!(json[0]["title"].is_string());
    assert!(json[0]["genres"].is_array());
}

/// Scratch directory removed on drop, even when an assertion fails
struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{}-{}", name, std::process::id()));
        // Leftovers from an earlier aborted run
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[test]
fn test_load_from_directory() {
    let temp = TempDir::new("moviemate-engine-test");
    let dir = &temp.0;
    std::fs::write(
        dir.join("movies.csv"),
        "movieId,title,genres\n\
         1,Star Quest (1977),Sci-Fi|Adventure\n\
         2,Star Quest II (1980),Sci-Fi|Adventure\n\
         3,Paris Nights (1995),Romance|Drama\n\
         4,Galaxy Star (1999),Sci-Fi\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("ratings.csv"),
        "userId,movieId,rating,timestamp\n\
         1,1,5.0,0\n1,2,4.5,0\n1,3,1.0,0\n\
         2,1,4.0,0\n2,2,4.0,0\n2,3,2.0,0\n",
    )
    .unwrap();

    let engine = RecommendationEngine::load(dir, EngineConfig::default()).unwrap();
    let titles = engine
        .recommend(&["Star Quest (1977)"], 10, Strategy::Content)
        .unwrap();
    assert_eq!(titles[0], "Star Quest II (1980)");
    assert_eq!(titles.len(), 3);
}
