use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Genre, MovieQuery};
use engine::{EngineConfig, MovieRecommendation, RecommendationEngine, Strategy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// MovieMate - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "moviemate")]
#[command(about = "Recommend movies from three favorites using content or collaborative filtering", long_about = None)]
struct Cli {
    /// Path to MovieLens dataset directory
    #[arg(short, long, env = "MOVIEMATE_DATA_DIR", default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Optional TOML file with engine settings
    #[arg(short, long, env = "MOVIEMATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get recommendations for favorite movies
    Recommend {
        /// Exact title of a favorite movie (repeat for each one)
        #[arg(short, long = "movie", required = true)]
        movies: Vec<String>,

        /// Ranking strategy: content or collaborative
        #[arg(short, long, default_value = "content")]
        strategy: Strategy,

        /// Number of recommendations (defaults to the configured value)
        #[arg(long)]
        top_n: Option<usize>,

        /// Show how each seed contributed to each score
        #[arg(long)]
        explain: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search and filter the catalog
    Search {
        /// Case-insensitive substring of the title
        #[arg(long)]
        title: Option<String>,

        /// Genre name, e.g. "Sci-Fi"
        #[arg(long)]
        genre: Option<Genre>,

        #[arg(long)]
        min_year: Option<u16>,

        #[arg(long)]
        max_year: Option<u16>,

        /// Maximum number of rows to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List catalog titles
    Titles {
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        #[arg(long, default_value = "content")]
        strategy: Strategy,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };

    // Load data and build both models (this may take a moment)
    println!("Loading MovieLens dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let data_dir = cli.data_dir.clone();
    let engine = tokio::task::spawn_blocking(move || RecommendationEngine::load(&data_dir, config))
        .await
        .context("Engine build task failed")??;
    let engine = Arc::new(engine);
    println!("{} Built engine in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            movies,
            strategy,
            top_n,
            explain,
            json,
        } => {
            let top_n = top_n.unwrap_or(engine.config().default_top_n);
            handle_recommend(&engine, &movies, strategy, top_n, explain, json)?
        }
        Commands::Search {
            title,
            genre,
            min_year,
            max_year,
            limit,
        } => {
            let query = MovieQuery {
                title_contains: title,
                genre,
                min_year,
                max_year,
            };
            handle_search(&engine, &query, limit)
        }
        Commands::Titles { limit } => handle_titles(&engine, limit),
        Commands::Benchmark { requests, strategy } => {
            handle_benchmark(engine, requests, strategy).await?
        }
    }

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    engine: &RecommendationEngine,
    movies: &[String],
    strategy: Strategy,
    top_n: usize,
    explain: bool,
    json: bool,
) -> Result<()> {
    if movies.len() != 3 {
        warn!(seeds = movies.len(), "MovieMate is tuned for three favorite movies");
    }

    let recommendations = engine
        .recommend_detailed(movies, top_n, strategy)
        .with_context(|| format!("Could not recommend from {:?}", movies))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(());
    }

    print_recommendations(&recommendations);
    if explain {
        print_explanations(engine, movies, &recommendations)?;
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(engine: &RecommendationEngine, query: &MovieQuery, limit: usize) {
    let results = engine.search(query);

    println!("{}", format!("Found {} movies:", results.len()).bold().blue());
    for movie in results.iter().take(limit) {
        let genres = movie
            .genres
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}: {} [{}]", movie.id.to_string().cyan(), movie.title, genres);
    }
    if results.len() > limit {
        println!("... and {} more", results.len() - limit);
    }
}

/// Handle the 'titles' command
fn handle_titles(engine: &RecommendationEngine, limit: usize) {
    let titles = engine.titles();
    for title in titles.iter().take(limit) {
        println!("{}", title);
    }
    println!("{}", format!("({} titles in catalog)", titles.len()).dimmed());
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: Arc<RecommendationEngine>,
    requests: usize,
    strategy: Strategy,
) -> Result<()> {
    let titles = engine.titles();
    if titles.len() < 4 {
        bail!("Benchmark needs at least 4 movies, catalog has {}", titles.len());
    }

    // Random seed triples from the catalog
    let queries: Vec<Vec<String>> = (0..requests)
        .map(|_| {
            (0..3)
                .map(|_| titles[rand::random::<u32>() as usize % titles.len()].clone())
                .collect()
        })
        .collect();

    info!(requests, strategy = %strategy, "Running benchmark");
    let started = Instant::now();

    // Queries are CPU-bound, so each one runs on the blocking pool
    let mut handles = vec![];
    for seeds in queries {
        let engine = engine.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let result = engine.recommend(seeds.as_slice(), 10, strategy);
            (start.elapsed(), result.is_ok())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = vec![];
    let mut failures = 0usize;
    for handle in handles {
        let (elapsed, ok) = handle.await?;
        timings.push(elapsed);
        if !ok {
            failures += 1;
        }
    }
    let wall_time = started.elapsed();

    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }

    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = timings.len() as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Strategy: {}", strategy);
    println!("Requests: {} ({} failed)", timings.len(), failures);
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Format and print recommendations
fn print_recommendations(recommendations: &[MovieRecommendation]) {
    println!("{}", "Movie Recommendations:".bold().blue());
    if recommendations.is_empty() {
        println!("  (no eligible movies)");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        let year = rec
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        println!(
            "{}. {} ({}) [{}] - Score: {:.3}",
            (i + 1).to_string().green(),
            rec.title,
            year,
            rec.genres.join(", "),
            rec.score
        );
    }
}

/// Per-seed similarity behind each recommendation
fn print_explanations(
    engine: &RecommendationEngine,
    seeds: &[String],
    recommendations: &[MovieRecommendation],
) -> Result<()> {
    let snapshot = engine.snapshot();
    let mut seed_ids = Vec::new();
    for title in seeds {
        let movie = snapshot.catalog.lookup_by_title(title)?;
        if !seed_ids.contains(&movie.id) {
            seed_ids.push(movie.id);
        }
    }

    println!();
    println!("{}", "Why these movies:".bold().blue());
    for rec in recommendations {
        println!("{} ({} score {:.3})", rec.title.bold(), rec.strategy, rec.score);
        for &seed in &seed_ids {
            let similarity = match rec.strategy {
                Strategy::Content => snapshot.content.similarity(seed, rec.movie_id),
                Strategy::Collaborative => snapshot.collaborative.similarity(seed, rec.movie_id),
            };
            let seed_title = snapshot
                .catalog
                .get_movie(seed)
                .map(|m| m.title.as_str())
                .unwrap_or("?");
            println!("   {:+.3} from {}", similarity, seed_title);
        }
        if rec.strategy == Strategy::Collaborative
            && snapshot.collaborative.matrix().is_low_confidence(rec.movie_id)
        {
            println!(
                "   {}",
                format!(
                    "few ratings ({}), score down-weighted",
                    snapshot.collaborative.matrix().rating_count(rec.movie_id)
                )
                .yellow()
            );
        }
    }
    Ok(())
}
