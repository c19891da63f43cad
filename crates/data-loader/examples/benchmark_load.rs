use data_loader::Dataset;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/ml-latest-small");

    println!("Loading dataset from {}...\n", data_dir.display());

    let start = Instant::now();
    let dataset = Dataset::load_from_dir(data_dir).expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let (movies, ratings) = dataset.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Ratings: {}", ratings);
    println!(
        "\nPerformance: {:.0} ratings/second",
        ratings as f64 / elapsed.as_secs_f64()
    );
}
