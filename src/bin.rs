use clap::{Parser, Subcommand};
use geo_quadtree::{loader, IndexConfig, QuadTree};
use pretty_duration::pretty_duration;
use rayon::prelude::*;
use std::{path::PathBuf, time::Instant};
use uom::si::{f64::*, length::kilometer};

#[derive(Parser)]
#[command(name = "geo-quadtree-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query a quad-tree built from a list of points", long_about = None)]
struct Cli {
    /// File with one `lat,lon[,label]` point per line
    #[arg(short, long)]
    points: PathBuf,
    /// TOML file with the tree settings
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Closest point in coordinate space
    Nearest {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        max_distance: Option<f64>,
    },
    /// Every point within a box; `west > east` crosses the antimeridian
    Range {
        #[arg(allow_hyphen_values = true)]
        north: f64,
        #[arg(allow_hyphen_values = true)]
        west: f64,
        #[arg(allow_hyphen_values = true)]
        south: f64,
        #[arg(allow_hyphen_values = true)]
        east: f64,
    },
    /// Every point within a geodesic distance in kilometres
    Radius {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        km: f64,
    },
    /// Nearest point for every query point in a file, answered in parallel
    Batch { queries: PathBuf },
}

pub fn main() -> geo_quadtree::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => IndexConfig::load(path)?,
        None => IndexConfig::default(),
    };
    let start = Instant::now();
    let mut tree: QuadTree<String> = QuadTree::from_config(&config)?;
    let points = loader::load_points(&cli.points)?;
    let total = points.len();
    loader::fill_tree(&mut tree, points);
    let elapsed = start.elapsed();
    println!(
        "Indexed {} of {total} points in {}",
        tree.len(),
        pretty_duration(&elapsed, None)
    );
    log::debug!("Tree shape: {:?}", tree.stats());

    match cli.command {
        Command::Nearest {
            lat,
            lon,
            max_distance,
        } => {
            let found = tree.nearest_entry(lat, lon, max_distance.unwrap_or(f64::INFINITY));
            match found {
                Some(entry) => println!("{entry}"),
                None => println!("No point found"),
            }
        }
        Command::Range {
            north,
            west,
            south,
            east,
        } => {
            let found = tree.range(north, west, south, east);
            for label in &found {
                println!("{label}");
            }
            println!("{} points in range", found.len());
        }
        Command::Radius { lat, lon, km } => {
            let found = tree.within_radius(lat, lon, Length::new::<kilometer>(km));
            for entry in &found {
                println!("{entry}");
            }
            println!("{} points within {km}km", found.len());
        }
        Command::Batch { queries } => {
            let queries = loader::load_points(queries)?;
            let start = Instant::now();
            let answers: Vec<Option<&String>> = queries
                .par_iter()
                .map(|q| tree.nearest(q.lat, q.lon))
                .collect();
            let elapsed = start.elapsed();
            for (query, answer) in queries.iter().zip(answers) {
                match answer {
                    Some(label) => println!("{} -> {label}", query.label),
                    None => println!("{} -> none", query.label),
                }
            }
            println!(
                "Answered {} queries in {}",
                queries.len(),
                pretty_duration(&elapsed, None)
            );
        }
    }
    Ok(())
}
