use anyhow::{bail, Context, Result};
use clap::Parser;
use lbpface::{Image, PipelineConfig, Recognizer, RuntimeConfig};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Manifest of training faces, one `path<separator>label` entry per line.
    /// Relative image paths are opened from the current directory.
    #[arg(short, long)]
    manifest: PathBuf,

    /// Separator between image path and label in the manifest
    #[arg(short, long, default_value = ";")]
    separator: String,

    /// Face images to recognize after training
    #[arg(short, long, num_args = 1..)]
    query: Vec<PathBuf>,

    /// Sampling radius of the local binary pattern
    #[arg(long, default_value_t = 1)]
    radius: usize,

    /// Sample points per pixel
    #[arg(long, default_value_t = 8)]
    neighbours: usize,

    /// Histogram cells across
    #[arg(long, default_value_t = 8)]
    grid_x: usize,

    /// Histogram cells down
    #[arg(long, default_value_t = 8)]
    grid_y: usize,

    /// Canonical face size in pixels (square)
    #[arg(long, default_value_t = 80)]
    face_size: u32,

    /// Worker threads for feature extraction (0 = one per core)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
}

/// Reads `path<separator>label` lines, skipping blank and incomplete entries.
fn read_manifest(path: &Path, separator: &str) -> Result<Vec<(PathBuf, String)>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let mut entries = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(separator) {
            Some((file, label)) if !file.trim().is_empty() && !label.trim().is_empty() => {
                entries.push((PathBuf::from(file.trim()), label.trim().to_string()));
            }
            _ => warn!("Skipping incomplete manifest line {}: {}", line_no + 1, line),
        }
    }
    Ok(entries)
}

fn load_face(path: &Path) -> Result<Image> {
    let gray = image::open(path)
        .with_context(|| format!("Failed to load image {}", path.display()))?
        .into_luma8();
    Ok(Image::from(gray))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Starting Face Recognition Demo ===");

    let entries = read_manifest(&args.manifest, &args.separator)?;
    if entries.is_empty() {
        bail!("Manifest {} contains no training entries", args.manifest.display());
    }
    info!("Loading {} training faces...", entries.len());

    let mut samples = Vec::with_capacity(entries.len());
    for (path, label) in entries {
        samples.push((load_face(&path)?, label));
    }

    let config = PipelineConfig {
        radius: args.radius,
        neighbours: args.neighbours,
        grid_x: args.grid_x,
        grid_y: args.grid_y,
        face_width: args.face_size,
        face_height: args.face_size,
    };

    let start_time = Instant::now();
    info!("Training recognizer...");
    let recognizer = Recognizer::builder()
        .with_config(config)
        .with_runtime_config(RuntimeConfig {
            worker_threads: args.threads,
        })
        .add_samples(samples)?
        .build()?;

    let build_time = start_time.elapsed();
    let summary = recognizer.info();
    info!("=== Recognizer Trained (took {:.2?}) ===", build_time);
    println!(
        "Trained on {} identities ({} features, C = {})",
        summary.num_classes, summary.feature_dimension, summary.regularization
    );

    let classify_start = Instant::now();
    for (i, path) in args.query.iter().enumerate() {
        info!("Query {}/{}: {}", i + 1, args.query.len(), path.display());
        let face = load_face(path)?;
        match recognizer.predict(&face) {
            Ok(label) => println!("{}: {}", path.display(), label),
            Err(e) => eprintln!("{}: error: {}", path.display(), e),
        }
    }

    if !args.query.is_empty() {
        let classify_time = classify_start.elapsed();
        info!("Classification time: {:.2?}", classify_time);
        info!(
            "Average time per query: {:.2?}",
            classify_time / args.query.len() as u32
        );
    }
    info!("Total time: {:.2?}", start_time.elapsed());

    Ok(())
}
