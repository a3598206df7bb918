use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

use tickerscan::evaluation::{self, GroundTruth};
use tickerscan::loader::{load_media, output_stems};
use tickerscan::{OcrsRecognizer, TextRecognizer, ThresholdProfile, TickerReading, build_standard_pipeline};

#[derive(Parser)]
#[command(name = "tickerscan")]
#[command(about = "Clean ticker overlay screenshots and read their symbol")]
struct Cli {
    /// Input images (.jpg, .jpeg or .png)
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON file overriding threshold profile fields
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Re-centre vertically misplaced glyphs (local model profile)
    #[arg(long)]
    centered: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Write cleaned images to this directory
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Skip OCR step (only clean the images)
    #[arg(long)]
    skip_ocr: bool,

    /// JSON file mapping image file names to expected tickers
    #[arg(long, value_name = "FILE")]
    labels: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "tickerscan=debug" } else { "tickerscan=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut profile = match &args.profile {
        Some(path) => ThresholdProfile::from_json_file(path)?,
        None if args.centered => ThresholdProfile::centered(),
        None => ThresholdProfile::default(),
    };
    if args.centered {
        profile.realign_contours = true;
    }

    let mut pipeline = build_standard_pipeline(Arc::new(profile));
    if let Some(debug_dir) = args.debug_out.clone() {
        pipeline = pipeline.with_debug(debug_dir)?;
    }
    if let Some(out_dir) = &args.out {
        std::fs::create_dir_all(out_dir)?;
    }

    // One blocking task per image; runs share nothing but the pipeline
    let pipeline = Arc::new(pipeline);
    let stems = output_stems(&args.images);
    let tasks: Vec<_> = args
        .images
        .iter()
        .cloned()
        .zip(stems)
        .map(|(path, stem)| {
            let pipeline = Arc::clone(&pipeline);
            tokio::task::spawn_blocking(move || {
                // Debug dumps are keyed by the stem of the run name
                let result = pipeline.run(&format!("{}.png", stem), load_media(&path));
                (file_name(&path), stem, result)
            })
        })
        .collect();

    let recognizer = if args.skip_ocr {
        None
    } else {
        Some(OcrsRecognizer::from_cache()?)
    };

    let mut readings = Vec::new();
    let mut failures = 0usize;

    for task in tasks {
        let (name, stem, result) = task.await?;
        let data = match result {
            Ok(data) => data,
            Err(e) => {
                error!(image = %name, "{:#}", e);
                failures += 1;
                continue;
            }
        };

        let summary = format!(
            "branch={} enhanced={} removed={} relocated={}",
            data.get_string("branch").unwrap_or("-"),
            data.get_bool("enhanced").unwrap_or(false),
            data.get_int("contours_removed").unwrap_or(0),
            data.get_int("contours_relocated").unwrap_or(0),
        );
        let cleaned = data.into_binary()?;

        if let Some(out_dir) = &args.out {
            cleaned
                .save(out_dir.join(format!("{}.png", stem)))
                .map_err(|e| anyhow::anyhow!("Failed to save cleaned image: {}", e))?;
        }

        match &recognizer {
            Some(recognizer) => {
                let ticker = recognizer.text_for_image(&cleaned)?;
                println!("{}: {}  ({})", name, ticker.as_deref().unwrap_or("<no text>"), summary);
                readings.push(TickerReading { source: name, ticker });
            }
            None => println!("{}: cleaned {}x{}  ({})", name, cleaned.width(), cleaned.height(), summary),
        }
    }

    if let Some(labels_path) = &args.labels {
        let truth = GroundTruth::from_json_file(labels_path)?;
        let report = evaluation::evaluate(
            &truth,
            readings.iter().map(|r| (r.source.as_str(), r.ticker.as_deref())),
        );

        println!("\n=== Evaluation ===");
        for verdict in &report.verdicts {
            println!(
                "{}: expected {} -- predicted {} -- {}",
                verdict.image,
                verdict.expected,
                verdict.predicted.as_deref().unwrap_or("<no text>"),
                if verdict.is_correct() { "Correct" } else { "Not Correct" }
            );
        }
        for image in &report.unlabelled {
            println!("{}: no label", image);
        }
        println!(
            "Accuracy: {}/{} ({:.1}%)",
            report.correct(),
            report.verdicts.len(),
            report.accuracy() * 100.0
        );
    }

    if failures > 0 {
        anyhow::bail!("{} of {} images could not be processed", failures, args.images.len());
    }

    Ok(())
}
