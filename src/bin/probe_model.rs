use anyhow::Context;
use clap::Parser;
use gesture_arcade::adapters::EimRunner;
use gesture_arcade::core::features::{features_from_image, fit_shortest};
use gesture_arcade::domain::model::GestureFrame;
use gesture_arcade::utils::logger;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "probe-model")]
#[command(about = "Print an .eim model's parameters and optionally classify a PNG image")]
struct Args {
    /// Path to the Edge Impulse .eim model
    model: PathBuf,

    /// PNG image to classify
    #[arg(long)]
    image: Option<PathBuf>,

    /// Seconds to wait for the model socket
    #[arg(long, default_value = "10")]
    timeout: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    println!("🚀 Probing model {}", args.model.display());

    let mut runner = EimRunner::start(&args.model, Duration::from_secs(args.timeout))
        .await
        .with_context(|| format!("cannot start {}", args.model.display()))?;

    let info = runner.model_info().clone();
    let (width, height) = info.input_size();
    println!("📋 Model Info:");
    println!("  Project: {} / {}", info.project.owner, info.project.name);
    if let Some(version) = info.project.deploy_version {
        println!("  Deploy version: {}", version);
    }
    println!(
        "  Type: {}",
        info.model_parameters.model_type.as_deref().unwrap_or("unknown")
    );
    println!("  Input: {}x{}, {} channel(s)", width, height, info.channels());
    println!("  Labels: {}", info.model_parameters.labels.join(", "));

    let result = match &args.image {
        Some(path) => classify_image(&mut runner, path, width, height, info.channels()).await,
        None => Ok(()),
    };

    runner.stop().await?;
    result
}

async fn classify_image(
    runner: &mut EimRunner,
    path: &Path,
    width: u32,
    height: u32,
    channels: u32,
) -> anyhow::Result<()> {
    let image = image::open(path)
        .with_context(|| format!("cannot read {}", path.display()))?
        .to_rgb8();
    let fitted = fit_shortest(&image, width, height);
    let features = features_from_image(&fitted, channels);

    let response = runner.classify(&features).await?;
    let timing = response.timing.as_ref().map(|t| t.total_ms());
    let frame = GestureFrame::from_result(response.result, timing, Instant::now());

    println!();
    println!("🔍 Classification of {}:", path.display());
    if let Some(ms) = frame.timing_ms {
        println!("  Inference: {:.1}ms", ms);
    }
    if frame.detections.is_empty() {
        println!("  (no detections)");
    }
    for detection in &frame.detections {
        match &detection.bbox {
            Some(b) => println!(
                "  {:<12} {:.2}  x={} y={} w={} h={}",
                detection.label, detection.confidence, b.x, b.y, b.width, b.height
            ),
            None => println!("  {:<12} {:.2}", detection.label, detection.confidence),
        }
    }
    Ok(())
}
