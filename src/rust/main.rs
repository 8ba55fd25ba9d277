use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use spendsort::artifacts::parse_pin;
use spendsort::server::{self, AppState, ServerConfig};
use spendsort::{ArtifactKind, ArtifactManager, ArtifactSource, RuntimeConfig, TransactionClassifier};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory holding the model artifacts
    #[arg(long, env = "SPENDSORT_ARTIFACTS", global = true)]
    artifacts_dir: Option<PathBuf>,

    /// Base URL missing artifacts are downloaded from
    #[arg(long, env = "SPENDSORT_ARTIFACT_URL", global = true)]
    artifact_url: Option<String>,

    /// Pin an artifact to a SHA-256 digest, e.g. encoder.onnx=<hex>. Repeatable
    #[arg(long = "sha256", value_parser = parse_pin, global = true)]
    pins: Vec<(ArtifactKind, String)>,

    /// Force a fresh download of the artifacts
    #[arg(short, long, global = true)]
    fresh: bool,

    #[arg(long, env = "SPENDSORT_HOST", default_value = "0.0.0.0", global = true)]
    host: String,

    #[arg(long, env = "SPENDSORT_PORT", default_value_t = 8000, global = true)]
    port: u16,

    /// HTTP worker threads (0 = one per core)
    #[arg(long, env = "SPENDSORT_WORKERS", default_value_t = 0, global = true)]
    workers: usize,

    /// ONNX Runtime intra-op threads (0 = runtime default)
    #[arg(long, default_value_t = 0, global = true)]
    intra_threads: usize,

    /// ONNX Runtime inter-op threads (0 = runtime default)
    #[arg(long, default_value_t = 0, global = true)]
    inter_threads: usize,

    /// ONNX graph optimization level, 0 (disabled) to 3
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=3), global = true)]
    optimization_level: u8,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Serve the classification API (default)
    Serve,
    /// Download any missing artifacts and exit
    Download,
    /// Classify one or more descriptions and print every category score
    Classify {
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

impl Args {
    fn artifact_manager(&self) -> anyhow::Result<ArtifactManager> {
        let dir = self.artifacts_dir.clone()
            .unwrap_or_else(ArtifactManager::get_default_artifacts_dir);

        let mut source = ArtifactSource {
            base_url: self.artifact_url.clone(),
            ..Default::default()
        };
        for (kind, hash) in &self.pins {
            source = source.with_sha256(*kind, hash.clone());
        }

        let manager = ArtifactManager::new(&dir)
            .with_context(|| format!("Failed to create artifacts directory {:?}", dir))?;
        Ok(manager.with_source(source))
    }

    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::from_parts(self.inter_threads, self.intra_threads, self.optimization_level)
    }
}

async fn ensure_artifacts(args: &Args, manager: &ArtifactManager) -> anyhow::Result<()> {
    if args.fresh {
        info!("Fresh download requested - removing any existing artifacts...");
        manager.remove_downloads()?;
    }

    manager.ensure_present()
        .await
        .context("Model artifacts are not available")
}

fn load_classifier(args: &Args, manager: &ArtifactManager) -> anyhow::Result<TransactionClassifier> {
    let start_time = Instant::now();
    info!("Building classifier...");

    let classifier = TransactionClassifier::builder()
        .with_runtime_config(args.runtime_config())
        .with_artifacts(manager)?
        .build()?;

    info!("Classifier built in {:.2?}", start_time.elapsed());
    Ok(classifier)
}

fn process_input(classifier: &TransactionClassifier, text: &str) -> anyhow::Result<()> {
    let prediction = classifier.predict(text)?;
    let tokens = classifier.count_tokens(text)?;

    let mut scores: Vec<_> = prediction.scores.into_iter().collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    println!("\n{}", text);
    println!("  Tokens used: {}/{}", tokens, classifier.info().max_sequence_length);
    println!("  Predicted category: {} ({:.1}%)", prediction.category, prediction.confidence * 100.0);
    println!("  Scores (sorted):");
    for (label, score) in scores {
        println!("    {}: {:.1}%", label, score * 100.0);
    }

    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    spendsort::init_logger();
    let args = Args::parse();

    let manager = args.artifact_manager()?;
    ensure_artifacts(&args, &manager).await?;

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Download => {
            info!("Artifacts ready in {:?}", manager.artifacts_dir());
        }
        Command::Classify { texts } => {
            let classifier = load_classifier(&args, &manager)?;
            for text in &texts {
                process_input(&classifier, text)?;
            }
        }
        Command::Serve => {
            let classifier = load_classifier(&args, &manager)?;
            let config = ServerConfig {
                host: args.host.clone(),
                port: args.port,
                workers: args.workers,
            };
            server::startup(config, AppState::new(classifier))
                .await
                .context("HTTP server failed")?;
        }
    }

    Ok(())
}
