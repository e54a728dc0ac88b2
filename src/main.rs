//! EyeCheck v0.3 - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use eyecheck::{
    assets::AssetProvisioner,
    cli::{render, Args, Commands},
    conditions,
    config::BackendKind,
    Config, EyeAnalyzer, ImageSource,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match &args.command {
        Commands::Analyze { image, backend, json } => {
            run_analysis(config, image.clone(), *backend, *json).await?;
        }
        Commands::Conditions => {
            print!("{}", render::conditions_table(conditions::all()));
            println!();
        }
        Commands::Provision => {
            provision(&config).await?;
        }
        Commands::Config => {
            show_config(&args, &config)?;
        }
    }

    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity().log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_analysis(
    mut config: Config,
    image: std::path::PathBuf,
    backend: Option<BackendKind>,
    json: bool,
) -> Result<()> {
    if let Some(backend) = backend {
        config.analysis.backend = backend;
    }

    let analyzer = EyeAnalyzer::from_config(&config)?;
    let outcome = analyzer.analyze(ImageSource::Path(image)).await;
    analyzer.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render::outcome_report(&outcome));
        println!();
    }

    // Fallback data is still printed, but the exit status reports the failure.
    if outcome.is_fallback() {
        std::process::exit(2);
    }

    Ok(())
}

async fn provision(config: &Config) -> Result<()> {
    let provisioner = AssetProvisioner::from_config(&config.model);
    let provisioned = provisioner
        .ensure()
        .await
        .context("Failed to provision model assets")?;

    if provisioned.copied.is_empty() {
        println!("{} Assets already present in {:?}", "✓".green(), provisioned.dir);
    } else {
        for file in &provisioned.copied {
            println!("{} Copied {}", "✓".green(), file);
        }
        println!("\nAssets ready in {:?}", provisioned.dir);
    }

    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    println!("\n{}", "EyeCheck Configuration".bold().cyan());

    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    println!("  File: {:?}\n", path);

    println!("Model:");
    println!("  Bundle dir: {:?}", config.model.bundle_dir);
    println!("  Cache dir:  {:?}", config.model.cache_dir);
    println!("  Weights:    {}", config.model.weights.join(", "));
    println!("  Lazy load:  {}", if config.model.lazy_load { "enabled" } else { "disabled" });
    println!();

    println!("Vision service:");
    println!("  Endpoint:   {}", config.vision.endpoint);
    println!(
        "  API key:    {}",
        if config.vision.resolved_api_key().is_some() { "set" } else { "not set" }
    );
    println!("  Max labels: {}", config.vision.max_labels);
    println!("  Max colors: {}", config.vision.max_colors);
    println!();

    println!("Analysis:");
    println!("  Backend:    {:?}", config.analysis.backend);
    println!("  Timeout:    {}s", config.analysis.timeout_secs);
    println!("  Verbosity:  {}", args.verbosity().as_str());
    println!();

    Ok(())
}
