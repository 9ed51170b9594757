//! Brick Forge - Entry Point
//!
//! Generates brick structures from text captions. Captions come from
//! `--caption` flags, each run as its own task, or from an interactive prompt
//! when no caption is given.

use brick_forge::core::config::{GenerationConfig, InstructionFormat};
use brick_forge::core::error::{BrickError, Result};
use brick_forge::generation::{BrickGenerator, GenerationOutput, RejectionTally};
use brick_forge::llm::{LlmClient, LlmSession, SamplingParams};
use brick_forge::stability::ConnectivityOracle;
use brick_forge::structure::{BrickLibrary, Placement, VoxelStructure};
use brick_forge::validation::StructureReport;

use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "brick-forge")]
#[command(about = "Generate stable brick structures from text captions")]
struct Args {
    /// Caption to generate a structure for (repeatable; omit for interactive mode)
    #[arg(long, short = 'c')]
    caption: Vec<String>,

    /// Generation config (TOML); missing keys use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Brick library (JSON); defaults to the built-in table
    #[arg(long)]
    library: Option<PathBuf>,

    /// Partial structure to continue from (.json structured, otherwise text)
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    #[arg(long)]
    max_bricks: Option<usize>,

    #[arg(long)]
    max_brick_rejections: Option<usize>,

    #[arg(long)]
    max_regenerations: Option<usize>,

    #[arg(long)]
    temperature: Option<f32>,

    /// Use the zero-shot instruction template
    #[arg(long)]
    zero_shot: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct CaptionReport<'a> {
    caption: &'a str,
    stable: bool,
    n_regenerations: usize,
    stop: String,
    rejection_reasons: &'a RejectionTally,
    validation: &'a StructureReport,
    structure: serde_json::Value,
    bricks: Vec<Placement>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("brick_forge=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let library = Arc::new(match &args.library {
        Some(path) => BrickLibrary::load(path)?,
        None => BrickLibrary::standard(),
    });
    let seed = match &args.seed_file {
        Some(path) => load_seed(path, &library, config.world_dim)?,
        None => VoxelStructure::new(config.world_dim),
    };

    let client = LlmClient::from_env()?.with_sampling(SamplingParams::from_config(&config));
    tracing::info!(model = client.model(), bricks = library.len(), "Brick Forge starting");

    let rt = Runtime::new()?;

    if args.caption.is_empty() {
        return interactive(&rt, &args, config, library, client, seed);
    }

    let outputs = rt.block_on(async {
        let mut handles = Vec::with_capacity(args.caption.len());
        for caption in &args.caption {
            let mut generator = BrickGenerator::new(
                config.clone(),
                Arc::clone(&library),
                LlmSession::new(client.clone()),
                ConnectivityOracle::new(),
            )?;
            let caption = caption.clone();
            let seed = seed.clone();
            handles.push(tokio::spawn(async move {
                generator.generate_from(&caption, seed).await
            }));
        }

        let mut outputs = Vec::with_capacity(handles.len());
        for handle in handles {
            outputs.push(handle.await.map_err(io::Error::other)?);
        }
        Ok::<_, BrickError>(outputs)
    })?;

    for (caption, output) in args.caption.iter().zip(outputs) {
        match output {
            Ok(output) => print_output(&args.format, caption, &output, &library)?,
            Err(e) => eprintln!("Generation failed for {:?}: {}", caption, e),
        }
    }
    Ok(())
}

/// Prompt for captions until `quit`
fn interactive(
    rt: &Runtime,
    args: &Args,
    config: GenerationConfig,
    library: Arc<BrickLibrary>,
    client: LlmClient,
    seed: VoxelStructure,
) -> Result<()> {
    let mut generator = BrickGenerator::new(
        config,
        Arc::clone(&library),
        LlmSession::new(client),
        ConnectivityOracle::new(),
    )?;

    println!("\n=== BRICK FORGE ===");
    println!("Enter a caption to generate a structure, or quit / q to exit.");
    println!();

    loop {
        print!("caption> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let caption = input.trim();

        if caption.is_empty() {
            continue;
        }
        if caption == "quit" || caption == "q" {
            break;
        }

        match rt.block_on(generator.generate_from(caption, seed.clone())) {
            Ok(output) => print_output(&args.format, caption, &output, &library)?,
            Err(e) => println!("Generation failed: {}", e),
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };

    if let Some(n) = args.max_bricks {
        config.max_bricks = n;
    }
    if let Some(n) = args.max_brick_rejections {
        config.max_brick_rejections = n;
    }
    if let Some(n) = args.max_regenerations {
        config.max_regenerations = n;
    }
    if let Some(t) = args.temperature {
        config.temperature = t;
    }
    if args.zero_shot {
        config.instruction_format = InstructionFormat::ZeroShot;
    }

    config.validate()?;
    Ok(config)
}

fn load_seed(path: &Path, library: &BrickLibrary, world_dim: usize) -> Result<VoxelStructure> {
    let content = std::fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        VoxelStructure::from_json_str(&content, library, world_dim)
    } else {
        VoxelStructure::from_txt(&content, library, world_dim)
    }
}

fn print_output(format: &str, caption: &str, output: &GenerationOutput, library: &BrickLibrary) -> Result<()> {
    if format == "json" {
        let report = CaptionReport {
            caption,
            stable: output.stable,
            n_regenerations: output.regenerations,
            stop: output.stop.to_string(),
            rejection_reasons: &output.rejections,
            validation: &output.report,
            structure: output.structure.to_json()?,
            bricks: output.structure.placements(library),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== {} ===", caption);
    print!("{}", output.structure.to_txt());
    println!(
        "-- {} bricks, {}, {} regenerations, stopped on {}",
        output.structure.len(),
        if output.stable { "stable" } else { "UNSTABLE" },
        output.regenerations,
        output.stop
    );
    println!("-- rejections: {}", output.rejections);
    if !output.report.is_valid {
        println!(
            "-- invalid: collisions {}, out of bounds {:?}, floating {:?}",
            output.report.has_collisions, output.report.out_of_bounds, output.report.floating
        );
    }
    Ok(())
}
