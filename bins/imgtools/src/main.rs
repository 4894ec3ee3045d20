//! imgtools: batch image conversion with planned super-resolution upscaling.

use anyhow::Result;
use clap::{Parser, Subcommand};
use imgtools_cli::output::{
    format_count, format_dimensions, format_duration, format_scales, print_error, Status,
};
use imgtools_cli::{logging, progress};
use imgtools_core::config::Config;
use imgtools_core::error::exit_codes;
use imgtools_core::file_scanner::collect_images;
use imgtools_core::validation::{validate_model, validate_output_formats};
use imgtools_core::{Error, ErrorCode, ResultExt};
use imgtools_image::{
    compute_plan, process_batch, BatchReport, ImageSize, ModelCatalog, PipelineConfig,
    ResampleUpscaler, ScaleStrategy, UpscalePlan,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "imgtools")]
#[command(about = "Batch image conversion with planned super-resolution upscaling")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image, or every image of a directory, to all output formats
    Run {
        /// Source image or directory
        source: PathBuf,

        /// Output directory, instead of output.path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads, one per core by default
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the upscale plan for a source size
    Plan {
        /// Source width in pixels
        #[arg(long)]
        width: u32,

        /// Source height in pixels
        #[arg(long)]
        height: u32,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the model scales available for the configured family
    Scales {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration
    Check {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Self::Run { json, .. } | Self::Plan { json, .. } | Self::Scales { json, .. } => *json,
            Self::Check { .. } => false,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let json = cli.command.json();
    let result = match cli.command {
        Commands::Run {
            source,
            output,
            config,
            jobs,
            json,
        } => run_batch(&source, output, config.as_deref(), jobs, json),
        Commands::Plan {
            width,
            height,
            config,
            json,
        } => run_plan(width, height, config.as_deref(), json),
        Commands::Scales { config, json } => run_scales(config.as_deref(), json),
        Commands::Check { config } => run_check(config.as_deref()),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&err.to_report())?);
            } else {
                print_error(&err);
            }
            err.code.exit_code()
        }
    };

    std::process::exit(code);
}

/// Configuration with the model catalog and strategy it selects.
struct Setup {
    config: Config,
    catalog: ModelCatalog,
    strategy: ScaleStrategy,
}

fn load_setup(config_path: Option<&Path>) -> imgtools_core::Result<Setup> {
    let config = Config::load(config_path)?;
    let catalog = discover_models(&config)?;
    let strategy = catalog.resolve_strategy(&config.schema.model)?;
    debug!(?strategy, "resolved upscale strategy");

    Ok(Setup {
        config,
        catalog,
        strategy,
    })
}

fn discover_models(config: &Config) -> imgtools_core::Result<ModelCatalog> {
    let model_dir = config.model_dir();
    ModelCatalog::discover(&model_dir, config.schema.model.name)
        .map_err(Error::from)
        .context(format!("Reading models from {}", model_dir.display()))
}

fn run_batch(
    source: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    jobs: Option<usize>,
    json: bool,
) -> imgtools_core::Result<i32> {
    let Setup {
        config,
        catalog,
        strategy,
    } = load_setup(config_path)?;

    let files = collect_images(source)?;
    if files.is_empty() && !json {
        Status::warning(&format!("No images found in {}", source.display()));
        return Ok(exit_codes::SUCCESS);
    }

    let output_dir = output.unwrap_or_else(|| config.output_dir());
    std::fs::create_dir_all(&output_dir)
        .map_err(Error::from)
        .context(format!("Creating {}", output_dir.display()))?;

    let pipeline = PipelineConfig::new(config.schema.output.formats, output_dir.clone(), strategy)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()
        .map_err(|e| Error::new(ErrorCode::Internal, format!("Failed to start worker pool: {e}")))?;

    info!(
        images = files.len(),
        threads = pool.current_num_threads(),
        output = %output_dir.display(),
        "starting batch"
    );

    let pb = progress::image_progress(files.len() as u64, json);
    let report = pool.install(|| {
        process_batch(
            &pipeline,
            &files,
            || ResampleUpscaler::from_catalog(&catalog),
            &|outcome| progress::advance(&pb, &file_label(&outcome.path)),
        )
    });

    if report.is_success() {
        progress::finish_success(&pb, "done");
    } else {
        progress::finish_error(&pb, &format!("{} failed", report.failed()));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_batch_summary(&report);
    }

    Ok(if report.is_success() {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn print_batch_summary(report: &BatchReport) {
    for outcome in &report.outcomes {
        if let Some(err) = &outcome.error {
            Status::error(&format!(
                "{}: [{}] {}",
                outcome.path.display(),
                err.code,
                err.message
            ));
        }
        for failure in outcome.report.iter().flat_map(|r| &r.failures) {
            Status::warning(&format!(
                "{}: output format #{} ({}) not written: {}",
                outcome.path.display(),
                failure.format,
                failure.ext,
                failure.error
            ));
        }
    }

    let summary = format!(
        "{} processed, {} written in {}",
        format_count(report.succeeded(), "image", "images"),
        format_count(report.files_written(), "file", "files"),
        format_duration(report.elapsed)
    );
    if report.is_success() {
        Status::success(&summary);
    } else {
        Status::error(&format!("{summary}, {} failed", report.failed()));
    }
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    width: u32,
    height: u32,
    plan: &'a UpscalePlan,
}

fn run_plan(
    width: u32,
    height: u32,
    config_path: Option<&Path>,
    json: bool,
) -> imgtools_core::Result<i32> {
    let setup = load_setup(config_path)?;
    let size = ImageSize::new(height, width)?;
    let plan = compute_plan(size, &setup.config.schema.output.formats, &setup.strategy)?;

    if json {
        let output = PlanOutput {
            width,
            height,
            plan: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_plan(size, &plan);
    }

    Ok(exit_codes::SUCCESS)
}

fn passes(count: u32) -> String {
    format_count(count as usize, "pass", "passes")
}

fn print_plan(size: ImageSize, plan: &UpscalePlan) {
    Status::header(&format!(
        "Plan for {}",
        format_dimensions(size.width, size.height)
    ));

    match plan {
        UpscalePlan::Fixed { model_scale, table } => {
            println!("strategy: fixed x{model_scale}, {}", passes(table.max_upscale));
            for demand in &table.stats {
                println!(
                    "  format #{:<3} x_scale {:<3} served after {}",
                    demand.key,
                    demand.x_scale,
                    passes(demand.nb_upscale)
                );
            }
        }
        UpscalePlan::Auto(auto) => {
            println!(
                "strategy: auto, target x{} for demand x{}",
                auto.target_scale, auto.max_x_scale
            );
            println!("passes:   {}", format_scales(&auto.used_scales));
            for entry in &auto.entries {
                let label = entry
                    .key
                    .map_or_else(|| "checkpoint".to_string(), |k| format!("format #{k}"));
                let pass = if entry.nb_upscale > 0 {
                    format!("x{}", entry.scale)
                } else {
                    "-".to_string()
                };
                println!(
                    "  {label:<11} x_scale {:<3} pass {pass:<4} total x{}",
                    entry.x_scale, entry.actual_scale
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ModelEntry<'a> {
    scale: u32,
    path: &'a Path,
}

#[derive(Serialize)]
struct ScalesOutput<'a> {
    family: &'a str,
    model_dir: PathBuf,
    models: Vec<ModelEntry<'a>>,
}

fn run_scales(config_path: Option<&Path>, json: bool) -> imgtools_core::Result<i32> {
    let config = Config::load(config_path)?;
    let catalog = discover_models(&config)?;
    let family = catalog.family();

    let scales = catalog.available_scales();
    let models: Vec<ModelEntry<'_>> = scales
        .as_slice()
        .iter()
        .filter_map(|&scale| catalog.model_path(scale).map(|path| ModelEntry { scale, path }))
        .collect();

    if json {
        let output = ScalesOutput {
            family: family.as_str(),
            model_dir: config.model_dir(),
            models,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if models.is_empty() {
        Status::warning(&format!(
            "No {family} model found in {}",
            config.model_dir().display()
        ));
    } else {
        Status::header(&format!("{family} models"));
        for model in &models {
            println!("  x{:<3} {}", model.scale, model.path.display());
        }
    }

    Ok(if scales.is_empty() {
        exit_codes::CONFIG_ERROR
    } else {
        exit_codes::SUCCESS
    })
}

fn run_check(config_path: Option<&Path>) -> imgtools_core::Result<i32> {
    let config = Config::load(config_path)?;

    let mut result = validate_model(&config.schema.model);
    result.merge(validate_output_formats(&config.schema.output.formats));
    for warning in result.warnings() {
        Status::warning(&warning.to_string());
    }

    let model_dir = config.model_dir();
    if !model_dir.is_dir() {
        Status::warning(&format!(
            "model directory {} does not exist",
            model_dir.display()
        ));
    }

    let source = config
        .path
        .as_ref()
        .map_or_else(|| "built-in defaults".to_string(), |p| p.display().to_string());
    Status::success(&format!(
        "{source}: {} valid",
        format_count(
            config.schema.output.formats.len(),
            "output format",
            "output formats"
        )
    ));

    Ok(exit_codes::SUCCESS)
}
