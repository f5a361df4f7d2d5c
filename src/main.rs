use clap::{Parser, Subcommand};
use simple_augment::config::{self, AugmentConfig, ConfigError, MirrorPolicy};
use simple_augment::{output, process, scan};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn version_string() -> &'static str {
    let on_tag = env!("AUGMENT_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("AUGMENT_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-augment")]
#[command(about = "Enlarge an image training set with randomized augmentations")]
#[command(long_about = "\
Enlarge an image training set with randomized augmentations

Every image in the source directory gets N variants, each a random mix of
translation, rotation, wave-warp, blur, brightness and contrast, plus a
horizontally mirrored copy of each variant:

  Train/                 Export/
  ├── cat.png      →     ├── cat_0.png   cat_0_mirrored.png
  └── dog.jpg            ├── ...
                         ├── cat_4.png   cat_4_mirrored.png
                         └── dog_0.jpg   dog_0_mirrored.jpg ...

Runs are reproducible: the seed is printed at the end and can be passed back
with --seed.

Settings are read from ./augment.toml (or --config FILE) when present.
Run 'simple-augment gen-config' to generate a documented augment.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Input directory
    #[arg(long, default_value = "Train", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "Export", global = true)]
    output: PathBuf,

    /// Config file (defaults to ./augment.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Input discovery flags shared by `run` and `check`.
#[derive(clap::Args, Clone)]
struct ScanArgs {
    /// Descend into sub-directories, mirroring them in the output
    #[arg(long)]
    recursive: bool,
}

#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Variants generated per source image
    #[arg(long)]
    variants: Option<usize>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Mirrored copies: one per variant, one per original, or none
    #[arg(long, value_enum)]
    mirror: Option<MirrorPolicy>,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Scan, augment and write every image
    Run(RunArgs),
    /// List the images that would be processed, without writing anything
    Check(ScanArgs),
    /// Print a stock augment.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Run(args) => {
            let mut config = config::load_config(cli.config.as_deref(), Path::new("."))?;
            apply_run_overrides(&mut config, args)?;
            init_thread_pool(&config.processing);

            println!("==> Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source, &config.scan, Some(cli.output.as_path()))?;
            if manifest.images.is_empty() {
                log::warn!("No images found in {}", cli.source.display());
            }

            let seed = process::run_seed(config.variants.seed);
            log::info!("Run seed: {seed}");
            let process_config = process::ProcessConfig::from_config(&config, seed);

            println!(
                "==> Augmenting {} images → {} ({} variants each)",
                manifest.images.len(),
                cli.output.display(),
                config.variants.count
            );
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = process::process(&manifest, &cli.output, &process_config, Some(tx))?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            println!();
            output::print_summary(&report);

            if let Some(path) = &args.report {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(path, json)?;
                log::info!("Report written to {}", path.display());
            }

            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Check(scan_args) => {
            let mut config = config::load_config(cli.config.as_deref(), Path::new("."))?;
            config.scan.recursive |= scan_args.recursive;
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source, &config.scan, Some(cli.output.as_path()))?;
            output::print_scan_output(&manifest);
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Default filter `warn`, raised by `-v`; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Layer CLI flags over the loaded config, then re-validate.
fn apply_run_overrides(config: &mut AugmentConfig, args: &RunArgs) -> Result<(), ConfigError> {
    if let Some(count) = args.variants {
        config.variants.count = count;
    }
    if let Some(seed) = args.seed {
        config.variants.seed = Some(seed);
    }
    if let Some(mirror) = args.mirror {
        config.variants.mirror = mirror;
    }
    config.scan.recursive |= args.scan.recursive;
    config.validate()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. User can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
