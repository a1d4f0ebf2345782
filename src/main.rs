use clap::{Parser, Subcommand};
use feature_crop::imaging::{RustBackend, get_dimensions};
use feature_crop::{config, logging, output, process, scan};
use std::path::{Path, PathBuf};

/// Flags for the crop command.
#[derive(clap::Args, Clone)]
struct CropArgs {
    /// Target aspect ratio (width / height); overrides the config file
    #[arg(long)]
    aspect: Option<f64>,

    /// Slide step as a fraction of the free dimension; overrides the config file
    #[arg(long)]
    step: Option<f64>,

    /// Search and report without writing any files
    #[arg(long)]
    dry_run: bool,

    /// Write the batch report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn version_string() -> &'static str {
    let hash = env!("FEATURE_CROP_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "feature-crop")]
#[command(about = "Crop blog feature images to a fixed aspect ratio")]
#[command(long_about = "\
Crop blog feature images to a fixed aspect ratio

Every image whose name starts with feature_ gets a cropped sibling next to
it. The crop keeps the window with the most detail and structure, with a
pull toward the center of the picture.

  content/
  ├── feature-crop.toml            # Optional config
  └── posts/
      ├── feature_sunrise.jpg      # Source
      └── feature_sunrise_crop.jpg # Written by 'feature-crop crop'

Paths containing 'crop' are never used as sources, so re-running is safe.

Run 'feature-crop gen-config' to generate a documented feature-crop.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory to search for feature images
    #[arg(long, default_value = "src/content", global = true)]
    root: PathBuf,

    /// Extra config file, layered over <root>/feature-crop.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the images that would be cropped
    Scan,
    /// Find the best crop for every image and write it
    Crop(CropArgs),
    /// Print a stock feature-crop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose).ok();

    match cli.command {
        Command::Scan => {
            let config = config::load_config(&cli.root, cli.config.as_deref())?;
            let images = scan::scan(&cli.root, &config.discovery)?;
            let backend = RustBackend::new();
            let dimensions: Vec<Option<(u32, u32)>> = images
                .iter()
                .map(|image| get_dimensions(&backend, &image.path).ok())
                .collect();
            output::print_scan_output(&cli.root, &images, &dimensions);
        }
        Command::Crop(args) => {
            let config = load_with_overrides(&cli.root, cli.config.as_deref(), &args)?;
            let images = scan::scan(&cli.root, &config.discovery)?;
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = process::process(&images, &config, args.dry_run, Some(tx));
            printer.join().ok();
            output::print_summary(&report);

            if let Some(path) = &args.report {
                process::write_report(&report, path)?;
                println!("Report: {}", path.display());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the layered config, then apply command-line overrides and validate
/// the result again.
fn load_with_overrides(
    root: &Path,
    explicit: Option<&Path>,
    args: &CropArgs,
) -> Result<config::Config, config::ConfigError> {
    let mut config = config::load_config(root, explicit)?;
    if let Some(aspect) = args.aspect {
        config.crop.aspect_ratio = aspect;
    }
    if let Some(step) = args.step {
        config.crop.step_fraction = step;
    }
    config.validate()?;
    Ok(config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only constrain down.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
