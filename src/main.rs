use clap::{Parser, Subcommand};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use track_poster::config::{self, Config};
use track_poster::layout::LayoutKind;
use track_poster::loader::{LoadOutcome, TrackLoader};
use track_poster::output;
use track_poster::poster::{Poster, PosterError};
use track_poster::source::{ActivityDatabase, Geometry, GpxDirectory, TrackSource};

const DEFAULT_GPX_DIR: &str = "GPX_OUT";

#[derive(Parser)]
#[command(name = "track-poster")]
#[command(about = "Render GPS tracks into SVG posters")]
#[command(long_about = "\
Render GPS tracks into SVG posters

Tracks come from a directory of GPX files (--gpx-dir) or from the
`activities` table of an activity database (--from-db). Three layouts:

  grid       one mini-map per track, chronological, with a statistics footer
  circular   every track as a distance-over-time curve around one center;
             one poster per year unless --whole-set is given
  github     calendar heatmap, one band per year

Settings are layered: stock defaults, then the file given with --config,
then command-line flags.

Run 'track-poster gen-config' to generate a documented poster.toml.")]
#[command(version)]
struct Cli {
    /// poster.toml layered over the stock defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also append the log to this file
    #[arg(long, global = true, value_name = "FILE")]
    logfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Where tracks come from and which ones are kept.
#[derive(clap::Args, Clone)]
struct LoadArgs {
    /// Directory of GPX files [default: GPX_OUT]
    #[arg(long, value_name = "DIR", conflicts_with = "from_db")]
    gpx_dir: Option<PathBuf>,

    /// Activity database instead of GPX files
    #[arg(long, value_name = "FILE")]
    from_db: Option<PathBuf>,

    /// "all", a year ("2023") or a range ("2020-2023")
    #[arg(long)]
    year: Option<String>,

    /// Drop tracks shorter than this (km)
    #[arg(long, value_name = "KM")]
    min_distance: Option<f64>,

    /// Highlight this track (file name or run id); repeatable
    #[arg(long = "special", value_name = "NAME")]
    special: Vec<String>,

    /// Use local wall-clock time instead of UTC
    #[arg(long)]
    use_localtime: bool,
}

/// How the poster looks and where it goes.
#[derive(clap::Args, Clone)]
struct PosterArgs {
    /// Layout
    #[arg(long = "type", value_enum)]
    layout: Option<LayoutKind>,

    /// Output file
    #[arg(long, default_value = "poster.svg")]
    output: PathBuf,

    /// Directory for per-year posters [default: directory of --output]
    #[arg(long, value_name = "DIR")]
    year_dir: Option<PathBuf>,

    /// Poster title
    #[arg(long)]
    title: Option<String>,

    /// Athlete name shown in the footer
    #[arg(long)]
    athlete: Option<String>,

    /// Label language: "en" or "zh_CN"
    #[arg(long)]
    language: Option<String>,

    /// "metric" or "imperial"
    #[arg(long)]
    units: Option<String>,

    #[arg(long, value_name = "COLOR")]
    background_color: Option<String>,

    #[arg(long, value_name = "COLOR")]
    track_color: Option<String>,

    /// Second track color, enables the length gradient
    #[arg(long, value_name = "COLOR")]
    track_color2: Option<String>,

    #[arg(long, value_name = "COLOR")]
    special_color: Option<String>,

    #[arg(long, value_name = "COLOR")]
    special_color2: Option<String>,

    #[arg(long, value_name = "COLOR")]
    text_color: Option<String>,

    /// Special tracks at least this long use the special color (km)
    #[arg(long, value_name = "KM")]
    special_distance: Option<f64>,

    /// Special tracks at least this long use the second special color (km)
    #[arg(long, value_name = "KM")]
    special_distance2: Option<f64>,

    /// Circular layout: one poster for the whole set instead of one per year
    #[arg(long)]
    whole_set: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Load tracks and write the poster
    Draw {
        #[command(flatten)]
        load: LoadArgs,
        #[command(flatten)]
        poster: PosterArgs,
    },
    /// Load tracks and list them without drawing
    Check {
        #[command(flatten)]
        load: LoadArgs,
        /// Also write the loaded track list as JSON
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,
    },
    /// Print a stock poster.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.logfile.as_deref())?;

    match cli.command {
        Command::Draw { load, poster } => {
            let overlay = cli_overlay(&load, Some(&poster));
            let config = config::load_config(cli.config.as_deref(), overlay)?;
            init_thread_pool(&config.loading);

            let geometry = if config.poster.layout.needs_geometry() {
                Geometry::Full
            } else {
                Geometry::SummaryOnly
            };
            let outcome = load_tracks(&config, &load, geometry)?;
            if cli.verbose {
                output::print_load_output(&outcome, config.poster.units, true);
            } else {
                println!("{}", output::format_load_summary(&outcome));
            }

            let painter = Poster::new(&config.poster);
            if painter.is_per_year() {
                let dir = poster.year_dir.clone().unwrap_or_else(|| parent_dir(&poster.output));
                match painter.write_yearly(&outcome.tracks, &dir) {
                    Ok(outputs) => {
                        output::print_yearly_output(&outputs);
                        let failed = outputs.iter().filter(|o| o.result.is_err()).count();
                        if failed > 0 {
                            return Err(format!(
                                "{failed} of {} yearly posters failed",
                                outputs.len()
                            )
                            .into());
                        }
                    }
                    Err(PosterError::NoTracks) => println!("No tracks to draw, nothing written."),
                    Err(e) => return Err(e.into()),
                }
            } else {
                match painter.write(&outcome.tracks, &poster.output) {
                    Ok(path) => {
                        output::print_single_output(painter.kind(), &path, outcome.tracks.len())
                    }
                    Err(PosterError::NoTracks) => println!("No tracks to draw, nothing written."),
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Command::Check { load, manifest } => {
            let overlay = cli_overlay(&load, None);
            let config = config::load_config(cli.config.as_deref(), overlay)?;
            init_thread_pool(&config.loading);

            let geometry = if load.from_db.is_some() && !config.poster.layout.needs_geometry() {
                Geometry::SummaryOnly
            } else {
                Geometry::Full
            };
            let outcome = load_tracks(&config, &load, geometry)?;
            output::print_load_output(&outcome, config.poster.units, cli.verbose);
            if let Some(path) = manifest {
                let json = serde_json::to_string_pretty(&outcome)?;
                std::fs::write(&path, json)?;
                println!("Manifest: {}", path.display());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `--verbose` logs at info, otherwise only warnings. `RUST_LOG` wins.
/// With `--logfile` the same events are appended to that file without color.
fn init_tracing(verbose: bool, logfile: Option<&Path>) -> std::io::Result<()> {
    let default = if verbose { "info" } else { "warn" };
    let file_layer = match logfile {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log(path)?))
                .with_ansi(false)
                .with_target(false),
        ),
        None => None,
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();
    Ok(())
}

/// Open `path` for appending, creating it and its parent directory.
fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the rayon thread pool based on loading config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(loading: &config::LoadConfig) {
    let threads = config::effective_threads(loading);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn load_tracks(
    config: &Config,
    load: &LoadArgs,
    geometry: Geometry,
) -> Result<LoadOutcome, Box<dyn std::error::Error>> {
    let loader = TrackLoader::from_config(&config.loading)?;
    let source: Box<dyn TrackSource> = match &load.from_db {
        Some(db) => Box::new(ActivityDatabase::new(db)),
        None => Box::new(GpxDirectory::new(
            load.gpx_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_GPX_DIR)),
        )),
    };
    println!("==> Loading {}", source.describe());
    Ok(loader.load(source.as_ref(), geometry)?)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Command-line flags as a TOML overlay. Only flags that were given are
/// set, so file values survive. Distances arrive in km and are stored in
/// meters.
fn cli_overlay(load: &LoadArgs, poster: Option<&PosterArgs>) -> toml::Value {
    let mut root = toml::Table::new();

    let mut loading = toml::Table::new();
    if let Some(year) = &load.year {
        loading.insert("year".into(), year.clone().into());
    }
    if let Some(km) = load.min_distance {
        loading.insert("min_distance".into(), (km * 1000.0).into());
    }
    if !load.special.is_empty() {
        let names: Vec<toml::Value> = load.special.iter().cloned().map(Into::into).collect();
        loading.insert("special".into(), names.into());
    }
    if load.use_localtime {
        loading.insert("time_zone".into(), "local".into());
    }
    root.insert("loading".into(), loading.into());

    if let Some(args) = poster {
        root.insert("poster".into(), poster_overlay(args).into());
    }
    toml::Value::Table(root)
}

fn poster_overlay(args: &PosterArgs) -> toml::Table {
    let mut poster = toml::Table::new();
    if let Some(layout) = args.layout {
        let name = match layout {
            LayoutKind::Grid => "grid",
            LayoutKind::Circular => "circular",
            LayoutKind::Github => "github",
        };
        poster.insert("layout".into(), name.into());
    }
    for (key, value) in [
        ("title", &args.title),
        ("athlete", &args.athlete),
        ("language", &args.language),
        ("units", &args.units),
    ] {
        if let Some(value) = value {
            poster.insert(key.into(), value.clone().into());
        }
    }
    for (key, km) in [
        ("special_distance", args.special_distance),
        ("special_distance2", args.special_distance2),
    ] {
        if let Some(km) = km {
            poster.insert(key.into(), (km * 1000.0).into());
        }
    }
    if args.whole_set {
        let mut circular = toml::Table::new();
        circular.insert("per_year".into(), false.into());
        poster.insert("circular".into(), circular.into());
    }

    let mut colors = toml::Table::new();
    for (key, value) in [
        ("background", &args.background_color),
        ("track", &args.track_color),
        ("track2", &args.track_color2),
        ("special", &args.special_color),
        ("special2", &args.special_color2),
        ("text", &args.text_color),
    ] {
        if let Some(value) = value {
            colors.insert(key.into(), value.clone().into());
        }
    }
    poster.insert("colors".into(), colors.into());
    poster
}
