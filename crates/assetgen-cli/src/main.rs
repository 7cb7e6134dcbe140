//! assetgen - Generate embedded asset sources and built-in service tables
//!
//! `assetgen embed` turns a manifest of files into `<name>.cpp`/`<name>.hpp`
//! byte arrays; `assetgen services` compiles a services registry into C++
//! or JSON port tables.

use anyhow::{bail, Context, Result};
use assetgen_core::{
    services::DEFAULT_REGISTRY_PATH, Artifact, AssetEntry, EmbedConfig, Manifest, RenderFormat,
    ResourceCompiler, ServiceCompiler,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Generate embedded asset sources and built-in service tables
#[derive(Parser, Debug)]
#[command(name = "assetgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Dry run - render everything but don't write files
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed files as C++ byte arrays
    Embed(EmbedArgs),
    /// Compile a services registry into port tables
    Services(ServicesArgs),
}

#[derive(Args, Debug)]
struct EmbedArgs {
    /// TOML manifest listing the assets to embed
    #[arg(short, long, env = "ASSETGEN_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Asset to embed as PATH=SYMBOL (repeatable, appended after manifest assets)
    #[arg(short, long = "asset", value_name = "PATH=SYMBOL", value_parser = parse_asset)]
    assets: Vec<AssetEntry>,

    /// Output directory (overrides the manifest)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Base name of the generated .cpp/.hpp pair (overrides the manifest)
    #[arg(short, long)]
    name: Option<String>,

    /// Symbol prefix (overrides the manifest)
    #[arg(long)]
    prefix: Option<String>,

    /// Octets per initializer line, 0 for a single line (overrides the manifest)
    #[arg(long)]
    bytes_per_line: Option<usize>,
}

#[derive(Args, Debug)]
struct ServicesArgs {
    /// Services registry to compile
    #[arg(short, long, env = "ASSETGEN_REGISTRY", default_value = DEFAULT_REGISTRY_PATH)]
    registry: PathBuf,

    /// Output file (defaults to BuiltinProtocolDB.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "cpp")]
    format: OutputFormat,
}

/// Output format for the service tables
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// C++ source with GTCPServices/GUDPServices maps
    Cpp,
    /// JSON document with tcp/udp objects
    Json,
}

impl From<OutputFormat> for RenderFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Cpp => RenderFormat::Cpp,
            OutputFormat::Json => RenderFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    match &cli.command {
        Command::Embed(args) => run_embed(args, cli.dry_run),
        Command::Services(args) => run_services(args, cli.dry_run),
    }
}

/// Parse a `PATH=SYMBOL` argument
fn parse_asset(s: &str) -> std::result::Result<AssetEntry, String> {
    let (path, symbol) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected PATH=SYMBOL, got '{}'", s))?;
    if path.is_empty() || symbol.is_empty() {
        return Err(format!("expected PATH=SYMBOL, got '{}'", s));
    }
    Ok(AssetEntry::new(path, symbol))
}

/// Resolved inputs of an embed run
struct EmbedPlan {
    entries: Vec<AssetEntry>,
    output_dir: PathBuf,
    name: String,
    config: EmbedConfig,
}

/// Merge the manifest (if any) with command-line overrides
fn plan_embed(args: &EmbedArgs) -> Result<EmbedPlan> {
    let manifest = match &args.manifest {
        Some(path) => Manifest::load(path)
            .with_context(|| format!("Failed to load manifest: {}", path.display()))?,
        None => Manifest::default(),
    };

    let mut config = manifest.embed_config();
    if let Some(prefix) = &args.prefix {
        config = config.prefix(prefix.clone());
    }
    if let Some(n) = args.bytes_per_line {
        config = config.bytes_per_line(n);
    }

    let mut entries = manifest.assets;
    entries.extend(args.assets.iter().cloned());
    if entries.is_empty() {
        bail!("No assets to embed: pass --manifest or at least one --asset");
    }

    Ok(EmbedPlan {
        entries,
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or(manifest.output.directory),
        name: args.name.clone().unwrap_or(manifest.output.name),
        config,
    })
}

fn run_embed(args: &EmbedArgs, dry_run: bool) -> Result<()> {
    let plan = plan_embed(args)?;

    let output = ResourceCompiler::with_config(plan.config)
        .compile(&plan.name, &plan.entries)
        .with_context(|| format!("Failed to compile {}", plan.name))?;

    if dry_run {
        for artifact in output.artifacts(&plan.output_dir) {
            print_would_write(&artifact);
        }
        return Ok(());
    }

    let written = output
        .write_to(&plan.output_dir)
        .with_context(|| format!("Failed to write artifacts to {}", plan.output_dir.display()))?;
    for path in &written {
        println!("Wrote {}", path.display());
    }

    info!(
        "Summary: {} assets embedded, {} bytes total",
        output.asset_count, output.total_bytes
    );
    Ok(())
}

fn run_services(args: &ServicesArgs, dry_run: bool) -> Result<()> {
    let format = RenderFormat::from(args.format);
    let compiler = ServiceCompiler::new(format);
    let artifact = compiler
        .compile(&args.registry)
        .with_context(|| format!("Failed to compile registry: {}", args.registry.display()))?;

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            DEFAULT_DB_NAME,
            format.renderer().file_extension()
        ))
    });

    let stats = artifact.database.stats();
    info!(
        "Summary: {} TCP, {} UDP, {} duplicates dropped, {} lines skipped",
        artifact.database.tcp().len(),
        artifact.database.udp().len(),
        stats.duplicates,
        stats.unmatched
    );

    if dry_run {
        print_would_write(&Artifact::new(&output, artifact.contents.as_bytes()));
        return Ok(());
    }

    let written = artifact
        .write_to(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {}", written.display());
    Ok(())
}

/// Base name of the service table artifact when `--output` is omitted
const DEFAULT_DB_NAME: &str = "BuiltinProtocolDB";

fn print_would_write(artifact: &Artifact) {
    println!(
        "Would write: {} ({} bytes, {})",
        artifact.path.display(),
        artifact.contents.len(),
        fingerprint(&artifact.contents)
    );
}

/// Short content fingerprint (first 8 chars of blake3)
fn fingerprint(contents: &[u8]) -> String {
    let hash = blake3::hash(contents);
    hash.to_hex()[..8].to_string()
}
