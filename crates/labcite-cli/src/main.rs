use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use labcite_core::adapter::{SourceAdapter, SourcesAdapter};
use labcite_core::config_file::{self, ConfigFile};
use labcite_core::dedupe::MIN_TITLE_OVERLAP;
use labcite_core::{loader, merge, output as core_output, pipeline, report::RunReport};
use labcite_dblp::{DblpAdapter, ResponseCache};
use labcite_doi::DoiResolver;

mod output;

use output::ColorMode;

/// Compile research-group publication sources into a single citations file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory containing the data files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Output citations file (defaults to <data-dir>/citations.yaml)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a labcite.toml config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Adapters to run, in order (later adapters win identifier merges)
    #[arg(long, value_delimiter = ',')]
    adapters: Vec<String>,

    /// Minimum consecutive-word title overlap for preprint removal
    #[arg(long)]
    min_overlap: Option<usize>,

    /// Contact address appended to the resolver User-Agent
    #[arg(long)]
    mailto: Option<String>,

    /// Directory for the adapter response cache
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Disable the adapter response cache
    #[arg(long)]
    no_cache: bool,

    /// Compile and merge sources without resolving or writing output
    #[arg(long)]
    dry_run: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Resolve configuration: CLI flags > env vars > config file > defaults
    let config = match &cli.config {
        Some(path) => config_file::load_from_path(path).ok_or_else(|| {
            anyhow::anyhow!("could not read config file {}", path.display())
        })?,
        None => config_file::load_config(),
    };

    let data_dir = cli
        .data_dir
        .or_else(|| pipeline_config(&config, |p| p.data_dir.clone()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("_data"));

    let output_path = cli
        .output
        .or_else(|| pipeline_config(&config, |p| p.output.clone()).map(PathBuf::from))
        .unwrap_or_else(|| data_dir.join("citations.yaml"));

    let adapter_names = if !cli.adapters.is_empty() {
        cli.adapters
    } else {
        pipeline_config(&config, |p| p.adapters.clone())
            .unwrap_or_else(|| vec!["dblp".into(), "sources".into()])
    };

    let min_overlap = cli
        .min_overlap
        .or_else(|| config.dedupe.as_ref().and_then(|d| d.min_overlap))
        .unwrap_or(MIN_TITLE_OVERLAP);

    let mailto = cli
        .mailto
        .or_else(|| std::env::var("LABCITE_MAILTO").ok())
        .or_else(|| config.resolver.as_ref().and_then(|r| r.mailto.clone()));

    let cache = build_cache(cli.no_cache, cli.cache_dir, &config);
    let adapters = build_adapters(&adapter_names, cache)?;
    let color = ColorMode(!cli.no_color);

    if cli.dry_run {
        return dry_run(&data_dir, &adapters, color);
    }

    let resolver = DoiResolver::new(mailto.as_deref());
    let mut outcome = pipeline::run(&data_dir, &adapters, &resolver, min_overlap);

    if let Err(err) = core_output::write_citations(&output_path, &outcome.citations) {
        tracing::error!(path = %output_path.display(), error = %err, "failed to write citations");
        outcome
            .report
            .error(format!("failed to write {}: {err}", output_path.display()));
    }

    let mut stdout = std::io::stdout();
    output::print_stats(&mut stdout, &outcome.stats)?;
    output::print_report(&mut stdout, &outcome.report, color)?;

    Ok(exit_code(&outcome.report))
}

/// Compile and merge sources, list them, and skip resolution and output.
fn dry_run(
    data_dir: &std::path::Path,
    adapters: &[Box<dyn SourceAdapter>],
    color: ColorMode,
) -> anyhow::Result<ExitCode> {
    let mut report = RunReport::new();
    let records = loader::load_records(data_dir, adapters, &mut report);
    let records = merge::merge_by_id(records);

    let mut stdout = std::io::stdout();
    output::print_sources(&mut stdout, &records, color)?;
    output::print_report(&mut stdout, &report, color)?;

    Ok(exit_code(&report))
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn pipeline_config<T>(
    config: &ConfigFile,
    get: impl Fn(&config_file::PipelineConfig) -> Option<T>,
) -> Option<T> {
    config.pipeline.as_ref().and_then(get)
}

fn build_cache(
    no_cache: bool,
    cache_dir: Option<PathBuf>,
    config: &ConfigFile,
) -> Option<ResponseCache> {
    if no_cache {
        return None;
    }

    let dir = cache_dir
        .or_else(|| {
            config
                .cache
                .as_ref()
                .and_then(|c| c.dir.clone())
                .map(PathBuf::from)
        })
        .or_else(|| dirs::cache_dir().map(|d| d.join("labcite")))
        .unwrap_or_else(|| PathBuf::from(".labcite-cache"));

    let ttl = config
        .cache
        .as_ref()
        .and_then(|c| c.ttl_secs)
        .map(Duration::from_secs)
        .unwrap_or(labcite_dblp::DEFAULT_TTL);

    Some(ResponseCache::new(dir, ttl))
}

fn build_adapters(
    names: &[String],
    cache: Option<ResponseCache>,
) -> anyhow::Result<Vec<Box<dyn SourceAdapter>>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::with_capacity(names.len());
    for name in names {
        match name.as_str() {
            "sources" => adapters.push(Box::new(SourcesAdapter)),
            "dblp" => adapters.push(Box::new(DblpAdapter::new(cache.clone()))),
            other => anyhow::bail!("unknown adapter \"{other}\" (available: dblp, sources)"),
        }
    }
    Ok(adapters)
}
