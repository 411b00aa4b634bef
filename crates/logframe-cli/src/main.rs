#![deny(unsafe_code)]

//! logframe CLI: scan documents for indicators and render reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use logframe_config::AppConfig;
use logframe_core::{
    CancelToken, Catalog, ChannelProgress, Document, ExtractorRegistry, FilterOptions, IndicatorExtractor,
    IndicatorFilter, IndicatorSelection, IndicatorView, LevelId, MemoryCatalog, ReportService, ScanOptions,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// logframe: find logframe indicators in project documents.
#[derive(Parser)]
#[command(name = "logframe", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "logframe.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a document and print the matched indicators as JSON.
    Scan {
        /// Document to scan (.docx or .txt).
        file: PathBuf,

        /// Catalog file, overriding `catalog.path`.
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Render a report from a JSON selection of indicators.
    Export {
        /// Report to produce.
        #[arg(value_enum)]
        kind: ReportKind,

        /// JSON array of `{"id": .., "value": .., "date": ..}`.
        #[arg(long)]
        selection: PathBuf,

        /// Where to write the rendered artifact.
        #[arg(short, long)]
        output: PathBuf,

        /// Catalog file, overriding `catalog.path`.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Import indicators from a flat worksheet into a catalog.
    Import {
        /// Worksheet written by `export worksheet` or by hand.
        worksheet: PathBuf,

        /// Where to write the extended catalog.
        #[arg(short, long)]
        output: PathBuf,

        /// Catalog file, overriding `catalog.path`.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List the values available to scan filters.
    Filters {
        /// Catalog file, overriding `catalog.path`.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Indicator filter flags; each may be repeated.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long = "theme")]
    themes: Vec<String>,

    #[arg(long = "source")]
    sources: Vec<String>,

    /// Level id.
    #[arg(long = "level")]
    levels: Vec<u64>,

    #[arg(long = "sdg")]
    sdg_codes: Vec<String>,

    #[arg(long = "crs")]
    crs_codes: Vec<String>,
}

impl FilterArgs {
    fn into_filter(self) -> IndicatorFilter {
        IndicatorFilter {
            themes: self.themes,
            sources: self.sources,
            levels: self.levels.into_iter().map(LevelId).collect(),
            sdg_codes: self.sdg_codes,
            crs_codes: self.crs_codes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    Narrative,
    Donor,
    Worksheet,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    // -v wins over the configured level; RUST_LOG wins over both
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
    if !cli.config.exists() {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Scan {
            file,
            catalog,
            filter,
        } => cmd_scan(&config, &file, catalog.as_deref(), filter.into_filter()).await?,
        Commands::Export {
            kind,
            selection,
            output,
            catalog,
        } => cmd_export(&config, kind, &selection, &output, catalog.as_deref()).await?,
        Commands::Import {
            worksheet,
            output,
            catalog,
        } => cmd_import(&config, &worksheet, &output, catalog.as_deref()).await?,
        Commands::Filters { catalog } => cmd_filters(&config, catalog.as_deref()).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

async fn cmd_scan(config: &AppConfig, file: &Path, catalog: Option<&Path>, filter: IndicatorFilter) -> Result<()> {
    let catalog = open_catalog(config, catalog).await?;
    let views = scan_document(config, Arc::new(catalog), file, filter).await?;
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

/// Run the extraction on a blocking thread, logging progress and
/// cancelling on Ctrl-C.
async fn scan_document(
    config: &AppConfig,
    catalog: Arc<dyn Catalog>,
    file: &Path,
    filter: IndicatorFilter,
) -> Result<Vec<IndicatorView>> {
    let document = Document::open(file).await?;
    let extractor = IndicatorExtractor::new(catalog, ExtractorRegistry::default(), ScanOptions::from(&config.scan));
    let (sink, mut progress) = ChannelProgress::channel(config.scan.progress_buffer);
    let cancel = CancelToken::new();

    info!(file = %file.display(), "Scanning document");
    let task = tokio::task::spawn_blocking({
        let cancel = cancel.clone();
        move || extractor.extract_indicators(&document, &filter, &sink, &cancel)
    });

    tokio::select! {
        _ = async {
            while let Some(percent) = progress.recv().await {
                info!(percent, "Scan progress");
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling scan");
            cancel.cancel();
        }
    }

    let views = task.await??;
    info!(matched = views.len(), "Scan complete");
    Ok(views)
}

async fn cmd_export(
    config: &AppConfig,
    kind: ReportKind,
    selection: &Path,
    output: &Path,
    catalog: Option<&Path>,
) -> Result<()> {
    let content = tokio::fs::read_to_string(selection)
        .await
        .with_context(|| format!("reading selection {}", selection.display()))?;
    let selection: Vec<IndicatorSelection> =
        serde_json::from_str(&content).context("parsing selection")?;

    let catalog = open_catalog(config, catalog).await?;
    let service = ReportService::from_config(Arc::new(catalog), config);
    let bytes = match kind {
        ReportKind::Narrative => service.narrative_report(&selection).await?,
        ReportKind::Donor => service.donor_report(&selection).await?,
        ReportKind::Worksheet => service.worksheet(&selection)?,
    };

    tokio::fs::write(output, &bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    info!(?kind, output = %output.display(), bytes = bytes.len(), "Report written");
    Ok(())
}

async fn cmd_import(config: &AppConfig, worksheet: &Path, output: &Path, catalog: Option<&Path>) -> Result<()> {
    let bytes = tokio::fs::read(worksheet)
        .await
        .with_context(|| format!("reading worksheet {}", worksheet.display()))?;

    let mut catalog = open_catalog(config, catalog).await?;
    let service = ReportService::from_config(Arc::new(catalog.clone()), config);
    let imported = service.import_worksheet(&bytes, catalog.next_indicator_id()?)?;
    let count = imported.len();
    catalog.extend(imported)?;

    catalog.save(output).await?;
    info!(imported = count, output = %output.display(), "Catalog written");
    Ok(())
}

async fn cmd_filters(config: &AppConfig, catalog: Option<&Path>) -> Result<()> {
    let catalog = open_catalog(config, catalog).await?;
    let options = FilterOptions::collect(&catalog)?;
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path).await.map_err(|e| anyhow::anyhow!(e))
    } else {
        Ok(AppConfig::default())
    }
}

async fn open_catalog(config: &AppConfig, path: Option<&Path>) -> Result<MemoryCatalog> {
    let path = path.unwrap_or_else(|| Path::new(&config.catalog.path));
    MemoryCatalog::load(path)
        .await
        .with_context(|| format!("loading catalog {}", path.display()))
}
