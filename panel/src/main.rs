//! adpanel CLI - build marketing-mix model inputs from advertising exports
//!
//! # Commands
//!
//! ```bash
//! adpanel run --kpi conversions           # Fetch the export and build the panel
//! adpanel replay output/raw_export.csv    # Rebuild from a saved snapshot
//! adpanel fetch                           # Only download and save the snapshot
//! adpanel events output/raw_export.csv    # List conversion events in a snapshot
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use adpanel::config::{parse_media_metrics, split_list};
use adpanel::logs::init_logging;
use adpanel::transform::kpi::conversion_event_names;
use adpanel::transform::pipeline::fetch_records;
use adpanel::{
    classify, read_snapshot, run, ArtifactWriter, Config, FillPolicy, Granularity, InputSource,
    KpiKind, RunOutcome, TerminalPrompt,
};

#[derive(Parser)]
#[command(name = "adpanel")]
#[command(about = "Build weekly marketing-mix panels from advertising exports", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set (default: ADPANEL_LOG_LEVEL or info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Never prompt; fail when an input is missing
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the export and build the panel
    Run {
        #[command(flatten)]
        ingest: IngestArgs,

        #[command(flatten)]
        panel: PanelArgs,
    },

    /// Build the panel from a saved raw snapshot
    Replay {
        /// Raw snapshot CSV (as written to raw_export.csv)
        input: PathBuf,

        #[command(flatten)]
        panel: PanelArgs,
    },

    /// Fetch the export and save the raw snapshot only
    Fetch {
        #[command(flatten)]
        ingest: IngestArgs,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List conversion event names found in a snapshot
    Events {
        /// Raw snapshot CSV
        input: PathBuf,
    },
}

#[derive(Args)]
struct IngestArgs {
    /// Export API key (default: WINDSOR_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Date preset, e.g. last_1y or last_90d
    #[arg(long)]
    date_preset: Option<String>,
}

#[derive(Args)]
struct PanelArgs {
    /// KPI to model: revenue or conversions
    #[arg(short, long)]
    kpi: Option<KpiKind>,

    /// Conversion events to sum, comma-separated
    #[arg(short, long)]
    events: Option<String>,

    /// Metrics counted as media signals, comma-separated
    #[arg(long)]
    media_metrics: Option<String>,

    /// Geography label for the geo column
    #[arg(long)]
    geo: Option<String>,

    /// Keep daily rows instead of weekly buckets
    #[arg(long)]
    daily: bool,

    /// Zero-fill only clicks, impressions, conversions and spend
    #[arg(long)]
    legacy_fill: bool,

    /// Do not write any files
    #[arg(long)]
    no_artifacts: bool,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the full bundle as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.interactive = !cli.non_interactive;
    init_logging(&config.log_level);

    let result = match cli.command {
        Commands::Run { ingest, panel } => cmd_run(config, &ingest, &panel, InputSource::Fetch).await,
        Commands::Replay { input, panel } => {
            cmd_run(config, &IngestArgs::none(), &panel, InputSource::Replay(input)).await
        }
        Commands::Fetch { ingest, output_dir } => cmd_fetch(config, &ingest, output_dir).await,
        Commands::Events { input } => cmd_events(&config, &input),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

impl IngestArgs {
    fn none() -> Self {
        Self {
            api_key: None,
            date_preset: None,
        }
    }

    fn apply(&self, config: &mut Config) {
        if let Some(key) = &self.api_key {
            config.ingest.api_key = Some(key.clone());
        }
        if let Some(preset) = &self.date_preset {
            config.ingest.date_preset = preset.clone();
        }
    }
}

impl PanelArgs {
    fn apply(&self, config: &mut Config) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(kpi) = self.kpi {
            config.kpi = Some(kpi);
        }
        if let Some(events) = &self.events {
            config.events = Some(split_list(events));
        }
        if let Some(metrics) = &self.media_metrics {
            config.media_metrics = parse_media_metrics(metrics)?;
        }
        if let Some(geo) = &self.geo {
            config.geo = geo.clone();
        }
        if self.daily {
            config.granularity = Granularity::Daily;
        }
        if self.legacy_fill {
            config.fill = FillPolicy::legacy();
        }
        if self.no_artifacts {
            config.write_artifacts = false;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(())
    }
}

async fn cmd_run(
    mut config: Config,
    ingest: &IngestArgs,
    panel: &PanelArgs,
    input: InputSource,
) -> Result<(), Box<dyn std::error::Error>> {
    ingest.apply(&mut config);
    panel.apply(&mut config)?;

    let mut prompt = TerminalPrompt::new();
    let outcome = run(&config, &input, &mut prompt).await?;

    print_summary(&outcome);

    if panel.json {
        println!("{}", serde_json::to_string_pretty(&outcome.bundle)?);
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

async fn cmd_fetch(
    mut config: Config,
    ingest: &IngestArgs,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    ingest.apply(&mut config);
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let mut prompt = TerminalPrompt::new();
    let records = fetch_records(&config, &mut prompt).await?;

    let writer = ArtifactWriter::new(&config.output_dir)?;
    let path = writer.write_raw(&records)?;
    eprintln!("💾 Saved {} records to: {}", records.len(), path.display());
    Ok(())
}

fn cmd_events(config: &Config, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading snapshot: {}", input.display());

    let records = read_snapshot(input)?;
    let parts = classify(records, &config.source_tags);
    let names = conversion_event_names(&parts.analytics);

    if names.is_empty() {
        eprintln!("⚠️  No conversion events in analytics records");
        return Ok(());
    }

    eprintln!("✅ {} conversion event(s):", names.len());
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    let bundle = &outcome.bundle;

    eprintln!("\n📊 Panel:");
    eprintln!("   Rows: {}", bundle.table.len());
    match (bundle.start_date, bundle.end_date) {
        (Some(start), Some(end)) => eprintln!("   Dates: {} → {}", start, end),
        _ => eprintln!("   Dates: (none)"),
    }
    eprintln!("   KPI: {}", bundle.kpi_name);
    eprintln!("   Controls: {}", bundle.controls.join(", "));

    let mut channels: Vec<&str> = bundle.media_to_channel.values().map(String::as_str).collect();
    channels.sort_unstable();
    channels.dedup();
    eprintln!("   Media: {}", bundle.media_columns.join(", "));
    eprintln!("   Spend: {}", bundle.media_spend_columns.join(", "));
    eprintln!("   Channels: {}", channels.join(", "));

    let artifacts = &outcome.artifacts;
    for path in [&artifacts.raw, &artifacts.table, &artifacts.bundle].into_iter().flatten() {
        eprintln!("   💾 {}", path.display());
    }
}
