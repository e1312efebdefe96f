use clap::Parser;
use defi_lens::config::{TomlConfig, ViewSettings};
use defi_lens::utils::{logger, validation::Validate};
use defi_lens::{build_source, DashboardEngine, DashboardPipeline, LocalStorage};
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(name = "toml-dashboard")]
#[command(about = "Builds every dashboard view declared in a TOML file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dashboard.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Show the resolved views without fetching anything
    #[arg(long)]
    dry_run: bool,
}

fn display_views(config: &TomlConfig, views: &[ViewSettings]) {
    tracing::info!("📋 Dashboard: {}", config.dashboard.name);
    if let Some(description) = &config.dashboard.description {
        tracing::info!("   {}", description);
    }
    let thresholds = config.thresholds();
    tracing::info!(
        "   Thresholds: tvl > {}, mcap > {}",
        thresholds.min_tvl,
        thresholds.min_mcap
    );
    match config.chains() {
        Some(chains) => tracing::info!("   Chains: {}", chains.join(", ")),
        None => tracing::info!("   Chains: all"),
    }
    for view in views {
        tracing::info!(
            "   View '{}': group by {}, {} rank position(s) -> {}",
            view.name,
            view.group_spec,
            view.ranks.len(),
            view.output_path
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let views = config.view_settings()?;
    display_views(&config, &views);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing fetched or written");
        return Ok(());
    }

    // one cached fetch serves every view
    let source = build_source(&config.source_settings());
    let mut tasks = JoinSet::new();

    for view in views {
        let source = source.clone();
        tasks.spawn(async move {
            let name = view.name.clone();
            let storage = LocalStorage::new(view.output_path.clone());
            let engine = DashboardEngine::new(DashboardPipeline::new(source, storage, view));
            (name, engine.run().await)
        });
    }

    let mut failures = 0;
    while let Some(joined) = tasks.join_next().await {
        let (name, result) = joined?;
        match result {
            Ok(path) => println!("✅ View '{}' saved to: {}", name, path),
            Err(e) => {
                failures += 1;
                tracing::error!(
                    "View '{}' failed: {} (Category: {:?}, Severity: {:?})",
                    name,
                    e,
                    e.category(),
                    e.severity()
                );
                eprintln!("❌ View '{}': {}", name, e.user_friendly_message());
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
