use clap::Parser;
use defi_lens::utils::error::{ErrorSeverity, LensError};
use defi_lens::utils::{logger, validation::Validate};
use defi_lens::{build_source, CliConfig, DashboardEngine, DashboardPipeline, LocalStorage};

fn exit_code(e: &LensError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting defi-lens");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let source = build_source(&config.source_settings());
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = DashboardPipeline::new(source, storage, config);
    let engine = DashboardEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("Dashboard data written");
            println!("✅ Dashboard data saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let code = exit_code(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
