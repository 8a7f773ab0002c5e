use clap::Parser;
use sports_vacancy_etl::core::RunOutput;
use sports_vacancy_etl::utils::error::ErrorSeverity;
use sports_vacancy_etl::utils::{logger, validation::Validate};
use sports_vacancy_etl::{
    CliConfig, EtlEngine, EtlError, LocalStorage, ScrapeConfig, VacancyPipeline, WebDriverBrowser,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting sports-vacancy-etl");

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match ScrapeConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        None => ScrapeConfig::default(),
    };
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if args.dry_run {
        print_query_plan(&config);
        return Ok(());
    }

    if let Err(e) = run(config).await {
        tracing::error!(
            "Run aborted: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ Fatal error: {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(config: ScrapeConfig) -> Result<(), EtlError> {
    let browser = WebDriverBrowser::connect(&config).await?;
    let storage = LocalStorage::new(config.output_dir.clone());
    let search_days = config.search_days;
    let pipeline = VacancyPipeline::new(browser, storage, config);

    println!("Starting search... ({} days)", search_days);
    println!("Output file: {}", pipeline.output_path().display());

    let summary = EtlEngine::new(pipeline).run().await?;

    match summary.output {
        RunOutput::Written { path, rows } => {
            println!("✅ Done! {} rows written", rows);
            println!("📁 Output saved to: {}", path.display());
        }
        RunOutput::NoData => {
            println!("\nNo data found for the searched period.");
        }
    }

    Ok(())
}

fn print_query_plan(config: &ScrapeConfig) {
    let start = config.resolved_start_date();
    println!(
        "Dry run: {} dates, sport {}, category {}, region {}",
        config.search_days, config.sport_code, config.category_code, config.region_code
    );
    for query in config.queries(start) {
        println!(
            "  {} (month={}, day={})",
            query.display_date(),
            query.month_value(),
            query.day_value()
        );
    }
    println!(
        "Output file: {}",
        std::path::Path::new(&config.output_dir)
            .join(config.output_file_name(start))
            .display()
    );
}
