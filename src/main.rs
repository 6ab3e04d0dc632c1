use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use profile_scraper_lib::chrome::ChromeFactory;
use profile_scraper_lib::cli::Cli;
use profile_scraper_lib::delay_manager::ThreadSleeper;
use profile_scraper_lib::{
    input_loader, logger, BatchCoordinator, CredentialSet, ProfileAssembler, ResultStore,
    ScraperConfig, TargetRecord,
};

/// Exit status when the credential set was rejected.
const EXIT_CREDENTIALS: u8 = 2;

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = ScraperConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    logger::init(&config.log_level);
    info!("Starting Profile Scraper...");

    // 1. Load Inputs
    let targets = match (&cli.url, &cli.input) {
        (Some(url), _) => vec![TargetRecord::new(url.clone())],
        (None, Some(path)) => input_loader::load_targets(path)?,
        (None, None) => return Err("either --url or --input is required".into()),
    };
    let credentials = CredentialSet::load(&cli.cookies)?;
    if credentials.auth_token(&config.auth_cookie).is_none() {
        warn!("No `{}` cookie in {:?}", config.auth_cookie, cli.cookies);
    }

    // 2. Initialize Engines
    let sleeper = Arc::new(ThreadSleeper);
    let mut assembler = ProfileAssembler::new(
        Box::new(ChromeFactory::new(&config)),
        credentials,
        &config,
        sleeper.clone(),
    );
    let mut coordinator =
        BatchCoordinator::new(&config, sleeper).with_store(ResultStore::new(&cli.output));

    // 3. Run
    let report = coordinator.run(&mut assembler, &targets)?;
    if let Some(fatal) = report.fatal {
        error!("Run stopped: {}", fatal);
        return Ok(ExitCode::from(EXIT_CREDENTIALS));
    }

    info!(
        "Scraping Completed. {} profiles written to {:?}.",
        report.result.successes().count(),
        cli.output
    );
    Ok(ExitCode::SUCCESS)
}
