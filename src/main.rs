use clap::Parser;
use std::process::ExitCode;
use warranty_etl::config::credentials::DOTENV_FILE;
use warranty_etl::utils::{logger, validation::Validate};
use warranty_etl::{
    CliConfig, Credentials, EtlEngine, EtlError, LocalStorage, RunConfig, WarrantyPipeline,
};

// Requests are awaited one after another; a single thread is all the run needs.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // `--help` and `--version` print and exit 0 here
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.log_format);

    tracing::info!("Starting warranty-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(&cli).await {
        Ok(output_path) => {
            println!("Output written to: {}", output_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(
                "Warranty lookup failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("ERROR: {}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: &CliConfig) -> Result<String, EtlError> {
    // Credentials first: without them nothing else is worth doing
    let credentials = Credentials::from_env_and_file(DOTENV_FILE)?;

    let config = RunConfig::from_cli(cli)?;
    config.validate()?;
    tracing::debug!("Run config: {:?}", config);

    let pipeline = WarrantyPipeline::new(LocalStorage::default(), config, credentials)?;
    EtlEngine::new(pipeline).run().await
}
