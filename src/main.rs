//! check-host.net Report Scraper - Main CLI Application
//!
//! Renders check reports through a WebDriver server (or reads rendered pages
//! from disk) and writes one JSON object per report to standard output or a
//! file.

use checkhost_scraper::{
    batch::{page_inputs, resolve_report_inputs, BatchInput, BatchRunner, BatchSummary},
    cli::Cli,
    config::{display_config_summary, load_config},
    error::{AppError, ErrorReporter, Result},
    fetch::{FileSource, PageSource, WebDriverSource},
    logging::LoggerFactory,
    models::Config,
    output::{JsonLinesWriter, SummaryFormatter},
    PKG_NAME, VERSION,
};
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        let error = AppError::validation(message);
        ErrorReporter::new(cli.use_colors(), cli.verbose).report_error(&error);
        process::exit(error.exit_code());
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);
    match run_application(cli).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            reporter.report_error(&e);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic; returns the process exit code
async fn run_application(cli: Cli) -> Result<i32> {
    let config = load_config(cli.clone())?;
    colored::control::set_override(config.enable_color);

    let factory = LoggerFactory::new(config.clone());
    let app_logger = factory.create_logger("APP").await;
    app_logger
        .debug(&format!(
            "{} v{} ({}, built {})",
            PKG_NAME,
            VERSION,
            option_env!("GIT_COMMIT").unwrap_or("unknown commit"),
            env!("BUILD_TIME")
        ))
        .log()
        .await;
    app_logger
        .debug("Configuration loaded")
        .field("config", display_config_summary(&config))
        .log()
        .await;

    let mut writer = JsonLinesWriter::open(cli.output.as_ref())?;

    let summary = if cli.html_files.is_empty() {
        let input = cli
            .input
            .as_deref()
            .ok_or_else(|| AppError::validation("no report ID or ID file given"))?;
        let inputs = resolve_report_inputs(input)?;
        app_logger
            .info(&format!("Scraping {} report(s) via {}", inputs.len(), config.webdriver_url))
            .log()
            .await;
        let source = WebDriverSource::new(&config)?.with_logger(factory.create_scrape_logger().await);
        run_batch(source, inputs, &config, &factory, &mut writer).await?
    } else {
        let inputs = page_inputs(&cli.html_files);
        app_logger
            .info(&format!("Parsing {} rendered page(s)", inputs.len()))
            .log()
            .await;
        run_batch(FileSource::new(), inputs, &config, &factory, &mut writer).await?
    };

    writer.flush()?;

    if config.verbose || config.debug {
        let formatter = SummaryFormatter::new(config.enable_color);
        eprintln!("{}", formatter.format_summary(&summary, writer.destination())?);
    }

    Ok(summary.exit_code())
}

async fn run_batch<S: PageSource>(
    source: S,
    inputs: Vec<BatchInput>,
    config: &Config,
    factory: &LoggerFactory,
    writer: &mut JsonLinesWriter,
) -> Result<BatchSummary> {
    let runner = BatchRunner::new(
        source,
        config.extract_options(),
        config.max_concurrency,
        factory.create_scrape_logger().await,
    );

    let mut failures = Vec::new();
    let summary = runner
        .run(inputs, |record| {
            if let Some(error) = record.failure() {
                failures.push((record.report_id().to_string(), error.clone()));
            }
            writer.write_record(record)
        })
        .await?;

    if !failures.is_empty() {
        let reporter = ErrorReporter::new(config.enable_color, config.verbose || config.debug);
        eprintln!("{}", reporter.format_error_summary(&failures));
    }

    Ok(summary)
}
