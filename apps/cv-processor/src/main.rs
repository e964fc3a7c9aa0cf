mod config;
mod errors;
mod extraction;
mod llm_client;
mod pdf_text;
mod processor;
mod spreadsheet;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::FieldExtractor;
use crate::llm_client::LlmClient;
use crate::pdf_text::PdfTextExtractor;
use crate::processor::{CvProcessor, ProcessorPaths};
use crate::spreadsheet::SpreadsheetStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("cv_processor={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Processor v{}", env!("CARGO_PKG_VERSION"));

    // Computed once; every extraction in this process sees the same date.
    let today = chrono::Local::now().date_naive();
    info!("Today's date is: {}", today);

    let llm = LlmClient::new(&config.llm)?;
    info!(
        "LLM client initialized (model: {}, style: {}, endpoint: {})",
        llm.model(),
        config.llm.prompt_style,
        config.llm.base_url
    );

    let extractor = FieldExtractor::new(
        Arc::new(llm),
        config.llm.prompt_style,
        config.max_input_chars(),
    );

    let processor = CvProcessor::new(
        ProcessorPaths {
            cv_folder: config.cv_folder.clone(),
            archive_folder: config.archive_folder.clone(),
            interval: config.poll_interval,
        },
        SpreadsheetStore::new(&config.output_file),
        Arc::new(PdfTextExtractor),
        extractor,
        today,
    );

    processor.initialize().await?;
    info!(
        "Watching {} (archive: {}, output: {}, every {}s)",
        config.cv_folder.display(),
        config.archive_folder.display(),
        config.output_file.display(),
        config.poll_interval.as_secs()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = processor.run(shutdown).await {
        error!("CV Processor stopped: {e}");
        return Err(e.into());
    }

    Ok(())
}
