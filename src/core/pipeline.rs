use crate::config::ScrapeConfig;
use crate::core::aggregator;
use crate::core::extractor::Extractor;
use crate::core::navigator::Navigator;
use crate::core::{Browser, DateOutcome, Extraction, Pipeline, Query, ResultSet, Storage, Table};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

/// Searches the reservation form once per date and writes one CSV file.
pub struct VacancyPipeline<B: Browser, S: Storage> {
    browser: B,
    storage: S,
    config: ScrapeConfig,
    start_date: NaiveDate,
    navigator: Navigator,
    extractor: Extractor,
}

impl<B: Browser, S: Storage> VacancyPipeline<B, S> {
    pub fn new(browser: B, storage: S, config: ScrapeConfig) -> Self {
        let start_date = config.resolved_start_date();
        let navigator = Navigator::new(
            config.target_url.clone(),
            Duration::from_millis(config.load_settle_ms),
            Duration::from_millis(config.submit_settle_ms),
        );
        let extractor = Extractor::new(config.facility_label.clone(), config.date_column.clone());
        Self {
            browser,
            storage,
            config,
            start_date,
            navigator,
            extractor,
        }
    }

    pub fn output_file_name(&self) -> String {
        self.config.output_file_name(self.start_date)
    }

    /// Path the CSV will be written to, relative to the working directory.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.config.output_dir).join(self.output_file_name())
    }

    /// Runs one date. Recoverable failures become outcomes; anything else is
    /// returned as an error and ends the run.
    async fn search_date(&mut self, query: &Query) -> Result<(ResultSet, DateOutcome)> {
        let page = match self.navigator.search(&mut self.browser, query).await {
            Ok(page) => page,
            Err(EtlError::DateUnavailable { date }) => {
                tracing::info!("Date {} is not offered by the form", date);
                return Ok((Vec::new(), DateOutcome::DateUnavailable));
            }
            Err(EtlError::QueryFailed { date, reason }) => {
                tracing::warn!("Search for {} failed: {}", date, reason);
                return Ok((Vec::new(), DateOutcome::QueryFailed(reason)));
            }
            Err(e) => return Err(e),
        };

        let records = self.extractor.extract(&page, &query.display_date());
        let outcome = if records.is_empty() {
            DateOutcome::NoAvailability
        } else {
            DateOutcome::Found(records.len())
        };
        Ok((records, outcome))
    }
}

#[async_trait::async_trait]
impl<B: Browser, S: Storage> Pipeline for VacancyPipeline<B, S> {
    async fn extract(&mut self) -> Result<Extraction> {
        let queries = self.config.queries(self.start_date);
        let total = queries.len();
        let mut extraction = Extraction::default();

        for (index, query) in queries.iter().enumerate() {
            println!("[{}/{}] {} searching...", index + 1, total, query.display_date());

            let (records, outcome) = self.search_date(query).await?;
            println!("    -> {}", outcome);

            extraction.records.extend(records);
            extraction.outcomes.push((query.date, outcome));
        }

        tracing::info!(
            "Extracted {} records over {} dates",
            extraction.records.len(),
            total
        );
        Ok(extraction)
    }

    async fn transform(&self, records: ResultSet) -> Result<Table> {
        let table = aggregator::rectangularize(&records, &self.config.date_column);
        tracing::debug!(
            "Merged {} records into {} columns",
            table.rows.len(),
            table.columns.len()
        );
        Ok(table)
    }

    async fn load(&self, table: Table) -> Result<PathBuf> {
        let data = aggregator::encode_csv(&table)?;
        tracing::debug!("Writing CSV ({} bytes) to storage", data.len());
        self.storage
            .write_file(&self.output_file_name(), &data)
            .await
    }

    async fn shutdown(&mut self) -> Result<()> {
        tracing::debug!("Closing browser session");
        self.browser.quit().await
    }
}
