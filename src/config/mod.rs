pub mod cli;
pub mod toml_config;

use crate::domain::model::Query;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_URL: &str = "https://www.net.city.nagoya.jp/cgi-bin/sp/sps04001";
/// 023 = basketball, 015 = football.
pub const DEFAULT_SPORT_CODE: &str = "023";
pub const DEFAULT_CATEGORY_CODE: &str = "07";
pub const DEFAULT_REGION_CODE: &str = "20";
pub const DEFAULT_SEARCH_DAYS: u32 = 30;
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_FACILITY_LABEL: &str = "施設";
pub const DEFAULT_DATE_COLUMN: &str = "検索日付";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Immutable run configuration. Every field has a default, so an empty TOML
/// file (or no file at all) yields the stock search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub target_url: String,
    pub sport_code: String,
    pub category_code: String,
    pub region_code: String,
    /// First searched date; today when unset.
    pub start_date: Option<NaiveDate>,
    pub search_days: u32,
    pub output_dir: String,
    /// First-column label that marks a table as an availability block.
    pub facility_label: String,
    /// Column injected into every record, written first.
    pub date_column: String,
    pub load_settle_ms: u64,
    pub submit_settle_ms: u64,
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            sport_code: DEFAULT_SPORT_CODE.to_string(),
            category_code: DEFAULT_CATEGORY_CODE.to_string(),
            region_code: DEFAULT_REGION_CODE.to_string(),
            start_date: None,
            search_days: DEFAULT_SEARCH_DAYS,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            facility_label: DEFAULT_FACILITY_LABEL.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            load_settle_ms: 1_000,
            submit_settle_ms: 2_000,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
        }
    }
}

impl ScrapeConfig {
    pub fn resolved_start_date(&self) -> NaiveDate {
        self.start_date.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn end_date(&self, start: NaiveDate) -> NaiveDate {
        start + Duration::days(i64::from(self.search_days.saturating_sub(1)))
    }

    /// `{start}_{end}.csv`, relative to `output_dir`.
    pub fn output_file_name(&self, start: NaiveDate) -> String {
        format!(
            "{}_{}.csv",
            start.format("%Y-%m-%d"),
            self.end_date(start).format("%Y-%m-%d")
        )
    }

    pub fn queries(&self, start: NaiveDate) -> Vec<Query> {
        (0..self.search_days)
            .map(|offset| {
                Query::for_offset(
                    start,
                    offset,
                    &self.sport_code,
                    &self.category_code,
                    &self.region_code,
                )
            })
            .collect()
    }
}

impl Validate for ScrapeConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("target_url", &self.target_url)?;
        validation::validate_url("webdriver_url", &self.webdriver_url)?;
        validation::validate_option_code("sport_code", &self.sport_code)?;
        validation::validate_option_code("category_code", &self.category_code)?;
        validation::validate_option_code("region_code", &self.region_code)?;
        validation::validate_range("search_days", self.search_days, 1, 366)?;
        validation::validate_path("output_dir", &self.output_dir)?;
        validation::validate_non_empty_string("facility_label", &self.facility_label)?;
        validation::validate_non_empty_string("date_column", &self.date_column)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScrapeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search_days, 30);
        assert_eq!(config.sport_code, "023");
    }

    #[test]
    fn test_output_file_name_spans_search_window() {
        let config = ScrapeConfig {
            search_days: 30,
            ..ScrapeConfig::default()
        };
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        assert_eq!(config.output_file_name(start), "2025-01-01_2025-01-30.csv");
    }

    #[test]
    fn test_queries_are_consecutive_days() {
        let config = ScrapeConfig {
            search_days: 3,
            ..ScrapeConfig::default()
        };
        let start = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let queries = config.queries(start);

        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].display_date(), "2025-12-31");
        assert_eq!(queries[2].display_date(), "2026-01-02");
        assert!(queries.iter().all(|q| q.region_code == "20"));
    }

    #[test]
    fn test_zero_search_days_rejected() {
        let config = ScrapeConfig {
            search_days: 0,
            ..ScrapeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
