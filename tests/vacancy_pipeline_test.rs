use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sports_vacancy_etl::core::navigator::{DAY_SELECT, MONTH_SELECT, SUBMIT_BUTTON};
use sports_vacancy_etl::core::{Browser, DateOutcome, RunOutput};
use sports_vacancy_etl::{EtlEngine, EtlError, LocalStorage, ScrapeConfig, VacancyPipeline};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const BOM: &str = "\u{feff}";

/// Serves canned result pages keyed by `MM-DD`, as selected on the form.
#[derive(Default)]
struct FakeBrowser {
    pages: HashMap<String, String>,
    unavailable: Vec<String>,
    broken_submit: Vec<String>,
    month: String,
    day: String,
    submitted: bool,
    quits: Arc<AtomicUsize>,
}

impl FakeBrowser {
    fn with_page(mut self, month_day: &str, html: &str) -> Self {
        self.pages.insert(month_day.to_string(), html.to_string());
        self
    }

    fn with_unavailable(mut self, month_day: &str) -> Self {
        self.unavailable.push(month_day.to_string());
        self
    }

    fn with_broken_submit(mut self, month_day: &str) -> Self {
        self.broken_submit.push(month_day.to_string());
        self
    }

    fn selected(&self) -> String {
        format!("{}-{}", self.month, self.day)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&mut self, _url: &str) -> sports_vacancy_etl::Result<()> {
        self.month.clear();
        self.day.clear();
        self.submitted = false;
        Ok(())
    }

    async fn select_by_value(&mut self, select_xpath: &str, value: &str) -> sports_vacancy_etl::Result<()> {
        if select_xpath == MONTH_SELECT {
            self.month = value.to_string();
        } else if select_xpath == DAY_SELECT {
            self.day = value.to_string();
            if self.unavailable.contains(&self.selected()) {
                return Err(EtlError::OptionNotFound {
                    field: select_xpath.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn click(&mut self, xpath: &str) -> sports_vacancy_etl::Result<()> {
        if xpath != SUBMIT_BUTTON || self.broken_submit.contains(&self.selected()) {
            return Err(EtlError::ElementNotFound {
                locator: xpath.to_string(),
            });
        }
        self.submitted = true;
        Ok(())
    }

    async fn page_source(&mut self) -> sports_vacancy_etl::Result<String> {
        if !self.submitted {
            return Ok("<html><body><form></form></body></html>".to_string());
        }
        Ok(self
            .pages
            .get(&self.selected())
            .cloned()
            .unwrap_or_else(|| "<html><body><p>no tables</p></body></html>".to_string()))
    }

    async fn quit(&mut self) -> sports_vacancy_etl::Result<()> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn availability_table(facility: &str, region: &str) -> String {
    format!(
        "<table><tr><td>facility</td><td>{}</td></tr><tr><td>region</td><td>{}</td></tr></table>",
        facility, region
    )
}

fn test_config(output_dir: &str, days: u32) -> ScrapeConfig {
    ScrapeConfig {
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        search_days: days,
        output_dir: output_dir.to_string(),
        facility_label: "facility".to_string(),
        date_column: "search date".to_string(),
        load_settle_ms: 0,
        submit_settle_ms: 0,
        ..ScrapeConfig::default()
    }
}

fn read_output(path: &std::path::Path) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    assert!(text.starts_with(BOM), "output must start with a UTF-8 BOM");
    Ok(text[BOM.len()..].to_string())
}

#[tokio::test]
async fn test_three_day_scenario() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_dir = temp_dir.path().to_str().unwrap().to_string();

    let day_one = format!(
        "<html><body>{}<table><tr><td>menu</td><td>top</td></tr></table>{}</body></html>",
        availability_table("Field A", "Ward X"),
        availability_table("Field B", "Ward Y"),
    );
    let browser = FakeBrowser::default()
        .with_page("01-01", &day_one)
        .with_page("01-02", "<html><body><table><tr><td>notice</td><td>none</td></tr></table></body></html>")
        .with_unavailable("01-03");
    let quits = browser.quits.clone();

    let pipeline = VacancyPipeline::new(
        browser,
        LocalStorage::new(output_dir.clone()),
        test_config(&output_dir, 3),
    );
    let summary = EtlEngine::new(pipeline).run().await?;

    let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
    assert_eq!(summary.outcome_for(day(1)), Some(&DateOutcome::Found(2)));
    assert_eq!(summary.outcome_for(day(2)), Some(&DateOutcome::NoAvailability));
    assert_eq!(summary.outcome_for(day(3)), Some(&DateOutcome::DateUnavailable));
    assert_eq!(summary.outcome_for(day(3)).unwrap().to_string(), "date unavailable");

    let RunOutput::Written { path, rows } = summary.output else {
        panic!("expected an output file");
    };
    assert_eq!(rows, 2);
    assert!(path.ends_with("2025-01-01_2025-01-03.csv"));

    let csv = read_output(&path)?;
    assert_eq!(
        csv,
        "search date,facility,region\n\
         2025-01-01,Field A,Ward X\n\
         2025-01-01,Field B,Ward Y\n"
    );
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_no_data_writes_no_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_dir = temp_dir.path().join("output");
    let output_dir = output_dir.to_str().unwrap().to_string();

    let browser = FakeBrowser::default().with_unavailable("01-02");
    let quits = browser.quits.clone();
    let pipeline = VacancyPipeline::new(
        browser,
        LocalStorage::new(output_dir.clone()),
        test_config(&output_dir, 3),
    );

    let summary = EtlEngine::new(pipeline).run().await?;

    assert_eq!(summary.output, RunOutput::NoData);
    assert_eq!(summary.outcomes.len(), 3);
    assert!(!std::path::Path::new(&output_dir).exists());
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_query_failure_does_not_stop_later_dates() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_dir = temp_dir.path().to_str().unwrap().to_string();

    let browser = FakeBrowser::default()
        .with_broken_submit("01-01")
        .with_page("01-02", &availability_table("Pool", "Ward Z"));
    let pipeline = VacancyPipeline::new(
        browser,
        LocalStorage::new(output_dir.clone()),
        test_config(&output_dir, 2),
    );

    let summary = EtlEngine::new(pipeline).run().await?;

    let first = summary
        .outcome_for(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        .unwrap();
    assert!(matches!(first, DateOutcome::QueryFailed(reason) if reason.contains("照会")));

    let RunOutput::Written { path, rows } = summary.output else {
        panic!("expected an output file");
    };
    assert_eq!(rows, 1);
    assert!(read_output(&path)?.contains("2025-01-02,Pool,Ward Z"));
    Ok(())
}

#[tokio::test]
async fn test_heterogeneous_records_are_rectangularized() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_dir = temp_dir.path().to_str().unwrap().to_string();

    let browser = FakeBrowser::default()
        .with_page(
            "01-01",
            "<table><tr><td>facility</td><td>Gym</td></tr><tr><td>slot</td><td>AM</td></tr></table>",
        )
        .with_page(
            "01-02",
            "<table><tr><td>fee</td><td>500</td></tr><tr><td>facility</td><td>Pool</td></tr></table>",
        );
    let pipeline = VacancyPipeline::new(
        browser,
        LocalStorage::new(output_dir.clone()),
        test_config(&output_dir, 2),
    );

    let summary = EtlEngine::new(pipeline).run().await?;
    let RunOutput::Written { path, .. } = summary.output else {
        panic!("expected an output file");
    };

    assert_eq!(
        read_output(&path)?,
        "search date,facility,slot,fee\n\
         2025-01-01,Gym,AM,\n\
         2025-01-02,Pool,,500\n"
    );
    Ok(())
}
