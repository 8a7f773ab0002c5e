use crate::domain::model::Query;
use crate::domain::ports::Browser;
use crate::utils::error::{EtlError, Result};
use std::time::Duration;

pub const SPORT_SELECT: &str = "//select[@name='syumoku']";
pub const MONTH_SELECT: &str = "//select[@name='month']";
pub const DAY_SELECT: &str = "//select[@name='day']";
pub const CATEGORY_SELECT: &str = "//select[@name='kyoyo1']";
pub const REGION_SELECT: &str = "//select[@name='chiiki']";
pub const SUBMIT_BUTTON: &str = "//input[@type='submit' and @value='照会']";

/// Drives the search form for one date at a time.
#[derive(Debug, Clone)]
pub struct Navigator {
    target_url: String,
    load_settle: Duration,
    submit_settle: Duration,
}

impl Navigator {
    pub fn new(target_url: impl Into<String>, load_settle: Duration, submit_settle: Duration) -> Self {
        Self {
            target_url: target_url.into(),
            load_settle,
            submit_settle,
        }
    }

    /// Submits `query` and returns the rendered result page.
    ///
    /// Returns `DateUnavailable` when the form does not offer the month or
    /// day, `QueryFailed` for any other form interaction failure. A failure
    /// to load the target page is passed through untouched since it means the
    /// session itself is broken.
    pub async fn search(&self, browser: &mut dyn Browser, query: &Query) -> Result<String> {
        browser.navigate(&self.target_url).await?;
        settle(self.load_settle).await;

        let date = query.display_date();
        self.fill_form(browser, query)
            .await
            .map_err(|e| classify(e, &date))?;

        settle(self.submit_settle).await;
        browser.page_source().await.map_err(|e| classify(e, &date))
    }

    async fn fill_form(&self, browser: &mut dyn Browser, query: &Query) -> Result<()> {
        browser.select_by_value(SPORT_SELECT, &query.sport_code).await?;

        let date_selected = async {
            browser.select_by_value(MONTH_SELECT, &query.month_value()).await?;
            browser.select_by_value(DAY_SELECT, &query.day_value()).await
        }
        .await;
        match date_selected {
            Err(EtlError::ElementNotFound { .. }) | Err(EtlError::OptionNotFound { .. }) => {
                return Err(EtlError::DateUnavailable {
                    date: query.display_date(),
                });
            }
            other => other?,
        }

        browser.select_by_value(CATEGORY_SELECT, &query.category_code).await?;
        browser.select_by_value(REGION_SELECT, &query.region_code).await?;

        tracing::debug!("Submitting search form for {}", query.display_date());
        browser.click(SUBMIT_BUTTON).await
    }
}

fn classify(error: EtlError, date: &str) -> EtlError {
    match error {
        EtlError::DateUnavailable { .. } | EtlError::QueryFailed { .. } => error,
        other => EtlError::QueryFailed {
            date: date.to_string(),
            reason: other.to_string(),
        },
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    #[derive(Default)]
    struct ScriptedBrowser {
        missing_options: Vec<(&'static str, String)>,
        missing_elements: Vec<&'static str>,
        fail_navigation: bool,
        steps: Vec<String>,
    }

    #[async_trait]
    impl Browser for ScriptedBrowser {
        async fn navigate(&mut self, url: &str) -> Result<()> {
            if self.fail_navigation {
                return Err(EtlError::SessionError {
                    message: "session closed".to_string(),
                });
            }
            self.steps.push(format!("goto {}", url));
            Ok(())
        }

        async fn select_by_value(&mut self, select_xpath: &str, value: &str) -> Result<()> {
            if self.missing_elements.iter().any(|missing| *missing == select_xpath) {
                return Err(EtlError::ElementNotFound {
                    locator: select_xpath.to_string(),
                });
            }
            if self
                .missing_options
                .iter()
                .any(|(xpath, missing)| *xpath == select_xpath && missing == value)
            {
                return Err(EtlError::OptionNotFound {
                    field: select_xpath.to_string(),
                    value: value.to_string(),
                });
            }
            self.steps.push(format!("select {}={}", select_xpath, value));
            Ok(())
        }

        async fn click(&mut self, xpath: &str) -> Result<()> {
            if self.missing_elements.iter().any(|missing| *missing == xpath) {
                return Err(EtlError::ElementNotFound {
                    locator: xpath.to_string(),
                });
            }
            self.steps.push("submit".to_string());
            Ok(())
        }

        async fn page_source(&mut self) -> Result<String> {
            Ok("<html></html>".to_string())
        }

        async fn quit(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn navigator() -> Navigator {
        Navigator::new("https://example.com/form", Duration::ZERO, Duration::ZERO)
    }

    fn query() -> Query {
        let start = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        Query::for_offset(start, 0, "023", "07", "20")
    }

    #[tokio::test]
    async fn test_search_fills_form_in_order() {
        let mut browser = ScriptedBrowser::default();

        let page = navigator().search(&mut browser, &query()).await.unwrap();

        assert_eq!(page, "<html></html>");
        assert_eq!(
            browser.steps,
            vec![
                "goto https://example.com/form".to_string(),
                format!("select {}=023", SPORT_SELECT),
                format!("select {}=03", MONTH_SELECT),
                format!("select {}=09", DAY_SELECT),
                format!("select {}=07", CATEGORY_SELECT),
                format!("select {}=20", REGION_SELECT),
                "submit".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_day_option_is_date_unavailable() {
        let mut browser = ScriptedBrowser {
            missing_options: vec![(DAY_SELECT, "09".to_string())],
            ..Default::default()
        };

        let err = navigator().search(&mut browser, &query()).await.unwrap_err();

        assert!(matches!(err, EtlError::DateUnavailable { ref date } if date == "2025-03-09"));
        assert!(!browser.steps.contains(&"submit".to_string()));
    }

    #[tokio::test]
    async fn test_missing_month_select_is_date_unavailable() {
        let mut browser = ScriptedBrowser {
            missing_elements: vec![MONTH_SELECT],
            ..Default::default()
        };

        let err = navigator().search(&mut browser, &query()).await.unwrap_err();
        assert!(matches!(err, EtlError::DateUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_submit_is_query_failed() {
        let mut browser = ScriptedBrowser {
            missing_elements: vec![SUBMIT_BUTTON],
            ..Default::default()
        };

        let err = navigator().search(&mut browser, &query()).await.unwrap_err();

        assert!(matches!(err, EtlError::QueryFailed { ref reason, .. } if reason.contains("照会")));
    }

    #[tokio::test]
    async fn test_missing_sport_option_is_query_failed() {
        let mut browser = ScriptedBrowser {
            missing_options: vec![(SPORT_SELECT, "023".to_string())],
            ..Default::default()
        };

        let err = navigator().search(&mut browser, &query()).await.unwrap_err();
        assert!(matches!(err, EtlError::QueryFailed { .. }));
    }

    #[tokio::test]
    async fn test_navigation_failure_is_not_recoverable() {
        let mut browser = ScriptedBrowser {
            fail_navigation: true,
            ..Default::default()
        };

        let err = navigator().search(&mut browser, &query()).await.unwrap_err();
        assert!(!err.is_recoverable());
    }
}
