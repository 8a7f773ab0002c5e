use crate::config::ScrapeConfig;
use crate::domain::ports::Browser;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use thirtyfour::components::SelectElement;
use thirtyfour::prelude::*;

/// `Browser` backed by a WebDriver server such as chromedriver.
pub struct WebDriverBrowser {
    driver: Option<WebDriver>,
}

impl WebDriverBrowser {
    /// Opens a Chrome session on the configured WebDriver server.
    pub async fn connect(config: &ScrapeConfig) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.set_headless()?;
        }
        for arg in ["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"] {
            caps.add_arg(arg)?;
        }

        tracing::info!("Connecting to WebDriver at {}", config.webdriver_url);
        let driver = WebDriver::new(config.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| EtlError::SessionError {
                message: format!("could not start browser session: {}", e),
            })?;

        Ok(Self {
            driver: Some(driver),
        })
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver.as_ref().ok_or_else(|| EtlError::SessionError {
            message: "browser session already closed".to_string(),
        })
    }

    async fn find_one(&self, xpath: &str) -> Result<WebElement> {
        let mut found = self.driver()?.find_all(By::XPath(xpath)).await?;
        if found.is_empty() {
            return Err(EtlError::ElementNotFound {
                locator: xpath.to_string(),
            });
        }
        Ok(found.swap_remove(0))
    }
}

/// Options anywhere under the select, `<optgroup>` children included.
fn option_xpath(value: &str) -> String {
    format!(".//option[@value='{}']", value)
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.driver()?.goto(url).await?;
        Ok(())
    }

    async fn select_by_value(&mut self, select_xpath: &str, value: &str) -> Result<()> {
        let select = self.find_one(select_xpath).await?;

        // Checked up front so a missing option is told apart from driver errors.
        let option = option_xpath(value);
        if select.find_all(By::XPath(option.as_str())).await?.is_empty() {
            return Err(EtlError::OptionNotFound {
                field: select_xpath.to_string(),
                value: value.to_string(),
            });
        }

        tracing::debug!("Selecting {} in {}", value, select_xpath);
        SelectElement::new(&select).await?.select_by_value(value).await?;
        Ok(())
    }

    async fn click(&mut self, xpath: &str) -> Result<()> {
        self.find_one(xpath).await?.click().await?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.driver()?.source().await?)
    }

    async fn quit(&mut self) -> Result<()> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
            tracing::debug!("Browser session closed");
        }
        Ok(())
    }
}
