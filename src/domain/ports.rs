use crate::domain::model::{Extraction, ResultSet, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub trait Storage: Send + Sync {
    /// Writes `data` under `path` relative to the storage root and returns
    /// the full path written.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}

/// The handful of browser capabilities the form flow needs.
///
/// Locators are XPath expressions. `select_by_value` must fail with
/// `ElementNotFound` when the select is missing and `OptionNotFound` when the
/// select exists but does not offer `value`.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<()>;
    async fn select_by_value(&mut self, select_xpath: &str, value: &str) -> Result<()>;
    async fn click(&mut self, xpath: &str) -> Result<()>;
    async fn page_source(&mut self) -> Result<String>;
    /// Ends the session. Calling it twice is a no-op.
    async fn quit(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&mut self) -> Result<Extraction>;
    async fn transform(&self, records: ResultSet) -> Result<Table>;
    async fn load(&self, table: Table) -> Result<PathBuf>;
    /// Releases external resources. Runs after the stages on every path.
    async fn shutdown(&mut self) -> Result<()>;
}
