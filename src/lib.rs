pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::webdriver::WebDriverBrowser;
pub use config::{cli::LocalStorage, ScrapeConfig};
pub use core::{etl::EtlEngine, pipeline::VacancyPipeline};
pub use utils::error::{EtlError, Result};
