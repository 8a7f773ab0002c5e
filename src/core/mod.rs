pub mod aggregator;
pub mod etl;
pub mod extractor;
pub mod navigator;
pub mod pipeline;

pub use crate::domain::model::{
    AvailabilityRecord, DateOutcome, Extraction, Query, ResultSet, RunOutput, RunSummary, Table,
};
pub use crate::domain::ports::{Browser, Pipeline, Storage};
pub use crate::utils::error::Result;
