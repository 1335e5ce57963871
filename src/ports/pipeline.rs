use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::DailyFrame;

/// Pipeline error type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read pipeline source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Sessions out of order: {next} does not follow {previous}")]
    OutOfOrder { previous: NaiveDate, next: NaiveDate },
}

/// Daily factor table feed.
///
/// Yields one frame per trading session, oldest first, and `None` once the
/// feed is exhausted.
#[async_trait]
pub trait PipelinePort: Send {
    async fn next_session(&mut self) -> Result<Option<DailyFrame>, PipelineError>;
}
