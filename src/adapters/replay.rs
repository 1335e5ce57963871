//! JSON Factor Table Replay
//!
//! Loads pre-computed daily pipeline output from disk and serves it one
//! session at a time. Expected layout:
//!
//! ```json
//! [
//!   {
//!     "date": "2024-01-02",
//!     "rows": [
//!       { "instrument": "AAPL", "pead_reversal_longs": true, "pricing": 185.6 },
//!       { "instrument": "XOM", "reversal_shorts": true, "pricing": 100.1 }
//!     ]
//!   }
//! ]
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use tracing::info;

use crate::domain::DailyFrame;
use crate::ports::{PipelineError, PipelinePort};

#[derive(Debug, Clone)]
pub struct JsonFramePipeline {
    frames: VecDeque<DailyFrame>,
}

impl JsonFramePipeline {
    /// Load a replay file. Session dates must be strictly increasing.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let pipeline = Self::from_json(&content)?;
        info!(
            path = %path.as_ref().display(),
            sessions = pipeline.frames.len(),
            "Loaded factor table replay"
        );
        Ok(pipeline)
    }

    pub fn from_json(content: &str) -> Result<Self, PipelineError> {
        let frames: Vec<DailyFrame> = serde_json::from_str(content)?;
        Self::from_frames(frames)
    }

    pub fn from_frames(frames: Vec<DailyFrame>) -> Result<Self, PipelineError> {
        for pair in frames.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(PipelineError::OutOfOrder {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self {
            frames: frames.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
impl PipelinePort for JsonFramePipeline {
    async fn next_session(&mut self) -> Result<Option<DailyFrame>, PipelineError> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bucket, Instrument};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const REPLAY: &str = r#"[
        {"date": "2024-01-02", "rows": [
            {"instrument": "AAPL", "pead_reversal_longs": true, "pricing": 185.6},
            {"instrument": "XOM", "reversal_shorts": true, "pricing": 100.1}
        ]},
        {"date": "2024-01-03", "rows": []}
    ]"#;

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(REPLAY.as_bytes()).unwrap();

        let mut pipeline = JsonFramePipeline::from_path(file.path()).unwrap();
        assert_eq!(pipeline.len(), 2);

        let first = pipeline.next_session().await.unwrap().unwrap();
        let longs: Vec<&Instrument> = first.flagged(Bucket::PeadReversalLongs).collect();
        assert_eq!(longs, vec![&Instrument::from("AAPL")]);
        assert_eq!(first.flagged(Bucket::ReversalShorts).count(), 1);

        assert!(pipeline.next_session().await.unwrap().unwrap().rows.is_empty());
        assert!(pipeline.next_session().await.unwrap().is_none());
    }

    #[test]
    fn test_out_of_order_dates_rejected() {
        let json = r#"[{"date": "2024-01-03"}, {"date": "2024-01-03"}]"#;
        assert!(matches!(
            JsonFramePipeline::from_json(json),
            Err(PipelineError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = JsonFramePipeline::from_path("/nonexistent/replay.json");
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            JsonFramePipeline::from_json("{not json"),
            Err(PipelineError::Parse(_))
        ));
    }
}
