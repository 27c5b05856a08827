use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::SessionReport;
use crate::error::JournalError;
use crate::risk::Settlement;
use crate::strategies::RoundResults;
use crate::types::{Outcome, Side};

/// One strategy's verdict as it stood when the hand was revealed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictEntry {
    pub strategy: String,
    pub prediction: Option<Side>,
    pub confidence: f64,
    pub probability: f64,
}

/// Journal line for one settled hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandEntry {
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    pub hand: u64,
    pub actual: Outcome,
    pub prediction: Option<Side>,
    pub source: Option<String>,
    pub confidence: f64,
    pub probability: f64,
    pub verdicts: Vec<VerdictEntry>,
    pub settlement: Settlement,
    pub bankroll: Decimal,
    pub bet: Decimal,
}

impl HandEntry {
    pub fn verdicts_of(results: &RoundResults) -> Vec<VerdictEntry> {
        results
            .iter()
            .map(|(name, verdict)| VerdictEntry {
                strategy: name.to_string(),
                prediction: verdict.prediction,
                confidence: verdict.confidence,
                probability: verdict.probability,
            })
            .collect()
    }
}

/// Receives every settled hand and the end-of-session report.
#[cfg_attr(test, mockall::automock)]
pub trait HandJournal: Send {
    fn record_hand(&mut self, entry: &HandEntry) -> Result<(), JournalError>;

    fn finalize(&mut self, report: &SessionReport) -> Result<(), JournalError>;
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum JournalLine<'a> {
    Hand(&'a HandEntry),
    Summary {
        report: &'a SessionReport,
        recommendations: Vec<String>,
    },
}

/// JSON-lines journal. Each write opens, appends and closes the file.
pub struct FileJournal {
    path: PathBuf,
}

impl FileJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Journal file: {}", path.display());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &JournalLine<'_>) -> Result<(), JournalError> {
        let mut encoded = serde_json::to_string(line)?;
        encoded.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(encoded.as_bytes())?;
        Ok(())
    }
}

impl HandJournal for FileJournal {
    fn record_hand(&mut self, entry: &HandEntry) -> Result<(), JournalError> {
        self.append(&JournalLine::Hand(entry))
    }

    fn finalize(&mut self, report: &SessionReport) -> Result<(), JournalError> {
        self.append(&JournalLine::Summary {
            report,
            recommendations: report.recommendations(),
        })
    }
}
