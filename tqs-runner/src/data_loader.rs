//! CSV loading for bars and sentiment.
//!
//! Bar files carry a timestamp column (`timestamp`, `datetime`, `date` or
//! `time`) and `open`, `high`, `low`, `close`, `volume`; header case is
//! ignored and extra columns are skipped. Empty cells become missing fields
//! and go through the cleaning fill policy. Sentiment files carry a
//! timestamp column and `sentiment_score` (or `score`) in `{-1, 0, 1}`.
//!
//! Timestamps are naive UTC. Accepted forms: RFC 3339 with an offset
//! (converted to UTC), `YYYY-MM-DD HH:MM[:SS[.f]]`, the same with a `T`
//! separator, and a bare `YYYY-MM-DD` (midnight).

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use tqs_core::clean::{clean_bars, CleanedBars};
use tqs_core::domain::{RawBar, SentimentPoint, SentimentScore};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: unparseable timestamp '{value}'")]
    BadTimestamp { line: u64, value: String },
    #[error("line {line}: '{value}' is not a number")]
    BadNumber { line: u64, value: String },
    #[error("line {line}: sentiment score must be -1, 0 or 1, got '{value}'")]
    BadSentiment { line: u64, value: String },
}

const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "datetime", "date", "time"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse one timestamp cell. `None` for anything unrecognized.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Lower-cased header name → column index.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
                .collect(),
        )
    }

    fn find(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.0.get(*n).copied())
    }

    fn require(&self, name: &'static str) -> Result<usize, LoadError> {
        self.find(&[name]).ok_or(LoadError::MissingColumn(name))
    }
}

fn cell(record: &csv::StringRecord, index: usize) -> Option<&str> {
    record.get(index).map(str::trim).filter(|s| !s.is_empty())
}

fn number(record: &csv::StringRecord, index: usize, line: u64) -> Result<Option<f64>, LoadError> {
    cell(record, index)
        .map(|s| {
            s.parse::<f64>().map_err(|_| LoadError::BadNumber {
                line,
                value: s.to_string(),
            })
        })
        .transpose()
}

fn timestamp(
    record: &csv::StringRecord,
    index: usize,
    line: u64,
) -> Result<Option<NaiveDateTime>, LoadError> {
    cell(record, index)
        .map(|s| {
            parse_timestamp(s).ok_or_else(|| LoadError::BadTimestamp {
                line,
                value: s.to_string(),
            })
        })
        .transpose()
}

fn line_of(record: &csv::StringRecord, fallback: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback as u64 + 2)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Bars ────────────────────────────────────────────────────────────

/// Read raw bar records. No cleaning; records keep their file order.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<RawBar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let ts_col = columns
        .find(&TIMESTAMP_COLUMNS)
        .ok_or(LoadError::MissingColumn("timestamp"))?;
    let open_col = columns.require("open")?;
    let high_col = columns.require("high")?;
    let low_col = columns.require("low")?;
    let close_col = columns.require("close")?;
    let volume_col = columns.find(&["volume"]);

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = line_of(&record, i);
        bars.push(RawBar {
            timestamp: timestamp(&record, ts_col, line)?,
            open: number(&record, open_col, line)?,
            high: number(&record, high_col, line)?,
            low: number(&record, low_col, line)?,
            close: number(&record, close_col, line)?,
            volume: match volume_col {
                Some(col) => number(&record, col, line)?,
                None => None,
            },
        });
    }
    Ok(bars)
}

/// Read and clean a bar file.
pub fn load_bars(path: impl AsRef<Path>) -> Result<CleanedBars, LoadError> {
    let path = path.as_ref();
    let raw = read_bars(open(path)?)?;
    let cleaned = clean_bars(raw);
    log::info!(
        "loaded {} bar(s) from {} ({} dropped)",
        cleaned.bars.len(),
        path.display(),
        cleaned.dropped
    );
    Ok(cleaned)
}

// ─── Sentiment ───────────────────────────────────────────────────────

fn sentiment_score(value: &str, line: u64) -> Result<SentimentScore, LoadError> {
    let bad = || LoadError::BadSentiment {
        line,
        value: value.to_string(),
    };
    let parsed: f64 = value.parse().map_err(|_| bad())?;
    match parsed {
        v if v == -1.0 => Ok(SentimentScore::Bearish),
        v if v == 0.0 => Ok(SentimentScore::Neutral),
        v if v == 1.0 => Ok(SentimentScore::Bullish),
        _ => Err(bad()),
    }
}

/// Read sentiment points, sorted by timestamp. Rows without a timestamp
/// are skipped.
pub fn read_sentiment<R: Read>(reader: R) -> Result<Vec<SentimentPoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let ts_col = columns
        .find(&TIMESTAMP_COLUMNS)
        .ok_or(LoadError::MissingColumn("timestamp"))?;
    let score_col = columns
        .find(&["sentiment_score", "score", "sentiment"])
        .ok_or(LoadError::MissingColumn("sentiment_score"))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = line_of(&record, i);
        let Some(ts) = timestamp(&record, ts_col, line)? else {
            skipped += 1;
            continue;
        };
        let score = match cell(&record, score_col) {
            Some(value) => sentiment_score(value, line)?,
            None => SentimentScore::Neutral,
        };
        points.push(SentimentPoint {
            timestamp: ts,
            score,
        });
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} sentiment row(s) without a timestamp");
    }
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

pub fn load_sentiment(path: impl AsRef<Path>) -> Result<Vec<SentimentPoint>, LoadError> {
    let path = path.as_ref();
    let points = read_sentiment(open(path)?)?;
    log::info!(
        "loaded {} sentiment point(s) from {}",
        points.len(),
        path.display()
    );
    Ok(points)
}
