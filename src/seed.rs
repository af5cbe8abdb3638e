//! Seed sources supply the raw records a `RecordStore` is loaded from.

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::RawRecord;
use crate::{utils, Result};
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supplies the raw records for a grid.
#[async_trait::async_trait]
pub trait SeedSource: Send + Sync {
    /// Fetches every raw record. Validation happens later, in `RecordStore::load`.
    async fn fetch(&self) -> Result<Vec<RawRecord>>;

    /// A short description for log messages.
    fn describe(&self) -> String;
}

/// The built-in demo clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoSeed;

#[async_trait::async_trait]
impl SeedSource for DemoSeed {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        Ok(demo_records())
    }

    fn describe(&self) -> String {
        "the demo clients".to_string()
    }
}

/// Reads records from a `.json` or `.csv` file.
///
/// JSON files hold an array of objects. CSV files have a header row; unknown headers are
/// ignored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FileSeed {
    path: PathBuf,
}

impl FileSeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SeedSource for FileSeed {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let content = utils::read(&self.path).await.pub_result(ErrorType::Io)?;
        let extension = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let records = match extension.as_str() {
            "json" => parse_json(&content),
            "csv" => parse_csv(&content),
            other => Err(anyhow::anyhow!(
                "Unsupported seed file type '{other}', expected .json or .csv"
            )),
        }
        .with_context(|| format!("Unable to parse seed file {}", self.path.display()))
        .pub_result(ErrorType::InvalidData)?;
        debug!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse_json(content: &str) -> Res<Vec<RawRecord>> {
    Ok(serde_json::from_str(content)?)
}

fn parse_csv(content: &str) -> Res<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        bail!("The CSV header row is missing");
    }
    let mut records = Vec::new();
    for (row_ix, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Unable to read CSV row {}", row_ix + 2))?;
        let mut raw = RawRecord::default();
        for (header, value) in headers.iter().zip(row.iter()) {
            if !value.is_empty() {
                raw.set_with_header(header, value);
            }
        }
        records.push(raw);
    }
    Ok(records)
}

/// The nine demo clients.
pub fn demo_records() -> Vec<RawRecord> {
    DEMO.iter()
        .map(|(id, img, name, amount, status, date)| RawRecord {
            id: Some(id.to_string()),
            image_url: Some(format!("{PORTRAITS}/{img}.jpg")),
            name: Some(name.to_string()),
            amount: Some(amount.to_string()),
            status: Some(status.to_string()),
            date: Some(date.to_string()),
        })
        .collect()
}

const PORTRAITS: &str = "https://randomuser.me/api/portraits";

#[rustfmt::skip]
const DEMO: [(i64, &str, &str, &str, &str, &str); 9] = [
    (4957, "women/42", "Amarachi Nkechi", "47427.0", "Success", "2019-05-09"),
    (675, "women/24", "Bonelwa Ngqawana", "70503.0", "Success", "2019-05-09"),
    (6816, "men/42", "Debashis Bhuiyan", "58931.0", "Success", "2019-05-07"),
    (5144, "women/76", "Jacqueline Asong", "25053.0", "Pending", "2019-04-25"),
    (9800, "men/24", "Kobus van de Vegte", "7319.0", "Pending", "2019-04-22"),
    (3599, "women/94", "Mattie Blooman", "18441.0", "Error", "2019-04-17"),
    (3989, "men/76", "Oea Romana", "33376.0", "Pending", "2019-04-17"),
    (1077, "men/94", "Stephanus Huggins", "75774.0", "Success", "2019-02-26"),
    (8942, "men/16", "Torsten Paulsson", "82531.0", "Pending", "2019-02-21"),
];
