//! Turns visible rows into text: one `CellRenderer` per column, assembled by a `Table`.

use crate::error::{ErrorType, IntoResult, Res};
use crate::grid::ViewSink;
use crate::model::{AmountFormat, Record};
use crate::Result;
use anyhow::{ensure, Context};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The default date format of the grid, e.g. `5/9/2019`.
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Renders one column of the grid.
pub trait CellRenderer {
    /// The column header.
    fn header(&self) -> &str;

    /// The cell text for `record`.
    fn render(&self, record: &Record) -> String;
}

struct IdCell;

impl CellRenderer for IdCell {
    fn header(&self) -> &str {
        "ID"
    }

    fn render(&self, record: &Record) -> String {
        record.id().to_string()
    }
}

/// The client's name. The portrait goes into the `image_url` key of JSON output instead.
struct ClientCell;

impl CellRenderer for ClientCell {
    fn header(&self) -> &str {
        "Client"
    }

    fn render(&self, record: &Record) -> String {
        record.name().to_string()
    }
}

struct AmountCell(AmountFormat);

impl CellRenderer for AmountCell {
    fn header(&self) -> &str {
        "Amount"
    }

    fn render(&self, record: &Record) -> String {
        record.amount().formatted(self.0)
    }
}

struct StatusCell;

impl CellRenderer for StatusCell {
    fn header(&self) -> &str {
        "Status"
    }

    fn render(&self, record: &Record) -> String {
        record.status().to_string()
    }
}

/// Holds a format that passed `check_date_format`.
struct DateCell(String);

impl CellRenderer for DateCell {
    fn header(&self) -> &str {
        "Date"
    }

    fn render(&self, record: &Record) -> String {
        record.date().format(&self.0).to_string()
    }
}

/// Output format for rendered rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A markdown table.
    #[default]
    Table,
    /// CSV with a header row.
    Csv,
    /// A JSON array of objects keyed by column header.
    Json,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Rendered rows in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    Json(serde_json::Value),
    Table(String),
    Csv(String),
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Table(s) => write!(f, "{}", s),
            Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

/// An ordered set of column renderers.
pub struct Table {
    columns: Vec<Box<dyn CellRenderer>>,
}

impl Debug for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.columns.iter().map(|c| c.header()))
            .finish()
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::with_formats(AmountFormat::default(), DEFAULT_DATE_FORMAT.to_string())
    }
}

/// Fails if `format` holds a specifier chrono does not know. Formatting a date with such a
/// format panics.
pub(crate) fn check_date_format(format: &str) -> Res<()> {
    ensure!(
        !StrftimeItems::new(format).any(|i| matches!(i, Item::Error)),
        "Invalid date_format '{format}'"
    );
    Ok(())
}

impl Table {
    pub fn new(columns: Vec<Box<dyn CellRenderer>>) -> Self {
        Self { columns }
    }

    /// The five grid columns: ID, Client, Amount, Status and Date.
    ///
    /// # Errors
    ///
    /// - `ErrorType::Validation` if `date_format` is not a valid chrono format.
    pub fn standard(amount_format: AmountFormat, date_format: impl Into<String>) -> Result<Self> {
        let date_format = date_format.into();
        check_date_format(&date_format).pub_result(ErrorType::Validation)?;
        Ok(Self::with_formats(amount_format, date_format))
    }

    fn with_formats(amount_format: AmountFormat, date_format: String) -> Self {
        Self::new(vec![
            Box::new(IdCell),
            Box::new(ClientCell),
            Box::new(AmountCell(amount_format)),
            Box::new(StatusCell),
            Box::new(DateCell(date_format)),
        ])
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    fn cells(&self, record: &Record) -> Vec<String> {
        self.columns.iter().map(|c| c.render(record)).collect()
    }

    /// Renders `records` in `format`.
    pub fn rows(&self, records: &[&Record], format: OutputFormat) -> Res<Rows> {
        match format {
            OutputFormat::Table => Ok(Rows::Table(self.markdown(records))),
            OutputFormat::Csv => self.csv(records).map(Rows::Csv),
            OutputFormat::Json => Ok(Rows::Json(self.json(records))),
        }
    }

    fn markdown(&self, records: &[&Record]) -> String {
        let rows: Vec<Vec<String>> = records.iter().map(|r| self.cells(r)).collect();
        let headers = self.headers();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(escape(cell).chars().count());
            }
        }

        let line = |cells: Vec<String>| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:width$}", cell, width = width))
                .collect();
            format!("| {} |\n", padded.join(" | "))
        };

        let mut out = line(headers.iter().map(|h| h.to_string()).collect());
        out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
        for row in rows {
            out.push_str(&line(row.iter().map(|c| escape(c)).collect()));
        }
        out
    }

    fn csv(&self, records: &[&Record]) -> Res<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.headers())?;
        for record in records {
            writer.write_record(self.cells(record))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush CSV output: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output was not UTF-8")
    }

    fn json(&self, records: &[&Record]) -> serde_json::Value {
        let headers = self.headers();
        serde_json::Value::Array(
            records
                .iter()
                .map(|record| {
                    let mut object = serde_json::Map::new();
                    for (header, cell) in headers.iter().zip(self.cells(record)) {
                        object.insert(header.to_string(), serde_json::Value::String(cell));
                    }
                    object.insert(
                        "image_url".to_string(),
                        serde_json::Value::String(record.image_url().to_string()),
                    );
                    serde_json::Value::Object(object)
                })
                .collect(),
        )
    }
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// A `ViewSink` that prints every published view to stdout.
#[derive(Debug, Default)]
pub struct PrintSink {
    table: Table,
    format: OutputFormat,
}

impl PrintSink {
    pub fn new(table: Table, format: OutputFormat) -> Self {
        Self { table, format }
    }
}

impl ViewSink for PrintSink {
    fn view_changed(&mut self, rows: &[&Record]) {
        match self.table.rows(rows, self.format) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => tracing::error!("Unable to render {} rows: {e:#}", rows.len()),
        }
    }
}
