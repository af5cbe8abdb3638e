use crate::error::Res;
use crate::model::Amount;
use anyhow::{anyhow, bail, ensure, Context};
use chrono::NaiveDate;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The payment status of a client.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "success")]
    Success,
    #[serde(alias = "error")]
    Error,
}

serde_plain::derive_display_from_serialize!(Status);
serde_plain::derive_fromstr_from_deserialize!(Status);

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::Success, Status::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Success => "Success",
            Status::Error => "Error",
        }
    }

    /// Parses user input into a `Status`, with a message listing the accepted values.
    pub(crate) fn parse(s: &str) -> Res<Status> {
        let s = s.trim();
        Status::from_str(s)
            .map_err(|_| anyhow!("'{s}' is not a status, expected one of Pending, Success, Error"))
    }
}

/// The fields of a `Record`, used to address edits.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    #[serde(alias = "img", alias = "image")]
    ImageUrl,
    #[serde(alias = "client")]
    Name,
    Amount,
    Status,
    Date,
}

serde_plain::derive_display_from_serialize!(Field);
serde_plain::derive_fromstr_from_deserialize!(Field);

/// The columns that can be filtered and sorted.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    #[serde(alias = "client")]
    #[value(alias = "client")]
    Name,
    Amount,
    Status,
    Date,
}

serde_plain::derive_display_from_serialize!(Column);
serde_plain::derive_fromstr_from_deserialize!(Column);

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Id,
        Column::Name,
        Column::Amount,
        Column::Status,
        Column::Date,
    ];

    /// The plain string rendering of this column's value, which is what text filters match.
    pub fn text(&self, record: &Record) -> String {
        match self {
            Column::Id => record.id.to_string(),
            Column::Name => record.name.clone(),
            Column::Amount => record.amount.to_string(),
            Column::Status => record.status.as_str().to_string(),
            Column::Date => record.date.format(ISO_DATE).to_string(),
        }
    }

    /// Ascending comparator for this column.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            Column::Id => a.id.cmp(&b.id),
            Column::Name => a.name.cmp(&b.name),
            Column::Amount => a.amount.cmp(&b.amount),
            // Status sorts by name, so Error < Pending < Success.
            Column::Status => a.status.as_str().cmp(b.status.as_str()),
            Column::Date => a.date.cmp(&b.date),
        }
    }
}

const ISO_DATE: &str = "%Y-%m-%d";
const US_DATE: &str = "%m/%d/%Y";

/// Parses `YYYY-MM-DD` or `M/D/YYYY`.
pub(crate) fn parse_date(s: &str) -> Res<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, ISO_DATE)
        .or_else(|_| NaiveDate::parse_from_str(s, US_DATE))
        .map_err(|_| anyhow!("'{s}' is not a date, expected YYYY-MM-DD or M/D/YYYY"))
}

/// One client row in the grid.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    pub(crate) id: i64,
    pub(crate) image_url: String,
    pub(crate) name: String,
    pub(crate) amount: Amount,
    pub(crate) status: Status,
    pub(crate) date: NaiveDate,
}

impl Record {
    pub fn new(
        id: i64,
        image_url: impl Into<String>,
        name: impl Into<String>,
        amount: Amount,
        status: Status,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            image_url: image_url.into(),
            name: name.into(),
            amount,
            status,
            date,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Coerces `value` to the type of `field` and assigns it. The record is untouched on error.
    pub(crate) fn set(&mut self, field: Field, value: &str) -> Res<()> {
        match field {
            Field::Id => bail!("the id field cannot be edited"),
            Field::ImageUrl => self.image_url = value.trim().to_string(),
            Field::Name => {
                let name = value.trim();
                ensure!(!name.is_empty(), "a client name is required");
                self.name = name.to_string();
            }
            Field::Amount => {
                self.amount = Amount::from_str(value)
                    .with_context(|| format!("'{value}' is not a valid amount"))?
            }
            Field::Status => self.status = Status::parse(value)?,
            Field::Date => self.date = parse_date(value)?,
        }
        Ok(())
    }
}

/// A record as supplied by a seed source, before validation.
///
/// Values may be given as strings or numbers. Blank values count as missing.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RawRecord {
    #[serde(default, deserialize_with = "cell")]
    pub id: Option<String>,
    #[serde(default, alias = "img", deserialize_with = "cell")]
    pub image_url: Option<String>,
    #[serde(default, alias = "client", deserialize_with = "cell")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub date: Option<String>,
}

impl RawRecord {
    /// Given a column `header` from a tabular source and the cell `value`, set the matching
    /// field. Returns `false` when the header names no known field.
    pub fn set_with_header(&mut self, header: &str, value: impl Into<String>) -> bool {
        let field = match Field::from_str(&header.trim().to_lowercase()) {
            Ok(field) => field,
            Err(_) => return false,
        };
        let value = Some(value.into());
        match field {
            Field::Id => self.id = value,
            Field::ImageUrl => self.image_url = value,
            Field::Name => self.name = value,
            Field::Amount => self.amount = value,
            Field::Status => self.status = value,
            Field::Date => self.date = value,
        }
        true
    }
}

impl TryFrom<RawRecord> for Record {
    type Error = anyhow::Error;

    fn try_from(raw: RawRecord) -> Res<Self> {
        let id = required(raw.id, Field::Id)?;
        let id = id
            .trim()
            .parse::<i64>()
            .with_context(|| format!("'{id}' is not a valid id"))?;
        let amount = required(raw.amount, Field::Amount)?;
        let amount = Amount::from_str(&amount)
            .with_context(|| format!("'{amount}' is not a valid amount"))?;
        Ok(Record {
            id,
            image_url: required(raw.image_url, Field::ImageUrl)?,
            name: required(raw.name, Field::Name)?,
            amount,
            status: Status::parse(&required(raw.status, Field::Status)?)?,
            date: parse_date(&required(raw.date, Field::Date)?)?,
        })
    }
}

fn required(value: Option<String>, field: Field) -> Res<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(anyhow!("missing required field '{field}'")),
    }
}

/// Deserializes a cell that may be a string, a number or null into an optional string.
fn cell<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CellVisitor;

    impl<'de> Visitor<'de> for CellVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, a number or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(CellVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawRecord {
        RawRecord {
            id: Some("5144".into()),
            image_url: Some("https://randomuser.me/api/portraits/women/76.jpg".into()),
            name: Some("Jacqueline Asong".into()),
            amount: Some("25053.0".into()),
            status: Some("Pending".into()),
            date: Some("2019-04-25".into()),
        }
    }

    #[test]
    fn test_raw_record_to_record() {
        let record = Record::try_from(raw()).unwrap();
        assert_eq!(record.id(), 5144);
        assert_eq!(record.name(), "Jacqueline Asong");
        assert_eq!(record.amount().to_string(), "25053.0");
        assert_eq!(record.status(), Status::Pending);
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2019, 4, 25).unwrap());
    }

    #[test]
    fn test_raw_record_missing_field() {
        let mut r = raw();
        r.status = Some("  ".into());
        let err = Record::try_from(r).unwrap_err();
        assert!(err.to_string().contains("missing required field 'status'"));
    }

    #[test]
    fn test_raw_record_bad_values() {
        let mut r = raw();
        r.date = Some("2019-13-45".into());
        assert!(Record::try_from(r).is_err());

        let mut r = raw();
        r.amount = Some("lots".into());
        let err = Record::try_from(r).unwrap_err();
        assert!(format!("{err:#}").contains("not a valid amount"));

        let mut r = raw();
        r.id = Some("51x".into());
        assert!(Record::try_from(r).is_err());
    }

    #[test]
    fn test_raw_record_from_json_numbers() {
        let json = r#"{
            "id": 675,
            "img": "https://randomuser.me/api/portraits/women/24.jpg",
            "client": "Bonelwa Ngqawana",
            "amount": 70503.5,
            "status": "Success",
            "date": "2019-05-09",
            "note": "ignored"
        }"#;
        let raw: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id.as_deref(), Some("675"));
        assert_eq!(raw.amount.as_deref(), Some("70503.5"));
        let record = Record::try_from(raw).unwrap();
        assert_eq!(record.name(), "Bonelwa Ngqawana");
    }

    #[test]
    fn test_raw_record_from_json_null_and_missing() {
        let raw: RawRecord = serde_json::from_str(r#"{"id": null, "name": "x"}"#).unwrap();
        assert_eq!(raw.id, None);
        assert_eq!(raw.amount, None);
        assert_eq!(raw.name.as_deref(), Some("x"));
    }

    #[test]
    fn test_set_with_header() {
        let mut r = RawRecord::default();
        assert!(r.set_with_header("ID", "1"));
        assert!(r.set_with_header("Client", "Oea Romana"));
        assert!(r.set_with_header(" img ", "x.jpg"));
        assert!(!r.set_with_header("Notes", "whatever"));
        assert_eq!(r.id.as_deref(), Some("1"));
        assert_eq!(r.name.as_deref(), Some("Oea Romana"));
        assert_eq!(r.image_url.as_deref(), Some("x.jpg"));
    }

    #[test]
    fn test_set_rejects_without_changing() {
        let mut record = Record::try_from(raw()).unwrap();
        let before = record.clone();
        assert!(record.set(Field::Amount, "-5").is_err());
        assert!(record.set(Field::Status, "Done").is_err());
        assert!(record.set(Field::Date, "yesterday").is_err());
        assert!(record.set(Field::Name, "   ").is_err());
        assert!(record.set(Field::Id, "1").is_err());
        assert_eq!(record, before);
    }

    #[test]
    fn test_set_coerces() {
        let mut record = Record::try_from(raw()).unwrap();
        record.set(Field::Amount, "$1,000.50").unwrap();
        record.set(Field::Status, "error").unwrap();
        record.set(Field::Date, "5/9/2019").unwrap();
        record.set(Field::Name, " Jacqueline A. ").unwrap();
        assert_eq!(record.amount().to_string(), "1000.5");
        assert_eq!(record.status(), Status::Error);
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2019, 5, 9).unwrap());
        assert_eq!(record.name(), "Jacqueline A.");
    }

    #[test]
    fn test_column_text() {
        let record = Record::try_from(raw()).unwrap();
        assert_eq!(Column::Id.text(&record), "5144");
        assert_eq!(Column::Amount.text(&record), "25053.0");
        assert_eq!(Column::Status.text(&record), "Pending");
        assert_eq!(Column::Date.text(&record), "2019-04-25");
    }

    #[test]
    fn test_status_order_is_by_name() {
        let mut a = Record::try_from(raw()).unwrap();
        let mut b = a.clone();
        a.status = Status::Pending;
        b.status = Status::Error;
        assert_eq!(Column::Status.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_column_and_field_names() {
        assert_eq!(Column::from_str("client").unwrap(), Column::Name);
        assert_eq!(Column::Amount.to_string(), "amount");
        assert_eq!(Field::from_str("image_url").unwrap(), Field::ImageUrl);
        assert_eq!(Status::Success.to_string(), "Success");
    }
}
