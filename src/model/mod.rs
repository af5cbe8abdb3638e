//! Types that represent the data model: a `Record` per client and the `Amount`, `Status`,
//! `Field` and `Column` types around it.
mod amount;
mod record;

pub use amount::{Amount, AmountError, AmountFormat, CURRENCY};
pub(crate) use record::parse_date;
pub use record::{Column, Field, RawRecord, Record, Status};
