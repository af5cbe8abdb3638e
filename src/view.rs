//! Filter and sort rules, and the projection of the master list into the visible rows.

use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::{parse_date, Column, Record, Status};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter};
use tracing::{debug, trace};

/// A host-supplied predicate. It must be a pure function of the record; an `Err` excludes the
/// row.
pub type Predicate = Box<dyn Fn(&Record) -> Res<bool>>;

/// A per-column filter.
pub enum FilterRule {
    /// Case-insensitive substring match against the column's plain text.
    Contains(String),
    /// Passes when the status is in the set. An empty set passes everything.
    AnyStatus(BTreeSet<Status>),
    /// Passes when the date is exactly this date.
    On(NaiveDate),
    /// Anything else.
    Custom(Predicate),
}

impl Debug for FilterRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterRule::Contains(s) => f.debug_tuple("Contains").field(s).finish(),
            FilterRule::AnyStatus(set) => f.debug_tuple("AnyStatus").field(set).finish(),
            FilterRule::On(date) => f.debug_tuple("On").field(date).finish(),
            FilterRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FilterRule {
    /// Wraps a closure as a custom rule.
    pub fn custom(predicate: impl Fn(&Record) -> Res<bool> + 'static) -> Self {
        FilterRule::Custom(Box::new(predicate))
    }

    /// Builds the rule for `column` from raw input, as typed into the filter widget.
    ///
    /// Blank input returns `None`, which clears the column's filter. Status input is a comma
    /// separated list of statuses and date input is `YYYY-MM-DD` or `M/D/YYYY`.
    ///
    /// # Errors
    ///
    /// - `ErrorType::Validation` if a status or date cannot be parsed.
    pub fn parse(column: Column, input: &str) -> Result<Option<FilterRule>> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let rule = match column {
            Column::Id | Column::Name | Column::Amount => FilterRule::Contains(input.to_string()),
            Column::Status => FilterRule::AnyStatus(
                input
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(Status::parse)
                    .collect::<Res<BTreeSet<Status>>>()
                    .pub_result(ErrorType::Validation)?,
            ),
            Column::Date => FilterRule::On(parse_date(input).pub_result(ErrorType::Validation)?),
        };
        Ok(Some(rule))
    }

    fn evaluate(&self, column: Column, record: &Record) -> Res<bool> {
        Ok(match self {
            FilterRule::Contains(needle) => column
                .text(record)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            FilterRule::AnyStatus(set) => set.is_empty() || set.contains(&record.status()),
            FilterRule::On(date) => record.date() == *date,
            FilterRule::Custom(predicate) => predicate(record)?,
        })
    }
}

/// Ascending or descending.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

serde_plain::derive_display_from_serialize!(Direction);
serde_plain::derive_fromstr_from_deserialize!(Direction);

/// The single active sort: a column and a direction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SortRule {
    pub column: Column,
    #[serde(default)]
    pub direction: Direction,
}

impl SortRule {
    pub fn new(column: Column, direction: Direction) -> Self {
        Self { column, direction }
    }

    pub fn asc(column: Column) -> Self {
        Self::new(column, Direction::Asc)
    }

    pub fn desc(column: Column) -> Self {
        Self::new(column, Direction::Desc)
    }
}

/// Holds the active rule set and derives the visible rows from a record list.
///
/// There is no state beyond the rules themselves; every change is reflected by the next call to
/// `project`.
#[derive(Debug, Default)]
pub struct ViewProjector {
    filters: BTreeMap<Column, FilterRule>,
    sort: Option<SortRule>,
}

impl ViewProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `rule` for `column`, replacing any previous rule. `None` clears the column.
    ///
    /// # Errors
    ///
    /// - `ErrorType::Validation` if a status rule is put on a column other than `status`, or a
    ///   date rule on a column other than `date`.
    pub fn set_filter(&mut self, column: Column, rule: Option<FilterRule>) -> Result<()> {
        let Some(rule) = rule else {
            if self.filters.remove(&column).is_some() {
                debug!("Cleared the {column} filter");
            }
            return Ok(());
        };
        match (&rule, column) {
            (FilterRule::AnyStatus(_), c) if c != Column::Status => {
                return Err(Error::msg(
                    ErrorType::Validation,
                    format!("A status filter cannot be applied to the {c} column"),
                ));
            }
            (FilterRule::On(_), c) if c != Column::Date => {
                return Err(Error::msg(
                    ErrorType::Validation,
                    format!("A date filter cannot be applied to the {c} column"),
                ));
            }
            _ => {}
        }
        debug!("Set the {column} filter to {rule:?}");
        self.filters.insert(column, rule);
        Ok(())
    }

    /// Installs the sort, replacing any previous one. `None` restores master order.
    pub fn set_sort(&mut self, sort: Option<SortRule>) {
        debug!("Set the sort to {sort:?}");
        self.sort = sort;
    }

    /// Drops every rule.
    pub fn clear(&mut self) {
        self.filters.clear();
        self.sort = None;
    }

    pub fn is_cleared(&self) -> bool {
        self.filters.is_empty() && self.sort.is_none()
    }

    pub fn filters(&self) -> &BTreeMap<Column, FilterRule> {
        &self.filters
    }

    pub fn sort(&self) -> Option<SortRule> {
        self.sort
    }

    /// Whether `record` passes every active filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|(column, rule)| match rule.evaluate(*column, record) {
                Ok(pass) => pass,
                Err(e) => {
                    let e = Error::new(ErrorType::FilterEvaluation, e);
                    debug!(
                        "Excluding client {} because the {column} filter failed: {e}",
                        record.id()
                    );
                    false
                }
            })
    }

    /// The records that pass every filter, stable-sorted by the active sort or left in input
    /// order.
    pub fn project<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Vec<&'a Record> {
        let mut visible: Vec<&Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(sort) = self.sort {
            // `sort_by` is stable, so equal keys keep their input order in both directions.
            match sort.direction {
                Direction::Asc => visible.sort_by(|a, b| sort.column.compare(a, b)),
                Direction::Desc => visible.sort_by(|a, b| sort.column.compare(b, a)),
            }
        }
        trace!("Projected {} visible rows", visible.len());
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{demo_store, ids};
    use anyhow::bail;
    use std::cmp::Ordering;

    fn projector(column: Column, input: &str) -> ViewProjector {
        let mut p = ViewProjector::new();
        p.set_filter(column, FilterRule::parse(column, input).unwrap())
            .unwrap();
        p
    }

    #[test]
    fn test_id_filter() {
        let store = demo_store();
        let p = projector(Column::Id, "68");
        assert_eq!(ids(&p.project(store.all())), vec![6816]);
    }

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let store = demo_store();
        let p = projector(Column::Name, "VAN DE");
        assert_eq!(ids(&p.project(store.all())), vec![9800]);
    }

    #[test]
    fn test_amount_filter_uses_plain_text() {
        let store = demo_store();
        let p = projector(Column::Amount, "7319");
        assert_eq!(ids(&p.project(store.all())), vec![9800]);
        let p = projector(Column::Amount, "$");
        assert!(p.project(store.all()).is_empty());
    }

    #[test]
    fn test_date_filter() {
        let store = demo_store();
        let p = projector(Column::Date, "2019-05-09");
        assert_eq!(ids(&p.project(store.all())), vec![4957, 675]);
    }

    #[test]
    fn test_status_filter() {
        let store = demo_store();
        let p = projector(Column::Status, "Pending, Error");
        let visible = p.project(store.all());
        assert_eq!(ids(&visible), vec![5144, 9800, 3599, 3989, 8942]);
        assert!(visible.iter().all(|r| r.status() != Status::Success));
    }

    #[test]
    fn test_empty_status_set_matches_everything() {
        let store = demo_store();
        let mut p = ViewProjector::new();
        p.set_filter(Column::Status, Some(FilterRule::AnyStatus(BTreeSet::new())))
            .unwrap();
        assert_eq!(p.project(store.all()).len(), 9);
    }

    #[test]
    fn test_filters_are_anded() {
        let store = demo_store();
        let mut p = projector(Column::Status, "Success");
        p.set_filter(Column::Name, FilterRule::parse(Column::Name, "an").unwrap())
            .unwrap();
        // Amarachi Nkechi is a success without "an" in the name; Kobus van de Vegte has it but is
        // pending.
        assert_eq!(ids(&p.project(store.all())), vec![675, 6816, 1077]);
    }

    #[test]
    fn test_filter_order_does_not_matter() {
        let store = demo_store();
        let mut a = ViewProjector::new();
        a.set_filter(Column::Amount, FilterRule::parse(Column::Amount, "3").unwrap())
            .unwrap();
        a.set_filter(Column::Status, FilterRule::parse(Column::Status, "Pending").unwrap())
            .unwrap();
        let mut b = ViewProjector::new();
        b.set_filter(Column::Status, FilterRule::parse(Column::Status, "Pending").unwrap())
            .unwrap();
        b.set_filter(Column::Amount, FilterRule::parse(Column::Amount, "3").unwrap())
            .unwrap();
        assert_eq!(ids(&a.project(store.all())), ids(&b.project(store.all())));
    }

    #[test]
    fn test_new_rule_replaces_old_and_blank_clears() {
        let store = demo_store();
        let mut p = projector(Column::Name, "Amarachi");
        p.set_filter(Column::Name, FilterRule::parse(Column::Name, "Oea").unwrap())
            .unwrap();
        assert_eq!(ids(&p.project(store.all())), vec![3989]);
        p.set_filter(Column::Name, FilterRule::parse(Column::Name, "  ").unwrap())
            .unwrap();
        assert!(p.is_cleared());
        assert_eq!(p.project(store.all()).len(), 9);
    }

    #[test]
    fn test_clearing_restores_original_order() {
        let store = demo_store();
        let mut p = projector(Column::Status, "Pending");
        p.set_sort(Some(SortRule::desc(Column::Amount)));
        p.clear();
        let visible: Vec<Record> = p.project(store.all()).into_iter().cloned().collect();
        assert_eq!(visible, store.all());
    }

    #[test]
    fn test_misplaced_rules_are_rejected() {
        let mut p = ViewProjector::new();
        let err = p
            .set_filter(Column::Name, Some(FilterRule::AnyStatus(BTreeSet::new())))
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        let date = NaiveDate::from_ymd_opt(2019, 5, 9).unwrap();
        assert!(p.set_filter(Column::Id, Some(FilterRule::On(date))).is_err());
        assert!(p.is_cleared());
    }

    #[test]
    fn test_parse_errors() {
        let err = FilterRule::parse(Column::Status, "Pending,Done").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert!(err.to_string().contains("'Done' is not a status"));
        let err = FilterRule::parse(Column::Date, "May 9").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }

    #[test]
    fn test_failing_predicate_excludes_row() {
        let store = demo_store();
        let mut p = ViewProjector::new();
        p.set_filter(
            Column::Amount,
            Some(FilterRule::custom(|r| {
                if r.id() == 675 {
                    bail!("cannot evaluate");
                }
                Ok(true)
            })),
        )
        .unwrap();
        let visible = ids(&p.project(store.all()));
        assert_eq!(visible.len(), 8);
        assert!(!visible.contains(&675));
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let store = demo_store();
        let mut p = ViewProjector::new();
        p.set_sort(Some(SortRule::asc(Column::Amount)));
        assert_eq!(
            ids(&p.project(store.all())),
            vec![9800, 3599, 5144, 3989, 4957, 6816, 675, 1077, 8942]
        );
        p.set_sort(Some(SortRule::desc(Column::Name)));
        assert_eq!(ids(&p.project(store.all()))[0], 8942);
    }

    #[test]
    fn test_sort_is_stable() {
        let store = demo_store();
        let mut p = ViewProjector::new();
        // Equal dates: 4957 and 675 (2019-05-09), 3599 and 3989 (2019-04-17).
        p.set_sort(Some(SortRule::asc(Column::Date)));
        assert_eq!(
            ids(&p.project(store.all())),
            vec![8942, 1077, 3599, 3989, 9800, 5144, 6816, 4957, 675]
        );
        p.set_sort(Some(SortRule::desc(Column::Date)));
        assert_eq!(
            ids(&p.project(store.all())),
            vec![4957, 675, 6816, 5144, 9800, 3599, 3989, 1077, 8942]
        );
        // Status groups keep master order within each group, however often we re-sort.
        p.set_sort(Some(SortRule::asc(Column::Status)));
        for _ in 0..3 {
            assert_eq!(
                ids(&p.project(store.all())),
                vec![3599, 5144, 9800, 3989, 8942, 4957, 675, 6816, 1077]
            );
        }
    }

    #[test]
    fn test_project_is_idempotent() {
        let store = demo_store();
        let mut p = projector(Column::Status, "Success,Pending");
        p.set_sort(Some(SortRule::desc(Column::Date)));
        let once = p.project(store.all());
        let twice = p.project(once.iter().copied());
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_every_rule_combination() {
        let store = demo_store();
        // "" clears the column and "," is an empty status selection.
        let inputs: [(Column, &[&str]); 5] = [
            (Column::Id, &["", "9", "68"]),
            (Column::Name, &["", "an", "O"]),
            (Column::Amount, &["", "3", "0.0"]),
            (Column::Status, &["", ",", "Pending,Error", "Success"]),
            (Column::Date, &["", "2019-05-09", "2019-04-17"]),
        ];
        let sorts = [
            None,
            Some(SortRule::asc(Column::Amount)),
            Some(SortRule::desc(Column::Status)),
        ];

        let mut combos: Vec<Vec<(Column, &str)>> = vec![Vec::new()];
        for (column, values) in inputs {
            combos = combos
                .into_iter()
                .flat_map(|combo| {
                    values.iter().map(move |value| {
                        let mut next = combo.clone();
                        next.push((column, *value));
                        next
                    })
                })
                .collect();
        }
        assert_eq!(combos.len(), 324);

        for combo in &combos {
            let singles: Vec<ViewProjector> = combo
                .iter()
                .map(|(column, input)| projector(*column, input))
                .collect();
            for sort in sorts {
                let mut p = ViewProjector::new();
                for (column, input) in combo {
                    p.set_filter(*column, FilterRule::parse(*column, input).unwrap())
                        .unwrap();
                }
                p.set_sort(sort);

                let visible = p.project(store.all());
                let expected: Vec<&Record> =
                    store.all().iter().filter(|r| p.matches(r)).collect();

                // The AND of the per-column rules, nothing more and nothing less.
                for record in store.all() {
                    let pass = singles.iter().all(|single| single.matches(record));
                    assert_eq!(p.matches(record), pass, "{combo:?} on {}", record.id());
                }

                match sort {
                    None => assert_eq!(ids(&visible), ids(&expected), "{combo:?}"),
                    Some(sort) => {
                        let mut got = ids(&visible);
                        let mut want = ids(&expected);
                        got.sort_unstable();
                        want.sort_unstable();
                        assert_eq!(got, want, "{combo:?} {sort:?}");
                        for pair in visible.windows(2) {
                            let order = sort.column.compare(pair[0], pair[1]);
                            let backwards = match sort.direction {
                                Direction::Asc => Ordering::Greater,
                                Direction::Desc => Ordering::Less,
                            };
                            assert_ne!(order, backwards, "{combo:?} {sort:?}");
                        }
                    }
                }

                let again = p.project(visible.iter().copied());
                assert_eq!(ids(&again), ids(&visible), "{combo:?} {sort:?}");
            }
        }
    }
}
