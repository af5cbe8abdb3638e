//! The interactive session: one grid, driven by commands read line by line.

use crate::args::SessionArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult, Res};
use crate::grid::{Grid, ViewSink};
use crate::model::{Column, Field};
use crate::render::PrintSink;
use crate::view::{Direction, SortRule};
use crate::{Config, Result};
use anyhow::{anyhow, bail, Context};
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

const HELP: &str = "\
Commands:
  filter <column> [value]   set the filter of a column, or clear it when no value is given
  clear [column]            clear the filter of a column, or every filter and the sort
  sort <column> [asc|desc]  sort by a column
  sort off                  go back to the original order
  edit <id> <field> <value> change a field of a client
  show                      print the grid again
  help                      print this message
  quit                      end the session
Columns: id, name (or client), amount, status, date
Fields: image_url, name, amount, status, date";

/// A single session command.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Action {
    Filter { column: Column, input: String },
    Clear(Option<Column>),
    Sort(Option<SortRule>),
    Edit { id: i64, field: Field, value: String },
    Show,
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        let (verb, rest) = split_word(s);
        let action = match verb.to_lowercase().as_str() {
            "filter" => {
                let (column, input) = split_word(rest);
                Action::Filter {
                    column: parse_column(column)?,
                    input: input.to_string(),
                }
            }
            "clear" => match rest {
                "" => Action::Clear(None),
                column => Action::Clear(Some(parse_column(column)?)),
            },
            "sort" => match split_word(rest) {
                ("off", "") => Action::Sort(None),
                (column, direction) => {
                    let column = parse_column(column)?;
                    let direction = match direction {
                        "" => Direction::Asc,
                        d => Direction::from_str(&d.to_lowercase())
                            .map_err(|_| anyhow!("Unknown direction '{d}', expected asc or desc"))?,
                    };
                    Action::Sort(Some(SortRule::new(column, direction)))
                }
            },
            "edit" => {
                let (id, rest) = split_word(rest);
                let (field, value) = split_word(rest);
                let id = id
                    .parse::<i64>()
                    .with_context(|| format!("Invalid client id '{id}'"))?;
                let field = Field::from_str(&field.to_lowercase())
                    .map_err(|_| anyhow!("Unknown field '{field}'"))?;
                Action::Edit {
                    id,
                    field,
                    value: value.to_string(),
                }
            }
            "show" => Action::Show,
            "help" | "?" => Action::Help,
            "quit" | "exit" => Action::Quit,
            _ => bail!("Unknown command '{verb}', type help for the list of commands"),
        };
        Ok(action)
    }
}

impl Action {
    /// Runs the action against `grid`.
    pub fn apply<S: ViewSink>(&self, grid: &mut Grid<S>) -> Result<()> {
        match self {
            Action::Filter { column, input } => grid.filter_input(*column, input)?,
            Action::Clear(Some(column)) => grid.set_filter(*column, None)?,
            Action::Clear(None) => grid.clear_rules(),
            Action::Sort(sort) => grid.set_sort(*sort),
            Action::Edit { id, field, value } => {
                grid.commit_edit(*id, *field, value)?;
            }
            Action::Show => grid.refresh(),
            Action::Help => info!("{HELP}"),
            Action::Quit => {}
        }
        Ok(())
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn parse_column(s: &str) -> Res<Column> {
    if s.is_empty() {
        bail!("A column is required: id, name, amount, status or date");
    }
    Column::from_str(&s.to_lowercase()).map_err(|_| anyhow!("Unknown column '{s}'"))
}

/// Loads the clients into a grid that prints itself, then reads commands from stdin until `quit`
/// or the end of input. A command that fails is logged and the session continues.
///
/// # Errors
/// - Any error from loading the seed, or if stdin cannot be read.
pub async fn session(config: Config, args: SessionArgs) -> Result<Out<()>> {
    let source = config.seed_source(args.seed());
    debug!("Loading clients from {}", source.describe());
    let records = source.fetch().await?;

    let sink = PrintSink::new(config.table()?, args.format());
    let mut grid = Grid::new(sink).with_sort(config.default_sort());
    grid.subscribe(|change| debug!("Data changed: {change:?}"));
    grid.load(records)?;

    let count = run(&mut grid, BufReader::new(tokio::io::stdin()))
        .await
        .pub_result(ErrorType::Io)?;
    Ok(format!("Session ended after {count} commands").into())
}

/// Reads and applies commands from `input`, returning how many were applied successfully.
async fn run<S, R>(grid: &mut Grid<S>, input: R) -> Res<usize>
where
    S: ViewSink,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut count = 0;
    while let Some(line) = lines
        .next_line()
        .await
        .context("Unable to read the next command")?
    {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let action = match line.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                error!("{e:#}");
                continue;
            }
        };
        if action == Action::Quit {
            break;
        }
        match action.apply(grid) {
            Ok(()) => count += 1,
            Err(e) => error!("{} error: {e}", e.error_type()),
        }
    }
    Ok(count)
}
