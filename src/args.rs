//! These structs provide the CLI interface for the clients CLI.

use crate::model::{Column, Field};
use crate::render::OutputFormat;
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// clients: filter, sort and edit a list of clients from the command line.
///
/// The clients are loaded from a seed file (`.json` or `.csv`) or, when none is given, from a
/// built-in list of demo clients. Edits are applied in memory only; nothing is written back to
/// the seed file.
#[derive(Debug, Parser, Clone)]
#[command(name = "clients")]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a config file with the default settings.
    ///
    /// The file goes to --config if given, otherwise to the platform config directory, e.g.
    /// ~/.config/client-grid/config.json on Linux.
    Init(InitArgs),
    /// Print the clients that pass the given filters, in the given order.
    List(ListArgs),
    /// Read filter, sort and edit commands from stdin and print the grid after each one.
    ///
    /// Type `help` for the list of commands.
    Session(SessionArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The config file. Defaults to client-grid/config.json in the platform config directory,
    /// and to built-in settings if that does not exist.
    #[arg(long, env = "CLIENT_GRID_CONFIG")]
    config: Option<DisplayPath>,
}

impl Common {
    pub fn new(log_level: LevelFilter, config: Option<PathBuf>) -> Self {
        Self {
            log_level,
            config: config.map(DisplayPath::from),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// Args for the `clients init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// A seed file to record in the new config.
    #[arg(long)]
    seed: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(seed: Option<PathBuf>) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> Option<&Path> {
        self.seed.as_deref()
    }
}

/// Args for the `clients list` command.
///
/// Every filter is optional and they are combined with AND. Text filters are case-insensitive
/// substring matches.
#[derive(Debug, Parser, Clone, Default)]
pub struct ListArgs {
    /// A `.json` or `.csv` file to load clients from, overriding the config.
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Show clients whose id contains this text.
    #[arg(long)]
    id: Option<String>,

    /// Show clients whose name contains this text.
    #[arg(long, alias = "client")]
    name: Option<String>,

    /// Show clients whose amount contains this text, e.g. `47` matches 47427.0.
    #[arg(long)]
    amount: Option<String>,

    /// Show clients with any of these statuses, comma separated, e.g. `Pending,Error`.
    #[arg(long)]
    status: Option<String>,

    /// Show clients with exactly this date, `YYYY-MM-DD` or `M/D/YYYY`.
    #[arg(long)]
    date: Option<String>,

    /// The column to sort by. Overrides the default sort from the config.
    #[arg(long, value_enum)]
    sort: Option<Column>,

    /// Sort in descending order.
    #[arg(long)]
    desc: bool,

    /// Apply an edit before listing, as `ID:FIELD=VALUE`, e.g. `5144:status=Success`. May be
    /// repeated; edits are applied in order.
    #[arg(long)]
    edit: Vec<Edit>,

    /// The output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl ListArgs {
    pub fn seed(&self) -> Option<&Path> {
        self.seed.as_deref()
    }

    /// The raw filter inputs that were given, by column.
    pub fn filters(&self) -> Vec<(Column, &str)> {
        [
            (Column::Id, &self.id),
            (Column::Name, &self.name),
            (Column::Amount, &self.amount),
            (Column::Status, &self.status),
            (Column::Date, &self.date),
        ]
        .into_iter()
        .filter_map(|(column, input)| input.as_deref().map(|s| (column, s)))
        .collect()
    }

    pub fn sort(&self) -> Option<Column> {
        self.sort
    }

    pub fn desc(&self) -> bool {
        self.desc
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edit
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn with_seed(mut self, seed: impl Into<PathBuf>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_filter(mut self, column: Column, input: impl Into<String>) -> Self {
        let input = Some(input.into());
        match column {
            Column::Id => self.id = input,
            Column::Name => self.name = input,
            Column::Amount => self.amount = input,
            Column::Status => self.status = input,
            Column::Date => self.date = input,
        }
        self
    }

    pub fn with_sort(mut self, column: Column, desc: bool) -> Self {
        self.sort = Some(column);
        self.desc = desc;
        self
    }

    pub fn with_edit(mut self, edit: Edit) -> Self {
        self.edit.push(edit);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// Args for the `clients session` command.
#[derive(Debug, Parser, Clone)]
pub struct SessionArgs {
    /// A `.json` or `.csv` file to load clients from, overriding the config.
    #[arg(long)]
    seed: Option<PathBuf>,

    /// The output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl SessionArgs {
    pub fn new(seed: Option<PathBuf>, format: OutputFormat) -> Self {
        Self { seed, format }
    }

    pub fn seed(&self) -> Option<&Path> {
        self.seed.as_deref()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// An inline edit given on the command line as `ID:FIELD=VALUE`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Edit {
    id: i64,
    field: Field,
    value: String,
}

impl Edit {
    pub fn new(id: i64, field: Field, value: impl Into<String>) -> Self {
        Self {
            id,
            field,
            value: value.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for Edit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected ID:FIELD=VALUE, got '{s}'"))?;
        let (id, field) = target
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected ID:FIELD=VALUE, got '{s}'"))?;
        let id = id
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Invalid client id '{}'", id.trim()))?;
        let field = Field::from_str(field.trim())
            .map_err(|_| anyhow!("Unknown field '{}'", field.trim()))?;
        Ok(Self::new(id, field, value))
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let args = Args::try_parse_from([
            "clients",
            "--log-level",
            "debug",
            "list",
            "--name",
            "an",
            "--status",
            "Pending,Error",
            "--sort",
            "client",
            "--desc",
            "--edit",
            "5144:status=Success",
            "--format",
            "csv",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        let Command::List(list) = args.command() else {
            panic!("expected the list command");
        };
        assert_eq!(
            list.filters(),
            vec![(Column::Name, "an"), (Column::Status, "Pending,Error")]
        );
        assert_eq!(list.sort(), Some(Column::Name));
        assert!(list.desc());
        assert_eq!(list.edits(), &[Edit::new(5144, Field::Status, "Success")]);
        assert_eq!(list.format(), OutputFormat::Csv);
    }

    #[test]
    fn test_parse_edit() {
        let edit: Edit = "9800:amount=1,200.50".parse().unwrap();
        assert_eq!(edit, Edit::new(9800, Field::Amount, "1,200.50"));

        let edit: Edit = "675:client=A=B".parse().unwrap();
        assert_eq!(edit.field(), Field::Name);
        assert_eq!(edit.value(), "A=B");

        assert!("675=x".parse::<Edit>().is_err());
        assert!("abc:name=x".parse::<Edit>().is_err());
        assert!("675:colour=red".parse::<Edit>().is_err());
    }

    #[test]
    fn test_parse_session_defaults() {
        let args = Args::try_parse_from(["clients", "session"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        let Command::Session(session) = args.command() else {
            panic!("expected the session command");
        };
        assert_eq!(session.seed(), None);
        assert_eq!(session.format(), OutputFormat::Table);
    }
}
