use crate::args::ListArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::grid::{Grid, Snapshot};
use crate::render::Rows;
use crate::view::{Direction, SortRule};
use crate::{Config, Result};
use tracing::debug;

/// Loads the clients, applies the edits, filters and sort given in `args` and renders the
/// visible rows.
///
/// Edits are applied before the filters so that an edited client is filtered on its new value.
/// Without `--sort` the config's default sort is used, reversed by `--desc`.
///
/// # Errors
/// - Any error from loading the seed, applying an edit or parsing a filter. Nothing is rendered
///   in that case.
pub async fn list(config: Config, args: ListArgs) -> Result<Out<Rows>> {
    let source = config.seed_source(args.seed());
    debug!("Loading clients from {}", source.describe());
    let records = source.fetch().await?;

    let mut grid = Grid::new(Snapshot::default());
    grid.load(records)?;
    for edit in args.edits() {
        grid.commit_edit(edit.id(), edit.field(), edit.value())?;
    }
    for (column, input) in args.filters() {
        grid.filter_input(column, input)?;
    }
    grid.set_sort(sort(&config, &args));

    let visible = grid.visible();
    let rows = config
        .table()?
        .rows(&visible, args.format())
        .pub_result(ErrorType::Io)?;
    Ok(Out::new(
        format!("Showing {} of {} clients", visible.len(), grid.store().len()),
        rows,
    ))
}

fn sort(config: &Config, args: &ListArgs) -> Option<SortRule> {
    let direction = |default: Direction| {
        if args.desc() {
            Direction::Desc
        } else {
            default
        }
    };
    match args.sort() {
        Some(column) => Some(SortRule::new(column, direction(Direction::Asc))),
        None => config
            .default_sort()
            .map(|s| SortRule::new(s.column, direction(s.direction))),
    }
}
