//! Tabular view engine.
//!
//! Turns a slice of rows plus a [`TableState`] into one page of rows through
//! a fixed pipeline: global filter, per-column filters, sort, paginate.
//! The engine is pure; it never touches the cache and never copies rows.

mod column;
mod state;

use std::cmp::Ordering;
use std::fmt;

pub use column::{CellValue, Column};
pub use state::{ColumnFilter, Pagination, SortKey, TableState, DEFAULT_PAGE_SIZE};

/// A row that made it through the pipeline, with its column values.
#[derive(Debug)]
pub struct TableRow<'a, R> {
  pub row: &'a R,
  /// Position in the input slice
  pub index: usize,
  values: Vec<CellValue>,
}

impl<R> TableRow<'_, R> {
  /// Values in column order.
  pub fn values(&self) -> &[CellValue] {
    &self.values
  }
}

/// One page of a table plus what a pager needs to know.
#[derive(Debug)]
pub struct TablePage<'a, R> {
  pub rows: Vec<TableRow<'a, R>>,
  /// Rows left after filtering, across all pages
  pub filtered_count: usize,
  pub page_index: usize,
  pub page_size: usize,
  pub page_count: usize,
}

impl<R> TablePage<'_, R> {
  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn has_previous_page(&self) -> bool {
    self.page_index > 0
  }

  pub fn has_next_page(&self) -> bool {
    self.page_index.saturating_add(1) < self.page_count
  }
}

type RowFilter<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

pub struct Table<R> {
  columns: Vec<Column<R>>,
  row_filter: Option<RowFilter<R>>,
}

impl<R> Table<R> {
  pub fn new(columns: Vec<Column<R>>) -> Self {
    Self {
      columns,
      row_filter: None,
    }
  }

  /// Only rows passing `keep` enter the pipeline.
  pub fn with_row_filter<F>(mut self, keep: F) -> Self
  where
    F: Fn(&R) -> bool + Send + Sync + 'static,
  {
    self.row_filter = Some(Box::new(keep));
    self
  }

  pub fn columns(&self) -> &[Column<R>] {
    &self.columns
  }

  pub fn column(&self, id: &str) -> Option<&Column<R>> {
    self.position(id).map(|i| &self.columns[i])
  }

  fn position(&self, id: &str) -> Option<usize> {
    self.columns.iter().position(|c| c.id() == id)
  }

  /// Run the pipeline over `rows` and return the requested page.
  ///
  /// Column filters and sort keys naming unknown columns are ignored, as
  /// are filters on display-only columns and sort keys on columns that are
  /// not sortable. A page past the end
  /// is empty.
  pub fn page<'a>(&self, rows: &'a [R], state: &TableState) -> TablePage<'a, R> {
    let global = state.global_filter.trim();
    let global_needle = global.to_lowercase();

    let column_filters: Vec<(usize, &str, String)> = state
      .column_filters
      .iter()
      .filter(|f| !f.value.trim().is_empty())
      .filter_map(|f| {
        let i = self.position(&f.column_id)?;
        if !self.columns[i].is_filterable() {
          return None;
        }
        let value = f.value.trim();
        Some((i, value, value.to_lowercase()))
      })
      .collect();

    let sort_keys: Vec<(usize, bool)> = state
      .sorting
      .iter()
      .filter_map(|key| {
        let i = self.position(&key.column_id)?;
        self.columns[i].is_sortable().then_some((i, key.descending))
      })
      .collect();

    let mut filtered: Vec<TableRow<'a, R>> = rows
      .iter()
      .enumerate()
      .filter(|(_, row)| self.row_filter.as_ref().map_or(true, |keep| keep(*row)))
      .map(|(index, row)| TableRow {
        row,
        index,
        values: self.columns.iter().map(|c| c.value(row)).collect(),
      })
      .filter(|r| global.is_empty() || self.matches_any(r, global, &global_needle))
      .filter(|r| {
        column_filters.iter().all(|(i, value, needle)| {
          let column = &self.columns[*i];
          column.matches(r.row, &r.values[*i], value, needle)
        })
      })
      .collect();

    if !sort_keys.is_empty() {
      // sort_by is stable, so full ties keep input order
      filtered.sort_by(|a, b| {
        for &(i, descending) in &sort_keys {
          let ord = a.values[i].compare(&b.values[i]);
          let ord = if descending { ord.reverse() } else { ord };
          if ord != Ordering::Equal {
            return ord;
          }
        }
        Ordering::Equal
      });
    }

    let page_size = state.pagination.page_size.max(1);
    let page_index = state.pagination.page_index;
    let filtered_count = filtered.len();
    let start = page_index.saturating_mul(page_size);

    let rows = if start >= filtered_count {
      Vec::new()
    } else {
      filtered.into_iter().skip(start).take(page_size).collect()
    };

    TablePage {
      rows,
      filtered_count,
      page_index,
      page_size,
      page_count: filtered_count.div_ceil(page_size),
    }
  }

  fn matches_any(&self, row: &TableRow<'_, R>, filter: &str, needle: &str) -> bool {
    self
      .columns
      .iter()
      .zip(&row.values)
      .filter(|(column, _)| column.is_filterable())
      .any(|(column, value)| column.matches(row.row, value, filter, needle))
  }

  pub fn headers(&self) -> Vec<&str> {
    self.columns.iter().map(Column::header).collect()
  }

  /// Rendered cell text for every row of the page.
  pub fn render_cells(&self, page: &TablePage<'_, R>) -> Vec<Vec<String>> {
    page
      .rows
      .iter()
      .map(|r| {
        self
          .columns
          .iter()
          .zip(&r.values)
          .map(|(column, value)| column.render(value, r.row))
          .collect()
      })
      .collect()
  }
}

impl<R> fmt::Debug for Table<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Table")
      .field("columns", &self.columns)
      .field("row_filter", &self.row_filter.is_some())
      .finish()
  }
}
