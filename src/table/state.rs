pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  pub page_index: usize,
  /// Treated as 1 when zero.
  pub page_size: usize,
}

impl Default for Pagination {
  fn default() -> Self {
    Self {
      page_index: 0,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
  pub column_id: String,
  pub descending: bool,
}

impl SortKey {
  pub fn asc(column_id: impl Into<String>) -> Self {
    Self {
      column_id: column_id.into(),
      descending: false,
    }
  }

  pub fn desc(column_id: impl Into<String>) -> Self {
    Self {
      column_id: column_id.into(),
      descending: true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
  pub column_id: String,
  pub value: String,
}

/// View state of a table, owned by the view that shows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
  pub pagination: Pagination,
  /// Sort keys, most significant first
  pub sorting: Vec<SortKey>,
  pub global_filter: String,
  pub column_filters: Vec<ColumnFilter>,
}

impl TableState {
  pub fn with_page_size(page_size: usize) -> Self {
    Self {
      pagination: Pagination {
        page_index: 0,
        page_size: page_size.max(1),
      },
      ..Self::default()
    }
  }

  pub fn set_page(&mut self, page_index: usize) {
    self.pagination.page_index = page_index;
  }

  /// Go to the next page, if `page_count` allows.
  pub fn next_page(&mut self, page_count: usize) {
    if self.pagination.page_index.saturating_add(1) < page_count {
      self.pagination.page_index += 1;
    }
  }

  pub fn previous_page(&mut self) {
    self.pagination.page_index = self.pagination.page_index.saturating_sub(1);
  }

  pub fn set_page_size(&mut self, page_size: usize) {
    self.pagination.page_size = page_size.max(1);
    self.pagination.page_index = 0;
  }

  pub fn set_global_filter(&mut self, filter: impl Into<String>) {
    self.global_filter = filter.into();
    self.pagination.page_index = 0;
  }

  /// Set or, with an empty value, remove a column's filter.
  pub fn set_column_filter(&mut self, column_id: &str, value: impl Into<String>) {
    let value = value.into();
    self.column_filters.retain(|f| f.column_id != column_id);
    if !value.is_empty() {
      self.column_filters.push(ColumnFilter {
        column_id: column_id.to_string(),
        value,
      });
    }
    self.pagination.page_index = 0;
  }

  pub fn clear_filters(&mut self) {
    self.global_filter.clear();
    self.column_filters.clear();
    self.pagination.page_index = 0;
  }

  /// `Some(descending)` if the column is sorted.
  pub fn sort_direction(&self, column_id: &str) -> Option<bool> {
    self
      .sorting
      .iter()
      .find(|key| key.column_id == column_id)
      .map(|key| key.descending)
  }

  /// Cycle a column through ascending, descending and unsorted.
  ///
  /// With `multi` the other sort keys are kept and a new key is appended;
  /// otherwise the column becomes the only key.
  pub fn toggle_sort(&mut self, column_id: &str, multi: bool) {
    let next = match self.sort_direction(column_id) {
      None => Some(false),
      Some(false) => Some(true),
      Some(true) => None,
    };

    if multi {
      match (self.sorting.iter().position(|k| k.column_id == column_id), next) {
        (Some(pos), Some(descending)) => self.sorting[pos].descending = descending,
        (Some(pos), None) => {
          self.sorting.remove(pos);
        }
        (None, Some(descending)) => self.sorting.push(SortKey {
          column_id: column_id.to_string(),
          descending,
        }),
        (None, None) => {}
      }
    } else {
      self.sorting = next
        .map(|descending| {
          vec![SortKey {
            column_id: column_id.to_string(),
            descending,
          }]
        })
        .unwrap_or_default();
    }
  }
}
