use std::cmp::Ordering;
use std::fmt;

/// A column's value for one row, as seen by filtering and sorting.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
  #[default]
  Empty,
  Text(String),
  Number(f64),
  Bool(bool),
  List(Vec<String>),
}

impl CellValue {
  /// Case-insensitive substring match; `needle` must already be lowercase.
  pub fn contains(&self, needle: &str) -> bool {
    match self {
      CellValue::Empty => needle.is_empty(),
      CellValue::List(items) => items
        .iter()
        .any(|item| item.to_lowercase().contains(needle)),
      other => other.to_string().to_lowercase().contains(needle),
    }
  }

  /// Total order used for sorting. Empty values come first.
  pub fn compare(&self, other: &CellValue) -> Ordering {
    match (self, other) {
      (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
      (CellValue::Empty, _) => Ordering::Less,
      (_, CellValue::Empty) => Ordering::Greater,
      (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
      (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
      (a, b) => compare_text(&a.to_string(), &b.to_string()),
    }
  }
}

fn compare_text(a: &str, b: &str) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}

impl fmt::Display for CellValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CellValue::Empty => Ok(()),
      CellValue::Text(s) => f.write_str(s),
      CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
        write!(f, "{}", *n as i64)
      }
      CellValue::Number(n) => write!(f, "{n}"),
      CellValue::Bool(b) => write!(f, "{b}"),
      CellValue::List(items) => f.write_str(&items.join(", ")),
    }
  }
}

impl From<String> for CellValue {
  fn from(value: String) -> Self {
    CellValue::Text(value)
  }
}

impl From<&str> for CellValue {
  fn from(value: &str) -> Self {
    CellValue::Text(value.to_string())
  }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
  fn from(value: Option<T>) -> Self {
    value.map_or(CellValue::Empty, Into::into)
  }
}

impl From<f64> for CellValue {
  fn from(value: f64) -> Self {
    CellValue::Number(value)
  }
}

impl From<i64> for CellValue {
  fn from(value: i64) -> Self {
    CellValue::Number(value as f64)
  }
}

impl From<bool> for CellValue {
  fn from(value: bool) -> Self {
    CellValue::Bool(value)
  }
}

impl From<Vec<String>> for CellValue {
  fn from(value: Vec<String>) -> Self {
    CellValue::List(value)
  }
}

type Accessor<R> = Box<dyn Fn(&R) -> CellValue + Send + Sync>;
type CellFn<R> = Box<dyn Fn(&CellValue, &R) -> String + Send + Sync>;
type FilterFn<R> = Box<dyn Fn(&R, &str) -> bool + Send + Sync>;

/// Describes one column of a [`Table`](super::Table).
///
/// Data columns have an accessor; its value feeds filtering, sorting and,
/// unless a `cell` function is set, the rendered text. Display-only
/// columns (row actions and the like) only render.
pub struct Column<R> {
  id: String,
  header: String,
  accessor: Option<Accessor<R>>,
  cell: Option<CellFn<R>>,
  filter_fn: Option<FilterFn<R>>,
  sortable: bool,
}

impl<R> Column<R> {
  pub fn new<F, V>(id: impl Into<String>, header: impl Into<String>, accessor: F) -> Self
  where
    F: Fn(&R) -> V + Send + Sync + 'static,
    V: Into<CellValue>,
  {
    Self {
      id: id.into(),
      header: header.into(),
      accessor: Some(Box::new(move |row| accessor(row).into())),
      cell: None,
      filter_fn: None,
      sortable: true,
    }
  }

  /// A column without a value: not sortable, skipped by filtering.
  pub fn display<F>(id: impl Into<String>, header: impl Into<String>, render: F) -> Self
  where
    F: Fn(&R) -> String + Send + Sync + 'static,
  {
    Self {
      id: id.into(),
      header: header.into(),
      accessor: None,
      cell: Some(Box::new(move |_, row| render(row))),
      filter_fn: None,
      sortable: false,
    }
  }

  /// Custom rendering of the column's value.
  pub fn cell<F>(mut self, render: F) -> Self
  where
    F: Fn(&CellValue, &R) -> String + Send + Sync + 'static,
  {
    self.cell = Some(Box::new(render));
    self
  }

  /// Custom matching, replacing substring matching on the value.
  ///
  /// The function receives the filter text as typed.
  pub fn filter_fn<F>(mut self, matches: F) -> Self
  where
    F: Fn(&R, &str) -> bool + Send + Sync + 'static,
  {
    self.filter_fn = Some(Box::new(matches));
    self
  }

  pub fn sortable(mut self, sortable: bool) -> Self {
    self.sortable = sortable;
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn header(&self) -> &str {
    &self.header
  }

  pub fn is_sortable(&self) -> bool {
    self.sortable && self.accessor.is_some()
  }

  pub fn is_filterable(&self) -> bool {
    self.accessor.is_some()
  }

  pub fn value(&self, row: &R) -> CellValue {
    self
      .accessor
      .as_ref()
      .map_or(CellValue::Empty, |accessor| accessor(row))
  }

  /// Whether `row` passes `filter`. `needle` is the lowercased filter.
  pub(super) fn matches(&self, row: &R, value: &CellValue, filter: &str, needle: &str) -> bool {
    match &self.filter_fn {
      Some(matches) => matches(row, filter),
      None => value.contains(needle),
    }
  }

  pub fn render(&self, value: &CellValue, row: &R) -> String {
    match &self.cell {
      Some(render) => render(value, row),
      None => value.to_string(),
    }
  }
}

impl<R> fmt::Debug for Column<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Column")
      .field("id", &self.id)
      .field("header", &self.header)
      .field("sortable", &self.is_sortable())
      .field("filterable", &self.is_filterable())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Row {
    name: &'static str,
    age: Option<i64>,
  }

  #[test]
  fn test_display_formats() {
    assert_eq!(CellValue::Number(3.0).to_string(), "3");
    assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
    assert_eq!(CellValue::Empty.to_string(), "");
    assert_eq!(
      CellValue::List(vec!["Admin".into(), "Agent".into()]).to_string(),
      "Admin, Agent"
    );
  }

  #[test]
  fn test_contains_is_case_insensitive() {
    assert!(CellValue::from("Jane Doe").contains("jane"));
    assert!(!CellValue::from("Jane Doe").contains("bob"));
    assert!(CellValue::List(vec!["Service Manager".into()]).contains("manager"));
    assert!(!CellValue::Empty.contains("x"));
  }

  #[test]
  fn test_compare() {
    assert_eq!(CellValue::Empty.compare(&CellValue::from("a")), Ordering::Less);
    assert_eq!(
      CellValue::Number(10.0).compare(&CellValue::Number(9.0)),
      Ordering::Greater
    );
    assert_eq!(
      CellValue::from("apple").compare(&CellValue::from("Banana")),
      Ordering::Less
    );
  }

  #[test]
  fn test_column_value_and_render() {
    let age = Column::new("age", "Age", |r: &Row| r.age)
      .cell(|value, row| format!("{} is {}", row.name, value));
    let row = Row {
      name: "jane",
      age: Some(40),
    };

    let value = age.value(&row);
    assert_eq!(value, CellValue::Number(40.0));
    assert_eq!(age.render(&value, &row), "jane is 40");

    let missing = Row {
      name: "bob",
      age: None,
    };
    assert_eq!(age.value(&missing), CellValue::Empty);
  }

  #[test]
  fn test_display_column() {
    let action: Column<Row> = Column::display("delete", "", |r: &Row| format!("delete {}", r.name));
    let row = Row {
      name: "jane",
      age: None,
    };

    assert!(!action.is_sortable());
    assert!(!action.is_filterable());
    assert_eq!(action.value(&row), CellValue::Empty);
    assert_eq!(action.render(&CellValue::Empty, &row), "delete jane");
  }
}
