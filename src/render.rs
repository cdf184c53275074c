use crate::table::{Table, TablePage};

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// A table page reduced to text, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
  pub headers: Vec<String>,
  pub rows: Vec<Vec<String>>,
  pub filtered_count: usize,
  pub page_index: usize,
  pub page_count: usize,
}

impl RenderedTable {
  pub fn new<R>(table: &Table<R>, page: &TablePage<'_, R>) -> Self {
    Self {
      headers: table.headers().into_iter().map(str::to_string).collect(),
      rows: table.render_cells(page),
      filtered_count: page.filtered_count,
      page_index: page.page_index,
      page_count: page.page_count,
    }
  }

  /// Aligned plain-text rendering with a pager footer.
  ///
  /// Cells longer than `max_width` are truncated.
  pub fn to_text(&self, max_width: usize) -> String {
    let cells: Vec<Vec<String>> = self
      .rows
      .iter()
      .map(|row| row.iter().map(|c| truncate(c, max_width)).collect())
      .collect();

    let mut widths: Vec<usize> = self
      .headers
      .iter()
      .map(|h| h.chars().count().min(max_width))
      .collect();
    for row in &cells {
      for (width, cell) in widths.iter_mut().zip(row) {
        *width = (*width).max(cell.chars().count());
      }
    }

    let mut lines = Vec::with_capacity(cells.len() + 3);
    let headers: Vec<String> = self.headers.iter().map(|h| truncate(h, max_width)).collect();
    lines.push(format_line(&headers, &widths));
    lines.push(
      widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string(),
    );

    if cells.is_empty() {
      lines.push("No rows.".to_string());
    }
    for row in &cells {
      lines.push(format_line(row, &widths));
    }

    lines.push(format!(
      "Page {} of {} ({} rows)",
      self.page_index + 1,
      self.page_count.max(1),
      self.filtered_count
    ));
    lines.join("\n")
  }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
  cells
    .iter()
    .zip(widths)
    .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
    .collect::<Vec<_>>()
    .join("  ")
    .trim_end()
    .to_string()
}
