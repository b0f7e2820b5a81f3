use std::str::FromStr;

/// A row an admin table can search and filter.
pub trait AdminRow {
  type Status: Copy + PartialEq;

  /// Display fields the search box looks at.
  fn search_fields(&self) -> Vec<&str>;
  fn status(&self) -> Self::Status;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Value of a status dropdown. `All` is the `"all"` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter<S> {
  All,
  Only(S),
}

impl<S> Default for StatusFilter<S> {
  fn default() -> Self {
    StatusFilter::All
  }
}

impl<S: PartialEq> StatusFilter<S> {
  pub fn matches(&self, status: &S) -> bool {
    match self {
      StatusFilter::All => true,
      StatusFilter::Only(s) => s == status,
    }
  }
}

impl<S: FromStr> StatusFilter<S> {
  /// Reads a select value; anything unrecognized falls back to `All`.
  pub fn parse(value: &str) -> Self {
    if value.eq_ignore_ascii_case("all") {
      return StatusFilter::All;
    }
    value.parse().map(StatusFilter::Only).unwrap_or(StatusFilter::All)
  }
}

/// Search box, status dropdown and page number of one admin table.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminListFilterState<S> {
  pub search_query: String,
  pub status_filter: StatusFilter<S>,
  pub page: u32,
}

impl<S> Default for AdminListFilterState<S> {
  fn default() -> Self {
    Self { search_query: String::new(), status_filter: StatusFilter::All, page: 1 }
  }
}

impl<S: Copy + PartialEq> AdminListFilterState<S> {
  pub fn set_search(&mut self, query: &str) {
    self.search_query = query.to_string();
  }

  pub fn set_status(&mut self, filter: StatusFilter<S>) {
    self.status_filter = filter;
  }

  /// Clamps to `[1, total_pages]`. Search and status are left alone.
  pub fn set_page(&mut self, page: u32, total_pages: u32) -> u32 {
    self.page = page.clamp(1, total_pages.max(1));
    self.page
  }

  pub fn matches<R: AdminRow<Status = S>>(&self, row: &R) -> bool {
    let query = self.search_query.trim().to_lowercase();
    let hit = query.is_empty() || row.search_fields().iter().any(|f| f.to_lowercase().contains(&query));
    hit && self.status_filter.matches(&row.status())
  }

  /// Applies search and status to the rows of the current page only.
  pub fn filter_page<R: AdminRow<Status = S> + Clone>(&self, rows: &[R]) -> Vec<R> {
    rows.iter().filter(|r| self.matches(*r)).cloned().collect()
  }
}

pub fn total_pages(total: u64, page_size: u32) -> u32 {
  let page_size = u64::from(page_size.max(1));
  let pages = total.div_ceil(page_size).max(1);
  u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
  pub data: Vec<T>,
  pub page: u32,
  pub total: u64,
  pub total_pages: u32,
}

impl<T: Clone> Page<T> {
  /// Cuts page `page` (1-based, clamped) out of a full list.
  pub fn slice_of(all: &[T], page: u32, page_size: u32) -> Self {
    let total = all.len() as u64;
    let total_pages = total_pages(total, page_size);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) as usize).saturating_mul(page_size as usize);
    let data = all.iter().skip(start).take(page_size as usize).cloned().collect();
    Page { data, page, total, total_pages }
  }
}
