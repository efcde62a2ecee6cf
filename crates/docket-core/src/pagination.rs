//! Page slicing over an already-filtered
//! task sequence.

pub const PAGE_SIZE_OPTIONS: [usize; 5] =
  [5, 10, 15, 20, 50];

/// Pager controls are only worth showing
/// above this many visible tasks.
pub const PAGINATION_CONTROLS_THRESHOLD:
  usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
  pub items:      &'a [T],
  pub page_index: usize,
  pub page_count: usize,
  pub page_size:  usize,
  pub total:      usize
}

impl<T> Page<'_, T> {
  pub fn has_previous(&self) -> bool {
    self.page_index > 0
  }

  pub fn has_next(&self) -> bool {
    self.page_index + 1 < self.page_count
  }

  pub fn shows_controls(&self) -> bool {
    self.total
      > PAGINATION_CONTROLS_THRESHOLD
  }
}

pub fn page_count(
  total: usize,
  page_size: usize
) -> usize {
  total.div_ceil(page_size.max(1))
}

fn clamp_index(
  page_index: usize,
  page_count: usize
) -> usize {
  page_index
    .min(page_count.saturating_sub(1))
}

/// Slices `visible` into the requested
/// page. Out-of-range indexes clamp to the
/// nearest valid page.
pub fn paginate<T>(
  visible: &[T],
  page_index: usize,
  page_size: usize
) -> Page<'_, T> {
  let page_size = page_size.max(1);
  let page_count =
    page_count(visible.len(), page_size);
  let page_index =
    clamp_index(page_index, page_count);

  let start = (page_index * page_size)
    .min(visible.len());
  let end = (start + page_size)
    .min(visible.len());

  Page {
    items: &visible[start..end],
    page_index,
    page_count,
    page_size,
    total: visible.len()
  }
}

/// Page position for one presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  page_index: usize,
  page_size:  usize
}

impl Pagination {
  pub fn new(page_size: usize) -> Self {
    Self {
      page_index: 0,
      page_size:  page_size.max(1)
    }
  }

  pub fn page_index(&self) -> usize {
    self.page_index
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  pub fn next(&mut self, total: usize) {
    self.go_to(
      self.page_index.saturating_add(1),
      total
    );
  }

  pub fn previous(&mut self) {
    self.page_index =
      self.page_index.saturating_sub(1);
  }

  pub fn go_to(
    &mut self,
    page_index: usize,
    total: usize
  ) {
    self.page_index = clamp_index(
      page_index,
      page_count(total, self.page_size)
    );
  }

  /// Keeps the first row of the current
  /// page on screen after a size change.
  pub fn set_page_size(
    &mut self,
    page_size: usize,
    total: usize
  ) {
    let page_size = page_size.max(1);
    let top_row =
      self.page_index * self.page_size;
    self.page_size = page_size;
    self.go_to(top_row / page_size, total);
  }

  /// Pulls the index back inside the page
  /// range after the visible set shrank.
  pub fn clamp(&mut self, total: usize) {
    self.go_to(self.page_index, total);
  }
}
