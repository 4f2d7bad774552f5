//! Sort/paginate view-model for the incident table.
//!
//! [`compute_page`] is pure: it derives one displayable page from the full
//! dataset, a [`SortSpec`] and a [`PageSpec`]. [`TableState`] holds the
//! sort and page settings between intents and applies the page-reset rules.

use std::num::NonZeroUsize;

use crime_dashboard_models::CrimeRecord;

use crate::sort::{SortSpec, compare_records};

/// Maximum number of page links shown at once.
pub const PAGE_LINK_WINDOW: usize = 5;

/// Rows per page and the page being viewed (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    /// Rows per page.
    pub page_size: NonZeroUsize,
    /// Page being viewed, 1-based.
    pub current_page: usize,
}

impl PageSpec {
    /// First page with the given size.
    #[must_use]
    pub const fn new(page_size: NonZeroUsize) -> Self {
        Self {
            page_size,
            current_page: 1,
        }
    }

    /// Last page for a dataset of `total` rows; at least 1.
    #[must_use]
    pub const fn max_page(&self, total: usize) -> usize {
        let pages = total.div_ceil(self.page_size.get());
        if pages == 0 { 1 } else { pages }
    }

    /// This spec with `current_page` clamped to `[1, max_page(total)]`.
    #[must_use]
    pub fn clamped(self, total: usize) -> Self {
        Self {
            current_page: self.current_page.clamp(1, self.max_page(total)),
            ..self
        }
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN))
    }
}

/// One entry of the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    /// Page number, 1-based.
    pub page: usize,
    /// Whether this is the page being viewed.
    pub active: bool,
    /// Whether the link can be clicked.
    pub disabled: bool,
}

/// Pagination control model. Never empty: an empty dataset still yields
/// a single disabled link to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Window of page links around the current page.
    pub pages: Vec<PageLink>,
    /// Whether a previous page exists.
    pub has_previous: bool,
    /// Whether a next page exists.
    pub has_next: bool,
}

impl Pagination {
    fn build(current_page: usize, max_page: usize, total: usize) -> Self {
        if total == 0 {
            return Self {
                pages: vec![PageLink {
                    page: 1,
                    active: true,
                    disabled: true,
                }],
                has_previous: false,
                has_next: false,
            };
        }

        let half = PAGE_LINK_WINDOW / 2;
        let last = (current_page.saturating_sub(half).max(1) + PAGE_LINK_WINDOW - 1).min(max_page);
        let first = (last + 1).saturating_sub(PAGE_LINK_WINDOW).max(1);

        Self {
            pages: (first..=last)
                .map(|page| PageLink {
                    page,
                    active: page == current_page,
                    disabled: false,
                })
                .collect(),
            has_previous: current_page > 1,
            has_next: current_page < max_page,
        }
    }
}

/// One render-ready page of the incident table.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    /// Rows on this page, in sort order.
    pub rows: Vec<CrimeRecord>,
    /// 1-based index of the first row shown; 0 when there are no rows.
    pub start_index: usize,
    /// 1-based index of the last row shown; 0 when there are no rows.
    pub end_index: usize,
    /// Rows in the whole dataset.
    pub total_count: usize,
    /// Last page number; at least 1.
    pub max_page: usize,
    /// Page shown, after clamping.
    pub current_page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Pagination control model.
    pub pagination: Pagination,
}

/// Derives the page described by `page` from `dataset` sorted by `sort`.
///
/// The sort is stable and works on a copy of the row order; `dataset` is
/// untouched. A `current_page` past the end (e.g. after the dataset
/// shrank) is clamped to the last page.
#[must_use]
pub fn compute_page(dataset: &[CrimeRecord], sort: &SortSpec, page: PageSpec) -> TablePage {
    let total_count = dataset.len();
    let page = page.clamped(total_count);
    let page_size = page.page_size.get();
    let max_page = page.max_page(total_count);

    let mut order: Vec<&CrimeRecord> = dataset.iter().collect();
    order.sort_by(|a, b| compare_records(a, b, sort));

    let start = (page.current_page - 1) * page_size;
    let end = (start + page_size).min(total_count);
    let rows: Vec<CrimeRecord> = order[start..end].iter().map(|r| (*r).clone()).collect();

    TablePage {
        start_index: if rows.is_empty() { 0 } else { start + 1 },
        end_index: end,
        rows,
        total_count,
        max_page,
        current_page: page.current_page,
        page_size,
        pagination: Pagination::build(page.current_page, max_page, total_count),
    }
}

/// Sort and page settings of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    /// Current sort.
    pub sort: SortSpec,
    /// Current page settings.
    pub page: PageSpec,
}

impl TableState {
    /// Creates a table state with the default sort and the given page size.
    #[must_use]
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            sort: SortSpec::default(),
            page: PageSpec::new(page_size),
        }
    }

    /// Column-header click: the current column flips direction, another
    /// column becomes the sort column in ascending order. Either way the
    /// table returns to page 1.
    pub fn toggle_sort(&mut self, field: &str) {
        if self.sort.same_field(field) {
            self.sort.direction = self.sort.direction.flipped();
        } else {
            self.sort = SortSpec::new(field, crate::sort::SortDirection::Asc);
        }
        self.page.current_page = 1;
    }

    /// Replaces the sort. A different column returns to page 1; a direction
    /// change alone keeps the current page.
    pub fn set_sort(&mut self, sort: SortSpec) {
        if !self.sort.same_field(&sort.field) {
            self.page.current_page = 1;
        }
        self.sort = sort;
    }

    /// Moves to `page`; clamped on the next [`Self::view`].
    pub fn set_page(&mut self, page: usize) {
        self.page.current_page = page.max(1);
    }

    /// Changes the page size and returns to page 1.
    pub const fn set_page_size(&mut self, page_size: NonZeroUsize) {
        self.page = PageSpec::new(page_size);
    }

    /// Computes the current page of `dataset` and stores the clamped page
    /// number back, so `current_page <= max_page` holds between intents.
    pub fn view(&mut self, dataset: &[CrimeRecord]) -> TablePage {
        let page = compute_page(dataset, &self.sort, self.page);
        self.page.current_page = page.current_page;
        page
    }
}
