//! Request-driven pagination.
//!
//! [`QuerySet::paginate`] slices a query into one page and computes the
//! navigation metadata. Page parameters come from explicit [`Paginate`]
//! options first, then from the current request's query string, then from the
//! defaults (page 1, 20 per page).
//!
//! # Example
//!
//! ```rust
//! use hatchling::{MemoryStore, Paginate, QuerySet, RequestArgs, Row};
//!
//! let store = MemoryStore::new();
//! for id in 1..=45 {
//!     store.insert("posts", Row::new().with("id", id));
//! }
//!
//! let request = RequestArgs::parse("page=3&per_page=20");
//! let page = QuerySet::<Row>::for_table("posts")
//!     .order_by("id")
//!     .paginate(&store, Some(&request), Paginate::new())?;
//!
//! assert_eq!(page.items.len(), 5);
//! assert_eq!(page.pages(), 3);
//! assert!(!page.has_next());
//! assert_eq!(page.prev_num(), Some(2));
//! # Ok::<(), hatchling::HatchError>(())
//! ```

use crate::error::HatchError;
use crate::executor::{Executor, FromRow};
use crate::metrics;
use crate::query::select::QuerySet;
use crate::request::RequestArgs;
use serde::Serialize;

/// Page used when none is given
pub const DEFAULT_PAGE: i64 = 1;
/// Page size used when none is given
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Options for [`QuerySet::paginate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginate {
    /// Explicit page; read from the request when `None`
    pub page: Option<i64>,
    /// Explicit page size; read from the request when `None`
    pub per_page: Option<i64>,
    /// Fail with `NotFound` on invalid input instead of falling back
    pub error_out: bool,
    /// Upper bound applied to `per_page`
    pub max_per_page: Option<i64>,
    /// Run a COUNT query to fill `total`
    pub count: bool,
}

impl Default for Paginate {
    fn default() -> Self {
        Self {
            page: None,
            per_page: None,
            error_out: true,
            max_per_page: None,
            count: true,
        }
    }
}

impl Paginate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: i64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn error_out(mut self, error_out: bool) -> Self {
        self.error_out = error_out;
        self
    }

    pub fn max_per_page(mut self, max_per_page: i64) -> Self {
        self.max_per_page = Some(max_per_page);
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }
}

/// Thresholds for [`Pagination::iter_pages_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Pages always shown at the start
    pub left_edge: u64,
    /// Pages shown before the current one
    pub left_current: u64,
    /// Pages shown after the current one
    pub right_current: u64,
    /// Pages always shown at the end
    pub right_edge: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            left_edge: 2,
            left_current: 2,
            right_current: 5,
            right_edge: 2,
        }
    }
}

/// One page of results plus navigation metadata
#[derive(Debug, Clone)]
pub struct Pagination<M> {
    source: Option<QuerySet<M>>,
    /// Current page number (1-indexed)
    pub page: u64,
    /// Number of items per page
    pub per_page: u64,
    /// Total number of matching items, if counted
    pub total: Option<u64>,
    /// Items of the current page
    pub items: Vec<M>,
}

impl<M> Pagination<M> {
    /// Build a pagination by hand. Without a `source`, `prev()` and `next()`
    /// fail with `MissingSource`.
    pub fn new(
        source: Option<QuerySet<M>>,
        page: u64,
        per_page: u64,
        total: Option<u64>,
        items: Vec<M>,
    ) -> Self {
        Self {
            source,
            page,
            per_page,
            total,
            items,
        }
    }

    /// The unlimited query this page was cut from
    pub fn source(&self) -> Option<&QuerySet<M>> {
        self.source.as_ref()
    }

    /// Total number of pages; 0 when `per_page` is 0 or the total is unknown
    pub fn pages(&self) -> u64 {
        match self.total {
            Some(total) if self.per_page > 0 => total.div_ceil(self.per_page),
            _ => 0,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }

    /// Page numbers to render, `None` marking a gap, with the default window
    pub fn iter_pages(&self) -> IterPages {
        self.iter_pages_with(PageWindow::default())
    }

    /// Page numbers to render with custom thresholds.
    ///
    /// Yields the first `left_edge` pages, the pages from
    /// `page - left_current` through `page + right_current`, and the last
    /// `right_edge` pages. A single `None` stands for each run of skipped pages.
    pub fn iter_pages_with(&self, window: PageWindow) -> IterPages {
        IterPages {
            page: self.page,
            pages: self.pages(),
            window,
            next: 1,
            last: 0,
            pending: None,
        }
    }
}

impl<M: FromRow> Pagination<M> {
    /// Pagination for the previous page
    pub fn prev<Ex: Executor + ?Sized>(
        &self,
        executor: &Ex,
        error_out: bool,
    ) -> Result<Pagination<M>, HatchError> {
        self.neighbour(executor, to_i64(self.page).saturating_sub(1), error_out)
    }

    /// Pagination for the next page
    pub fn next<Ex: Executor + ?Sized>(
        &self,
        executor: &Ex,
        error_out: bool,
    ) -> Result<Pagination<M>, HatchError> {
        self.neighbour(executor, to_i64(self.page).saturating_add(1), error_out)
    }

    fn neighbour<Ex: Executor + ?Sized>(
        &self,
        executor: &Ex,
        page: i64,
        error_out: bool,
    ) -> Result<Pagination<M>, HatchError> {
        let source = self.source.as_ref().ok_or(HatchError::MissingSource)?;
        let options = Paginate::new()
            .page(page)
            .per_page(to_i64(self.per_page))
            .error_out(error_out);
        source.paginate(executor, None, options)
    }
}

impl<M: Serialize> Pagination<M> {
    /// JSON view of the page and its navigation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "page": self.page,
            "per_page": self.per_page,
            "total": self.total,
            "pages": self.pages(),
            "has_prev": self.has_prev(),
            "has_next": self.has_next(),
            "prev_num": self.prev_num(),
            "next_num": self.next_num(),
            "iter_pages": self.iter_pages().collect::<Vec<_>>(),
            "items": self.items,
        })
    }
}

/// Iterator returned by [`Pagination::iter_pages`]
///
/// Cheap to clone: a clone taken before iterating can be walked again.
#[derive(Debug, Clone)]
pub struct IterPages {
    page: u64,
    pages: u64,
    window: PageWindow,
    next: u64,
    last: u64,
    pending: Option<u64>,
}

impl IterPages {
    fn shown(&self, num: u64) -> bool {
        let w = &self.window;
        num <= w.left_edge
            || (num >= self.page.saturating_sub(w.left_current)
                && num <= self.page.saturating_add(w.right_current))
            || num > self.pages.saturating_sub(w.right_edge)
    }
}

impl Iterator for IterPages {
    type Item = Option<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(num) = self.pending.take() {
            self.last = num;
            return Some(Some(num));
        }
        while self.next <= self.pages {
            let num = self.next;
            self.next += 1;
            if !self.shown(num) {
                continue;
            }
            if self.last + 1 != num {
                self.pending = Some(num);
                return Some(None);
            }
            self.last = num;
            return Some(Some(num));
        }
        None
    }
}

impl<M: FromRow> QuerySet<M> {
    /// Return one page of this query
    ///
    /// With `options.error_out` set, the following fail with `NotFound`: a
    /// non-integer `page`/`per_page` request parameter, `page < 1`,
    /// `per_page < 0`, and an empty page other than the first. Otherwise the
    /// invalid values fall back to 1 and 20.
    pub fn paginate<Ex: Executor + ?Sized>(
        &self,
        executor: &Ex,
        request: Option<&RequestArgs>,
        options: Paginate,
    ) -> Result<Pagination<M>, HatchError> {
        let error_out = options.error_out;
        let page = resolve(options.page, request, "page", DEFAULT_PAGE, error_out)?;
        let mut per_page = resolve(options.per_page, request, "per_page", DEFAULT_PER_PAGE, error_out)?;

        if let Some(max) = options.max_per_page {
            per_page = per_page.min(max);
        }

        let page = if page < 1 {
            reject(error_out, "page must be at least 1")?;
            DEFAULT_PAGE
        } else {
            page
        };
        let per_page = if per_page < 0 {
            reject(error_out, "per_page must not be negative")?;
            DEFAULT_PER_PAGE
        } else {
            per_page
        };

        // Both are non-negative here
        let page = page as u64;
        let per_page = per_page as u64;

        let items = self
            .limit(per_page)
            .offset((page - 1).saturating_mul(per_page))
            .all(executor)?;

        if items.is_empty() && page != 1 && error_out {
            metrics::record_not_found();
            return Err(HatchError::not_found());
        }

        let total = if options.count {
            Some(self.count(executor)?)
        } else {
            None
        };

        Ok(Pagination::new(Some(self.clone()), page, per_page, total, items))
    }
}

fn resolve(
    explicit: Option<i64>,
    request: Option<&RequestArgs>,
    key: &str,
    default: i64,
    error_out: bool,
) -> Result<i64, HatchError> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    let Some(raw) = request.and_then(|args| args.get(key)) else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(value) => Ok(value),
        Err(_) if error_out => {
            metrics::record_not_found();
            Err(HatchError::not_found())
        }
        Err(_) => {
            log::debug!("ignoring non-integer {key}={raw:?}, using {default}");
            Ok(default)
        }
    }
}

fn reject(error_out: bool, reason: &str) -> Result<(), HatchError> {
    if error_out {
        metrics::record_not_found();
        return Err(HatchError::not_found());
    }
    log::debug!("{reason}; falling back to the default");
    Ok(())
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
