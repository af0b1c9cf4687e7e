//! Paginator view-model
//!
//! Turns the current page, page length, total/more knowledge and the number
//! of rows actually fetched into the page links a list view shows.

use crate::domain::query::QueryState;
use serde::Serialize;

pub const DEFAULT_PAGES_TO_SHOW: u64 = 3;

/// Everything the paginator looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInput {
    pub page: u64,
    pub len: u64,
    pub total: Option<u64>,
    pub more: Option<bool>,
    pub fetched: usize,
}

impl PageInput {
    pub fn from_state(state: &QueryState, fetched: usize) -> Self {
        PageInput {
            page: state.page(),
            len: state.len(),
            total: state.total(),
            more: state.more(),
            fetched,
        }
    }
}

/// One link of the paginator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: u64,
    pub text: String,
    pub active: bool,
    pub enabled: bool,
}

impl PageLink {
    fn new(page: u64, text: impl Into<String>, active: bool, enabled: bool) -> Self {
        PageLink {
            page,
            text: text.into(),
            active,
            enabled,
        }
    }
}

/// Rendered paginator state.
///
/// `links` holds, in order: first, previous, the page window, next, last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub len: u64,
    pub from: u64,
    pub to: u64,
    pub total: Option<u64>,
    pub more: Option<bool>,
    pub last: u64,
    pub links: Vec<PageLink>,
}

impl Pagination {
    pub fn first(&self) -> &PageLink {
        &self.links[0]
    }

    pub fn prev(&self) -> &PageLink {
        &self.links[1]
    }

    pub fn window(&self) -> &[PageLink] {
        &self.links[2..self.links.len() - 2]
    }

    pub fn next(&self) -> &PageLink {
        &self.links[self.links.len() - 2]
    }

    pub fn last_link(&self) -> &PageLink {
        &self.links[self.links.len() - 1]
    }
}

/// Compute the paginator.
///
/// `pages_to_show` pages are shown before the current one and the window
/// spans `2 * pages_to_show + 1` slots from its start, never past `last`.
/// With an unknown total, `last` is optimistic (`page + 3`) while more rows
/// may exist and frozen at `page` otherwise. The last-page link is enabled
/// only when the total is known and more rows exist.
///
/// ```
/// use crudkit::domain::paginator::{paginate, PageInput};
///
/// let p = paginate(
///     PageInput { page: 1, len: 10, total: Some(25), more: Some(true), fetched: 10 },
///     3,
/// );
/// assert_eq!((p.from, p.to, p.last), (1, 10, 3));
/// ```
pub fn paginate(input: PageInput, pages_to_show: u64) -> Pagination {
    let pages_to_show = if pages_to_show == 0 {
        DEFAULT_PAGES_TO_SHOW
    } else {
        pages_to_show
    };
    let page = input.page.max(1);
    let len = input.len.max(1);
    let more = input.more.unwrap_or(false);

    let mut from = (page - 1).saturating_mul(len).saturating_add(1);
    let to = from.saturating_add(input.fetched as u64) - 1;

    let last = match input.total {
        Some(total) => total.div_ceil(len),
        None if more => page.saturating_add(3),
        None => page,
    };

    let mut links = Vec::new();
    links.push(PageLink::new(1, "««", false, page > 1));
    links.push(PageLink::new(page.saturating_sub(1).max(1), "«", false, page > 1));

    let begin = page.saturating_sub(pages_to_show).max(1);
    let end = begin.saturating_add(pages_to_show.saturating_mul(2).saturating_add(1));
    for c in begin..end {
        if c > last {
            break;
        }
        links.push(PageLink::new(c, c.to_string(), c == page, c <= last));
    }

    links.push(PageLink::new(page.saturating_add(1), "»", false, more));
    links.push(PageLink::new(
        last,
        "»»",
        false,
        input.total.is_some() && more,
    ));

    if page == 1 && input.fetched == 0 {
        from = 0;
    }

    let total = if more { input.total } else { Some(to) };

    Pagination {
        page,
        len,
        from,
        to,
        total,
        more: input.more,
        last,
        links,
    }
}
