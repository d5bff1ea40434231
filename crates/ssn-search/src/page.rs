use serde::Serialize;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Slice one page out of an ordered result set.
///
/// `page` is 1-based and defaults to 1; `per_page` defaults to
/// [`DEFAULT_PER_PAGE`] and is clamped to `1..=MAX_PER_PAGE`. Asking for a
/// page past the end returns no items but still reports the totals.
#[must_use]
pub fn paginate<T: Serialize>(
    items: Vec<T>,
    page: Option<usize>,
    per_page: Option<usize>,
) -> Page<T> {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page);
    let items = items.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        total,
        page,
        per_page,
        total_pages,
    }
}
