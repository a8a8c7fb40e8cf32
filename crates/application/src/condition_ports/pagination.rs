use runlist_domain::Condition;
use serde::Serialize;

/// One page of conditions with paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionPage {
    /// Total number of matching conditions.
    pub total_count: usize,
    /// Number of pages, never less than one.
    pub page_count: usize,
    /// Whether a later page exists.
    pub has_more: bool,
    /// Conditions on the requested page.
    pub items: Vec<Condition>,
}

impl ConditionPage {
    /// Builds a page from the requested window and the total count.
    ///
    /// `per_page` must be non-zero.
    #[must_use]
    pub fn new(items: Vec<Condition>, total_count: usize, page: usize, per_page: usize) -> Self {
        Self {
            total_count,
            page_count: total_count.div_ceil(per_page).max(1),
            has_more: page.saturating_add(1).saturating_mul(per_page) < total_count,
            items,
        }
    }
}
