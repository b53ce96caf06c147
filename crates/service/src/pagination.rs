//! Pagination for admin listings.

use serde::Serialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to sane defaults; returns `(page_index, per_page)`.
    pub fn normalize(self) -> (usize, usize) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as usize, per_page as usize)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

/// One page of an already ordered listing.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

pub fn paginate<T>(items: Vec<T>, p: Pagination) -> Page<T> {
    let (idx, per) = p.normalize();
    let total = items.len();
    let items = items.into_iter().skip(idx * per).take(per).collect();
    Page { items, total, page: idx as u32 + 1, per_page: per as u32 }
}
