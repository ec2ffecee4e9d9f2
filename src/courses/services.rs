use super::{
    dto::{CourseListQuery, CoursePage},
    repo::{CourseFilter, CourseStore, SortOrder},
};
use crate::error::AppResult;

pub const DEFAULT_PER_PAGE: i64 = 12;
pub const MAX_PER_PAGE: i64 = 100;

/// 1-indexed page window. Out-of-range inputs are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn resolve(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let per_page = match per_page {
            Some(n) if n >= 1 => n.min(MAX_PER_PAGE),
            _ => DEFAULT_PER_PAGE,
        };
        Self { page, per_page }
    }

    pub fn offset(self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn total_pages(self, total: i64) -> i64 {
        (total + self.per_page - 1) / self.per_page
    }
}

impl CourseListQuery {
    pub fn filter(&self) -> CourseFilter {
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "all")
            .map(String::from);
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        let sort = self
            .sort
            .as_deref()
            .map(SortOrder::from_param)
            .unwrap_or_default();
        CourseFilter {
            category,
            search,
            sort,
        }
    }
}

pub async fn list(courses: &dyn CourseStore, query: &CourseListQuery) -> AppResult<CoursePage> {
    let filter = query.filter();
    let window = PageWindow::resolve(query.page, query.per_page);
    let (items, total) = courses
        .list_published(&filter, window.per_page, window.offset())
        .await?;
    Ok(CoursePage {
        courses: items,
        total,
        total_pages: window.total_pages(total),
    })
}
