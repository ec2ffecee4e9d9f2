use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    error::{conflict_on_unique, AppResult},
    store::PgStore,
};

/// Catalog entry. Read-only to end users; only published rows are listed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub instructor: String,
    pub category: String,
    pub tag: Option<String>,
    pub emoji: Option<String>,
    pub level: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub total_lessons: i32,
    pub total_hours: f64,
    pub rating: f64,
    pub review_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: &'static str,
    pub slug: &'static str,
    pub description: Option<&'static str>,
    pub instructor: &'static str,
    pub category: &'static str,
    pub tag: &'static str,
    pub emoji: &'static str,
    pub level: &'static str,
    pub price: f64,
    pub original_price: f64,
    pub total_lessons: i32,
    pub total_hours: f64,
    pub rating: f64,
    pub review_count: i32,
}

/// The five fixed catalog orderings. Unknown names fall back to `Popular`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Popular,
    Newest,
    Rating,
    PriceLow,
    PriceHigh,
}

impl SortOrder {
    pub fn from_param(raw: &str) -> Self {
        match raw {
            "newest" => SortOrder::Newest,
            "rating" => SortOrder::Rating,
            "price-lo" => SortOrder::PriceLow,
            "price-hi" => SortOrder::PriceHigh,
            _ => SortOrder::Popular,
        }
    }

    pub(crate) fn order_by(self) -> &'static str {
        match self {
            SortOrder::Popular => "review_count DESC, id ASC",
            SortOrder::Newest => "created_at DESC, id DESC",
            SortOrder::Rating => "rating DESC, id ASC",
            SortOrder::PriceLow => "price ASC, id ASC",
            SortOrder::PriceHigh => "price DESC, id ASC",
        }
    }
}

/// Catalog query after normalisation: `category == "all"` and blank search are already `None`.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// One page of published courses plus the total match count.
    async fn list_published(
        &self,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Course>, i64)>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Course>>;
    async fn find_many(&self, ids: &[i64]) -> AppResult<Vec<Course>>;
    async fn count(&self) -> AppResult<i64>;
    async fn insert(&self, course: &NewCourse) -> AppResult<Course>;
}

const COURSE_COLUMNS: &str = "id, title, slug, description, instructor, category, tag, emoji, \
                              level, price::float8 AS price, original_price::float8 AS original_price, \
                              total_lessons, total_hours, rating, review_count, created_at";

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a CourseFilter) {
    qb.push(" WHERE is_published = TRUE");
    if let Some(cat) = &filter.category {
        qb.push(" AND category = ").push_bind(cat);
    }
    if let Some(term) = &filter.search {
        let like = escape_like(term);
        qb.push(" AND (title ILIKE ")
            .push_bind(like.clone())
            .push(" OR instructor ILIKE ")
            .push_bind(like)
            .push(")");
    }
}

#[async_trait]
impl CourseStore for PgStore {
    async fn list_published(
        &self,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Course>, i64)> {
        let mut count_q = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses");
        push_filter(&mut count_q, filter);
        let total: i64 = count_q
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut page_q = QueryBuilder::<Postgres>::new(format!("SELECT {COURSE_COLUMNS} FROM courses"));
        push_filter(&mut page_q, filter);
        page_q
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let items = page_q
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn find_many(&self, ids: &[i64]) -> AppResult<Vec<Course>> {
        let rows = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count(&self) -> AppResult<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn insert(&self, c: &NewCourse) -> AppResult<Course> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (title, slug, description, instructor, category, tag, emoji, level,
                                 price, original_price, total_lessons, total_hours, rating, review_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::numeric, $10::numeric, $11, $12, $13, $14)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(c.title)
        .bind(c.slug)
        .bind(c.description)
        .bind(c.instructor)
        .bind(c.category)
        .bind(c.tag)
        .bind(c.emoji)
        .bind(c.level)
        .bind(c.price)
        .bind(c.original_price)
        .bind(c.total_lessons)
        .bind(c.total_hours)
        .bind(c.rating)
        .bind(c.review_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Course slug already exists."))
    }
}
