use serde::{Deserialize, Deserializer, Serialize};

use super::repo::Course;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CourseListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    #[serde(deserialize_with = "int_or_unset")]
    pub page: Option<i64>,
    #[serde(deserialize_with = "int_or_unset")]
    pub per_page: Option<i64>,
}

/// An unparsable number only resets its own parameter to the default.
fn int_or_unset<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

#[derive(Debug, Serialize)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub total: i64,
    pub total_pages: i64,
}
