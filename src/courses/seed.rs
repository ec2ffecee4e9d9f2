use tracing::info;

use super::repo::{CourseStore, NewCourse};
use crate::error::AppResult;

fn course(
    title: &'static str,
    slug: &'static str,
    instructor: &'static str,
    category: &'static str,
    tag: &'static str,
    emoji: &'static str,
    level: &'static str,
) -> NewCourse {
    NewCourse {
        title,
        slug,
        description: None,
        instructor,
        category,
        tag,
        emoji,
        level,
        price: 0.0,
        original_price: 0.0,
        total_lessons: 0,
        total_hours: 0.0,
        rating: 0.0,
        review_count: 0,
    }
}

/// Starter catalog inserted into an empty database.
pub fn starter_catalog() -> Vec<NewCourse> {
    vec![
        NewCourse {
            price: 89.0,
            original_price: 149.0,
            total_lessons: 48,
            total_hours: 32.0,
            rating: 4.9,
            review_count: 8420,
            ..course("Python for Data Science & AI", "python-data-science-ai",
                     "Dr. Sarah Chen", "tech", "Python", "🐍", "Beginner")
        },
        NewCourse {
            price: 119.0,
            original_price: 189.0,
            total_lessons: 62,
            total_hours: 45.0,
            rating: 4.8,
            review_count: 6130,
            ..course("AWS Solutions Architect 2026", "aws-solutions-architect",
                     "Mark Rivera", "cloud", "Cloud", "☁️", "Intermediate")
        },
        NewCourse {
            price: 99.0,
            original_price: 159.0,
            total_lessons: 55,
            total_hours: 38.0,
            rating: 4.9,
            review_count: 12040,
            ..course("UI/UX Design Bootcamp", "ui-ux-design-bootcamp",
                     "Priya Sharma", "design", "Design", "🎨", "All Levels")
        },
        NewCourse {
            price: 109.0,
            original_price: 179.0,
            total_lessons: 72,
            total_hours: 54.0,
            rating: 4.8,
            review_count: 9210,
            ..course("React & Next.js 15 Complete", "react-nextjs-complete",
                     "Kevin Park", "tech", "React", "⚛️", "Intermediate")
        },
        NewCourse {
            price: 79.0,
            original_price: 129.0,
            total_lessons: 40,
            total_hours: 28.0,
            rating: 4.7,
            review_count: 4320,
            ..course("Business Analytics with Power BI", "business-analytics-power-bi",
                     "Emma Wilson", "data", "Data", "📈", "Beginner")
        },
        NewCourse {
            price: 99.0,
            original_price: 169.0,
            total_lessons: 85,
            total_hours: 62.0,
            rating: 4.8,
            review_count: 18200,
            ..course("Machine Learning A-Z", "machine-learning-az",
                     "Dr. Maria Santos", "data", "ML", "📊", "All Levels")
        },
        NewCourse {
            price: 149.0,
            original_price: 249.0,
            total_lessons: 120,
            total_hours: 90.0,
            rating: 4.7,
            review_count: 22100,
            ..course("Full Stack Web Dev Bootcamp", "full-stack-web-dev",
                     "Tom Bradley", "tech", "Full Stack", "🖥️", "All Levels")
        },
        NewCourse {
            price: 69.0,
            original_price: 119.0,
            total_lessons: 44,
            total_hours: 31.0,
            rating: 4.6,
            review_count: 5410,
            ..course("Digital Marketing Masterclass", "digital-marketing-masterclass",
                     "James Horner", "marketing", "Marketing", "📣", "Beginner")
        },
    ]
}

/// Inserts the starter catalog when no course exists yet. Returns how many were added.
pub async fn seed_if_empty(courses: &dyn CourseStore) -> AppResult<usize> {
    if courses.count().await? > 0 {
        info!("courses already seeded");
        return Ok(0);
    }
    let catalog = starter_catalog();
    for c in &catalog {
        courses.insert(c).await?;
    }
    info!(count = catalog.len(), "seeded starter catalog");
    Ok(catalog.len())
}
