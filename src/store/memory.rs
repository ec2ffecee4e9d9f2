//! In-process store for tests. One mutex stands in for a database transaction,
//! and the uniqueness rules mirror the Postgres indexes.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::repo::{NewUser, ProfileUpdate, User, UserStore, EMAIL_TAKEN},
    certificates::{
        repo::{Certificate, CertificateStore, CertificateView, CODE_COLLISION},
        services::generate_code,
    },
    contact::repo::{ContactMessage, ContactStore, NewContactMessage},
    courses::repo::{Course, CourseFilter, CourseStore, NewCourse, SortOrder},
    enrollments::{
        repo::{Enrollment, EnrollmentStore, ProgressOutcome, ALREADY_ENROLLED},
        services::{apply_progress, ProgressUpdate},
    },
    error::{AppError, AppResult},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    certificates: Vec<Certificate>,
    contacts: Vec<ContactMessage>,
    unpublished: Vec<i64>,
    forced_code: Option<String>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Returns the certificate for the pair and whether it was created now.
    fn issue(&mut self, user_id: i64, course_id: i64) -> AppResult<(Certificate, bool)> {
        if let Some(existing) = self
            .certificates
            .iter()
            .find(|c| c.user_id == user_id && c.course_id == course_id)
        {
            return Ok((existing.clone(), false));
        }
        let code = self.forced_code.take().unwrap_or_else(generate_code);
        if self.certificates.iter().any(|c| c.certificate_code == code) {
            return Err(AppError::conflict(CODE_COLLISION));
        }
        let cert = Certificate {
            id: self.next_id(),
            user_id,
            course_id,
            certificate_code: code,
            issued_at: OffsetDateTime::now_utc(),
        };
        self.certificates.push(cert.clone());
        Ok((cert, true))
    }
}

fn course_matches(filter: &CourseFilter, c: &Course) -> bool {
    if let Some(cat) = &filter.category {
        if &c.category != cat {
            return false;
        }
    }
    if let Some(term) = &filter.search {
        let term = term.to_lowercase();
        return c.title.to_lowercase().contains(&term)
            || c.instructor.to_lowercase().contains(&term);
    }
    true
}

/// Same orderings as `SortOrder::order_by`, ties broken by id.
fn sort_courses(sort: SortOrder, items: &mut [Course]) {
    match sort {
        SortOrder::Popular => {
            items.sort_by(|a, b| b.review_count.cmp(&a.review_count).then(a.id.cmp(&b.id)))
        }
        SortOrder::Newest => {
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
        }
        SortOrder::Rating => {
            items.sort_by(|a, b| b.rating.total_cmp(&a.rating).then(a.id.cmp(&b.id)))
        }
        SortOrder::PriceLow => {
            items.sort_by(|a, b| a.price.total_cmp(&b.price).then(a.id.cmp(&b.id)))
        }
        SortOrder::PriceHigh => {
            items.sort_by(|a, b| b.price.total_cmp(&a.price).then(a.id.cmp(&b.id)))
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    /// Inserts an active user with a placeholder hash and returns its id.
    pub fn insert_test_user(&self, email: &str) -> i64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.users.push(User {
            id,
            first_name: "Test".into(),
            last_name: "User".into(),
            email: email.to_lowercase(),
            password_hash: "$argon2id$placeholder".into(),
            avatar_url: None,
            bio: None,
            learning_goal: None,
            plan: "starter".into(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        });
        id
    }

    pub fn deactivate_user_by_email(&self, email: &str) {
        let mut t = self.lock();
        if let Some(u) = t.users.iter_mut().find(|u| u.email == email) {
            u.is_active = false;
        }
    }

    pub fn unpublish_course_by_slug(&self, slug: &str) {
        let mut t = self.lock();
        if let Some(id) = t.courses.iter().find(|c| c.slug == slug).map(|c| c.id) {
            t.unpublished.push(id);
        }
    }

    /// The next generated certificate code will be `code`.
    pub fn force_next_certificate_code(&self, code: &str) {
        self.lock().forced_code = Some(code.to_string());
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(AppError::conflict(EMAIL_TAKEN));
        }
        let user = User {
            id: t.next_id(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            avatar_url: None,
            bio: None,
            learning_goal: None,
            plan: "starter".into(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> AppResult<Option<User>> {
        let mut t = self.lock();
        Ok(t.users.iter_mut().find(|u| u.id == id).map(|u| {
            update.apply(u);
            u.clone()
        }))
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn list_published(
        &self,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Course>, i64)> {
        let t = self.lock();
        let mut hits: Vec<Course> = t
            .courses
            .iter()
            .filter(|c| !t.unpublished.contains(&c.id) && course_matches(filter, c))
            .cloned()
            .collect();
        sort_courses(filter.sort, &mut hits);
        let total = hits.len() as i64;
        let page = hits
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Course>> {
        Ok(self.lock().courses.iter().find(|c| c.id == id).cloned())
    }

    async fn find_many(&self, ids: &[i64]) -> AppResult<Vec<Course>> {
        Ok(self
            .lock()
            .courses
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.lock().courses.len() as i64)
    }

    async fn insert(&self, c: &NewCourse) -> AppResult<Course> {
        let mut t = self.lock();
        if t.courses.iter().any(|existing| existing.slug == c.slug) {
            return Err(AppError::conflict("Course slug already exists."));
        }
        let course = Course {
            id: t.next_id(),
            title: c.title.into(),
            slug: c.slug.into(),
            description: c.description.map(String::from),
            instructor: c.instructor.into(),
            category: c.category.into(),
            tag: Some(c.tag.into()),
            emoji: Some(c.emoji.into()),
            level: c.level.into(),
            price: c.price,
            original_price: Some(c.original_price),
            total_lessons: c.total_lessons,
            total_hours: c.total_hours,
            rating: c.rating,
            review_count: c.review_count,
            created_at: OffsetDateTime::now_utc(),
        };
        t.courses.push(course.clone());
        Ok(course)
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn find(&self, user_id: i64, course_id: i64) -> AppResult<Option<Enrollment>> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn create(&self, user_id: i64, course_id: i64) -> AppResult<Enrollment> {
        let mut t = self.lock();
        if t
            .enrollments
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == course_id)
        {
            return Err(AppError::conflict(ALREADY_ENROLLED));
        }
        if !t.courses.iter().any(|c| c.id == course_id) {
            return Err(anyhow::anyhow!("enrollments_course_id_fkey violated").into());
        }
        let now = OffsetDateTime::now_utc();
        let enrollment = Enrollment {
            id: t.next_id(),
            user_id,
            course_id,
            lessons_completed: 0,
            progress_percent: 0.0,
            time_spent_minutes: 0,
            enrolled_at: now,
            last_accessed_at: now,
            completed_at: None,
        };
        t.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        update: &ProgressUpdate,
        now: OffsetDateTime,
    ) -> AppResult<Option<ProgressOutcome>> {
        let mut t = self.lock();
        let Some(idx) = t
            .enrollments
            .iter()
            .position(|e| e.user_id == user_id && e.course_id == course_id)
        else {
            return Ok(None);
        };
        let total_lessons = t
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .map_or(0, |c| c.total_lessons);

        // Work on a copy so a failed certificate insert leaves the row untouched.
        let mut enrollment = t.enrollments[idx].clone();
        let completed_now = apply_progress(&mut enrollment, total_lessons, update, now);
        let certificate = if completed_now {
            let (cert, created) = t.issue(user_id, course_id)?;
            created.then_some(cert)
        } else {
            None
        };
        t.enrollments[idx] = enrollment.clone();

        Ok(Some(ProgressOutcome {
            enrollment,
            certificate,
        }))
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<(Enrollment, Course)>> {
        let t = self.lock();
        Ok(t.enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| {
                t.courses
                    .iter()
                    .find(|c| c.id == e.course_id)
                    .map(|c| (e.clone(), c.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl CertificateStore for MemoryStore {
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<CertificateView>> {
        let t = self.lock();
        Ok(t.certificates
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| CertificateView {
                id: c.id,
                course_title: t
                    .courses
                    .iter()
                    .find(|co| co.id == c.course_id)
                    .map(|co| co.title.clone()),
                certificate_code: c.certificate_code.clone(),
                issued_at: c.issued_at,
            })
            .collect())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert(&self, msg: NewContactMessage) -> AppResult<ContactMessage> {
        let mut t = self.lock();
        let stored = ContactMessage {
            id: t.next_id(),
            user_id: msg.user_id,
            first_name: msg.first_name,
            last_name: msg.last_name,
            email: msg.email,
            company: msg.company,
            topic: msg.topic,
            message: msg.message,
            is_read: false,
            created_at: OffsetDateTime::now_utc(),
        };
        t.contacts.push(stored.clone());
        Ok(stored)
    }
}
