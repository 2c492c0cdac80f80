use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Course, CourseChanges, NewCourse, NewUser, Store, StoreError, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    courses: Vec<Course>,
}

/// Process-local store with the same contract as `PgStore`, including the
/// unique email backstop. Rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user row as-is, bypassing the unique email check, to
    /// reproduce legacy data that predates the constraint.
    #[cfg(test)]
    pub(crate) async fn insert_user_unchecked(&self, user: NewUser) -> User {
        let mut tables = self.tables.write().await;
        let user = new_user_row(user);
        tables.users.push(user.clone());
        user
    }
}

fn new_user_row(user: NewUser) -> User {
    let now = OffsetDateTime::now_utc();
    User {
        id: Uuid::new_v4(),
        first_name: user.first_name,
        last_name: user.last_name,
        email_address: user.email_address,
        password_hash: user.password_hash,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_users_by_email(&self, email: &str) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.email_address == email)
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email_address == user.email_address)
        {
            return Err(StoreError::DuplicateEmail(user.email_address));
        }
        let user = new_user_row(user);
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_courses(&self, id: Option<Uuid>) -> Result<Vec<Course>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .filter(|c| id.map_or(true, |id| c.id == id))
            .cloned()
            .collect())
    }

    async fn create_course(&self, course: NewCourse) -> Result<Course, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == course.user_id) {
            return Err(anyhow::anyhow!("course owner {} does not exist", course.user_id).into());
        }
        let now = OffsetDateTime::now_utc();
        let course = Course {
            id: Uuid::new_v4(),
            user_id: course.user_id,
            title: course.title,
            description: course.description,
            estimated_time: course.estimated_time,
            materials_needed: course.materials_needed,
            created_at: now,
            updated_at: now,
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(&self, id: Uuid, changes: CourseChanges) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(());
        };
        if let Some(user_id) = changes.user_id {
            course.user_id = user_id;
        }
        if let Some(title) = changes.title {
            course.title = title;
        }
        if let Some(description) = changes.description {
            course.description = description;
        }
        if let Some(estimated_time) = changes.estimated_time {
            course.estimated_time = estimated_time;
        }
        if let Some(materials_needed) = changes.materials_needed {
            course.materials_needed = materials_needed;
        }
        course.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn delete_course(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.courses.retain(|c| c.id != id);
        Ok(())
    }
}
