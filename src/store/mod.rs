//! Persistence for users and courses.
//!
//! Handlers only see the [`Store`] trait; `PgStore` backs it with Postgres
//! and `MemoryStore` keeps everything in process.

use async_trait::async_trait;
use uuid::Uuid;

mod memory;
mod pg;
mod records;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use records::{Course, CourseChanges, NewCourse, NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage-level unique constraint on `email_address` fired.
    #[error("a user with email address {0} already exists")]
    DuplicateEmail(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// All users registered under `email`, oldest first.
    async fn find_users_by_email(&self, email: &str) -> Result<Vec<User>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Every course, or only the one with the given id.
    async fn find_courses(&self, id: Option<Uuid>) -> Result<Vec<Course>, StoreError>;

    async fn create_course(&self, course: NewCourse) -> Result<Course, StoreError>;

    /// Applies `changes` to the course; an unknown id is a no-op.
    async fn update_course(&self, id: Uuid, changes: CourseChanges) -> Result<(), StoreError>;

    /// Removes the course; an unknown id is a no-op.
    async fn delete_course(&self, id: Uuid) -> Result<(), StoreError>;
}
