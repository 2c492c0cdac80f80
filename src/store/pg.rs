use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use super::{Course, CourseChanges, NewCourse, NewUser, Store, StoreError, User};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email_address, password_hash, created_at, updated_at";
const COURSE_COLUMNS: &str = "id, user_id, title, description, estimated_time, materials_needed, \
     created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .context("connect to database")?;
        info!(max_connections, "database pool ready");
        Ok(Self { db })
    }

    /// Applies `migrations/`; a failure is logged and startup continues.
    pub async fn migrate(&self) {
        if let Err(e) = sqlx::migrate!("./migrations").run(&self.db).await {
            warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }
    }
}

fn map_insert_error(e: sqlx::Error, email: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateEmail(email.to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_users_by_email(&self, email: &str) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email_address = $1 ORDER BY created_at, id"
        ))
        .bind(email)
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email_address, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email_address)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_insert_error(e, &user.email_address))?;
        Ok(created)
    }

    async fn find_courses(&self, id: Option<Uuid>) -> Result<Vec<Course>, StoreError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE $1::uuid IS NULL OR id = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(id)
        .fetch_all(&self.db)
        .await?;
        Ok(courses)
    }

    async fn create_course(&self, course: NewCourse) -> Result<Course, StoreError> {
        let created = sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (user_id, title, description, estimated_time, materials_needed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(course.user_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.estimated_time)
        .bind(&course.materials_needed)
        .fetch_one(&self.db)
        .await?;
        Ok(created)
    }

    async fn update_course(&self, id: Uuid, changes: CourseChanges) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE courses
               SET user_id          = COALESCE($2, user_id),
                   title            = COALESCE($3, title),
                   description      = COALESCE($4, description),
                   estimated_time   = CASE WHEN $5 THEN $6 ELSE estimated_time END,
                   materials_needed = CASE WHEN $7 THEN $8 ELSE materials_needed END,
                   updated_at       = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.user_id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.estimated_time.is_some())
        .bind(changes.estimated_time.flatten())
        .bind(changes.materials_needed.is_some())
        .bind(changes.materials_needed.flatten())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_course(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
