use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CourseBody, CourseSummary};
use crate::{
    auth::CurrentUser,
    error::{json_body, AppError},
    lenient::SubmittedId,
    state::AppState,
    store::{Course, NewCourse},
    validation,
};

const NO_COURSES: &str = "No courses found";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route(
            "/api/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

/// Looks up one course; ids that are not UUIDs cannot exist.
async fn find_course(state: &AppState, raw_id: &str) -> Result<Course, AppError> {
    let id = raw_id
        .parse::<Uuid>()
        .map_err(|_| AppError::NotFound(NO_COURSES))?;
    state
        .store
        .find_courses(Some(id))
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound(NO_COURSES))
}

#[instrument(skip(state))]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let courses = state.store.find_courses(None).await?;
    Ok(Json(courses.into_iter().map(CourseSummary::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Course>>, AppError> {
    let course = find_course(&state, &id).await?;
    Ok(Json(vec![course]))
}

#[instrument(skip_all)]
pub async fn create_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CourseBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(payload)?;
    validation::course(&body)?;

    let (Some(title), Some(description)) = (body.title, body.description) else {
        return Err(anyhow::anyhow!("validated course body is missing fields").into());
    };
    let owner = match body.user_id {
        Some(SubmittedId::Id(id)) => id,
        Some(SubmittedId::Malformed) => {
            warn!(user_id = %user.id, "ignoring unreadable userId on course create");
            user.id
        }
        None => user.id,
    };
    let course = state
        .store
        .create_course(NewCourse {
            user_id: owner,
            title,
            description,
            estimated_time: body.estimated_time.flatten(),
            materials_needed: body.materials_needed.flatten(),
        })
        .await?;

    info!(course_id = %course.id, user_id = %user.id, "course created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/courses/{}", course.id))],
    ))
}

#[instrument(skip_all)]
pub async fn update_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<CourseBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    // Body errors are reported before the course is looked up.
    let body = json_body(payload)?;
    let course = find_course(&state, &id).await?;
    validation::course_update(&body, user.id, course.user_id)?;

    state.store.update_course(course.id, body.into()).await?;

    info!(course_id = %course.id, user_id = %user.id, "course updated");
    Ok((
        StatusCode::NO_CONTENT,
        [(header::LOCATION, format!("/api/courses/{}", course.id))],
    ))
}

#[instrument(skip_all)]
pub async fn delete_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let course = find_course(&state, &id).await?;
    validation::course_delete(user.id, course.user_id)?;

    state.store.delete_course(course.id).await?;

    info!(course_id = %course.id, user_id = %user.id, "course deleted");
    Ok(StatusCode::NO_CONTENT)
}
