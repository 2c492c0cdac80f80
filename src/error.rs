use std::{any::Any, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use serde_json::json;
use thiserror::Error;
use tower::timeout::error::Elapsed;
use tracing::{error, warn};

use crate::{state::AppState, store::StoreError};

/// Why the authenticator turned a request away. Logged, never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Authentication header not found")]
    MissingHeader,
    #[error("No user found")]
    NoUser,
    #[error("Authentication unsuccessful")]
    BadCredentials,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(AuthFailure),
    #[error("validation failed: {}", .errors.join("; "))]
    Validation {
        status: StatusCode,
        errors: Vec<String>,
    },
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(status: StatusCode, errors: Vec<String>) -> Self {
        Self::Validation { status, errors }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Unwraps a JSON body. A request sent without a JSON content type counts
/// as an empty object so that field validation still reports what is
/// missing; any other rejection keeps its own status.
pub fn json_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

/// Attached to 500 responses so `report_unhandled` can log the full chain.
#[derive(Clone)]
pub struct UnhandledError(pub Arc<anyhow::Error>);

pub fn message_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

fn failure_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "message": message.into(), "error": {} })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(_) => message_body(StatusCode::UNAUTHORIZED, "Access denied"),
            AppError::Validation { status, errors } => {
                (status, Json(json!({ "errors": errors }))).into_response()
            }
            AppError::NotFound(message) => message_body(StatusCode::NOT_FOUND, message),
            AppError::Rejected { status, message } => failure_body(status, message),
            AppError::Internal(e) => {
                error!(error = %e, "unhandled error");
                let mut res = failure_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
                res.extensions_mut().insert(UnhandledError(Arc::new(e)));
                res
            }
        }
    }
}

/// Global error handler: logs the whole error chain of unhandled failures
/// when `ENABLE_GLOBAL_ERROR_LOGGING` is on.
pub async fn report_unhandled(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let mut res = next.run(req).await;
    if let Some(UnhandledError(e)) = res.extensions_mut().remove::<UnhandledError>() {
        if state.config.enable_global_error_logging {
            error!(%method, %uri, error = ?e, "global error handler");
        }
    }
    res
}

/// Renders a handler panic as a generic 500.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "handler panicked");
    failure_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Errors surfacing from the middleware stack. A request that outlives
/// `REQUEST_TIMEOUT_SECS` is answered 504.
pub async fn middleware_failure(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        warn!("request timed out");
        return failure_body(StatusCode::GATEWAY_TIMEOUT, "Request timed out");
    }
    error!(error = %err, "middleware failure");
    failure_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

pub async fn route_not_found() -> Response {
    message_body(StatusCode::NOT_FOUND, "Route Not Found")
}
