//! Field validators.
//!
//! Each rule is a plain predicate; a chain runs every rule of an endpoint in
//! declared order and collects the message of each one that fails.

use axum::http::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::{
    courses::dto::CourseBody,
    error::AppError,
    lenient::SubmittedId,
    store::{Store, StoreError},
    users::dto::NewUserBody,
};

pub const FIRST_NAME_REQUIRED: &str = "Please enter your first name";
pub const LAST_NAME_REQUIRED: &str = "Please enter your last name";
pub const EMAIL_REQUIRED: &str = "Please enter your email address";
pub const EMAIL_INVALID: &str = "Please ensure the email address entered is valid";
pub const EMAIL_TAKEN: &str = "Sorry, a user with that email address already exists";
pub const PASSWORD_REQUIRED: &str = "Please enter a password";
pub const TITLE_REQUIRED: &str = "Please enter a course title";
pub const DESCRIPTION_REQUIRED: &str = "Please enter a course description";
pub const NOT_AUTHORISED_TO_EDIT: &str = "Sorry, you are not authorised to edit this course";
pub const NOT_AUTHORISED_TO_DELETE: &str = "Sorry, you are not authorised to delete this course";

/// Non-null and non-empty.
pub fn required(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// A local part, then dot-separated non-empty domain labels ending in a
/// top-level label of at least two characters.
pub fn is_email(value: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@(?:[^@\s.]+\.)+[^@\s.]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(value)
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Failing messages of one request, in rule order.
#[derive(Debug, Default)]
pub struct Violations(Vec<&'static str>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, passed: bool, message: &'static str) -> &mut Self {
        if !passed {
            self.0.push(message);
        }
        self
    }

    pub fn contains(&self, message: &str) -> bool {
        self.0.iter().any(|m| *m == message)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_error(self, status: StatusCode) -> AppError {
        AppError::validation(status, self.0.into_iter().map(String::from).collect())
    }
}

/// `POST /api/users`. The uniqueness rule queries the store and only runs
/// for a non-empty address.
pub async fn new_user(store: &dyn Store, body: &NewUserBody) -> Result<(), AppError> {
    let email = body.email_address.as_deref();
    let normalized = email.map(normalize_email);

    let taken = match normalized.as_deref() {
        Some(e) if !e.is_empty() => !store.find_users_by_email(e).await?.is_empty(),
        _ => false,
    };

    let mut v = Violations::new();
    v.check(required(body.first_name.as_deref()), FIRST_NAME_REQUIRED)
        .check(required(body.last_name.as_deref()), LAST_NAME_REQUIRED)
        .check(required(email), EMAIL_REQUIRED)
        .check(normalized.as_deref().is_some_and(is_email), EMAIL_INVALID)
        .check(!taken, EMAIL_TAKEN)
        .check(required(body.password.as_deref()), PASSWORD_REQUIRED);

    if v.is_empty() {
        Ok(())
    } else {
        Err(v.into_error(StatusCode::BAD_REQUEST))
    }
}

/// Maps a storage-level duplicate back to the same 400 the uniqueness rule
/// produces.
pub fn duplicate_email(e: StoreError) -> AppError {
    match e {
        StoreError::DuplicateEmail(_) => {
            AppError::validation(StatusCode::BAD_REQUEST, vec![EMAIL_TAKEN.to_string()])
        }
        other => other.into(),
    }
}

fn course_fields(v: &mut Violations, body: &CourseBody) {
    v.check(required(body.title.as_deref()), TITLE_REQUIRED)
        .check(required(body.description.as_deref()), DESCRIPTION_REQUIRED);
}

/// `POST /api/courses`.
pub fn course(body: &CourseBody) -> Result<(), AppError> {
    let mut v = Violations::new();
    course_fields(&mut v, body);
    if v.is_empty() {
        Ok(())
    } else {
        Err(v.into_error(StatusCode::BAD_REQUEST))
    }
}

/// `PUT /api/courses/:id`. The submitted `userId` must be the caller's or
/// absent (a value that is not a UUID never matches), and the stored owner must be the caller. If the edit message is
/// among the failures the whole response is 403.
pub fn course_update(body: &CourseBody, caller: Uuid, owner: Uuid) -> Result<(), AppError> {
    let mut v = Violations::new();
    course_fields(&mut v, body);
    let owns = owner == caller && body.user_id.map_or(true, |id| id == SubmittedId::Id(caller));
    v.check(owns, NOT_AUTHORISED_TO_EDIT);

    if v.is_empty() {
        return Ok(());
    }
    let status = if v.contains(NOT_AUTHORISED_TO_EDIT) {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::BAD_REQUEST
    };
    Err(v.into_error(status))
}

/// `DELETE /api/courses/:id`. Only the ownership rule exists here, so any
/// failure is 403.
pub fn course_delete(caller: Uuid, owner: Uuid) -> Result<(), AppError> {
    let mut v = Violations::new();
    v.check(owner == caller, NOT_AUTHORISED_TO_DELETE);
    if v.is_empty() {
        Ok(())
    } else {
        Err(v.into_error(StatusCode::FORBIDDEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewUser};

    fn errors_of(err: AppError) -> (StatusCode, Vec<String>) {
        match err {
            AppError::Validation { status, errors } => (status, errors),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn user_body(first: &str, last: &str, email: &str, password: &str) -> NewUserBody {
        let opt = |s: &str| Some(s.to_string());
        NewUserBody {
            first_name: opt(first),
            last_name: opt(last),
            email_address: opt(email),
            password: opt(password),
        }
    }

    fn course_body(title: Option<&str>, description: Option<&str>, user_id: Option<Uuid>) -> CourseBody {
        CourseBody {
            user_id: user_id.map(SubmittedId::Id),
            title: title.map(String::from),
            description: description.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn required_rejects_null_and_empty() {
        assert!(!required(None));
        assert!(!required(Some("")));
        assert!(required(Some(" ")));
        assert!(required(Some("Jo")));
    }

    #[test]
    fn email_syntax() {
        assert!(is_email("jo@x.com"));
        assert!(is_email("first.last+tag@sub.example.org"));
        assert!(!is_email(""));
        assert!(!is_email("jo"));
        assert!(!is_email("jo@x"));
        assert!(!is_email("jo @x.com"));
        assert!(!is_email("a@b.c"));
        assert!(!is_email("jo@x..com"));
        assert!(!is_email("jo@.x.com"));
        assert!(!is_email("jo@x.com."));
        assert!(is_email("jo@mail.x.io"));
        assert_eq!(normalize_email("  Jo@X.com "), "jo@x.com");
    }

    #[tokio::test]
    async fn empty_user_body_collects_every_message_in_order() {
        let store = MemoryStore::new();
        let err = new_user(&store, &NewUserBody::default()).await.unwrap_err();
        let (status, errors) = errors_of(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            errors,
            vec![
                FIRST_NAME_REQUIRED,
                LAST_NAME_REQUIRED,
                EMAIL_REQUIRED,
                EMAIL_INVALID,
                PASSWORD_REQUIRED,
            ]
        );
    }

    #[tokio::test]
    async fn malformed_email_only_reports_format() {
        let store = MemoryStore::new();
        let err = new_user(&store, &user_body("Jo", "Li", "not-an-email", "pw"))
            .await
            .unwrap_err();
        assert_eq!(errors_of(err).1, vec![EMAIL_INVALID]);
    }

    #[tokio::test]
    async fn registered_email_is_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store
            .create_user(NewUser {
                first_name: "Jo".into(),
                last_name: "Li".into(),
                email_address: "jo@x.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        let err = new_user(&store, &user_body("Jo", "Li", "JO@x.com", "pw"))
            .await
            .unwrap_err();
        assert_eq!(errors_of(err), (StatusCode::BAD_REQUEST, vec![EMAIL_TAKEN.to_string()]));

        assert!(new_user(&store, &user_body("Al", "Bo", "al@x.com", "pw")).await.is_ok());
    }

    #[test]
    fn duplicate_email_store_error_maps_to_taken_message() {
        let (status, errors) = errors_of(duplicate_email(StoreError::DuplicateEmail("jo@x.com".into())));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors, vec![EMAIL_TAKEN]);

        let other = duplicate_email(StoreError::Other(anyhow::anyhow!("down")));
        assert!(matches!(other, AppError::Internal(_)));
    }

    #[test]
    fn course_requires_title_and_description() {
        assert!(course(&course_body(Some("T"), Some("D"), None)).is_ok());
        let (status, errors) = errors_of(course(&course_body(None, Some(""), None)).unwrap_err());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors, vec![TITLE_REQUIRED, DESCRIPTION_REQUIRED]);
    }

    #[test]
    fn update_by_owner_passes_with_or_without_user_id() {
        let me = Uuid::new_v4();
        assert!(course_update(&course_body(Some("T"), Some("D"), None), me, me).is_ok());
        assert!(course_update(&course_body(Some("T"), Some("D"), Some(me)), me, me).is_ok());
    }

    #[test]
    fn update_field_errors_alone_are_400() {
        let me = Uuid::new_v4();
        let (status, errors) =
            errors_of(course_update(&course_body(Some("T"), None, None), me, me).unwrap_err());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors, vec![DESCRIPTION_REQUIRED]);
    }

    #[test]
    fn update_ownership_failure_is_403_even_mixed_with_field_errors() {
        let me = Uuid::new_v4();
        let someone = Uuid::new_v4();

        let (status, errors) =
            errors_of(course_update(&course_body(None, None, Some(someone)), me, me).unwrap_err());
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(errors, vec![TITLE_REQUIRED, DESCRIPTION_REQUIRED, NOT_AUTHORISED_TO_EDIT]);

        // Omitting userId does not let a non-owner through.
        let (status, errors) =
            errors_of(course_update(&course_body(Some("T"), Some("D"), None), me, someone).unwrap_err());
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(errors, vec![NOT_AUTHORISED_TO_EDIT]);
    }

    #[test]
    fn update_with_unreadable_user_id_is_403() {
        let me = Uuid::new_v4();
        let body = CourseBody {
            user_id: Some(SubmittedId::Malformed),
            ..course_body(Some("T"), Some("D"), None)
        };
        let (status, errors) = errors_of(course_update(&body, me, me).unwrap_err());
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(errors, vec![NOT_AUTHORISED_TO_EDIT]);
    }

    #[test]
    fn delete_is_owner_only_and_always_403() {
        let me = Uuid::new_v4();
        assert!(course_delete(me, me).is_ok());
        let (status, errors) = errors_of(course_delete(me, Uuid::new_v4()).unwrap_err());
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(errors, vec![NOT_AUTHORISED_TO_DELETE]);
    }
}
