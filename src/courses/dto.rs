use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    lenient::{self, SubmittedId},
    store::{Course, CourseChanges},
};

/// Request body for creating or updating a course.
///
/// `estimatedTime`/`materialsNeeded` keep an explicit `null` apart from an
/// omitted field so that an update can clear them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseBody {
    #[serde(deserialize_with = "lenient::submitted_id")]
    pub user_id: Option<SubmittedId>,
    #[serde(deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::nullable_string")]
    pub estimated_time: Option<Option<String>>,
    #[serde(deserialize_with = "lenient::nullable_string")]
    pub materials_needed: Option<Option<String>>,
}

impl From<CourseBody> for CourseChanges {
    fn from(body: CourseBody) -> Self {
        Self {
            user_id: body.user_id.and_then(SubmittedId::id),
            title: body.title,
            description: body.description,
            estimated_time: body.estimated_time,
            materials_needed: body.materials_needed,
        }
    }
}

/// Course list entry; timestamps are left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
}

impl From<Course> for CourseSummary {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            title: c.title,
            description: c.description,
            estimated_time: c.estimated_time,
            materials_needed: c.materials_needed,
        }
    }
}
