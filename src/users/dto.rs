use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lenient;

/// Request body for signup. Fields stay optional, and non-string values
/// read as missing, so that every absent one can be reported.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUserBody {
    #[serde(deserialize_with = "lenient::string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub email_address: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub password: Option<String>,
}

/// Public view of the authenticated user.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
}
