use crate::user::{IdSource, UserId};
use serde::{Deserialize, Serialize};

/// What survives between runs: the last resolved user id.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UidQuery {
    pub uid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub uid: Option<String>,
    pub display: String,
    pub valid: bool,
    pub default_user: bool,
    pub source: Option<IdSource>,
}

impl From<&UserId> for UserResponse {
    fn from(user: &UserId) -> Self {
        Self {
            uid: user.current().map(str::to_string),
            display: user.display(),
            valid: user.is_valid(),
            default_user: user.is_default_user(),
            source: user.source(),
        }
    }
}
