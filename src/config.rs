use crate::user::UserConfig;
use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STATE_PATH: &str = "data/user.json";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub state_path: PathBuf,
    /// JSON schema file replacing the built-in questionnaire.
    pub schema_path: Option<PathBuf>,
    /// Where records are meant to be sent; shown in the page footer.
    pub api_base_url: String,
    pub user: UserConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let state_path = lookup("HEALTH_FORM_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));
        let schema_path = lookup("HEALTH_FORM_SCHEMA_PATH")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let api_base_url = lookup("HEALTH_FORM_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let user = UserConfig {
            override_id: lookup("HEALTH_FORM_UID").filter(|value| !value.is_empty()),
            allow_no_uid: lookup("HEALTH_FORM_ALLOW_NO_UID").is_some_and(|value| parse_flag(&value)),
            ..UserConfig::default()
        };

        Self {
            port,
            state_path,
            schema_path,
            api_base_url,
            user,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
