use crate::catalog::health_schema;
use crate::errors::{AppError, ConfigError};
use crate::models::UserState;
use crate::schema::FieldSchema;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_user_state(path: &Path) -> UserState {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(err) => {
                error!("failed to parse user state file: {err}");
                UserState::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => UserState::default(),
        Err(err) => {
            error!("failed to read user state file: {err}");
            UserState::default()
        }
    }
}

pub async fn persist_user_state(path: &Path, state: &UserState) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(state).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

/// Loads the schema from `path`, or the built-in questionnaire without one.
pub async fn load_schema(path: Option<&Path>) -> Result<FieldSchema, ConfigError> {
    let Some(path) = path else {
        return Ok(health_schema()?);
    };
    let bytes = fs::read(path).await?;
    let schema: FieldSchema = serde_json::from_slice(&bytes)?;
    info!("loaded {} fields from {}", schema.len(), path.display());
    Ok(schema)
}
