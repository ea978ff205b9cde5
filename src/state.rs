use crate::config::Settings;
use crate::errors::AppError;
use crate::models::UserState;
use crate::schema::FieldSchema;
use crate::storage::persist_user_state;
use crate::user::{IdSources, UserId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub schema: Arc<FieldSchema>,
    pub user: Arc<Mutex<UserId>>,
}

impl AppState {
    pub fn new(settings: Settings, schema: FieldSchema, user: UserId) -> Self {
        Self {
            settings: Arc::new(settings),
            schema: Arc::new(schema),
            user: Arc::new(Mutex::new(user)),
        }
    }

    /// Re-resolves the id with a request's `uid` query parameter. The result
    /// becomes the current id and is persisted when it changed.
    pub async fn user_for_request(&self, query: Option<&str>) -> Result<UserId, AppError> {
        let mut current = self.user.lock().await;
        let resolved = UserId::resolve(
            &self.settings.user,
            IdSources {
                query,
                persisted: current.current(),
            },
        );

        if resolved.current() != current.current() {
            info!(uid = ?resolved.current(), source = ?resolved.source(), "user id changed");
            let state = UserState {
                uid: resolved.current().map(str::to_string),
            };
            persist_user_state(&self.settings.state_path, &state).await?;
        }
        *current = resolved;

        Ok(current.clone())
    }

    pub async fn clear_user(&self) -> Result<UserId, AppError> {
        let mut current = self.user.lock().await;
        current.clear();
        persist_user_state(&self.settings.state_path, &UserState::default()).await?;
        Ok(current.clone())
    }
}
