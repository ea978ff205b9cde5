use crate::codec::{collect, restore, Record};
use crate::errors::AppError;
use crate::models::{UidQuery, UserResponse};
use crate::schema::FieldSchema;
use crate::state::AppState;
use crate::ui::{render_index, FormSubmission, FormView, PageContext};
use crate::user::UserId;
use axum::{
    extract::{Query, State},
    response::Html,
    Form, Json,
};
use tracing::{info, warn};

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<UidQuery>,
) -> Result<Html<String>, AppError> {
    let user = state.user_for_request(query.uid.as_deref()).await?;
    let view = FormView::with_defaults(&state.schema);
    Ok(Html(render_page(&state, &user, &view, None)))
}

pub async fn submit_entry(
    State(state): State<AppState>,
    Query(query): Query<UidQuery>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<Record>, AppError> {
    let user = state.user_for_request(query.uid.as_deref()).await?;
    if !user.is_valid() {
        return Err(AppError::bad_request(
            "a user id is required; open the form with ?uid=<your id>",
        ));
    }

    let mut record = collect(&state.schema, &FormSubmission::new(pairs));
    record.tag(&user);

    let invalid = record.invalid_fields();
    if !invalid.is_empty() {
        warn!(fields = ?invalid, "submission has non-numeric values");
        return Err(AppError::bad_request(format!(
            "not a number: {}",
            invalid.join(", ")
        )));
    }
    let missing = record.missing_required(&state.schema);
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!(
            "required fields missing: {}",
            missing.join(", ")
        )));
    }

    info!(uid = ?record.uid, date = %record.date, "collected daily entry");
    Ok(Json(record))
}

/// Renders the form filled with a previously collected record.
pub async fn restore_entry(
    State(state): State<AppState>,
    Json(record): Json<Record>,
) -> Result<Html<String>, AppError> {
    let user = state.user_for_request(None).await?;
    let mut view = FormView::with_defaults(&state.schema);
    let applied = restore(&state.schema, &record, &mut view);
    let notice = format!("Loaded entry from {}", record.date);
    info!(applied, date = %record.date, "restored entry into form");
    Ok(Html(render_page(&state, &user, &view, Some(&notice))))
}

pub async fn get_schema(State(state): State<AppState>) -> Json<FieldSchema> {
    Json(FieldSchema::clone(&state.schema))
}

pub async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<UidQuery>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.user_for_request(query.uid.as_deref()).await?;
    Ok(Json(UserResponse::from(&user)))
}

pub async fn clear_user(State(state): State<AppState>) -> Result<Json<UserResponse>, AppError> {
    let user = state.clear_user().await?;
    info!("user id cleared");
    Ok(Json(UserResponse::from(&user)))
}

fn render_page(state: &AppState, user: &UserId, view: &FormView, notice: Option<&str>) -> String {
    let action = user.href_with_uid("/entries");
    let title = user
        .current()
        .map(|id| format!("Full User ID: {id}"))
        .unwrap_or_default();
    let display = user.display();
    render_index(
        &state.schema,
        view,
        &PageContext {
            action: &action,
            user_display: &display,
            user_title: &title,
            api_base_url: &state.settings.api_base_url,
            notice,
        },
    )
}
