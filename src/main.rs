use health_form::{
    load_schema, load_user_state, router,
    user::{IdSources, UserId},
    AppState, Settings,
};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = Settings::from_env();
    let schema = load_schema(settings.schema_path.as_deref()).await?;

    let persisted = load_user_state(&settings.state_path).await;
    let user = UserId::resolve(
        &settings.user,
        IdSources {
            query: None,
            persisted: persisted.uid.as_deref(),
        },
    );
    info!(
        uid = ?user.current(),
        allow_no_uid = settings.user.allow_no_uid,
        fields = schema.len(),
        "form initialized"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let state = AppState::new(settings, schema, user);
    let app = router(state);

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
