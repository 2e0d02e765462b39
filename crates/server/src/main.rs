use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use shared::{
    domain::{Command, CommandId},
    error::{ApiError, ErrorCode},
    protocol::{command_item_route, commands_route},
};
use storage::{CommandStore, InMemoryStore, Storage};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, store_backend, Settings, StoreBackend};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    match store_backend(&settings.database_url) {
        StoreBackend::InMemory => {
            warn!("using in-memory command store; records are lost on shutdown");
            serve(InMemoryStore::new(), &settings).await
        }
        StoreBackend::Sqlite(database_url) => {
            let storage = Storage::new(&database_url).await.map_err(|error| {
                error!(
                    %database_url,
                    %error,
                    "failed to open SQLite database; verify parent directory exists and permissions are correct"
                );
                error
            })?;
            serve(storage, &settings).await
        }
    }
}

async fn serve<S: CommandStore>(store: S, settings: &Settings) -> anyhow::Result<()> {
    let app = build_router(Arc::new(AppState::new(store)), settings.body_limit_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router<S: CommandStore>(state: Arc<AppState<S>>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            commands_route(),
            get(http_list_commands::<S>).post(http_create_command::<S>),
        )
        .route(
            command_item_route(),
            get(http_get_command::<S>)
                .put(http_update_command::<S>)
                .delete(http_delete_command::<S>),
        )
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_commands<S: CommandStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Json<Vec<Command>>> {
    let commands = state
        .controller()
        .list_commands()
        .await
        .map_err(error_response)?;
    Ok(Json(commands))
}

/// A missing id answers 200 with an empty body rather than 404.
async fn http_get_command<S: CommandStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let command = state
        .controller()
        .get_command(CommandId(id))
        .await
        .map_err(error_response)?;
    Ok(match command {
        Some(command) => Json(command).into_response(),
        None => StatusCode::OK.into_response(),
    })
}

async fn http_create_command<S: CommandStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(command): Json<Command>,
) -> ApiResult<impl IntoResponse> {
    let created = state
        .controller()
        .create_command(command)
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, created.location)],
        Json(created.command),
    ))
}

async fn http_update_command<S: CommandStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(command): Json<Command>,
) -> ApiResult<StatusCode> {
    state
        .controller()
        .update_command(CommandId(id), command)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_delete_command<S: CommandStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Command>> {
    let removed = state
        .controller()
        .delete_command(CommandId(id))
        .await
        .map_err(error_response)?;
    Ok(Json(removed))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(err.code);
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
