// src/handlers/sync.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::records::outcome_response,
    middleware::i18n::Locale,
    models::sync::{AdminNotification, NewOperation, PendingOperation, SyncReport, SyncStatusResponse},
    services::record_service::WriteOutcome,
};

#[utoipa::path(
    get,
    path = "/api/sync/status",
    tag = "Sync",
    responses(
        (status = 200, description = "Estado da conexão e tamanho da fila", body = SyncStatusResponse)
    )
)]
pub async fn get_status(State(app_state): State<AppState>) -> impl IntoResponse {
    let sync = &app_state.sync_service;
    Json(SyncStatusResponse {
        status: sync.status(),
        pending: sync.get_pending_operations().len(),
        dead_letters: sync.dead_letters().len(),
    })
}

#[utoipa::path(
    get,
    path = "/api/sync/operations",
    tag = "Sync",
    responses(
        (status = 200, description = "Operações pendentes, em ordem de envio", body = Vec<PendingOperation>)
    )
)]
pub async fn list_operations(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.sync_service.get_pending_operations())
}

#[utoipa::path(
    post,
    path = "/api/sync/operations",
    tag = "Sync",
    request_body = NewOperation,
    responses(
        (status = 201, description = "Operação enfileirada", body = WriteOutcome),
        (status = 400, description = "Operação malformada"),
        (status = 507, description = "Armazenamento local cheio, operação descartada", body = WriteOutcome)
    )
)]
pub async fn enqueue_operation(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<NewOperation>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .sync_service
        .enqueue(payload)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(outcome_response(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/sync/run",
    tag = "Sync",
    responses(
        (status = 200, description = "Resultado da sincronização", body = SyncReport)
    )
)]
pub async fn run_sync(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.sync_service.sync_pending_operations().await)
}

#[utoipa::path(
    get,
    path = "/api/sync/dead-letters",
    tag = "Sync",
    responses(
        (status = 200, description = "Operações que esgotaram as tentativas", body = Vec<PendingOperation>)
    )
)]
pub async fn list_dead_letters(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.sync_service.dead_letters())
}

#[utoipa::path(
    post,
    path = "/api/sync/dead-letters/{id}/retry",
    tag = "Sync",
    params(
        ("id" = String, Path, description = "ID da operação")
    ),
    responses(
        (status = 200, description = "Operação devolvida à fila", body = PendingOperation),
        (status = 404, description = "Operação não encontrada")
    )
)]
pub async fn retry_dead_letter(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let operation = app_state
        .sync_service
        .retry_dead_letter(&id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(operation)))
}

#[utoipa::path(
    get,
    path = "/api/sync/notifications",
    tag = "Sync",
    responses(
        (status = 200, description = "Notificações para o administrador", body = Vec<AdminNotification>)
    )
)]
pub async fn list_notifications(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.sync_service.notifications())
}
