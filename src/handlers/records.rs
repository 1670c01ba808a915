// src/handlers/records.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    services::record_service::WriteOutcome,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordPayload {
    /// Opcional: sem id o backend gera um.
    #[schema(example = "g1")]
    pub id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
}

// 201 aplicado, 202 enfileirado, 507 descartado.
pub fn outcome_response(outcome: WriteOutcome) -> Response {
    let status = match outcome {
        WriteOutcome::Applied { .. } => StatusCode::CREATED,
        WriteOutcome::Queued { .. } => StatusCode::ACCEPTED,
        WriteOutcome::Dropped { .. } => StatusCode::INSUFFICIENT_STORAGE,
    };
    (status, Json(outcome)).into_response()
}

#[utoipa::path(
    post,
    path = "/api/records/{collection}",
    tag = "Records",
    request_body = CreateRecordPayload,
    params(
        ("collection" = String, Path, description = "Coleção (clientes, geradoras, faturas...)")
    ),
    responses(
        (status = 201, description = "Gravado no backend remoto", body = WriteOutcome),
        (status = 202, description = "Backend indisponível, gravado na fila", body = WriteOutcome),
        (status = 507, description = "Armazenamento local cheio", body = WriteOutcome)
    )
)]
pub async fn create_record(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(collection): Path<String>,
    Json(payload): Json<CreateRecordPayload>,
) -> Result<Response, ApiError> {
    let outcome = app_state
        .record_service
        .create(&collection, payload.id.as_deref(), payload.data)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(outcome_response(outcome))
}

#[utoipa::path(
    patch,
    path = "/api/records/{collection}/{id}",
    tag = "Records",
    request_body(content = Object, description = "Campos a alterar"),
    params(
        ("collection" = String, Path, description = "Coleção"),
        ("id" = String, Path, description = "ID do documento")
    ),
    responses(
        (status = 201, description = "Gravado no backend remoto", body = WriteOutcome),
        (status = 202, description = "Backend indisponível, gravado na fila", body = WriteOutcome),
        (status = 404, description = "Documento não encontrado")
    )
)]
pub async fn update_record(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Response, ApiError> {
    let outcome = app_state
        .record_service
        .update(&collection, &id, patch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(outcome_response(outcome))
}

#[utoipa::path(
    delete,
    path = "/api/records/{collection}/{id}",
    tag = "Records",
    params(
        ("collection" = String, Path, description = "Coleção"),
        ("id" = String, Path, description = "ID do documento")
    ),
    responses(
        (status = 201, description = "Excluído no backend remoto", body = WriteOutcome),
        (status = 202, description = "Backend indisponível, exclusão na fila", body = WriteOutcome)
    )
)]
pub async fn delete_record(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let outcome = app_state
        .record_service
        .delete(&collection, &id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(outcome_response(outcome))
}
