// src/handlers/pix.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::pix::{BankInfo, CreatePixChargeRequest, PixCharge, PixConfigResponse, UpdatePixConfigRequest},
};

#[utoipa::path(
    get,
    path = "/api/pix/config",
    tag = "PIX",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da geradora")
    ),
    responses(
        (status = 200, description = "Configuração PIX da geradora (config nula se ainda não configurada)", body = PixConfigResponse)
    )
)]
pub async fn get_config(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .pix_service
        .get_config(tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let avisos = config.as_ref().map(|c| c.avisos()).unwrap_or_default();
    Ok((StatusCode::OK, Json(PixConfigResponse { config, avisos })))
}

#[utoipa::path(
    put,
    path = "/api/pix/config",
    tag = "PIX",
    request_body = UpdatePixConfigRequest,
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da geradora")
    ),
    responses(
        (status = 200, description = "Configuração salva", body = PixConfigResponse),
        (status = 400, description = "Banco, tipo de chave ou chave inválidos")
    )
)]
pub async fn update_config(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<UpdatePixConfigRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .pix_service
        .save_config(tenant.0, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let avisos = config.avisos();
    Ok((StatusCode::OK, Json(PixConfigResponse { config: Some(config), avisos })))
}

#[utoipa::path(
    get,
    path = "/api/pix/banks",
    tag = "PIX",
    responses(
        (status = 200, description = "Bancos conhecidos e se há gerador de PIX para cada um", body = Vec<BankInfo>)
    )
)]
pub async fn list_banks(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.pix_service.banks())
}

#[utoipa::path(
    post,
    path = "/api/pix/charges",
    tag = "PIX",
    request_body = CreatePixChargeRequest,
    responses(
        (status = 200, description = "BR Code e QR Code", body = PixCharge),
        (status = 400, description = "Parâmetros inválidos"),
        (status = 422, description = "Banco sem gerador de PIX")
    )
)]
pub async fn create_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreatePixChargeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    let charge = app_state
        .pix_service
        .render(&payload.banco, &payload.params)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(charge)))
}
