// src/handlers/faturas.rs

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::{
        fatura::{CalculoFaturaRequest, Fatura, ResultadoCalculo},
        pix::PixCharge,
    },
};

#[utoipa::path(
    post,
    path = "/api/faturas/pix",
    tag = "Faturas",
    request_body = Fatura,
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da geradora")
    ),
    responses(
        (status = 200, description = "Cobrança PIX da fatura", body = PixCharge),
        (status = 422, description = "PIX não configurado ou banco sem gerador")
    )
)]
pub async fn generate_pix(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(fatura): Json<Fatura>,
) -> Result<impl IntoResponse, ApiError> {
    let charge = app_state
        .pix_service
        .render_for_fatura(tenant.0, &fatura)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(charge)))
}

#[utoipa::path(
    post,
    path = "/api/faturas/pdf",
    tag = "Faturas",
    request_body = Fatura,
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da geradora")
    ),
    responses(
        (status = 200, description = "PDF da fatura", body = Vec<u8>, content_type = "application/pdf"),
        (status = 500, description = "Fontes ausentes ou erro ao gerar o PDF")
    )
)]
pub async fn generate_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(fatura): Json<Fatura>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .generate_fatura_pdf(tenant.0, &fatura)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let disposition = format!("attachment; filename=\"fatura_{}.pdf\"", fatura.txid());
    let headers = [
        (header::CONTENT_TYPE, "application/pdf"),
        (header::CONTENT_DISPOSITION, disposition.as_str()),
    ];

    Ok((headers, pdf_bytes).into_response())
}

#[utoipa::path(
    post,
    path = "/api/faturas/calculo",
    tag = "Faturas",
    request_body = CalculoFaturaRequest,
    responses(
        (status = 200, description = "Valores calculados", body = ResultadoCalculo),
        (status = 400, description = "Leituras incompletas ou inválidas")
    )
)]
pub async fn calcular(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CalculoFaturaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resultado = app_state
        .fatura_service
        .calcular_fatura(&payload.dados_fatura, &payload.cliente)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resultado)))
}
