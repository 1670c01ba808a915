// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Sync ---
        handlers::sync::get_status,
        handlers::sync::list_operations,
        handlers::sync::enqueue_operation,
        handlers::sync::run_sync,
        handlers::sync::list_dead_letters,
        handlers::sync::retry_dead_letter,
        handlers::sync::list_notifications,

        // --- Records ---
        handlers::records::create_record,
        handlers::records::update_record,
        handlers::records::delete_record,

        // --- PIX ---
        handlers::pix::get_config,
        handlers::pix::update_config,
        handlers::pix::list_banks,
        handlers::pix::create_charge,

        // --- Faturas ---
        handlers::faturas::generate_pix,
        handlers::faturas::generate_pdf,
        handlers::faturas::calcular,
    ),
    components(
        schemas(
            // --- Sync ---
            models::sync::OperationType,
            models::sync::ConnectionStatus,
            models::sync::PendingOperation,
            models::sync::NewOperation,
            models::sync::SyncReport,
            models::sync::SyncStatusResponse,
            models::sync::AdminNotification,
            services::record_service::WriteOutcome,
            handlers::records::CreateRecordPayload,

            // --- PIX ---
            models::pix::Bank,
            models::pix::BankInfo,
            models::pix::PixKeyType,
            models::pix::PixConfig,
            models::pix::UpdatePixConfigRequest,
            models::pix::PixConfigResponse,
            models::pix::PixParams,
            models::pix::CreatePixChargeRequest,
            models::pix::PixCharge,

            // --- Faturas ---
            models::fatura::FaturaStatus,
            models::fatura::Fatura,
            models::fatura::DadosFatura,
            models::fatura::FonteTarifa,
            models::fatura::TipoCalculo,
            models::fatura::TipoIluminacao,
            models::fatura::ClienteTarifa,
            models::fatura::CalculoFaturaRequest,
            models::fatura::DetalhesCalculo,
            models::fatura::ResultadoCalculo,
        )
    ),
    tags(
        (name = "Sync", description = "Fila de escritas offline e sincronização"),
        (name = "Records", description = "Escritas dos portais (remoto ou fila)"),
        (name = "PIX", description = "Configuração PIX e geração de BR Code"),
        (name = "Faturas", description = "Cobrança, PDF e cálculo de faturas")
    ),
    modifiers(&TenantHeaderAddon)
)]
pub struct ApiDoc;

struct TenantHeaderAddon;

impl utoipa::Modify for TenantHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "tenant",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-tenant-id"))),
        );
    }
}
