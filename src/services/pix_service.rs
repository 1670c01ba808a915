// src/services/pix_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{pix_config_repo::PIX_CONFIG_COLLECTION, PixConfigRepository},
    models::{
        fatura::Fatura,
        pix::{Bank, BankInfo, PixCharge, PixConfig, PixParams, UpdatePixConfigRequest},
    },
    services::{
        pix::{qr, PixRegistry},
        record_service::RecordService,
    },
};

/// Nome e cidade do recebedor que aparecem no BR Code.
#[derive(Debug, Clone)]
pub struct MerchantInfo {
    pub nome: String,
    pub cidade: String,
}

#[derive(Clone)]
pub struct PixService {
    registry: Arc<PixRegistry>,
    repo: PixConfigRepository,
    records: RecordService,
    merchant: MerchantInfo,
}

impl PixService {
    pub fn new(
        registry: Arc<PixRegistry>,
        repo: PixConfigRepository,
        records: RecordService,
        merchant: MerchantInfo,
    ) -> Self {
        Self { registry, repo, records, merchant }
    }

    pub fn banks(&self) -> Vec<BankInfo> {
        Bank::ALL
            .iter()
            .map(|bank| BankInfo {
                code: bank.code().to_string(),
                name: bank.name().to_string(),
                supported: self.registry.supports(*bank),
            })
            .collect()
    }

    /// Gera o código copia-e-cola e o QR Code para o banco informado.
    ///
    /// O payload vai para o QR exatamente como o encoder devolveu: o CRC do BR Code
    /// cobre esses bytes.
    pub fn render(&self, bank_code: &str, params: &PixParams) -> Result<PixCharge, AppError> {
        params.validate()?;

        let integration = self.registry.get(bank_code)?;
        let payload = integration.generate_pix_payload(params)?;
        let qr_code_data_url = qr::render_data_url(&payload)?;

        Ok(PixCharge {
            banco: integration.bank().code().to_string(),
            payload,
            qr_code_data_url,
            avisos: Vec::new(),
        })
    }

    /// Cobrança PIX de uma fatura com a configuração da geradora.
    pub async fn render_for_fatura(&self, tenant_id: Uuid, fatura: &Fatura) -> Result<PixCharge, AppError> {
        let config = self
            .repo
            .get(tenant_id)
            .await?
            .filter(PixConfig::is_complete)
            .ok_or(AppError::PixNotConfigured)?;

        let params = PixParams {
            nome: self.merchant.nome.clone(),
            chave: config.chave.clone(),
            valor: fatura.valor,
            cidade: self.merchant.cidade.clone(),
            txid: fatura.txid().to_string(),
        };

        let mut charge = self.render(&config.banco, &params)?;
        charge.avisos = config.avisos();
        Ok(charge)
    }

    pub async fn get_config(&self, tenant_id: Uuid) -> Result<Option<PixConfig>, AppError> {
        self.repo.get(tenant_id).await
    }

    /// Valida, grava localmente e espelha no backend remoto (ou na fila, se offline).
    pub async fn save_config(&self, tenant_id: Uuid, input: UpdatePixConfigRequest) -> Result<PixConfig, AppError> {
        input.validate()?;

        let bank = Bank::from_code(&input.banco).ok_or_else(|| AppError::UnknownBank(input.banco.clone()))?;
        let chave = input.tipo_chave.normalize(&input.chave)?;

        let config = PixConfig {
            banco: bank.code().to_string(),
            tipo_chave: input.tipo_chave,
            chave,
            updated_at: Some(Utc::now()),
        };

        self.repo.save_local(tenant_id, &config)?;

        let data = match serde_json::to_value(&config)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(AppError::InternalServerError(anyhow::anyhow!("PixConfig não serializou como objeto"))),
        };
        match self
            .records
            .create(PIX_CONFIG_COLLECTION, Some(&tenant_id.to_string()), data)
            .await
        {
            Ok(outcome) => tracing::debug!("Configuração PIX de {} espelhada: {:?}", tenant_id, outcome),
            Err(e) => tracing::warn!("Cópia remota da configuração PIX de {} falhou: {}", tenant_id, e),
        }

        tracing::info!("Configuração PIX salva para a geradora {} (banco {})", tenant_id, config.banco);
        Ok(config)
    }
}
