// src/db/pix_config_repo.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LocalStore, RemoteStore},
    models::pix::PixConfig,
};

pub const PIX_CONFIG_COLLECTION: &str = "configuracoesPix";

/// Configuração PIX por geradora: o armazenamento local é a fonte principal,
/// a cópia remota serve para recuperar a configuração em outro dispositivo.
#[derive(Clone)]
pub struct PixConfigRepository {
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
}

impl PixConfigRepository {
    pub fn new(local: LocalStore, remote: Arc<dyn RemoteStore>) -> Self {
        Self { local, remote }
    }

    fn key(tenant_id: Uuid) -> String {
        format!("pixConfig.{}", tenant_id)
    }

    pub fn save_local(&self, tenant_id: Uuid, config: &PixConfig) -> Result<(), AppError> {
        self.local.write(&Self::key(tenant_id), config)
    }

    pub async fn get(&self, tenant_id: Uuid) -> Result<Option<PixConfig>, AppError> {
        if let Some(config) = self.local.read::<PixConfig>(&Self::key(tenant_id))? {
            return Ok(Some(config));
        }

        // Sem cópia local: tenta o backend remoto e guarda o que vier.
        let remote = match self.remote.get(PIX_CONFIG_COLLECTION, &tenant_id.to_string()).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!("Configuração PIX remota indisponível para {}: {}", tenant_id, e);
                return Ok(None);
            }
        };

        match remote {
            Some(value) => {
                let config: PixConfig = serde_json::from_value(value)?;
                if let Err(e) = self.save_local(tenant_id, &config) {
                    tracing::warn!("Não foi possível guardar a configuração PIX localmente: {}", e);
                }
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }
}
