// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{LocalStore, PgRemoteStore, PixConfigRepository, RemoteStore},
    services::{
        document_service::DocumentService,
        fatura_service::FaturaService,
        pix::PixRegistry,
        pix_service::{MerchantInfo, PixService},
        record_service::RecordService,
        sync_service::{SyncService, SyncSettings},
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub local_store_max_bytes: usize,
    pub sync_interval: Duration,
    pub sync_probe_timeout: Duration,
    pub sync_max_attempts: u32,
    pub pix_merchant_name: String,
    pub pix_merchant_city: String,
    pub fonts_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string())),
            local_store_max_bytes: parse_var("LOCAL_STORE_MAX_BYTES", 5 * 1024 * 1024)?,
            sync_interval: Duration::from_millis(parse_var("SYNC_INTERVAL_MS", 60_000)?),
            sync_probe_timeout: Duration::from_millis(parse_var("SYNC_PROBE_TIMEOUT_MS", 5_000)?),
            sync_max_attempts: parse_var("SYNC_MAX_ATTEMPTS", 5)?,
            pix_merchant_name: env::var("PIX_MERCHANT_NAME").unwrap_or_else(|_| "RENOVVA MAIS".to_string()),
            pix_merchant_city: env::var("PIX_MERCHANT_CITY").unwrap_or_else(|_| "SAO PAULO".to_string()),
            fonts_dir: PathBuf::from(env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".to_string())),
        })
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            probe_timeout: self.sync_probe_timeout,
            max_attempts: self.sync_max_attempts,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválida: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sync_service: SyncService,
    pub record_service: RecordService,
    pub pix_service: PixService,
    pub fatura_service: FaturaService,
    pub document_service: DocumentService,
    pub i18n_store: Arc<I18nStore>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Pool preguiçoso: o serviço sobe mesmo com o banco fora do ar e a fila segura as escritas.
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_lazy(&config.database_url)?;

        match sqlx::migrate!().run(&db_pool).await {
            Ok(()) => tracing::info!("✅ Migrações do banco de dados executadas com sucesso!"),
            Err(e) => tracing::warn!("⚠️ Migrações não executadas (banco indisponível?): {}", e),
        }

        Self::from_parts(config, Arc::new(PgRemoteStore::new(db_pool)))
    }

    // Monta o gráfico de dependências sobre qualquer backend remoto.
    pub fn from_parts(config: Config, remote: Arc<dyn RemoteStore>) -> anyhow::Result<Self> {
        let store = LocalStore::open(&config.data_dir, config.local_store_max_bytes)
            .with_context(|| format!("Falha ao abrir o armazenamento local em {}", config.data_dir.display()))?;

        let sync_service = SyncService::new(remote.clone(), store.clone(), config.sync_settings());
        let record_service = RecordService::new(remote.clone(), sync_service.clone());
        let pix_service = PixService::new(
            Arc::new(PixRegistry::default()),
            PixConfigRepository::new(store, remote),
            record_service.clone(),
            MerchantInfo {
                nome: config.pix_merchant_name.clone(),
                cidade: config.pix_merchant_city.clone(),
            },
        );
        let document_service = DocumentService::new(pix_service.clone(), config.fonts_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            sync_service,
            record_service,
            pix_service,
            fatura_service: FaturaService::new(),
            document_service,
            i18n_store: Arc::new(I18nStore::new()),
        })
    }
}
