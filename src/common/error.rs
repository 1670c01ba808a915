// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale, models::sync::OperationType};

// Erros de domínio e de infraestrutura do serviço.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Operação {0:?} exige entityId")]
    MissingEntityId(OperationType),

    #[error("Operação pendente não encontrada: {0}")]
    OperationNotFound(String),

    #[error("Banco não suportado: {0}")]
    UnsupportedBank(String),

    #[error("Banco desconhecido: {0}")]
    UnknownBank(String),

    #[error("PIX não configurado")]
    PixNotConfigured,

    #[error("Chave PIX inválida: {0}")]
    InvalidPixKey(String),

    #[error("Parâmetro PIX inválido: {0}")]
    InvalidPixParams(String),

    #[error("Valor inválido para cobrança PIX")]
    InvalidAmount,

    #[error("Campo {tag} do BR Code excede 99 caracteres ({len})")]
    BrCodeFieldTooLong { tag: String, len: usize },

    #[error("Dados de leitura incompletos")]
    IncompleteReadings,

    #[error("Leitura atual menor que a anterior")]
    InvalidReadings,

    #[error("Valores da fatura fora do limite de cálculo")]
    CalculationOverflow,

    #[error("Backend remoto indisponível: {0}")]
    RemoteUnavailable(String),

    #[error("Tempo esgotado ao acessar o backend remoto")]
    RemoteTimeout,

    #[error("Documento {collection}/{id} não encontrado")]
    DocumentNotFound { collection: String, id: String },

    #[error("Armazenamento local cheio ao gravar '{key}' ({size} bytes)")]
    StorageFull { key: String, size: usize },

    #[error("Erro de armazenamento local: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Erro ao gerar QR Code: {0}")]
    QrCodeError(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gerar PDF: {0}")]
    PdfError(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` guarda o contexto de qualquer erro inesperado.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// A resposta de erro que sai pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Código estável usado para buscar a mensagem traduzida.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::MissingEntityId(_) => "sync.missing_entity_id",
            AppError::OperationNotFound(_) => "sync.operation_not_found",
            AppError::UnsupportedBank(_) => "pix.unsupported_bank",
            AppError::UnknownBank(_) => "pix.unknown_bank",
            AppError::PixNotConfigured => "pix.not_configured",
            AppError::InvalidPixKey(_) => "pix.invalid_key",
            AppError::InvalidPixParams(_) => "pix.invalid_params",
            AppError::InvalidAmount => "pix.invalid_amount",
            AppError::BrCodeFieldTooLong { .. } => "pix.field_too_long",
            AppError::IncompleteReadings => "fatura.incomplete_readings",
            AppError::InvalidReadings => "fatura.invalid_readings",
            AppError::CalculationOverflow => "fatura.overflow",
            AppError::RemoteUnavailable(_) | AppError::RemoteTimeout => "remote.unavailable",
            AppError::DocumentNotFound { .. } => "remote.not_found",
            AppError::StorageFull { .. } | AppError::StorageError(_) => "storage.unavailable",
            AppError::FontNotFound(_) => "document.font_not_found",
            _ => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingEntityId(_)
            | AppError::UnknownBank(_)
            | AppError::InvalidPixKey(_)
            | AppError::InvalidPixParams(_)
            | AppError::InvalidAmount
            | AppError::BrCodeFieldTooLong { .. }
            | AppError::IncompleteReadings
            | AppError::InvalidReadings
            | AppError::CalculationOverflow => StatusCode::BAD_REQUEST,
            AppError::OperationNotFound(_) | AppError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
            // Configuração incompleta e banco sem integração são erros de entrada do usuário.
            AppError::UnsupportedBank(_) | AppError::PixNotConfigured => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RemoteUnavailable(_) | AppError::RemoteTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StorageFull { .. } => StatusCode::INSUFFICIENT_STORAGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Falhas de comunicação com o backend remoto, que fazem sentido tentar de novo.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::RemoteUnavailable(_) | AppError::RemoteTimeout => true,
            AppError::DatabaseError(e) => match e {
                sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed => true,
                sqlx::Error::Database(_) => e
                    .as_database_error()
                    .and_then(|d| d.code())
                    .is_some_and(|code| is_transient_sqlstate(&code)),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let argument = match self {
            AppError::UnsupportedBank(code) | AppError::UnknownBank(code) => code.clone(),
            AppError::InvalidPixKey(reason) | AppError::InvalidPixParams(reason) => reason.clone(),
            AppError::OperationNotFound(id) => id.clone(),
            AppError::BrCodeFieldTooLong { tag, .. } => tag.clone(),
            AppError::DocumentNotFound { collection, id } => format!("{}/{}", collection, id),
            _ => String::new(),
        };
        let message = store.translate(&locale.0, self.code(), &argument);

        let mut api_error = ApiError::new(status, message);

        // Retorna todos os detalhes da validação, campo a campo.
        if let AppError::ValidationError(errors) = self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            api_error.details = Some(json!(details));
        }

        api_error
    }
}

// SQLSTATE de falhas passageiras do servidor: conexão (08), recursos (53),
// shutdown/recuperação e conflitos de serialização ou deadlock.
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08")
        || code.starts_with("53")
        || matches!(code, "57P01" | "57P02" | "57P03" | "40001" | "40P01")
}
