// src/models/sync.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// Versão do documento persistido da fila. Sobe quando o formato mudar.
pub const QUEUE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Online,
    Offline,
    Unknown,
}

/// Uma escrita que não chegou ao backend remoto e espera para ser reaplicada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    #[schema(example = "op-6f1c1f0e-8f7b-4d0e-b0a4-5d3b1c2a9e77")]
    pub id: String,

    /// Milissegundos desde a época Unix, no momento do enfileiramento.
    pub timestamp: i64,

    #[serde(rename = "type")]
    pub kind: OperationType,

    #[schema(example = "geradoras")]
    pub collection: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "g1")]
    pub entity_id: Option<String>,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,

    #[serde(default)]
    pub attempts: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

// O que o chamador informa ao enfileirar (id e timestamp são gerados).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOperation {
    #[serde(rename = "type")]
    pub kind: OperationType,

    #[validate(length(min = 1, message = "A coleção é obrigatória."))]
    #[schema(example = "geradoras")]
    pub collection: String,

    #[schema(example = "g1")]
    pub entity_id: Option<String>,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
}

impl NewOperation {
    pub fn create(collection: &str, entity_id: Option<&str>, data: Map<String, Value>) -> Self {
        Self {
            kind: OperationType::Create,
            collection: collection.to_string(),
            entity_id: entity_id.map(str::to_string),
            data,
        }
    }

    pub fn update(collection: &str, entity_id: &str, data: Map<String, Value>) -> Self {
        Self {
            kind: OperationType::Update,
            collection: collection.to_string(),
            entity_id: Some(entity_id.to_string()),
            data,
        }
    }

    pub fn delete(collection: &str, entity_id: &str) -> Self {
        Self {
            kind: OperationType::Delete,
            collection: collection.to_string(),
            entity_id: Some(entity_id.to_string()),
            data: Map::new(),
        }
    }

    /// Criação sem id recebe um agora. Reaplicar a mesma operação grava o mesmo documento.
    pub fn with_entity_id(mut self) -> Self {
        let missing = self.entity_id.as_deref().map_or(true, |id| id.trim().is_empty());
        if self.kind == OperationType::Create && missing {
            self.entity_id = Some(Uuid::new_v4().to_string());
        }
        self
    }

    /// Valida o payload e exige o ID da entidade para update/delete.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        match self.kind {
            OperationType::Create => Ok(()),
            OperationType::Update | OperationType::Delete => {
                match self.entity_id.as_deref().map(str::trim) {
                    Some(id) if !id.is_empty() => Ok(()),
                    _ => Err(AppError::MissingEntityId(self.kind)),
                }
            }
        }
    }
}

/// Documento gravado no armazenamento local sob a chave `pendingOperations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDocument {
    pub version: u32,
    #[serde(default)]
    pub operations: Vec<PendingOperation>,
    #[serde(default)]
    pub dead_letters: Vec<PendingOperation>,
}

// Aceita também o formato antigo: uma lista simples de operações.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StoredQueue {
    Versioned(QueueDocument),
    Legacy(Vec<PendingOperation>),
}

impl From<StoredQueue> for QueueDocument {
    fn from(stored: StoredQueue) -> Self {
        match stored {
            StoredQueue::Versioned(doc) => doc,
            StoredQueue::Legacy(operations) => QueueDocument {
                version: 0,
                operations,
                dead_letters: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub success: usize,
    pub failed: usize,
    pub remaining: usize,
    pub dead_lettered: usize,
    /// Verdadeiro quando outra sincronização já estava em andamento.
    pub skipped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub status: ConnectionStatus,
    pub pending: usize,
    pub dead_letters: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotification {
    pub id: i64,
    #[schema(example = "Sincronização concluída")]
    pub title: String,
    pub message: String,
    pub read: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_and_delete_require_entity_id() {
        let mut op = NewOperation::update("geradoras", "g1", Map::new());
        assert!(op.check().is_ok());

        op.entity_id = Some("  ".to_string());
        assert!(matches!(op.check(), Err(AppError::MissingEntityId(OperationType::Update))));

        op.kind = OperationType::Delete;
        op.entity_id = None;
        assert!(matches!(op.check(), Err(AppError::MissingEntityId(OperationType::Delete))));

        let create = NewOperation::create("geradoras", None, Map::new());
        assert!(create.check().is_ok());
    }

    #[test]
    fn create_without_id_gets_one_and_others_are_untouched() {
        let create = NewOperation::create("geradoras", None, Map::new()).with_entity_id();
        let id = create.entity_id.clone().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let explicit = NewOperation::create("geradoras", Some("g1"), Map::new()).with_entity_id();
        assert_eq!(explicit.entity_id.as_deref(), Some("g1"));

        let update = NewOperation::update("geradoras", "g1", Map::new()).with_entity_id();
        assert_eq!(update.entity_id.as_deref(), Some("g1"));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let op = NewOperation::create("", None, Map::new());
        assert!(matches!(op.check(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn legacy_queue_array_is_upgraded() {
        let legacy = json!([{
            "id": "op-1",
            "timestamp": 1_700_000_000_000i64,
            "type": "update",
            "collection": "geradoras",
            "entityId": "g1",
            "data": {"status": "ativo"}
        }]);

        let stored: StoredQueue = serde_json::from_value(legacy).unwrap();
        let doc = QueueDocument::from(stored);
        assert_eq!(doc.version, 0);
        assert_eq!(doc.operations.len(), 1);
        assert_eq!(doc.operations[0].kind, OperationType::Update);
        assert_eq!(doc.operations[0].attempts, 0);
    }

    #[test]
    fn pending_operation_uses_camel_case_wire_format() {
        let op = PendingOperation {
            id: "op-1".to_string(),
            timestamp: 1,
            kind: OperationType::Delete,
            collection: "clientes".to_string(),
            entity_id: Some("c9".to_string()),
            data: Map::new(),
            attempts: 0,
            last_error: None,
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "delete");
        assert_eq!(value["entityId"], "c9");
        assert!(value.get("lastError").is_none());
    }
}
