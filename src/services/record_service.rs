// src/services/record_service.rs

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    db::{remote_store::apply_operation, RemoteStore},
    models::sync::{ConnectionStatus, NewOperation, PendingOperation},
    services::sync_service::{EnqueueOutcome, SyncService},
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum WriteOutcome {
    /// Gravado direto no backend remoto.
    Applied { id: String },
    /// Guardado na fila para sincronizar depois.
    Queued { operation: PendingOperation },
    /// Nem o remoto nem o armazenamento local aceitaram a escrita.
    Dropped { reason: String },
}

impl From<EnqueueOutcome> for WriteOutcome {
    fn from(outcome: EnqueueOutcome) -> Self {
        match outcome {
            EnqueueOutcome::Queued(operation) => WriteOutcome::Queued { operation },
            EnqueueOutcome::Dropped { reason } => WriteOutcome::Dropped { reason },
        }
    }
}

/// Escritas dos portais: tenta o backend remoto e, se ele não responder, usa a fila.
#[derive(Clone)]
pub struct RecordService {
    remote: Arc<dyn RemoteStore>,
    sync: SyncService,
}

impl RecordService {
    pub fn new(remote: Arc<dyn RemoteStore>, sync: SyncService) -> Self {
        Self { remote, sync }
    }

    pub async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<WriteOutcome, AppError> {
        self.write(NewOperation::create(collection, id, data)).await
    }

    pub async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<WriteOutcome, AppError> {
        self.write(NewOperation::update(collection, id, patch)).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<WriteOutcome, AppError> {
        self.write(NewOperation::delete(collection, id)).await
    }

    pub async fn write(&self, operation: NewOperation) -> Result<WriteOutcome, AppError> {
        operation.check()?;
        // O id vale para a escrita direta e para a fila: se o remoto gravou e só a resposta
        // se perdeu, a sincronização sobrescreve o mesmo documento.
        let operation = operation.with_entity_id();

        // Com operações na fila, escrever direto passaria na frente delas.
        let queue_empty = self.sync.get_pending_operations().is_empty();

        if queue_empty && self.sync.status() != ConnectionStatus::Offline {
            let direct = apply_operation(
                self.remote.as_ref(),
                operation.kind,
                &operation.collection,
                operation.entity_id.as_deref(),
                &operation.data,
            );

            match tokio::time::timeout(self.sync.timeout(), direct).await {
                Ok(Ok(id)) => return Ok(WriteOutcome::Applied { id }),
                Ok(Err(e)) if !e.is_transient() => return Err(e),
                Ok(Err(e)) => {
                    tracing::warn!("Escrita remota em '{}' falhou, enfileirando: {}", operation.collection, e)
                }
                Err(_) => tracing::warn!("Escrita remota em '{}' excedeu o tempo, enfileirando", operation.collection),
            }
        }

        Ok(self.sync.enqueue(operation)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{remote_store::memory::MemoryRemoteStore, LocalStore},
        services::sync_service::SyncSettings,
    };
    use serde_json::json;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, Arc<MemoryRemoteStore>, SyncService, RecordService) {
        let dir = tempdir().unwrap();
        let remote = Arc::new(MemoryRemoteStore::new());
        let sync = SyncService::new(
            remote.clone(),
            LocalStore::open(dir.path(), 1 << 20).unwrap(),
            SyncSettings::default(),
        );
        let records = RecordService::new(remote.clone(), sync.clone());
        (dir, remote, sync, records)
    }

    #[tokio::test]
    async fn online_write_goes_straight_to_remote() {
        let (_dir, remote, sync, records) = setup();

        let outcome = records
            .create("geradoras", Some("g1"), json!({"nome": "Usina"}).as_object().cloned().unwrap())
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Applied { id: "g1".to_string() });
        assert!(remote.document("geradoras", "g1").is_some());
        assert!(sync.get_pending_operations().is_empty());
    }

    #[tokio::test]
    async fn unreachable_remote_queues_the_write() {
        let (_dir, remote, sync, records) = setup();
        remote.set_online(false);

        let outcome = records.delete("geradoras", "g1").await.unwrap();

        assert!(matches!(outcome, WriteOutcome::Queued { .. }));
        assert_eq!(sync.get_pending_operations().len(), 1);
    }

    #[tokio::test]
    async fn writes_wait_behind_queued_operations() {
        let (_dir, remote, sync, records) = setup();
        remote.set_online(false);
        records.create("geradoras", Some("g1"), Map::new()).await.unwrap();

        remote.set_online(true);
        let outcome = records.update("geradoras", "g1", Map::new()).await.unwrap();
        assert!(matches!(outcome, WriteOutcome::Queued { .. }));

        let report = sync.sync_pending_operations().await;
        assert_eq!(report.success, 2);
    }

    #[tokio::test]
    async fn create_applied_before_a_timeout_is_not_duplicated_on_sync() {
        let dir = tempdir().unwrap();
        let remote = Arc::new(MemoryRemoteStore::new());
        let settings = SyncSettings { probe_timeout: Duration::from_millis(50), max_attempts: 5 };
        let sync = SyncService::new(remote.clone(), LocalStore::open(dir.path(), 1 << 20).unwrap(), settings);
        let records = RecordService::new(remote.clone(), sync.clone());

        // O remoto grava, mas a resposta chega depois do limite.
        remote.set_ack_delay(Some(Duration::from_millis(200)));
        let outcome = records.create("geradoras", None, json!({"nome": "Usina"}).as_object().cloned().unwrap()).await.unwrap();

        let id = match outcome {
            WriteOutcome::Queued { operation } => operation.entity_id.unwrap(),
            other => panic!("esperava Queued, veio {:?}", other),
        };
        assert!(remote.document("geradoras", &id).is_some());

        remote.set_ack_delay(None);
        let report = sync.sync_pending_operations().await;

        assert_eq!(report.success, 1);
        assert_eq!(remote.count("geradoras"), 1);
        assert_eq!(remote.document("geradoras", &id).unwrap()["nome"], "Usina");
    }

    #[tokio::test]
    async fn permanent_remote_errors_are_returned_not_queued() {
        let (_dir, _remote, sync, records) = setup();

        let err = records.update("geradoras", "nao-existe", Map::new()).await.unwrap_err();

        assert!(matches!(err, AppError::DocumentNotFound { .. }));
        assert!(sync.get_pending_operations().is_empty());
    }
}
