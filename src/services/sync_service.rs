// src/services/sync_service.rs

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
    time::Duration,
};

use chrono::Utc;
use serde_json::Map;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{remote_store::apply_operation, LocalStore, RemoteStore},
    models::sync::{
        AdminNotification, ConnectionStatus, NewOperation, PendingOperation, QueueDocument,
        StoredQueue, SyncReport, QUEUE_SCHEMA_VERSION,
    },
};

const PENDING_OPERATIONS_KEY: &str = "pendingOperations";
const ADMIN_NOTIFICATIONS_KEY: &str = "adminNotifications";
const MAX_NOTIFICATIONS: usize = 100;
const PROBE_COLLECTION: &str = "system";

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Limite para o teste de conexão e para cada escrita reaplicada.
    pub probe_timeout: Duration,
    /// Depois de tantas falhas a operação vai para a lista de mortas.
    pub max_attempts: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { probe_timeout: Duration::from_secs(5), max_attempts: 5 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    Queued(PendingOperation),
    /// O armazenamento local falhou e a operação foi descartada.
    Dropped { reason: String },
}

/// Handle da sincronização periódica. Soltar o handle também encerra o laço.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Fila de escritas pendentes (outbox) persistida no armazenamento local.
///
/// Reaplica em ordem de enfileiramento e para na primeira falha, para que uma
/// exclusão nunca passe na frente da atualização que veio antes dela.
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    remote: Arc<dyn RemoteStore>,
    store: LocalStore,
    settings: SyncSettings,
    status: RwLock<ConnectionStatus>,
    in_flight: AtomicBool,
    // Serializa o ler-alterar-gravar da fila. Nunca é mantido através de um await.
    queue_lock: Mutex<()>,
}

// Libera a flag de sincronização em andamento mesmo se o future for cancelado.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncService {
    pub fn new(remote: Arc<dyn RemoteStore>, store: LocalStore, settings: SyncSettings) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                remote,
                store,
                settings,
                status: RwLock::new(ConnectionStatus::Unknown),
                in_flight: AtomicBool::new(false),
                queue_lock: Mutex::new(()),
            }),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn timeout(&self) -> Duration {
        self.inner.settings.probe_timeout
    }

    // =========================================================================
    //  FILA
    // =========================================================================

    fn load_queue(&self) -> Result<QueueDocument, AppError> {
        let stored = self.inner.store.read::<StoredQueue>(PENDING_OPERATIONS_KEY)?;
        Ok(stored.map(QueueDocument::from).unwrap_or_default())
    }

    fn modify_queue<R>(&self, change: impl FnOnce(&mut QueueDocument) -> R) -> Result<R, AppError> {
        let _lock = self.inner.queue_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut queue = self.load_queue()?;
        let result = change(&mut queue);
        queue.version = QUEUE_SCHEMA_VERSION;
        self.inner.store.write(PENDING_OPERATIONS_KEY, &queue)?;
        Ok(result)
    }

    /// Enfileira uma escrita que não pôde ir para o backend remoto.
    ///
    /// Só devolve erro para operações malformadas; falha do armazenamento local
    /// vira `EnqueueOutcome::Dropped`.
    pub fn enqueue(&self, operation: NewOperation) -> Result<EnqueueOutcome, AppError> {
        operation.check()?;
        let operation = operation.with_entity_id();

        let pending = PendingOperation {
            id: format!("op-{}", Uuid::new_v4()),
            timestamp: Utc::now().timestamp_millis(),
            kind: operation.kind,
            collection: operation.collection,
            entity_id: operation.entity_id,
            data: operation.data,
            attempts: 0,
            last_error: None,
        };

        let queued = pending.clone();
        if let Err(e) = self.modify_queue(move |queue| queue.operations.push(queued)) {
            tracing::error!(
                "🔥 Operação {:?} em '{}' DESCARTADA: armazenamento local indisponível: {}",
                pending.kind,
                pending.collection,
                e
            );
            return Ok(EnqueueOutcome::Dropped { reason: e.to_string() });
        }

        self.notify_admin(
            "Operação armazenada localmente",
            &format!(
                "Uma operação {:?} na coleção {} foi armazenada localmente e será sincronizada quando o servidor estiver disponível.",
                pending.kind, pending.collection
            ),
        );

        Ok(EnqueueOutcome::Queued(pending))
    }

    /// Cópia da fila, na ordem em que será reaplicada.
    pub fn get_pending_operations(&self) -> Vec<PendingOperation> {
        match self.load_queue() {
            Ok(queue) => queue.operations,
            Err(e) => {
                tracing::error!("Erro ao obter operações pendentes: {}", e);
                Vec::new()
            }
        }
    }

    pub fn dead_letters(&self) -> Vec<PendingOperation> {
        match self.load_queue() {
            Ok(queue) => queue.dead_letters,
            Err(e) => {
                tracing::error!("Erro ao obter operações mortas: {}", e);
                Vec::new()
            }
        }
    }

    /// Devolve uma operação morta para o fim da fila, com as tentativas zeradas.
    pub fn retry_dead_letter(&self, id: &str) -> Result<PendingOperation, AppError> {
        let revived = self.modify_queue(|queue| {
            let position = queue.dead_letters.iter().position(|op| op.id == id)?;
            let mut operation = queue.dead_letters.remove(position);
            operation.attempts = 0;
            operation.last_error = None;
            queue.operations.push(operation.clone());
            Some(operation)
        })?;

        revived.ok_or_else(|| AppError::OperationNotFound(id.to_string()))
    }

    fn remove_operation(&self, id: &str) -> Result<(), AppError> {
        self.modify_queue(|queue| queue.operations.retain(|op| op.id != id))
    }

    // Conta a falha e devolve `true` se a operação foi para a lista de mortas.
    fn record_failure(&self, id: &str, error: &AppError) -> Result<bool, AppError> {
        let max_attempts = self.inner.settings.max_attempts;
        let permanent = !error.is_transient();
        let message = error.to_string();

        self.modify_queue(move |queue| {
            let Some(position) = queue.operations.iter().position(|op| op.id == id) else {
                return false;
            };
            let operation = &mut queue.operations[position];
            operation.attempts += 1;
            operation.last_error = Some(message);

            if permanent || operation.attempts >= max_attempts {
                let dead = queue.operations.remove(position);
                queue.dead_letters.push(dead);
                return true;
            }
            false
        })
    }

    // =========================================================================
    //  CONEXÃO
    // =========================================================================

    /// Consulta leve ao backend remoto, limitada por `probe_timeout`.
    pub async fn check_connection(&self) -> bool {
        let filter = Map::new();
        let probe = self.inner.remote.query(PROBE_COLLECTION, &filter, 1);

        let online = match tokio::time::timeout(self.inner.settings.probe_timeout, probe).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!("Teste de conexão falhou: {}", e);
                false
            }
            Err(_) => {
                tracing::debug!("Teste de conexão excedeu {:?}", self.inner.settings.probe_timeout);
                false
            }
        };

        let status = if online { ConnectionStatus::Online } else { ConnectionStatus::Offline };
        let previous = {
            let mut current = self.inner.status.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, status)
        };
        if previous != status {
            tracing::info!("Status da conexão: {:?} -> {:?}", previous, status);
        }

        online
    }

    // =========================================================================
    //  SINCRONIZAÇÃO
    // =========================================================================

    /// Reaplica a fila no backend remoto, em ordem, parando na primeira falha.
    pub async fn sync_pending_operations(&self) -> SyncReport {
        self.run_replay(true).await
    }

    async fn run_replay(&self, probe_first: bool) -> SyncReport {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Sincronização já em andamento; chamada ignorada");
            return SyncReport {
                remaining: self.get_pending_operations().len(),
                skipped: true,
                ..SyncReport::default()
            };
        }
        let _guard = InFlightGuard(&self.inner.in_flight);

        let operations = self.get_pending_operations();
        if operations.is_empty() {
            return SyncReport::default();
        }

        if probe_first && !self.check_connection().await {
            self.notify_admin(
                "Sincronização falhou",
                "Não foi possível sincronizar as operações pendentes porque o servidor está indisponível.",
            );
            return SyncReport { remaining: operations.len(), ..SyncReport::default() };
        }

        let mut report = SyncReport::default();

        for operation in operations {
            match self.replay_one(&operation).await {
                Ok(()) => {
                    // Remove logo após o sucesso para não reaplicar após uma queda.
                    if let Err(e) = self.remove_operation(&operation.id) {
                        tracing::error!(
                            "🔥 Operação {} aplicada mas não removida da fila (será reaplicada): {}",
                            operation.id,
                            e
                        );
                    }
                    report.success += 1;
                }
                Err(e) => {
                    tracing::warn!("Erro ao sincronizar operação {}: {}", operation.id, e);
                    report.failed += 1;
                    match self.record_failure(&operation.id, &e) {
                        Ok(true) => {
                            report.dead_lettered += 1;
                            self.notify_admin(
                                "Operação descartada da fila",
                                &format!(
                                    "A operação {} na coleção {} falhou {} vez(es) e foi movida para as operações mortas: {}",
                                    operation.id,
                                    operation.collection,
                                    operation.attempts + 1,
                                    e
                                ),
                            );
                        }
                        Ok(false) => {}
                        Err(store_err) => {
                            tracing::error!("Não foi possível registrar a falha de {}: {}", operation.id, store_err)
                        }
                    }
                    // As operações seguintes podem depender desta: interrompe a rodada.
                    break;
                }
            }
        }

        report.remaining = self.get_pending_operations().len();

        if report.success > 0 {
            tracing::info!(
                "✅ Sincronização: {} aplicada(s), {} falha(s), {} pendente(s)",
                report.success,
                report.failed,
                report.remaining
            );
            self.notify_admin(
                "Sincronização concluída",
                &format!(
                    "{} operações foram sincronizadas com sucesso. {} operações falharam.",
                    report.success, report.failed
                ),
            );
        }

        report
    }

    async fn replay_one(&self, operation: &PendingOperation) -> Result<(), AppError> {
        let write = apply_operation(
            self.inner.remote.as_ref(),
            operation.kind,
            &operation.collection,
            operation.entity_id.as_deref(),
            &operation.data,
        );

        match tokio::time::timeout(self.inner.settings.probe_timeout, write).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(AppError::RemoteTimeout),
        }
    }

    // =========================================================================
    //  SINCRONIZAÇÃO PERIÓDICA
    // =========================================================================

    /// Testa a conexão a cada `interval` e, se online com fila não vazia, sincroniza.
    pub fn start_periodic_sync(&self, interval: Duration) -> SyncHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let service = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop.changed() => break,
                }

                // Uma rodada iniciada termina mesmo que o stop chegue no meio.
                if service.check_connection().await && !service.get_pending_operations().is_empty() {
                    let report = service.run_replay(false).await;
                    tracing::debug!("Sincronização periódica: {:?}", report);
                }

                if *stop.borrow() {
                    break;
                }
            }

            tracing::info!("Sincronização periódica encerrada");
        });

        tracing::info!("🔄 Sincronização periódica iniciada (intervalo {:?})", interval);
        SyncHandle { shutdown, task }
    }

    /// Pede o fim do laço e espera a rodada em andamento terminar.
    pub async fn stop_periodic_sync(&self, handle: SyncHandle) {
        let _ = handle.shutdown.send(true);
        if let Err(e) = handle.task.await {
            if !e.is_cancelled() {
                tracing::error!("Tarefa de sincronização periódica terminou com erro: {}", e);
            }
        }
    }

    // =========================================================================
    //  NOTIFICAÇÕES
    // =========================================================================

    pub fn notifications(&self) -> Vec<AdminNotification> {
        match self.inner.store.read::<Vec<AdminNotification>>(ADMIN_NOTIFICATIONS_KEY) {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Erro ao ler notificações: {}", e);
                Vec::new()
            }
        }
    }

    fn notify_admin(&self, title: &str, message: &str) {
        tracing::warn!("[ADMIN NOTIFICATION] {}: {}", title, message);

        let _lock = self.inner.queue_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut list = self.notifications();
        let now = Utc::now();
        list.push(AdminNotification {
            id: now.timestamp_millis(),
            title: title.to_string(),
            message: message.to_string(),
            read: false,
            timestamp: now,
        });
        if list.len() > MAX_NOTIFICATIONS {
            let excess = list.len() - MAX_NOTIFICATIONS;
            list.drain(..excess);
        }

        if let Err(e) = self.inner.store.write(ADMIN_NOTIFICATIONS_KEY, &list) {
            tracing::error!("Não foi possível gravar a notificação: {}", e);
        }
    }
}
