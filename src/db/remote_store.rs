// src/db/remote_store.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, models::sync::OperationType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Contrato mínimo com o backend remoto de documentos.
///
/// A fila de sincronização depende só disto, não do SDK de um backend específico.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Grava o documento (sobrescreve se o id já existir). Sem id, o backend gera um.
    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Map<String, Value>,
    ) -> Result<String, AppError>;

    /// Mescla `patch` no documento existente; falha se ele não existir.
    async fn update(&self, collection: &str, id: &str, patch: &Map<String, Value>) -> Result<(), AppError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Documentos cujo conteúdo contém `filter`.
    async fn query(
        &self,
        collection: &str,
        filter: &Map<String, Value>,
        limit: i64,
    ) -> Result<Vec<Document>, AppError>;
}

/// Aplica uma escrita no backend remoto. Devolve o id do documento afetado.
pub async fn apply_operation(
    remote: &dyn RemoteStore,
    kind: OperationType,
    collection: &str,
    entity_id: Option<&str>,
    data: &Map<String, Value>,
) -> Result<String, AppError> {
    match (kind, entity_id) {
        (OperationType::Create, id) => remote.insert(collection, id, data).await,
        (OperationType::Update, Some(id)) => {
            remote.update(collection, id, data).await?;
            Ok(id.to_string())
        }
        (OperationType::Delete, Some(id)) => {
            remote.delete(collection, id).await?;
            Ok(id.to_string())
        }
        (kind, None) => Err(AppError::MissingEntityId(kind)),
    }
}

// ---
// Implementação em Postgres: uma tabela de documentos JSONB
// ---
#[derive(Clone)]
pub struct PgRemoteStore {
    pool: PgPool,
}

impl PgRemoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Map<String, Value>,
    ) -> Result<String, AppError> {
        let id = id.map(str::to_string).unwrap_or_else(|| Uuid::new_v4().to_string());

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(Json(data))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: &Map<String, Value>) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(patch))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        // Excluir um documento que não existe não é erro.
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        let data = sqlx::query_scalar::<_, Json<Value>>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(data.map(|Json(value)| value))
    }

    async fn query(
        &self,
        collection: &str,
        filter: &Map<String, Value>,
        limit: i64,
    ) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY created_at ASC
            LIMIT $3
            "#,
        )
        .bind(collection)
        .bind(Json(filter))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(data))| Document { id, data })
            .collect())
    }
}
