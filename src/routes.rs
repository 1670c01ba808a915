// src/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn build_router(app_state: AppState) -> Router {
    let sync_routes = Router::new()
        .route("/status", get(handlers::sync::get_status))
        .route(
            "/operations",
            get(handlers::sync::list_operations).post(handlers::sync::enqueue_operation),
        )
        .route("/run", post(handlers::sync::run_sync))
        .route("/dead-letters", get(handlers::sync::list_dead_letters))
        .route("/dead-letters/{id}/retry", post(handlers::sync::retry_dead_letter))
        .route("/notifications", get(handlers::sync::list_notifications));

    let record_routes = Router::new()
        .route("/{collection}", post(handlers::records::create_record))
        .route(
            "/{collection}/{id}",
            patch(handlers::records::update_record).delete(handlers::records::delete_record),
        );

    let pix_routes = Router::new()
        .route(
            "/config",
            get(handlers::pix::get_config).put(handlers::pix::update_config),
        )
        .route("/banks", get(handlers::pix::list_banks))
        .route("/charges", post(handlers::pix::create_charge));

    let fatura_routes = Router::new()
        .route("/pix", post(handlers::faturas::generate_pix))
        .route("/pdf", post(handlers::faturas::generate_pdf))
        .route("/calculo", post(handlers::faturas::calcular));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/sync", sync_routes)
        .nest("/api/records", record_routes)
        .nest("/api/pix", pix_routes)
        .nest("/api/faturas", fatura_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db::remote_store::memory::MemoryRemoteStore};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::{sync::Arc, time::Duration};
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    const TENANT: &str = "6f1c1a52-4a7e-4c55-9f59-0a2b8c1d2e3f";

    fn app() -> (TempDir, Arc<MemoryRemoteStore>, Router) {
        let dir = tempdir().unwrap();
        let config = Config {
            database_url: "postgres://unused".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            data_dir: dir.path().join("data"),
            local_store_max_bytes: 1 << 20,
            sync_interval: Duration::from_secs(60),
            sync_probe_timeout: Duration::from_millis(500),
            sync_max_attempts: 5,
            pix_merchant_name: "RENOVVA MAIS".to_string(),
            pix_merchant_city: "SAO PAULO".to_string(),
            fonts_dir: dir.path().join("fonts"),
        };
        let remote = Arc::new(MemoryRemoteStore::new());
        let state = AppState::from_parts(config, remote.clone()).unwrap();
        (dir, remote, build_router(state))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-tenant-id", TENANT)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn fatura() -> Value {
        json!({
            "id": "fat-1",
            "cliente": "Maria",
            "referencia": "FAT2025050001",
            "vencimento": "2025-05-10",
            "valor": 150.0,
            "status": "pendente"
        })
    }

    #[tokio::test]
    async fn health_check() {
        let (_dir, _remote, app) = app();
        let response = app.oneshot(empty_request("GET", "/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn offline_writes_are_queued_and_replayed() {
        let (_dir, remote, app) = app();
        remote.set_online(false);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/records/geradoras", json!({"id": "g1", "data": {"nome": "Usina A"}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["result"], "queued");

        let status = body_json(app.clone().oneshot(empty_request("GET", "/api/sync/status")).await.unwrap()).await;
        assert_eq!(status["pending"], 1);

        remote.set_online(true);
        let report = body_json(app.clone().oneshot(empty_request("POST", "/api/sync/run")).await.unwrap()).await;
        assert_eq!(report["success"], 1);
        assert_eq!(report["remaining"], 0);
        assert!(remote.document("geradoras", "g1").is_some());
    }

    #[tokio::test]
    async fn update_without_entity_id_is_rejected() {
        let (_dir, _remote, app) = app();
        let response = app
            .oneshot(json_request("POST", "/api/sync/operations", json!({"type": "update", "collection": "clientes", "data": {}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn charge_for_unsupported_bank_is_unprocessable() {
        let (_dir, _remote, app) = app();
        let body = json!({
            "banco": "001",
            "params": {
                "nome": "RENOVVA MAIS",
                "chave": "12345678909",
                "valor": 150.0,
                "cidade": "SAO PAULO",
                "txid": "FAT2025050001"
            }
        });
        let response = app.oneshot(json_request("POST", "/api/pix/charges", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "Banco não suportado: 001");
    }

    #[tokio::test]
    async fn fatura_pix_requires_configuration() {
        let (_dir, _remote, app) = app();

        let response = app.clone().oneshot(json_request("POST", "/api/faturas/pix", fatura())).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let config = json!({"banco": "748", "tipoChave": "CPF/CNPJ", "chave": "123.456.789-09"});
        let response = app.clone().oneshot(json_request("PUT", "/api/pix/config", config)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(json_request("POST", "/api/faturas/pix", fatura())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let charge = body_json(response).await;
        assert_eq!(charge["banco"], "748");
        assert!(charge["payload"].as_str().unwrap().starts_with("000201"));
    }

    #[tokio::test]
    async fn tenant_header_is_required() {
        let (_dir, _remote, app) = app();
        let response = app.oneshot(empty_request("GET", "/api/pix/config")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invoice_calculation() {
        let (_dir, _remote, app) = app();
        let body = json!({
            "dadosFatura": {"leituraAnterior": 9023, "leituraAtual": 9788},
            "cliente": {"tipoCalculo": "percentual", "percentualEconomia": 15}
        });
        let response = app.oneshot(json_request("POST", "/api/faturas/calculo", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resultado = body_json(response).await;
        assert_eq!(resultado["detalhes"]["consumo"], 765);
        assert_eq!(resultado["valorFinal"], 487.69);
    }
}
