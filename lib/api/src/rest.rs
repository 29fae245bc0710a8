use actix_cors::Cors;
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use relgraph_core::MemoryCorpus;
use relgraph_engine::{RelatednessEngine, RelatednessRequest, RelatednessResponse};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Largest accepted JSON body
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared handler state
pub struct ApiState {
    pub engine: Arc<RelatednessEngine>,
    /// Same corpus the engine reads, for indexing and inspection
    pub corpus: Arc<MemoryCorpus>,
}

#[derive(Serialize)]
struct CorpusInfo {
    documents: usize,
    fields: Vec<String>,
}

#[derive(Serialize)]
struct IndexResult {
    indexed: usize,
    documents: usize,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(engine: Arc<RelatednessEngine>, corpus: Arc<MemoryCorpus>, port: u16) -> std::io::Result<()> {
        let state = web::Data::new(ApiState { engine, corpus });
        info!("HTTP API listening on 0.0.0.0:{}", port);

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new().wrap(cors).app_data(state.clone()).configure(Self::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register routes; the app must provide `web::Data<ApiState>`
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.app_data(
            web::JsonConfig::default()
                .limit(MAX_BODY_BYTES)
                .error_handler(json_error),
        )
        .route("/relatedness", web::post().to(relatedness))
        .route("/documents", web::put().to(index_documents))
        .route("/corpus", web::get().to(corpus_info))
        .route("/health", web::get().to(health));
    }
}

/// Malformed bodies get the same envelope as any other client error
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = RelatednessResponse::error(err.to_string(), 400);
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

async fn relatedness(
    state: web::Data<ApiState>,
    params: web::Query<HashMap<String, String>>,
    req: web::Json<RelatednessRequest>,
) -> ActixResult<HttpResponse> {
    let engine = state.engine.clone();
    let request = req.into_inner();
    let params = params.into_inner();

    let response = web::block(move || engine.respond(request, params))
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let status = response
        .error
        .as_ref()
        .and_then(|e| StatusCode::from_u16(e.code).ok())
        .unwrap_or(StatusCode::OK);
    Ok(HttpResponse::build(status).json(response))
}

async fn index_documents(
    state: web::Data<ApiState>,
    req: web::Json<Vec<serde_json::Value>>,
) -> ActixResult<HttpResponse> {
    let documents = req.into_inner();
    match state.corpus.add_documents(documents) {
        Ok(indexed) => {
            debug!("Indexed {} documents over HTTP", indexed);
            Ok(HttpResponse::Ok().json(IndexResult {
                indexed,
                documents: state.corpus.len(),
            }))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(RelatednessResponse::error(e.to_string(), 400))),
    }
}

async fn corpus_info(state: web::Data<ApiState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(CorpusInfo {
        documents: state.corpus.len(),
        fields: state.corpus.fields(),
    }))
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use relgraph_engine::EngineConfig;
    use serde_json::{json, Value};

    fn state() -> web::Data<ApiState> {
        let corpus = Arc::new(
            MemoryCorpus::from_documents(vec![
                json!({"jobtitle": "nurse", "skills": ["triage"]}),
                json!({"jobtitle": "nurse", "skills": ["triage", "charting"]}),
                json!({"jobtitle": "chef", "skills": ["knives"]}),
            ])
            .unwrap(),
        );
        let config = EngineConfig {
            worker_threads: Some(2),
            ..Default::default()
        };
        let engine = RelatednessEngine::new(corpus.clone(), config).unwrap();
        web::Data::new(ApiState {
            engine: Arc::new(engine),
            corpus,
        })
    }

    #[actix_web::test]
    async fn test_relatedness_ok() {
        let app = test::init_service(App::new().app_data(state()).configure(RestApi::configure)).await;
        let req = test::TestRequest::post()
            .uri("/relatedness?sort=foreground_popularity")
            .set_json(json!({
                "queries": ["jobtitle:nurse"],
                "compare": [{"type": "skills", "limit": 2}]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let values = body["data"][0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["value"], "triage");
        assert!(body.get("error").is_none());
    }

    #[actix_web::test]
    async fn test_relatedness_client_error() {
        let app = test::init_service(App::new().app_data(state()).configure(RestApi::configure)).await;
        let req = test::TestRequest::post()
            .uri("/relatedness")
            .set_json(json!({"queries": ["*:*"], "compare": [{"type": "salary"}]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], 400);
        assert!(body["error"]["msg"].as_str().unwrap().contains("salary"));
    }

    #[actix_web::test]
    async fn test_malformed_body_uses_envelope() {
        let app = test::init_service(App::new().app_data(state()).configure(RestApi::configure)).await;
        let req = test::TestRequest::post()
            .uri("/relatedness")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"queries\": [")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], 400);
    }

    #[actix_web::test]
    async fn test_index_then_inspect() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(RestApi::configure)).await;

        let req = test::TestRequest::put()
            .uri("/documents")
            .set_json(json!([{"jobtitle": "welder", "city": "tulsa"}]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["indexed"], 1);
        assert_eq!(body["documents"], 4);

        let req = test::TestRequest::get().uri("/corpus").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["documents"], 4);
        assert_eq!(body["fields"], json!(["city", "jobtitle", "skills"]));

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_rejected_batch_leaves_corpus_unchanged() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(RestApi::configure)).await;

        let req = test::TestRequest::put()
            .uri("/documents")
            .set_json(json!([{"jobtitle": "welder"}, 42]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], 400);

        let req = test::TestRequest::get().uri("/corpus").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["documents"], 3);
        assert_eq!(body["fields"], json!(["jobtitle", "skills"]));
    }
}
