//! Execution endpoints: node catalogue, run submission and the two
//! server-sent event streams.

use crate::AppState;
use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse, Responder};
use futures::{Stream, StreamExt};
use graphcore::WorkflowDocument;
use graphruntime::stream::{encode_run, log_stream};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ExecuteResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    token: String,
}

pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(list_node_types)
        .service(execute)
        .service(execute_stream)
        .service(logs);
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "graphengine"
    }))
}

/// Descriptors of every registered node type
#[get("/api/nodes")]
async fn list_node_types(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.runtime.node_descriptors())
}

/// Build a run from the posted document. Execution starts when the
/// token is attached.
#[post("/api/execute")]
async fn execute(
    data: web::Data<AppState>,
    doc: web::Json<WorkflowDocument>,
) -> impl Responder {
    let doc = doc.into_inner();
    let token = data.runtime.submit(&doc);
    info!("Submitted run {} with {} nodes", token, doc.nodes.len());
    HttpResponse::Ok().json(ExecuteResponse { token })
}

#[get("/api/execute_stream")]
async fn execute_stream(
    data: web::Data<AppState>,
    query: web::Query<StreamQuery>,
) -> HttpResponse {
    match data.runtime.attach(&query.token) {
        Ok(run) => event_stream(encode_run(run)),
        Err(e) => {
            warn!("Rejected stream request: {}", e);
            HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(e.to_string())
        }
    }
}

/// Live log channel. Idle periods are filled with keep-alive comments.
#[get("/api/logs")]
async fn logs(data: web::Data<AppState>) -> HttpResponse {
    let receiver = data.runtime.subscribe_logs();
    event_stream(log_stream(receiver, data.log_keepalive))
}

fn event_stream<S>(records: S) -> HttpResponse
where
    S: Stream<Item = String> + 'static,
{
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(records.map(|record| Ok::<_, actix_web::Error>(web::Bytes::from(record))))
}
