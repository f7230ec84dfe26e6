use crate::{
    config::ServerConfig,
    diagnostics::Diagnostics,
    error::AvatarError,
    models::GenerateEnvelope,
    relay::{redacted, Relay},
};
use actix_cors::Cors;
use actix_web::{
    http::StatusCode, middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

/// Headers never copied into snapshots.
const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

pub struct AppState {
    pub relay: Relay,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self { relay }
    }
}

/// Routes, shared state and JSON limits, ready for `App::configure`.
pub fn configure(
    state: web::Data<AppState>,
    json_limit: usize,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state)
            .app_data(json_config(json_limit))
            .route("/health", web::get().to(health))
            .route("/generate", web::post().to(generate))
            .route("/api/generate", web::post().to(generate));
    }
}

/// Malformed or oversized bodies still answer with a `GenerateResult`.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            log::warn!("⚠️  Rejected request body: {}", err);
            AvatarError::Validation(format!("Invalid request body: {}", err)).into()
        })
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Avatar Maker Backend is running"
    }))
}

pub async fn generate(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<GenerateEnvelope>,
) -> HttpResponse {
    let request_id = Uuid::new_v4().to_string();
    let envelope = body.into_inner();
    log::info!("[{}] Received generate request", request_id);

    state.relay.diagnostics().snapshot(
        &request_id,
        "request.json",
        json!({
            "timestamp": Utc::now().to_rfc3339(),
            "requestId": request_id,
            "headers": header_snapshot(&req),
            "body": redacted(&envelope),
        }),
    );

    let response = state.relay.generate(&request_id, &envelope).await;
    HttpResponse::build(
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    )
    .json(response.result)
}

fn header_snapshot(req: &HttpRequest) -> Value {
    let headers: serde_json::Map<String, Value> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "***".to_string()
            } else {
                value.to_str().unwrap_or_default().to_string()
            };
            (name.to_string(), Value::String(value))
        })
        .collect();
    Value::Object(headers)
}

pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let diagnostics = Diagnostics::new(&config.log_dir, config.log_level);
    let state = web::Data::new(AppState::new(Relay::http(diagnostics)));
    let json_limit = config.json_limit;

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure(state.clone(), json_limit))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
