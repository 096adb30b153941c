use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{get, middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Result;
use chrono::Utc;

use coc_engine::database::store::MemoryStore;
use coc_engine::database::Store;
use coc_engine::{routes, AppContext, Config};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("Starting COC engine...");

    // Load configuration
    let config = Config::from_env()?;
    log::info!("Configuration loaded (environment: {})", config.environment);

    // The bundled backend; a production deployment swaps in the managed
    // document-store driver behind the same trait.
    let store = Store::new(Arc::new(MemoryStore::new()), config.store_deadline);
    let context = AppContext::new(store);

    // Complete anything a previous crash left half-certified.
    let recovered = context.certification.recover_dangling(Utc::now()).await?;
    if !recovered.is_empty() {
        log::warn!("recovery completed {} dangling periods", recovered.len());
    }

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    let app_context = context.clone();
    HttpServer::new(move || {
        let context = app_context.clone();
        App::new()
            .configure(|cfg| context.configure_data(cfg))
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type", "Accept", "X-Actor-Id"])
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
