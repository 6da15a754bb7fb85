// ishop/src/main.rs

use ishop::config::{AppConfig, LogFormat, StoreBackend};
use ishop::services::{seed, LocalImageStore};
use ishop::state::AppState;
use ishop::store::{MemoryStore, PgStore, Store};
use ishop::web::configure_app_routes;

use actix_cors::Cors;
use actix_web::{http::header, web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: &LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration

  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

fn cors_for(allowed_origins: &[String]) -> Cors {
  let cors = Cors::default()
    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
    .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
    .max_age(3600);

  if allowed_origins.is_empty() {
    return cors.allow_any_origin();
  }
  allowed_origins
    .iter()
    .fold(cors.supports_credentials(), |cors, origin| cors.allowed_origin(origin))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      std::process::exit(1);
    }
  };
  init_tracing(&app_config.log_format);
  tracing::info!("Starting iShop API server...");

  let store: Arc<dyn Store> = match (app_config.store_backend, app_config.database_url.as_deref()) {
    (StoreBackend::Postgres, Some(url)) => match PgStore::connect(url, app_config.database_max_connections).await {
      Ok(pg) => {
        tracing::info!("Connected to the database and applied migrations.");
        Arc::new(pg)
      }
      Err(e) => {
        tracing::error!(error = %e, "Failed to connect to the database.");
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
      }
    },
    _ => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      Arc::new(MemoryStore::new())
    }
  };

  if let Some(admin_seed) = &app_config.admin_seed {
    if let Err(e) = seed::ensure_admin(store.as_ref(), admin_seed).await {
      tracing::error!(error = %e, "Failed to seed the admin account.");
    }
  }

  let upload_dir = app_config.upload_dir.clone();
  tokio::fs::create_dir_all(&upload_dir).await?;
  let images = Arc::new(LocalImageStore::new(upload_dir.clone(), app_config.public_base_url.clone()));

  let app_state = AppState::build(app_config.clone(), store, images);
  tracing::info!("Storefront pipelines registered.");

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  let allowed_origins = app_config.allowed_origins.clone();
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(cors_for(&allowed_origins))
      .wrap(tracing_actix_web::TracingLogger::default())
      .service(actix_files::Files::new("/uploads", upload_dir.clone()))
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
