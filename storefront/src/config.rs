// ishop/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

/// Account created at startup when none with this email exists yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
  pub email: String,
  pub password: String,
  pub mobile: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub database_max_connections: u32,

  pub jwt_secret: String,
  pub jwt_ttl_hours: i64,

  pub allowed_origins: Vec<String>,

  pub upload_dir: PathBuf,
  pub public_base_url: String,

  pub log_format: LogFormat,
  pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .or_else(|_| get_env("PORT"))
      .unwrap_or_else(|_| "5000".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = match get_env("STORE_BACKEND")
      .unwrap_or_else(|_| "postgres".to_string())
      .to_ascii_lowercase()
      .as_str()
    {
      "postgres" => StoreBackend::Postgres,
      "memory" => StoreBackend::Memory,
      other => return Err(AppError::Config(format!("Invalid STORE_BACKEND '{}'", other))),
    };
    let database_url = get_env("DATABASE_URL").ok();
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config("DATABASE_URL is required for the postgres store".to_string()));
    }
    let database_max_connections = get_env("DATABASE_MAX_CONNECTIONS")
      .unwrap_or_else(|_| "10".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e)))?;

    let jwt_secret = get_env("JWT_SECRET")?;
    let jwt_ttl_hours = get_env("JWT_TTL_HOURS")
      .unwrap_or_else(|_| "24".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid JWT_TTL_HOURS: {}", e)))?;
    if jwt_ttl_hours <= 0 {
      return Err(AppError::Config("JWT_TTL_HOURS must be positive".to_string()));
    }

    let mut allowed_origins: Vec<String> = get_env("ALLOWED_ORIGINS")
      .map(|raw| {
        raw
          .split(',')
          .map(|o| o.trim().to_string())
          .filter(|o| !o.is_empty())
          .collect()
      })
      .unwrap_or_default();
    for var in ["FRONTEND_URL", "FRONTEND_URL_PROD"] {
      if let Ok(origin) = get_env(var) {
        if !origin.trim().is_empty() && !allowed_origins.contains(&origin) {
          allowed_origins.push(origin);
        }
      }
    }

    let upload_dir = PathBuf::from(get_env("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));
    let public_base_url =
      get_env("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let log_format = match get_env("LOG_FORMAT").as_deref() {
      Ok("json") => LogFormat::Json,
      _ => LogFormat::Pretty,
    };

    let admin_seed = match (get_env("SEED_ADMIN_EMAIL"), get_env("SEED_ADMIN_PASSWORD")) {
      (Ok(email), Ok(password)) => Some(AdminSeed {
        email,
        password,
        mobile: get_env("SEED_ADMIN_MOBILE").unwrap_or_else(|_| "9000000000".to_string()),
      }),
      _ => None,
    };

    tracing::info!(?store_backend, port = server_port, "Application configuration loaded.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections,
      jwt_secret,
      jwt_ttl_hours,
      allowed_origins,
      upload_dir,
      public_base_url,
      log_format,
      admin_seed,
    })
  }

  /// Configuration for tests and local tinkering: in-memory store, fixed secret.
  pub fn for_memory(jwt_secret: impl Into<String>) -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 5000,
      store_backend: StoreBackend::Memory,
      database_url: None,
      database_max_connections: 1,
      jwt_secret: jwt_secret.into(),
      jwt_ttl_hours: 24,
      allowed_origins: Vec::new(),
      upload_dir: env::temp_dir().join("ishop-uploads"),
      public_base_url: "http://127.0.0.1:5000".to_string(),
      log_format: LogFormat::Pretty,
      admin_seed: None,
    }
  }
}
