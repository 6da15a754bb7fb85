// ishop/src/services/image_store.rs

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Where uploaded images end up. Returns a URL the storefront can render.
#[async_trait]
pub trait ImageStore: Send + Sync {
  async fn save(&self, original_name: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Writes images under a local directory that the server exposes at `/uploads`.
pub struct LocalImageStore {
  dir: PathBuf,
  public_base_url: String,
}

impl LocalImageStore {
  pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
    Self {
      dir: dir.into(),
      public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
    }
  }
}

fn extension_of(original_name: &str) -> Result<String> {
  let ext = Path::new(original_name)
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();
  if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
    Ok(ext)
  } else {
    Err(AppError::Validation("Only image files are allowed".to_string()))
  }
}

#[async_trait]
impl ImageStore for LocalImageStore {
  #[instrument(name = "LocalImageStore::save", skip(self, bytes), fields(size = bytes.len()))]
  async fn save(&self, original_name: &str, bytes: Vec<u8>) -> Result<String> {
    if bytes.is_empty() {
      return Err(AppError::Validation("No image uploaded".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
      return Err(AppError::Validation("Image exceeds the 5 MB limit".to_string()));
    }
    let ext = extension_of(original_name)?;
    let file_name = format!("{}.{}", Uuid::new_v4(), ext);

    tokio::fs::create_dir_all(&self.dir).await?;
    tokio::fs::write(self.dir.join(&file_name), bytes).await?;
    info!(%file_name, "Stored uploaded image.");

    Ok(format!("{}/uploads/{}", self.public_base_url, file_name))
  }
}
