/// On-disk storage for uploaded proof-of-completion images
///
/// Images are grouped per habit: `<root>/<habitId>/<file>`, served back to
/// clients under `/uploads/<habitId>/<file>`. The store is created once at
/// startup from an explicit configuration and then shared.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::HabitId;

/// URL prefix under which stored images are served
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Default maximum image size: 10 MB
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Errors that can occur while storing or removing images
#[derive(Error, Debug)]
pub enum ImageStoreError {
    #[error("Image is empty")]
    Empty,

    #[error("Image is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Image storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where images go and how big they may be
#[derive(Debug, Clone)]
pub struct ImageStoreConfig {
    pub root: PathBuf,
    pub max_bytes: usize,
}

/// A file written by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Location on disk
    pub path: PathBuf,
    /// Public path clients use to fetch it
    pub url: String,
}

/// Filesystem-backed image store
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    /// Create the upload directory if needed and return a ready store
    pub async fn init(config: ImageStoreConfig) -> Result<Self, ImageStoreError> {
        tokio::fs::create_dir_all(&config.root)
            .await
            .map_err(|source| ImageStoreError::Io {
                path: config.root.clone(),
                source,
            })?;

        tracing::info!(
            "Image store ready at {} (max {} bytes)",
            config.root.display(),
            config.max_bytes
        );

        Ok(Self {
            root: config.root,
            max_bytes: config.max_bytes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Write one image for a habit under a fresh, collision-free name
    pub async fn save(
        &self,
        habit_id: &HabitId,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredImage, ImageStoreError> {
        if bytes.is_empty() {
            return Err(ImageStoreError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(ImageStoreError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let habit_dir = self.root.join(habit_id.to_string());
        tokio::fs::create_dir_all(&habit_dir)
            .await
            .map_err(|source| ImageStoreError::Io {
                path: habit_dir.clone(),
                source,
            })?;

        let file_name = generate_file_name(original_name);
        let path = habit_dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ImageStoreError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Stored {} byte image at {}", bytes.len(), path.display());

        Ok(StoredImage {
            path,
            url: format!("{}/{}/{}", PUBLIC_PREFIX, habit_id, file_name),
        })
    }

    /// Best-effort removal of a stored image by its public URL
    ///
    /// Failures are logged, never returned.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            tracing::warn!("Refusing to remove image outside the upload directory: {}", url);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Removed image {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove image {}: {}", path.display(), e),
        }
    }

    /// Best-effort removal of every image stored for a habit
    pub async fn remove_habit_images(&self, habit_id: &HabitId) {
        let habit_dir = self.root.join(habit_id.to_string());

        match tokio::fs::remove_dir_all(&habit_dir).await {
            Ok(()) => tracing::debug!("Removed image directory {}", habit_dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove image directory {}: {}", habit_dir.display(), e),
        }
    }

    /// Map `/uploads/<habitId>/<file>` back to its location on disk
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let relative = Path::new(relative);

        let mut components = relative.components();
        let all_normal = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !all_normal || components.clone().count() != 2 {
            return None;
        }

        let habit_dir = components.next()?;
        let file = components.next()?;
        Some(self.root.join(habit_dir).join(file))
    }
}

/// Unique file name that keeps a sane extension from the client's name
fn generate_file_name(original_name: Option<&str>) -> String {
    let stamp = Utc::now().timestamp_millis();
    let unique = Uuid::new_v4().simple().to_string();
    let unique = &unique[..8];

    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}-{}.{}", stamp, unique, ext),
        None => format!("{}-{}", stamp, unique),
    }
}
