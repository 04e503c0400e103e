use crate::config::MediaConfig;
use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;
use uuid::Uuid;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub const RECIPE_IMAGES: &str = "recipes/images";
pub const AVATARS: &str = "users/images";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decodes `data:image/<ext>;base64,<payload>`.
pub fn decode_data_uri(data: &str) -> Result<DecodedImage, String> {
    let (header, payload) = data
        .split_once(";base64,")
        .ok_or_else(|| "Expected a base64 encoded data URI.".to_string())?;
    let extension = header
        .strip_prefix("data:image/")
        .ok_or_else(|| "Expected a base64 encoded data URI.".to_string())?
        .to_ascii_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(format!("Unsupported image format '{}'.", extension));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| "Image is not valid base64.".to_string())?;
    if bytes.is_empty() {
        return Err("Image is empty.".to_string());
    }

    Ok(DecodedImage { extension, bytes })
}

/// Uploaded files on local disk, addressed by paths relative to the media root.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(config: &MediaConfig) -> Self {
        MediaStorage {
            root: config.root.clone(),
            url: config.url.clone(),
        }
    }

    /// Writes the image under `folder` with a random file name and returns its relative path.
    pub async fn save(&self, folder: &str, image: &DecodedImage) -> Result<String, anyhow::Error> {
        let name = format!("{}/{}.{}", folder, Uuid::new_v4(), image.extension);
        let path = self.root.join(&name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating media directory {}", parent.display()))?;
        }
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("writing media file {}", path.display()))?;
        log::debug!("Stored media file {} ({} bytes)", name, image.bytes.len());
        Ok(name)
    }

    /// Best effort; a missing file is not an error.
    pub async fn delete(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(name)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to delete media file {}: {:?}", name, e);
            }
        }
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.url, name)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
