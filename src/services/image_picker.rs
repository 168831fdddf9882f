use crate::error::PickError;
use crate::models::classify_types::{ImageId, UploadedImage};
use base64::Engine;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// A file handed over by the host's file picker.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, PickError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PickError::Unreadable(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            name: file_name(path),
            media_type: media_type_for(path),
            bytes,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Media type a file picker would report for `path`, judged by extension.
pub fn media_type_for(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MEDIA_TYPE.to_string())
}

pub fn is_image_media_type(media_type: &str) -> bool {
    let lower = media_type.to_ascii_lowercase();
    lower.len() > "image/".len() && lower.starts_with("image/")
}

/// Turns picked files into [`UploadedImage`]s, numbering every accepted pick.
#[derive(Debug, Default)]
pub struct ImagePicker {
    last_id: u64,
}

impl ImagePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means the picker was dismissed and is not an error.
    pub async fn select(&mut self, file: Option<SelectedFile>) -> Result<Option<UploadedImage>, PickError> {
        let Some(file) = file else {
            return Ok(None);
        };

        if !is_image_media_type(&file.media_type) {
            return Err(PickError::InvalidFile {
                media_type: file.media_type,
            });
        }

        let raw_bytes: Arc<[u8]> = Arc::from(file.bytes);
        let displayable = encode_displayable(&file.media_type, Arc::clone(&raw_bytes)).await?;

        self.last_id += 1;
        Ok(Some(UploadedImage {
            id: ImageId(self.last_id),
            file_name: file.name,
            media_type: file.media_type,
            raw_bytes,
            displayable,
        }))
    }

    /// Rejects by extension before reading, so non-images are never loaded.
    pub async fn select_path(&mut self, path: Option<&Path>) -> Result<Option<UploadedImage>, PickError> {
        let Some(path) = path else {
            return Ok(None);
        };

        let media_type = media_type_for(path);
        if !is_image_media_type(&media_type) {
            return Err(PickError::InvalidFile { media_type });
        }

        let file = SelectedFile::from_path(path).await?;
        self.select(Some(file)).await
    }
}

async fn encode_displayable(media_type: &str, bytes: Arc<[u8]>) -> Result<String, PickError> {
    let media_type = media_type.to_string();
    tokio::task::spawn_blocking(move || {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&*bytes);
        format!("data:{};base64,{}", media_type, b64)
    })
    .await
    .map_err(|e| PickError::Unreadable(format!("encoding task failed: {}", e)))
}

/// The host's file input element. Like a browser `<input type="file">`, choosing
/// the value it already holds does not count as a change.
#[derive(Debug, Default)]
pub struct FileInput {
    value: Option<PathBuf>,
}

impl FileInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path only when it differs from the current value.
    /// Dismissing the dialog (`None`) keeps the current value.
    pub fn changed(&self, path: Option<PathBuf>) -> Option<PathBuf> {
        path.filter(|path| self.value.as_ref() != Some(path))
    }

    /// Records `path` as the current value. Only accepted picks are
    /// committed, so a rejected file can be chosen again once it is fixed.
    pub fn commit(&mut self, path: PathBuf) {
        self.value = Some(path);
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn value(&self) -> Option<&Path> {
        self.value.as_deref()
    }
}
