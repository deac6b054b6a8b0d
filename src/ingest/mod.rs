//! Clothing item ingestion
//!
//! Turns a picked file into a `ClothingItem`: images become object URLs
//! synchronously, `.glb` models are read and decoded asynchronously.

pub mod glb;

pub use glb::{DecodeError, GlbLoader};

use crate::clothing::{ClothingItem, SceneGraph};
use crate::consts::{IMAGE_MIME_PREFIX, MODEL_EXTENSION};
use crate::platform::file::FileError;
use crate::platform::{CancellationToken, UploadedFile};

/// Errors that can occur while ingesting a file
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported file '{name}' (expected {expected})")]
    Unsupported { name: String, expected: &'static str },
    #[error(transparent)]
    File(#[from] FileError),
    #[error("Could not load '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
    #[error("Loading was cancelled")]
    Cancelled,
}

/// Decodes model bytes into a renderable scene
pub trait ModelLoader {
    fn load(&self, bytes: &[u8]) -> Result<SceneGraph, DecodeError>;
}

/// Whether a file name has the accepted model extension
pub fn is_model_file(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(MODEL_EXTENSION)
}

/// Whether a MIME type is an image type
pub fn is_image_type(mime_type: &str) -> bool {
    mime_type.to_ascii_lowercase().starts_with(IMAGE_MIME_PREFIX)
}

/// Build an item from an image file.
///
/// No file selected is not an error: returns `Ok(None)`.
pub fn ingest_image<F: UploadedFile>(file: Option<&F>) -> Result<Option<ClothingItem>, IngestError> {
    let Some(file) = file else {
        return Ok(None);
    };
    if !is_image_type(&file.mime_type()) {
        return Err(IngestError::Unsupported {
            name: file.name(),
            expected: "an image",
        });
    }
    let url = file.object_url()?;
    Ok(Some(ClothingItem::image(url)))
}

/// Build an item from a `.glb` model file.
///
/// Reading the file is the only suspension point; once it resumes, a
/// cancelled `token` stops the decode. No file selected returns `Ok(None)`.
pub async fn ingest_model<F, L>(
    file: Option<&F>,
    loader: &L,
    token: &CancellationToken,
) -> Result<Option<ClothingItem>, IngestError>
where
    F: UploadedFile,
    L: ModelLoader,
{
    let Some(file) = file else {
        return Ok(None);
    };
    let name = file.name();
    if !is_model_file(&name) {
        return Err(IngestError::Unsupported {
            name,
            expected: "a .glb model",
        });
    }

    let bytes = file.read_bytes().await?;
    if token.is_cancelled() {
        return Err(IngestError::Cancelled);
    }

    let mut scene = loader
        .load(&bytes)
        .map_err(|source| IngestError::Decode {
            name: name.clone(),
            source,
        })?;
    scene.name = Some(name);
    scene.url = Some(file.object_url()?);

    log::info!(
        "Decoded model: {} nodes, {} meshes, {} bytes of buffers",
        scene.nodes.len(),
        scene.mesh_count,
        scene.binary_len
    );
    Ok(Some(ClothingItem::model(scene)))
}
