//! Files picked by the user

use std::future::Future;

/// Errors that can occur while reading a picked file
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Failed to read file: {0}")]
    Read(String),
    #[error("Failed to create object URL: {0}")]
    ObjectUrl(String),
}

/// A file handed over by a file input
pub trait UploadedFile {
    /// File name (without path)
    fn name(&self) -> String;

    /// MIME type reported by the browser (may be empty)
    fn mime_type(&self) -> String;

    /// Session-scoped URL the page can use to display the file
    fn object_url(&self) -> Result<String, FileError>;

    /// Read the whole file
    fn read_bytes(&self) -> impl Future<Output = Result<Vec<u8>, FileError>>;
}

/// A file already held in memory
#[derive(Clone, Debug)]
pub struct PickedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

impl UploadedFile for PickedFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn object_url(&self) -> Result<String, FileError> {
        Ok(format!("memory:{}", self.name))
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, FileError> {
        Ok(self.data.clone())
    }
}
