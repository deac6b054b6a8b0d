//! Browser file handles

use super::file::{FileError, UploadedFile};
use wasm_bindgen_futures::JsFuture;

/// A `File` taken from an `<input type="file">`
#[derive(Clone, Debug)]
pub struct WebFile {
    file: web_sys::File,
}

impl WebFile {
    pub fn new(file: web_sys::File) -> Self {
        Self { file }
    }

    /// First file selected in an input, if any
    pub fn from_input(input: &web_sys::HtmlInputElement) -> Option<Self> {
        input.files().and_then(|files| files.get(0)).map(Self::new)
    }
}

impl UploadedFile for WebFile {
    fn name(&self) -> String {
        self.file.name()
    }

    fn mime_type(&self) -> String {
        self.file.type_()
    }

    fn object_url(&self) -> Result<String, FileError> {
        web_sys::Url::create_object_url_with_blob(&self.file)
            .map_err(|e| FileError::ObjectUrl(format!("{:?}", e)))
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, FileError> {
        let buffer = JsFuture::from(self.file.array_buffer())
            .await
            .map_err(|e| FileError::Read(format!("{:?}", e)))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}
