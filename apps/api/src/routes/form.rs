//! `multipart/form-data` reader shared by the chat and recommendation endpoints.

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use tracing::debug;

use crate::chat::attachment::UploadedFile;
use crate::errors::AppError;

/// Text fields by name plus every file part, in upload order.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<(String, UploadedFile)>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Removes and returns every file sent under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        matching.into_iter().map(|(_, file)| file).collect()
    }
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation(format!("Error parsing `multipart/form-data` request: {e}"))
}

/// Materializes the whole form. Parts with a file name are files, the rest text.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(bad_multipart)?;
                // browsers send an empty part when no file was picked
                if file_name.trim().is_empty() || data.is_empty() {
                    debug!("Skipping empty file part {name}");
                    continue;
                }
                debug!("Received file part {name}: {file_name} ({} bytes)", data.len());
                form.files
                    .push((name, UploadedFile::new(file_name, content_type, data)));
            }
            None => {
                let value = field.text().await.map_err(bad_multipart)?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
