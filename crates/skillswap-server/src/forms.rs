//! Buffered view over a multipart upload: text fields by name, file fields in
//! arrival order.

use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    form.files.push(UploadedFile {
                        field: name,
                        file_name: Some(file_name),
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let value = field.text().await?;
                    form.texts.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// Files uploaded under `field`, in the order they were sent.
    pub fn files<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.files.iter().filter(move |f| f.field == field)
    }

    pub fn first_file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    /// Decode a text field holding a JSON-encoded list of strings.
    pub fn json_list(&self, name: &str) -> Result<Option<Vec<String>>, AppError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };

        serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| AppError::PayloadInvalid(format!("Field '{name}' must be a JSON list of strings: {e}")))
    }
}
