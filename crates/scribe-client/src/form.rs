//! Multipart form writing
//!
//! [`FormEncoder`] is the seam between request assembly and the wire format.
//! [`MultipartEncoder`] backs it with a `reqwest` multipart form.

use std::collections::HashSet;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Errors raised while writing a multipart form
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The encoder was already finalized
    #[error("form already finalized")]
    Finalized,

    /// A file field with this name was already written
    #[error("file field `{0}` written twice")]
    DuplicateFile(String),

    /// Reading file contents failed
    #[error("failed to read file contents: {0}")]
    Io(#[from] std::io::Error),

    /// The part's content type was rejected
    #[error("invalid content type: {0}")]
    ContentType(String),
}

/// A sealed form body together with its `Content-Type` header value
#[derive(Debug)]
pub struct EncodedForm<T> {
    /// Finalized body
    pub body: T,
    /// `multipart/form-data; boundary=...`
    pub content_type: String,
}

/// Writer for a `multipart/form-data` body
#[async_trait]
pub trait FormEncoder: Send {
    /// Body produced on finalization
    type Output: Send;

    /// Write a named text field
    fn write_field(&mut self, name: &str, value: String) -> Result<(), FormError>;

    /// Write a named file field from an in-memory buffer
    fn write_file_bytes(&mut self, name: &str, filename: &str, data: Bytes) -> Result<(), FormError>;

    /// Seal the encoder and return the body
    fn finalize(&mut self) -> Result<EncodedForm<Self::Output>, FormError>;

    /// Write a named file field by reading `reader` to completion
    ///
    /// The reader stays owned by the caller, which is responsible for closing it.
    async fn write_file(
        &mut self,
        name: &str,
        filename: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), FormError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        self.write_file_bytes(name, filename, Bytes::from(data))
    }
}

/// [`FormEncoder`] producing a `reqwest` multipart form
#[derive(Debug)]
pub struct MultipartEncoder {
    form: Option<Form>,
    file_fields: HashSet<String>,
}

impl MultipartEncoder {
    pub fn new() -> Self {
        Self {
            form: Some(Form::new()),
            file_fields: HashSet::new(),
        }
    }

    fn take_form(&mut self) -> Result<Form, FormError> {
        self.form.take().ok_or(FormError::Finalized)
    }
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormEncoder for MultipartEncoder {
    type Output = Form;

    fn write_field(&mut self, name: &str, value: String) -> Result<(), FormError> {
        let form = self.take_form()?;
        self.form = Some(form.text(name.to_owned(), value));

        Ok(())
    }

    fn write_file_bytes(&mut self, name: &str, filename: &str, data: Bytes) -> Result<(), FormError> {
        if self.form.is_none() {
            return Err(FormError::Finalized);
        }

        if self.file_fields.contains(name) {
            return Err(FormError::DuplicateFile(name.to_owned()));
        }

        let mime = mime_guess::from_path(filename).first_or_octet_stream();

        let part = Part::bytes(data.to_vec())
            .file_name(filename.to_owned())
            .mime_str(mime.essence_str())
            .map_err(|e| FormError::ContentType(e.to_string()))?;

        let form = self.take_form()?;
        self.form = Some(form.part(name.to_owned(), part));
        self.file_fields.insert(name.to_owned());

        Ok(())
    }

    fn finalize(&mut self) -> Result<EncodedForm<Form>, FormError> {
        let form = self.take_form()?;
        let content_type = format!("multipart/form-data; boundary={}", form.boundary());

        Ok(EncodedForm {
            body: form,
            content_type,
        })
    }
}
