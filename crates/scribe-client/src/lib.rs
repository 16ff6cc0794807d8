#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Typed Rust client for Whisper-compatible audio endpoints
//!
//! Builds multipart requests for `/audio/transcriptions` and
//! `/audio/translations`, sends them through a pluggable [`Transport`] and
//! decodes the reply into a [`Transcription`] whatever the response format

mod assemble;
mod client;
pub mod error;
pub mod form;
mod transport;
pub mod types;

pub use assemble::assemble;
pub use client::{AudioClient, CallOptions};
pub use error::{AudioError, ErrorKind, Result};
pub use form::{EncodedForm, FormEncoder, FormError, MultipartEncoder};
pub use transport::Transport;
pub use types::*;
