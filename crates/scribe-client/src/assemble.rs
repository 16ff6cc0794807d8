use tokio::fs::File;

use crate::{
    error::{AudioError, Result},
    form::{EncodedForm, FormEncoder, FormError},
    types::{AudioInput, AudioRequest},
};

const FILE_FIELD: &str = "file";

/// Write `request` into `encoder` and seal it
///
/// Fields are written in a fixed order: `file`, `model`, `prompt`,
/// `response_format`, `temperature`, `language`. Optional fields are only
/// written when set; empty strings and a zero temperature count as unset.
/// The first failure aborts assembly and the partial form is dropped.
pub async fn assemble<E: FormEncoder>(request: &AudioRequest, mut encoder: E) -> Result<EncodedForm<E::Output>> {
    if request.model.is_empty() {
        return Err(AudioError::Validation("model must not be empty".to_owned()));
    }

    write_input(&request.input, &mut encoder).await?;

    write_field(&mut encoder, "model", request.model.clone())?;

    if let Some(prompt) = non_empty(request.prompt.as_deref()) {
        write_field(&mut encoder, "prompt", prompt.to_owned())?;
    }

    if let Some(format) = request.response_format {
        write_field(&mut encoder, "response_format", format.to_string())?;
    }

    if let Some(temperature) = request.temperature.filter(|t| *t != 0.0) {
        write_field(&mut encoder, "temperature", format!("{temperature:.2}"))?;
    }

    if let Some(language) = non_empty(request.language.as_deref()) {
        write_field(&mut encoder, "language", language.to_owned())?;
    }

    encoder.finalize().map_err(|e| AudioError::encoding("form", e))
}

async fn write_input<E: FormEncoder>(input: &AudioInput, encoder: &mut E) -> Result<()> {
    match input {
        AudioInput::Path(path) => {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| AudioError::Validation(format!("audio path {} has no file name", path.display())))?;

            // Dropped on return, whichever way the write goes
            let mut file = File::open(path).await.map_err(|source| AudioError::Resource {
                path: path.clone(),
                source,
            })?;

            encoder
                .write_file(FILE_FIELD, &filename, &mut file)
                .await
                .map_err(|e| match e {
                    FormError::Io(source) => AudioError::Resource {
                        path: path.clone(),
                        source,
                    },
                    other => AudioError::encoding(FILE_FIELD, other),
                })
        }
        AudioInput::Bytes { filename, data } => {
            if !has_extension(filename) {
                return Err(AudioError::Validation(format!(
                    "filename with a file extension is required when audio bytes are used, got `{filename}`"
                )));
            }

            encoder
                .write_file_bytes(FILE_FIELD, filename, data.clone())
                .map_err(|e| AudioError::encoding(FILE_FIELD, e))
        }
    }
}

fn write_field<E: FormEncoder>(encoder: &mut E, name: &str, value: String) -> Result<()> {
    encoder
        .write_field(name, value)
        .map_err(|e| AudioError::encoding(name, e))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// The service infers the audio format from the extension
fn has_extension(filename: &str) -> bool {
    filename.rsplit_once('.').is_some_and(|(_, ext)| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::{
        error::ErrorKind,
        types::{ResponseFormat, WHISPER_1},
    };

    /// Records every write as a `(name, value)` pair
    #[derive(Debug, Default)]
    struct RecordingEncoder {
        entries: Vec<(String, String)>,
        fail_on: Option<&'static str>,
        sealed: bool,
    }

    impl RecordingEncoder {
        fn failing_on(field: &'static str) -> Self {
            Self {
                fail_on: Some(field),
                ..Self::default()
            }
        }

        fn check(&self, name: &str) -> std::result::Result<(), FormError> {
            if self.sealed {
                return Err(FormError::Finalized);
            }
            if self.fail_on == Some(name) {
                return Err(FormError::ContentType(format!("refusing {name}")));
            }
            Ok(())
        }
    }

    impl FormEncoder for RecordingEncoder {
        type Output = Vec<(String, String)>;

        fn write_field(&mut self, name: &str, value: String) -> std::result::Result<(), FormError> {
            self.check(name)?;
            self.entries.push((name.to_owned(), value));
            Ok(())
        }

        fn write_file_bytes(&mut self, name: &str, filename: &str, data: Bytes) -> std::result::Result<(), FormError> {
            self.check(name)?;
            let contents = String::from_utf8_lossy(&data);
            self.entries.push((name.to_owned(), format!("{filename}:{contents}")));
            Ok(())
        }

        fn finalize(&mut self) -> std::result::Result<EncodedForm<Self::Output>, FormError> {
            self.check("finalize")?;
            self.sealed = true;
            Ok(EncodedForm {
                body: std::mem::take(&mut self.entries),
                content_type: "multipart/form-data; boundary=recorded".to_owned(),
            })
        }
    }

    fn names(entries: &[(String, String)]) -> Vec<&str> {
        entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn value<'a>(entries: &'a [(String, String)], name: &str) -> Option<&'a str> {
        entries.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    fn clip(filename: &str) -> AudioInput {
        AudioInput::bytes(filename, Bytes::from_static(b"pcm"))
    }

    #[tokio::test]
    async fn path_input_uses_base_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let request = AudioRequest::new(WHISPER_1, AudioInput::path(&path));
        let encoded = assemble(&request, RecordingEncoder::default()).await.unwrap();

        assert_eq!(names(&encoded.body), ["file", "model"]);
        assert_eq!(value(&encoded.body, "file"), Some("a.wav:RIFF"));
        assert_eq!(value(&encoded.body, "model"), Some("whisper-1"));
    }

    #[tokio::test]
    async fn fields_are_written_in_fixed_order() {
        let request = AudioRequest::new(WHISPER_1, clip("clip.mp3"))
            .with_language("de")
            .with_temperature(0.5)
            .with_response_format(ResponseFormat::Vtt)
            .with_prompt("Guten Tag");

        let encoded = assemble(&request, RecordingEncoder::default()).await.unwrap();

        assert_eq!(
            names(&encoded.body),
            ["file", "model", "prompt", "response_format", "temperature", "language"]
        );
        assert_eq!(value(&encoded.body, "response_format"), Some("vtt"));
        assert_eq!(value(&encoded.body, "temperature"), Some("0.50"));
        assert_eq!(value(&encoded.body, "language"), Some("de"));
    }

    #[tokio::test]
    async fn zero_temperature_is_omitted() {
        let request = AudioRequest::new(WHISPER_1, clip("clip.wav")).with_temperature(0.0);
        let encoded = assemble(&request, RecordingEncoder::default()).await.unwrap();

        assert_eq!(value(&encoded.body, "temperature"), None);
    }

    #[tokio::test]
    async fn temperature_has_two_decimals() {
        for (temperature, expected) in [(1.0, "1.00"), (0.2, "0.20"), (0.333, "0.33"), (1.5, "1.50")] {
            let request = AudioRequest::new(WHISPER_1, clip("clip.wav")).with_temperature(temperature);
            let encoded = assemble(&request, RecordingEncoder::default()).await.unwrap();

            assert_eq!(value(&encoded.body, "temperature"), Some(expected), "temperature {temperature}");
        }
    }

    #[tokio::test]
    async fn empty_strings_are_omitted() {
        let request = AudioRequest::new(WHISPER_1, clip("clip.wav"))
            .with_prompt("")
            .with_language("");

        let encoded = assemble(&request, RecordingEncoder::default()).await.unwrap();

        assert_eq!(names(&encoded.body), ["file", "model"]);
    }

    #[tokio::test]
    async fn bytes_without_extension_are_rejected() {
        for filename in ["clip", "clip.", ""] {
            let request = AudioRequest::new(WHISPER_1, clip(filename));
            let err = assemble(&request, RecordingEncoder::default()).await.unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Validation, "filename {filename:?}");
            assert!(err.to_string().contains("extension"));
        }
    }

    #[tokio::test]
    async fn missing_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wav");

        let request = AudioRequest::new(WHISPER_1, AudioInput::path(&path));
        let err = assemble(&request, RecordingEncoder::default()).await.unwrap_err();

        assert!(matches!(err, AudioError::Resource { path: ref p, .. } if p == &path));
    }

    #[tokio::test]
    async fn empty_model_is_rejected() {
        let request = AudioRequest::new("", clip("clip.wav"));
        let err = assemble(&request, RecordingEncoder::default()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn writer_failure_names_the_field() {
        let request = AudioRequest::new(WHISPER_1, clip("clip.wav")).with_prompt("hello");

        let err = assemble(&request, RecordingEncoder::failing_on("prompt")).await.unwrap_err();
        assert!(matches!(err, AudioError::Encoding { ref field, .. } if field == "prompt"));

        let err = assemble(&request, RecordingEncoder::failing_on("file")).await.unwrap_err();
        assert!(matches!(err, AudioError::Encoding { ref field, .. } if field == "file"));

        let err = assemble(&request, RecordingEncoder::failing_on("finalize")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[tokio::test]
    async fn assembly_is_deterministic() {
        let request = AudioRequest::new(WHISPER_1, clip("clip.ogg"))
            .with_prompt("names: Ada, Grace")
            .with_temperature(0.7)
            .with_language("en");

        let first = assemble(&request, RecordingEncoder::default()).await.unwrap();
        let second = assemble(&request, RecordingEncoder::default()).await.unwrap();

        assert_eq!(first.body, second.body);
    }
}
