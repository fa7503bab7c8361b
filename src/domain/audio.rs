use std::path::PathBuf;

use crate::domain::TranscribeError;

/// Data-URI subtypes the pipeline accepts, mapped to the file extension
/// used for the synthesized filename.
const DATA_URI_SUBTYPES: &[(&str, &str)] = &[
    ("wav", "wav"),
    ("mpeg", "mp3"),
    ("mp4", "m4a"),
    ("ogg", "ogg"),
    ("webm", "webm"),
];

/// File extensions accepted for local paths, mapped to their MIME type.
const EXTENSION_MIME: &[(&str, &str)] = &[
    ("wav", "audio/wav"),
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("ogg", "audio/ogg"),
    ("webm", "audio/webm"),
];

/// Look up the file extension for a supported data-URI subtype.
pub(crate) fn extension_for_subtype(subtype: &str) -> Option<&'static str> {
    DATA_URI_SUBTYPES
        .iter()
        .find(|(s, _)| *s == subtype)
        .map(|(_, ext)| *ext)
}

/// Look up the MIME type for a supported file extension.
pub(crate) fn mime_for_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_MIME
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// A reference to audio the host wants transcribed.
///
/// Classification of an incoming string happens here, once, instead of by
/// prefix sniffing at call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioReference {
    /// Path to a file on the local filesystem.
    LocalPath(PathBuf),
    /// HTTP(S) URL to fetch.
    RemoteUrl(String),
    /// Inline `data:audio/<subtype>;base64,<payload>` blob.
    DataUri { subtype: String, payload: String },
}

impl AudioReference {
    /// Classify a raw reference string.
    ///
    /// Strings starting with `data:` must match the accepted data-URI shape
    /// or the whole reference is rejected; well-formed http(s) URLs become
    /// [`AudioReference::RemoteUrl`]; everything else is treated as a local
    /// path. Subtype validation against the allow-list is left to the
    /// resolver.
    pub fn parse(input: &str) -> Result<Self, TranscribeError> {
        if input.starts_with("data:") {
            return Self::parse_data_uri(input);
        }

        if let Ok(url) = url::Url::parse(input) {
            if (url.scheme() == "http" || url.scheme() == "https") && url.has_host() {
                return Ok(AudioReference::RemoteUrl(input.to_string()));
            }
        }

        Ok(AudioReference::LocalPath(PathBuf::from(input)))
    }

    fn parse_data_uri(input: &str) -> Result<Self, TranscribeError> {
        let malformed = || {
            TranscribeError::UnsupportedFormat(
                "malformed data URI, expected data:audio/<subtype>;base64,<payload>".to_string(),
            )
        };

        let rest = input.strip_prefix("data:audio/").ok_or_else(malformed)?;
        let (header, payload) = rest.split_once(',').ok_or_else(malformed)?;
        let subtype = header.strip_suffix(";base64").ok_or_else(malformed)?;

        if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed());
        }

        Ok(AudioReference::DataUri {
            subtype: subtype.to_string(),
            payload: payload.to_string(),
        })
    }
}

/// Fully buffered audio for one transcription call.
///
/// Created by the input resolver, consumed exactly once by the dispatcher
/// and dropped on every exit path. The whole payload lives in memory; there
/// is no streaming.
#[derive(Debug)]
pub struct ResolvedAudio {
    bytes: Vec<u8>,
    filename: String,
    mime_type: String,
}

impl ResolvedAudio {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Split into `(filename, bytes, mime_type)` for upload.
    pub fn into_parts(self) -> (String, Vec<u8>, String) {
        (self.filename, self.bytes, self.mime_type)
    }
}
