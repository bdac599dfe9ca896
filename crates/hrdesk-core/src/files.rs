//! Picked file references and their acceptance rules.
//!
//! A [`FileRef`] is what the document picker hands back: a URI plus whatever
//! metadata the platform could provide. Nothing is read here; the client
//! crate opens the URI when the request is sent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest attachment the backend accepts, in bytes.
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// MIME type used when nothing better can be inferred.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Errors raised when an attachment is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileError {
    /// The picker returned no URI.
    #[error("Selected file has no location")]
    MissingUri,

    /// The file is empty.
    #[error("Selected file '{name}' is empty")]
    Empty {
        /// File name.
        name: String,
    },

    /// The file exceeds the upload limit.
    #[error("File '{name}' is {size} bytes; the limit is {max} bytes")]
    TooLarge {
        /// File name.
        name: String,
        /// Actual size.
        size: u64,
        /// Allowed size.
        max: u64,
    },
}

/// A file chosen by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// Location of the file, either a plain path or a `file://` URI.
    pub uri: String,

    /// Display name. May be empty when the picker could not tell.
    #[serde(default)]
    pub name: String,

    /// MIME type reported by the picker, if any.
    #[serde(default)]
    pub mime_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: u64,
}

impl FileRef {
    /// Create a file reference.
    pub fn new(uri: impl Into<String>, name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            mime_type: None,
            size_bytes,
        }
    }

    /// Set the MIME type reported by the picker.
    #[must_use]
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Check the reference against the upload rules.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] if the URI is missing, the file is empty, or it
    /// is larger than `max_bytes`.
    pub fn accept(&self, max_bytes: u64) -> Result<(), FileError> {
        if self.uri.trim().is_empty() {
            return Err(FileError::MissingUri);
        }
        if self.size_bytes == 0 {
            return Err(FileError::Empty {
                name: self.display_name().to_string(),
            });
        }
        if self.size_bytes > max_bytes {
            return Err(FileError::TooLarge {
                name: self.display_name().to_string(),
                size: self.size_bytes,
                max: max_bytes,
            });
        }
        Ok(())
    }

    /// The best available name: the given name, else the last URI segment.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return &self.name;
        }
        self.uri
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or("")
    }

    /// The MIME type to upload with: the reported one, else inferred from the name.
    #[must_use]
    pub fn effective_mime_type(&self) -> String {
        match self.mime_type.as_deref() {
            Some(mime) if !mime.trim().is_empty() => mime.to_string(),
            _ => infer_mime_type(self.display_name()).to_string(),
        }
    }
}

/// Infer a MIME type from a file name's extension.
#[must_use]
pub fn infer_mime_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => FALLBACK_MIME_TYPE,
    }
}

/// The usual extension for a MIME type, used when naming unnamed uploads.
#[must_use]
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "application/pdf" => "pdf",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/heic" => "heic",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "text/plain" => "txt",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_within_limit() {
        let file = FileRef::new("/tmp/cert.pdf", "cert.pdf", 1024);
        assert!(file.accept(MAX_FILE_BYTES).is_ok());
    }

    #[test]
    fn test_accept_exactly_at_limit() {
        let file = FileRef::new("/tmp/scan.png", "scan.png", MAX_FILE_BYTES);
        assert!(file.accept(MAX_FILE_BYTES).is_ok());
    }

    #[test]
    fn test_reject_oversize() {
        let file = FileRef::new("/tmp/big.pdf", "big.pdf", MAX_FILE_BYTES + 1);
        let err = file.accept(MAX_FILE_BYTES).unwrap_err();
        assert!(matches!(err, FileError::TooLarge { .. }));
        assert!(err.to_string().contains("big.pdf"));
    }

    #[test]
    fn test_reject_empty_and_missing() {
        assert_eq!(
            FileRef::new("", "x.pdf", 10).accept(MAX_FILE_BYTES),
            Err(FileError::MissingUri)
        );
        assert!(matches!(
            FileRef::new("/tmp/x.pdf", "x.pdf", 0).accept(MAX_FILE_BYTES),
            Err(FileError::Empty { .. })
        ));
    }

    #[test]
    fn test_display_name_falls_back_to_uri() {
        let file = FileRef::new("file:///storage/docs/report.PDF", "", 10);
        assert_eq!(file.display_name(), "report.PDF");
        assert_eq!(file.effective_mime_type(), "application/pdf");
    }

    #[test]
    fn test_reported_mime_wins() {
        let file = FileRef::new("/tmp/a", "a", 10).with_mime_type("image/png");
        assert_eq!(file.effective_mime_type(), "image/png");
        assert_eq!(infer_mime_type("photo.JPEG"), "image/jpeg");
        assert_eq!(infer_mime_type("noext"), FALLBACK_MIME_TYPE);
        assert_eq!(extension_for_mime("image/png"), "png");
    }
}
