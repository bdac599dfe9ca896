//! Unified error type for the hrdesk core library.
//!
//! Each module keeps its own error type ([`ValidationError`], [`FileError`],
//! [`SubmissionError`], [`ApprovalError`], [`ConfigError`]); [`HrdeskError`]
//! wraps them for callers that handle all failures in one place.
//!
//! # Example
//!
//! ```rust
//! use hrdesk_core::error::{HrdeskError, Result};
//! use hrdesk_core::{FileRef, MAX_FILE_BYTES};
//!
//! fn pick(file: &FileRef) -> Result<()> {
//!     file.accept(MAX_FILE_BYTES)?;
//!     Ok(())
//! }
//!
//! let err = pick(&FileRef::new("", "scan.pdf", 10)).unwrap_err();
//! assert!(err.is_file_error());
//! ```

use thiserror::Error;

use crate::config::ConfigError;
use crate::files::FileError;
use crate::projection::ApprovalError;
use crate::submission::SubmissionError;
use crate::validation::ValidationError;

/// The unified error type for hrdesk core operations.
#[derive(Debug, Error)]
pub enum HrdeskError {
    /// A draft broke a leave rule. Never sent to the server.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An attachment was rejected.
    #[error(transparent)]
    File(#[from] FileError),

    /// A draft could not be packaged for sending.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// An approval action was refused locally.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A specialized [`Result`] type for hrdesk core operations.
pub type Result<T> = std::result::Result<T, HrdeskError>;

impl HrdeskError {
    /// Returns `true` for rule violations in a draft.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` for rejected attachments.
    #[inline]
    #[must_use]
    pub const fn is_file_error(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Returns `true` for configuration problems.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if the user can fix the problem by editing the form.
    #[inline]
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::File(_) | Self::Submission(_)
        )
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code,
            Self::File(FileError::MissingUri) => "FILE_MISSING_URI",
            Self::File(FileError::Empty { .. }) => "FILE_EMPTY",
            Self::File(FileError::TooLarge { .. }) => "FILE_TOO_LARGE",
            Self::Submission(_) => "SUBMISSION_INVALID",
            Self::Approval(ApprovalError::NotPermitted) => "APPROVAL_NOT_PERMITTED",
            Self::Approval(_) => "APPROVAL_ALREADY_DECIDED",
            Self::Config(_) => "CONFIG_INVALID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ApprovalState;

    #[test]
    fn test_file_error_classification() {
        let err: HrdeskError = FileError::MissingUri.into();
        assert!(err.is_file_error());
        assert!(err.is_user_correctable());
        assert_eq!(err.error_code(), "FILE_MISSING_URI");
    }

    #[test]
    fn test_approval_error_codes() {
        let err: HrdeskError = ApprovalError::NotPermitted.into();
        assert_eq!(err.error_code(), "APPROVAL_NOT_PERMITTED");
        assert!(!err.is_user_correctable());

        let err: HrdeskError = ApprovalError::AlreadyDecided {
            state: ApprovalState::Rejected,
        }
        .into();
        assert_eq!(err.error_code(), "APPROVAL_ALREADY_DECIDED");
        assert!(err.to_string().contains("Rejected"));
    }

    #[test]
    fn test_config_error_classification() {
        let err: HrdeskError = ConfigError::NoPlatformDir("cache").into();
        assert!(err.is_config_error());
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<HrdeskError>();
        assert_sync::<HrdeskError>();
    }
}
