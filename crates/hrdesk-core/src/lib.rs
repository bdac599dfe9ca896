//! # hrdesk-core
//!
//! Domain rules for the hrdesk HR self-service client.
//!
//! This crate provides:
//! - Leave draft state with a day count that follows every date change
//! - The leave-day calculator and the working-day calendar in IST
//! - The staged leave rule validator
//! - Packaging of drafts into the backend's multipart layout
//! - Approval-status projection for list and detail screens
//! - On-duty (OD) drafts, push-event routing and client configuration
//!
//! ## Architecture
//!
//! - [`types`] - Shared enums and small value types
//! - [`days`] - Day counting and calendar helpers
//! - [`draft`] - In-progress leave application
//! - [`files`] - Picked file references and upload limits
//! - [`validation`] - Leave rules
//! - [`submission`] - Wire packaging
//! - [`projection`] - Record display status and HOD approvals
//! - [`od`] - On-duty requests
//! - [`events`] - Push events
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Unified error type

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod config;
pub mod days;
pub mod draft;
pub mod error;
pub mod events;
pub mod files;
pub mod od;
pub mod projection;
pub mod submission;
pub mod types;
pub mod validation;

// Re-export primary types for convenience
pub use config::{Config, ConfigError, ConfigResult};
pub use days::{compute_leave_days, policy_today, today_in, POLICY_TIMEZONE};
pub use draft::{DateRange, LeaveDraft};
pub use error::{HrdeskError, Result};
pub use events::{PushEvent, RefreshTarget};
pub use files::{FileError, FileRef, MAX_FILE_BYTES};
pub use od::{validate_od, OdDraft, OdRecord, OdSubmission};
pub use projection::{
    display_status, ensure_actionable, project_records, ApprovalAction, ApprovalDecision,
    ApprovalError, ApprovalRecord, ApprovalState, ApprovalStatus, DisplayStatus, LeaveRecord,
    RecordView, StatusFilter, StoredFile,
};
pub use submission::{build_submission, SubmissionError, WireFile, WireRequest};
pub use types::{
    CompensatoryEntry, CompensatoryStatus, DayDuration, EmployeeProfile, EmploymentStatus,
    Gender, LeaveDays, LeaveType, Role, Session, UnknownLeaveType,
};
pub use validation::{validate, RuleContext, ValidationError, ValidationStage};
