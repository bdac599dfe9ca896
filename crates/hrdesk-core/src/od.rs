//! On-duty (OD) requests: time spent working away from the office.
//!
//! OD requests are plain JSON rather than multipart and carry no leave-type
//! policy, but they share the two-level approval pipeline with leave.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::projection::{ApprovalRecord, ApprovalStatus, RecordEmployee};
use crate::validation::{ValidationError, ValidationResult, ValidationStage};

/// An OD request being filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OdDraft {
    /// First day away.
    pub from: Option<NaiveDate>,
    /// Last day away, absent for a single day.
    pub to: Option<NaiveDate>,
    /// Time the duty starts.
    pub from_time: Option<NaiveTime>,
    /// Time the duty ends.
    pub to_time: Option<NaiveTime>,
    /// What the duty is for.
    pub purpose: String,
    /// Where the duty takes place.
    pub place_of_visit: String,
}

/// JSON body for `POST /od`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdSubmission {
    /// First day.
    pub date_from: NaiveDate,
    /// Last day.
    pub date_to: NaiveDate,
    /// Start time, `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_from: Option<String>,
    /// End time, `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to: Option<String>,
    /// Purpose of the duty.
    pub purpose: String,
    /// Place of visit.
    pub place_of_visit: String,
}

fn od_error(stage: ValidationStage, code: &'static str, message: &str) -> ValidationError {
    ValidationError {
        stage,
        code,
        message: message.to_string(),
    }
}

/// Validate an OD draft against `today` in the policy timezone.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found: required fields first, then
/// date and time consistency.
pub fn validate_od(draft: &OdDraft, today: NaiveDate) -> ValidationResult {
    if draft.purpose.trim().is_empty() {
        return Err(od_error(
            ValidationStage::BasicFields,
            "purpose_required",
            "Please enter the purpose of the on-duty request",
        ));
    }
    if draft.place_of_visit.trim().is_empty() {
        return Err(od_error(
            ValidationStage::BasicFields,
            "place_required",
            "Please enter the place of visit",
        ));
    }

    let Some(from) = draft.from else {
        return Err(od_error(
            ValidationStage::DateConsistency,
            "from_date_required",
            "Please select the from date",
        ));
    };
    let to = draft.to.unwrap_or(from);
    if to < from {
        return Err(od_error(
            ValidationStage::DateConsistency,
            "to_before_from",
            "To date cannot be earlier than from date",
        ));
    }
    if let (Some(start), Some(end)) = (draft.from_time, draft.to_time) {
        if to == from && end <= start {
            return Err(od_error(
                ValidationStage::DateConsistency,
                "to_time_before_from_time",
                "End time must be after start time",
            ));
        }
    }
    if from < today {
        return Err(od_error(
            ValidationStage::Eligibility,
            "date_in_past",
            "On-duty requests cannot be raised for a past date",
        ));
    }
    Ok(())
}

impl OdDraft {
    /// Build the request body.
    ///
    /// Returns `None` when there is no start date; run [`validate_od`] first.
    #[must_use]
    pub fn to_submission(&self) -> Option<OdSubmission> {
        let from = self.from?;
        Some(OdSubmission {
            date_from: from,
            date_to: self.to.unwrap_or(from),
            time_from: self.from_time.map(|t| t.format("%H:%M").to_string()),
            time_to: self.to_time.map(|t| t.format("%H:%M").to_string()),
            purpose: self.purpose.trim().to_string(),
            place_of_visit: self.place_of_visit.trim().to_string(),
        })
    }
}

/// An OD request as returned by `GET /od`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdRecord {
    /// Backend identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Applicant.
    #[serde(default)]
    pub employee: RecordEmployee,
    /// Applicant's department.
    #[serde(default)]
    pub department: String,
    /// First day.
    pub date_from: NaiveDate,
    /// Last day.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Start time as sent by the server.
    #[serde(default)]
    pub time_from: Option<String>,
    /// End time as sent by the server.
    #[serde(default)]
    pub time_to: Option<String>,
    /// Purpose.
    #[serde(default)]
    pub purpose: String,
    /// Place of visit.
    #[serde(default)]
    pub place_of_visit: String,
    /// Approval status.
    #[serde(default)]
    pub status: ApprovalStatus,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ApprovalRecord for OdRecord {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn approval(&self) -> &ApprovalStatus {
        &self.status
    }

    fn approval_mut(&mut self) -> &mut ApprovalStatus {
        &mut self.status
    }
}
