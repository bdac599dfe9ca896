//! Packaging a leave draft for `POST /leaves`.
//!
//! The backend takes a multipart form. Text parts carry the scalar fields and
//! a JSON-encoded `fullDay` object; file parts carry the attachments. The
//! client crate turns a [`WireRequest`] into an actual multipart body, so the
//! field names below are the only place the backend's naming lives.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::draft::LeaveDraft;
use crate::files::{extension_for_mime, FileRef};
use crate::types::{DayDuration, LeaveType, Session};

/// Multipart field names used by the leave endpoint.
pub mod fields {
    /// Leave type.
    pub const LEAVE_TYPE: &str = "leaveType";
    /// Reason text.
    pub const REASON: &str = "reason";
    /// Employee taking over charge. The backend spells it this way.
    pub const CHARGE_TO: &str = "chargeGivenTo";
    /// Emergency contact number.
    pub const EMERGENCY_CONTACT: &str = "emergencyContact";
    /// JSON object describing the date range.
    pub const FULL_DAY: &str = "fullDay";
    /// Compensatory entry being redeemed.
    pub const COMPENSATORY_ENTRY_ID: &str = "compensatoryEntryId";
    /// Project the compensatory hours were earned on.
    pub const PROJECT_DETAILS: &str = "projectDetails";
    /// Restricted holiday name.
    pub const RESTRICTED_HOLIDAY: &str = "restrictedHoliday";
    /// Medical certificate file.
    pub const MEDICAL_CERTIFICATE: &str = "medicalCertificate";
    /// Supporting document files.
    pub const SUPPORTING_DOCUMENTS: &str = "supportingDocuments";
}

/// Errors raised while packaging a draft.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The draft has no leave type.
    #[error("Leave type is missing")]
    MissingLeaveType,

    /// The draft has no start date.
    #[error("From date is missing")]
    MissingFromDate,

    /// An attachment has no URI to read from.
    #[error("Attachment for '{field}' has no file location")]
    MissingFileUri {
        /// Multipart field the attachment belongs to.
        field: &'static str,
    },

    /// The date range could not be encoded.
    #[error("Failed to encode leave dates: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A text part of the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireField {
    /// Part name.
    pub name: &'static str,
    /// Part value.
    pub value: String,
}

/// A file part of the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFile {
    /// Part name.
    pub field: &'static str,
    /// Where to read the bytes from.
    pub uri: String,
    /// File name sent to the server.
    pub file_name: String,
    /// Content type of the part.
    pub mime_type: String,
}

/// A leave submission ready to be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireRequest {
    /// Text parts in send order.
    pub fields: Vec<WireField>,
    /// File parts in send order.
    pub files: Vec<WireFile>,
}

impl WireRequest {
    /// Look up a text part by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    fn push_field(&mut self, name: &'static str, value: impl Into<String>) {
        self.fields.push(WireField {
            name,
            value: value.into(),
        });
    }

    fn push_file(&mut self, field: &'static str, file: &FileRef) -> Result<(), SubmissionError> {
        if file.uri.trim().is_empty() {
            return Err(SubmissionError::MissingFileUri { field });
        }
        let mime_type = file.effective_mime_type();
        let file_name = match file.display_name() {
            "" => format!(
                "{field}_{}.{}",
                self.files.len() + 1,
                extension_for_mime(&mime_type)
            ),
            name => name.to_string(),
        };
        self.files.push(WireFile {
            field,
            uri: file.uri.clone(),
            file_name,
            mime_type,
        });
        Ok(())
    }
}

/// The `fullDay` object sent alongside a leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullDayPayload {
    /// First day.
    pub from: NaiveDate,
    /// Last day, equal to `from` for a single-day leave.
    pub to: NaiveDate,
    /// Duration of the first day.
    pub from_duration: DayDuration,
    /// Session of the first day; omitted for a full day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_session: Option<Session>,
    /// Duration of the last day.
    pub to_duration: DayDuration,
    /// Session of the last day; omitted for a full day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_session: Option<Session>,
}

impl FullDayPayload {
    fn from_draft(draft: &LeaveDraft) -> Result<Self, SubmissionError> {
        let range = draft.date_range();
        let from = range.from.ok_or(SubmissionError::MissingFromDate)?;
        let to = range.to.filter(|to| *to >= from).unwrap_or(from);

        let from_duration = range.from_duration.unwrap_or_default();
        let to_duration = if to > from {
            range.to_duration.unwrap_or_default()
        } else {
            from_duration
        };

        Ok(Self {
            from,
            to,
            from_duration,
            from_session: range.from_session.filter(|_| from_duration.is_half()),
            to_duration,
            to_session: if to > from {
                range.to_session.filter(|_| to_duration.is_half())
            } else {
                range.from_session.filter(|_| from_duration.is_half())
            },
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Package a draft into the multipart layout the backend expects.
///
/// # Errors
///
/// Returns a [`SubmissionError`] if the leave type or start date is missing,
/// or an attachment has no URI.
pub fn build_submission(draft: &LeaveDraft) -> Result<WireRequest, SubmissionError> {
    let leave_type = draft.leave_type.ok_or(SubmissionError::MissingLeaveType)?;
    let full_day = FullDayPayload::from_draft(draft)?;

    let mut request = WireRequest::default();
    request.push_field(fields::LEAVE_TYPE, leave_type.as_str());
    request.push_field(fields::REASON, draft.reason.trim());
    request.push_field(fields::CHARGE_TO, draft.charge_to_employee_id.trim());
    request.push_field(fields::EMERGENCY_CONTACT, draft.emergency_contact.trim());
    request.push_field(fields::FULL_DAY, serde_json::to_string(&full_day)?);

    match leave_type {
        LeaveType::Compensatory => {
            if let Some(id) = non_blank(draft.compensatory_entry_id.as_deref()) {
                request.push_field(fields::COMPENSATORY_ENTRY_ID, id);
            }
            if let Some(project) = non_blank(draft.project_details.as_deref()) {
                request.push_field(fields::PROJECT_DETAILS, project);
            }
        }
        LeaveType::RestrictedHoliday => {
            if let Some(holiday) = non_blank(draft.restricted_holiday.as_deref()) {
                request.push_field(fields::RESTRICTED_HOLIDAY, holiday);
            }
        }
        LeaveType::Medical => {
            if let Some(certificate) = draft.medical_certificate() {
                request.push_file(fields::MEDICAL_CERTIFICATE, certificate)?;
            }
        }
        _ => {}
    }

    for document in draft.supporting_documents() {
        request.push_file(fields::SUPPORTING_DOCUMENTS, document)?;
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DateRange;
    use crate::files::MAX_FILE_BYTES;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base(leave_type: LeaveType) -> LeaveDraft {
        let mut draft = LeaveDraft::new();
        draft.set_leave_type(leave_type);
        draft.reason = " Wedding ".into();
        draft.charge_to_employee_id = "E200".into();
        draft.emergency_contact = "9876543210".into();
        draft.set_date_range(DateRange::full_days(date(2024, 1, 8), date(2024, 1, 9)));
        draft
    }

    fn full_day_json(request: &WireRequest) -> serde_json::Value {
        serde_json::from_str(request.field(fields::FULL_DAY).unwrap()).unwrap()
    }

    #[test]
    fn test_scalar_fields_use_backend_names() {
        let request = build_submission(&base(LeaveType::Casual)).unwrap();
        assert_eq!(request.field("leaveType"), Some("Casual"));
        assert_eq!(request.field("reason"), Some("Wedding"));
        assert_eq!(request.field("chargeGivenTo"), Some("E200"));
        assert_eq!(request.field("chargeTo"), None);
        assert_eq!(request.field("emergencyContact"), Some("9876543210"));
        assert!(request.files.is_empty());
    }

    #[test]
    fn test_full_day_omits_sessions_for_full_days() {
        let request = build_submission(&base(LeaveType::Casual)).unwrap();
        let json = full_day_json(&request);
        assert_eq!(json["from"], "2024-01-08");
        assert_eq!(json["to"], "2024-01-09");
        assert_eq!(json["fromDuration"], "full");
        assert!(json.get("fromSession").is_none());
        assert!(json.get("toSession").is_none());
    }

    #[test]
    fn test_full_day_keeps_half_day_sessions() {
        let mut draft = base(LeaveType::Casual);
        draft.set_from_duration(DayDuration::Half);
        draft.set_from_session(Session::Afternoon);
        draft.set_to_duration(DayDuration::Half);
        draft.set_to_session(Session::Forenoon);
        let json = full_day_json(&build_submission(&draft).unwrap());
        assert_eq!(json["fromSession"], "afternoon");
        assert_eq!(json["toDuration"], "half");
        assert_eq!(json["toSession"], "forenoon");
    }

    #[test]
    fn test_single_day_mirrors_from() {
        let mut draft = base(LeaveType::Casual);
        draft.set_date_range(DateRange::single(
            date(2024, 1, 8),
            DayDuration::Half,
            Some(Session::Forenoon),
        ));
        let json = full_day_json(&build_submission(&draft).unwrap());
        assert_eq!(json["to"], "2024-01-08");
        assert_eq!(json["toDuration"], "half");
        assert_eq!(json["toSession"], "forenoon");
    }

    #[test]
    fn test_conditional_fields_follow_leave_type() {
        let mut draft = base(LeaveType::Compensatory);
        draft.compensatory_entry_id = Some("c42".into());
        draft.project_details = Some("Release cutover".into());
        let request = build_submission(&draft).unwrap();
        assert_eq!(request.field("compensatoryEntryId"), Some("c42"));
        assert_eq!(request.field("projectDetails"), Some("Release cutover"));
        assert_eq!(request.field("restrictedHoliday"), None);

        let mut draft = base(LeaveType::Casual);
        draft.restricted_holiday = Some("Onam".into());
        let request = build_submission(&draft).unwrap();
        assert_eq!(request.field("restrictedHoliday"), None);

        let mut draft = base(LeaveType::RestrictedHoliday);
        draft.restricted_holiday = Some("Onam".into());
        assert_eq!(
            build_submission(&draft).unwrap().field("restrictedHoliday"),
            Some("Onam")
        );
    }

    #[test]
    fn test_attachments_get_mime_and_fallback_name() {
        let mut draft = base(LeaveType::Medical);
        draft
            .attach_medical_certificate(FileRef::new("/tmp/cert.jpg", "cert.jpg", 10), MAX_FILE_BYTES)
            .unwrap();
        draft
            .add_supporting_document(
                FileRef::new("content://picker/", "", 10).with_mime_type("application/pdf"),
                MAX_FILE_BYTES,
            )
            .unwrap();

        let request = build_submission(&draft).unwrap();
        assert_eq!(request.files.len(), 2);
        assert_eq!(request.files[0].field, "medicalCertificate");
        assert_eq!(request.files[0].mime_type, "image/jpeg");
        assert_eq!(request.files[0].file_name, "cert.jpg");
        assert_eq!(request.files[1].field, "supportingDocuments");
        assert_eq!(request.files[1].file_name, "picker");
        assert_eq!(request.files[1].mime_type, "application/pdf");
    }

    #[test]
    fn test_unnamed_attachment_gets_generated_name() {
        let mut request = WireRequest::default();
        let file = FileRef::new("/", "", 10).with_mime_type("image/png");
        request
            .push_file(fields::SUPPORTING_DOCUMENTS, &file)
            .unwrap();
        assert_eq!(request.files[0].file_name, "supportingDocuments_1.png");
    }

    #[test]
    fn test_missing_uri_is_an_error() {
        let mut request = WireRequest::default();
        let file = FileRef::new(" ", "x.pdf", 10);
        let err = request
            .push_file(fields::MEDICAL_CERTIFICATE, &file)
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::MissingFileUri {
                field: "medicalCertificate"
            }
        ));
    }

    #[test]
    fn test_missing_type_or_date() {
        assert!(matches!(
            build_submission(&LeaveDraft::new()),
            Err(SubmissionError::MissingLeaveType)
        ));
        let mut draft = LeaveDraft::new();
        draft.set_leave_type(LeaveType::Casual);
        assert!(matches!(
            build_submission(&draft),
            Err(SubmissionError::MissingFromDate)
        ));
    }
}
