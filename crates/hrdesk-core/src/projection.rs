//! Server records projected for display, and the HOD approval step.
//!
//! Leave and OD requests pass through two approvals: the department head
//! first, then the CEO. The server owns both states; this module only decides
//! how a state reads to a given viewer and whether that viewer may act on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::days::compute_leave_days;
use crate::draft::DateRange;
use crate::types::{LeaveDays, LeaveType, Role};

/// Default remarks sent with an approval when the HOD leaves them empty.
pub const DEFAULT_APPROVE_REMARKS: &str = "Approved by HOD";

/// Default remarks sent with a rejection when the HOD leaves them empty.
pub const DEFAULT_REJECT_REMARKS: &str = "Rejected by HOD";

/// State of one approval level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApprovalState {
    /// Waiting for a decision.
    #[default]
    Pending,
    /// Approved.
    Approved,
    /// Rejected.
    Rejected,
}

/// Both approval levels of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStatus {
    /// Department head decision.
    #[serde(default)]
    pub hod: ApprovalState,
    /// CEO decision.
    #[serde(default)]
    pub ceo: ApprovalState,
    /// Remarks left by the last approver.
    #[serde(default)]
    pub remarks: Option<String>,
}

impl ApprovalStatus {
    /// How this status reads to a viewer with the given role.
    #[must_use]
    pub fn display_for(&self, viewer: Role) -> DisplayStatus {
        display_status(self, viewer)
    }
}

/// What a list or detail screen shows for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayStatus {
    /// Still in the pipeline.
    Pending,
    /// The HOD approved; the CEO has not decided yet.
    ApprovedByHod,
    /// Fully approved.
    Approved,
    /// Rejected at either level.
    Rejected,
}

impl DisplayStatus {
    /// Label shown to the user.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::ApprovedByHod => "Approved by HOD",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Derive the display status of a request for a viewer.
///
/// An HOD sees an HOD-approved request as pending: the outstanding action is
/// the CEO's, and showing it as approved would read as finished.
#[must_use]
pub fn display_status(status: &ApprovalStatus, viewer: Role) -> DisplayStatus {
    if status.hod == ApprovalState::Rejected || status.ceo == ApprovalState::Rejected {
        return DisplayStatus::Rejected;
    }
    if status.ceo == ApprovalState::Approved {
        return DisplayStatus::Approved;
    }
    if status.hod == ApprovalState::Approved {
        return match viewer {
            Role::Hod => DisplayStatus::Pending,
            Role::Employee => DisplayStatus::ApprovedByHod,
        };
    }
    DisplayStatus::Pending
}

/// A decision an HOD can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalAction {
    /// Approve the request.
    Approve,
    /// Reject the request.
    Reject,
}

impl ApprovalAction {
    /// The state this action moves the HOD level to.
    #[must_use]
    pub const fn target_state(self) -> ApprovalState {
        match self {
            Self::Approve => ApprovalState::Approved,
            Self::Reject => ApprovalState::Rejected,
        }
    }

    /// Remarks used when none are given.
    #[must_use]
    pub const fn default_remarks(self) -> &'static str {
        match self {
            Self::Approve => DEFAULT_APPROVE_REMARKS,
            Self::Reject => DEFAULT_REJECT_REMARKS,
        }
    }
}

/// Body of an approve/reject call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalDecision {
    /// New HOD state.
    pub status: ApprovalState,
    /// Remarks, never empty.
    pub remarks: String,
}

impl ApprovalDecision {
    /// Build a decision, falling back to default remarks when blank.
    #[must_use]
    pub fn new(action: ApprovalAction, remarks: &str) -> Self {
        let remarks = match remarks.trim() {
            "" => action.default_remarks().to_string(),
            given => given.to_string(),
        };
        Self {
            status: action.target_state(),
            remarks,
        }
    }
}

/// Why an approval action is refused before reaching the server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    /// Only department heads can act.
    #[error("Only a department head can approve or reject requests")]
    NotPermitted,

    /// The HOD level already has a decision.
    #[error("This request has already been {state:?} by the HOD")]
    AlreadyDecided {
        /// Existing HOD state.
        state: ApprovalState,
    },

    /// The CEO already rejected the request.
    #[error("This request has already been rejected")]
    Closed,
}

/// A record that travels through the two-level approval pipeline.
pub trait ApprovalRecord {
    /// Backend identifier.
    fn record_id(&self) -> &str;

    /// Current approval status.
    fn approval(&self) -> &ApprovalStatus;

    /// Mutable approval status, for recording a decision locally.
    fn approval_mut(&mut self) -> &mut ApprovalStatus;
}

/// Check that `viewer` may take a decision on `record`.
///
/// # Errors
///
/// Returns an [`ApprovalError`] if the viewer is not an HOD or the HOD level
/// is no longer pending.
pub fn ensure_actionable<R: ApprovalRecord + ?Sized>(
    record: &R,
    viewer: Role,
) -> Result<(), ApprovalError> {
    if viewer != Role::Hod {
        return Err(ApprovalError::NotPermitted);
    }
    let status = record.approval();
    if status.hod != ApprovalState::Pending {
        return Err(ApprovalError::AlreadyDecided { state: status.hod });
    }
    if status.ceo == ApprovalState::Rejected {
        return Err(ApprovalError::Closed);
    }
    Ok(())
}

/// Employee summary embedded in a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEmployee {
    /// Employee identifier.
    #[serde(default)]
    pub employee_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// A file stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Identifier for `GET /employees/files/:fileId`.
    #[serde(alias = "_id", alias = "id")]
    pub file_id: String,
    /// Original file name.
    #[serde(default, alias = "filename")]
    pub name: String,
    /// Content type.
    #[serde(default, alias = "contentType")]
    pub mime_type: Option<String>,
}

/// A leave request as returned by `GET /leaves`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRecord {
    /// Backend identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Applicant.
    #[serde(default)]
    pub employee: RecordEmployee,
    /// Applicant's department.
    #[serde(default)]
    pub department: String,
    /// Requested dates.
    #[serde(alias = "fullDay")]
    pub dates: DateRange,
    /// Leave type.
    pub leave_type: LeaveType,
    /// Reason given.
    #[serde(default)]
    pub reason: String,
    /// Approval status.
    #[serde(default)]
    pub status: ApprovalStatus,
    /// Medical certificate, for medical leave.
    #[serde(default)]
    pub medical_certificate: Option<StoredFile>,
    /// Other attachments.
    #[serde(default)]
    pub supporting_documents: Vec<StoredFile>,
    /// When the request was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveRecord {
    /// Day count of the requested range.
    #[must_use]
    pub fn days(&self) -> LeaveDays {
        compute_leave_days(&self.dates)
    }

    /// All attachments, certificate first.
    pub fn attachments(&self) -> impl Iterator<Item = &StoredFile> {
        self.medical_certificate
            .iter()
            .chain(self.supporting_documents.iter())
    }
}

impl ApprovalRecord for LeaveRecord {
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

/// A record prepared for a list or detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView<R> {
    /// The record as fetched.
    pub record: R,
    /// Status as it reads to the viewer.
    pub display: DisplayStatus,
    /// Whether the viewer may approve or reject.
    pub can_act: bool,
}

impl<R: ApprovalRecord> RecordView<R> {
    /// Project one record for a viewer.
    pub fn new(record: R, viewer: Role) -> Self {
        let display = display_status(record.approval(), viewer);
        let can_act = ensure_actionable(&record, viewer).is_ok();
        Self {
            record,
            display,
            can_act,
        }
    }

    /// Actions the viewer may take.
    #[must_use]
    pub fn allowed_actions(&self) -> &'static [ApprovalAction] {
        if self.can_act {
            &[ApprovalAction::Approve, ApprovalAction::Reject]
        } else {
            &[]
        }
    }

    /// Apply a decision the server accepted, then re-project.
    ///
    /// The HOD level leaves `Pending` for good, so the view stops offering
    /// actions even if the next fetch fails.
    pub fn record_decision(&mut self, decision: &ApprovalDecision, viewer: Role) {
        let status = self.record.approval_mut();
        status.hod = decision.status;
        status.remarks = Some(decision.remarks.clone());
        self.display = display_status(self.record.approval(), viewer);
        self.can_act = ensure_actionable(&self.record, viewer).is_ok();
    }
}

/// Project fetched records for a viewer, preserving order.
pub fn project_records<R: ApprovalRecord>(
    records: impl IntoIterator<Item = R>,
    viewer: Role,
) -> Vec<RecordView<R>> {
    records
        .into_iter()
        .map(|record| RecordView::new(record, viewer))
        .collect()
}

/// List filter offered by the record screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    /// Everything.
    #[default]
    All,
    /// Anything not yet terminal.
    Pending,
    /// Fully approved.
    Approved,
    /// Rejected.
    Rejected,
}

impl StatusFilter {
    /// Whether a projected status passes this filter.
    #[must_use]
    pub const fn matches(self, status: DisplayStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !status.is_terminal(),
            Self::Approved => matches!(status, DisplayStatus::Approved),
            Self::Rejected => matches!(status, DisplayStatus::Rejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(hod: ApprovalState, ceo: ApprovalState) -> ApprovalStatus {
        ApprovalStatus {
            hod,
            ceo,
            remarks: None,
        }
    }

    fn record(hod: ApprovalState, ceo: ApprovalState) -> LeaveRecord {
        serde_json::from_value(serde_json::json!({
            "_id": "L1",
            "employee": { "employeeId": "E1", "name": "Asha" },
            "department": "Finance",
            "fullDay": { "from": "2024-01-08", "to": "2024-01-10", "fromDuration": "full", "toDuration": "half", "toSession": "forenoon" },
            "leaveType": "Casual",
            "reason": "Trip",
            "status": { "hod": format!("{hod:?}"), "ceo": format!("{ceo:?}") },
            "supportingDocuments": [ { "_id": "F1", "filename": "ticket.pdf" } ]
        }))
        .unwrap()
    }

    #[test]
    fn test_hod_approved_reads_differently_per_viewer() {
        let s = status(ApprovalState::Approved, ApprovalState::Pending);
        assert_eq!(display_status(&s, Role::Employee).label(), "Approved by HOD");
        assert_eq!(display_status(&s, Role::Hod).label(), "Pending");
    }

    #[test]
    fn test_rejection_wins() {
        let s = status(ApprovalState::Rejected, ApprovalState::Pending);
        assert_eq!(display_status(&s, Role::Employee), DisplayStatus::Rejected);
        let s = status(ApprovalState::Approved, ApprovalState::Rejected);
        assert_eq!(display_status(&s, Role::Hod), DisplayStatus::Rejected);
        assert!(DisplayStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_ceo_approval_is_final() {
        let s = status(ApprovalState::Approved, ApprovalState::Approved);
        assert_eq!(display_status(&s, Role::Hod), DisplayStatus::Approved);
        assert_eq!(s.display_for(Role::Employee).to_string(), "Approved");
    }

    #[test]
    fn test_fresh_request_is_pending() {
        let s = ApprovalStatus::default();
        assert_eq!(display_status(&s, Role::Employee), DisplayStatus::Pending);
        assert!(!DisplayStatus::Pending.is_terminal());
    }

    #[test]
    fn test_only_pending_hod_level_is_actionable() {
        let pending = record(ApprovalState::Pending, ApprovalState::Pending);
        assert!(ensure_actionable(&pending, Role::Hod).is_ok());
        assert_eq!(
            ensure_actionable(&pending, Role::Employee),
            Err(ApprovalError::NotPermitted)
        );

        let decided = record(ApprovalState::Approved, ApprovalState::Pending);
        assert_eq!(
            ensure_actionable(&decided, Role::Hod),
            Err(ApprovalError::AlreadyDecided {
                state: ApprovalState::Approved
            })
        );

        let closed = record(ApprovalState::Pending, ApprovalState::Rejected);
        assert_eq!(ensure_actionable(&closed, Role::Hod), Err(ApprovalError::Closed));
    }

    #[test]
    fn test_decision_defaults_remarks() {
        let d = ApprovalDecision::new(ApprovalAction::Approve, "  ");
        assert_eq!(d.status, ApprovalState::Approved);
        assert_eq!(d.remarks, DEFAULT_APPROVE_REMARKS);

        let d = ApprovalDecision::new(ApprovalAction::Reject, "Overlaps audit week");
        assert_eq!(d.status, ApprovalState::Rejected);
        assert_eq!(d.remarks, "Overlaps audit week");

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["status"], "Rejected");
    }

    #[test]
    fn test_record_projection() {
        let records = vec![
            record(ApprovalState::Pending, ApprovalState::Pending),
            record(ApprovalState::Approved, ApprovalState::Pending),
        ];
        let views = project_records(records, Role::Hod);
        assert!(views[0].can_act);
        assert_eq!(views[0].allowed_actions().len(), 2);
        assert!(!views[1].can_act);
        assert!(views[1].allowed_actions().is_empty());
        assert_eq!(views[1].display, DisplayStatus::Pending);

        let leave = &views[0].record;
        assert_eq!(leave.id, "L1");
        assert_eq!(leave.days().to_string(), "2.5");
        assert_eq!(leave.attachments().count(), 1);
        assert_eq!(leave.supporting_documents[0].name, "ticket.pdf");
    }

    #[test]
    fn test_recorded_decision_closes_the_view() {
        let mut view = RecordView::new(record(ApprovalState::Pending, ApprovalState::Pending), Role::Hod);
        assert!(view.can_act);

        let decision = ApprovalDecision::new(ApprovalAction::Reject, "");
        view.record_decision(&decision, Role::Hod);
        assert_eq!(view.record.status.hod, ApprovalState::Rejected);
        assert_eq!(view.record.status.remarks.as_deref(), Some(DEFAULT_REJECT_REMARKS));
        assert_eq!(view.display, DisplayStatus::Rejected);
        assert!(!view.can_act);
        assert!(view.allowed_actions().is_empty());
        assert!(matches!(
            ensure_actionable(&view.record, Role::Hod),
            Err(ApprovalError::AlreadyDecided { .. })
        ));
    }

    #[test]
    fn test_status_filter() {
        assert!(StatusFilter::Pending.matches(DisplayStatus::ApprovedByHod));
        assert!(!StatusFilter::Pending.matches(DisplayStatus::Rejected));
        assert!(StatusFilter::Approved.matches(DisplayStatus::Approved));
        assert!(StatusFilter::All.matches(DisplayStatus::Rejected));
    }
}
