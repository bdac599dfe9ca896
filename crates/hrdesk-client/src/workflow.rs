//! Leave and OD screens as a state machine over the backend.
//!
//! [`LeaveBoard`] holds what a screen shows: the signed-in profile, projected
//! leave and OD records, notifications, a loading flag and the last error.
//! Every mutation goes validate, send, then refresh. A failed fetch keeps the
//! data already on screen.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use hrdesk_core::{
    build_submission, ensure_actionable, project_records, today_in, validate, validate_od,
    ApprovalAction, ApprovalDecision, ApprovalRecord, LeaveDraft, LeaveRecord, LeaveType, OdDraft,
    OdRecord, PushEvent, RecordView, RefreshTarget, Role, RuleContext, StatusFilter,
    SubmissionError, POLICY_TIMEZONE,
};
use tracing::{info, instrument, warn};

use crate::api::HrClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{EmployeeInfo, Notification};

/// Which records the board shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardScope {
    /// The signed-in employee's own requests.
    #[default]
    Own,
    /// The department's requests, for an HOD.
    Department,
}

/// Screen state for leave and OD requests.
#[derive(Debug)]
pub struct LeaveBoard {
    client: HrClient,
    scope: BoardScope,
    timezone: Tz,
    profile: Option<EmployeeInfo>,
    leaves: Vec<RecordView<LeaveRecord>>,
    od: Vec<RecordView<OdRecord>>,
    notifications: Vec<Notification>,
    loading: bool,
    last_error: Option<String>,
}

impl LeaveBoard {
    /// Create an empty board. Call [`LeaveBoard::refresh`] to load it.
    #[must_use]
    pub fn new(client: HrClient, scope: BoardScope) -> Self {
        Self {
            client,
            scope,
            timezone: POLICY_TIMEZONE,
            profile: None,
            leaves: Vec::new(),
            od: Vec::new(),
            notifications: Vec::new(),
            loading: false,
            last_error: None,
        }
    }

    /// Count leave dates in a different timezone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// The role records are projected for.
    ///
    /// Department scope only grants the HOD view to an employee whose profile
    /// says they are one.
    #[must_use]
    pub fn viewer(&self) -> Role {
        match (&self.profile, self.scope) {
            (Some(info), BoardScope::Department) if info.profile.role == Role::Hod => Role::Hod,
            _ => Role::Employee,
        }
    }

    /// The signed-in employee, once loaded.
    #[must_use]
    pub const fn profile(&self) -> Option<&EmployeeInfo> {
        self.profile.as_ref()
    }

    /// Projected leave records.
    #[must_use]
    pub fn leaves(&self) -> &[RecordView<LeaveRecord>] {
        &self.leaves
    }

    /// Projected leave records passing a filter.
    pub fn leaves_matching(
        &self,
        filter: StatusFilter,
    ) -> impl Iterator<Item = &RecordView<LeaveRecord>> {
        self.leaves.iter().filter(move |v| filter.matches(v.display))
    }

    /// Projected OD records.
    #[must_use]
    pub fn od(&self) -> &[RecordView<OdRecord>] {
        &self.od
    }

    /// Notifications.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The last error, formatted for display.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &HrClient {
        &self.client
    }

    fn record_error(&mut self, err: &ClientError) {
        warn!(error = %err, code = err.error_code(), "Request failed");
        self.last_error = Some(err.user_message());
    }

    /// Fetch the profile and leave records in parallel.
    ///
    /// A failed call keeps what was loaded before and records the error.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) {
        self.loading = true;
        self.last_error = None;

        let (info, leaves) = tokio::join!(self.client.employee_info(), self.client.list_leaves());
        match info {
            Ok(info) => self.profile = Some(info),
            Err(e) => self.record_error(&e),
        }
        // Projected after the profile so the viewer role is current.
        match leaves {
            Ok(records) => self.leaves = project_records(records, self.viewer()),
            Err(e) => self.record_error(&e),
        }

        self.loading = false;
    }

    /// Fetch OD records.
    pub async fn refresh_od(&mut self) {
        match self.client.list_od().await {
            Ok(records) => self.od = project_records(records, self.viewer()),
            Err(e) => self.record_error(&e),
        }
    }

    /// Fetch notifications.
    pub async fn refresh_notifications(&mut self) {
        match self.client.notifications().await {
            Ok(items) => self.notifications = items,
            Err(e) => self.record_error(&e),
        }
    }

    /// Re-fetch whatever a push event invalidates.
    pub async fn apply_event(&mut self, event: &PushEvent) {
        let targets = event.refresh_targets();
        if targets
            .iter()
            .any(|t| matches!(t, RefreshTarget::Dashboard | RefreshTarget::Leaves))
        {
            self.refresh().await;
        }
        if targets.contains(&RefreshTarget::OnDuty) {
            self.refresh_od().await;
        }
        if targets.contains(&RefreshTarget::Notifications) {
            self.refresh_notifications().await;
        }
    }

    /// Whether emergency leave is open to the signed-in employee.
    ///
    /// Emergency drafts ask `GET /employees/:id/emergency-leave-permission`
    /// and remember the answer on the profile. Other drafts use the flag
    /// already loaded.
    async fn emergency_permission(&mut self, draft: &LeaveDraft) -> ClientResult<bool> {
        let info = self.profile.as_ref().ok_or(ClientError::ProfileNotLoaded)?;
        if draft.leave_type != Some(LeaveType::Emergency) {
            return Ok(info.emergency_leave_allowed);
        }

        let employee_id = info.profile.employee_id.clone();
        match self.client.emergency_leave_permission(&employee_id).await {
            Ok(allowed) => {
                if let Some(info) = self.profile.as_mut() {
                    info.emergency_leave_allowed = allowed;
                }
                Ok(allowed)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Validate, package and send a leave draft, then refresh.
    ///
    /// On success the draft is reset. On a validation error nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the profile is not loaded, a rule fails,
    /// or the request fails.
    #[instrument(skip_all, fields(leave_type = ?draft.leave_type))]
    pub async fn submit_leave(
        &mut self,
        draft: &mut LeaveDraft,
        now: DateTime<Utc>,
    ) -> ClientResult<()> {
        let emergency_leave_allowed = self.emergency_permission(draft).await?;
        let info = self.profile.as_ref().ok_or(ClientError::ProfileNotLoaded)?;
        let ctx = RuleContext {
            user: &info.profile,
            days: draft.days(),
            compensatory_entries: &info.compensatory_entries,
            emergency_leave_allowed,
            today: today_in(now, self.timezone),
        };
        validate(draft, &ctx)?;
        let request = build_submission(draft)?;

        if let Err(e) = self.client.submit_leave(&request).await {
            self.record_error(&e);
            return Err(e);
        }
        info!(days = %draft.days(), "Leave submitted");
        draft.reset();
        self.refresh().await;
        Ok(())
    }

    /// Validate and send an OD draft, then refresh OD records.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if a rule fails or the request fails.
    pub async fn submit_od(&mut self, draft: &OdDraft, now: DateTime<Utc>) -> ClientResult<()> {
        validate_od(draft, today_in(now, self.timezone))?;
        let body = draft
            .to_submission()
            .ok_or(SubmissionError::MissingFromDate)?;

        if let Err(e) = self.client.submit_od(&body).await {
            self.record_error(&e);
            return Err(e);
        }
        self.refresh_od().await;
        Ok(())
    }

    /// Approve or reject a leave record as HOD, then refresh.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the record is unknown, not actionable by
    /// this viewer, or the request fails.
    #[instrument(skip(self, remarks))]
    pub async fn decide_leave(
        &mut self,
        leave_id: &str,
        action: ApprovalAction,
        remarks: &str,
    ) -> ClientResult<()> {
        let decision = self.checked_decision(&self.leaves, leave_id, action, remarks)?;
        if let Err(e) = self.client.decide_leave(leave_id, &decision).await {
            self.record_error(&e);
            return Err(e);
        }
        let viewer = self.viewer();
        record_locally(&mut self.leaves, leave_id, &decision, viewer);
        self.refresh().await;
        Ok(())
    }

    /// Approve or reject an OD record as HOD, then refresh OD records.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the record is unknown, not actionable by
    /// this viewer, or the request fails.
    #[instrument(skip(self, remarks))]
    pub async fn decide_od(
        &mut self,
        od_id: &str,
        action: ApprovalAction,
        remarks: &str,
    ) -> ClientResult<()> {
        let decision = self.checked_decision(&self.od, od_id, action, remarks)?;
        if let Err(e) = self.client.decide_od(od_id, &decision).await {
            self.record_error(&e);
            return Err(e);
        }
        let viewer = self.viewer();
        record_locally(&mut self.od, od_id, &decision, viewer);
        self.refresh_od().await;
        Ok(())
    }

    fn checked_decision<R: ApprovalRecord>(
        &self,
        views: &[RecordView<R>],
        id: &str,
        action: ApprovalAction,
        remarks: &str,
    ) -> ClientResult<ApprovalDecision> {
        let view = views
            .iter()
            .find(|v| v.record.record_id() == id)
            .ok_or_else(|| ClientError::UnknownRecord(id.to_string()))?;
        ensure_actionable(&view.record, self.viewer())?;
        Ok(ApprovalDecision::new(action, remarks))
    }
}

/// Apply an accepted decision to the matching view.
fn record_locally<R: ApprovalRecord>(
    views: &mut [RecordView<R>],
    id: &str,
    decision: &ApprovalDecision,
    viewer: Role,
) {
    if let Some(view) = views.iter_mut().find(|v| v.record.record_id() == id) {
        view.record_decision(decision, viewer);
    }
}
