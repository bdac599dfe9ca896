//! In-progress leave application state.
//!
//! The draft is owned by a single screen and mutated through setters. Every
//! setter that touches the date range recomputes the day count, so
//! [`LeaveDraft::days`] is always current.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::days::compute_leave_days;
use crate::files::{FileError, FileRef};
use crate::types::{DayDuration, LeaveDays, LeaveType, Session};

/// The dates and boundary durations of a leave application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// First day of leave.
    pub from: Option<NaiveDate>,

    /// Last day of leave. Absent for a single-day leave.
    pub to: Option<NaiveDate>,

    /// Duration of the first day.
    pub from_duration: Option<DayDuration>,

    /// Session of the first day when it is a half day.
    pub from_session: Option<Session>,

    /// Duration of the last day.
    pub to_duration: Option<DayDuration>,

    /// Session of the last day when it is a half day.
    pub to_session: Option<Session>,
}

impl DateRange {
    /// A single full or half day.
    #[must_use]
    pub const fn single(date: NaiveDate, duration: DayDuration, session: Option<Session>) -> Self {
        Self {
            from: Some(date),
            to: None,
            from_duration: Some(duration),
            from_session: session,
            to_duration: None,
            to_session: None,
        }
    }

    /// A span of full days.
    #[must_use]
    pub const fn full_days(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            from_duration: Some(DayDuration::Full),
            from_session: None,
            to_duration: Some(DayDuration::Full),
            to_session: None,
        }
    }

    /// Whether the range ends on a later day than it starts.
    #[must_use]
    pub fn is_multi_day(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if to > from)
    }

    /// The last day of leave, which is `from` for a single-day leave.
    #[must_use]
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.to.or(self.from)
    }

    /// Whether any counted boundary of the range is a half day.
    #[must_use]
    pub fn has_half_day(&self) -> bool {
        let from_half = self.from_duration.is_some_and(DayDuration::is_half);
        let to_half = self.is_multi_day() && self.to_duration.is_some_and(DayDuration::is_half);
        from_half || to_half
    }
}

/// A leave application being filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveDraft {
    /// Selected leave type.
    pub leave_type: Option<LeaveType>,

    date_range: DateRange,

    /// Why the leave is needed.
    pub reason: String,

    /// Employee who covers the applicant's duties.
    pub charge_to_employee_id: String,

    /// Phone number reachable during the leave.
    pub emergency_contact: String,

    /// Compensatory entry redeemed by this leave.
    pub compensatory_entry_id: Option<String>,

    /// Restricted holiday being taken.
    pub restricted_holiday: Option<String>,

    /// Project the compensatory hours were earned on.
    pub project_details: Option<String>,

    medical_certificate: Option<FileRef>,

    supporting_documents: Vec<FileRef>,

    days: LeaveDays,
}

impl LeaveDraft {
    /// An empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current day count for the selected range.
    #[must_use]
    pub const fn days(&self) -> LeaveDays {
        self.days
    }

    /// The selected dates.
    #[must_use]
    pub const fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    /// Attached medical certificate.
    #[must_use]
    pub const fn medical_certificate(&self) -> Option<&FileRef> {
        self.medical_certificate.as_ref()
    }

    /// Attached supporting documents.
    #[must_use]
    pub fn supporting_documents(&self) -> &[FileRef] {
        &self.supporting_documents
    }

    /// Select a leave type, dropping fields that only belong to other types.
    pub fn set_leave_type(&mut self, leave_type: LeaveType) {
        if self.leave_type == Some(leave_type) {
            return;
        }
        self.leave_type = Some(leave_type);

        if leave_type != LeaveType::Compensatory {
            self.compensatory_entry_id = None;
            self.project_details = None;
        }
        if leave_type != LeaveType::RestrictedHoliday {
            self.restricted_holiday = None;
        }
        if leave_type != LeaveType::Medical {
            self.medical_certificate = None;
        }
    }

    /// Replace the whole date range.
    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = range;
        self.recompute();
    }

    /// Set the first day.
    pub fn set_from_date(&mut self, date: Option<NaiveDate>) {
        self.date_range.from = date;
        self.recompute();
    }

    /// Set the last day.
    pub fn set_to_date(&mut self, date: Option<NaiveDate>) {
        self.date_range.to = date;
        self.recompute();
    }

    /// Set the first day's duration. A full day forgets its session.
    pub fn set_from_duration(&mut self, duration: DayDuration) {
        self.date_range.from_duration = Some(duration);
        if duration == DayDuration::Full {
            self.date_range.from_session = None;
        }
        self.recompute();
    }

    /// Set the first day's session.
    pub fn set_from_session(&mut self, session: Session) {
        self.date_range.from_session = Some(session);
    }

    /// Set the last day's duration. A full day forgets its session.
    pub fn set_to_duration(&mut self, duration: DayDuration) {
        self.date_range.to_duration = Some(duration);
        if duration == DayDuration::Full {
            self.date_range.to_session = None;
        }
        self.recompute();
    }

    /// Set the last day's session.
    pub fn set_to_session(&mut self, session: Session) {
        self.date_range.to_session = Some(session);
    }

    /// Attach the medical certificate.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] and leaves the current certificate in place if
    /// the file is rejected.
    pub fn attach_medical_certificate(
        &mut self,
        file: FileRef,
        max_bytes: u64,
    ) -> Result<(), FileError> {
        file.accept(max_bytes)?;
        debug!(name = file.display_name(), "Medical certificate attached");
        self.medical_certificate = Some(file);
        Ok(())
    }

    /// Remove the medical certificate.
    pub fn clear_medical_certificate(&mut self) {
        self.medical_certificate = None;
    }

    /// Add a supporting document.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] and leaves the document list unchanged if the
    /// file is rejected.
    pub fn add_supporting_document(&mut self, file: FileRef, max_bytes: u64) -> Result<(), FileError> {
        file.accept(max_bytes)?;
        debug!(name = file.display_name(), "Supporting document attached");
        self.supporting_documents.push(file);
        Ok(())
    }

    /// Remove a supporting document by position, returning it if present.
    pub fn remove_supporting_document(&mut self, index: usize) -> Option<FileRef> {
        (index < self.supporting_documents.len()).then(|| self.supporting_documents.remove(index))
    }

    /// Clear everything, as after a successful submission.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn recompute(&mut self) {
        self.days = compute_leave_days(&self.date_range);
    }
}
