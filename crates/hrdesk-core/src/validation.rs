//! Leave application rules.
//!
//! Validation runs in three stages and stops at the first failure:
//!
//! 1. [`ValidationStage::BasicFields`] - required fields are filled in
//! 2. [`ValidationStage::DateConsistency`] - the date range is coherent
//! 3. [`ValidationStage::Eligibility`] - the per-leave-type policy, then the
//!    past-date and notice-period rules shared by most types
//!
//! Nothing here touches the network or the clock. The caller supplies
//! "today" in the policy timezone through [`RuleContext`].

use chrono::NaiveDate;
use thiserror::Error;

use crate::days::add_working_days;
use crate::draft::LeaveDraft;
use crate::types::{CompensatoryEntry, DayDuration, EmployeeProfile, Gender, LeaveDays, LeaveType};

/// Working days of notice required before most leave starts.
pub const MIN_NOTICE_WORKING_DAYS: u32 = 2;

/// Longest casual leave a confirmed employee may take at once.
pub const MAX_CASUAL_DAYS_CONFIRMED: LeaveDays = LeaveDays::whole(3);

/// Longest casual leave an employee on probation may take.
pub const MAX_CASUAL_DAYS_PROBATION: LeaveDays = LeaveDays::whole(1);

/// Medical leave must span exactly one of these day counts.
pub const MEDICAL_ALLOWED_DAYS: [LeaveDays; 2] = [LeaveDays::whole(3), LeaveDays::whole(4)];

/// Required length of maternity leave.
pub const MATERNITY_DAYS: LeaveDays = LeaveDays::whole(90);

/// Required length of paternity leave.
pub const PATERNITY_DAYS: LeaveDays = LeaveDays::whole(7);

/// Longest leave without pay for confirmed employees.
pub const MAX_LWP_DAYS: LeaveDays = LeaveDays::whole(30);

/// Longest leave without pay for employees on probation.
pub const MAX_LWP_DAYS_PROBATION: LeaveDays = LeaveDays::whole(7);

/// The validation stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationStage {
    /// Required fields.
    BasicFields,
    /// Date range coherence.
    DateConsistency,
    /// Leave-type policy.
    Eligibility,
}

/// The first rule a draft broke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Stage that rejected the draft.
    pub stage: ValidationStage,
    /// Machine-readable code.
    pub code: &'static str,
    /// Message shown to the user.
    pub message: String,
}

impl ValidationError {
    fn new(stage: ValidationStage, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            code,
            message: message.into(),
        }
    }

    fn basic(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ValidationStage::BasicFields, code, message)
    }

    fn dates(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ValidationStage::DateConsistency, code, message)
    }

    fn policy(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ValidationStage::Eligibility, code, message)
    }
}

/// Result type for validation.
pub type ValidationResult = Result<(), ValidationError>;

/// Everything outside the draft that the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The applicant.
    pub user: &'a EmployeeProfile,
    /// Day count computed for the draft.
    pub days: LeaveDays,
    /// The applicant's compensatory entries for this session.
    pub compensatory_entries: &'a [CompensatoryEntry],
    /// Whether the applicant holds emergency leave permission.
    pub emergency_leave_allowed: bool,
    /// Current date in the policy timezone.
    pub today: NaiveDate,
}

/// Validate a leave draft.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, in stage order.
pub fn validate(draft: &LeaveDraft, ctx: &RuleContext<'_>) -> ValidationResult {
    check_basic_fields(draft)?;
    let from = check_dates(draft)?;
    check_eligibility(draft, ctx, from)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_basic_fields(draft: &LeaveDraft) -> ValidationResult {
    if draft.leave_type.is_none() {
        return Err(ValidationError::basic(
            "leave_type_required",
            "Please select a leave type",
        ));
    }
    if is_blank(&draft.reason) {
        return Err(ValidationError::basic(
            "reason_required",
            "Please enter a reason for leave",
        ));
    }
    if is_blank(&draft.charge_to_employee_id) {
        return Err(ValidationError::basic(
            "charge_to_required",
            "Please select the employee to hand over charge to",
        ));
    }
    if is_blank(&draft.emergency_contact) {
        return Err(ValidationError::basic(
            "emergency_contact_required",
            "Please enter an emergency contact number",
        ));
    }
    if draft.date_range().from_duration.is_none() {
        return Err(ValidationError::basic(
            "duration_required",
            "Please select the leave duration",
        ));
    }
    Ok(())
}

fn check_dates(draft: &LeaveDraft) -> Result<NaiveDate, ValidationError> {
    let range = draft.date_range();

    let Some(from) = range.from else {
        return Err(ValidationError::dates(
            "from_date_required",
            "Please select the from date",
        ));
    };

    if range.from_duration == Some(DayDuration::Half) && range.from_session.is_none() {
        return Err(ValidationError::dates(
            "from_session_required",
            "Please select a session for the half day on the from date",
        ));
    }

    if let Some(to) = range.to {
        if to < from {
            return Err(ValidationError::dates(
                "to_before_from",
                "To date cannot be earlier than from date",
            ));
        }
        if to > from && range.to_duration == Some(DayDuration::Half) && range.to_session.is_none() {
            return Err(ValidationError::dates(
                "to_session_required",
                "Please select a session for the half day on the to date",
            ));
        }
    }

    Ok(from)
}

fn check_eligibility(draft: &LeaveDraft, ctx: &RuleContext<'_>, from: NaiveDate) -> ValidationResult {
    let Some(leave_type) = draft.leave_type else {
        return Err(ValidationError::basic(
            "leave_type_required",
            "Please select a leave type",
        ));
    };

    match leave_type {
        LeaveType::Casual => check_casual(ctx),
        LeaveType::Medical => check_medical(draft, ctx),
        LeaveType::Maternity => check_maternity(draft, ctx),
        LeaveType::Paternity => check_paternity(draft, ctx),
        LeaveType::Emergency => check_emergency(draft, ctx, from),
        LeaveType::Compensatory => check_compensatory(draft, ctx),
        LeaveType::RestrictedHoliday => check_restricted_holiday(draft),
        LeaveType::LeaveWithoutPay => check_leave_without_pay(ctx),
    }?;

    if leave_type != LeaveType::Medical && from < ctx.today {
        return Err(ValidationError::policy(
            "date_in_past",
            "Leave cannot be applied for a past date",
        ));
    }

    if !matches!(leave_type, LeaveType::Medical | LeaveType::Emergency) {
        let earliest = add_working_days(ctx.today, MIN_NOTICE_WORKING_DAYS);
        if from < earliest {
            return Err(ValidationError::policy(
                "insufficient_notice",
                format!(
                    "Leave must be applied at least {MIN_NOTICE_WORKING_DAYS} working days in advance (earliest start: {earliest})"
                ),
            ));
        }
    }

    Ok(())
}

fn check_casual(ctx: &RuleContext<'_>) -> ValidationResult {
    if ctx.user.employment_status.is_confirmed() {
        if ctx.days > MAX_CASUAL_DAYS_CONFIRMED {
            return Err(ValidationError::policy(
                "casual_too_long",
                format!("Casual leave cannot exceed {MAX_CASUAL_DAYS_CONFIRMED} consecutive days"),
            ));
        }
    } else if ctx.days > MAX_CASUAL_DAYS_PROBATION {
        return Err(ValidationError::policy(
            "casual_probation_limit",
            format!(
                "Employees on probation can take at most {MAX_CASUAL_DAYS_PROBATION} day of casual leave"
            ),
        ));
    }
    Ok(())
}

fn require_confirmed(ctx: &RuleContext<'_>, leave_type: LeaveType) -> ValidationResult {
    if ctx.user.employment_status.is_confirmed() {
        Ok(())
    } else {
        Err(ValidationError::policy(
            "not_eligible",
            format!("{leave_type} leave is only available to confirmed employees"),
        ))
    }
}

fn forbid_half_day(draft: &LeaveDraft, leave_type: LeaveType) -> ValidationResult {
    if draft.date_range().has_half_day() {
        Err(ValidationError::policy(
            "half_day_not_allowed",
            format!("{leave_type} leave cannot be taken as a half day"),
        ))
    } else {
        Ok(())
    }
}

fn check_medical(draft: &LeaveDraft, ctx: &RuleContext<'_>) -> ValidationResult {
    require_confirmed(ctx, LeaveType::Medical)?;
    forbid_half_day(draft, LeaveType::Medical)?;
    if draft.medical_certificate().is_none() {
        return Err(ValidationError::policy(
            "medical_certificate_required",
            "Please attach a medical certificate",
        ));
    }
    if !MEDICAL_ALLOWED_DAYS.contains(&ctx.days) {
        return Err(ValidationError::policy(
            "medical_days",
            "Medical leave must be for exactly 3 or 4 days",
        ));
    }
    Ok(())
}

fn check_maternity(draft: &LeaveDraft, ctx: &RuleContext<'_>) -> ValidationResult {
    if ctx.user.gender != Gender::Female {
        return Err(ValidationError::policy(
            "not_eligible",
            "Maternity leave is only available to female employees",
        ));
    }
    require_confirmed(ctx, LeaveType::Maternity)?;
    forbid_half_day(draft, LeaveType::Maternity)?;
    if ctx.days != MATERNITY_DAYS {
        return Err(ValidationError::policy(
            "maternity_days",
            format!("Maternity leave must be for exactly {MATERNITY_DAYS} days"),
        ));
    }
    Ok(())
}

fn check_paternity(draft: &LeaveDraft, ctx: &RuleContext<'_>) -> ValidationResult {
    if ctx.user.gender != Gender::Male {
        return Err(ValidationError::policy(
            "not_eligible",
            "Paternity leave is only available to male employees",
        ));
    }
    require_confirmed(ctx, LeaveType::Paternity)?;
    forbid_half_day(draft, LeaveType::Paternity)?;
    if ctx.days != PATERNITY_DAYS {
        return Err(ValidationError::policy(
            "paternity_days",
            format!("Paternity leave must be for exactly {PATERNITY_DAYS} days"),
        ));
    }
    Ok(())
}

fn check_emergency(draft: &LeaveDraft, ctx: &RuleContext<'_>, from: NaiveDate) -> ValidationResult {
    if !ctx.emergency_leave_allowed {
        return Err(ValidationError::policy(
            "emergency_not_permitted",
            "You do not have permission to apply for emergency leave",
        ));
    }

    let half = draft.date_range().from_duration == Some(DayDuration::Half);
    if half && ctx.days > LeaveDays::HALF {
        return Err(ValidationError::policy(
            "emergency_too_long",
            "Half-day emergency leave cannot exceed half a day",
        ));
    }
    if !half && ctx.days > LeaveDays::ONE {
        return Err(ValidationError::policy(
            "emergency_too_long",
            "Emergency leave cannot exceed 1 day",
        ));
    }

    if from != ctx.today {
        return Err(ValidationError::policy(
            "emergency_not_today",
            "Emergency leave can only be applied for today",
        ));
    }
    Ok(())
}

fn check_compensatory(draft: &LeaveDraft, ctx: &RuleContext<'_>) -> ValidationResult {
    let Some(entry_id) = draft
        .compensatory_entry_id
        .as_deref()
        .filter(|id| !is_blank(id))
    else {
        return Err(ValidationError::policy(
            "compensatory_entry_required",
            "Please select a compensatory entry",
        ));
    };

    let Some(entry) = ctx.compensatory_entries.iter().find(|e| e.id == entry_id) else {
        return Err(ValidationError::policy(
            "compensatory_entry_unknown",
            "The selected compensatory entry could not be found",
        ));
    };

    if !entry.is_available() {
        return Err(ValidationError::policy(
            "compensatory_entry_used",
            "The selected compensatory entry has already been used",
        ));
    }

    if draft.date_range().is_multi_day() {
        return Err(ValidationError::policy(
            "compensatory_single_day",
            "Compensatory leave covers a single day",
        ));
    }

    let requested = draft.date_range().from_duration;
    match entry.redeemable_duration() {
        Some(DayDuration::Half) if requested != Some(DayDuration::Half) => {
            Err(ValidationError::policy(
                "compensatory_hours_mismatch",
                "A 4-hour compensatory entry can only be used for a half day",
            ))
        }
        Some(DayDuration::Full) if requested != Some(DayDuration::Full) => {
            Err(ValidationError::policy(
                "compensatory_hours_mismatch",
                "An 8-hour compensatory entry can only be used for a full day",
            ))
        }
        Some(_) => Ok(()),
        None => Err(ValidationError::policy(
            "compensatory_hours_invalid",
            format!(
                "The selected compensatory entry has {} hours; only 4 or 8 hours can be redeemed",
                entry.hours
            ),
        )),
    }
}

fn check_restricted_holiday(draft: &LeaveDraft) -> ValidationResult {
    if draft
        .restricted_holiday
        .as_deref()
        .map_or(true, is_blank)
    {
        return Err(ValidationError::policy(
            "restricted_holiday_required",
            "Please select a restricted holiday",
        ));
    }
    forbid_half_day(draft, LeaveType::RestrictedHoliday)
}

fn check_leave_without_pay(ctx: &RuleContext<'_>) -> ValidationResult {
    if ctx.days > MAX_LWP_DAYS {
        return Err(ValidationError::policy(
            "lwp_too_long",
            format!("Leave without pay cannot exceed {MAX_LWP_DAYS} days"),
        ));
    }
    if !ctx.user.employment_status.is_confirmed() && ctx.days > MAX_LWP_DAYS_PROBATION {
        return Err(ValidationError::policy(
            "lwp_probation_limit",
            format!(
                "Employees on probation can take at most {MAX_LWP_DAYS_PROBATION} days of leave without pay"
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DateRange;
    use crate::files::{FileRef, MAX_FILE_BYTES};
    use crate::types::{CompensatoryStatus, EmploymentStatus, Role, Session};
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Monday.
    fn today() -> NaiveDate {
        date(2024, 1, 1)
    }

    fn employee(gender: Gender, status: EmploymentStatus) -> EmployeeProfile {
        EmployeeProfile {
            employee_id: "E100".into(),
            name: "Test Employee".into(),
            gender,
            employment_status: status,
            role: Role::Employee,
            department: "Engineering".into(),
        }
    }

    fn confirmed() -> EmployeeProfile {
        employee(Gender::Female, EmploymentStatus::Confirmed)
    }

    fn filled(leave_type: LeaveType, range: DateRange) -> LeaveDraft {
        let mut draft = LeaveDraft::new();
        draft.set_leave_type(leave_type);
        draft.reason = "Family function".into();
        draft.charge_to_employee_id = "E200".into();
        draft.emergency_contact = "9876543210".into();
        draft.set_date_range(range);
        draft
    }

    fn check(draft: &LeaveDraft, user: &EmployeeProfile) -> ValidationResult {
        check_with(draft, user, &[], false)
    }

    fn check_with(
        draft: &LeaveDraft,
        user: &EmployeeProfile,
        entries: &[CompensatoryEntry],
        emergency: bool,
    ) -> ValidationResult {
        let ctx = RuleContext {
            user,
            days: draft.days(),
            compensatory_entries: entries,
            emergency_leave_allowed: emergency,
            today: today(),
        };
        validate(draft, &ctx)
    }

    fn code(result: ValidationResult) -> &'static str {
        result.unwrap_err().code
    }

    fn next_week(days: i64) -> DateRange {
        let from = date(2024, 1, 8);
        DateRange::full_days(from, from + Duration::days(days - 1))
    }

    #[test]
    fn test_valid_casual_leave() {
        let draft = filled(LeaveType::Casual, next_week(3));
        assert!(check(&draft, &confirmed()).is_ok());
    }

    #[test]
    fn test_basic_fields_reported_before_dates() {
        let mut draft = LeaveDraft::new();
        draft.set_leave_type(LeaveType::Casual);
        draft.set_from_duration(DayDuration::Full);
        // Missing reason and missing from date: reason wins.
        let err = check(&draft, &confirmed()).unwrap_err();
        assert_eq!(err.stage, ValidationStage::BasicFields);
        assert_eq!(err.code, "reason_required");
    }

    #[test]
    fn test_basic_field_order() {
        let mut draft = LeaveDraft::new();
        assert_eq!(code(check(&draft, &confirmed())), "leave_type_required");

        draft.set_leave_type(LeaveType::Casual);
        assert_eq!(code(check(&draft, &confirmed())), "reason_required");

        draft.reason = "  ".into();
        assert_eq!(code(check(&draft, &confirmed())), "reason_required");

        draft.reason = "Trip".into();
        assert_eq!(code(check(&draft, &confirmed())), "charge_to_required");

        draft.charge_to_employee_id = "E2".into();
        assert_eq!(code(check(&draft, &confirmed())), "emergency_contact_required");

        draft.emergency_contact = "123".into();
        assert_eq!(code(check(&draft, &confirmed())), "duration_required");

        draft.set_from_duration(DayDuration::Full);
        let err = check(&draft, &confirmed()).unwrap_err();
        assert_eq!(err.stage, ValidationStage::DateConsistency);
        assert_eq!(err.code, "from_date_required");
    }

    #[test]
    fn test_date_consistency_rules() {
        let mut draft = filled(
            LeaveType::Casual,
            DateRange::single(date(2024, 1, 8), DayDuration::Half, None),
        );
        assert_eq!(code(check(&draft, &confirmed())), "from_session_required");

        draft.set_from_session(Session::Forenoon);
        draft.set_to_date(Some(date(2024, 1, 5)));
        let err = check(&draft, &confirmed()).unwrap_err();
        assert_eq!(err.stage, ValidationStage::DateConsistency);
        assert_eq!(err.code, "to_before_from");

        draft.set_to_date(Some(date(2024, 1, 9)));
        draft.set_to_duration(DayDuration::Half);
        assert_eq!(code(check(&draft, &confirmed())), "to_session_required");

        draft.set_to_session(Session::Forenoon);
        assert!(check(&draft, &confirmed()).is_ok());
    }

    #[test]
    fn test_casual_limits() {
        let draft = filled(LeaveType::Casual, next_week(4));
        assert_eq!(code(check(&draft, &confirmed())), "casual_too_long");

        let probation = employee(Gender::Male, EmploymentStatus::Probation);
        let draft = filled(LeaveType::Casual, next_week(2));
        assert_eq!(code(check(&draft, &probation)), "casual_probation_limit");

        let draft = filled(LeaveType::Casual, next_week(1));
        assert!(check(&draft, &probation).is_ok());
    }

    fn medical(range: DateRange) -> LeaveDraft {
        let mut draft = filled(LeaveType::Medical, range);
        draft
            .attach_medical_certificate(FileRef::new("/tmp/cert.pdf", "cert.pdf", 2048), MAX_FILE_BYTES)
            .unwrap();
        draft
    }

    #[test]
    fn test_medical_rejects_half_day_always() {
        let mut draft = medical(DateRange {
            from: Some(date(2024, 1, 8)),
            to: Some(date(2024, 1, 11)),
            from_duration: Some(DayDuration::Half),
            from_session: Some(Session::Afternoon),
            to_duration: Some(DayDuration::Full),
            to_session: None,
        });
        assert_eq!(code(check(&draft, &confirmed())), "half_day_not_allowed");

        draft.set_from_duration(DayDuration::Full);
        assert!(check(&draft, &confirmed()).is_ok());
    }

    #[test]
    fn test_medical_rules() {
        let probation = employee(Gender::Female, EmploymentStatus::Probation);
        assert_eq!(code(check(&medical(next_week(3)), &probation)), "not_eligible");

        let mut draft = medical(next_week(3));
        draft.clear_medical_certificate();
        assert_eq!(
            code(check(&draft, &confirmed())),
            "medical_certificate_required"
        );

        assert_eq!(code(check(&medical(next_week(2)), &confirmed())), "medical_days");
        assert_eq!(code(check(&medical(next_week(5)), &confirmed())), "medical_days");
        assert!(check(&medical(next_week(4)), &confirmed()).is_ok());
    }

    #[test]
    fn test_medical_may_be_backdated() {
        let draft = medical(DateRange::full_days(date(2023, 12, 27), date(2023, 12, 29)));
        assert!(check(&draft, &confirmed()).is_ok());
    }

    #[test]
    fn test_maternity_and_paternity() {
        let female = confirmed();
        let male = employee(Gender::Male, EmploymentStatus::Confirmed);

        let draft = filled(LeaveType::Maternity, next_week(90));
        assert!(check(&draft, &female).is_ok());
        assert_eq!(code(check(&draft, &male)), "not_eligible");
        let draft = filled(LeaveType::Maternity, next_week(60));
        assert_eq!(code(check(&draft, &female)), "maternity_days");

        let draft = filled(LeaveType::Paternity, next_week(7));
        assert!(check(&draft, &male).is_ok());
        assert_eq!(code(check(&draft, &female)), "not_eligible");
        let probation_male = employee(Gender::Male, EmploymentStatus::Probation);
        assert_eq!(code(check(&draft, &probation_male)), "not_eligible");
        let draft = filled(LeaveType::Paternity, next_week(6));
        assert_eq!(code(check(&draft, &male)), "paternity_days");
    }

    #[test]
    fn test_emergency_rules() {
        let user = confirmed();
        let draft = filled(
            LeaveType::Emergency,
            DateRange::single(today(), DayDuration::Full, None),
        );
        assert_eq!(
            code(check_with(&draft, &user, &[], false)),
            "emergency_not_permitted"
        );
        // Same day, no notice required.
        assert!(check_with(&draft, &user, &[], true).is_ok());

        let draft = filled(LeaveType::Emergency, DateRange::full_days(today(), date(2024, 1, 2)));
        assert_eq!(code(check_with(&draft, &user, &[], true)), "emergency_too_long");

        let draft = filled(
            LeaveType::Emergency,
            DateRange::single(date(2024, 1, 8), DayDuration::Full, None),
        );
        assert_eq!(code(check_with(&draft, &user, &[], true)), "emergency_not_today");

        let half = filled(
            LeaveType::Emergency,
            DateRange::single(today(), DayDuration::Half, Some(Session::Forenoon)),
        );
        assert!(check_with(&half, &user, &[], true).is_ok());
    }

    fn comp_entry(id: &str, hours: u8, status: CompensatoryStatus) -> CompensatoryEntry {
        CompensatoryEntry {
            id: id.into(),
            date: date(2023, 12, 30),
            hours,
            status,
        }
    }

    fn compensatory(duration: DayDuration, entry_id: &str) -> LeaveDraft {
        let session = duration.is_half().then_some(Session::Forenoon);
        let mut draft = filled(
            LeaveType::Compensatory,
            DateRange::single(date(2024, 1, 8), duration, session),
        );
        draft.compensatory_entry_id = Some(entry_id.into());
        draft
    }

    #[test]
    fn test_compensatory_hours_must_match_duration() {
        let user = confirmed();
        let entries = [
            comp_entry("four", 4, CompensatoryStatus::Available),
            comp_entry("eight", 8, CompensatoryStatus::Available),
        ];

        assert!(check_with(&compensatory(DayDuration::Half, "four"), &user, &entries, false).is_ok());
        assert_eq!(
            code(check_with(&compensatory(DayDuration::Full, "four"), &user, &entries, false)),
            "compensatory_hours_mismatch"
        );
        assert!(check_with(&compensatory(DayDuration::Full, "eight"), &user, &entries, false).is_ok());
        assert_eq!(
            code(check_with(&compensatory(DayDuration::Half, "eight"), &user, &entries, false)),
            "compensatory_hours_mismatch"
        );
    }

    #[test]
    fn test_compensatory_entry_selection() {
        let user = confirmed();
        let entries = [
            comp_entry("used", 8, CompensatoryStatus::Used),
            comp_entry("odd", 6, CompensatoryStatus::Available),
        ];

        let mut draft = compensatory(DayDuration::Full, "used");
        draft.compensatory_entry_id = None;
        assert_eq!(
            code(check_with(&draft, &user, &entries, false)),
            "compensatory_entry_required"
        );
        assert_eq!(
            code(check_with(&compensatory(DayDuration::Full, "missing"), &user, &entries, false)),
            "compensatory_entry_unknown"
        );
        assert_eq!(
            code(check_with(&compensatory(DayDuration::Full, "used"), &user, &entries, false)),
            "compensatory_entry_used"
        );
        assert_eq!(
            code(check_with(&compensatory(DayDuration::Full, "odd"), &user, &entries, false)),
            "compensatory_hours_invalid"
        );
    }

    #[test]
    fn test_restricted_holiday() {
        let mut draft = filled(
            LeaveType::RestrictedHoliday,
            DateRange::single(date(2024, 1, 8), DayDuration::Full, None),
        );
        assert_eq!(
            code(check(&draft, &confirmed())),
            "restricted_holiday_required"
        );
        draft.restricted_holiday = Some("Pongal".into());
        assert!(check(&draft, &confirmed()).is_ok());

        draft.set_from_duration(DayDuration::Half);
        draft.set_from_session(Session::Forenoon);
        assert_eq!(code(check(&draft, &confirmed())), "half_day_not_allowed");
    }

    #[test]
    fn test_leave_without_pay_limits() {
        let draft = filled(LeaveType::LeaveWithoutPay, next_week(31));
        assert_eq!(code(check(&draft, &confirmed())), "lwp_too_long");

        let probation = employee(Gender::Male, EmploymentStatus::Probation);
        let draft = filled(LeaveType::LeaveWithoutPay, next_week(8));
        assert_eq!(code(check(&draft, &probation)), "lwp_probation_limit");
        assert!(check(&draft, &confirmed()).is_ok());
    }

    #[test]
    fn test_past_date_rejected() {
        let draft = filled(
            LeaveType::Casual,
            DateRange::single(date(2023, 12, 29), DayDuration::Full, None),
        );
        assert_eq!(code(check(&draft, &confirmed())), "date_in_past");
    }

    #[test]
    fn test_notice_skips_weekends() {
        // Friday 2024-01-05: earliest start is Tuesday 2024-01-09.
        let user = confirmed();
        let friday = date(2024, 1, 5);
        let draft = filled(
            LeaveType::Casual,
            DateRange::single(date(2024, 1, 8), DayDuration::Full, None),
        );
        let ctx = RuleContext {
            user: &user,
            days: draft.days(),
            compensatory_entries: &[],
            emergency_leave_allowed: false,
            today: friday,
        };
        assert_eq!(validate(&draft, &ctx).unwrap_err().code, "insufficient_notice");

        let draft = filled(
            LeaveType::Casual,
            DateRange::single(date(2024, 1, 9), DayDuration::Full, None),
        );
        let ctx = RuleContext {
            days: draft.days(),
            ..ctx
        };
        assert!(validate(&draft, &ctx).is_ok());
    }

    #[test]
    fn test_notice_boundary_from_monday() {
        let on_wednesday = filled(
            LeaveType::Casual,
            DateRange::single(date(2024, 1, 3), DayDuration::Full, None),
        );
        assert!(check(&on_wednesday, &confirmed()).is_ok());

        let on_tuesday = filled(
            LeaveType::Casual,
            DateRange::single(date(2024, 1, 2), DayDuration::Full, None),
        );
        assert_eq!(code(check(&on_tuesday, &confirmed())), "insufficient_notice");
    }

    #[test]
    fn test_error_display_is_message() {
        let err = check(&LeaveDraft::new(), &confirmed()).unwrap_err();
        assert_eq!(err.to_string(), "Please select a leave type");
    }
}
