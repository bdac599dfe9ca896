//! Shared domain types.
//!
//! Enumerations here mirror the backend's wire vocabulary, so each variant
//! carries the exact string the server sends and expects.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Leave categories offered by the HR policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveType {
    /// Short casual absence.
    #[serde(rename = "Casual")]
    Casual,
    /// Sick leave backed by a medical certificate.
    #[serde(rename = "Medical")]
    Medical,
    /// Maternity leave.
    #[serde(rename = "Maternity")]
    Maternity,
    /// Paternity leave.
    #[serde(rename = "Paternity")]
    Paternity,
    /// Same-day emergency leave, gated by a per-employee permission.
    #[serde(rename = "Emergency")]
    Emergency,
    /// Leave redeemed against previously worked extra hours.
    #[serde(rename = "Compensatory")]
    Compensatory,
    /// One of the optional restricted holidays.
    #[serde(rename = "Restricted Holidays")]
    RestrictedHoliday,
    /// Unpaid leave.
    #[serde(rename = "Leave Without Pay")]
    LeaveWithoutPay,
}

impl LeaveType {
    /// All leave types in the order the application form lists them.
    pub const ALL: [Self; 8] = [
        Self::Casual,
        Self::Medical,
        Self::Maternity,
        Self::Paternity,
        Self::Emergency,
        Self::Compensatory,
        Self::RestrictedHoliday,
        Self::LeaveWithoutPay,
    ];

    /// The string the backend uses for this leave type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "Casual",
            Self::Medical => "Medical",
            Self::Maternity => "Maternity",
            Self::Paternity => "Paternity",
            Self::Emergency => "Emergency",
            Self::Compensatory => "Compensatory",
            Self::RestrictedHoliday => "Restricted Holidays",
            Self::LeaveWithoutPay => "Leave Without Pay",
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text names no known leave type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown leave type '{0}'")]
pub struct UnknownLeaveType(pub String);

impl FromStr for LeaveType {
    type Err = UnknownLeaveType;

    /// Accepts the wire name in any case, plus `rh` and `lwp`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        match wanted.to_ascii_lowercase().as_str() {
            "rh" | "restricted" | "restricted holiday" => return Ok(Self::RestrictedHoliday),
            "lwp" => return Ok(Self::LeaveWithoutPay),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|lt| lt.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLeaveType(s.to_string()))
    }
}

/// How much of a day a leave boundary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayDuration {
    /// The whole working day.
    #[default]
    Full,
    /// Either the forenoon or the afternoon.
    Half,
}

impl DayDuration {
    /// Whether this is a half day.
    #[must_use]
    pub const fn is_half(self) -> bool {
        matches!(self, Self::Half)
    }

    /// The string the backend uses for this duration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Half => "half",
        }
    }
}

/// Which half of the day a half-day leave covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    /// Morning session.
    Forenoon,
    /// Afternoon session.
    Afternoon,
}

impl Session {
    /// The string the backend uses for this session.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forenoon => "forenoon",
            Self::Afternoon => "afternoon",
        }
    }
}

/// Employee gender as recorded by HR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Any other or unspecified value.
    #[serde(other)]
    Other,
}

/// Where an employee stands in their employment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentStatus {
    /// Past probation.
    Confirmed,
    /// Still on probation. Unknown statuses are treated the same way.
    #[serde(other)]
    Probation,
}

impl EmploymentStatus {
    /// Whether the employee is confirmed.
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// The role of whoever is looking at a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A regular employee.
    #[default]
    Employee,
    /// A head of department, allowed to act on their department's requests.
    Hod,
}

/// The employee attributes the leave rules depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    /// Employee identifier.
    pub employee_id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Gender, used by maternity/paternity eligibility.
    pub gender: Gender,

    /// Employment status, used by most eligibility rules.
    pub employment_status: EmploymentStatus,

    /// Role of the employee.
    #[serde(default)]
    pub role: Role,

    /// Department name.
    #[serde(default)]
    pub department: String,
}

/// Whether a compensatory entry can still be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompensatoryStatus {
    /// Not yet redeemed.
    Available,
    /// Already redeemed by an earlier leave.
    Used,
}

/// Extra hours worked that can be redeemed as compensatory leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensatoryEntry {
    /// Backend identifier.
    #[serde(alias = "_id")]
    pub id: String,

    /// Day the extra hours were worked.
    pub date: NaiveDate,

    /// Hours credited: 4 for a half day, 8 for a full day.
    pub hours: u8,

    /// Redemption status.
    pub status: CompensatoryStatus,
}

impl CompensatoryEntry {
    /// Whether the entry can still be redeemed.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == CompensatoryStatus::Available
    }

    /// The duration this entry can be redeemed for, if its hours are valid.
    #[must_use]
    pub const fn redeemable_duration(&self) -> Option<DayDuration> {
        match self.hours {
            4 => Some(DayDuration::Half),
            8 => Some(DayDuration::Full),
            _ => None,
        }
    }
}

/// Returns only the entries that can still be redeemed.
#[must_use]
pub fn available_entries(entries: &[CompensatoryEntry]) -> Vec<&CompensatoryEntry> {
    entries.iter().filter(|e| e.is_available()).collect()
}

/// A leave day count in half-day steps.
///
/// Stored as a number of half days so comparisons stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LeaveDays(u32);

impl LeaveDays {
    /// Zero days.
    pub const ZERO: Self = Self(0);

    /// A single half day.
    pub const HALF: Self = Self(1);

    /// One full day.
    pub const ONE: Self = Self(2);

    /// A count of whole days.
    #[must_use]
    pub const fn whole(days: u32) -> Self {
        Self(days * 2)
    }

    /// A count of half days.
    #[must_use]
    pub const fn from_halves(halves: u32) -> Self {
        Self(halves)
    }

    /// Number of half days.
    #[must_use]
    pub const fn halves(self) -> u32 {
        self.0
    }

    /// The count as a decimal number of days.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Whether the count includes a trailing half day.
    #[must_use]
    pub const fn has_half(self) -> bool {
        self.0 % 2 == 1
    }
}

impl std::ops::Add for LeaveDays {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for LeaveDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_half() {
            write!(f, "{}.5", self.0 / 2)
        } else {
            write!(f, "{}", self.0 / 2)
        }
    }
}

impl Serialize for LeaveDays {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.as_f64())
    }
}
