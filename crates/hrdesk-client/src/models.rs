//! Response and request bodies that only the client needs.
//!
//! Shapes shared with the domain rules (profiles, records, compensatory
//! entries) live in `hrdesk-core`.

use chrono::{DateTime, NaiveDate, Utc};
use hrdesk_core::{CompensatoryEntry, EmployeeProfile, FileRef};
use serde::{Deserialize, Serialize};

/// A list as returned by the backend, either bare or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(
            alias = "data",
            alias = "leaves",
            alias = "ods",
            alias = "records",
            alias = "notifications",
            alias = "employees"
        )]
        items: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { items } => items,
        }
    }
}

/// `GET /dashboard/employee-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInfo {
    /// Profile fields the leave rules look at.
    #[serde(flatten)]
    pub profile: EmployeeProfile,

    /// Compensatory entries, used and available.
    #[serde(default)]
    pub compensatory_entries: Vec<CompensatoryEntry>,

    /// Whether HR has granted emergency leave permission. Replaced by the
    /// permission endpoint's answer whenever an emergency draft is checked.
    #[serde(default, alias = "canApplyEmergencyLeave")]
    pub emergency_leave_allowed: bool,
}

/// `GET /dashboard/employee-stats`: counters keyed by name.
pub type EmployeeStats = serde_json::Map<String, serde_json::Value>;

/// One day of `GET /attendance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Calendar day.
    pub date: NaiveDate,
    /// Status label, e.g. `Present`.
    #[serde(default)]
    pub status: String,
    /// Punch-in time as sent by the server.
    #[serde(default)]
    pub check_in: Option<String>,
    /// Punch-out time as sent by the server.
    #[serde(default)]
    pub check_out: Option<String>,
}

/// A colleague from `GET /employees/department`, offered as charge-to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentMember {
    /// Employee identifier.
    pub employee_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Job title.
    #[serde(default)]
    pub designation: String,
}

/// Emergency leave permission, read and written by HR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyLeavePermission {
    /// Whether the employee may apply for emergency leave.
    #[serde(alias = "allowed")]
    pub can_apply_emergency_leave: bool,
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Backend identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Text.
    #[serde(default)]
    pub message: String,
    /// Whether it has been read.
    #[serde(default)]
    pub read: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Changes for `PUT /employees/:id`, sent as multipart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Text fields in send order.
    pub fields: Vec<(String, String)>,
    /// New profile picture.
    pub photo: Option<FileRef>,
}

impl ProfileUpdate {
    /// Multipart field carrying the profile picture.
    pub const PHOTO_FIELD: &'static str = "profilePicture";

    /// Add or replace a text field.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Attach a new profile picture.
    #[must_use]
    pub fn with_photo(mut self, photo: FileRef) -> Self {
        self.photo = Some(photo);
        self
    }
}

/// A file fetched from `GET /employees/files/:fileId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// Name from `Content-Disposition`, if any.
    pub file_name: Option<String>,
    /// Content type, if any.
    pub mime_type: Option<String>,
}
