//! Push events from the backend socket.
//!
//! Events carry no state of their own; each one only tells the client which
//! resources to fetch again.

use serde::Deserialize;
use tracing::debug;

/// Resources a screen can re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefreshTarget {
    /// Employee info and stats on the dashboard.
    Dashboard,
    /// Leave records.
    Leaves,
    /// OD records.
    OnDuty,
    /// Notification list.
    Notifications,
}

/// A decoded push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Something on the dashboard changed.
    DashboardUpdate,
    /// A new notification arrived.
    Notification {
        /// Notification text, if sent.
        message: Option<String>,
    },
}

#[derive(Deserialize)]
struct RawEvent {
    event: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl PushEvent {
    /// Decode an event from its name and optional payload.
    ///
    /// Unknown names yield `None`.
    #[must_use]
    pub fn from_parts(name: &str, payload: Option<&serde_json::Value>) -> Option<Self> {
        match name {
            "dashboard-update" => Some(Self::DashboardUpdate),
            "notification" => Some(Self::Notification {
                message: payload
                    .and_then(|p| p.get("message"))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
            }),
            other => {
                debug!(event = other, "Ignoring unknown push event");
                None
            }
        }
    }

    /// Decode an event from a JSON frame `{"event": ..., "data": ...}`.
    ///
    /// Malformed frames and unknown events yield `None`.
    #[must_use]
    pub fn from_frame(frame: &str) -> Option<Self> {
        let raw: RawEvent = serde_json::from_str(frame).ok()?;
        Self::from_parts(&raw.event, raw.data.as_ref())
    }

    /// What to re-fetch in response to this event.
    #[must_use]
    pub const fn refresh_targets(&self) -> &'static [RefreshTarget] {
        match self {
            Self::DashboardUpdate => &[
                RefreshTarget::Dashboard,
                RefreshTarget::Leaves,
                RefreshTarget::OnDuty,
            ],
            Self::Notification { .. } => &[RefreshTarget::Notifications],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_update_refreshes_records() {
        let event = PushEvent::from_frame(r#"{"event":"dashboard-update"}"#).unwrap();
        assert_eq!(event, PushEvent::DashboardUpdate);
        assert!(event.refresh_targets().contains(&RefreshTarget::Leaves));
    }

    #[test]
    fn test_notification_keeps_message() {
        let event =
            PushEvent::from_frame(r#"{"event":"notification","data":{"message":"Leave approved"}}"#)
                .unwrap();
        assert_eq!(
            event,
            PushEvent::Notification {
                message: Some("Leave approved".into())
            }
        );
        assert_eq!(event.refresh_targets(), &[RefreshTarget::Notifications]);
    }

    #[test]
    fn test_unknown_and_malformed_are_ignored() {
        assert!(PushEvent::from_frame(r#"{"event":"typing"}"#).is_none());
        assert!(PushEvent::from_frame("not json").is_none());
    }
}
