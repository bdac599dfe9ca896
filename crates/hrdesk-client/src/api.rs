//! HTTP client for the hrdesk REST backend.
//!
//! Every call is a single request with no retry. The bearer token is attached
//! per request; a 401 from any endpoint clears it so the caller can force a
//! fresh sign-in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hrdesk_core::{
    ApprovalDecision, Config, EmployeeProfile, LeaveRecord, OdRecord, OdSubmission, WireFile,
    WireRequest,
};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{
    extract_message, ClientError, ClientResult, FORBIDDEN_MESSAGE, GENERIC_ERROR_MESSAGE,
};
use crate::models::{
    AttendanceRecord, DepartmentMember, Download, EmergencyLeavePermission, EmployeeInfo,
    EmployeeStats, Listing, Notification, ProfileUpdate,
};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'')?"?([^";]+)"?"#)
        .expect("filename pattern is valid")
});

/// Async client for the hrdesk backend.
///
/// Cloning is cheap and clones share the session token.
#[derive(Clone)]
pub struct HrClient {
    http: reqwest::Client,
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for HrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HrClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HrClient {
    /// Create a client for `base_url`, e.g. `https://hr.example.com/api/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path or the HTTP client
    /// cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> ClientResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Create a client from the `api` section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse.
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let base_url = Url::parse(&config.api.base_url)
            .map_err(|_| ClientError::InvalidBaseUrl(config.api.base_url.clone()))?;
        Self::new(base_url, config.timeout())
    }

    /// Start a session with the given bearer token.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Drop the session token.
    pub async fn clear_session(&self) {
        *self.token.write().await = None;
    }

    /// Whether a session token is set.
    pub async fn has_session(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the session and send, mapping failure statuses to errors.
    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let token = self.token.read().await.clone();
        let Some(token) = token else {
            return Err(ClientError::NoSession);
        };
        let request_id = uuid::Uuid::new_v4().to_string();

        let response = request
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await?;
        let status = response.status();
        debug!(%request_id, status = status.as_u16(), url = %response.url(), "Response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(%request_id, "Session rejected by server, signing out");
                self.clear_session().await;
                Err(ClientError::Unauthorized)
            }
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden {
                message: message.unwrap_or_else(|| FORBIDDEN_MESSAGE.to_string()),
            }),
            _ => Err(ClientError::Status {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            }),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> ClientResult<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        let response = self.send(self.http.get(url)).await?;
        Self::decode(response, &segments.join("/")).await
    }

    async fn get_list<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<Vec<T>> {
        self.get_json::<Listing<T>>(segments)
            .await
            .map(Listing::into_vec)
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<()> {
        let url = self.endpoint(segments)?;
        self.send(self.http.request(method, url).json(body)).await?;
        Ok(())
    }

    // Leave

    /// `GET /leaves`: the caller's leaves, or the department's for an HOD.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn list_leaves(&self) -> ClientResult<Vec<LeaveRecord>> {
        self.get_list(&["leaves"]).await
    }

    /// `POST /leaves` with a packaged draft.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if an attachment cannot be read or the request
    /// fails.
    pub async fn submit_leave(&self, request: &WireRequest) -> ClientResult<()> {
        let mut form = Form::new();
        for field in &request.fields {
            form = form.text(field.name, field.value.clone());
        }
        form = attach_files(form, &request.files).await?;

        let url = self.endpoint(&["leaves"])?;
        self.send(self.http.post(url).multipart(form)).await?;
        info!(
            files = request.files.len(),
            "Leave application submitted"
        );
        Ok(())
    }

    /// `PUT /leaves/:id/approve` with the HOD decision.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the request fails.
    pub async fn decide_leave(&self, leave_id: &str, decision: &ApprovalDecision) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &["leaves", leave_id, "approve"],
            decision,
        )
        .await?;
        info!(leave_id, status = ?decision.status, "Leave decision sent");
        Ok(())
    }

    // On duty

    /// `GET /od`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn list_od(&self) -> ClientResult<Vec<OdRecord>> {
        self.get_list(&["od"]).await
    }

    /// `POST /od`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the request fails.
    pub async fn submit_od(&self, body: &OdSubmission) -> ClientResult<()> {
        self.send_json(reqwest::Method::POST, &["od"], body).await?;
        info!(date_from = %body.date_from, "OD request submitted");
        Ok(())
    }

    /// `PUT /od/:id/approve`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the request fails.
    pub async fn decide_od(&self, od_id: &str, decision: &ApprovalDecision) -> ClientResult<()> {
        self.send_json(reqwest::Method::PUT, &["od", od_id, "approve"], decision)
            .await?;
        info!(od_id, status = ?decision.status, "OD decision sent");
        Ok(())
    }

    // Dashboard and attendance

    /// `GET /attendance`, optionally for one month (`YYYY-MM`).
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn attendance(&self, month: Option<&str>) -> ClientResult<Vec<AttendanceRecord>> {
        let mut url = self.endpoint(&["attendance"])?;
        if let Some(month) = month {
            url.query_pairs_mut().append_pair("month", month);
        }
        let response = self.send(self.http.get(url)).await?;
        Self::decode::<Listing<AttendanceRecord>>(response, "attendance")
            .await
            .map(Listing::into_vec)
    }

    /// `GET /dashboard/employee-info`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn employee_info(&self) -> ClientResult<EmployeeInfo> {
        self.get_json(&["dashboard", "employee-info"]).await
    }

    /// `GET /dashboard/employee-stats`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn employee_stats(&self) -> ClientResult<EmployeeStats> {
        self.get_json(&["dashboard", "employee-stats"]).await
    }

    // Employees

    /// `GET /employees/:id`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn employee(&self, employee_id: &str) -> ClientResult<EmployeeProfile> {
        self.get_json(&["employees", employee_id]).await
    }

    /// `PUT /employees/:id` with changed fields and an optional photo.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the photo cannot be read or the request
    /// fails.
    pub async fn update_employee(&self, employee_id: &str, update: &ProfileUpdate) -> ClientResult<()> {
        let mut form = Form::new();
        for (name, value) in &update.fields {
            form = form.text(name.clone(), value.clone());
        }
        if let Some(photo) = &update.photo {
            let mime_type = photo.effective_mime_type();
            let file = WireFile {
                field: ProfileUpdate::PHOTO_FIELD,
                uri: photo.uri.clone(),
                file_name: photo.display_name().to_string(),
                mime_type,
            };
            form = attach_files(form, std::slice::from_ref(&file)).await?;
        }

        let url = self.endpoint(&["employees", employee_id])?;
        self.send(self.http.put(url).multipart(form)).await?;
        info!(employee_id, "Profile updated");
        Ok(())
    }

    /// `GET /employees/department`: colleagues that can take charge.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn department_members(&self) -> ClientResult<Vec<DepartmentMember>> {
        self.get_list(&["employees", "department"]).await
    }

    /// `GET /employees/:id/emergency-leave-permission`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn emergency_leave_permission(&self, employee_id: &str) -> ClientResult<bool> {
        self.get_json::<EmergencyLeavePermission>(&[
            "employees",
            employee_id,
            "emergency-leave-permission",
        ])
        .await
        .map(|p| p.can_apply_emergency_leave)
    }

    /// `PATCH /employees/:id/emergency-leave-permission`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the request fails.
    pub async fn set_emergency_leave_permission(&self, employee_id: &str, allowed: bool) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PATCH,
            &["employees", employee_id, "emergency-leave-permission"],
            &EmergencyLeavePermission {
                can_apply_emergency_leave: allowed,
            },
        )
        .await?;
        info!(employee_id, allowed, "Emergency leave permission changed");
        Ok(())
    }

    // Notifications

    /// `GET /notifications`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport, status or decode failure.
    pub async fn notifications(&self) -> ClientResult<Vec<Notification>> {
        self.get_list(&["notifications"]).await
    }

    /// `PUT /notifications`: mark everything as read.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the request fails.
    pub async fn mark_notifications_read(&self) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &["notifications"],
            &serde_json::json!({ "read": true }),
        )
        .await
    }

    // Files

    /// `GET /employees/files/:fileId`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the request fails.
    pub async fn download_file(&self, file_id: &str) -> ClientResult<Download> {
        let url = self.endpoint(&["employees", "files", file_id])?;
        let response = self.send(self.http.get(url)).await?;

        let headers = response.headers();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename);
        let mime_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        debug!(file_id, size = bytes.len(), "File downloaded");
        Ok(Download {
            bytes,
            file_name,
            mime_type,
        })
    }
}

/// Resolve a picker URI to a local path. Accepts `file://` URIs and plain paths.
#[must_use]
pub fn local_path(uri: &str) -> PathBuf {
    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .unwrap_or_else(|()| PathBuf::from(url.path())),
        _ => PathBuf::from(uri),
    }
}

/// Extract the file name from a `Content-Disposition` header value.
#[must_use]
pub fn content_disposition_filename(header: &str) -> Option<String> {
    FILENAME_RE
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

async fn attach_files(mut form: Form, files: &[WireFile]) -> ClientResult<Form> {
    for file in files {
        let path = local_path(&file.uri);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ClientError::Io {
                path: path.display().to_string(),
                source,
            })?;
        debug!(field = file.field, name = %file.file_name, size = bytes.len(), "Attaching file");
        let part = Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        form = form.part(file.field, part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HrClient {
        HrClient::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let c = client("http://localhost:5000/api/");
        assert_eq!(
            c.endpoint(&["leaves", "L1", "approve"]).unwrap().as_str(),
            "http://localhost:5000/api/leaves/L1/approve"
        );

        let c = client("http://localhost:5000/api");
        assert_eq!(
            c.endpoint(&["employees", "files", "F 1"]).unwrap().as_str(),
            "http://localhost:5000/api/employees/files/F%201"
        );
    }

    #[test]
    fn test_rejects_opaque_base_url() {
        let err = HrClient::new(Url::parse("mailto:hr@example.com").unwrap(), Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_local_path_strips_file_scheme() {
        assert_eq!(local_path("file:///tmp/scan.pdf"), PathBuf::from("/tmp/scan.pdf"));
        assert_eq!(local_path("/tmp/scan.pdf"), PathBuf::from("/tmp/scan.pdf"));
        assert_eq!(local_path("docs/ticket.png"), PathBuf::from("docs/ticket.png"));
    }

    #[test]
    fn test_content_disposition_filename() {
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="cert.pdf""#).as_deref(),
            Some("cert.pdf")
        );
        assert_eq!(
            content_disposition_filename("inline; filename*=UTF-8''report.png").as_deref(),
            Some("report.png")
        );
        assert!(content_disposition_filename("inline").is_none());
    }

    #[tokio::test]
    async fn test_requests_need_a_session() {
        let c = client("http://127.0.0.1:9/api/");
        assert!(!c.has_session().await);
        let err = c.list_leaves().await.unwrap_err();
        assert!(matches!(err, ClientError::NoSession));

        c.set_token("abc").await;
        assert!(c.has_session().await);
        c.clear_session().await;
        assert!(!c.has_session().await);
    }

    #[tokio::test]
    async fn test_missing_attachment_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = WireFile {
            field: "supportingDocuments",
            uri: dir.path().join("absent.pdf").display().to_string(),
            file_name: "absent.pdf".into(),
            mime_type: "application/pdf".into(),
        };
        let err = attach_files(Form::new(), &[file]).await.unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }
}
