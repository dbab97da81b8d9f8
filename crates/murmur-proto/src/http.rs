//! HTTP collaborator contracts.
//!
//! The chat core consumes three plain HTTP endpoints next to the persistent
//! connection. Only their request/response bodies live here; executing the
//! requests is the driver's job.
//!
//! | Endpoint                 | Request                 | Success           |
//! |--------------------------|-------------------------|-------------------|
//! | `GET /get-ip`            | -                       | [`ServerIpResponse`] |
//! | `POST /change_username`  | [`UsernameChangeRequest`] | any 2xx JSON    |
//! | `POST /upload`           | [`UploadRequest`]       | any 2xx JSON      |
//!
//! Failures carry an [`ErrorBody`] when the server provides one.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{
    UsernameChangePayload,
    errors::{ProtocolError, Result},
};

/// Path of the endpoint discovery request.
pub const GET_IP_PATH: &str = "/get-ip";

/// Path of the username change request.
pub const CHANGE_USERNAME_PATH: &str = "/change_username";

/// Path of the upload request.
pub const UPLOAD_PATH: &str = "/upload";

/// Default port of the persistent connection.
pub const DEFAULT_WS_PORT: u16 = 8080;

/// Default path of the persistent connection.
pub const DEFAULT_WS_PATH: &str = "/ws/";

/// Response of `GET /get-ip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIpResponse {
    /// Host the persistent connection should be opened against.
    pub ip: String,
}

/// Body of `POST /change_username`.
///
/// Wrapped in the same single-key shape as a wire envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameChangeRequest {
    /// The requested change.
    #[serde(rename = "UsernameChange")]
    pub change: UsernameChangePayload,
}

impl UsernameChangeRequest {
    /// Request a new display name for `sender_id`.
    pub fn new(sender_id: impl Into<String>, new_username: impl Into<String>) -> Self {
        Self {
            change: UsernameChangePayload {
                new_username: new_username.into(),
                sender_id: sender_id.into(),
            },
        }
    }
}

/// Error body returned by the HTTP collaborators on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
}

/// Body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Original file name.
    pub filename: String,
    /// File contents, standard base64 without a data-URL prefix.
    pub data: String,
}

impl UploadRequest {
    /// Build an upload body from raw file bytes.
    pub fn from_bytes(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self { filename: filename.into(), data: STANDARD.encode(bytes) }
    }

    /// Decode the file contents.
    pub fn decode_data(&self) -> Result<Vec<u8>> {
        STANDARD.decode(&self.data).map_err(|e| ProtocolError::InvalidBase64(e.to_string()))
    }
}

/// URL of the persistent connection for a discovered host.
pub fn websocket_url(ip: &str, port: u16, path: &str) -> String {
    format!("ws://{ip}:{port}{path}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn username_change_request_uses_envelope_shape() {
        let request = UsernameChangeRequest::new("u1", "bob");
        let text = serde_json::to_string(&request).unwrap();

        assert_eq!(text, r#"{"UsernameChange":{"new_username":"bob","sender_id":"u1"}}"#);
    }

    #[test]
    fn upload_data_is_plain_base64() {
        let request = UploadRequest::from_bytes("cat.png", b"\x89PNG");

        assert_eq!(request.data, "iVBORw==");
        assert_eq!(request.decode_data().unwrap(), b"\x89PNG");
    }

    #[test]
    fn upload_rejects_bad_base64() {
        let request = UploadRequest { filename: "x".into(), data: "***".into() };
        assert!(matches!(request.decode_data(), Err(ProtocolError::InvalidBase64(_))));
    }

    #[test]
    fn default_websocket_url() {
        assert_eq!(
            websocket_url("10.0.0.5", DEFAULT_WS_PORT, DEFAULT_WS_PATH),
            "ws://10.0.0.5:8080/ws/"
        );
    }

    #[test]
    fn error_body_parses() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"name taken"}"#).unwrap();
        assert_eq!(body.error, "name taken");
    }
}
