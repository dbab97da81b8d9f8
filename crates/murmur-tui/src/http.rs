//! HTTP collaborators: endpoint discovery, username change and upload.

use murmur_app::RequestOutcome;
use murmur_proto::http::{
    CHANGE_USERNAME_PATH, ErrorBody, GET_IP_PATH, ServerIpResponse, UPLOAD_PATH, UploadRequest,
    UsernameChangeRequest,
};
use reqwest::RequestBuilder;

use crate::transport::TransportError;

/// Client for the server's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client for the server at `base_url`, e.g.
    /// `http://127.0.0.1:8080`.
    pub fn new(base_url: &str) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Ask the server which address to open the WebSocket on.
    pub async fn server_ip(&self) -> Result<String, TransportError> {
        let response = self.client.get(self.url(GET_IP_PATH)).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<ServerIpResponse>().await?.ip)
    }

    /// Request a display name change.
    pub async fn change_username(&self, request: &UsernameChangeRequest) -> RequestOutcome {
        self.outcome(self.client.post(self.url(CHANGE_USERNAME_PATH)).json(request)).await
    }

    /// Upload a file.
    pub async fn upload(&self, request: &UploadRequest) -> RequestOutcome {
        self.outcome(self.client.post(self.url(UPLOAD_PATH)).json(request)).await
    }

    async fn outcome(&self, request: RequestBuilder) -> RequestOutcome {
        let result = match request.send().await {
            Ok(response) => Self::check(response).await.map(drop),
            Err(e) => Err(TransportError::Http(e)),
        };

        match result {
            Ok(()) => RequestOutcome::Succeeded,
            Err(e) => {
                tracing::warn!(error = %e, "request failed");
                RequestOutcome::Failed { reason: e.to_string() }
            },
        }
    }

    /// Turn an error status into [`TransportError::Status`], reading the
    /// server's `{"error": ...}` body when there is one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let fallback = status.canonical_reason().unwrap_or("request failed").to_string();
        let reason = match response.json::<ErrorBody>().await {
            Ok(body) if !body.error.is_empty() => body.error,
            _ => fallback,
        };
        Err(TransportError::Status { status: status.as_u16(), reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = HttpClient::new("http://10.0.0.5:8080/");
        assert_eq!(client.base_url(), "http://10.0.0.5:8080");
        assert_eq!(client.url(GET_IP_PATH), "http://10.0.0.5:8080/get-ip");
    }
}
