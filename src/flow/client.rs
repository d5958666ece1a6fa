//! `reqwest` client for the hosted flow run endpoint.
//!
//! One POST per call. No timeout beyond the transport default.

use super::{FlowError, FlowRunner, GenerateRequest};

pub struct FlowClient {
    http: reqwest::Client,
    url: String,
}

impl FlowClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self, FlowError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| FlowError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: url.to_owned() })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl FlowRunner for FlowClient {
    async fn run(&self, token: &str, request: &GenerateRequest) -> Result<serde_json::Value, FlowError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| FlowError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FlowError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(FlowError::Remote { status: status.as_u16(), body: text });
        }

        parse_response(&text)
    }
}

fn parse_response(text: &str) -> Result<serde_json::Value, FlowError> {
    serde_json::from_str(text).map_err(|e| FlowError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
