use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::app::ports::{AuthPort, EmployeeDirectoryPort};
use crate::config::Credentials;
use crate::constants::{AUTH_PATH, EMPLOYEES_PATH};
use crate::domain::EmployeeList;
use crate::error::{Result, SourceError};

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    data: Option<AuthData>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    #[serde(default)]
    token: Option<String>,
}

impl AuthResponse {
    fn into_token(self) -> Result<String> {
        self.data
            .and_then(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SourceError::MissingField("data.token".to_string()))
    }
}

/// Personio REST client for the auth and employee-list endpoints.
pub struct PersonioClient {
    client: reqwest::Client,
    base_url: String,
}

impl PersonioClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthPort for PersonioClient {
    #[instrument(skip(self, credentials))]
    async fn get_token(&self, credentials: &Credentials) -> Result<String> {
        let resp = self
            .client
            .post(self.url(AUTH_PATH))
            .query(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Api {
                message: format!("auth endpoint returned {}", status),
            });
        }
        let body: AuthResponse = resp.json().await?;
        let token = body.into_token()?;
        debug!("Obtained Personio auth token");
        Ok(format!("Bearer {}", token))
    }
}

#[async_trait]
impl EmployeeDirectoryPort for PersonioClient {
    #[instrument(skip(self, auth_header))]
    async fn list_employees(&self, auth_header: Option<&str>) -> Result<EmployeeList> {
        let mut request = self
            .client
            .get(self.url(EMPLOYEES_PATH))
            .header(ACCEPT, "application/json");
        if let Some(header) = auth_header {
            request = request.header(AUTHORIZATION, header);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Api {
                message: format!("employee list returned {}", status),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
