use std::env;

use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::models::SleepEnvelope;

const GARMIN_API_BASE: &str = "https://connectapi.garmin.com";

#[derive(Debug, Clone)]
pub struct GarminConfig {
    pub email: String,
    pub password: String,
}

impl GarminConfig {
    pub fn from_env() -> Result<Self, GarminError> {
        Ok(Self {
            email: env::var("GARMIN_EMAIL")
                .map_err(|_| GarminError::MissingConfig("GARMIN_EMAIL".into()))?,
            password: env::var("GARMIN_PASSWORD")
                .map_err(|_| GarminError::MissingConfig("GARMIN_PASSWORD".into()))?,
        })
    }
}

#[derive(Debug, Error)]
pub enum GarminError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Authentication failed")]
    Authentication,

    #[error("Too many requests")]
    RateLimited,

    #[error("Not authenticated with Garmin Connect")]
    NotAuthenticated,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<reqwest::Error> for GarminError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GarminError::MalformedPayload(err.to_string())
        } else {
            GarminError::Connection(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct SigninResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialProfile {
    display_name: Option<String>,
    full_name: Option<String>,
}

/// Authenticated Garmin Connect session.
///
/// `login` must succeed before any data fetch; the per-day sleep endpoint is
/// keyed by the profile's display name, which login captures alongside the
/// session token.
pub struct GarminClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    display_name: Option<String>,
    full_name: Option<String>,
}

impl GarminClient {
    pub fn new() -> Self {
        Self::with_base_url(GARMIN_API_BASE)
    }

    /// Point the client at a different host, e.g. the garmin.cn domain.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            token: None,
            display_name: None,
            full_name: None,
        }
    }

    pub async fn login(&mut self, config: &GarminConfig) -> Result<(), GarminError> {
        let response = self
            .http
            .post(format!("{}/signin", self.base_url))
            .form(&[
                ("username", config.email.as_str()),
                ("password", config.password.as_str()),
            ])
            .send()
            .await?;

        let response = check(response).await?;
        let session: SigninResponse = response.json().await?;
        self.token = Some(session.access_token);

        let profile = self.social_profile().await?;
        self.display_name = profile.display_name;
        self.full_name = profile.full_name;
        Ok(())
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Fetch one calendar date's sleep payload.
    ///
    /// `Ok(None)` means Garmin has no sleep data for that date; only
    /// transport, authentication, and decoding problems are errors.
    pub async fn daily_sleep(
        &self,
        date: NaiveDate,
    ) -> Result<Option<SleepEnvelope>, GarminError> {
        let token = self.token.as_deref().ok_or(GarminError::NotAuthenticated)?;
        let display_name = self
            .display_name
            .as_deref()
            .ok_or(GarminError::NotAuthenticated)?;

        let url = format!(
            "{}/wellness-service/wellness/dailySleepData/{}",
            self.base_url, display_name
        );
        let response = self
            .http
            .get(&url)
            .query(&[
                ("date", date.format("%Y-%m-%d").to_string()),
                ("nonSleepBufferMinutes", "60".to_string()),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check(response).await?;
        let envelope: Option<SleepEnvelope> = response.json().await?;
        Ok(envelope)
    }

    async fn social_profile(&self) -> Result<SocialProfile, GarminError> {
        let token = self.token.as_deref().ok_or(GarminError::NotAuthenticated)?;
        let response = self
            .http
            .get(format!("{}/userprofile-service/socialProfile", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        let response = check(response).await?;
        Ok(response.json().await?)
    }
}

impl Default for GarminClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check(response: Response) -> Result<Response, GarminError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GarminError::Authentication),
        StatusCode::TOO_MANY_REQUESTS => Err(GarminError::RateLimited),
        StatusCode::NOT_FOUND => Err(GarminError::NotFound(response.url().path().to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(GarminError::Api(status.as_u16(), body))
        }
    }
}
