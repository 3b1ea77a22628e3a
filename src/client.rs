use crate::engine::models::{ActivityDetail, ActivitySummary};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use ureq::{Agent, Request};

pub const DEFAULT_BASE_URL: &str = "https://intervals.icu";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Unexpected status code {code} from {resource}")]
    Status { code: u16, resource: String },

    #[error("Transport error: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    #[error("Could not decode response: {0}")]
    Decode(#[from] std::io::Error),
}

impl ClientError {
    fn from_ureq(err: ureq::Error, resource: &str) -> Self {
        match err {
            ureq::Error::Status(404, _) => ClientError::NotFound {
                resource: resource.to_string(),
            },
            ureq::Error::Status(code, _) => ClientError::Status {
                code,
                resource: resource.to_string(),
            },
            ureq::Error::Transport(t) => ClientError::Transport(Box::new(t)),
        }
    }
}

/// Where activities come from and where decisions are applied.
pub trait ActivitySource: Sync {
    /// Activities whose start date lies within `oldest..=newest`.
    fn list_activities(
        &self,
        oldest: NaiveDate,
        newest: NaiveDate,
    ) -> Result<Vec<ActivitySummary>, ClientError>;

    fn get_activity_detail(&self, id: &str) -> Result<ActivityDetail, ClientError>;

    fn update_activity(&self, id: &str, fields: &Map<String, Value>) -> Result<(), ClientError>;

    fn delete_activity(&self, id: &str) -> Result<(), ClientError>;
}

/// Blocking Intervals.icu API client.
pub struct IntervalsClient {
    agent: Agent,
    base_url: String,
    athlete_id: String,
    auth_header: String,
}

impl IntervalsClient {
    pub fn new(api_key: &str, athlete_id: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: DEFAULT_BASE_URL.to_string(),
            athlete_id: athlete_id.to_string(),
            auth_header: basic_auth_header(api_key),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: &str, path: &str) -> Request {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "intervals request");
        self.agent
            .request(method, &url)
            .set("Authorization", &self.auth_header)
    }

    fn get_json<T: DeserializeOwned>(&self, request: Request, resource: &str) -> Result<T, ClientError> {
        let response = request
            .call()
            .map_err(|e| ClientError::from_ureq(e, resource))?;
        Ok(response.into_json()?)
    }
}

impl ActivitySource for IntervalsClient {
    fn list_activities(
        &self,
        oldest: NaiveDate,
        newest: NaiveDate,
    ) -> Result<Vec<ActivitySummary>, ClientError> {
        let path = format!("/api/v1/athlete/{}/activities", self.athlete_id);
        let request = self
            .request("GET", &path)
            .query("oldest", &oldest.format("%Y-%m-%d").to_string())
            .query("newest", &newest.format("%Y-%m-%d").to_string());
        self.get_json(request, &format!("athlete {}", self.athlete_id))
    }

    fn get_activity_detail(&self, id: &str) -> Result<ActivityDetail, ClientError> {
        let request = self.request("GET", &format!("/api/v1/activity/{id}"));
        self.get_json(request, &format!("activity {id}"))
    }

    fn update_activity(&self, id: &str, fields: &Map<String, Value>) -> Result<(), ClientError> {
        self.request("PUT", &format!("/api/v1/activity/{id}"))
            .send_json(Value::Object(fields.clone()))
            .map_err(|e| ClientError::from_ureq(e, &format!("activity {id}")))?;
        Ok(())
    }

    fn delete_activity(&self, id: &str) -> Result<(), ClientError> {
        self.request("DELETE", &format!("/api/v1/activity/{id}"))
            .call()
            .map_err(|e| ClientError::from_ureq(e, &format!("activity {id}")))?;
        Ok(())
    }
}

/// Intervals.icu takes the literal user `API_KEY` with the key as password.
fn basic_auth_header(api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("API_KEY:{api_key}")))
}
