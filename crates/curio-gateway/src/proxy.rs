//! Client for a running Curio server.
//!
//! The learner side never holds upstream credentials; it talks to the server's
//! `/api/generate-*` endpoints instead.

use std::time::Duration;

use async_trait::async_trait;
use curio_course::{Curriculum, DeepDiveTopics, DifficultyLevel};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};
use crate::gateway::CourseSource;

#[derive(Debug, Serialize)]
struct CurriculumBody<'a> {
    topic: &'a str,
    difficulty: DifficultyLevel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeepDiveBody<'a> {
    current_topic: &'a str,
    difficulty: DifficultyLevel,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`CourseSource`] backed by a Curio server's HTTP API.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// The server this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "Posting to Curio server");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map_or(text, |body| body.error);
            warn!(status = status.as_u16(), %message, "Curio server returned an error");
            return Err(GatewayError::upstream(status.as_u16(), message));
        }

        serde_json::from_str(&text).map_err(|e| GatewayError::InvalidEnvelope(e.to_string()))
    }
}

#[async_trait]
impl CourseSource for ProxyClient {
    async fn generate_curriculum(
        &self,
        topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<Curriculum> {
        self.post(
            "/api/generate-curriculum",
            &CurriculumBody { topic, difficulty },
        )
        .await
    }

    async fn generate_deep_dive(
        &self,
        current_topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<Vec<String>> {
        let DeepDiveTopics { topics } = self
            .post(
                "/api/generate-deep-dive",
                &DeepDiveBody {
                    current_topic,
                    difficulty,
                },
            )
            .await?;
        Ok(topics)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ProxyClient::new("http://127.0.0.1:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_request_bodies_use_labels_and_camel_case() {
        let body = serde_json::to_value(DeepDiveBody {
            current_topic: "Engines",
            difficulty: DifficultyLevel::Teenager,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"currentTopic": "Engines", "difficulty": "High School Student"})
        );

        let body = serde_json::to_value(CurriculumBody {
            topic: "Tides",
            difficulty: DifficultyLevel::Child,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"topic": "Tides", "difficulty": "5 Year Old (ELI5)"})
        );
    }
}
