//! Course generation on top of a completion backend.

use std::fmt;

use async_trait::async_trait;
use curio_course::{extract_json, Curriculum, DeepDiveTopics, DifficultyLevel};
use tracing::{debug, info};

use crate::error::{GatewayError, Result};
use crate::prompt::{curriculum_prompt, deep_dive_prompt, SYSTEM_PROMPT};
use crate::upstream::CompletionBackend;

/// Anything that can produce course content for a learner.
///
/// Implemented by [`Gateway`] (talks to the text-generation service directly)
/// and by [`crate::ProxyClient`] (goes through a Curio server).
#[async_trait]
pub trait CourseSource: Send + Sync + fmt::Debug {
    /// Generates a full course module for `topic`.
    async fn generate_curriculum(
        &self,
        topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<Curriculum>;

    /// Suggests follow-up topics after a strong quiz result.
    async fn generate_deep_dive(
        &self,
        current_topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<Vec<String>>;
}

/// Builds prompts, calls the backend once per request and parses the reply.
///
/// No retries and no caching: every call is exactly one outbound request.
#[derive(Debug, Clone)]
pub struct Gateway<B> {
    backend: B,
}

impl<B: CompletionBackend> Gateway<B> {
    /// Wraps a completion backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

fn require_topic<'a>(topic: &'a str, field: &str) -> Result<&'a str> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(GatewayError::invalid_input(format!("{field} must not be empty")));
    }
    Ok(topic)
}

#[async_trait]
impl<B: CompletionBackend> CourseSource for Gateway<B> {
    async fn generate_curriculum(
        &self,
        topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<Curriculum> {
        let topic = require_topic(topic, "topic")?;
        info!(topic, difficulty = %difficulty, "Generating curriculum");

        let raw = self
            .backend
            .complete(SYSTEM_PROMPT, &curriculum_prompt(topic, difficulty))
            .await?;
        let curriculum: Curriculum = extract_json(&raw)?;

        for finding in curriculum.lenient_findings() {
            debug!(topic, %finding, "Accepted curriculum with lenient finding");
        }

        info!(
            topic,
            concepts = curriculum.concepts.len(),
            nodes = curriculum.flowchart.nodes.len(),
            questions = curriculum.quiz.len(),
            "Curriculum generated"
        );
        Ok(curriculum)
    }

    async fn generate_deep_dive(
        &self,
        current_topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<Vec<String>> {
        let current_topic = require_topic(current_topic, "currentTopic")?;
        info!(current_topic, difficulty = %difficulty, "Generating deep-dive topics");

        let raw = self
            .backend
            .complete(SYSTEM_PROMPT, &deep_dive_prompt(current_topic, difficulty))
            .await?;
        let DeepDiveTopics { topics } = extract_json(&raw)?;

        info!(current_topic, count = topics.len(), "Deep-dive topics generated");
        Ok(topics)
    }
}
