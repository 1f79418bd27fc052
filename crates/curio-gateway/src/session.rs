//! Learner-side application state.
//!
//! A [`LearnerSession`] owns the current curriculum and quiz. Status moves
//! through:
//!
//! - `Idle` -> `Generating` on a new topic
//! - `Generating` -> `Ready` (curriculum arrived) or `Error` (request failed)
//! - `Ready` -> `Generating` when a deep-dive topic is picked
//! - any -> `Idle` on reset
//!
//! Generation is split into [`LearnerSession::begin_generation`] and
//! [`LearnerSession::complete_generation`] so the request itself can run
//! without holding the session. Each request carries a [`GenerationTicket`];
//! a response whose ticket is no longer the pending one is dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use curio_course::{
    AdvanceOutcome, Curriculum, DeepDiveRequest, DifficultyLevel, QuizSession, SelectOutcome,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::gateway::CourseSource;

/// Message shown to the learner when generation fails.
pub const GENERATION_FAILED: &str = "Failed to generate curriculum. Please try again.";

// ============================================================================
// AppStatus
// ============================================================================

/// Top-level status of the learner session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    /// Waiting for a topic.
    #[default]
    Idle,
    /// A curriculum request is in flight.
    Generating,
    /// A curriculum is loaded.
    Ready,
    /// The last request failed.
    Error,
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Generating => write!(f, "generating"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Which part of the loaded course is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    /// Concept cards.
    #[default]
    Concepts,
    /// Flowchart.
    Flowchart,
    /// Quiz.
    Quiz,
}

// ============================================================================
// Tickets and errors
// ============================================================================

/// Handle for one in-flight curriculum request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    id: u64,
    /// Topic requested.
    pub topic: String,
    /// Audience requested.
    pub difficulty: DifficultyLevel,
    /// When the request was issued.
    pub issued_at: DateTime<Utc>,
}

impl GenerationTicket {
    /// Monotonic request number within the session.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// Reasons a generation request is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The topic was empty or whitespace.
    #[error("Enter a topic to learn about")]
    EmptyTopic,

    /// Another curriculum request is still running.
    #[error("A curriculum is already being generated")]
    AlreadyGenerating,
}

// ============================================================================
// LearnerSession
// ============================================================================

/// Client-side state for one learner. Never persisted.
#[derive(Debug, Default)]
pub struct LearnerSession {
    status: AppStatus,
    difficulty: DifficultyLevel,
    curriculum: Option<Curriculum>,
    quiz: Option<QuizSession>,
    view: ActiveView,
    error: Option<String>,
    last_ticket: u64,
    pending: Option<u64>,
    deep_dive: Option<DeepDiveRequest>,
}

impl LearnerSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> AppStatus {
        self.status
    }

    /// Audience used for the current and next requests.
    #[must_use]
    pub const fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    /// Changes the audience for subsequent requests.
    pub fn set_difficulty(&mut self, difficulty: DifficultyLevel) {
        self.difficulty = difficulty;
    }

    /// Loaded curriculum, present only when `Ready`.
    #[must_use]
    pub const fn curriculum(&self) -> Option<&Curriculum> {
        self.curriculum.as_ref()
    }

    /// Quiz state for the loaded curriculum.
    #[must_use]
    pub const fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    /// Learner-facing error message, present only in `Error`.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current view.
    #[must_use]
    pub const fn view(&self) -> ActiveView {
        self.view
    }

    /// Switches view. Ignored unless a curriculum is loaded.
    pub fn set_view(&mut self, view: ActiveView) {
        if self.status == AppStatus::Ready {
            self.view = view;
        }
    }

    /// Starts a curriculum request.
    ///
    /// Clears any loaded curriculum and quiz. The returned ticket must be handed
    /// back to [`Self::complete_generation`] with the result.
    pub fn begin_generation(
        &mut self,
        topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<GenerationTicket, SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        if self.status == AppStatus::Generating {
            return Err(SessionError::AlreadyGenerating);
        }

        self.last_ticket += 1;
        self.pending = Some(self.last_ticket);
        self.difficulty = difficulty;
        self.status = AppStatus::Generating;
        self.curriculum = None;
        self.quiz = None;
        self.deep_dive = None;
        self.error = None;

        info!(ticket = self.last_ticket, topic, difficulty = %difficulty, "Generation started");

        Ok(GenerationTicket {
            id: self.last_ticket,
            topic: topic.to_string(),
            difficulty,
            issued_at: Utc::now(),
        })
    }

    /// Applies the result of a curriculum request.
    ///
    /// Returns `false` and leaves the session untouched if the ticket is stale.
    pub fn complete_generation(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<Curriculum, GatewayError>,
    ) -> bool {
        if self.pending != Some(ticket.id) {
            debug!(
                ticket = ticket.id,
                pending = ?self.pending,
                "Discarding stale generation result"
            );
            return false;
        }
        self.pending = None;

        let elapsed_ms = (Utc::now() - ticket.issued_at).num_milliseconds();
        match result {
            Ok(curriculum) => {
                info!(
                    ticket = ticket.id,
                    topic = %curriculum.topic,
                    elapsed_ms,
                    "Curriculum ready"
                );
                self.quiz = Some(QuizSession::new(
                    curriculum.topic.clone(),
                    ticket.difficulty,
                    curriculum.quiz.clone(),
                ));
                self.curriculum = Some(curriculum);
                self.view = ActiveView::Concepts;
                self.status = AppStatus::Ready;
            }
            Err(err) => {
                warn!(ticket = ticket.id, error = %err, elapsed_ms, "Curriculum generation failed");
                self.error = Some(GENERATION_FAILED.to_string());
                self.status = AppStatus::Error;
            }
        }
        true
    }

    /// Returns to `Idle`, dropping the curriculum and any pending request.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.pending.take() {
            debug!(ticket, "Pending generation invalidated by reset");
        }
        self.status = AppStatus::Idle;
        self.curriculum = None;
        self.quiz = None;
        self.deep_dive = None;
        self.error = None;
        self.view = ActiveView::Concepts;
    }

    /// Starts a new curriculum for a suggested follow-up topic.
    ///
    /// Uses the session's current difficulty.
    pub fn select_deep_dive(&mut self, topic: &str) -> Result<GenerationTicket, SessionError> {
        info!(topic, "Deep-dive topic selected");
        self.begin_generation(topic, self.difficulty)
    }

    /// Records an answer on the current quiz question.
    pub fn select_answer(&mut self, option: usize) -> SelectOutcome {
        self.quiz
            .as_mut()
            .map_or(SelectOutcome::Ignored, |quiz| quiz.select(option))
    }

    /// Moves the quiz forward. A deep-dive request, if the summary fires one,
    /// is kept for [`Self::run_deep_dive`].
    pub fn advance_quiz(&mut self) -> AdvanceOutcome {
        let Some(quiz) = self.quiz.as_mut() else {
            return AdvanceOutcome::Ignored;
        };
        let outcome = quiz.advance();
        if let AdvanceOutcome::Summary(Some(request)) = &outcome {
            info!(
                topic = %request.topic,
                percentage = quiz.percentage(),
                "Quiz passed, deep-dive suggestions requested"
            );
            self.deep_dive = Some(request.clone());
        }
        outcome
    }

    /// Restarts the quiz and forgets any deep-dive request.
    pub fn restart_quiz(&mut self) {
        if let Some(quiz) = self.quiz.as_mut() {
            quiz.restart();
        }
        self.deep_dive = None;
    }

    /// Returns `true` if a deep-dive fetch is waiting to run.
    #[must_use]
    pub const fn has_pending_deep_dive(&self) -> bool {
        self.deep_dive.is_some()
    }

    /// Runs one curriculum round trip against `source`.
    pub async fn run_generation(
        &mut self,
        source: &dyn CourseSource,
        topic: &str,
        difficulty: DifficultyLevel,
    ) -> Result<AppStatus, SessionError> {
        let ticket = self.begin_generation(topic, difficulty)?;
        Ok(self.fulfil(source, &ticket).await)
    }

    /// Fetches the curriculum for an issued ticket and applies it.
    pub async fn fulfil(
        &mut self,
        source: &dyn CourseSource,
        ticket: &GenerationTicket,
    ) -> AppStatus {
        let result = source
            .generate_curriculum(&ticket.topic, ticket.difficulty)
            .await;
        self.complete_generation(ticket, result);
        self.status
    }

    /// Runs the pending deep-dive fetch, if any.
    ///
    /// Failures are logged and leave the summary without suggestions. Returns
    /// `true` if a fetch was attempted.
    pub async fn run_deep_dive(&mut self, source: &dyn CourseSource) -> bool {
        let Some(request) = self.deep_dive.take() else {
            return false;
        };

        let result = source
            .generate_deep_dive(&request.topic, request.difficulty)
            .await;
        if let Err(err) = &result {
            warn!(
                topic = %request.topic,
                transient = err.is_transient(),
                error = %err,
                "Deep-dive suggestions unavailable"
            );
        }

        let applied = self
            .quiz
            .as_mut()
            .is_some_and(|quiz| quiz.resolve_deep_dive(&request, result));
        if !applied {
            debug!(topic = %request.topic, "Discarding stale deep-dive result");
        }
        true
    }
}
