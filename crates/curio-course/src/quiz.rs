//! Quiz progression state machine.
//!
//! A [`QuizSession`] walks through a fixed list of questions:
//!
//! - `Answering` -> `Revealed` on the first option selected for a question
//! - `Revealed` -> `Answering` (next question) or `Summary` (last question) on advance
//! - any phase -> `Answering` at question 0 on restart
//!
//! Entering `Summary` with a score strictly above [`DEEP_DIVE_THRESHOLD`]
//! percent emits a single [`DeepDiveRequest`]. The session never performs the
//! fetch itself; the caller runs it and reports back through
//! [`QuizSession::resolve_deep_dive`].

use std::fmt;

use serde::Serialize;

use crate::difficulty::DifficultyLevel;
use crate::model::QuizQuestion;

/// Percentage a learner must exceed to unlock deep-dive suggestions.
pub const DEEP_DIVE_THRESHOLD: u32 = 80;

// ============================================================================
// Phases and outcomes
// ============================================================================

/// Where the session currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    /// Waiting for an option on the current question.
    #[default]
    Answering,
    /// An option was chosen; correctness and explanation are visible.
    Revealed,
    /// All questions are done.
    Summary,
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answering => write!(f, "answering"),
            Self::Revealed => write!(f, "revealed"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

/// Result of selecting an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The selection was recorded and was correct.
    Correct,
    /// The selection was recorded and was wrong.
    Incorrect,
    /// The selection was ignored (already answered, or not answering).
    Ignored,
}

/// Result of advancing past a revealed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved on to the next question.
    NextQuestion,
    /// Reached the summary. Carries the deep-dive request if it fired.
    Summary(Option<DeepDiveRequest>),
    /// Nothing happened (no question revealed).
    Ignored,
}

/// Progress of the follow-up topic fetch for the current summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "topics", rename_all = "snake_case")]
pub enum DeepDiveState {
    /// No fetch attempted for this summary.
    #[default]
    NotRequested,
    /// A fetch is in flight.
    Pending,
    /// Suggestions arrived (possibly none).
    Ready(Vec<String>),
    /// The fetch failed; the summary shows no suggestions.
    Failed,
}

/// A request to fetch follow-up topics, emitted at most once per summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepDiveRequest {
    /// Identifies the summary instance this request belongs to.
    pub attempt: u64,
    /// The topic just completed.
    pub topic: String,
    /// Audience for the suggestions.
    pub difficulty: DifficultyLevel,
}

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizProgress {
    /// Current phase.
    pub phase: QuizPhase,
    /// 1-based question number (0 when the quiz is empty).
    pub question_number: usize,
    /// Total number of questions.
    pub total: usize,
    /// Correct answers so far.
    pub score: u32,
    /// Rounded percentage of correct answers.
    pub percentage: u32,
    /// Selected option on the current question, if any.
    pub selected: Option<usize>,
    /// Deep-dive fetch progress.
    pub deep_dive: DeepDiveState,
}

// ============================================================================
// QuizSession
// ============================================================================

/// Ephemeral state of one quiz run. Never persisted.
#[derive(Debug, Clone)]
pub struct QuizSession {
    topic: String,
    difficulty: DifficultyLevel,
    questions: Vec<QuizQuestion>,
    current_index: usize,
    selected: Option<usize>,
    phase: QuizPhase,
    score: u32,
    answered: u32,
    deep_dive: DeepDiveState,
    attempt: u64,
}

impl QuizSession {
    /// Starts a session at question 0 with score 0.
    ///
    /// A session without questions starts in `Summary` and never triggers a
    /// deep dive.
    ///
    /// # Examples
    ///
    /// ```
    /// use curio_course::{DifficultyLevel, QuizPhase, QuizSession};
    ///
    /// let quiz = QuizSession::new("Engines", DifficultyLevel::Teenager, vec![]);
    /// assert_eq!(quiz.phase(), QuizPhase::Summary);
    /// assert_eq!(quiz.percentage(), 0);
    /// ```
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        difficulty: DifficultyLevel,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        let phase = if questions.is_empty() {
            QuizPhase::Summary
        } else {
            QuizPhase::Answering
        };
        Self {
            topic: topic.into(),
            difficulty,
            questions,
            current_index: 0,
            selected: None,
            phase,
            score: 0,
            answered: 0,
            deep_dive: DeepDiveState::NotRequested,
            attempt: 0,
        }
    }

    /// The topic this quiz belongs to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The audience of this quiz.
    #[must_use]
    pub const fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// 0-based index of the current question.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question being shown, or `None` in an empty quiz.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    /// Number of questions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Correct answers so far.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Questions answered so far.
    #[must_use]
    pub const fn answered(&self) -> u32 {
        self.answered
    }

    /// Option chosen on the current question, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Deep-dive fetch progress.
    #[must_use]
    pub const fn deep_dive(&self) -> &DeepDiveState {
        &self.deep_dive
    }

    /// Follow-up topics to offer, empty unless the fetch succeeded.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match &self.deep_dive {
            DeepDiveState::Ready(topics) => topics,
            _ => &[],
        }
    }

    /// `round(100 * score / total)`, or 0 for an empty quiz.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        let total = u64::try_from(self.questions.len()).unwrap_or(u64::MAX);
        if total == 0 {
            return 0;
        }
        // round half up in integer arithmetic
        let rounded = (200 * u64::from(self.score) + total) / (2 * total);
        u32::try_from(rounded).unwrap_or(u32::MAX)
    }

    /// Returns `true` if the current score unlocks deep-dive suggestions.
    #[must_use]
    pub fn qualifies_for_deep_dive(&self) -> bool {
        !self.questions.is_empty() && self.percentage() > DEEP_DIVE_THRESHOLD
    }

    /// Selects an option on the current question.
    ///
    /// Only the first selection per question counts; later ones are ignored,
    /// as is an index past the last option.
    pub fn select(&mut self, option: usize) -> SelectOutcome {
        if self.phase != QuizPhase::Answering {
            return SelectOutcome::Ignored;
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return SelectOutcome::Ignored;
        };
        if option >= question.options.len() {
            return SelectOutcome::Ignored;
        }

        let correct = question.is_correct(option);
        self.selected = Some(option);
        self.phase = QuizPhase::Revealed;
        self.answered += 1;

        if correct {
            self.score += 1;
            SelectOutcome::Correct
        } else {
            SelectOutcome::Incorrect
        }
    }

    /// Moves past a revealed question.
    ///
    /// Advancing from the last question enters `Summary` and evaluates the
    /// deep-dive trigger.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.phase != QuizPhase::Revealed {
            return AdvanceOutcome::Ignored;
        }

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.selected = None;
            self.phase = QuizPhase::Answering;
            AdvanceOutcome::NextQuestion
        } else {
            self.phase = QuizPhase::Summary;
            AdvanceOutcome::Summary(self.poll_deep_dive())
        }
    }

    /// Evaluates the deep-dive trigger for the current summary.
    ///
    /// Returns a request only when in `Summary`, above the threshold, and no
    /// fetch has been attempted yet since the last restart. Calling this again
    /// while a fetch is pending or after it resolved returns `None`.
    pub fn poll_deep_dive(&mut self) -> Option<DeepDiveRequest> {
        if self.phase != QuizPhase::Summary
            || self.deep_dive != DeepDiveState::NotRequested
            || !self.qualifies_for_deep_dive()
        {
            return None;
        }

        self.deep_dive = DeepDiveState::Pending;
        Some(DeepDiveRequest {
            attempt: self.attempt,
            topic: self.topic.clone(),
            difficulty: self.difficulty,
        })
    }

    /// Records the outcome of a deep-dive fetch.
    ///
    /// Results for a request issued before the last restart, or arriving when
    /// no fetch is pending, are discarded. Blank topics are dropped and the
    /// rest trimmed. Returns `true` if applied.
    pub fn resolve_deep_dive<E>(
        &mut self,
        request: &DeepDiveRequest,
        result: Result<Vec<String>, E>,
    ) -> bool {
        if request.attempt != self.attempt || self.deep_dive != DeepDiveState::Pending {
            return false;
        }
        self.deep_dive = match result {
            Ok(topics) => DeepDiveState::Ready(
                topics
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
            ),
            Err(_) => DeepDiveState::Failed,
        };
        true
    }

    /// Returns to question 0 with score 0 and no suggestions.
    pub fn restart(&mut self) {
        self.current_index = 0;
        self.selected = None;
        self.score = 0;
        self.answered = 0;
        self.deep_dive = DeepDiveState::NotRequested;
        self.attempt += 1;
        self.phase = if self.questions.is_empty() {
            QuizPhase::Summary
        } else {
            QuizPhase::Answering
        };
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            phase: self.phase,
            question_number: if self.questions.is_empty() {
                0
            } else {
                self.current_index + 1
            },
            total: self.questions.len(),
            score: self.score,
            percentage: self.percentage(),
            selected: self.selected,
            deep_dive: self.deep_dive.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
