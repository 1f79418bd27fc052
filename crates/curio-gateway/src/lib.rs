//! Curio Gateway
//!
//! Course generation against a chat-completions service, a client for a
//! running Curio server, and the learner-side session state.
//!
//! # Modules
//!
//! - [`upstream`]: HTTP client for the text-generation service
//! - [`gateway`]: prompt, call, parse; the [`CourseSource`] seam
//! - [`proxy`]: [`CourseSource`] over a Curio server's HTTP API
//! - [`session`]: learner status, tickets and the quiz/deep-dive flow

pub mod error;
pub mod gateway;
pub mod prompt;
pub mod proxy;
pub mod session;
pub mod upstream;

pub use error::{GatewayError, Result};
pub use gateway::{CourseSource, Gateway};
pub use prompt::{curriculum_prompt, deep_dive_prompt, SYSTEM_PROMPT};
pub use proxy::ProxyClient;
pub use session::{
    ActiveView, AppStatus, GenerationTicket, LearnerSession, SessionError, GENERATION_FAILED,
};
pub use upstream::{CompletionBackend, UpstreamClient};
