//! Curio Server
//!
//! HTTP API that turns a topic into a generated course, keeping the upstream
//! credentials on the server side.

pub mod api;
pub mod config;
pub mod error;

pub use api::{
    create_router, AppState, ErrorResponse, GenerateCurriculumRequest, GenerateDeepDiveRequest,
    HealthResponse,
};
pub use config::{Config, UpstreamConfig, CONFIG_FILE_NAME};
pub use error::{CurioError, Result};
