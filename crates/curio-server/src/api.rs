//! HTTP API endpoints for the Curio server.
//!
//! The server holds the upstream credentials and exposes two generation
//! endpoints to learners.
//!
//! # Endpoints
//!
//! - `POST /api/generate-curriculum` - Generate a full course module
//! - `POST /api/generate-deep-dive` - Suggest follow-up topics
//! - `GET /api/health` - Liveness probe
//!
//! # Example
//!
//! ```no_run
//! use curio_server::{create_router, AppState, Config};
//!
//! # async fn example() -> curio_server::Result<()> {
//! let config = Config::load()?;
//! let listen = config.listen_address();
//! let router = create_router(AppState::from_config(config)?);
//! let listener = tokio::net::TcpListener::bind(listen).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use curio_course::{Curriculum, DeepDiveTopics, DifficultyLevel};
use curio_gateway::{CourseSource, Gateway, GatewayError, UpstreamClient};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{Config, Result};

const MISSING_TOPIC: &str = "Missing topic or difficulty";
const MISSING_CURRENT_TOPIC: &str = "Missing currentTopic or difficulty";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /api/generate-curriculum`.
///
/// Fields are optional so that absent values produce a 400 with a message
/// rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateCurriculumRequest {
    /// Subject to teach.
    pub topic: Option<String>,
    /// Audience label or short key.
    pub difficulty: Option<String>,
}

/// Request body for `POST /api/generate-deep-dive`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDeepDiveRequest {
    /// Topic the learner just completed.
    pub current_topic: Option<String>,
    /// Audience label or short key.
    pub difficulty: Option<String>,
}

/// Response body for the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Where course content comes from.
    pub source: Arc<dyn CourseSource>,
}

impl AppState {
    /// Creates a new `AppState` around an existing course source.
    #[must_use]
    pub fn new(config: Config, source: Arc<dyn CourseSource>) -> Self {
        Self { config, source }
    }

    /// Builds the upstream gateway described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `CurioError::MissingApiKey` if the key variable is unset, or a
    /// gateway error if the HTTP client cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        let api_key = config.api_key()?;
        let upstream = &config.upstream;
        let client = UpstreamClient::new(
            upstream.api_url.clone(),
            upstream.model.clone(),
            api_key,
            Duration::from_secs(upstream.timeout_secs),
        )?;

        info!(
            api_url = %client.api_url(),
            model = %client.model(),
            timeout_secs = upstream.timeout_secs,
            "Upstream gateway configured"
        );

        Ok(Self::new(config, Arc::new(Gateway::new(client))))
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// Malformed or incomplete request.
    BadRequest(String),
    /// Generation failed.
    Gateway(GatewayError),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Gateway(err) => {
                let status =
                    StatusCode::from_u16(err.status()).unwrap_or(StatusCode::BAD_GATEWAY);
                let transient = err.is_transient();
                if status.is_server_error() {
                    error!(status = status.as_u16(), transient, error = %err, "Generation failed");
                } else {
                    warn!(status = status.as_u16(), transient, error = %err, "Generation rejected");
                }
                (status, err.to_string())
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

/// Returns the trimmed value if present and non-blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_difficulty(value: &str) -> std::result::Result<DifficultyLevel, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown difficulty '{value}'")))
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries:
/// - All API routes under `/api`
/// - Permissive CORS so a browser client on another origin can call it
/// - Tracing middleware for request logging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/generate-curriculum",
            post(handle_generate_curriculum).fallback(method_not_allowed),
        )
        .route(
            "/generate-deep-dive",
            post(handle_generate_deep_dive).fallback(method_not_allowed),
        )
        .route("/health", get(handle_health));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Any method other than POST on a generation endpoint.
async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Method not allowed".to_string(),
        }),
    )
}

/// Handler for `POST /api/generate-curriculum`.
async fn handle_generate_curriculum(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerateCurriculumRequest>, JsonRejection>,
) -> std::result::Result<Json<Curriculum>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let (Some(topic), Some(difficulty)) = (non_blank(request.topic), non_blank(request.difficulty))
    else {
        warn!("Rejected curriculum request with missing fields");
        return Err(ApiError::BadRequest(MISSING_TOPIC.to_string()));
    };
    let difficulty = parse_difficulty(&difficulty)?;

    info!(%topic, %difficulty, "Curriculum requested");
    let curriculum = state.source.generate_curriculum(&topic, difficulty).await?;

    let findings = curriculum.lenient_findings();
    if !findings.is_empty() {
        warn!(
            %topic,
            findings = findings.len(),
            first = %findings[0],
            "Serving curriculum with structural issues"
        );
    }

    Ok(Json(curriculum))
}

/// Handler for `POST /api/generate-deep-dive`.
async fn handle_generate_deep_dive(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerateDeepDiveRequest>, JsonRejection>,
) -> std::result::Result<Json<DeepDiveTopics>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let (Some(current_topic), Some(difficulty)) = (
        non_blank(request.current_topic),
        non_blank(request.difficulty),
    ) else {
        warn!("Rejected deep-dive request with missing fields");
        return Err(ApiError::BadRequest(MISSING_CURRENT_TOPIC.to_string()));
    };
    let difficulty = parse_difficulty(&difficulty)?;

    info!(%current_topic, %difficulty, "Deep-dive topics requested");
    let topics = state
        .source
        .generate_deep_dive(&current_topic, difficulty)
        .await?;

    Ok(Json(DeepDiveTopics { topics }))
}

/// Handler for `GET /api/health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use curio_course::{Flowchart, QuizQuestion};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Reply {
        Success,
        Upstream(u16),
        Empty,
    }

    #[derive(Debug)]
    struct StubSource {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn fail(&self) -> GatewayError {
            match self.reply {
                Reply::Upstream(status) => GatewayError::upstream(status, "quota exceeded"),
                _ => GatewayError::EmptyContent,
            }
        }
    }

    #[async_trait]
    impl CourseSource for StubSource {
        async fn generate_curriculum(
            &self,
            topic: &str,
            difficulty: DifficultyLevel,
        ) -> curio_gateway::Result<Curriculum> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !matches!(self.reply, Reply::Success) {
                return Err(self.fail());
            }
            Ok(Curriculum {
                topic: topic.to_string(),
                difficulty: difficulty.label().to_string(),
                introduction: "Intro".to_string(),
                concepts: vec![],
                flowchart: Flowchart::default(),
                quiz: vec![QuizQuestion {
                    id: "q1".to_string(),
                    question: "?".to_string(),
                    options: vec!["a".into(), "b".into()],
                    correct_index: 1,
                    explanation: String::new(),
                }],
            })
        }

        async fn generate_deep_dive(
            &self,
            current_topic: &str,
            _difficulty: DifficultyLevel,
        ) -> curio_gateway::Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !matches!(self.reply, Reply::Success) {
                return Err(self.fail());
            }
            Ok(vec![format!("Advanced {current_topic}")])
        }
    }

    fn router(source: &Arc<StubSource>) -> Router {
        let source: Arc<dyn CourseSource> = source.clone();
        create_router(AppState::new(Config::default(), source))
    }

    async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    // ------------------------------------------------------------------------
    // Curriculum endpoint tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_curriculum_success() {
        let source = StubSource::new(Reply::Success);
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-curriculum",
            Some(json!({"topic": "Photosynthesis", "difficulty": "Undergraduate Student"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let curriculum: Curriculum = serde_json::from_value(body).unwrap();
        assert_eq!(curriculum.topic, "Photosynthesis");
        assert_eq!(curriculum.quiz[0].correct_index, 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_curriculum_accepts_short_key() {
        let source = StubSource::new(Reply::Success);
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-curriculum",
            Some(json!({"topic": "Tides", "difficulty": "CHILD"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["difficulty"], "5 Year Old (ELI5)");
    }

    #[tokio::test]
    async fn test_generate_curriculum_wrong_method() {
        let source = StubSource::new(Reply::Success);
        let (status, body) =
            send(router(&source), Method::GET, "/api/generate-curriculum", None).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_curriculum_missing_fields() {
        let source = StubSource::new(Reply::Success);
        for body in [
            json!({"difficulty": "Undergraduate Student"}),
            json!({"topic": "Tides"}),
            json!({"topic": "   ", "difficulty": "child"}),
            json!({}),
        ] {
            let (status, response) = send(
                router(&source),
                Method::POST,
                "/api/generate-curriculum",
                Some(body),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["error"], "Missing topic or difficulty");
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_curriculum_unparseable_body() {
        let source = StubSource::new(Reply::Success);
        let response = router(&source)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/generate-curriculum")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_curriculum_unknown_difficulty() {
        let source = StubSource::new(Reply::Success);
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-curriculum",
            Some(json!({"topic": "Tides", "difficulty": "Wizard"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown difficulty 'Wizard'");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_curriculum_forwards_upstream_status() {
        let source = StubSource::new(Reply::Upstream(429));
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-curriculum",
            Some(json!({"topic": "Tides", "difficulty": "teenager"})),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Upstream API error: 429 - quota exceeded");
    }

    #[tokio::test]
    async fn test_generate_curriculum_empty_content_is_500() {
        let source = StubSource::new(Reply::Empty);
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-curriculum",
            Some(json!({"topic": "Tides", "difficulty": "teenager"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No content generated");
    }

    // ------------------------------------------------------------------------
    // Deep-dive endpoint tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_deep_dive_success() {
        let source = StubSource::new(Reply::Success);
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-deep-dive",
            Some(json!({"currentTopic": "Engines", "difficulty": "Industry Professional"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"topics": ["Advanced Engines"]}));
    }

    #[tokio::test]
    async fn test_generate_deep_dive_missing_fields() {
        let source = StubSource::new(Reply::Success);
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-deep-dive",
            Some(json!({"topic": "Engines", "difficulty": "child"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing currentTopic or difficulty");
    }

    #[tokio::test]
    async fn test_generate_deep_dive_wrong_method() {
        let source = StubSource::new(Reply::Success);
        let (status, body) =
            send(router(&source), Method::PUT, "/api/generate-deep-dive", None).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_generate_deep_dive_forwards_upstream_status() {
        let source = StubSource::new(Reply::Upstream(401));
        let (status, body) = send(
            router(&source),
            Method::POST,
            "/api/generate-deep-dive",
            Some(json!({"currentTopic": "Engines", "difficulty": "child"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().starts_with("Upstream API error: 401"));
    }

    // ------------------------------------------------------------------------
    // Health endpoint tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_health() {
        let source = StubSource::new(Reply::Success);
        let (status, body) = send(router(&source), Method::GET, "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let source = StubSource::new(Reply::Success);
        let (status, _) = send(router(&source), Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
