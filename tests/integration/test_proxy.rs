//! End-to-end tests: learner session -> Curio server -> stub upstream.
//!
//! The stub speaks the chat-completions shape and replays canned content, so
//! every layer (prompting, fence stripping, status forwarding, quiz and
//! deep-dive flow) runs over real HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use curio_course::{layout, AdvanceOutcome, DeepDiveState, DifficultyLevel, DEFAULT_CANVAS_WIDTH};
use curio_gateway::{
    AppStatus, CourseSource, Gateway, LearnerSession, ProxyClient, UpstreamClient,
    GENERATION_FAILED,
};
use curio_server::{create_router, AppState, Config};
use serde_json::{json, Value};

/// Five questions; the correct option is always index 0.
const CURRICULUM: &str = r#"{
  "topic": "Photosynthesis",
  "difficulty": "Undergraduate Student",
  "introduction": "How plants turn light into sugar.",
  "concepts": [
    {"id": "c1", "title": "Chlorophyll", "definition": "Green pigment", "analogy": "A solar panel", "keyTakeaway": "It captures light"}
  ],
  "flowchart": {
    "nodes": [
      {"id": "light", "label": "Light", "description": "Photons hit the leaf", "stepOrder": 1},
      {"id": "water", "label": "Water", "description": "Roots pull water up", "stepOrder": 1},
      {"id": "sugar", "label": "Glucose", "description": "Sugar is produced", "stepOrder": 2}
    ],
    "edges": [
      {"from": "light", "to": "sugar", "label": "energy"},
      {"from": "water", "to": "sugar"},
      {"from": "sugar", "to": "starch"}
    ]
  },
  "quiz": [
    {"id": "q1", "question": "Pigment?", "options": ["Chlorophyll", "Keratin"], "correctIndex": 0, "explanation": "Green."},
    {"id": "q2", "question": "Input?", "options": ["Light", "Sound"], "correctIndex": 0, "explanation": "Photons."},
    {"id": "q3", "question": "Output?", "options": ["Glucose", "Salt"], "correctIndex": 0, "explanation": "Sugar."},
    {"id": "q4", "question": "Where?", "options": ["Leaf", "Bark"], "correctIndex": 0, "explanation": "Leaves."},
    {"id": "q5", "question": "Gas released?", "options": ["Oxygen", "Helium"], "correctIndex": 0, "explanation": "O2."}
  ]
}"#;

const TOPICS: &str = r#"{"topics": ["Calvin cycle", "C4 plants", "Chloroplast structure", "Artificial photosynthesis"]}"#;

// ============================================================================
// Stub upstream
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Mode {
    Plain,
    Fenced,
    RateLimited,
    NoContent,
}

#[derive(Debug)]
struct Stub {
    mode: Mode,
    curriculum_calls: AtomicUsize,
    deep_dive_calls: AtomicUsize,
    last_auth: Mutex<Option<String>>,
    last_body: Mutex<Option<Value>>,
}

impl Stub {
    fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            curriculum_calls: AtomicUsize::new(0),
            deep_dive_calls: AtomicUsize::new(0),
            last_auth: Mutex::new(None),
            last_body: Mutex::new(None),
        })
    }
}

async fn stub_completions(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = body["messages"][1]["content"].as_str().unwrap_or_default();
    let is_deep_dive = user.contains("follow-up topics");
    if is_deep_dive {
        stub.deep_dive_calls.fetch_add(1, Ordering::SeqCst);
    } else {
        stub.curriculum_calls.fetch_add(1, Ordering::SeqCst);
    }

    *stub.last_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *stub.last_body.lock().unwrap() = Some(body.clone());

    let content = if is_deep_dive { TOPICS } else { CURRICULUM };
    let envelope = |content: String| {
        Json(json!({
            "id": "stub",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        }))
    };

    match stub.mode {
        Mode::Plain => envelope(content.to_string()).into_response(),
        Mode::Fenced => envelope(format!("```json\n{content}\n```")).into_response(),
        Mode::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response(),
        Mode::NoContent => Json(json!({"id": "stub", "choices": []})).into_response(),
    }
}

/// Binds a router to an ephemeral port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}")
}

/// Starts stub upstream + Curio server; returns the server URL.
async fn spawn_stack(stub: &Arc<Stub>) -> String {
    let upstream_router = Router::new()
        .route("/chat/completions", post(stub_completions))
        .with_state(Arc::clone(stub));
    let upstream_url = format!("{}/chat/completions", serve(upstream_router).await);

    let client = UpstreamClient::new(upstream_url, "sonar", "test-key", Duration::from_secs(5))
        .expect("Failed to build upstream client");
    let state = AppState::new(Config::default(), Arc::new(Gateway::new(client)));

    serve(create_router(state)).await
}

fn proxy(server_url: &str) -> ProxyClient {
    ProxyClient::new(server_url, Duration::from_secs(5)).expect("Failed to build proxy client")
}

fn answer_all(session: &mut LearnerSession, answers: &[usize]) -> AdvanceOutcome {
    let mut last = AdvanceOutcome::Ignored;
    for &answer in answers {
        session.select_answer(answer);
        last = session.advance_quiz();
    }
    last
}

// ============================================================================
// Generation through the server
// ============================================================================

#[tokio::test]
async fn test_fenced_and_plain_content_yield_same_curriculum() {
    let plain_stub = Stub::new(Mode::Plain);
    let fenced_stub = Stub::new(Mode::Fenced);
    let plain = proxy(&spawn_stack(&plain_stub).await);
    let fenced = proxy(&spawn_stack(&fenced_stub).await);

    let a = plain
        .generate_curriculum("Photosynthesis", DifficultyLevel::Undergrad)
        .await
        .expect("plain generation failed");
    let b = fenced
        .generate_curriculum("Photosynthesis", DifficultyLevel::Undergrad)
        .await
        .expect("fenced generation failed");

    assert_eq!(a, b);
    assert_eq!(a.topic, "Photosynthesis");
    assert_eq!(a.quiz.len(), 5);
    assert_eq!(plain_stub.curriculum_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fenced_stub.curriculum_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_upstream_request_shape() {
    let stub = Stub::new(Mode::Plain);
    let client = proxy(&spawn_stack(&stub).await);

    client
        .generate_curriculum("Photosynthesis", DifficultyLevel::Child)
        .await
        .expect("generation failed");

    assert_eq!(
        stub.last_auth.lock().unwrap().as_deref(),
        Some("Bearer test-key")
    );
    let body = stub.last_body.lock().unwrap().clone().expect("no body recorded");
    assert_eq!(body["model"], "sonar");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("\"Photosynthesis\""));
    assert!(user.contains("5 Year Old (ELI5)"));
}

#[tokio::test]
async fn test_upstream_429_is_forwarded_and_session_errors() {
    let stub = Stub::new(Mode::RateLimited);
    let server_url = spawn_stack(&stub).await;

    let response = reqwest::Client::new()
        .post(format!("{server_url}/api/generate-curriculum"))
        .json(&json!({"topic": "Photosynthesis", "difficulty": "Undergraduate Student"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 429);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Upstream API error: 429 - rate limited");

    let client = proxy(&server_url);
    let mut session = LearnerSession::new();
    let status = session
        .run_generation(&client, "Photosynthesis", DifficultyLevel::Undergrad)
        .await
        .unwrap();

    assert_eq!(status, AppStatus::Error);
    assert_eq!(session.error(), Some(GENERATION_FAILED));
    assert!(session.curriculum().is_none());
}

#[tokio::test]
async fn test_missing_content_is_500() {
    let stub = Stub::new(Mode::NoContent);
    let server_url = spawn_stack(&stub).await;

    let response = reqwest::Client::new()
        .post(format!("{server_url}/api/generate-deep-dive"))
        .json(&json!({"currentTopic": "Engines", "difficulty": "professional"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No content generated");
}

#[tokio::test]
async fn test_validation_happens_before_upstream() {
    let stub = Stub::new(Mode::Plain);
    let server_url = spawn_stack(&stub).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{server_url}/api/generate-curriculum"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 405);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Method not allowed");

    let response = http
        .post(format!("{server_url}/api/generate-curriculum"))
        .json(&json!({"topic": "", "difficulty": "child"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing topic or difficulty");

    assert_eq!(stub.curriculum_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_served_flowchart_lays_out_without_dangling_edges() {
    let stub = Stub::new(Mode::Plain);
    let client = proxy(&spawn_stack(&stub).await);

    let curriculum = client
        .generate_curriculum("Photosynthesis", DifficultyLevel::Undergrad)
        .await
        .unwrap();
    let flow = layout(
        &curriculum.flowchart.nodes,
        &curriculum.flowchart.edges,
        DEFAULT_CANVAS_WIDTH,
    );

    assert_eq!(flow.nodes.len(), 3);
    // sugar -> starch points at a node that does not exist
    assert_eq!(flow.edges.len(), 2);
    assert!(flow.edges.iter().all(|e| e.to == "sugar"));
    assert_eq!(curriculum.lenient_findings().len(), 1);
}

// ============================================================================
// Quiz and deep dive through the server
// ============================================================================

#[tokio::test]
async fn test_perfect_score_fetches_deep_dive_once() {
    let stub = Stub::new(Mode::Plain);
    let client = proxy(&spawn_stack(&stub).await);
    let mut session = LearnerSession::new();

    let status = session
        .run_generation(&client, "Photosynthesis", DifficultyLevel::Undergrad)
        .await
        .unwrap();
    assert_eq!(status, AppStatus::Ready);

    let outcome = answer_all(&mut session, &[0, 0, 0, 0, 0]);
    assert!(matches!(outcome, AdvanceOutcome::Summary(Some(_))));
    assert_eq!(session.quiz().unwrap().percentage(), 100);

    assert!(session.run_deep_dive(&client).await);
    assert!(!session.run_deep_dive(&client).await);
    assert_eq!(stub.deep_dive_calls.load(Ordering::SeqCst), 1);

    let quiz = session.quiz().unwrap();
    assert_eq!(quiz.suggestions().len(), 4);
    assert_eq!(quiz.suggestions()[0], "Calvin cycle");

    // picking a suggestion starts a new course at the same difficulty
    let ticket = session.select_deep_dive("Calvin cycle").unwrap();
    assert_eq!(ticket.difficulty, DifficultyLevel::Undergrad);
    assert_eq!(session.fulfil(&client, &ticket).await, AppStatus::Ready);
    assert_eq!(stub.curriculum_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_eighty_percent_does_not_fetch_deep_dive() {
    let stub = Stub::new(Mode::Plain);
    let client = proxy(&spawn_stack(&stub).await);
    let mut session = LearnerSession::new();

    session
        .run_generation(&client, "Photosynthesis", DifficultyLevel::Undergrad)
        .await
        .unwrap();

    let outcome = answer_all(&mut session, &[0, 0, 1, 0, 0]);
    assert_eq!(outcome, AdvanceOutcome::Summary(None));

    let quiz = session.quiz().unwrap();
    assert_eq!(quiz.score(), 4);
    assert_eq!(quiz.percentage(), 80);
    assert_eq!(quiz.deep_dive(), &DeepDiveState::NotRequested);

    assert!(!session.run_deep_dive(&client).await);
    assert_eq!(stub.deep_dive_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let stub = Stub::new(Mode::Plain);
    let server_url = spawn_stack(&stub).await;

    let body: Value = reqwest::get(format!("{server_url}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}
