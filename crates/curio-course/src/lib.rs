//! Curio Course Model
//!
//! Data model, flowchart layout and quiz progression for AI-generated courses.
//!
//! Everything in this crate is pure: no I/O, no network, no clocks. The
//! gateway and server crates build on these types.
//!
//! # Example
//!
//! ```
//! use curio_course::{extract_json, layout, Curriculum, DEFAULT_CANVAS_WIDTH};
//!
//! let raw = r#"{
//!   "topic": "Photosynthesis",
//!   "difficulty": "Undergraduate Student",
//!   "introduction": "Plants eat light.",
//!   "concepts": [],
//!   "flowchart": {
//!     "nodes": [{"id": "a", "label": "Light", "description": "Photons arrive", "stepOrder": 1}],
//!     "edges": []
//!   },
//!   "quiz": []
//! }"#;
//!
//! let curriculum: Curriculum = extract_json(raw).unwrap();
//! let flow = layout(
//!     &curriculum.flowchart.nodes,
//!     &curriculum.flowchart.edges,
//!     DEFAULT_CANVAS_WIDTH,
//! );
//!
//! assert_eq!(flow.nodes.len(), 1);
//! assert!((flow.nodes[0].x - 400.0).abs() < f64::EPSILON);
//! ```

pub mod difficulty;
pub mod extract;
pub mod layout;
pub mod model;
pub mod quiz;

pub use difficulty::{DifficultyLevel, UnknownDifficulty};
pub use extract::{extract_json, strip_code_fence, ExtractError};
pub use layout::{
    layout, FlowLayout, LaidOutEdge, LaidOutNode, Point, DEFAULT_CANVAS_WIDTH, LAYER_GAP,
    LEVEL_HEIGHT, NODE_HEIGHT, NODE_WIDTH,
};
pub use model::{
    Concept, Curriculum, DeepDiveTopics, FlowEdge, FlowNode, Flowchart, LenientFinding,
    QuizQuestion,
};
pub use quiz::{
    AdvanceOutcome, DeepDiveRequest, DeepDiveState, QuizPhase, QuizProgress, QuizSession,
    SelectOutcome, DEEP_DIVE_THRESHOLD,
};
