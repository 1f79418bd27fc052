//! Course data model.
//!
//! These types mirror the JSON document produced by the generator. Field
//! names are camelCase on the wire. A curriculum is created once per
//! generation request and never mutated; a new topic replaces it wholesale.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Curriculum
// ============================================================================

/// A generated course: introduction, concepts, flowchart and quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curriculum {
    /// The topic as echoed by the generator.
    pub topic: String,

    /// The audience label as echoed by the generator.
    pub difficulty: String,

    /// A short hook introducing the topic.
    pub introduction: String,

    /// Explained concepts, in presentation order.
    pub concepts: Vec<Concept>,

    /// Process map of how the topic works.
    pub flowchart: Flowchart,

    /// Multiple-choice questions, in presentation order.
    pub quiz: Vec<QuizQuestion>,
}

/// A single explained concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    /// Unique identifier within the curriculum.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Plain definition.
    pub definition: String,
    /// A relatable analogy.
    pub analogy: String,
    /// One-sentence summary.
    pub key_takeaway: String,
}

/// Node and edge sets of a flowchart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flowchart {
    /// Nodes, in the order the generator returned them.
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    /// Directed edges between node ids.
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

/// A flowchart node.
///
/// `step_order` selects the vertical layer only; several nodes may share a
/// layer and layers need not be contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    /// Identifier, unique within the flowchart.
    pub id: String,
    /// Short label shown on the node.
    pub label: String,
    /// Longer explanation shown on selection.
    pub description: String,
    /// Layer index (0 is the top row).
    pub step_order: u32,
}

/// A directed flowchart edge.
///
/// References to missing node ids are tolerated and dropped at layout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Optional edge caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Identifier within the quiz.
    pub id: String,
    /// Question text.
    pub question: String,
    /// Answer options, canonically four.
    pub options: Vec<String>,
    /// 0-based index of the correct option. Not bounds-checked on parse.
    pub correct_index: usize,
    /// Why the correct answer is correct.
    pub explanation: String,
}

impl QuizQuestion {
    /// Returns `true` if `option` is the correct answer.
    #[must_use]
    pub const fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}

/// Follow-up topic suggestions returned by the deep-dive generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepDiveTopics {
    /// Suggested topics, in order. May be empty.
    #[serde(default)]
    pub topics: Vec<String>,
}

// ============================================================================
// Lenient findings
// ============================================================================

/// A tolerated irregularity in a generated curriculum.
///
/// Generation output is accepted as-is; findings exist for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LenientFinding {
    /// An edge references a node id that does not exist.
    DanglingEdge {
        /// Source id of the edge.
        from: String,
        /// Target id of the edge.
        to: String,
    },
    /// A question's `correctIndex` points past its options.
    CorrectIndexOutOfRange {
        /// Id of the offending question.
        question_id: String,
        /// The declared correct index.
        correct_index: usize,
        /// Number of options actually present.
        options: usize,
    },
    /// The quiz contains no questions.
    EmptyQuiz,
    /// The flowchart contains at least one directed cycle.
    CyclicFlowchart,
}

impl fmt::Display for LenientFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEdge { from, to } => {
                write!(f, "edge {from} -> {to} references a missing node")
            }
            Self::CorrectIndexOutOfRange {
                question_id,
                correct_index,
                options,
            } => write!(
                f,
                "question {question_id} has correctIndex {correct_index} but only {options} options"
            ),
            Self::EmptyQuiz => write!(f, "quiz has no questions"),
            Self::CyclicFlowchart => write!(f, "flowchart contains a cycle"),
        }
    }
}

impl Curriculum {
    /// Lists tolerated irregularities in this curriculum.
    ///
    /// Dangling edges, out-of-range answers and cyclic flowcharts are all
    /// accepted; this only reports them.
    #[must_use]
    pub fn lenient_findings(&self) -> Vec<LenientFinding> {
        let mut findings = Vec::new();

        let ids: HashSet<&str> = self
            .flowchart
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        for edge in &self.flowchart.edges {
            if !ids.contains(edge.from.as_str()) || !ids.contains(edge.to.as_str()) {
                findings.push(LenientFinding::DanglingEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
        }

        if self.quiz.is_empty() {
            findings.push(LenientFinding::EmptyQuiz);
        }
        for question in &self.quiz {
            if question.correct_index >= question.options.len() {
                findings.push(LenientFinding::CorrectIndexOutOfRange {
                    question_id: question.id.clone(),
                    correct_index: question.correct_index,
                    options: question.options.len(),
                });
            }
        }

        if self.flowchart.has_cycle() {
            findings.push(LenientFinding::CyclicFlowchart);
        }

        findings
    }
}

impl Flowchart {
    /// Returns `true` if the resolvable edges form a directed cycle.
    ///
    /// Dangling edges are ignored.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &self.edges {
            if ids.contains(edge.from.as_str()) && ids.contains(edge.to.as_str()) {
                adjacency
                    .entry(edge.from.as_str())
                    .or_default()
                    .push(edge.to.as_str());
            }
        }

        // 0 = unvisited, 1 = on the current path, 2 = finished
        let mut marks: HashMap<&str, u8> = HashMap::new();
        for &start in &ids {
            if marks.get(start).copied().unwrap_or(0) != 0 {
                continue;
            }
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            marks.insert(start, 1);
            while let Some((node, next)) = stack.pop() {
                let children = adjacency.get(node).map_or(&[][..], Vec::as_slice);
                if let Some(&child) = children.get(next) {
                    stack.push((node, next + 1));
                    match marks.get(child).copied().unwrap_or(0) {
                        1 => return true,
                        0 => {
                            marks.insert(child, 1);
                            stack.push((child, 0));
                        }
                        _ => {}
                    }
                } else {
                    marks.insert(node, 2);
                }
            }
        }
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
