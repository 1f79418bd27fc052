//! Prompt construction for the text-generation service.
//!
//! Both prompts pin the exact JSON shape the course model deserializes, so the
//! field names here must stay in sync with `curio_course::model`.

use curio_course::DifficultyLevel;

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str = "You are an expert educator. Reply with one valid JSON \
document only: no Markdown code fences, no commentary before or after it.";

/// Builds the user message requesting a full course module.
#[must_use]
pub fn curriculum_prompt(topic: &str, difficulty: DifficultyLevel) -> String {
    let tone = match difficulty {
        DifficultyLevel::Child => "Use short sentences, everyday words and playful analogies.",
        DifficultyLevel::Teenager => {
            "Use clear language, relatable examples and introduce key vocabulary."
        }
        DifficultyLevel::Undergrad => {
            "Use precise terminology, explain mechanisms and connect ideas to theory."
        }
        DifficultyLevel::Professional => {
            "Use industry-standard terminology and go into technical depth."
        }
    };

    format!(
        r#"Build a self-contained learning module about "{topic}".
Audience: {difficulty}. {tone}

The module is rendered by an interactive app and needs:
1. Concepts: 4 to 6 core concepts, each with a definition, an analogy and a one-sentence key takeaway.
2. Flowchart: a process or hierarchy map of how the subject works. "stepOrder" is the vertical level, starting at 1 for the top.
3. Quiz: 3 to 5 multiple-choice questions with exactly one correct option each.

Respond with JSON matching this structure exactly:
{{
  "topic": "string",
  "difficulty": "{difficulty}",
  "introduction": "2-3 engaging sentences",
  "concepts": [
    {{ "id": "string", "title": "string", "definition": "string", "analogy": "string", "keyTakeaway": "string" }}
  ],
  "flowchart": {{
    "nodes": [ {{ "id": "string", "label": "string", "description": "string", "stepOrder": 1 }} ],
    "edges": [ {{ "from": "node id", "to": "node id", "label": "optional string" }} ]
  }},
  "quiz": [
    {{ "id": "string", "question": "string", "options": ["a", "b", "c", "d"], "correctIndex": 0, "explanation": "string" }}
  ]
}}"#
    )
}

/// Builds the user message requesting follow-up topics.
#[must_use]
pub fn deep_dive_prompt(current_topic: &str, difficulty: DifficultyLevel) -> String {
    format!(
        r#"A learner just scored above 80% on a quiz about "{current_topic}" and wants to go further.

Suggest 4 to 6 follow-up topics that:
- build directly on "{current_topic}",
- are more specialised or advanced than it,
- spark curiosity (for "Engines" you might suggest "Jet engines" or "Rocket engines"),
- suit a {difficulty} audience,
- are broad enough to fill a full learning module of their own.

Respond with JSON matching this structure exactly:
{{ "topics": ["string", "string", "string", "string"] }}"#
    )
}
